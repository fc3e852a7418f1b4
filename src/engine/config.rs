// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Host-loop configuration. Only `max_dt_seconds` affects simulation
//! semantics; everything else is pacing or a pass-through to the drawing
//! backend.

use serde::{Deserialize, Serialize};

/// See module docs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When set, ticks arriving faster than this rate are skipped and their
    /// time accumulates into the next frame.
    pub target_fps: Option<f32>,
    /// Upper bound for a single tick's `dt`, in seconds. Survives tab
    /// throttling and debugger pauses without the simulation spiralling.
    pub max_dt_seconds: f32,
    /// Draw a frames-per-second overlay during render.
    pub show_fps: bool,
    /// Pass-through: the host should resize the canvas with its container.
    pub responsive: bool,
    /// Pass-through: the drawing backend's framebuffer has an alpha channel.
    pub alpha: bool,
    /// Pass-through: the drawing backend should antialias primitives.
    pub antialias: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: None,
            max_dt_seconds: 0.1,
            show_fps: false,
            responsive: true,
            alpha: false,
            antialias: true,
        }
    }
}

impl EngineConfig {
    /// Returns a copy with non-finite or non-positive pacing values replaced
    /// by their defaults.
    pub fn sanitized(mut self) -> Self {
        if !self.max_dt_seconds.is_finite() || self.max_dt_seconds <= 0.0 {
            self.max_dt_seconds = 0.1;
        }
        self.target_fps = self.target_fps.filter(|fps| fps.is_finite() && *fps > 0.0);
        self
    }
}
