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

//! Raw pointer input: samples pushed by the host surface, consumed by the
//! gesture recognizer.

pub mod gesture;

use crate::core::algebra::Vector2;

/// Phase of a pointer sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The host lost the pointer (e.g. the touch was claimed by the system);
    /// the session is discarded without emitting gestures.
    Cancel,
}

/// One pointer sample as delivered by the host surface. Coordinates are
/// canvas-space; the engine converts them to world space through the camera
/// inverse before gesture recognition.
#[derive(Copy, Clone, Debug)]
pub struct PointerSample {
    /// Stable identifier of the pointer (finger or mouse button session).
    pub id: u64,
    pub position: Vector2<f32>,
    /// Timestamp in seconds, on the same clock as the engine's tick
    /// accumulator.
    pub time: f32,
    pub phase: PointerPhase,
}

/// A host-side source that delivers pointer samples in receipt order.
pub trait PointerSource {
    fn next_sample(&mut self) -> Option<PointerSample>;
}

impl PointerSource for std::collections::VecDeque<PointerSample> {
    fn next_sample(&mut self) -> Option<PointerSample> {
        self.pop_front()
    }
}
