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

//! Frame-by-frame sprite animation over a sprite sheet image. An animation is a
//! list of source rectangles within the image and a playback rate; the current
//! frame is advanced by the scene update and consumed by the renderer.

use crate::core::math::aabb::AxisAlignedBoundingBox;

/// Animation playback status.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Status {
    /// Animation is playing.
    Playing,
    /// Animation is stopped. A stopped animation is guaranteed to be at its
    /// first or last frame.
    #[default]
    Stopped,
}

/// A sprite sheet animation: source rectangles plus playback state.
#[derive(Clone, Debug)]
pub struct SpriteSheetAnimation {
    frames: Vec<AxisAlignedBoundingBox>,
    /// Playback rate in frames per second.
    fps: f32,
    looping: bool,
    current_frame: f32,
    status: Status,
}

impl SpriteSheetAnimation {
    pub fn new(frames: Vec<AxisAlignedBoundingBox>, fps: f32, looping: bool) -> Self {
        Self {
            frames,
            fps: fps.max(0.0),
            looping,
            current_frame: 0.0,
            status: Status::Stopped,
        }
    }

    pub fn play(&mut self) {
        self.status = Status::Playing;
    }

    /// Stops playback and rewinds to the first frame.
    pub fn stop(&mut self) {
        self.status = Status::Stopped;
        self.current_frame = 0.0;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame as usize
    }

    /// Source rectangle of the current frame, if the animation has any frames.
    pub fn current_frame_rect(&self) -> Option<&AxisAlignedBoundingBox> {
        self.frames.get(self.current_frame())
    }

    /// Advances playback using the given time step.
    pub fn update(&mut self, dt: f32) {
        if self.status != Status::Playing {
            return;
        }

        if self.frames.is_empty() {
            self.status = Status::Stopped;
            return;
        }

        self.current_frame += self.fps * dt;
        if self.current_frame >= self.frames.len() as f32 {
            if self.looping {
                // Continue playing from beginning.
                self.current_frame %= self.frames.len() as f32;
            } else {
                // Keep on last frame and stop.
                self.current_frame = self.frames.len().saturating_sub(1) as f32;
                self.status = Status::Stopped;
            }
        }
    }
}
