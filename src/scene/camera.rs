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

//! A 2D camera mapping between canvas (screen) space and world space. The
//! simulation never moves the camera; the gesture recognizer consumes its
//! inverse to convert pointer samples into world coordinates.

use crate::core::{
    algebra::Vector2,
    math::{finite_or, rotate_vec2},
};

/// See module docs.
#[derive(Clone, Debug)]
pub struct Camera2d {
    /// World position the camera looks at; it maps to the viewport center.
    pub position: Vector2<f32>,
    /// Camera roll in radians.
    pub rotation: f32,
    zoom: f32,
    /// Size of the backing canvas in pixels.
    pub viewport: Vector2<f32>,
}

impl Default for Camera2d {
    fn default() -> Self {
        Self::new(Vector2::new(800.0, 600.0))
    }
}

impl Camera2d {
    pub fn new(viewport: Vector2<f32>) -> Self {
        Self {
            position: Vector2::new(0.0, 0.0),
            rotation: 0.0,
            zoom: 1.0,
            viewport,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Sets the zoom factor. Non-finite or non-positive values fall back to 1.
    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = finite_or(zoom, 1.0);
        self.zoom = if zoom > 0.0 { zoom } else { 1.0 };
    }

    /// Converts a canvas-space point into world space.
    pub fn screen_to_world(&self, point: Vector2<f32>) -> Vector2<f32> {
        let centered = point - self.viewport.scale(0.5);
        rotate_vec2(centered.unscale(self.zoom), self.rotation) + self.position
    }

    /// Converts a world-space point into canvas space.
    pub fn world_to_screen(&self, point: Vector2<f32>) -> Vector2<f32> {
        rotate_vec2(point - self.position, -self.rotation).scale(self.zoom)
            + self.viewport.scale(0.5)
    }
}

#[cfg(test)]
mod test {
    use super::Camera2d;
    use crate::core::algebra::Vector2;
    use approx::assert_relative_eq;

    #[test]
    fn screen_world_round_trip() {
        let mut camera = Camera2d::new(Vector2::new(640.0, 480.0));
        camera.position = Vector2::new(120.0, -45.0);
        camera.rotation = 0.8;
        camera.set_zoom(2.5);

        for point in [
            Vector2::new(0.0, 0.0),
            Vector2::new(320.0, 240.0),
            Vector2::new(639.0, 17.0),
        ] {
            let round_trip = camera.world_to_screen(camera.screen_to_world(point));
            assert_relative_eq!(round_trip.x, point.x, epsilon = 1e-3);
            assert_relative_eq!(round_trip.y, point.y, epsilon = 1e-3);
        }
    }

    #[test]
    fn identity_camera_centers_viewport() {
        let camera = Camera2d::new(Vector2::new(800.0, 600.0));
        let world = camera.screen_to_world(Vector2::new(400.0, 300.0));
        assert_relative_eq!(world.x, 0.0);
        assert_relative_eq!(world.y, 0.0);
    }

    #[test]
    fn zoom_sanitization() {
        let mut camera = Camera2d::default();
        camera.set_zoom(0.0);
        assert_eq!(camera.zoom(), 1.0);
        camera.set_zoom(f32::NAN);
        assert_eq!(camera.zoom(), 1.0);
    }
}
