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

//! Axis-aligned bounding box in 2D world space.

use crate::algebra::Vector2;

/// Axis-aligned bounding box given by its minimum and maximum corners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisAlignedBoundingBox {
    pub min: Vector2<f32>,
    pub max: Vector2<f32>,
}

impl Default for AxisAlignedBoundingBox {
    fn default() -> Self {
        Self::unit()
    }
}

impl AxisAlignedBoundingBox {
    /// A degenerate box that can be extended by `add_point`: its min is +inf
    /// and its max is -inf, so any point becomes both corners at once.
    #[inline]
    pub fn collapsed() -> Self {
        Self {
            min: Vector2::new(f32::MAX, f32::MAX),
            max: Vector2::new(-f32::MAX, -f32::MAX),
        }
    }

    /// A box spanning `[-0.5; 0.5]` on both axes.
    #[inline]
    pub fn unit() -> Self {
        Self::from_min_max(Vector2::new(-0.5, -0.5), Vector2::new(0.5, 0.5))
    }

    #[inline]
    pub fn from_min_max(min: Vector2<f32>, max: Vector2<f32>) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_point(point: Vector2<f32>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Builds the smallest box containing every given point.
    #[inline]
    pub fn from_points(points: &[Vector2<f32>]) -> Self {
        let mut aabb = AxisAlignedBoundingBox::collapsed();
        for &point in points {
            aabb.add_point(point);
        }
        aabb
    }

    #[inline]
    pub fn add_point(&mut self, a: Vector2<f32>) {
        if a.x < self.min.x {
            self.min.x = a.x;
        }
        if a.y < self.min.y {
            self.min.y = a.y;
        }
        if a.x > self.max.x {
            self.max.x = a.x;
        }
        if a.y > self.max.y {
            self.max.y = a.y;
        }
    }

    #[inline]
    pub fn inflate(&mut self, delta: Vector2<f32>) {
        self.min -= delta;
        self.max += delta;
    }

    #[inline]
    pub fn center(&self) -> Vector2<f32> {
        (self.min + self.max).scale(0.5)
    }

    #[inline]
    pub fn half_extents(&self) -> Vector2<f32> {
        (self.max - self.min).scale(0.5)
    }

    #[inline]
    pub fn intersects_aabb(&self, other: &Self) -> bool {
        let self_center = self.center();
        let self_half_extents = self.half_extents();

        let other_half_extents = other.half_extents();
        let other_center = other.center();

        if (self_center.x - other_center.x).abs() > self_half_extents.x + other_half_extents.x {
            return false;
        }

        (self_center.y - other_center.y).abs() <= self_half_extents.y + other_half_extents.y
    }

    #[inline]
    pub fn is_contains_point(&self, point: Vector2<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y
    }

    /// Returns the four corners in counter-clockwise order starting at min.
    #[inline]
    pub fn corners(&self) -> [Vector2<f32>; 4] {
        [
            Vector2::new(self.min.x, self.min.y),
            Vector2::new(self.max.x, self.min.y),
            Vector2::new(self.max.x, self.max.y),
            Vector2::new(self.min.x, self.max.y),
        ]
    }

    #[inline]
    pub fn offset(&mut self, v: Vector2<f32>) {
        self.min += v;
        self.max += v;
    }
}
