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

//! 2D scalar and vector helpers used across the engine.

// Clippy complains about normal mathematical symbols like A, B, C for quadratic equation.
#![allow(clippy::many_single_char_names)]

pub mod aabb;

use crate::algebra::{Matrix3, Vector2};

/// Wraps an angle into `[0; 2pi)` range.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let two_pi = 2.0 * std::f32::consts::PI;

    if angle >= 0.0 {
        angle % two_pi
    } else {
        (angle % two_pi + two_pi) % two_pi
    }
}

#[inline(always)]
pub fn lerpf(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rotates a vector counter-clockwise by the given angle in radians.
#[inline]
pub fn rotate_vec2(v: Vector2<f32>, angle: f32) -> Vector2<f32> {
    let (sin, cos) = angle.sin_cos();
    Vector2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Returns the vector rotated 90 degrees counter-clockwise.
#[inline]
pub fn perp(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(-v.y, v.x)
}

/// Builds a homogeneous 2D transform matrix out of translation, rotation (radians)
/// and non-uniform scaling, combined as `T * R * S`.
#[inline]
pub fn compose_transform(
    position: Vector2<f32>,
    rotation: f32,
    scale: Vector2<f32>,
) -> Matrix3<f32> {
    Matrix3::new_translation(&position)
        * Matrix3::new_rotation(rotation)
        * Matrix3::new_nonuniform_scaling(&scale)
}

/// Transforms a point by a homogeneous 2D matrix.
#[inline]
pub fn transform_point(m: &Matrix3<f32>, p: Vector2<f32>) -> Vector2<f32> {
    let v = m * crate::algebra::Vector3::new(p.x, p.y, 1.0);
    Vector2::new(v.x, v.y)
}

/// Transforms a direction by a homogeneous 2D matrix, ignoring translation.
#[inline]
pub fn transform_vector(m: &Matrix3<f32>, v: Vector2<f32>) -> Vector2<f32> {
    let v = m * crate::algebra::Vector3::new(v.x, v.y, 0.0);
    Vector2::new(v.x, v.y)
}

/// Replaces a non-finite value with the given fallback. Used at construction
/// boundaries where user input must never poison the simulation.
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
