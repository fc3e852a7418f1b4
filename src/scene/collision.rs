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

//! Narrow-phase collision detection and response for mixed circle and
//! (possibly rotated) rectangle shapes.
//!
//! Geometry is computed once per unordered pair from the pre-response state,
//! then each end of the pair runs its own state pipeline: contact bookkeeping,
//! depenetration, velocity response and event emission. Axis-aligned rectangle
//! pairs take the AABB fast path; as soon as either rectangle is rotated the
//! test falls back to the separating axis theorem, which is also what produces
//! a correct normal for oriented boxes.

use crate::{
    animation::TweenManager,
    core::{
        algebra::Vector2,
        math::rotate_vec2,
        pool::Handle,
    },
    scene::{
        entity::{Contact, Entity},
        event::{Event, EventKind},
        Scene,
    },
};

/// Restitution used when a bouncing entity does not specify its own.
pub const DEFAULT_RESTITUTION: f32 = 0.8;

/// Rotations below this threshold are treated as axis-aligned.
const AXIS_ALIGNED_EPSILON: f32 = 1e-6;

/// A collidable shape resolved into world space.
#[derive(Copy, Clone, Debug)]
pub(crate) enum WorldShape {
    Circle {
        center: Vector2<f32>,
        radius: f32,
    },
    Rect {
        center: Vector2<f32>,
        half: Vector2<f32>,
        rotation: f32,
    },
}

/// Result of a narrow-phase test: the direction that pushes the first shape
/// away from the second, and how deep they overlap along it.
#[derive(Copy, Clone, Debug)]
pub struct ContactGeometry {
    pub normal: Vector2<f32>,
    pub depth: f32,
}

fn sign_or_one(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn circle_vs_circle(
    center_a: Vector2<f32>,
    radius_a: f32,
    center_b: Vector2<f32>,
    radius_b: f32,
) -> Option<ContactGeometry> {
    let delta = center_a - center_b;
    let radius_sum = radius_a + radius_b;
    let distance_sq = delta.norm_squared();
    if distance_sq >= radius_sum * radius_sum {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = if distance > f32::EPSILON {
        delta.unscale(distance)
    } else {
        // Coincident centers; any direction separates them.
        Vector2::new(1.0, 0.0)
    };

    Some(ContactGeometry {
        normal,
        depth: radius_sum - distance,
    })
}

/// Normal points from the rectangle towards the circle.
fn circle_vs_rect(
    circle_center: Vector2<f32>,
    radius: f32,
    rect_center: Vector2<f32>,
    half: Vector2<f32>,
    rotation: f32,
) -> Option<ContactGeometry> {
    // Bring the circle center into the rectangle's local frame, where the
    // rectangle is an AABB around the origin.
    let local = rotate_vec2(circle_center - rect_center, -rotation);
    let clamped = Vector2::new(
        local.x.clamp(-half.x, half.x),
        local.y.clamp(-half.y, half.y),
    );
    let delta = local - clamped;
    let distance_sq = delta.norm_squared();

    if distance_sq > f32::EPSILON {
        if distance_sq >= radius * radius {
            return None;
        }
        let distance = distance_sq.sqrt();
        Some(ContactGeometry {
            normal: rotate_vec2(delta.unscale(distance), rotation),
            depth: radius - distance,
        })
    } else {
        // Circle center inside the rectangle: push out along the axis of
        // least distance to a face.
        let to_face_x = half.x - local.x.abs();
        let to_face_y = half.y - local.y.abs();
        let local_normal = if to_face_x < to_face_y {
            Vector2::new(sign_or_one(local.x), 0.0)
        } else {
            Vector2::new(0.0, sign_or_one(local.y))
        };
        Some(ContactGeometry {
            normal: rotate_vec2(local_normal, rotation),
            depth: radius + to_face_x.min(to_face_y),
        })
    }
}

fn rect_corners(center: Vector2<f32>, half: Vector2<f32>, rotation: f32) -> [Vector2<f32>; 4] {
    [
        center + rotate_vec2(Vector2::new(-half.x, -half.y), rotation),
        center + rotate_vec2(Vector2::new(half.x, -half.y), rotation),
        center + rotate_vec2(Vector2::new(half.x, half.y), rotation),
        center + rotate_vec2(Vector2::new(-half.x, half.y), rotation),
    ]
}

fn project(corners: &[Vector2<f32>; 4], axis: Vector2<f32>) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = -f32::MAX;
    for corner in corners {
        let p = corner.dot(&axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

fn rect_vs_rect_axis_aligned(
    center_a: Vector2<f32>,
    half_a: Vector2<f32>,
    center_b: Vector2<f32>,
    half_b: Vector2<f32>,
) -> Option<ContactGeometry> {
    let delta = center_a - center_b;
    let overlap_x = half_a.x + half_b.x - delta.x.abs();
    if overlap_x <= 0.0 {
        return None;
    }
    let overlap_y = half_a.y + half_b.y - delta.y.abs();
    if overlap_y <= 0.0 {
        return None;
    }

    // Separate along the axis of minimum penetration, oriented by the sign of
    // the center delta.
    if overlap_x < overlap_y {
        Some(ContactGeometry {
            normal: Vector2::new(sign_or_one(delta.x), 0.0),
            depth: overlap_x,
        })
    } else {
        Some(ContactGeometry {
            normal: Vector2::new(0.0, sign_or_one(delta.y)),
            depth: overlap_y,
        })
    }
}

fn rect_vs_rect_sat(
    center_a: Vector2<f32>,
    half_a: Vector2<f32>,
    rotation_a: f32,
    center_b: Vector2<f32>,
    half_b: Vector2<f32>,
    rotation_b: f32,
) -> Option<ContactGeometry> {
    let corners_a = rect_corners(center_a, half_a, rotation_a);
    let corners_b = rect_corners(center_b, half_b, rotation_b);

    let mut axes = [
        rotate_vec2(Vector2::new(1.0, 0.0), rotation_a),
        rotate_vec2(Vector2::new(0.0, 1.0), rotation_a),
        rotate_vec2(Vector2::new(1.0, 0.0), rotation_b),
        rotate_vec2(Vector2::new(0.0, 1.0), rotation_b),
    ];
    let mut axis_count = axes.len();
    // When the boxes share an orientation the second pair of axes duplicates
    // the first; drop them to keep the edge-normal set unique.
    if (rotate_vec2(Vector2::new(1.0, 0.0), rotation_a)
        .perp(&rotate_vec2(Vector2::new(1.0, 0.0), rotation_b)))
    .abs()
        < AXIS_ALIGNED_EPSILON
    {
        axis_count = 2;
    }

    let mut min_overlap = f32::MAX;
    let mut best_axis = Vector2::new(0.0, 1.0);

    for axis in axes.iter_mut().take(axis_count) {
        let (min_a, max_a) = project(&corners_a, *axis);
        let (min_b, max_b) = project(&corners_b, *axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= 0.0 {
            return None;
        }
        if overlap < min_overlap {
            min_overlap = overlap;
            best_axis = *axis;
        }
    }

    debug_assert!(min_overlap > 0.0);

    if (center_a - center_b).dot(&best_axis) < 0.0 {
        best_axis = -best_axis;
    }

    Some(ContactGeometry {
        normal: best_axis,
        depth: min_overlap,
    })
}

/// Computes contact geometry for an ordered shape pair. The resulting normal
/// pushes `a` away from `b`; `None` means the shapes do not intersect.
pub(crate) fn compute_contact(a: &WorldShape, b: &WorldShape) -> Option<ContactGeometry> {
    match (*a, *b) {
        (
            WorldShape::Circle {
                center: center_a,
                radius: radius_a,
            },
            WorldShape::Circle {
                center: center_b,
                radius: radius_b,
            },
        ) => circle_vs_circle(center_a, radius_a, center_b, radius_b),
        (
            WorldShape::Circle { center, radius },
            WorldShape::Rect {
                center: rect_center,
                half,
                rotation,
            },
        ) => circle_vs_rect(center, radius, rect_center, half, rotation),
        (
            WorldShape::Rect {
                center: rect_center,
                half,
                rotation,
            },
            WorldShape::Circle { center, radius },
        ) => circle_vs_rect(center, radius, rect_center, half, rotation).map(|geometry| {
            // The test pushes the circle away from the rectangle; here `a` is
            // the rectangle, so the separation direction flips.
            ContactGeometry {
                normal: -geometry.normal,
                depth: geometry.depth,
            }
        }),
        (
            WorldShape::Rect {
                center: center_a,
                half: half_a,
                rotation: rotation_a,
            },
            WorldShape::Rect {
                center: center_b,
                half: half_b,
                rotation: rotation_b,
            },
        ) => {
            if rotation_a.abs() < AXIS_ALIGNED_EPSILON && rotation_b.abs() < AXIS_ALIGNED_EPSILON {
                rect_vs_rect_axis_aligned(center_a, half_a, center_b, half_b)
            } else {
                rect_vs_rect_sat(center_a, half_a, rotation_a, center_b, half_b, rotation_b)
            }
        }
    }
}

/// Runs the collision pass over a snapshot of collidable entities. Each
/// unordered pair is considered once; both ends get their own tag filter,
/// contact bookkeeping, physics response and events.
pub(crate) fn collision_pass(scene: &mut Scene, tweens: &mut TweenManager) {
    // Snapshot the participant list so subscribers that mutate the scene
    // cannot invalidate the iteration.
    let participants = scene.collect_collidable();

    for i in 1..participants.len() {
        for j in 0..i {
            process_pair(scene, tweens, participants[i], participants[j]);
        }
    }
}

fn process_pair(
    scene: &mut Scene,
    tweens: &mut TweenManager,
    a: Handle<Entity>,
    b: Handle<Entity>,
) {
    let (a_static, b_static) = {
        let (Some(entity_a), Some(entity_b)) = (scene.try_get(a), scene.try_get(b)) else {
            // One end was destroyed by a subscriber earlier in the pass.
            return;
        };
        if !entity_a.is_active() || !entity_b.is_active() {
            return;
        }
        (entity_a.is_static(), entity_b.is_static())
    };

    if a_static && b_static {
        return;
    }

    // Geometry is evaluated once, before either end mutates positions, so
    // both ends observe the same intersection state and contact tracking
    // stays symmetric.
    let geometry = compute_contact(&scene.world_shape(a), &scene.world_shape(b));

    let mut events = process_end(scene, a, b, geometry, b_static);
    events.extend(process_end(
        scene,
        b,
        a,
        geometry.map(|g| ContactGeometry {
            normal: -g.normal,
            depth: g.depth,
        }),
        a_static,
    ));

    for event in events {
        let target = event.target;
        scene.dispatch(tweens, target, &event);
    }
}

/// Runs one end of the pair pipeline: `this` reacts to `other`.
fn process_end(
    scene: &mut Scene,
    this: Handle<Entity>,
    other: Handle<Entity>,
    geometry: Option<ContactGeometry>,
    other_static: bool,
) -> Vec<Event> {
    let mut events = Vec::new();

    let (was_colliding, accepted, this_static) = {
        let entity = scene.get(this);
        let other_entity = scene.get(other);
        (
            entity.contacts.contains_key(&other),
            entity.accepts_collisions_with(other_entity),
            entity.is_static(),
        )
    };

    if !accepted {
        return events;
    }

    match (was_colliding, geometry) {
        (false, Some(geometry)) => {
            // New contact.
            scene.get_mut(this).contacts.insert(
                other,
                Contact {
                    normal: geometry.normal,
                    other_static,
                },
            );
            depenetrate(scene, this, geometry, this_static, other_static);

            if !this_static {
                bounce(scene, this, geometry.normal);
            }

            let mut collide = Event::collision(EventKind::Collide, other, geometry.normal);
            collide.target = this;
            events.push(collide);
            let mut enter = Event::collision(EventKind::CollisionEnter, other, geometry.normal);
            enter.target = this;
            events.push(enter);
        }
        (true, Some(geometry)) => {
            // Sustained contact: refresh the normal, separate again and kill
            // the into-surface velocity component.
            scene.get_mut(this).contacts.insert(
                other,
                Contact {
                    normal: geometry.normal,
                    other_static,
                },
            );
            depenetrate(scene, this, geometry, this_static, other_static);

            if !this_static {
                let entity = scene.get_mut(this);
                if entity.velocity_x.is_some() || entity.velocity_y.is_some() {
                    let velocity = Vector2::new(
                        entity.velocity_x.unwrap_or(0.0),
                        entity.velocity_y.unwrap_or(0.0),
                    );
                    let along_normal = velocity.dot(&geometry.normal);
                    if along_normal < 0.0 {
                        let constrained = velocity - geometry.normal.scale(along_normal);
                        entity.velocity_x = Some(constrained.x);
                        entity.velocity_y = Some(constrained.y);
                    }
                }
            }

            let mut collide = Event::collision(EventKind::Collide, other, geometry.normal);
            collide.target = this;
            events.push(collide);
        }
        (true, None) => {
            // Contact ended.
            let contact = scene.get_mut(this).contacts.remove(&other);
            let normal = contact.map(|c| c.normal).unwrap_or_default();
            let mut exit = Event::collision(EventKind::CollisionExit, other, normal);
            exit.target = this;
            events.push(exit);
        }
        (false, None) => {}
    }

    events
}

/// Reflects the entity's velocity off the contact normal when it is moving
/// into the surface.
fn bounce(scene: &mut Scene, this: Handle<Entity>, normal: Vector2<f32>) {
    let entity = scene.get_mut(this);
    if entity.velocity_x.is_none() && entity.velocity_y.is_none() {
        return;
    }

    let velocity = Vector2::new(
        entity.velocity_x.unwrap_or(0.0),
        entity.velocity_y.unwrap_or(0.0),
    );
    let along_normal = velocity.dot(&normal);
    if along_normal < 0.0 {
        let restitution = entity.bounciness.unwrap_or(DEFAULT_RESTITUTION);
        let reflected = velocity - normal.scale((1.0 + restitution) * along_normal);
        entity.velocity_x = Some(reflected.x);
        entity.velocity_y = Some(reflected.y);
    }
}

/// One-shot positional correction: a dynamic entity moves away from the
/// contact along the normal, by the full overlap against a static neighbour or
/// by half of it against another dynamic entity. The displacement is mapped
/// into the entity's parent frame so parented entities separate correctly in
/// world space.
fn depenetrate(
    scene: &mut Scene,
    this: Handle<Entity>,
    geometry: ContactGeometry,
    this_static: bool,
    other_static: bool,
) {
    if this_static {
        return;
    }

    let factor = if other_static { 1.0 } else { 0.5 };
    let world_displacement = geometry.normal.scale(geometry.depth * factor);
    let parent = scene.get(this).parent;
    let local_displacement = scene.world_vector_to_local(parent, world_displacement);
    let entity = scene.get_mut(this);
    entity.position += local_displacement;
}
