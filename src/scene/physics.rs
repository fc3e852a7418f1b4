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

//! Per-entity physics integration with sub-stepping.
//!
//! Sub-stepping is the engine's only continuous collision detection mechanism:
//! each sub-move is bounded to at most 80% of the entity's smallest dimension
//! and the step count is capped at 10, so a fast entity cannot tunnel through
//! a surface thicker than itself within one tick.
//!
//! Gravity gating and the velocity constraint consult only contact normals
//! recorded against *static* neighbours, so a floor stops a falling entity but
//! a dynamic entity resting against another dynamic one keeps accelerating.

use crate::{core::algebra::Vector2, scene::entity::Entity};

/// Fraction of the smallest entity dimension a single sub-move may cover.
const MAX_STEP_FACTOR: f32 = 0.8;
/// Dimension assumed for entities whose width and height are both zero.
const FALLBACK_DIMENSION: f32 = 10.0;
/// Upper bound on substeps per tick.
const MAX_SUBSTEPS: u32 = 10;
/// Downward speeds below this against a supporting surface latch to rest.
const REST_LATCH_SPEED: f32 = 5.0;
/// Residual speed below which a constrained velocity snaps to zero.
const REST_SNAP_SPEED: f32 = 1.0;
/// Maximum along-normal component allowed for the rest snap.
const REST_SNAP_NORMAL_SPEED: f32 = 0.5;

/// Integrates one entity by `dt` seconds. Static entities and entities with no
/// physics fields are left untouched.
pub(crate) fn integrate(entity: &mut Entity, dt: f32) {
    if entity.is_static() || dt <= 0.0 {
        return;
    }

    if entity.velocity_x.is_none()
        && entity.velocity_y.is_none()
        && entity.gravity.is_none()
        && entity.friction.is_none()
    {
        return;
    }

    let mut velocity = Vector2::new(
        entity.velocity_x.unwrap_or(0.0),
        entity.velocity_y.unwrap_or(0.0),
    );

    // The fallback dimension applies only when both dimensions are zero. An
    // entity with a single zero dimension has a zero step bound; no finite
    // substep count can honor it, so the cap is all that is left.
    let min_dimension = if entity.size.x == 0.0 && entity.size.y == 0.0 {
        FALLBACK_DIMENSION
    } else {
        entity.size.x.min(entity.size.y)
    };
    let max_step = MAX_STEP_FACTOR * min_dimension;
    let substeps = if max_step > 0.0 {
        ((velocity.norm() * dt / max_step).ceil() as u32).clamp(1, MAX_SUBSTEPS)
    } else if velocity.norm() > 0.0 {
        MAX_SUBSTEPS
    } else {
        1
    };
    let sub_dt = dt / substeps as f32;

    for _ in 0..substeps {
        // Gravity, gated by supporting static contacts.
        let mut applied_gravity = 0.0;
        if let Some(gravity) = entity.gravity {
            let gravity_step = Vector2::new(0.0, gravity * sub_dt);
            let supported = entity
                .contacts
                .values()
                .any(|c| c.other_static && gravity_step.dot(&c.normal) < 0.0);

            if supported {
                // Rest latch: a slow downward drift against a supporting
                // surface is treated as standing still.
                if velocity.y > 0.0 && velocity.y < REST_LATCH_SPEED {
                    velocity.y = 0.0;
                }
            } else {
                velocity.y += gravity * sub_dt;
                applied_gravity = gravity;
            }
        }

        // Constrain velocity against every static surface currently touched.
        for contact in entity.contacts.values().filter(|c| c.other_static) {
            let along_normal = velocity.dot(&contact.normal);
            if along_normal < 0.0 {
                velocity -= contact.normal.scale(along_normal);
                if velocity.norm() < REST_SNAP_SPEED
                    && velocity.dot(&contact.normal).abs() <= REST_SNAP_NORMAL_SPEED
                {
                    velocity = Vector2::new(0.0, 0.0);
                }
            }
        }

        // Integrate position. Gravity contributes with its trapezoidal
        // correction so the displacement matches constant-acceleration
        // kinematics regardless of the substep count.
        entity.position.x += velocity.x * sub_dt;
        entity.position.y += velocity.y * sub_dt - 0.5 * applied_gravity * sub_dt * sub_dt;
    }

    // Friction applies once per tick, after all substeps; applying it per
    // substep would make drag depend on the substep count rather than time.
    if let Some(friction) = entity.friction {
        velocity.x *= friction;
        velocity.y *= friction;
    }

    if entity.velocity_x.is_some() || velocity.x != 0.0 {
        entity.velocity_x = Some(velocity.x);
    }
    if entity.velocity_y.is_some() || entity.gravity.is_some() || velocity.y != 0.0 {
        entity.velocity_y = Some(velocity.y);
    }
}

#[cfg(test)]
mod test {
    use super::integrate;
    use crate::{
        core::{algebra::Vector2, pool::Handle},
        scene::entity::{Contact, EntityBuilder},
    };
    use approx::assert_relative_eq;

    #[test]
    fn free_fall_matches_kinematics() {
        let mut entity = EntityBuilder::new()
            .with_position(100.0, 100.0)
            .with_velocity(0.0, 0.0)
            .with_gravity(980.0)
            .build();

        integrate(&mut entity, 0.1);

        assert_relative_eq!(entity.velocity_y().unwrap(), 98.0, epsilon = 1e-3);
        assert_relative_eq!(entity.y(), 104.9, epsilon = 1e-2);
        assert_relative_eq!(entity.x(), 100.0);
        assert_eq!(entity.rotation(), 0.0);
    }

    #[test]
    fn inert_entity_is_untouched() {
        let mut entity = EntityBuilder::new().with_position(5.0, 6.0).build();
        integrate(&mut entity, 0.1);
        assert_eq!(entity.position(), Vector2::new(5.0, 6.0));
        assert!(entity.velocity_y().is_none());
    }

    #[test]
    fn static_entity_is_untouched() {
        let mut entity = EntityBuilder::new()
            .with_velocity(100.0, 100.0)
            .with_static()
            .build();
        integrate(&mut entity, 0.1);
        assert_eq!(entity.position(), Vector2::new(0.0, 0.0));
    }

    #[test]
    fn constant_velocity_moves_linearly() {
        let mut entity = EntityBuilder::new()
            .with_size(20.0, 20.0)
            .with_velocity(50.0, -30.0)
            .build();
        integrate(&mut entity, 0.5);
        assert_relative_eq!(entity.x(), 25.0, epsilon = 1e-4);
        assert_relative_eq!(entity.y(), -15.0, epsilon = 1e-4);
    }

    #[test]
    fn gravity_is_gated_by_supporting_static_contact() {
        let mut entity = EntityBuilder::new()
            .with_velocity(0.0, 0.0)
            .with_gravity(980.0)
            .build();
        // A floor below: its normal pushes the entity up (negative y).
        entity.contacts.insert(
            Handle::NONE,
            Contact {
                normal: Vector2::new(0.0, -1.0),
                other_static: true,
            },
        );

        integrate(&mut entity, 0.1);

        assert_relative_eq!(entity.velocity_y().unwrap(), 0.0);
        assert_relative_eq!(entity.y(), 0.0);
    }

    #[test]
    fn gravity_is_not_gated_by_dynamic_contact() {
        let mut entity = EntityBuilder::new()
            .with_velocity(0.0, 0.0)
            .with_gravity(980.0)
            .build();
        entity.contacts.insert(
            Handle::NONE,
            Contact {
                normal: Vector2::new(0.0, -1.0),
                other_static: false,
            },
        );

        integrate(&mut entity, 0.1);

        assert!(entity.velocity_y().unwrap() > 0.0);
    }

    #[test]
    fn velocity_into_static_surface_is_constrained() {
        let mut entity = EntityBuilder::new()
            .with_size(10.0, 10.0)
            .with_velocity(40.0, 100.0)
            .build();
        entity.contacts.insert(
            Handle::NONE,
            Contact {
                normal: Vector2::new(0.0, -1.0),
                other_static: true,
            },
        );

        integrate(&mut entity, 0.1);

        // The downward component is removed, the tangential one survives.
        assert_relative_eq!(entity.velocity_y().unwrap(), 0.0);
        assert_relative_eq!(entity.velocity_x().unwrap(), 40.0);
        assert_relative_eq!(entity.y(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn slow_residual_velocity_snaps_to_rest() {
        let mut entity = EntityBuilder::new()
            .with_size(10.0, 10.0)
            .with_velocity(0.4, 2.0)
            .build();
        entity.contacts.insert(
            Handle::NONE,
            Contact {
                normal: Vector2::new(0.0, -1.0),
                other_static: true,
            },
        );

        integrate(&mut entity, 0.016);

        assert_relative_eq!(entity.velocity_x().unwrap(), 0.0);
        assert_relative_eq!(entity.velocity_y().unwrap(), 0.0);
    }

    #[test]
    fn friction_applies_once_per_tick() {
        let mut entity = EntityBuilder::new()
            // A tiny entity forces the maximum substep count.
            .with_size(1.0, 1.0)
            .with_velocity(500.0, 0.0)
            .with_friction(0.5)
            .build();

        integrate(&mut entity, 0.1);

        // One friction application, not one per substep.
        assert_relative_eq!(entity.velocity_x().unwrap(), 250.0, epsilon = 1e-3);
    }

    #[test]
    fn single_zero_dimension_takes_the_substep_cap_without_nan() {
        let mut entity = EntityBuilder::new()
            .with_size(0.0, 50.0)
            .with_velocity(80.0, 0.0)
            .build();

        integrate(&mut entity, 0.1);

        // The zero step bound routes through the cap; the displacement is
        // still exact and finite.
        assert_relative_eq!(entity.x(), 8.0, epsilon = 1e-4);
        assert!(entity.velocity_x().unwrap().is_finite());
    }

    #[test]
    fn single_zero_dimension_at_rest_stays_finite() {
        let mut entity = EntityBuilder::new()
            .with_size(30.0, 0.0)
            .with_velocity(0.0, 0.0)
            .with_gravity(980.0)
            .build();

        integrate(&mut entity, 0.1);

        assert_relative_eq!(entity.velocity_y().unwrap(), 98.0, epsilon = 1e-3);
        assert_relative_eq!(entity.y(), 4.9, epsilon = 1e-2);
    }

    #[test]
    fn substep_count_is_capped() {
        let mut entity = EntityBuilder::new()
            .with_size(1.0, 1.0)
            .with_velocity(10_000.0, 0.0)
            .build();
        integrate(&mut entity, 0.1);
        // Position integration stays finite and exact despite the cap.
        assert_relative_eq!(entity.x(), 1000.0, epsilon = 1e-2);
    }
}
