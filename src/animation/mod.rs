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

//! Declarative property animation: tweens interpolate numeric entity properties
//! over time through an easing curve, scheduled by a [`TweenManager`] owned by
//! the host engine.

pub mod easing;
pub mod spritesheet;

use crate::{
    animation::easing::Easing,
    core::{
        log::Log,
        math::lerpf,
        pool::{Handle, Pool},
    },
    scene::{entity::Entity, Scene, SceneContext},
};
use std::str::FromStr;
use strum_macros::{AsRefStr, EnumString};

/// Errors produced when constructing a tween.
#[derive(Debug, thiserror::Error)]
pub enum TweenError {
    /// The property name does not match any tweenable numeric field.
    #[error("unknown tween property `{0}`")]
    UnknownProperty(String),
    /// The easing curve name does not match any named curve.
    #[error("unknown easing curve `{0}`")]
    UnknownEasing(String),
}

/// A tweenable numeric field of an entity. Only these fields can be animated;
/// unknown property names are rejected when the tween is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr, EnumString)]
pub enum TweenProperty {
    #[strum(serialize = "x")]
    X,
    #[strum(serialize = "y")]
    Y,
    #[strum(serialize = "rotation")]
    Rotation,
    #[strum(serialize = "scaleX")]
    ScaleX,
    #[strum(serialize = "scaleY")]
    ScaleY,
    #[strum(serialize = "alpha")]
    Alpha,
    #[strum(serialize = "width")]
    Width,
    #[strum(serialize = "height")]
    Height,
    #[strum(serialize = "radius")]
    Radius,
}

impl TweenProperty {
    /// Parses a property name, e.g. `"scaleX"`.
    pub fn from_name(name: &str) -> Result<Self, TweenError> {
        Self::from_str(name).map_err(|_| TweenError::UnknownProperty(name.to_owned()))
    }
}

/// Current lifecycle stage of a tween.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TweenState {
    /// Waiting for its delay to elapse.
    Pending,
    /// Actively interpolating.
    Running,
    /// Reached the end of its duration; `on_complete` has fired.
    Completed,
    /// Explicitly stopped; `on_complete` will never fire.
    Stopped,
}

/// Per-advance progress callback.
pub type TweenUpdateCallback = Box<dyn FnMut(&mut SceneContext, f32)>;
/// One-shot completion callback. Receives the scene and the manager, so it can
/// start the next tween in a chain.
pub type TweenCompleteCallback = Box<dyn FnOnce(&mut SceneContext)>;

/// A time-bounded animation of one or more numeric properties of a single
/// entity. Start values are captured when the tween first starts running (after
/// its delay), not when it is built, so chained tweens pick up the latest
/// values.
pub struct Tween {
    target: Handle<Entity>,
    properties: Vec<(TweenProperty, f32)>,
    start_values: Option<Vec<f32>>,
    duration: f32,
    delay: f32,
    elapsed: f32,
    easing: Easing,
    state: TweenState,
    on_update: Option<TweenUpdateCallback>,
    on_complete: Option<TweenCompleteCallback>,
}

impl Tween {
    pub fn target(&self) -> Handle<Entity> {
        self.target
    }

    pub fn state(&self) -> TweenState {
        self.state
    }
}

/// Builder for [`Tween`].
pub struct TweenBuilder {
    target: Handle<Entity>,
    properties: Vec<(TweenProperty, f32)>,
    duration: f32,
    delay: f32,
    easing: Easing,
    on_update: Option<TweenUpdateCallback>,
    on_complete: Option<TweenCompleteCallback>,
}

impl TweenBuilder {
    pub fn new(target: Handle<Entity>) -> Self {
        Self {
            target,
            properties: Vec::new(),
            duration: 0.0,
            delay: 0.0,
            easing: Easing::Linear,
            on_update: None,
            on_complete: None,
        }
    }

    /// Animates the given property towards `end_value`. Non-finite end values
    /// are dropped at this boundary so they can never poison the target.
    pub fn with_property(mut self, property: TweenProperty, end_value: f32) -> Self {
        if end_value.is_finite() {
            self.properties.push((property, end_value));
        } else {
            Log::warn(format!(
                "Dropping non-finite end value for tween property `{}`.",
                property.as_ref()
            ));
        }
        self
    }

    /// Animates a property by its documented name, e.g. `"scaleX"`. Unknown
    /// names are rejected here rather than silently ignored at run time.
    pub fn with_property_by_name(self, name: &str, end_value: f32) -> Result<Self, TweenError> {
        Ok(self.with_property(TweenProperty::from_name(name)?, end_value))
    }

    /// Sets the easing curve by its documented name, e.g. `"bounceOut"`.
    pub fn with_easing_by_name(self, name: &str) -> Result<Self, TweenError> {
        Ok(self.with_easing(Easing::from_name(name)?))
    }

    crate::define_with!(
        /// Sets the duration in seconds.
        fn with_duration(duration: f32)
    );

    crate::define_with!(
        /// Sets the start delay in seconds.
        fn with_delay(delay: f32)
    );

    crate::define_with!(
        /// Sets the easing curve.
        fn with_easing(easing: Easing)
    );

    /// Sets a callback invoked on every advance with linear progress in `[0; 1]`.
    pub fn with_on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut SceneContext, f32) + 'static,
    {
        self.on_update = Some(Box::new(callback));
        self
    }

    /// Sets a one-shot callback invoked when the tween reaches its full
    /// duration. The callback receives the scene and the tween manager, which
    /// makes it the sequencing primitive: start the next tween from it to
    /// chain animations.
    pub fn with_on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&mut SceneContext) + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Tween {
        Tween {
            target: self.target,
            properties: self.properties,
            start_values: None,
            duration: self.duration.max(0.0),
            delay: self.delay.max(0.0),
            elapsed: 0.0,
            easing: self.easing,
            state: TweenState::Pending,
            on_update: self.on_update,
            on_complete: self.on_complete,
        }
    }
}

/// Owns every running tween. The manager lives on the host engine and is
/// passed down into scene callbacks, so any callback can schedule new tweens
/// or stop existing ones. Completed and stopped tweens are swept out at the end
/// of each advance.
#[derive(Default)]
pub struct TweenManager {
    pool: Pool<Tween>,
}

impl TweenManager {
    pub fn new() -> Self {
        Self { pool: Pool::new() }
    }

    /// Adds a tween to the schedule. Tweens added from inside a callback are
    /// first advanced on the next frame.
    pub fn add(&mut self, tween: Tween) -> Handle<Tween> {
        self.pool.spawn(tween)
    }

    /// Stops a tween. Its `on_complete` callback will not fire, and the tween
    /// is removed on the next sweep.
    pub fn stop(&mut self, handle: Handle<Tween>) {
        if let Some(tween) = self.pool.try_borrow_mut(handle) {
            if tween.state != TweenState::Completed {
                tween.state = TweenState::Stopped;
            }
        }
    }

    pub fn is_alive(&self, handle: Handle<Tween>) -> bool {
        self.pool
            .try_borrow(handle)
            .is_some_and(|t| matches!(t.state, TweenState::Pending | TweenState::Running))
    }

    pub fn alive_count(&self) -> u32 {
        self.pool.alive_count()
    }

    /// Advances every scheduled tween by `dt` seconds, writing interpolated
    /// values back into the scene.
    pub fn update(&mut self, scene: &mut Scene, dt: f32) {
        let handles = self.pool.pair_iter().map(|(h, _)| h).collect::<Vec<_>>();

        for handle in handles {
            self.advance_one(scene, handle, dt);
        }

        self.pool
            .retain(|t| matches!(t.state, TweenState::Pending | TweenState::Running));
    }

    fn advance_one(&mut self, scene: &mut Scene, handle: Handle<Tween>, dt: f32) {
        let Some(tween) = self.pool.try_borrow_mut(handle) else {
            return;
        };

        if !matches!(tween.state, TweenState::Pending | TweenState::Running) {
            return;
        }

        let mut remaining = dt;

        if tween.state == TweenState::Pending {
            if tween.delay > 0.0 {
                let consumed = remaining.min(tween.delay);
                tween.delay -= consumed;
                remaining -= consumed;
            }

            if tween.delay > 0.0 {
                return;
            }

            tween.state = TweenState::Running;
        }

        // Capture start values on the first running advance so chained tweens
        // operate on the latest property values.
        if tween.start_values.is_none() {
            let Some(entity) = scene.try_get(tween.target) else {
                Log::warn("Tween target is dead, dropping the tween.");
                tween.state = TweenState::Stopped;
                return;
            };
            tween.start_values = Some(
                tween
                    .properties
                    .iter()
                    .map(|(property, _)| entity.property(*property))
                    .collect(),
            );
        }

        tween.elapsed += remaining;
        let progress = if tween.duration > 0.0 {
            (tween.elapsed / tween.duration).min(1.0)
        } else {
            1.0
        };
        let eased = tween.easing.ease(progress);
        let finished = progress >= 1.0;

        let writes = tween
            .start_values
            .as_ref()
            .expect("start values are captured above")
            .iter()
            .zip(tween.properties.iter())
            .map(|(start, (property, end))| (*property, lerpf(*start, *end, eased)))
            .collect::<Vec<_>>();

        if finished {
            tween.state = TweenState::Completed;
        }

        let target = tween.target;
        let on_update = tween.on_update.take();
        let on_complete = if finished {
            tween.on_complete.take()
        } else {
            None
        };

        if let Some(entity) = scene.try_get_mut(target) {
            for (property, value) in writes {
                entity.set_property(property, value);
            }
        }

        if let Some(mut callback) = on_update {
            callback(
                &mut SceneContext {
                    scene: &mut *scene,
                    tweens: &mut *self,
                },
                progress,
            );
            if let Some(tween) = self.pool.try_borrow_mut(handle) {
                tween.on_update = Some(callback);
            }
        }

        if let Some(callback) = on_complete {
            callback(&mut SceneContext {
                scene: &mut *scene,
                tweens: &mut *self,
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scene::entity::EntityBuilder;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn linear_tween_interpolates_position() {
        let mut scene = Scene::new();
        let mut tweens = TweenManager::new();
        let sprite = scene.add(EntityBuilder::new().with_position(0.0, 0.0).build());

        tweens.add(
            TweenBuilder::new(sprite)
                .with_property(TweenProperty::X, 400.0)
                .with_duration(1.0)
                .build(),
        );

        tweens.update(&mut scene, 0.25);
        assert_relative_eq!(scene.get(sprite).x(), 100.0, epsilon = 1e-3);

        tweens.update(&mut scene, 0.75);
        assert_relative_eq!(scene.get(sprite).x(), 400.0, epsilon = 1e-3);
    }

    #[test]
    fn delay_is_consumed_before_interpolation() {
        let mut scene = Scene::new();
        let mut tweens = TweenManager::new();
        let sprite = scene.add(EntityBuilder::new().build());

        tweens.add(
            TweenBuilder::new(sprite)
                .with_property(TweenProperty::X, 100.0)
                .with_duration(1.0)
                .with_delay(0.5)
                .build(),
        );

        tweens.update(&mut scene, 0.5);
        assert_relative_eq!(scene.get(sprite).x(), 0.0);

        tweens.update(&mut scene, 0.5);
        assert_relative_eq!(scene.get(sprite).x(), 50.0, epsilon = 1e-3);
    }

    #[test]
    fn on_complete_fires_exactly_once() {
        let mut scene = Scene::new();
        let mut tweens = TweenManager::new();
        let sprite = scene.add(EntityBuilder::new().build());
        let fired = Rc::new(Cell::new(0u32));

        let fired_clone = fired.clone();
        tweens.add(
            TweenBuilder::new(sprite)
                .with_property(TweenProperty::Alpha, 0.0)
                .with_duration(0.2)
                .with_on_complete(move |_| fired_clone.set(fired_clone.get() + 1))
                .build(),
        );

        for _ in 0..10 {
            tweens.update(&mut scene, 0.1);
        }

        assert_eq!(fired.get(), 1);
        assert_eq!(tweens.alive_count(), 0);
    }

    #[test]
    fn stop_suppresses_on_complete() {
        let mut scene = Scene::new();
        let mut tweens = TweenManager::new();
        let sprite = scene.add(EntityBuilder::new().build());
        let fired = Rc::new(Cell::new(false));

        let fired_clone = fired.clone();
        let handle = tweens.add(
            TweenBuilder::new(sprite)
                .with_property(TweenProperty::X, 10.0)
                .with_duration(1.0)
                .with_on_complete(move |_| fired_clone.set(true))
                .build(),
        );

        tweens.update(&mut scene, 0.5);
        tweens.stop(handle);
        tweens.update(&mut scene, 1.0);

        assert!(!fired.get());
        assert_eq!(tweens.alive_count(), 0);
    }

    #[test]
    fn chained_tween_starts_from_latest_value() {
        let mut scene = Scene::new();
        let mut tweens = TweenManager::new();
        let sprite = scene.add(EntityBuilder::new().build());

        tweens.add(
            TweenBuilder::new(sprite)
                .with_property(TweenProperty::X, 100.0)
                .with_duration(0.5)
                .with_on_complete(move |ctx| {
                    let next = TweenBuilder::new(sprite)
                        .with_property(TweenProperty::X, 0.0)
                        .with_duration(0.5)
                        .build();
                    ctx.tweens.add(next);
                })
                .build(),
        );

        tweens.update(&mut scene, 0.5);
        assert_relative_eq!(scene.get(sprite).x(), 100.0, epsilon = 1e-3);

        // The chained tween captures x = 100 as its start value.
        tweens.update(&mut scene, 0.25);
        assert_relative_eq!(scene.get(sprite).x(), 50.0, epsilon = 1e-3);
    }

    #[test]
    fn unknown_property_name_is_rejected() {
        let result =
            TweenBuilder::new(Handle::NONE).with_property_by_name("bogus", 1.0);
        assert!(matches!(result, Err(TweenError::UnknownProperty(_))));
    }

    #[test]
    fn non_finite_end_value_is_dropped() {
        let mut scene = Scene::new();
        let mut tweens = TweenManager::new();
        let sprite = scene.add(EntityBuilder::new().with_position(5.0, 0.0).build());

        tweens.add(
            TweenBuilder::new(sprite)
                .with_property(TweenProperty::X, f32::NAN)
                .with_duration(0.1)
                .build(),
        );
        tweens.update(&mut scene, 0.2);

        assert_relative_eq!(scene.get(sprite).x(), 5.0);
    }
}
