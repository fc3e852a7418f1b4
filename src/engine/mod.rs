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

//! The host engine: owns the scene, the tween manager, the camera and the
//! gesture recognizer, and drives the four-phase tick: input ingestion, event
//! dispatch, simulation step, render.
//!
//! The host calls [`Engine::tick`] (or [`Engine::frame`]) once per animation
//! frame. The tick clamps `dt` to the configured maximum and, when a target
//! FPS is set, skips frames whose accumulated wall-clock delta is below the
//! target period. Rendering is a separate, read-only call.

pub mod config;
pub mod error;

use crate::{
    animation::{Tween, TweenBuilder, TweenManager},
    core::{
        algebra::Vector2,
        color::Color,
        pool::Handle,
    },
    engine::{config::EngineConfig, error::EngineError},
    input::{gesture::GestureRecognizer, PointerSample, PointerSource},
    render::{AssetStore, DrawContext, TextAlign, TextBaseline},
    scene::{camera::Camera2d, entity::Entity, Scene},
};
use instant::Instant;
use std::collections::VecDeque;

const FPS_FONT: &str = "12px monospace";

/// Smoothed frames-per-second estimate, refreshed twice a second.
#[derive(Default)]
pub struct FpsCounter {
    frames: u32,
    accumulator: f32,
    fps: f32,
}

impl FpsCounter {
    fn update(&mut self, dt: f32) {
        self.frames += 1;
        self.accumulator += dt;
        if self.accumulator >= 0.5 {
            self.fps = self.frames as f32 / self.accumulator;
            self.frames = 0;
            self.accumulator = 0.0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// See module docs.
pub struct Engine {
    pub scene: Scene,
    pub tweens: TweenManager,
    pub camera: Camera2d,
    config: EngineConfig,
    recognizer: GestureRecognizer,
    pointer_queue: VecDeque<PointerSample>,
    /// Accumulated simulated time in seconds; also the clock gesture
    /// recognition runs on.
    clock: f32,
    /// Wall-clock time accumulated towards the next frame when pacing to a
    /// target FPS.
    frame_accumulator: f32,
    fps: FpsCounter,
    last_instant: Option<Instant>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scene: Scene::new(),
            tweens: TweenManager::new(),
            camera: Camera2d::default(),
            config: config.sanitized(),
            recognizer: GestureRecognizer::new(),
            pointer_queue: VecDeque::new(),
            clock: 0.0,
            frame_accumulator: 0.0,
            fps: FpsCounter::default(),
            last_instant: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Total simulated time in seconds.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    /// Queues a canvas-space pointer sample for the next tick.
    pub fn push_pointer(&mut self, sample: PointerSample) {
        self.pointer_queue.push_back(sample);
    }

    /// Drains a pointer source into the queue, preserving receipt order.
    pub fn pump_pointer_source(&mut self, source: &mut dyn PointerSource) {
        while let Some(sample) = source.next_sample() {
            self.pointer_queue.push_back(sample);
        }
    }

    /// Runs one tick, measuring `dt` from the wall clock. Returns `false` if
    /// the frame was skipped by FPS pacing.
    pub fn frame(&mut self) -> bool {
        let now = Instant::now();
        let raw_dt = self
            .last_instant
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_instant = Some(now);
        self.tick(raw_dt)
    }

    /// Runs one tick with an explicit raw `dt` in seconds. The effective
    /// simulation step is clamped to `max_dt_seconds`. Returns `false` if the
    /// frame was skipped by FPS pacing.
    pub fn tick(&mut self, raw_dt: f32) -> bool {
        self.frame_accumulator += raw_dt.max(0.0);

        if let Some(target_fps) = self.config.target_fps {
            if self.frame_accumulator < 1.0 / target_fps {
                return false;
            }
        }

        let dt = self.frame_accumulator.min(self.config.max_dt_seconds);
        self.frame_accumulator = 0.0;
        self.clock += dt;

        // Hit testing during input ingestion must see current draw order.
        self.scene.ensure_sorted();

        let mut gestures = Vec::new();
        while let Some(mut sample) = self.pointer_queue.pop_front() {
            sample.position = self.camera.screen_to_world(sample.position);
            // Samples are re-stamped onto the simulation clock, so gesture
            // timing stays consistent with what the scene actually simulated.
            sample.time = self.clock;
            self.recognizer.process(sample, &self.scene, &mut gestures);
        }
        self.recognizer.tick(self.clock, &mut gestures);

        for gesture in gestures {
            let event = gesture.to_event();
            // Target entity first, then the scene surface; the payload keeps
            // the target so surface handlers can skip already-handled events.
            if gesture.target.is_some() {
                self.scene.dispatch(&mut self.tweens, gesture.target, &event);
            }
            self.scene.dispatch(&mut self.tweens, Handle::NONE, &event);
        }

        self.scene.update(dt, &mut self.tweens);
        self.fps.update(dt);
        true
    }

    /// Renders the scene and, when configured, the FPS overlay. Mutates no
    /// simulation state.
    pub fn render(&self, ctx: &mut dyn DrawContext, assets: &dyn AssetStore) {
        self.scene.render(ctx, assets);

        if self.config.show_fps {
            let text = format!("FPS: {:.0}", self.fps.fps());
            let width = ctx.measure_text(&text, FPS_FONT);
            ctx.draw_text(
                &text,
                FPS_FONT,
                Color::WHITE,
                Vector2::new(self.camera.viewport.x - width - 8.0, 8.0),
                TextAlign::Left,
                TextBaseline::Top,
            );
        }
    }

    /// Starts a tween described by property and easing names, mirroring the
    /// string-driven API of dynamic hosts. Unknown names are rejected before
    /// anything is scheduled.
    pub fn start_tween(
        &mut self,
        target: Handle<Entity>,
        properties: &[(&str, f32)],
        duration: f32,
        easing: &str,
    ) -> Result<Handle<Tween>, EngineError> {
        let mut builder = TweenBuilder::new(target)
            .with_duration(duration)
            .with_easing_by_name(easing)?;
        for &(name, value) in properties {
            builder = builder.with_property_by_name(name, value)?;
        }
        Ok(self.tweens.add(builder.build()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        input::PointerPhase,
        scene::{entity::EntityBuilder, event::EventKind},
    };
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn pointer(id: u64, x: f32, y: f32, phase: PointerPhase) -> PointerSample {
        PointerSample {
            id,
            position: Vector2::new(x, y),
            time: 0.0,
            phase,
        }
    }

    #[test]
    fn dt_is_clamped_to_configured_maximum() {
        let mut engine = Engine::default();
        let sprite = engine.scene.add(
            EntityBuilder::new()
                .with_size(10.0, 10.0)
                .with_velocity(100.0, 0.0)
                .build(),
        );

        // Ten simulated seconds in one tick: the step must clamp to 0.1.
        engine.tick(10.0);

        assert_relative_eq!(engine.scene.get(sprite).x(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn target_fps_skips_fast_frames() {
        let mut engine = Engine::new(EngineConfig {
            target_fps: Some(10.0),
            ..Default::default()
        });

        assert!(!engine.tick(0.05));
        // The skipped frame's time accumulates into the next one.
        assert!(engine.tick(0.06));
        assert_relative_eq!(engine.clock(), 0.1, epsilon = 1e-5);
    }

    #[test]
    fn tap_is_dispatched_to_entity_then_surface() {
        let mut engine = Engine::default();
        // Default camera: canvas (400, 300) is world (0, 0).
        let button = engine.scene.add(
            EntityBuilder::new()
                .with_position(0.0, 0.0)
                .with_size(50.0, 50.0)
                .with_interactive()
                .build(),
        );

        let on_entity = Rc::new(Cell::new(0u32));
        let on_surface = Rc::new(Cell::new(0u32));
        let counter = on_entity.clone();
        engine.scene.on(button, EventKind::Tap, move |_, _| {
            counter.set(counter.get() + 1);
        });
        let counter = on_surface.clone();
        engine
            .scene
            .on(Handle::NONE, EventKind::Tap, move |_, event| {
                // The payload records the entity the tap was delivered to.
                assert!(event.target.is_some());
                counter.set(counter.get() + 1);
            });

        engine.push_pointer(pointer(1, 400.0, 300.0, PointerPhase::Down));
        engine.push_pointer(pointer(1, 402.0, 300.0, PointerPhase::Up));
        engine.tick(0.016);

        assert_eq!(on_entity.get(), 1);
        assert_eq!(on_surface.get(), 1);
    }

    #[test]
    fn held_pointer_long_presses_within_deadline() {
        let mut engine = Engine::default();
        let button = engine.scene.add(
            EntityBuilder::new()
                .with_position(0.0, 0.0)
                .with_size(50.0, 50.0)
                .with_interactive()
                .build(),
        );

        let presses = Rc::new(Cell::new(0u32));
        let counter = presses.clone();
        engine.scene.on(button, EventKind::LongPress, move |_, _| {
            counter.set(counter.get() + 1);
        });

        engine.push_pointer(pointer(1, 400.0, 300.0, PointerPhase::Down));
        // Hold for ~0.6 seconds of frame time.
        for _ in 0..40 {
            engine.tick(0.016);
        }

        assert_eq!(presses.get(), 1);
    }

    #[test]
    fn drag_moves_through_camera_inverse() {
        let mut engine = Engine::default();
        engine.camera.set_zoom(2.0);

        let drags = Rc::new(Cell::new(Vector2::new(0.0f32, 0.0f32)));
        let recorded = drags.clone();
        engine
            .scene
            .on(Handle::NONE, EventKind::Drag, move |_, event| {
                recorded.set(recorded.get() + event.delta);
            });

        engine.push_pointer(pointer(1, 400.0, 300.0, PointerPhase::Down));
        engine.push_pointer(pointer(1, 460.0, 300.0, PointerPhase::Move));
        engine.tick(0.016);

        // 60 canvas pixels at zoom 2 are 30 world units.
        assert_relative_eq!(drags.get().x, 30.0, epsilon = 1e-4);
    }

    #[test]
    fn string_driven_tween_api_validates_names() {
        let mut engine = Engine::default();
        let sprite = engine.scene.add(EntityBuilder::new().build());

        assert!(engine
            .start_tween(sprite, &[("x", 100.0)], 1.0, "quadOut")
            .is_ok());
        assert!(engine
            .start_tween(sprite, &[("bogus", 1.0)], 1.0, "linear")
            .is_err());
        assert!(engine
            .start_tween(sprite, &[("x", 1.0)], 1.0, "zigzag")
            .is_err());
    }

    #[test]
    fn tween_advances_during_tick() {
        let mut engine = Engine::default();
        let sprite = engine.scene.add(EntityBuilder::new().build());
        engine
            .start_tween(sprite, &[("x", 400.0)], 1.0, "linear")
            .unwrap();

        // 0.25 seconds of simulation in dt-sized bites.
        for _ in 0..5 {
            engine.tick(0.05);
        }

        assert_relative_eq!(engine.scene.get(sprite).x(), 100.0, epsilon = 1e-2);
    }
}
