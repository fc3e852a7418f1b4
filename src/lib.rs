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

//! Gesture-first 2D interactive-media engine.
//!
//! The crate is centered around a per-frame simulation pipeline: pointer samples
//! are recognized into gestures and dispatched to the topmost interactive
//! entity, the scene integrates physics with sub-stepping, the collision system
//! resolves contacts between circles and (possibly rotated) rectangles, and
//! declarative property tweens advance. Rendering happens through an abstract
//! [`render::DrawContext`] and never mutates simulation state.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]

pub mod animation;
pub mod engine;
pub mod input;
pub mod render;
pub mod scene;
pub mod timer;

pub use fxhash;
pub use lazy_static;

#[doc(inline)]
pub use flick_core as core;

/// Defines a builder's `with_xxx` method.
#[macro_export]
macro_rules! define_with {
    ($(#[$attr:meta])* fn $name:ident($field:ident: $ty:ty)) => {
        $(#[$attr])*
        pub fn $name(mut self, value: $ty) -> Self {
            self.$field = value;
            self
        }
    };
}

pub mod prelude {
    //! The most commonly used types, re-exported under one roof.

    pub use crate::{
        animation::{
            easing::Easing, Tween, TweenBuilder, TweenError, TweenManager, TweenProperty,
        },
        core::{
            algebra::Vector2,
            color::Color,
            math::aabb::AxisAlignedBoundingBox,
            pool::{Handle, Pool},
        },
        engine::{config::EngineConfig, Engine},
        input::{gesture::GestureRecognizer, PointerPhase, PointerSample, PointerSource},
        render::{AssetStore, DrawContext},
        scene::{
            camera::Camera2d,
            entity::{Appearance, Entity, EntityBuilder, EntityFlags},
            event::{Event, EventKind, SubscriberId},
            Scene, SceneContext,
        },
        timer::TimerHandle,
    };
}
