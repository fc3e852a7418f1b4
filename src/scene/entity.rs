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

//! Scene entity: a transformable node with optional physics, collision and
//! pointer-interaction behavior. Entities live in the scene's generational
//! arena and reference each other through handles.
//!
//! Every numeric property is sanitized at its setter: non-finite values fall
//! back to the previous (or default) value, unit-range properties clamp to
//! `[0; 1]` and dimensions clamp to be non-negative, so malformed user input
//! can never poison the simulation.

use crate::{
    animation::{spritesheet::SpriteSheetAnimation, TweenProperty},
    core::{
        algebra::{Matrix3, Vector2},
        color::Color,
        fxhash::{FxHashMap, FxHashSet},
        log::Log,
        math::{compose_transform, finite_or},
        pool::Handle,
    },
    render::{TextAlign, TextBaseline},
    scene::event::{EventCallback, EventDispatcher, EventKind, SubscriberId},
};
use bitflags::bitflags;
use std::cell::Cell;

bitflags! {
    /// Behavior switches of an entity.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct EntityFlags: u8 {
        /// The entity participates in the update step.
        const ACTIVE = 0b0000_0001;
        /// The entity participates in rendering.
        const VISIBLE = 0b0000_0010;
        /// The entity participates in pointer hit testing.
        const INTERACTIVE = 0b0000_0100;
        /// The entity participates in the collision pass.
        const CHECK_COLLISIONS = 0b0000_1000;
        /// The entity is immovable: the physics response treats its mass as
        /// infinite and never integrates its velocity or gravity.
        const STATIC = 0b0001_0000;
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self::ACTIVE | Self::VISIBLE
    }
}

/// Persistent per-contact state kept between collision passes.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    /// Collision normal recorded on the frame the contact began or was last
    /// refreshed, pointing away from the other entity.
    pub normal: Vector2<f32>,
    /// Whether the other entity is static. The physics integrator consults
    /// only static-neighbour normals when gating gravity and constraining
    /// velocity.
    pub other_static: bool,
}

/// What the renderer draws for an entity. Purely visual; never consulted by
/// the simulation.
#[derive(Clone, Debug, Default)]
pub enum Appearance {
    /// Nothing is drawn; the entity acts as a container.
    #[default]
    None,
    /// A filled rectangle covering the entity's size, with optionally rounded
    /// corners.
    Rect { color: Color, corner_radius: f32 },
    /// A filled circle of the entity's radius.
    Circle { color: Color },
    /// An image region looked up from the asset store by key. When the entity
    /// plays a sprite sheet animation, the animation's current frame overrides
    /// `source`.
    Image {
        key: String,
        source: Option<crate::core::math::aabb::AxisAlignedBoundingBox>,
        corner_radius: f32,
    },
    /// A text run.
    Text {
        content: String,
        font: String,
        color: Color,
        align: TextAlign,
        baseline: TextBaseline,
    },
}

/// See module docs.
pub struct Entity {
    pub(crate) name: String,
    pub(crate) parent: Handle<Entity>,
    pub(crate) children: Vec<Handle<Entity>>,
    pub(crate) position: Vector2<f32>,
    pub(crate) rotation: f32,
    pub(crate) scale: Vector2<f32>,
    pub(crate) alpha: f32,
    pub(crate) anchor: Vector2<f32>,
    pub(crate) z_index: i32,
    pub(crate) size: Vector2<f32>,
    pub(crate) radius: f32,
    pub(crate) velocity_x: Option<f32>,
    pub(crate) velocity_y: Option<f32>,
    pub(crate) gravity: Option<f32>,
    pub(crate) friction: Option<f32>,
    pub(crate) bounciness: Option<f32>,
    pub(crate) flags: EntityFlags,
    pub(crate) tags: FxHashSet<String>,
    pub(crate) collision_tags: FxHashSet<String>,
    pub(crate) appearance: Appearance,
    pub(crate) animations: FxHashMap<String, SpriteSheetAnimation>,
    pub(crate) current_animation: Option<String>,
    pub(crate) events: EventDispatcher,
    pub(crate) contacts: FxHashMap<Handle<Entity>, Contact>,
    pub(crate) zero_size_warned: Cell<bool>,
}

impl Default for Entity {
    fn default() -> Self {
        EntityBuilder::new().build()
    }
}

impl Entity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn parent(&self) -> Handle<Entity> {
        self.parent
    }

    pub fn children(&self) -> &[Handle<Entity>] {
        &self.children
    }

    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position.x = finite_or(x, self.position.x);
        self.position.y = finite_or(y, self.position.y);
    }

    /// Rotation around the anchor, in radians. Normalized into `[0; 2pi)` at
    /// the end of every update.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = finite_or(rotation, self.rotation);
    }

    pub fn scale(&self) -> Vector2<f32> {
        self.scale
    }

    pub fn set_scale(&mut self, x: f32, y: f32) {
        self.scale.x = finite_or(x, self.scale.x);
        self.scale.y = finite_or(y, self.scale.y);
    }

    /// Opacity in `[0; 1]`, multiplied down the hierarchy during rendering.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = finite_or(alpha, 1.0).clamp(0.0, 1.0);
    }

    /// Pivot within the unit box; `(0.5, 0.5)` is centered.
    pub fn anchor(&self) -> Vector2<f32> {
        self.anchor
    }

    pub fn set_anchor(&mut self, x: f32, y: f32) {
        self.anchor.x = finite_or(x, 0.5).clamp(0.0, 1.0);
        self.anchor.y = finite_or(y, 0.5).clamp(0.0, 1.0);
    }

    /// Draw order; higher values draw on top. Changed through
    /// [`Scene::set_z_index`](crate::scene::Scene::set_z_index) so the scene
    /// can re-sort lazily.
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn size(&self) -> Vector2<f32> {
        self.size
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size.x = finite_or(width, 0.0).max(0.0);
        self.size.y = finite_or(height, 0.0).max(0.0);
    }

    /// Collision radius. An entity with a positive radius collides as a
    /// circle; otherwise it collides as its `width x height` rectangle.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = finite_or(radius, 0.0).max(0.0);
    }

    pub fn is_circle(&self) -> bool {
        self.radius > 0.0
    }

    pub fn velocity_x(&self) -> Option<f32> {
        self.velocity_x
    }

    pub fn velocity_y(&self) -> Option<f32> {
        self.velocity_y
    }

    pub fn set_velocity(&mut self, x: f32, y: f32) {
        self.set_velocity_x(Some(x));
        self.set_velocity_y(Some(y));
    }

    /// Sets the horizontal velocity in pixels per second. `None` means the
    /// component is absent and is never integrated.
    pub fn set_velocity_x(&mut self, velocity: Option<f32>) {
        self.velocity_x = velocity.filter(|v| v.is_finite());
    }

    pub fn set_velocity_y(&mut self, velocity: Option<f32>) {
        self.velocity_y = velocity.filter(|v| v.is_finite());
    }

    pub fn gravity(&self) -> Option<f32> {
        self.gravity
    }

    /// Sets downward acceleration in pixels per second squared. `None` means
    /// gravity does not apply.
    pub fn set_gravity(&mut self, gravity: Option<f32>) {
        self.gravity = gravity.filter(|g| g.is_finite());
    }

    pub fn friction(&self) -> Option<f32> {
        self.friction
    }

    /// Sets the per-tick velocity multiplier, clamped into `[0; 1]`.
    pub fn set_friction(&mut self, friction: Option<f32>) {
        self.friction = friction
            .filter(|f| f.is_finite())
            .map(|f| f.clamp(0.0, 1.0));
    }

    pub fn bounciness(&self) -> Option<f32> {
        self.bounciness
    }

    /// Sets the restitution used when bouncing off a contact, clamped into
    /// `[0; 1]`. When absent, bounces use the default restitution of 0.8.
    pub fn set_bounciness(&mut self, bounciness: Option<f32>) {
        self.bounciness = bounciness
            .filter(|b| b.is_finite())
            .map(|b| b.clamp(0.0, 1.0));
    }

    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: EntityFlags) {
        self.flags = flags;
    }

    pub fn is_active(&self) -> bool {
        self.flags.contains(EntityFlags::ACTIVE)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(EntityFlags::VISIBLE)
    }

    pub fn is_interactive(&self) -> bool {
        self.flags.contains(EntityFlags::INTERACTIVE)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(EntityFlags::STATIC)
    }

    pub fn checks_collisions(&self) -> bool {
        self.flags.contains(EntityFlags::CHECK_COLLISIONS)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|s| s.as_str())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag<S: Into<String>>(&mut self, tag: S) {
        self.tags.insert(tag.into());
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    /// Adds a collision filter tag. When the filter set is non-empty, a pair
    /// is considered only if the other entity owns at least one matching tag.
    pub fn add_collision_tag<S: Into<String>>(&mut self, tag: S) {
        self.collision_tags.insert(tag.into());
    }

    pub(crate) fn accepts_collisions_with(&self, other: &Entity) -> bool {
        self.collision_tags.is_empty()
            || self.collision_tags.iter().any(|tag| other.tags.contains(tag))
    }

    /// Entities currently in contact with this one.
    pub fn colliding_with(&self) -> impl Iterator<Item = Handle<Entity>> + '_ {
        self.contacts.keys().copied()
    }

    pub fn is_colliding_with(&self, other: Handle<Entity>) -> bool {
        self.contacts.contains_key(&other)
    }

    /// The collision normal recorded for an ongoing contact, pointing away
    /// from the other entity.
    pub fn contact_normal(&self, other: Handle<Entity>) -> Option<Vector2<f32>> {
        self.contacts.get(&other).map(|c| c.normal)
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn set_appearance(&mut self, appearance: Appearance) {
        self.appearance = appearance;
    }

    /// Registers a named sprite sheet animation.
    pub fn add_animation<S: Into<String>>(&mut self, name: S, animation: SpriteSheetAnimation) {
        self.animations.insert(name.into(), animation);
    }

    /// Starts playing a previously registered animation. Playing an unknown
    /// animation is ignored.
    pub fn play_animation(&mut self, name: &str) {
        match self.animations.get_mut(name) {
            Some(animation) => {
                animation.play();
                self.current_animation = Some(name.to_owned());
            }
            None => Log::warn(format!(
                "Entity `{}` has no animation named `{}`.",
                self.name, name
            )),
        }
    }

    pub fn stop_animation(&mut self) {
        if let Some(name) = self.current_animation.take() {
            if let Some(animation) = self.animations.get_mut(&name) {
                animation.stop();
            }
        }
    }

    pub fn current_animation(&self) -> Option<&SpriteSheetAnimation> {
        self.current_animation
            .as_deref()
            .and_then(|name| self.animations.get(name))
    }

    pub(crate) fn tick_animation(&mut self, dt: f32) {
        if let Some(name) = self.current_animation.as_deref() {
            if let Some(animation) = self.animations.get_mut(name) {
                animation.update(dt);
            }
        }
    }

    /// Reads a tweenable property.
    pub fn property(&self, property: TweenProperty) -> f32 {
        match property {
            TweenProperty::X => self.position.x,
            TweenProperty::Y => self.position.y,
            TweenProperty::Rotation => self.rotation,
            TweenProperty::ScaleX => self.scale.x,
            TweenProperty::ScaleY => self.scale.y,
            TweenProperty::Alpha => self.alpha,
            TweenProperty::Width => self.size.x,
            TweenProperty::Height => self.size.y,
            TweenProperty::Radius => self.radius,
        }
    }

    /// Writes a tweenable property through the sanitizing setters.
    pub fn set_property(&mut self, property: TweenProperty, value: f32) {
        match property {
            TweenProperty::X => self.set_position(value, self.position.y),
            TweenProperty::Y => self.set_position(self.position.x, value),
            TweenProperty::Rotation => self.set_rotation(value),
            TweenProperty::ScaleX => self.set_scale(value, self.scale.y),
            TweenProperty::ScaleY => self.set_scale(self.scale.x, value),
            TweenProperty::Alpha => self.set_alpha(value),
            TweenProperty::Width => self.set_size(value, self.size.y),
            TweenProperty::Height => self.set_size(self.size.x, value),
            TweenProperty::Radius => self.set_radius(value),
        }
    }

    /// Adds a subscriber for the given event kind, invoked on every matching
    /// event in registration order. Returns an id usable with [`Self::off`].
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> SubscriberId
    where
        F: FnMut(&mut crate::scene::SceneContext, &super::event::Event) + 'static,
    {
        self.events.subscribe(kind, false, Box::new(callback))
    }

    /// Adds a subscriber removed immediately before its first invocation, so
    /// re-subscribing from inside the callback is safe.
    pub fn once<F>(&mut self, kind: EventKind, callback: F) -> SubscriberId
    where
        F: FnMut(&mut crate::scene::SceneContext, &super::event::Event) + 'static,
    {
        self.events.subscribe(kind, true, Box::new(callback))
    }

    /// Removes one subscriber, or every subscriber of the kind when `id` is
    /// `None`.
    pub fn off(&mut self, kind: EventKind, id: Option<SubscriberId>) {
        self.events.unsubscribe(kind, id);
    }

    /// Drops all subscribers of every event kind.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub(crate) fn subscribe_boxed(
        &mut self,
        kind: EventKind,
        once: bool,
        callback: EventCallback,
    ) -> SubscriberId {
        self.events.subscribe(kind, once, callback)
    }

    /// Matrix transforming the entity's local space into its parent's space.
    pub fn local_transform(&self) -> Matrix3<f32> {
        compose_transform(self.position, self.rotation, self.scale)
    }

    /// Offset of the entity's bounds origin from its position: the anchor
    /// shifts the `width x height` box so the anchor point sits at `(x, y)`.
    pub fn origin_offset(&self) -> Vector2<f32> {
        Vector2::new(-self.anchor.x * self.size.x, -self.anchor.y * self.size.y)
    }

    /// Center of the entity's bounds in local space.
    pub fn local_center(&self) -> Vector2<f32> {
        Vector2::new(
            (0.5 - self.anchor.x) * self.size.x,
            (0.5 - self.anchor.y) * self.size.y,
        )
    }
}

/// Builder for [`Entity`]. All numeric inputs pass through the sanitizing
/// setters.
pub struct EntityBuilder {
    name: String,
    position: Vector2<f32>,
    rotation: f32,
    scale: Vector2<f32>,
    alpha: f32,
    anchor: Vector2<f32>,
    z_index: i32,
    size: Vector2<f32>,
    radius: f32,
    velocity_x: Option<f32>,
    velocity_y: Option<f32>,
    gravity: Option<f32>,
    friction: Option<f32>,
    bounciness: Option<f32>,
    flags: EntityFlags,
    tags: Vec<String>,
    collision_tags: Vec<String>,
    appearance: Appearance,
    animations: Vec<(String, SpriteSheetAnimation)>,
}

impl Default for EntityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            position: Vector2::new(0.0, 0.0),
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
            alpha: 1.0,
            anchor: Vector2::new(0.5, 0.5),
            z_index: 0,
            size: Vector2::new(0.0, 0.0),
            radius: 0.0,
            velocity_x: None,
            velocity_y: None,
            gravity: None,
            friction: None,
            bounciness: None,
            flags: EntityFlags::default(),
            tags: Vec::new(),
            collision_tags: Vec::new(),
            appearance: Appearance::None,
            animations: Vec::new(),
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vector2::new(x, y);
        self
    }

    crate::define_with!(
        /// Sets rotation around the anchor, in radians.
        fn with_rotation(rotation: f32)
    );

    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Vector2::new(x, y);
        self
    }

    crate::define_with!(
        fn with_alpha(alpha: f32)
    );

    pub fn with_anchor(mut self, x: f32, y: f32) -> Self {
        self.anchor = Vector2::new(x, y);
        self
    }

    crate::define_with!(
        fn with_z_index(z_index: i32)
    );

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vector2::new(width, height);
        self
    }

    crate::define_with!(
        /// Makes the entity collide as a circle of the given radius.
        fn with_radius(radius: f32)
    );

    pub fn with_velocity(mut self, x: f32, y: f32) -> Self {
        self.velocity_x = Some(x);
        self.velocity_y = Some(y);
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = Some(gravity);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = Some(friction);
        self
    }

    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = Some(bounciness);
        self
    }

    crate::define_with!(
        fn with_flags(flags: EntityFlags)
    );

    pub fn with_interactive(mut self) -> Self {
        self.flags |= EntityFlags::INTERACTIVE;
        self
    }

    pub fn with_check_collisions(mut self) -> Self {
        self.flags |= EntityFlags::CHECK_COLLISIONS;
        self
    }

    pub fn with_static(mut self) -> Self {
        self.flags |= EntityFlags::STATIC;
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_collision_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.collision_tags.push(tag.into());
        self
    }

    crate::define_with!(
        fn with_appearance(appearance: Appearance)
    );

    pub fn with_animation<S: Into<String>>(
        mut self,
        name: S,
        animation: SpriteSheetAnimation,
    ) -> Self {
        self.animations.push((name.into(), animation));
        self
    }

    pub fn build(self) -> Entity {
        let mut entity = Entity {
            name: self.name,
            parent: Handle::NONE,
            children: Vec::new(),
            position: Vector2::new(0.0, 0.0),
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
            alpha: 1.0,
            anchor: Vector2::new(0.5, 0.5),
            z_index: self.z_index,
            size: Vector2::new(0.0, 0.0),
            radius: 0.0,
            velocity_x: None,
            velocity_y: None,
            gravity: None,
            friction: None,
            bounciness: None,
            flags: self.flags,
            tags: self.tags.into_iter().collect(),
            collision_tags: self.collision_tags.into_iter().collect(),
            appearance: self.appearance,
            animations: self.animations.into_iter().collect(),
            current_animation: None,
            events: EventDispatcher::default(),
            contacts: FxHashMap::default(),
            zero_size_warned: Cell::new(false),
        };

        entity.set_position(self.position.x, self.position.y);
        entity.set_rotation(self.rotation);
        entity.set_scale(self.scale.x, self.scale.y);
        entity.set_alpha(self.alpha);
        entity.set_anchor(self.anchor.x, self.anchor.y);
        entity.set_size(self.size.x, self.size.y);
        entity.set_radius(self.radius);
        entity.set_velocity_x(self.velocity_x);
        entity.set_velocity_y(self.velocity_y);
        entity.set_gravity(self.gravity);
        entity.set_friction(self.friction);
        entity.set_bounciness(self.bounciness);

        entity
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_sanitizes_numeric_input() {
        let entity = EntityBuilder::new()
            .with_alpha(7.5)
            .with_anchor(-1.0, f32::NAN)
            .with_size(-20.0, 30.0)
            .with_radius(-5.0)
            .with_friction(3.0)
            .with_bounciness(-0.5)
            .build();

        assert_eq!(entity.alpha(), 1.0);
        assert_eq!(entity.anchor(), Vector2::new(0.0, 0.5));
        assert_eq!(entity.size(), Vector2::new(0.0, 30.0));
        assert_eq!(entity.radius(), 0.0);
        assert_eq!(entity.friction(), Some(1.0));
        assert_eq!(entity.bounciness(), Some(0.0));
    }

    #[test]
    fn non_finite_position_keeps_previous_value() {
        let mut entity = EntityBuilder::new().with_position(3.0, 4.0).build();
        entity.set_position(f32::NAN, 7.0);
        assert_eq!(entity.position(), Vector2::new(3.0, 7.0));
    }

    #[test]
    fn absent_physics_fields_stay_absent() {
        let entity = EntityBuilder::new().build();
        assert!(entity.velocity_x().is_none());
        assert!(entity.velocity_y().is_none());
        assert!(entity.gravity().is_none());
        assert!(entity.friction().is_none());

        let mut entity = EntityBuilder::new().build();
        entity.set_gravity(Some(f32::INFINITY));
        assert!(entity.gravity().is_none());
    }

    #[test]
    fn shape_discrimination() {
        assert!(!EntityBuilder::new().with_size(10.0, 10.0).build().is_circle());
        assert!(EntityBuilder::new().with_radius(4.0).build().is_circle());
    }

    #[test]
    fn collision_tag_filter() {
        let mut ball = EntityBuilder::new().build();
        ball.add_collision_tag("wall");
        let wall = EntityBuilder::new().with_tag("wall").build();
        let ghost = EntityBuilder::new().with_tag("ghost").build();

        assert!(ball.accepts_collisions_with(&wall));
        assert!(!ball.accepts_collisions_with(&ghost));
        // An empty filter matches everything.
        assert!(wall.accepts_collisions_with(&ball));
    }

    #[test]
    fn property_round_trip() {
        let mut entity = EntityBuilder::new().build();
        entity.set_property(TweenProperty::ScaleX, 2.5);
        assert_eq!(entity.property(TweenProperty::ScaleX), 2.5);
        entity.set_property(TweenProperty::Alpha, 9.0);
        assert_eq!(entity.property(TweenProperty::Alpha), 1.0);
    }

    #[test]
    fn anchor_origin_offset() {
        let entity = EntityBuilder::new()
            .with_size(100.0, 50.0)
            .with_anchor(0.5, 0.5)
            .build();
        assert_eq!(entity.origin_offset(), Vector2::new(-50.0, -25.0));
        assert_eq!(entity.local_center(), Vector2::new(0.0, 0.0));

        let entity = EntityBuilder::new()
            .with_size(100.0, 50.0)
            .with_anchor(0.0, 0.0)
            .build();
        assert_eq!(entity.origin_offset(), Vector2::new(0.0, 0.0));
        assert_eq!(entity.local_center(), Vector2::new(50.0, 25.0));
    }
}
