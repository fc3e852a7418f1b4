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

//! The scene: a generational arena of entities organized into a transform
//! hierarchy, plus the per-tick simulation pipeline.
//!
//! One call to [`Scene::update`] runs, in order: the lazy z-sort, timers,
//! recursive entity updates in draw order (physics integration, sprite
//! animation, rotation normalization, `update` events), tween advancement,
//! the collision pass over a snapshot of collidable entities, and finally the
//! scene-level `update` event. Subscribers may mutate the scene at any point:
//! additions become visible on the next tick, removals take effect
//! immediately.

pub mod camera;
pub mod collision;
pub mod entity;
pub mod event;
pub mod physics;

use crate::{
    animation::TweenManager,
    core::{
        algebra::{Matrix3, Vector2},
        log::Log,
        math::{aabb::AxisAlignedBoundingBox, transform_point, transform_vector, wrap_angle},
        pool::{Handle, Pool},
    },
    scene::{
        collision::WorldShape,
        entity::Entity,
        event::{Event, EventCallback, EventKind, SubscriberId},
    },
    timer::{TimerHandle, TimerService},
};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Mutable state handed to every subscriber, timer and tween callback: the
/// scene itself plus the tween manager, so callbacks can chain animations.
pub struct SceneContext<'a> {
    pub scene: &'a mut Scene,
    pub tweens: &'a mut TweenManager,
}

/// A structural change of the scene, delivered through the channels opened by
/// [`Scene::watch_changes`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SceneEvent {
    /// An entity was added.
    Added(Handle<Entity>),
    /// An entity was removed.
    Removed(Handle<Entity>),
}

/// See module docs.
pub struct Scene {
    pool: Pool<Entity>,
    /// Root entities in insertion order, re-sorted by z-index when dirty.
    roots: Vec<Handle<Entity>>,
    sort_dirty: bool,
    background: Handle<Entity>,
    surface_events: event::EventDispatcher,
    /// Open ends of the channels handed out by [`Scene::watch_changes`].
    change_listeners: Vec<Sender<SceneEvent>>,
    timers: TimerService,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            roots: Vec::new(),
            sort_dirty: false,
            background: Handle::NONE,
            surface_events: event::EventDispatcher::default(),
            change_listeners: Vec::new(),
            timers: TimerService::default(),
        }
    }

    /// Opens a channel that receives a [`SceneEvent`] for every entity added
    /// to or removed from the scene. Dropping the receiver detaches it.
    pub fn watch_changes(&mut self) -> Receiver<SceneEvent> {
        let (sender, receiver) = channel();
        self.change_listeners.push(sender);
        receiver
    }

    fn notify_change(&mut self, event: SceneEvent) {
        self.change_listeners
            .retain(|listener| listener.send(event).is_ok());
    }

    /// Adds an entity as a scene root and returns its handle. The entity is
    /// owned by the scene from now on; it can only ever belong to one scene
    /// because the arena takes it by value.
    pub fn add(&mut self, entity: Entity) -> Handle<Entity> {
        let handle = self.pool.spawn(entity);
        self.roots.push(handle);
        self.sort_dirty = true;
        self.notify_change(SceneEvent::Added(handle));
        handle
    }

    /// Removes an entity and, depth-first, all of its descendants. Subscriber
    /// tables are dropped before detaching so closures release any captured
    /// handles, and stale contact entries pointing at the removed entities are
    /// purged scene-wide. Removing a dead handle is a no-op.
    pub fn remove(&mut self, handle: Handle<Entity>) {
        if !self.pool.is_valid_handle(handle) {
            return;
        }

        self.detach(handle);

        let mut dead = Vec::new();
        self.destroy_subtree(handle, &mut dead);

        for entity in self.pool.iter_mut() {
            entity.contacts.retain(|other, _| !dead.contains(other));
        }

        if dead.contains(&self.background) {
            self.background = Handle::NONE;
        }

        self.notify_change(SceneEvent::Removed(handle));
    }

    fn destroy_subtree(&mut self, handle: Handle<Entity>, dead: &mut Vec<Handle<Entity>>) {
        let children = match self.pool.try_borrow_mut(handle) {
            Some(entity) => {
                // Subscribers may close over other entities; dropping them
                // first releases those captures before the node goes away.
                entity.clear_events();
                std::mem::take(&mut entity.children)
            }
            None => return,
        };

        for child in children {
            self.destroy_subtree(child, dead);
        }

        self.pool.free(handle);
        dead.push(handle);
    }

    /// Unhooks the entity from its parent's child list or from the root list,
    /// without touching the entity itself.
    fn detach(&mut self, handle: Handle<Entity>) {
        let parent = self.pool.borrow(handle).parent;
        if parent.is_some() {
            if let Some(parent) = self.pool.try_borrow_mut(parent) {
                parent.children.retain(|&c| c != handle);
            }
        } else {
            self.roots.retain(|&r| r != handle);
        }
    }

    /// Attaches `child` to `parent`, unlinking it from its previous parent
    /// first. A link that would create a cycle is refused.
    pub fn link(&mut self, child: Handle<Entity>, parent: Handle<Entity>) {
        if child == parent
            || !self.pool.is_valid_handle(child)
            || !self.pool.is_valid_handle(parent)
        {
            return;
        }

        // Walk up from the new parent; hitting `child` would make a cycle.
        let mut current = parent;
        while current.is_some() {
            if current == child {
                Log::err("Refusing to link entities: the child is an ancestor of the parent.");
                return;
            }
            current = self.pool.borrow(current).parent;
        }

        self.detach(child);
        self.pool.borrow_mut(child).parent = parent;
        self.pool.borrow_mut(parent).children.push(child);
        self.sort_dirty = true;
    }

    /// Detaches `child` from its parent, making it a scene root again.
    pub fn unlink(&mut self, child: Handle<Entity>) {
        if !self.pool.is_valid_handle(child) || self.pool.borrow(child).parent.is_none() {
            return;
        }
        self.detach(child);
        self.pool.borrow_mut(child).parent = Handle::NONE;
        self.roots.push(child);
        self.sort_dirty = true;
    }

    /// Installs a background entity that `clear` preserves. Give it a low
    /// z-index to draw it behind everything else.
    pub fn set_background(&mut self, handle: Handle<Entity>) {
        self.background = handle;
    }

    pub fn background(&self) -> Handle<Entity> {
        self.background
    }

    /// Removes every root entity except the background.
    pub fn clear(&mut self) {
        let roots = self.roots.clone();
        for root in roots {
            if root != self.background {
                self.remove(root);
            }
        }
    }

    pub fn try_get(&self, handle: Handle<Entity>) -> Option<&Entity> {
        self.pool.try_borrow(handle)
    }

    pub fn try_get_mut(&mut self, handle: Handle<Entity>) -> Option<&mut Entity> {
        self.pool.try_borrow_mut(handle)
    }

    /// Borrows an entity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is dead.
    pub fn get(&self, handle: Handle<Entity>) -> &Entity {
        self.pool.borrow(handle)
    }

    /// Mutably borrows an entity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is dead.
    pub fn get_mut(&mut self, handle: Handle<Entity>) -> &mut Entity {
        self.pool.borrow_mut(handle)
    }

    pub fn is_valid_handle(&self, handle: Handle<Entity>) -> bool {
        self.pool.is_valid_handle(handle)
    }

    pub fn entity_count(&self) -> u32 {
        self.pool.alive_count()
    }

    pub fn pair_iter(&self) -> impl Iterator<Item = (Handle<Entity>, &Entity)> {
        self.pool.pair_iter()
    }

    /// Root entities in draw order (as of the last sort).
    pub fn roots(&self) -> &[Handle<Entity>] {
        &self.roots
    }

    /// Draws every visible entity back-to-front. Rendering mutates no
    /// simulation state.
    pub fn render(
        &self,
        ctx: &mut dyn crate::render::DrawContext,
        assets: &dyn crate::render::AssetStore,
    ) {
        crate::render::render_scene(self, ctx, assets);
    }

    /// Collects every entity carrying the given tag.
    pub fn get_by_tag(&self, tag: &str) -> Vec<Handle<Entity>> {
        self.pool
            .pair_iter()
            .filter(|(_, entity)| entity.has_tag(tag))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Changes the draw order of an entity and marks the scene for re-sorting
    /// on the next update.
    pub fn set_z_index(&mut self, handle: Handle<Entity>, z_index: i32) {
        if let Some(entity) = self.pool.try_borrow_mut(handle) {
            if entity.z_index != z_index {
                entity.z_index = z_index;
                self.sort_dirty = true;
            }
        }
    }

    /// Re-sorts the root and child lists by z-index if anything changed since
    /// the last sort. The sort is stable, so entities with equal z-indices
    /// keep their insertion order.
    pub fn ensure_sorted(&mut self) {
        if !self.sort_dirty {
            return;
        }

        let mut roots = std::mem::take(&mut self.roots);
        roots.retain(|&h| self.pool.is_valid_handle(h));
        roots.sort_by_key(|&h| self.pool.borrow(h).z_index);
        self.roots = roots;

        let handles = self.pool.pair_iter().map(|(h, _)| h).collect::<Vec<_>>();
        for handle in handles {
            let mut children = std::mem::take(&mut self.pool.borrow_mut(handle).children);
            children.retain(|&c| self.pool.is_valid_handle(c));
            children.sort_by_key(|&c| self.pool.borrow(c).z_index);
            self.pool.borrow_mut(handle).children = children;
        }

        self.sort_dirty = false;
    }

    /// Schedules a one-shot callback after `seconds` of frame time.
    pub fn delay<F>(&mut self, seconds: f32, callback: F) -> TimerHandle
    where
        F: FnMut(&mut SceneContext) + 'static,
    {
        self.timers.schedule(seconds, None, Box::new(callback))
    }

    /// Schedules a callback repeating every `seconds` of frame time.
    pub fn interval<F>(&mut self, seconds: f32, callback: F) -> TimerHandle
    where
        F: FnMut(&mut SceneContext) + 'static,
    {
        self.timers
            .schedule(seconds, Some(seconds.max(0.0)), Box::new(callback))
    }

    /// Cancels every pending timer. Dropping the scene has the same effect.
    pub fn cancel_timers(&mut self) {
        self.timers.cancel_all();
    }

    pub fn pending_timer_count(&self) -> usize {
        self.timers.pending_count()
    }

    fn tick_timers(&mut self, dt: f32, tweens: &mut TweenManager) {
        let mut items = std::mem::take(&mut self.timers.items);

        for timer in &mut items {
            if timer.cancelled.get() {
                continue;
            }
            timer.remaining -= dt;
            if timer.remaining > 0.0 {
                continue;
            }

            let Some(mut callback) = timer.callback.take() else {
                continue;
            };
            callback(&mut SceneContext {
                scene: &mut *self,
                tweens: &mut *tweens,
            });

            if let Some(period) = timer.period {
                if !timer.cancelled.get() {
                    timer.remaining = period;
                    timer.callback = Some(callback);
                }
            }
        }

        items.retain(|t| !t.cancelled.get() && t.callback.is_some());
        // Timers scheduled from inside callbacks landed in the fresh list;
        // keep them after the surviving ones.
        items.append(&mut self.timers.items);
        self.timers.items = items;
    }

    /// Runs one simulation step. See the module docs for the exact phase
    /// order.
    pub fn update(&mut self, dt: f32, tweens: &mut TweenManager) {
        self.ensure_sorted();
        self.tick_timers(dt, tweens);

        let roots = self.roots.clone();
        for root in roots {
            self.update_entity(root, dt, tweens);
        }

        tweens.update(self, dt);

        collision::collision_pass(self, tweens);

        let event = Event::update(dt);
        self.dispatch(tweens, Handle::NONE, &event);
    }

    fn update_entity(&mut self, handle: Handle<Entity>, dt: f32, tweens: &mut TweenManager) {
        let children = {
            let Some(entity) = self.pool.try_borrow_mut(handle) else {
                return;
            };
            if !entity.is_active() {
                return;
            }

            physics::integrate(entity, dt);
            entity.tick_animation(dt);
            entity.rotation = wrap_angle(entity.rotation);

            entity.children.clone()
        };

        let mut event = Event::update(dt);
        event.target = handle;
        self.dispatch(tweens, handle, &event);

        for child in children {
            self.update_entity(child, dt, tweens);
        }
    }

    pub(crate) fn collect_collidable(&self) -> Vec<Handle<Entity>> {
        self.pool
            .pair_iter()
            .filter(|(_, entity)| entity.is_active() && entity.checks_collisions())
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Subscribes to an event on an entity, or on the scene surface when
    /// `target` is [`Handle::NONE`].
    pub fn on<F>(&mut self, target: Handle<Entity>, kind: EventKind, callback: F) -> SubscriberId
    where
        F: FnMut(&mut SceneContext, &Event) + 'static,
    {
        self.subscribe(target, kind, false, Box::new(callback))
    }

    /// Like [`Scene::on`], but the subscriber is removed right before its
    /// first invocation.
    pub fn once<F>(&mut self, target: Handle<Entity>, kind: EventKind, callback: F) -> SubscriberId
    where
        F: FnMut(&mut SceneContext, &Event) + 'static,
    {
        self.subscribe(target, kind, true, Box::new(callback))
    }

    fn subscribe(
        &mut self,
        target: Handle<Entity>,
        kind: EventKind,
        once: bool,
        callback: EventCallback,
    ) -> SubscriberId {
        if target.is_none() {
            self.surface_events.subscribe(kind, once, callback)
        } else if let Some(entity) = self.pool.try_borrow_mut(target) {
            entity.subscribe_boxed(kind, once, callback)
        } else {
            0
        }
    }

    /// Removes one subscriber (or all subscribers of the kind when `id` is
    /// `None`) from an entity or from the scene surface.
    pub fn off(&mut self, target: Handle<Entity>, kind: EventKind, id: Option<SubscriberId>) {
        if target.is_none() {
            self.surface_events.unsubscribe(kind, id);
        } else if let Some(entity) = self.pool.try_borrow_mut(target) {
            entity.off(kind, id);
        }
    }

    /// Emits an event on an entity, or on the scene surface when `target` is
    /// [`Handle::NONE`]. Subscribers run in registration order and receive
    /// full mutable access to the scene; subscribers added during the dispatch
    /// are not invoked for this event.
    pub fn dispatch(&mut self, tweens: &mut TweenManager, target: Handle<Entity>, event: &Event) {
        let kind = event.kind;

        let subscribers = if target.is_none() {
            self.surface_events.begin_dispatch(kind)
        } else if let Some(entity) = self.pool.try_borrow_mut(target) {
            entity.events.begin_dispatch(kind)
        } else {
            return;
        };

        let mut survivors = Vec::with_capacity(subscribers.len());
        for mut subscriber in subscribers {
            // Consult the live dispatcher each round: a previous callback may
            // have unsubscribed this one, cleared the kind entirely or even
            // destroyed the entity.
            let proceed = match self.dispatcher_mut(target) {
                None => None,
                Some(dispatcher) => {
                    if dispatcher.is_purged(kind) {
                        None
                    } else if dispatcher.consume_tombstone(subscriber.id) {
                        Some(false)
                    } else {
                        Some(true)
                    }
                }
            };
            match proceed {
                None => break,
                Some(false) => continue,
                Some(true) => {}
            }

            let once = subscriber.once;
            (subscriber.callback)(
                &mut SceneContext {
                    scene: &mut *self,
                    tweens: &mut *tweens,
                },
                event,
            );
            if !once {
                survivors.push(subscriber);
            }
        }

        if let Some(dispatcher) = self.dispatcher_mut(target) {
            dispatcher.end_dispatch(kind, survivors);
        }
    }

    fn dispatcher_mut(&mut self, target: Handle<Entity>) -> Option<&mut event::EventDispatcher> {
        if target.is_none() {
            Some(&mut self.surface_events)
        } else {
            self.pool
                .try_borrow_mut(target)
                .map(|entity| &mut entity.events)
        }
    }

    /// Matrix transforming the entity's local space into world space,
    /// composed through every ancestor.
    pub fn world_matrix(&self, handle: Handle<Entity>) -> Matrix3<f32> {
        let mut chain = Vec::new();
        let mut current = handle;
        while let Some(entity) = self.pool.try_borrow(current) {
            chain.push(current);
            current = entity.parent;
        }

        let mut matrix = Matrix3::identity();
        for &link in chain.iter().rev() {
            matrix *= self.pool.borrow(link).local_transform();
        }
        matrix
    }

    /// Accumulated rotation along the parent chain, in radians.
    pub fn world_rotation(&self, handle: Handle<Entity>) -> f32 {
        let mut rotation = 0.0;
        let mut current = handle;
        while let Some(entity) = self.pool.try_borrow(current) {
            rotation += entity.rotation;
            current = entity.parent;
        }
        rotation
    }

    /// Transforms a point in the entity's local space into world space.
    pub fn world_point(&self, handle: Handle<Entity>, local: Vector2<f32>) -> Vector2<f32> {
        transform_point(&self.world_matrix(handle), local)
    }

    /// Maps a world-space displacement into the local space of the given
    /// parent (inverse rotation and scale through every ancestor), so a
    /// parented entity can be moved by a world-space correction. With no
    /// parent the displacement is returned unchanged.
    pub fn world_vector_to_local(
        &self,
        parent: Handle<Entity>,
        vector: Vector2<f32>,
    ) -> Vector2<f32> {
        if parent.is_none() {
            return vector;
        }
        match self.world_matrix(parent).try_inverse() {
            Some(inverse) => transform_vector(&inverse, vector),
            // A degenerate (zero-scale) ancestor cannot be inverted; skip the
            // mapping rather than produce NaNs.
            None => vector,
        }
    }

    /// World-space bounds of the entity: the axis-aligned box around the four
    /// corners of its (possibly rotated) `width x height` rectangle.
    pub fn world_bounds(&self, handle: Handle<Entity>) -> AxisAlignedBoundingBox {
        let entity = self.pool.borrow(handle);
        let origin = entity.origin_offset();
        let size = entity.size;
        let matrix = self.world_matrix(handle);

        AxisAlignedBoundingBox::from_points(&[
            transform_point(&matrix, origin),
            transform_point(&matrix, origin + Vector2::new(size.x, 0.0)),
            transform_point(&matrix, origin + size),
            transform_point(&matrix, origin + Vector2::new(0.0, size.y)),
        ])
    }

    pub(crate) fn world_shape(&self, handle: Handle<Entity>) -> WorldShape {
        let entity = self.pool.borrow(handle);
        let center = self.world_point(handle, entity.local_center());
        if entity.is_circle() {
            WorldShape::Circle {
                center,
                radius: entity.radius,
            }
        } else {
            WorldShape::Rect {
                center,
                half: entity.size.scale(0.5),
                rotation: self.world_rotation(handle),
            }
        }
    }

    /// Finds the topmost interactive entity whose world bounds contain the
    /// given world-space point. "Topmost" follows draw order: highest z-index
    /// first, insertion order breaking ties, children above their parent.
    pub fn hit_test(&self, point: Vector2<f32>) -> Handle<Entity> {
        let mut best = Handle::NONE;
        for &root in &self.roots {
            self.hit_test_recursive(root, point, &mut best);
        }
        best
    }

    fn hit_test_recursive(
        &self,
        handle: Handle<Entity>,
        point: Vector2<f32>,
        best: &mut Handle<Entity>,
    ) {
        let Some(entity) = self.pool.try_borrow(handle) else {
            return;
        };
        if !entity.is_active() {
            return;
        }

        if entity.is_interactive() {
            if entity.size.x <= 0.0 || entity.size.y <= 0.0 {
                if !entity.zero_size_warned.get() {
                    entity.zero_size_warned.set(true);
                    Log::warn(format!(
                        "Interactive entity `{}` has zero width or height and will never \
                         receive pointer events.",
                        entity.name
                    ));
                }
            } else if self.world_bounds(handle).is_contains_point(point) {
                *best = handle;
            }
        }

        for &child in &entity.children {
            self.hit_test_recursive(child, point, best);
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.timers.cancel_all();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{animation::TweenManager, scene::entity::EntityBuilder};
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn scene_and_tweens() -> (Scene, TweenManager) {
        (Scene::new(), TweenManager::new())
    }

    #[test]
    fn watchers_observe_additions_and_removals() {
        let (mut scene, _) = scene_and_tweens();
        let changes = scene.watch_changes();

        let handle = scene.add(EntityBuilder::new().build());
        assert_eq!(changes.recv(), Ok(SceneEvent::Added(handle)));

        scene.remove(handle);
        assert_eq!(changes.recv(), Ok(SceneEvent::Removed(handle)));
        assert!(!scene.is_valid_handle(handle));

        // A dropped receiver detaches its listener on the next change.
        drop(changes);
        let again = scene.add(EntityBuilder::new().build());
        let _ = again;
    }

    #[test]
    fn remove_destroys_children_depth_first() {
        let (mut scene, _) = scene_and_tweens();
        let parent = scene.add(EntityBuilder::new().build());
        let child = scene.add(EntityBuilder::new().build());
        let grandchild = scene.add(EntityBuilder::new().build());
        scene.link(child, parent);
        scene.link(grandchild, child);

        scene.remove(parent);

        assert!(!scene.is_valid_handle(parent));
        assert!(!scene.is_valid_handle(child));
        assert!(!scene.is_valid_handle(grandchild));
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn link_refuses_cycles() {
        let (mut scene, _) = scene_and_tweens();
        let a = scene.add(EntityBuilder::new().build());
        let b = scene.add(EntityBuilder::new().build());
        scene.link(b, a);
        // Linking `a` under its own descendant must be refused.
        scene.link(a, b);
        assert!(scene.get(a).parent().is_none());
        assert_eq!(scene.get(a).children(), &[b]);
    }

    #[test]
    fn clear_preserves_background() {
        let (mut scene, _) = scene_and_tweens();
        let background = scene.add(EntityBuilder::new().with_z_index(-100).build());
        scene.set_background(background);
        let sprite = scene.add(EntityBuilder::new().build());

        scene.clear();

        assert!(scene.is_valid_handle(background));
        assert!(!scene.is_valid_handle(sprite));
    }

    #[test]
    fn get_by_tag_filters_entities() {
        let (mut scene, _) = scene_and_tweens();
        let a = scene.add(EntityBuilder::new().with_tag("enemy").build());
        let _b = scene.add(EntityBuilder::new().with_tag("pickup").build());
        let c = scene.add(EntityBuilder::new().with_tag("enemy").build());

        let enemies = scene.get_by_tag("enemy");
        assert_eq!(enemies, vec![a, c]);
    }

    #[test]
    fn inert_entity_is_unchanged_by_update() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let handle = scene.add(
            EntityBuilder::new()
                .with_position(10.0, 20.0)
                .with_rotation(1.0)
                .with_scale(2.0, 3.0)
                .with_alpha(0.5)
                .build(),
        );

        scene.update(0.1, &mut tweens);

        let entity = scene.get(handle);
        assert_eq!(entity.position(), Vector2::new(10.0, 20.0));
        assert_eq!(entity.rotation(), 1.0);
        assert_eq!(entity.scale(), Vector2::new(2.0, 3.0));
        assert_eq!(entity.alpha(), 0.5);
    }

    #[test]
    fn rotation_is_normalized_after_update() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let handle = scene.add(EntityBuilder::new().with_rotation(7.0).build());

        scene.update(0.016, &mut tweens);

        let rotation = scene.get(handle).rotation();
        assert!((0.0..std::f32::consts::TAU).contains(&rotation));
        assert_relative_eq!(rotation, 7.0 - std::f32::consts::TAU, epsilon = 1e-5);
    }

    #[test]
    fn entities_update_in_draw_order() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        let front = scene.add(EntityBuilder::new().with_z_index(5).build());
        let back = scene.add(EntityBuilder::new().with_z_index(-5).build());

        for (handle, label) in [(front, "front"), (back, "back")] {
            let order = order.clone();
            scene.on(handle, EventKind::Update, move |_, _| {
                order.borrow_mut().push(label);
            });
        }

        scene.update(0.016, &mut tweens);

        assert_eq!(*order.borrow(), vec!["back", "front"]);
    }

    #[test]
    fn subscribers_fire_in_registration_order_and_once_removes_itself() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let handle = scene.add(EntityBuilder::new().build());
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        let o = order.clone();
        scene.on(handle, EventKind::Update, move |_, _| {
            o.borrow_mut().push("first");
        });
        let o = order.clone();
        scene.once(handle, EventKind::Update, move |_, _| {
            o.borrow_mut().push("second-once");
        });
        let o = order.clone();
        scene.on(handle, EventKind::Update, move |_, _| {
            o.borrow_mut().push("third");
        });

        scene.update(0.016, &mut tweens);
        scene.update(0.016, &mut tweens);

        assert_eq!(
            *order.borrow(),
            vec!["first", "second-once", "third", "first", "third"]
        );
    }

    #[test]
    fn subscriber_can_remove_itself_during_dispatch() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let handle = scene.add(EntityBuilder::new().build());
        let count = Rc::new(Cell::new(0u32));

        let id = Rc::new(Cell::new(0u64));
        let id_clone = id.clone();
        let count_clone = count.clone();
        let registered = scene.on(handle, EventKind::Update, move |ctx, event| {
            count_clone.set(count_clone.get() + 1);
            ctx.scene.off(event.target, EventKind::Update, Some(id_clone.get()));
        });
        id.set(registered);

        scene.update(0.016, &mut tweens);
        scene.update(0.016, &mut tweens);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn off_without_id_drops_all_subscribers_of_the_kind() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let handle = scene.add(EntityBuilder::new().build());
        let count = Rc::new(Cell::new(0u32));

        for _ in 0..3 {
            let count = count.clone();
            scene.on(handle, EventKind::Update, move |_, _| {
                count.set(count.get() + 1);
            });
        }

        scene.update(0.016, &mut tweens);
        assert_eq!(count.get(), 3);

        scene.off(handle, EventKind::Update, None);
        scene.update(0.016, &mut tweens);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn off_all_during_dispatch_stops_remaining_subscribers() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let handle = scene.add(EntityBuilder::new().build());
        let calls = Rc::new(Cell::new(0u32));

        let count = calls.clone();
        scene.on(handle, EventKind::Update, move |ctx, event| {
            count.set(count.get() + 1);
            ctx.scene.off(event.target, EventKind::Update, None);
        });
        let count = calls.clone();
        scene.on(handle, EventKind::Update, move |_, _| {
            count.set(count.get() + 1);
        });

        scene.update(0.016, &mut tweens);
        // The first subscriber cleared the kind; the second never ran.
        assert_eq!(calls.get(), 1);

        scene.update(0.016, &mut tweens);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn subscriber_added_during_dispatch_waits_for_next_event() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let handle = scene.add(EntityBuilder::new().build());
        let inner_calls = Rc::new(Cell::new(0u32));

        let inner = inner_calls.clone();
        scene.once(handle, EventKind::Update, move |ctx, event| {
            let inner = inner.clone();
            let target = event.target;
            ctx.scene.on(target, EventKind::Update, move |_, _| {
                inner.set(inner.get() + 1);
            });
        });

        scene.update(0.016, &mut tweens);
        assert_eq!(inner_calls.get(), 0);

        scene.update(0.016, &mut tweens);
        assert_eq!(inner_calls.get(), 1);
    }

    #[test]
    fn overlapping_sprites_get_exactly_one_collision_enter_each() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let build = || {
            EntityBuilder::new()
                .with_position(100.0, 100.0)
                .with_size(50.0, 50.0)
                .with_check_collisions()
                .build()
        };
        let a = scene.add(build());
        let b = scene.add(build());

        let enters = Rc::new(Cell::new(0u32));
        let exits = Rc::new(Cell::new(0u32));
        for handle in [a, b] {
            let enters = enters.clone();
            scene.on(handle, EventKind::CollisionEnter, move |_, _| {
                enters.set(enters.get() + 1);
            });
            let exits = exits.clone();
            scene.on(handle, EventKind::CollisionExit, move |_, _| {
                exits.set(exits.get() + 1);
            });
        }

        scene.update(0.016, &mut tweens);

        assert_eq!(enters.get(), 2);
        assert_eq!(exits.get(), 0);
        // Contact tracking is symmetric.
        assert!(scene.get(a).is_colliding_with(b));
        assert!(scene.get(b).is_colliding_with(a));

        // Depenetration separated them by half the overlap each, so the next
        // pass sees them apart and fires exactly one exit per entity.
        scene.update(0.016, &mut tweens);
        assert_eq!(exits.get(), 2);
        assert!(!scene.get(a).is_colliding_with(b));
        assert!(!scene.get(b).is_colliding_with(a));
    }

    #[test]
    fn ball_bounces_off_static_floor() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let ball = scene.add(
            EntityBuilder::new()
                .with_position(200.0, 270.0)
                .with_radius(20.0)
                .with_velocity(0.0, 300.0)
                .with_check_collisions()
                .build(),
        );
        let _floor = scene.add(
            EntityBuilder::new()
                .with_position(200.0, 310.0)
                .with_size(400.0, 20.0)
                .with_static()
                .with_check_collisions()
                .build(),
        );

        scene.update(0.05, &mut tweens);

        let ball_ref = scene.get(ball);
        // The ball may not end the tick inside the floor.
        assert!(ball_ref.y() + ball_ref.radius() <= 300.0 + 1e-3);
        // Default restitution reflects the downward velocity.
        assert!(ball_ref.velocity_y().unwrap() <= 0.0);
        assert_relative_eq!(ball_ref.velocity_y().unwrap(), -240.0, epsilon = 1e-3);
    }

    #[test]
    fn resting_ball_stays_on_floor_across_many_ticks() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let ball = scene.add(
            EntityBuilder::new()
                .with_position(200.0, 250.0)
                .with_radius(20.0)
                .with_velocity(0.0, 0.0)
                .with_gravity(980.0)
                .with_bounciness(0.0)
                .with_check_collisions()
                .build(),
        );
        let _floor = scene.add(
            EntityBuilder::new()
                .with_position(200.0, 310.0)
                .with_size(400.0, 20.0)
                .with_static()
                .with_check_collisions()
                .build(),
        );

        for _ in 0..120 {
            scene.update(1.0 / 60.0, &mut tweens);
        }

        let ball_ref = scene.get(ball);
        // No inter-penetration persists, and the ball is not drifting down.
        assert!(ball_ref.y() + ball_ref.radius() <= 300.0 + 0.5);
        assert!(ball_ref.velocity_y().unwrap().abs() < 20.0);
    }

    #[test]
    fn collision_tag_filter_is_per_end() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let mut picky = EntityBuilder::new()
            .with_position(0.0, 0.0)
            .with_size(10.0, 10.0)
            .with_check_collisions()
            .build();
        picky.add_collision_tag("wall");
        let picky = scene.add(picky);
        let other = scene.add(
            EntityBuilder::new()
                .with_position(2.0, 0.0)
                .with_size(10.0, 10.0)
                .with_tag("ghost")
                .with_check_collisions()
                .build(),
        );

        let picky_hits = Rc::new(Cell::new(0u32));
        let other_hits = Rc::new(Cell::new(0u32));
        let c = picky_hits.clone();
        scene.on(picky, EventKind::Collide, move |_, _| c.set(c.get() + 1));
        let c = other_hits.clone();
        scene.on(other, EventKind::Collide, move |_, _| c.set(c.get() + 1));

        scene.update(0.016, &mut tweens);

        // `picky` filters on the "wall" tag, which `other` lacks; `other` has
        // no filter, so its own end still processes the pair.
        assert_eq!(picky_hits.get(), 0);
        assert_eq!(other_hits.get(), 1);
    }

    #[test]
    fn subscriber_may_remove_entities_during_collision_dispatch() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let build = || {
            EntityBuilder::new()
                .with_position(0.0, 0.0)
                .with_size(10.0, 10.0)
                .with_check_collisions()
                .build()
        };
        let a = scene.add(build());
        let b = scene.add(build());
        let c = scene.add(build());

        scene.on(a, EventKind::CollisionEnter, move |ctx, event| {
            // Destroy the other entity as soon as we touch it.
            let other = event.other;
            ctx.scene.remove(other);
        });

        scene.update(0.016, &mut tweens);

        assert!(scene.is_valid_handle(a));
        // At least one of the others was removed mid-pass without breaking
        // the iteration.
        assert!(!scene.is_valid_handle(b) || !scene.is_valid_handle(c));
        // No stale contacts point at removed entities.
        for (_, entity) in scene.pair_iter() {
            for other in entity.colliding_with() {
                assert!(scene.is_valid_handle(other));
            }
        }
    }

    #[test]
    fn delay_fires_once_and_interval_repeats() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let delays = Rc::new(Cell::new(0u32));
        let intervals = Rc::new(Cell::new(0u32));

        let d = delays.clone();
        scene.delay(0.05, move |_| d.set(d.get() + 1));
        let i = intervals.clone();
        scene.interval(0.03, move |_| i.set(i.get() + 1));

        for _ in 0..10 {
            scene.update(0.02, &mut tweens);
        }

        assert_eq!(delays.get(), 1);
        // 0.2 seconds at one firing per 0.03-second period, one per tick at
        // most: 5 firings (ticks 2, 4, 6, 8, 10).
        assert_eq!(intervals.get(), 5);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let fired = Rc::new(Cell::new(false));

        let f = fired.clone();
        let handle = scene.delay(0.01, move |_| f.set(true));
        handle.cancel();

        scene.update(0.1, &mut tweens);

        assert!(!fired.get());
        assert_eq!(scene.pending_timer_count(), 0);
    }

    #[test]
    fn world_transform_composes_through_parents() {
        let (mut scene, _) = scene_and_tweens();
        let parent = scene.add(
            EntityBuilder::new()
                .with_position(100.0, 0.0)
                .with_rotation(std::f32::consts::FRAC_PI_2)
                .build(),
        );
        let child = scene.add(EntityBuilder::new().with_position(10.0, 0.0).build());
        scene.link(child, parent);

        let world = scene.world_point(child, Vector2::new(0.0, 0.0));
        // The child sits 10 units along the parent's rotated x axis.
        assert_relative_eq!(world.x, 100.0, epsilon = 1e-4);
        assert_relative_eq!(world.y, 10.0, epsilon = 1e-4);

        assert_relative_eq!(
            scene.world_rotation(child),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn world_bounds_account_for_rotation() {
        let (mut scene, _) = scene_and_tweens();
        let handle = scene.add(
            EntityBuilder::new()
                .with_size(20.0, 10.0)
                .with_rotation(std::f32::consts::FRAC_PI_2)
                .build(),
        );

        let bounds = scene.world_bounds(handle);
        // Rotating 90 degrees swaps the extents.
        assert_relative_eq!(bounds.half_extents().x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(bounds.half_extents().y, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn hit_test_picks_topmost_interactive() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let bottom = scene.add(
            EntityBuilder::new()
                .with_position(0.0, 0.0)
                .with_size(100.0, 100.0)
                .with_z_index(0)
                .with_interactive()
                .build(),
        );
        let top = scene.add(
            EntityBuilder::new()
                .with_position(0.0, 0.0)
                .with_size(50.0, 50.0)
                .with_z_index(10)
                .with_interactive()
                .build(),
        );

        // Sorting happens lazily inside update.
        scene.update(0.0, &mut tweens);

        assert_eq!(scene.hit_test(Vector2::new(0.0, 0.0)), top);
        assert_eq!(scene.hit_test(Vector2::new(40.0, 0.0)), bottom);
        assert_eq!(scene.hit_test(Vector2::new(500.0, 0.0)), Handle::NONE);
    }

    #[test]
    fn zero_size_interactive_entity_is_never_hit() {
        let (mut scene, _) = scene_and_tweens();
        let handle = scene.add(
            EntityBuilder::new()
                .with_position(0.0, 0.0)
                .with_interactive()
                .build(),
        );

        assert_eq!(scene.hit_test(Vector2::new(0.0, 0.0)), Handle::NONE);
        let _ = handle;
    }

    #[test]
    fn stale_z_order_is_resorted_on_update() {
        let (mut scene, mut tweens) = scene_and_tweens();
        let a = scene.add(
            EntityBuilder::new()
                .with_size(10.0, 10.0)
                .with_interactive()
                .build(),
        );
        let b = scene.add(
            EntityBuilder::new()
                .with_size(10.0, 10.0)
                .with_interactive()
                .build(),
        );

        scene.update(0.0, &mut tweens);
        // Insertion order breaks the z tie: `b` is on top.
        assert_eq!(scene.hit_test(Vector2::new(0.0, 0.0)), b);

        scene.set_z_index(a, 5);
        scene.update(0.0, &mut tweens);
        assert_eq!(scene.hit_test(Vector2::new(0.0, 0.0)), a);
    }
}
