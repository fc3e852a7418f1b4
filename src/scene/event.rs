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

//! Per-entity event subscription. Each entity (and the scene surface) keeps a
//! table of subscribers keyed by [`EventKind`]; subscribers are invoked in
//! registration order and may freely mutate the scene, including unsubscribing
//! themselves mid-dispatch.

use crate::{
    core::{algebra::Vector2, fxhash::FxHashMap, pool::Handle},
    scene::{entity::Entity, SceneContext},
};
use std::str::FromStr;
use strum_macros::{AsRefStr, EnumString};

/// The kind of an event. Event names used by the string-based API are the
/// lowercase serializations, e.g. `"collisionenter"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Update,
    Tap,
    LongPress,
    DragStart,
    Drag,
    DragEnd,
    Swipe,
    Pinch,
    PointerOver,
    PointerOut,
    PointerDown,
    PointerUp,
    Collide,
    CollisionEnter,
    CollisionExit,
}

impl EventKind {
    /// Parses an event name, e.g. `"dragstart"`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }
}

/// Direction of a recognized swipe, by dominant axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Payload shared by every event. Fields that do not apply to the event kind
/// are left at their defaults.
#[derive(Clone, Debug)]
pub struct Event {
    pub kind: EventKind,
    /// The entity the event was aimed at. Surface-level handlers can use this
    /// to skip events that were already delivered to an entity.
    pub target: Handle<Entity>,
    /// The other entity of a collision pair.
    pub other: Handle<Entity>,
    /// Collision normal pointing from `other` towards `target`.
    pub normal: Vector2<f32>,
    /// Time step of an update event, in seconds.
    pub dt: f32,
    /// Pointer position in world space.
    pub position: Vector2<f32>,
    /// Pointer movement since the previous sample, in world units.
    pub delta: Vector2<f32>,
    pub direction: Option<SwipeDirection>,
    /// Current separation of the two pinch pointers.
    pub distance: f32,
    /// Ratio of the current pinch separation to the initial one.
    pub scale: f32,
    pub pointer_id: u64,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: Handle::NONE,
            other: Handle::NONE,
            normal: Vector2::default(),
            dt: 0.0,
            position: Vector2::default(),
            delta: Vector2::default(),
            direction: None,
            distance: 0.0,
            scale: 1.0,
            pointer_id: 0,
        }
    }

    pub fn update(dt: f32) -> Self {
        Self {
            dt,
            ..Self::new(EventKind::Update)
        }
    }

    pub fn collision(kind: EventKind, other: Handle<Entity>, normal: Vector2<f32>) -> Self {
        Self {
            other,
            normal,
            ..Self::new(kind)
        }
    }
}

/// Identifier of a registered subscriber, used to unsubscribe.
pub type SubscriberId = u64;

/// A type-erased subscriber callback.
pub type EventCallback = Box<dyn FnMut(&mut SceneContext, &Event)>;

pub(crate) struct Subscriber {
    pub id: SubscriberId,
    pub once: bool,
    pub callback: EventCallback,
}

/// Keyed subscriber lists of a single entity (or of the scene surface).
///
/// Dispatch contract:
/// - subscribers fire in registration order;
/// - a subscriber may unsubscribe itself (or any other subscriber) during
///   dispatch;
/// - a subscriber added during dispatch is not invoked for the in-flight event;
/// - a `once` subscriber is removed immediately before its callback fires, so
///   re-subscribing from inside the callback is safe.
#[derive(Default)]
pub struct EventDispatcher {
    lists: FxHashMap<EventKind, Vec<Subscriber>>,
    /// Tombstones for subscribers removed while their list is taken out for
    /// dispatch.
    pending_removal: Vec<SubscriberId>,
    /// Kinds fully cleared while their list is taken out for dispatch.
    purged: Vec<EventKind>,
    /// Number of dispatches currently in flight, per kind; a purge marker is
    /// only consumed when the outermost dispatch of its kind ends.
    in_flight: FxHashMap<EventKind, u32>,
    dispatch_depth: u32,
    next_id: SubscriberId,
}

impl EventDispatcher {
    pub(crate) fn subscribe(
        &mut self,
        kind: EventKind,
        once: bool,
        callback: EventCallback,
    ) -> SubscriberId {
        self.next_id += 1;
        let id = self.next_id;
        self.lists.entry(kind).or_default().push(Subscriber {
            id,
            once,
            callback,
        });
        id
    }

    /// Removes one subscriber by id, or every subscriber of the kind when `id`
    /// is `None`.
    pub(crate) fn unsubscribe(&mut self, kind: EventKind, id: Option<SubscriberId>) {
        match id {
            Some(id) => {
                let mut found = false;
                if let Some(list) = self.lists.get_mut(&kind) {
                    let before = list.len();
                    list.retain(|s| s.id != id);
                    found = list.len() != before;
                }
                if !found && self.in_flight.contains_key(&kind) {
                    // The subscriber is in a list currently taken out for
                    // dispatch; leave a tombstone for it.
                    self.pending_removal.push(id);
                }
            }
            None => {
                self.lists.remove(&kind);
                if self.in_flight.contains_key(&kind) && !self.purged.contains(&kind) {
                    self.purged.push(kind);
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        let kinds = self.lists.keys().copied().collect::<Vec<_>>();
        for kind in kinds {
            self.unsubscribe(kind, None);
        }
    }

    pub(crate) fn begin_dispatch(&mut self, kind: EventKind) -> Vec<Subscriber> {
        self.dispatch_depth += 1;
        *self.in_flight.entry(kind).or_insert(0) += 1;
        self.lists.remove(&kind).unwrap_or_default()
    }

    /// True if the given subscriber was tombstoned mid-dispatch. Consumes the
    /// tombstone.
    pub(crate) fn consume_tombstone(&mut self, id: SubscriberId) -> bool {
        if let Some(position) = self.pending_removal.iter().position(|&p| p == id) {
            self.pending_removal.remove(position);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_purged(&self, kind: EventKind) -> bool {
        self.purged.contains(&kind)
    }

    pub(crate) fn end_dispatch(&mut self, kind: EventKind, mut survivors: Vec<Subscriber>) {
        // Consume tombstones that match a survivor; keep the rest, they may
        // belong to a list taken out by an outer dispatch.
        let pending = std::mem::take(&mut self.pending_removal);
        self.pending_removal = pending
            .into_iter()
            .filter(|id| {
                if let Some(position) = survivors.iter().position(|s| s.id == *id) {
                    survivors.remove(position);
                    false
                } else {
                    true
                }
            })
            .collect();

        let innermost_done = match self.in_flight.get_mut(&kind) {
            Some(count) => {
                *count -= 1;
                *count == 0
            }
            None => true,
        };
        if innermost_done {
            self.in_flight.remove(&kind);
        }

        if self.purged.contains(&kind) {
            // The kind was cleared mid-dispatch; the survivors are gone. The
            // marker stays until the outermost dispatch of the kind unwinds.
            if innermost_done {
                self.purged.retain(|&k| k != kind);
            }
        } else if !survivors.is_empty() {
            // Subscribers added during dispatch were pushed into a fresh list;
            // the surviving original subscribers must come first to preserve
            // registration order.
            let added = self.lists.remove(&kind).unwrap_or_default();
            survivors.extend(added);
            self.lists.insert(kind, survivors);
        }

        self.dispatch_depth -= 1;
        if self.dispatch_depth == 0 {
            self.pending_removal.clear();
        }
    }
}
