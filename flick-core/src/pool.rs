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

//! A generational object pool.
//!
//! Objects live in a flat vector of slots and are addressed by [`Handle`]s, a
//! pair of slot index and generation counter. Freeing a slot bumps its
//! generation, so every handle taken out before the free stops resolving
//! instead of silently pointing at whatever object reuses the slot. This is
//! what lets scene entities refer to each other without lifetimes: a handle is
//! `Copy`, never dangles, and can be checked for liveness at any time.
//!
//! Freed slots are recycled through a free list, so long-running scenes do not
//! grow their storage just by churning objects.

use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// Generation given to a slot that has never held an object, and carried by
/// [`Handle::NONE`]. Live slots start counting from 1.
const FREE_GENERATION: u32 = 0;

/// A typed, copyable reference into a [`Pool`]. A handle either resolves to
/// the exact object it was created for, or to nothing at all.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    kind: PhantomData<T>,
}

impl<T> Handle<T> {
    /// The null handle; it resolves to nothing in every pool.
    pub const NONE: Handle<T> = Handle {
        index: 0,
        generation: FREE_GENERATION,
        kind: PhantomData,
    };

    #[inline(always)]
    pub fn new(index: u32, generation: u32) -> Self {
        Handle {
            index,
            generation,
            kind: PhantomData,
        }
    }

    #[inline(always)]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline(always)]
    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline(always)]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline(always)]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

// Manual impls: a handle is Copy/Eq/Hash no matter whether `T` is.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<T> Display for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({}@{})", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    /// Matches the generation of every handle issued for the current payload.
    generation: u32,
    payload: Option<T>,
}

impl<T: Clone> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            payload: self.payload.clone(),
        }
    }
}

/// See module docs.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    /// Indices of vacated slots, ready for reuse.
    free: Vec<u32>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            free: self.free.clone(),
        }
    }
}

impl<T> Pool<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Puts an object into the pool and returns a handle to it.
    #[inline]
    #[must_use]
    pub fn spawn(&mut self, payload: T) -> Handle<T> {
        self.spawn_with(|_| payload)
    }

    /// Like [`Pool::spawn`], but the object is built by a closure that
    /// receives the handle it is about to occupy. Useful for objects that
    /// store their own handle. The handle does not resolve until the closure
    /// returns.
    #[must_use]
    pub fn spawn_with<F: FnOnce(Handle<T>) -> T>(&mut self, make: F) -> Handle<T> {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.payload.is_none(), "free list pointed at a live slot");
                let generation = slot.generation + 1;
                let handle = Handle::new(index, generation);
                slot.generation = generation;
                slot.payload = Some(make(handle));
                handle
            }
            None => {
                let handle = Handle::new(self.slots.len() as u32, FREE_GENERATION + 1);
                self.slots.push(Slot {
                    generation: handle.generation,
                    payload: Some(make(handle)),
                });
                handle
            }
        }
    }

    /// Resolves a handle to a shared reference, or `None` if the slot was
    /// freed or reused since the handle was issued.
    #[inline]
    #[must_use]
    pub fn try_borrow(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.payload.as_ref())
    }

    /// Mutable counterpart of [`Pool::try_borrow`].
    #[inline]
    #[must_use]
    pub fn try_borrow_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.payload.as_mut())
    }

    /// Resolves a handle to a shared reference.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not resolve to a live object.
    #[inline]
    #[must_use]
    pub fn borrow(&self, handle: Handle<T>) -> &T {
        let slot_count = self.slots.len();
        match self.try_borrow(handle) {
            Some(payload) => payload,
            None => panic!("{handle:?} does not resolve in a pool of {slot_count} slots"),
        }
    }

    /// Resolves a handle to a mutable reference.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not resolve to a live object.
    #[inline]
    #[must_use]
    pub fn borrow_mut(&mut self, handle: Handle<T>) -> &mut T {
        let slot_count = self.slots.len();
        match self.try_borrow_mut(handle) {
            Some(payload) => payload,
            None => panic!("{handle:?} does not resolve in a pool of {slot_count} slots"),
        }
    }

    /// Resolves two distinct handles mutably at the same time, by splitting
    /// the slot storage between them.
    ///
    /// # Panics
    ///
    /// Panics if the handles share an index or either one is dead.
    #[must_use]
    pub fn borrow_two_mut(&mut self, handles: (Handle<T>, Handle<T>)) -> (&mut T, &mut T) {
        assert_ne!(
            handles.0.index, handles.1.index,
            "both handles point at slot {}",
            handles.0.index
        );

        let swapped = handles.0.index > handles.1.index;
        let (low, high) = if swapped {
            (handles.1, handles.0)
        } else {
            (handles.0, handles.1)
        };

        if high.index as usize >= self.slots.len() {
            panic!("{high:?} is outside a pool of {} slots", self.slots.len());
        }

        let (left, right) = self.slots.split_at_mut(high.index as usize);
        let first = left
            .get_mut(low.index as usize)
            .filter(|slot| slot.generation == low.generation)
            .and_then(|slot| slot.payload.as_mut());
        let second = right
            .first_mut()
            .filter(|slot| slot.generation == high.generation)
            .and_then(|slot| slot.payload.as_mut());

        match (first, second) {
            (Some(a), Some(b)) => {
                if swapped {
                    (b, a)
                } else {
                    (a, b)
                }
            }
            _ => panic!("one of {:?} and {:?} is dead", handles.0, handles.1),
        }
    }

    /// Takes an object out of the pool, invalidating every handle to it.
    /// Returns `None` if the handle is already dead.
    pub fn try_free(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let payload = slot.payload.take()?;
        self.free.push(handle.index);
        Some(payload)
    }

    /// Takes an object out of the pool, invalidating every handle to it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is dead.
    pub fn free(&mut self, handle: Handle<T>) -> T {
        match self.try_free(handle) {
            Some(payload) => payload,
            None => panic!("cannot free dead {handle:?}"),
        }
    }

    /// Drops every object for which `keep` returns `false`, invalidating
    /// their handles.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let drop_it = matches!(slot.payload.as_ref(), Some(payload) if !keep(payload));
            if drop_it {
                slot.payload = None;
                self.free.push(index as u32);
            }
        }
    }

    /// True if the handle currently resolves to a live object.
    #[inline]
    pub fn is_valid_handle(&self, handle: Handle<T>) -> bool {
        self.try_borrow(handle).is_some()
    }

    /// Number of live objects. Walks the slots, so it is `O(n)`.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> u32 {
        self.iter().count() as u32
    }

    /// Iterates over live objects in slot order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.payload.as_ref())
    }

    /// Mutable counterpart of [`Pool::iter`].
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.payload.as_mut())
    }

    /// Iterates over `(handle, object)` pairs of live objects in slot order.
    #[inline]
    pub fn pair_iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.payload
                .as_ref()
                .map(|payload| (Handle::new(index as u32, slot.generation), payload))
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Handle, Pool};

    #[test]
    fn spawn_borrow_free_cycle() {
        let mut pool: Pool<String> = Pool::new();
        let first = pool.spawn("first".to_owned());
        let second = pool.spawn("second".to_owned());

        assert_eq!(pool.borrow(first), "first");
        assert_eq!(pool.borrow(second), "second");
        assert_eq!(pool.alive_count(), 2);

        assert_eq!(pool.free(first), "first");
        assert!(!pool.is_valid_handle(first));
        assert!(pool.is_valid_handle(second));
        assert_eq!(pool.alive_count(), 1);
    }

    #[test]
    fn freed_slot_is_reused_with_a_new_generation() {
        let mut pool: Pool<u32> = Pool::new();
        let old = pool.spawn(1);
        pool.free(old);

        let new = pool.spawn(2);
        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());

        // The stale handle must not resolve to the new occupant.
        assert!(pool.try_borrow(old).is_none());
        assert_eq!(pool.try_borrow(new), Some(&2));
    }

    #[test]
    fn spawn_with_sees_its_own_handle() {
        struct Node {
            this: Handle<Node>,
        }

        let mut pool: Pool<Node> = Pool::new();
        let handle = pool.spawn_with(|this| Node { this });
        assert_eq!(pool.borrow(handle).this, handle);
    }

    #[test]
    fn borrow_two_mut_in_either_order() {
        let mut pool: Pool<u32> = Pool::new();
        let a = pool.spawn(1);
        let b = pool.spawn(2);

        let (a_ref, b_ref) = pool.borrow_two_mut((a, b));
        *a_ref = 10;
        *b_ref = 20;

        let (b_ref, a_ref) = pool.borrow_two_mut((b, a));
        assert_eq!(*b_ref, 20);
        assert_eq!(*a_ref, 10);
    }

    #[test]
    #[should_panic]
    fn borrow_two_mut_rejects_aliasing() {
        let mut pool: Pool<u32> = Pool::new();
        let a = pool.spawn(1);
        let _ = pool.borrow_two_mut((a, a));
    }

    #[test]
    fn retain_frees_rejected_objects() {
        let mut pool: Pool<u32> = Pool::new();
        let odd = pool.spawn(1);
        let even = pool.spawn(2);

        pool.retain(|value| value % 2 != 0);

        assert!(pool.is_valid_handle(odd));
        assert!(!pool.is_valid_handle(even));
        // The freed slot is reusable.
        let replacement = pool.spawn(4);
        assert_eq!(replacement.index(), even.index());
    }

    #[test]
    fn iterators_visit_only_live_objects() {
        let mut pool: Pool<u32> = Pool::new();
        let _ = pool.spawn(1);
        let hole = pool.spawn(2);
        let _ = pool.spawn(3);
        pool.free(hole);

        assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec![1, 3]);

        for value in pool.iter_mut() {
            *value *= 10;
        }
        for (handle, value) in pool.pair_iter() {
            assert_eq!(pool.borrow(handle), value);
        }
    }

    #[test]
    fn none_handle_never_resolves() {
        let mut pool: Pool<u32> = Pool::new();
        let _ = pool.spawn(7);
        assert!(pool.try_borrow(Handle::NONE).is_none());
        assert!(Handle::<u32>::default().is_none());
        assert!(pool.try_free(Handle::NONE).is_none());
    }
}
