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

//! Threshold-based gesture recognition over world-space pointer samples.
//!
//! A pointer that goes down and up within the tap radius and tap window is a
//! tap; held still past the long-press deadline it is a long press; moved past
//! the tap radius it becomes a drag (which cancels the long press); released
//! after a long, fast trajectory it additionally produces a swipe. Two
//! simultaneous pointers produce pinch updates, with the scale reset to 1 when
//! the second pointer goes down. Hover transitions produce pointer-over and
//! pointer-out pairs.

use crate::{
    core::{algebra::Vector2, fxhash::FxHashMap, pool::Handle},
    scene::{
        entity::Entity,
        event::{Event, EventKind, SwipeDirection},
        Scene,
    },
};

/// Maximum displacement for taps and long presses, in world units.
pub const TAP_RADIUS: f32 = 10.0;
/// Maximum duration of a tap, in seconds.
pub const TAP_DURATION: f32 = 0.3;
/// Hold duration that turns a press into a long press, in seconds.
pub const LONG_PRESS_DURATION: f32 = 0.5;
/// Minimum down-to-up trajectory length of a swipe, in world units.
pub const SWIPE_MIN_DISTANCE: f32 = 30.0;
/// Minimum average speed of a swipe, in world units per second.
pub const SWIPE_MIN_SPEED: f32 = 300.0;

/// A recognized gesture, ready for dispatch to its target entity and to the
/// scene surface.
#[derive(Clone, Debug)]
pub struct GestureEvent {
    pub kind: EventKind,
    /// Topmost interactive entity under the pointer, or `NONE`.
    pub target: Handle<Entity>,
    /// World-space pointer position.
    pub position: Vector2<f32>,
    /// World-space movement since the previous sample (drag events).
    pub delta: Vector2<f32>,
    pub direction: Option<SwipeDirection>,
    /// Current two-pointer separation (pinch events).
    pub distance: f32,
    /// Current separation over the initial separation (pinch events).
    pub scale: f32,
    pub pointer_id: u64,
}

impl GestureEvent {
    fn new(kind: EventKind, pointer_id: u64, position: Vector2<f32>, target: Handle<Entity>) -> Self {
        Self {
            kind,
            target,
            position,
            delta: Vector2::default(),
            direction: None,
            distance: 0.0,
            scale: 1.0,
            pointer_id,
        }
    }

    /// Converts the gesture into an event payload for dispatch.
    pub fn to_event(&self) -> Event {
        let mut event = Event::new(self.kind);
        event.target = self.target;
        event.position = self.position;
        event.delta = self.delta;
        event.direction = self.direction;
        event.distance = self.distance;
        event.scale = self.scale;
        event.pointer_id = self.pointer_id;
        event
    }
}

/// Per-pointer gesture state.
struct GestureSession {
    down_position: Vector2<f32>,
    down_time: f32,
    last_position: Vector2<f32>,
    /// Accumulated world-space path with timestamps.
    path: Vec<(Vector2<f32>, f32)>,
    /// Entity hit at pointer-down; drags and taps stay addressed to it.
    target: Handle<Entity>,
    drag_active: bool,
    long_press_fired: bool,
}

impl GestureSession {
    fn displacement(&self) -> Vector2<f32> {
        self.last_position - self.down_position
    }
}

/// See module docs.
#[derive(Default)]
pub struct GestureRecognizer {
    sessions: FxHashMap<u64, GestureSession>,
    hover: FxHashMap<u64, Handle<Entity>>,
    /// Two-finger separation at the moment the second pointer went down.
    pinch_initial_distance: Option<f32>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one world-space pointer sample, appending recognized gestures to
    /// `out`. The scene is used for hit testing only.
    pub fn process(&mut self, sample: crate::input::PointerSample, scene: &Scene, out: &mut Vec<GestureEvent>) {
        use crate::input::PointerPhase;

        match sample.phase {
            PointerPhase::Down => self.on_down(sample.id, sample.position, sample.time, scene, out),
            PointerPhase::Move => self.on_move(sample.id, sample.position, sample.time, scene, out),
            PointerPhase::Up => self.on_up(sample.id, sample.position, sample.time, scene, out),
            PointerPhase::Cancel => {
                self.sessions.remove(&sample.id);
                if self.sessions.len() < 2 {
                    self.pinch_initial_distance = None;
                }
            }
        }
    }

    /// Checks long-press deadlines. Call once per tick with the current time
    /// on the same clock as the samples.
    pub fn tick(&mut self, now: f32, out: &mut Vec<GestureEvent>) {
        for (&id, session) in self.sessions.iter_mut() {
            if !session.drag_active
                && !session.long_press_fired
                && now - session.down_time >= LONG_PRESS_DURATION
            {
                session.long_press_fired = true;
                out.push(GestureEvent::new(
                    EventKind::LongPress,
                    id,
                    session.last_position,
                    session.target,
                ));
            }
        }
    }

    /// Number of live pointer sessions.
    pub fn active_pointer_count(&self) -> usize {
        self.sessions.len()
    }

    fn on_down(
        &mut self,
        id: u64,
        position: Vector2<f32>,
        time: f32,
        scene: &Scene,
        out: &mut Vec<GestureEvent>,
    ) {
        let target = scene.hit_test(position);
        self.sessions.insert(
            id,
            GestureSession {
                down_position: position,
                down_time: time,
                last_position: position,
                path: vec![(position, time)],
                target,
                drag_active: false,
                long_press_fired: false,
            },
        );

        // The pinch scale resets to 1 whenever the second pointer goes down.
        if self.sessions.len() == 2 {
            self.pinch_initial_distance = Some(self.pointer_separation());
        }

        out.push(GestureEvent::new(EventKind::PointerDown, id, position, target));
    }

    fn on_move(
        &mut self,
        id: u64,
        position: Vector2<f32>,
        time: f32,
        scene: &Scene,
        out: &mut Vec<GestureEvent>,
    ) {
        self.update_hover(id, position, scene, out);

        let Some(session) = self.sessions.get_mut(&id) else {
            return;
        };

        let delta = position - session.last_position;
        session.last_position = position;
        session.path.push((position, time));

        if !session.drag_active
            && !session.long_press_fired
            && session.displacement().norm() > TAP_RADIUS
        {
            // Leaving the tap radius turns the press into a drag and cancels
            // any pending long press.
            session.drag_active = true;
            let mut start = GestureEvent::new(
                EventKind::DragStart,
                id,
                position,
                session.target,
            );
            start.delta = delta;
            out.push(start);
        }

        if session.drag_active {
            let target = session.target;
            let mut drag = GestureEvent::new(EventKind::Drag, id, position, target);
            drag.delta = delta;
            out.push(drag);
        }

        if self.sessions.len() >= 2 {
            if let Some(initial) = self.pinch_initial_distance {
                let distance = self.pointer_separation();
                let mut pinch =
                    GestureEvent::new(EventKind::Pinch, id, position, Handle::NONE);
                pinch.distance = distance;
                pinch.scale = if initial > f32::EPSILON {
                    distance / initial
                } else {
                    1.0
                };
                out.push(pinch);
            }
        }
    }

    fn on_up(
        &mut self,
        id: u64,
        position: Vector2<f32>,
        time: f32,
        _scene: &Scene,
        out: &mut Vec<GestureEvent>,
    ) {
        let Some(mut session) = self.sessions.remove(&id) else {
            return;
        };
        if self.sessions.len() < 2 {
            self.pinch_initial_distance = None;
        }

        session.last_position = position;
        session.path.push((position, time));

        let displacement = session.displacement();
        let duration = time - session.down_time;

        if session.drag_active {
            let mut end = GestureEvent::new(EventKind::DragEnd, id, position, session.target);
            end.delta = displacement;
            out.push(end);
        } else if !session.long_press_fired
            && displacement.norm() <= TAP_RADIUS
            && duration <= TAP_DURATION
        {
            out.push(GestureEvent::new(
                EventKind::Tap,
                id,
                position,
                session.target,
            ));
        }

        // A swipe is a fast, long trajectory; it coexists with the drag
        // events that traced it. The accumulated path length is the
        // trajectory, the displacement picks the direction.
        let trajectory: f32 = session
            .path
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0).norm())
            .sum();
        if trajectory >= SWIPE_MIN_DISTANCE
            && duration > 0.0
            && trajectory / duration >= SWIPE_MIN_SPEED
        {
            let mut swipe = GestureEvent::new(EventKind::Swipe, id, position, session.target);
            swipe.delta = displacement;
            swipe.direction = Some(dominant_direction(displacement));
            out.push(swipe);
        }

        out.push(GestureEvent::new(
            EventKind::PointerUp,
            id,
            position,
            session.target,
        ));
    }

    fn update_hover(
        &mut self,
        id: u64,
        position: Vector2<f32>,
        scene: &Scene,
        out: &mut Vec<GestureEvent>,
    ) {
        let current = scene.hit_test(position);
        let previous = self.hover.get(&id).copied().unwrap_or(Handle::NONE);
        if current == previous {
            return;
        }

        if previous.is_some() {
            out.push(GestureEvent::new(
                EventKind::PointerOut,
                id,
                position,
                previous,
            ));
        }
        if current.is_some() {
            out.push(GestureEvent::new(
                EventKind::PointerOver,
                id,
                position,
                current,
            ));
        }

        self.hover.insert(id, current);
    }

    /// Distance between the first two live pointers.
    fn pointer_separation(&self) -> f32 {
        let mut positions = self.sessions.values().map(|s| s.last_position);
        match (positions.next(), positions.next()) {
            (Some(a), Some(b)) => (a - b).norm(),
            _ => 0.0,
        }
    }
}

fn dominant_direction(displacement: Vector2<f32>) -> SwipeDirection {
    if displacement.x.abs() > displacement.y.abs() {
        if displacement.x > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        }
    } else if displacement.y > 0.0 {
        SwipeDirection::Down
    } else {
        SwipeDirection::Up
    }
}
