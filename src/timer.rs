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

//! Scoped timers driven by the frame clock: one-shot delays and repeating
//! intervals, both cancellable. Timers are owned by their scene, so destroying
//! the scene cancels everything that is still pending.

use crate::scene::SceneContext;
use std::cell::Cell;
use std::rc::Rc;

/// Callback fired by a timer.
pub type TimerCallback = Box<dyn FnMut(&mut SceneContext)>;

/// Cancellation handle of a scheduled timer. After [`TimerHandle::cancel`] the
/// callback is guaranteed not to fire.
#[derive(Clone)]
pub struct TimerHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

pub(crate) struct Timer {
    pub remaining: f32,
    /// `Some` makes the timer repeat with this period after each firing.
    pub period: Option<f32>,
    pub cancelled: Rc<Cell<bool>>,
    /// Taken out while the callback runs, so the callback can reschedule
    /// timers without aliasing the service.
    pub callback: Option<TimerCallback>,
}

/// See module docs.
#[derive(Default)]
pub struct TimerService {
    pub(crate) items: Vec<Timer>,
}

impl TimerService {
    /// Schedules a callback to fire once after `seconds`.
    pub(crate) fn schedule(
        &mut self,
        seconds: f32,
        period: Option<f32>,
        callback: TimerCallback,
    ) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        self.items.push(Timer {
            remaining: seconds.max(0.0),
            period,
            cancelled: cancelled.clone(),
            callback: Some(callback),
        });
        TimerHandle { cancelled }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for timer in &self.items {
            timer.cancelled.set(true);
        }
        self.items.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|t| !t.cancelled.get()).count()
    }
}
