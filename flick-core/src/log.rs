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

//! Engine-wide logging. Messages below the configured verbosity are dropped;
//! the rest are printed to standard output and forwarded to any number of
//! attached `mpsc` listeners. Listeners whose receiving end is gone are
//! detached on the next message.

use crate::lazy_static::lazy_static;
use crate::parking_lot::Mutex;
use instant::Instant;
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Severity of a log message, ordered from chattiest to most serious.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    Information,
    Warning,
    Error,
}

impl MessageKind {
    fn prefix(self) -> &'static str {
        match self {
            MessageKind::Information => "[info] ",
            MessageKind::Warning => "[warn] ",
            MessageKind::Error => "[error] ",
        }
    }
}

/// A log message as delivered to listeners.
pub struct LogMessage {
    pub kind: MessageKind,
    /// The message text, without the severity prefix.
    pub content: String,
    /// How long after logger start-up the message was recorded.
    pub time: Duration,
}

struct LogState {
    verbosity: MessageKind,
    listeners: Vec<Sender<LogMessage>>,
    started: Instant,
}

lazy_static! {
    static ref STATE: Mutex<LogState> = Mutex::new(LogState {
        verbosity: MessageKind::Information,
        listeners: Vec::new(),
        started: Instant::now(),
    });
}

/// See module docs.
pub struct Log;

impl Log {
    fn publish(kind: MessageKind, message: &str) {
        let mut state = STATE.lock();
        if kind < state.verbosity {
            return;
        }

        let time = state.started.elapsed();
        state.listeners.retain(|listener| {
            listener
                .send(LogMessage {
                    kind,
                    content: message.to_owned(),
                    time,
                })
                .is_ok()
        });

        println!("{}{}", kind.prefix(), message);
    }

    pub fn info<S: AsRef<str>>(message: S) {
        Self::publish(MessageKind::Information, message.as_ref());
    }

    pub fn warn<S: AsRef<str>>(message: S) {
        Self::publish(MessageKind::Warning, message.as_ref());
    }

    pub fn err<S: AsRef<str>>(message: S) {
        Self::publish(MessageKind::Error, message.as_ref());
    }

    /// Drops every message chattier than `kind` from now on.
    pub fn set_verbosity(kind: MessageKind) {
        STATE.lock().verbosity = kind;
    }

    /// Attaches a listener; it receives a copy of every message that passes
    /// the verbosity filter.
    pub fn add_listener(listener: Sender<LogMessage>) {
        STATE.lock().listeners.push(listener);
    }
}
