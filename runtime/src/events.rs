/*
 * Copyright 2020 Nikhil Marathe <nsm.nikhil@gmail.com>
 * Copyright 2024 Task Graph Contributors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! The driver's structured event stream (§4.6): a totally ordered,
//! subscribable record of lifecycle transitions, independent of the
//! `tracing` mirroring that rides alongside it. Modeled as a
//! `tokio::sync::broadcast` channel, the same "fan out to however many
//! renderers are listening, drop the ones that lag" shape the teacher uses
//! for its own status-line plumbing, just generalized to structured data.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

/// One lifecycle record. Every variant carries the monotonic `seq` the bus
/// assigned it; ordering between two events for the same task is always
/// `seq`-total, matching the ordering guarantee in SPEC_FULL.md §5.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SequenceStarted {
        seq: u64,
        at_ms: u64,
    },
    SequenceFinished {
        seq: u64,
        ok: bool,
        at_ms: u64,
        duration_ms: u64,
    },
    TaskStarted {
        seq: u64,
        id: String,
        attempt: u32,
        at_ms: u64,
    },
    TaskAttemptFailed {
        seq: u64,
        id: String,
        attempt: u32,
        message: String,
    },
    TaskSucceeded {
        seq: u64,
        id: String,
        at_ms: u64,
        duration_ms: u64,
    },
    TaskFailed {
        seq: u64,
        id: String,
        at_ms: u64,
        attempts: u32,
    },
}

impl Event {
    pub fn seq(&self) -> u64 {
        match self {
            Event::SequenceStarted { seq, .. }
            | Event::SequenceFinished { seq, .. }
            | Event::TaskStarted { seq, .. }
            | Event::TaskAttemptFailed { seq, .. }
            | Event::TaskSucceeded { seq, .. }
            | Event::TaskFailed { seq, .. } => *seq,
        }
    }
}

/// Default channel depth; a subscriber that falls this many events behind
/// starts missing the oldest ones (`broadcast::Receiver::recv` reports a
/// `Lagged` error). Ample for interactive renderers; a subscriber that
/// needs a hard guarantee should drain eagerly.
const CHANNEL_CAPACITY: usize = 1024;

/// Owns sequence-number assignment and fans events out to subscribers, also
/// mirroring each one to `tracing` at the level named in SPEC_FULL.md §4.6.
pub struct EventBus {
    next_seq: AtomicU64,
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        EventBus {
            next_seq: AtomicU64::new(0),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn mirror(event: &Event) {
        match event {
            Event::SequenceStarted { at_ms, .. } => {
                tracing::info!(at_ms, "sequence started");
            }
            Event::SequenceFinished {
                ok,
                at_ms,
                duration_ms,
                ..
            } => {
                tracing::info!(ok, at_ms, duration_ms, "sequence finished");
            }
            Event::TaskStarted {
                id, attempt, at_ms, ..
            } => {
                tracing::info!(task = %id, attempt, at_ms, "task started");
            }
            Event::TaskAttemptFailed {
                id,
                attempt,
                message,
                ..
            } => {
                tracing::warn!(task = %id, attempt, message = %message, "task attempt failed");
            }
            Event::TaskSucceeded {
                id,
                at_ms,
                duration_ms,
                ..
            } => {
                tracing::info!(task = %id, at_ms, duration_ms, "task succeeded");
            }
            Event::TaskFailed {
                id,
                at_ms,
                attempts,
                ..
            } => {
                tracing::error!(task = %id, at_ms, attempts, "task failed");
            }
        }
    }

    /// Stamps `seq`, mirrors to `tracing`, and publishes on the broadcast
    /// channel. A publish with no subscribers is not an error: `send`
    /// failing just means nobody is currently listening.
    pub fn publish(&self, mut make_event: impl FnMut(u64) -> Event) -> Event {
        let seq = self.next_seq();
        let event = make_event(seq);
        Self::mirror(&event);
        let _ = self.sender.send(event.clone());
        event
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sequence_numbers_are_monotonic() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(|seq| Event::SequenceStarted { seq, at_ms: 0 });
        bus.publish(|seq| Event::TaskStarted {
            seq,
            id: "a".into(),
            attempt: 0,
            at_ms: 1,
        });
        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(second.seq() > first.seq());
    }
}
