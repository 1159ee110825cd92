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

use std::{sync::Arc, time::Duration};

use taskforge_interface::Action;

/// Governs what the driver does once a task has exhausted its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    /// Report the failure, leave descendants `skipped`, keep going.
    #[default]
    Continue,
    /// Report the failure and halt the run with `SequenceAborted` once the
    /// current level finishes draining.
    Abort,
}

/// An immutable declaration of one unit of work. Built once via the
/// constructor + builder methods, then handed to the graph builder; never
/// mutated afterward.
#[derive(Clone)]
pub struct TaskDescriptor {
    pub id: String,
    pub(crate) action: Arc<dyn Action>,
    pub parents: Vec<String>,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub on_error: OnError,
    pub priority: i64,
}

impl std::fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("id", &self.id)
            .field("parents", &self.parents)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("on_error", &self.on_error)
            .field("priority", &self.priority)
            .finish()
    }
}

impl TaskDescriptor {
    pub fn new(id: impl Into<String>, action: Arc<dyn Action>) -> Self {
        TaskDescriptor {
            id: id.into(),
            action,
            parents: Vec::new(),
            retry_count: 0,
            retry_delay: Duration::from_millis(0),
            on_error: OnError::Continue,
            priority: 0,
        }
    }

    /// Sets the ordered parent ids; this order becomes the positional
    /// argument order the action is called with.
    pub fn parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// `count` additional attempts beyond the first, each preceded by a
    /// sleep of `delay`.
    pub fn retry(mut self, count: u32, delay: Duration) -> Self {
        self.retry_count = count;
        self.retry_delay = delay;
        self
    }

    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    /// Higher runs earlier among ready siblings; ties keep insertion order.
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}
