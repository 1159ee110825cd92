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

use std::{sync::Arc, sync::Mutex, time::Duration};

use petgraph::graph::NodeIndex;
use taskforge_interface::{Action, Artifact};

use crate::descriptor::OnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// Wall-clock timing for one node, relative to the `Instant` the driver
/// recorded as the sequence start. `duration_ms` includes every failed
/// attempt and retry delay, since `start_ms` is taken before the first
/// attempt and `end_ms` after the last.
#[derive(Debug, Clone, Copy)]
pub struct NodeMetrics {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl NodeMetrics {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

#[derive(Debug, Default)]
pub(crate) struct MutableState {
    pub status: Option<Status>,
    pub attempts: u32,
    pub artifact: Option<Artifact>,
    pub metrics: Option<NodeMetrics>,
}

/// One vertex of the graph. Identity, parents/children, and the descriptor
/// fields are fixed at build time; `status`/`attempts`/`artifact`/`metrics`
/// are written exactly once per run by the single task bound to this node
/// and are behind a `Mutex` only because the node is shared across tokio
/// task boundaries, not because concurrent writers are expected (see
/// SPEC_FULL.md §5).
pub struct GraphNode {
    pub id: String,
    pub(crate) action: Arc<dyn Action>,
    pub parents: Vec<NodeIndex>,
    pub children: Vec<NodeIndex>,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub on_error: OnError,
    pub priority: i64,
    pub insertion_order: usize,
    /// Longest-path depth from any root; assigned once by the planner
    /// before execution starts, read-only thereafter.
    pub level: usize,
    state: Mutex<MutableState>,
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("level", &self.level)
            .field("priority", &self.priority)
            .field("status", &self.status())
            .finish()
    }
}

impl GraphNode {
    pub(crate) fn new(
        id: String,
        action: Arc<dyn Action>,
        retry_count: u32,
        retry_delay: Duration,
        on_error: OnError,
        priority: i64,
        insertion_order: usize,
    ) -> Self {
        GraphNode {
            id,
            action,
            parents: Vec::new(),
            children: Vec::new(),
            retry_count,
            retry_delay,
            on_error,
            priority,
            insertion_order,
            level: 0,
            state: Mutex::new(MutableState {
                status: Some(Status::Pending),
                ..Default::default()
            }),
        }
    }

    pub fn action(&self) -> &Arc<dyn Action> {
        &self.action
    }

    pub fn status(&self) -> Status {
        self.state.lock().unwrap().status.unwrap_or(Status::Pending)
    }

    pub fn set_status(&self, status: Status) {
        self.state.lock().unwrap().status = Some(status);
    }

    pub fn attempts(&self) -> u32 {
        self.state.lock().unwrap().attempts
    }

    pub fn record_attempt(&self) {
        self.state.lock().unwrap().attempts += 1;
    }

    pub fn artifact(&self) -> Option<Artifact> {
        self.state.lock().unwrap().artifact.clone()
    }

    pub fn metrics(&self) -> Option<NodeMetrics> {
        self.state.lock().unwrap().metrics
    }

    /// Marks this node terminally successful with the given artifact and
    /// timing; `status` becomes `Succeeded`.
    pub(crate) fn finish_success(&self, artifact: Artifact, metrics: NodeMetrics) {
        let mut state = self.state.lock().unwrap();
        state.status = Some(Status::Succeeded);
        state.artifact = Some(artifact);
        state.metrics = Some(metrics);
    }

    /// Marks this node terminally failed; no artifact is stored.
    pub(crate) fn finish_failure(&self, metrics: NodeMetrics) {
        let mut state = self.state.lock().unwrap();
        state.status = Some(Status::Failed);
        state.metrics = Some(metrics);
    }

    /// Marks this node `Skipped` because an ancestor failed. `action` is
    /// never invoked; no metrics are recorded.
    pub(crate) fn skip(&self) {
        self.state.lock().unwrap().status = Some(Status::Skipped);
    }
}
