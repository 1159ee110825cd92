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

//! `RunReport`: the structured summary handed back by a run, independent
//! of the live event stream (SPEC_FULL.md §1 "Supplemented features").
//! Grounded in the teacher's `Printer`, which already keeps running
//! `finished`/`total` counters; this formalizes that bookkeeping into an
//! inspectable value instead of only a side-effecting console print.

use taskforge_graph::{Graph, NodeMetrics, Status};

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub id: String,
    pub status: Status,
    pub attempts: u32,
    pub metrics: Option<NodeMetrics>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub ok: bool,
    pub duration_ms: u64,
    pub tasks: Vec<TaskReport>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunReport {
    /// Snapshots every node's current status, regardless of whether the run
    /// finished cleanly or was cut short by an abort: a node not yet visited
    /// when the abort was raised simply reports `Pending`.
    pub(crate) fn collect(graph: &Graph, ok: bool, duration_ms: u64) -> Self {
        let mut tasks = Vec::with_capacity(graph.node_count());
        let mut succeeded = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for index in graph.indices() {
            let node = graph.node(index);
            let status = node.status();
            match status {
                Status::Succeeded => succeeded += 1,
                Status::Failed => failed += 1,
                Status::Skipped => skipped += 1,
                _ => {}
            }
            tasks.push(TaskReport {
                id: node.id.clone(),
                status,
                attempts: node.attempts(),
                metrics: node.metrics(),
            });
        }

        RunReport {
            ok,
            duration_ms,
            tasks,
            succeeded,
            failed,
            skipped,
        }
    }

    pub fn task(&self, id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|task| task.id == id)
    }
}
