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

//! The programmatic surface of the engine (SPEC_FULL.md §6): build a
//! `Sequence` from `TaskDescriptor`s, run it, and read back artifacts and
//! the terminal `RunReport`. Graph validation, planning, and execution
//! live in `taskforge-graph`/`taskforge-runtime`; this crate is the thin
//! facade the teacher's own `ninja` crate plays relative to `ninja-builder`.

mod printer;

use std::sync::Arc;

pub use taskforge_graph::{GraphError, OnError, Status, TaskDescriptor};
pub use taskforge_interface::{fn_action, value_action, Action, ActionError, ActionResult, Artifact, NullTracer, Tracer, TracingTracer};
pub use taskforge_runtime::{Event, RunReport, SequenceError, TaskReport};

use taskforge_graph::Graph;
use taskforge_runtime::EventBus;

use printer::Printer;

/// The entire configuration surface (SPEC_FULL.md §1: "no persisted or
/// file-based configuration exists in scope").
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Upper bound on simultaneously running task actions. Must be at
    /// least 1; `Sequence` clamps a lower value up rather than rejecting it.
    pub max_concurrency: usize,
    /// Emit a human-readable progress line per lifecycle event to stdout.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_concurrency: 1,
            verbose: false,
        }
    }
}

/// One declared-and-run DAG of tasks. Add descriptors with `add_task`,
/// then `run` once; `run` consumes the pending descriptors, so a second
/// call with no further `add_task` calls executes an empty graph.
pub struct Sequence {
    config: Config,
    descriptors: Vec<TaskDescriptor>,
    tracer: Arc<dyn Tracer>,
    graph: Option<Arc<Graph>>,
    events: Arc<EventBus>,
    last_report: Option<RunReport>,
}

impl Sequence {
    pub fn new(config: Config) -> Self {
        Sequence {
            config,
            descriptors: Vec::new(),
            tracer: Arc::new(TracingTracer::new()),
            graph: None,
            events: Arc::new(EventBus::new()),
            last_report: None,
        }
    }

    /// Swaps the default `tracing`-backed tracer for a caller-supplied one.
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Appends a task descriptor. Id uniqueness is checked at `run`, not here.
    pub fn add_task(mut self, descriptor: TaskDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Subscribes to the structured event stream. The bus lives as long as
    /// the `Sequence` does, so this may be called before or after `run`;
    /// subscribing before `run` is the only way to see the full stream,
    /// since a receiver only gets events published after it subscribes.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Validates, plans, and executes every added task, returning the
    /// summary report on success or the reason the run was cut short.
    /// `last_report()` still returns a report after an abort.
    pub async fn run(&mut self) -> Result<RunReport, SequenceError> {
        if self.config.verbose {
            taskforge_metrics::enable();
        }

        let descriptors = std::mem::take(&mut self.descriptors);
        let mut graph = taskforge_graph::build(descriptors)?;
        let plan = taskforge_runtime::plan(&mut graph)?;
        let graph = Arc::new(graph);
        self.graph = Some(graph.clone());

        let events = self.events.clone();

        let printer_handle = self.config.verbose.then(|| {
            let mut rx = events.subscribe();
            let total = graph.node_count();
            tokio::spawn(async move {
                let mut printer = Printer::new(total);
                while let Ok(event) = rx.recv().await {
                    let is_finished = matches!(event, Event::SequenceFinished { .. });
                    printer.handle(&event);
                    if is_finished {
                        break;
                    }
                }
            })
        });

        let (report, result) = taskforge_runtime::drive(
            graph,
            &plan,
            self.config.max_concurrency,
            self.tracer.clone(),
            events,
        )
        .await;

        self.last_report = Some(report.clone());
        if let Some(handle) = printer_handle {
            let _ = handle.await;
        }

        if taskforge_metrics::is_enabled() {
            taskforge_metrics::dump();
        }

        result.map(|_| report)
    }

    /// The artifact of a successfully completed task, or `None` if it
    /// never ran, is not yet finished, failed, or was skipped.
    pub fn artifact_of(&self, id: &str) -> Option<Artifact> {
        let graph = self.graph.as_ref()?;
        let index = graph.index_of(id)?;
        graph.node(index).artifact()
    }

    /// The summary of the most recent `run()` call, available even if that
    /// run ended in `SequenceError::SequenceAborted`.
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }
}
