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

//! The execution driver (§4.5): walks the planner's levels, launches each
//! level's nodes concurrently under the semaphore, gathers parent
//! artifacts, and honors each task's `onError` policy. A simple barrier
//! between levels is the whole of the dependency contract; within a level,
//! nodes are mutually independent by construction.

use std::sync::Arc;
use std::time::Instant;

use taskforge_graph::{Graph, OnError};
use taskforge_interface::{Artifact, Tracer};
use tokio::sync::Semaphore;

use crate::error::SequenceError;
use crate::events::{Event, EventBus};
use crate::planner::Plan;
use crate::report::RunReport;
use crate::runner::{run_task, TaskOutcome};

fn elapsed_ms(since: Instant) -> u64 {
    Instant::now().duration_since(since).as_millis() as u64
}

/// Returns the artifacts of `node`'s parents in parent-declaration order,
/// or `None` if any parent did not succeed — in which case the driver
/// marks `node` skipped rather than invoking its action (see the Open
/// Question decision in DESIGN.md: skip, not a null-artifact run).
fn gather_parent_artifacts(graph: &Graph, node: &taskforge_graph::GraphNode) -> Option<Vec<Artifact>> {
    let mut artifacts = Vec::with_capacity(node.parents.len());
    for &parent_index in &node.parents {
        artifacts.push(graph.node(parent_index).artifact()?);
    }
    Some(artifacts)
}

/// Runs `graph` to completion against the pre-computed `plan`, bounded to
/// `max_concurrency` simultaneous actions. Always returns a `RunReport`
/// reflecting every node's terminal status reached so far; the `Result`
/// half reports whether the run completed cleanly or was cut short by an
/// `onError = abort` task (SPEC_FULL.md's graceful-shutdown visibility
/// hook: callers are never left without a report just because of an abort).
/// Opens one `Tracer` span covering the whole call, the root each per-task
/// span in `run_task` nests under in a trace tree.
pub async fn drive(
    graph: Arc<Graph>,
    plan: &Plan,
    max_concurrency: usize,
    tracer: Arc<dyn Tracer>,
    events: Arc<EventBus>,
) -> (RunReport, Result<(), SequenceError>) {
    let sequence_start = Instant::now();
    let sequence_span = tracer.span_open("sequence");
    events.publish(|seq| Event::SequenceStarted { seq, at_ms: 0 });

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut abort_at: Option<String> = None;

    'levels: for level_nodes in &plan.levels {
        let mut handles = Vec::with_capacity(level_nodes.len());

        for &index in level_nodes {
            let node = graph.node(index);
            match gather_parent_artifacts(&graph, node) {
                Some(parent_artifacts) => {
                    let permit = semaphore
                        .clone()
                        .acquire_owned()
                        .await
                        .expect("semaphore is never closed while a run is in progress");
                    let graph = graph.clone();
                    let tracer = tracer.clone();
                    let events = events.clone();
                    handles.push(tokio::spawn(async move {
                        let _permit = permit;
                        let node = graph.node(index);
                        let outcome =
                            run_task(node, parent_artifacts, tracer.as_ref(), &events, sequence_start)
                                .await;
                        (index, outcome)
                    }));
                }
                None => graph.skip(index),
            }
        }

        for result in futures::future::join_all(handles).await {
            let (index, outcome) = result.expect("task runner panicked");
            match outcome {
                TaskOutcome::Succeeded { artifact, metrics } => {
                    graph.finish_success(index, artifact, metrics);
                }
                TaskOutcome::Failed { metrics, .. } => {
                    graph.finish_failure(index, metrics);
                    let node = graph.node(index);
                    if node.on_error == OnError::Abort {
                        abort_at.get_or_insert_with(|| node.id.clone());
                    }
                }
            }
        }

        if abort_at.is_some() {
            break 'levels;
        }
    }

    let ok = abort_at.is_none();
    let duration_ms = elapsed_ms(sequence_start);
    events.publish(|seq| Event::SequenceFinished {
        seq,
        ok,
        at_ms: duration_ms,
        duration_ms,
    });

    let report = RunReport::collect(&graph, ok, duration_ms);
    let result = match abort_at {
        Some(at) => {
            tracer.span_close_err(sequence_span, &format!("aborted at task '{at}'"));
            Err(SequenceError::SequenceAborted { at })
        }
        None => {
            tracer.span_close_ok(sequence_span);
            Ok(())
        }
    };
    (report, result)
}
