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

//! The per-task attempt loop (§4.4): invoke `action`, retry with delay on
//! failure, record metrics, mirror everything through the `Tracer` and the
//! event bus. One call to `run_task` is the entire lifetime of one node's
//! single permitted concurrent invocation of its action.

use std::time::Instant;

use taskforge_graph::{GraphNode, NodeMetrics};
use taskforge_interface::{Artifact, Tracer};
use taskforge_metrics::scoped_metric;

use crate::events::{Event, EventBus};

pub enum TaskOutcome {
    Succeeded { artifact: Artifact, metrics: NodeMetrics },
    Failed { metrics: NodeMetrics, message: String },
}

fn elapsed_ms(since: Instant) -> u64 {
    Instant::now().duration_since(since).as_millis() as u64
}

/// Runs `node`'s action to completion (success or retries-exhausted
/// failure), against artifacts already gathered from its parents in
/// parent-declaration order. `sequence_start` is the reference instant
/// every `*_ms` timestamp in metrics and events is relative to.
pub async fn run_task(
    node: &GraphNode,
    inputs: Vec<Artifact>,
    tracer: &dyn Tracer,
    events: &EventBus,
    sequence_start: Instant,
) -> TaskOutcome {
    scoped_metric!("taskforge_runtime::run_task");
    let span = tracer.span_open(&node.id);
    let start_ms = elapsed_ms(sequence_start);

    events.publish(|seq| Event::TaskStarted {
        seq,
        id: node.id.clone(),
        attempt: 0,
        at_ms: start_ms,
    });

    let outcome = loop {
        let attempt = node.attempts();
        node.record_attempt();

        match node.action().call(inputs.clone()).await {
            Ok(artifact) => {
                let metrics = NodeMetrics {
                    start_ms,
                    end_ms: elapsed_ms(sequence_start),
                };
                tracer.span_close_ok(span);
                events.publish(|seq| Event::TaskSucceeded {
                    seq,
                    id: node.id.clone(),
                    at_ms: metrics.end_ms,
                    duration_ms: metrics.duration_ms(),
                });
                break TaskOutcome::Succeeded { artifact, metrics };
            }
            Err(error) => {
                tracer.span_event(span, &format!("attempt {attempt} failed: {error}"));
                events.publish(|seq| Event::TaskAttemptFailed {
                    seq,
                    id: node.id.clone(),
                    attempt,
                    message: error.message.clone(),
                });

                if attempt < node.retry_count {
                    if !node.retry_delay.is_zero() {
                        tokio::time::sleep(node.retry_delay).await;
                    }
                    continue;
                }

                let metrics = NodeMetrics {
                    start_ms,
                    end_ms: elapsed_ms(sequence_start),
                };
                tracer.span_close_err(span, &error.message);
                events.publish(|seq| Event::TaskFailed {
                    seq,
                    id: node.id.clone(),
                    at_ms: metrics.end_ms,
                    attempts: node.attempts(),
                });
                break TaskOutcome::Failed {
                    metrics,
                    message: error.message,
                };
            }
        }
    };

    outcome
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use taskforge_graph::{OnError, TaskDescriptor};
    use taskforge_interface::{fn_action, value_action, NullTracer};

    fn node_from(descriptor: TaskDescriptor) -> taskforge_graph::Graph {
        taskforge_graph::build(vec![descriptor]).unwrap()
    }

    #[tokio::test]
    async fn succeeding_action_records_metrics_and_artifact() {
        let graph = node_from(TaskDescriptor::new("t", value_action(7i64)));
        let idx = graph.index_of("t").unwrap();
        let node = graph.node(idx);
        let bus = EventBus::new();
        let outcome = run_task(node, vec![], &NullTracer, &bus, Instant::now()).await;
        match outcome {
            TaskOutcome::Succeeded { artifact, metrics } => {
                assert_eq!(*artifact.downcast_ref::<i64>().unwrap(), 7);
                assert!(metrics.end_ms >= metrics.start_ms);
            }
            TaskOutcome::Failed { .. } => panic!("expected success"),
        }
        assert_eq!(node.attempts(), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let counter = std::sync::atomic::AtomicU32::new(0);
        let action = fn_action(move |_inputs| {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async move {
                if n < 2 {
                    Err(taskforge_interface::ActionError::new("not yet"))
                } else {
                    Ok(Arc::new("ok".to_string()) as Artifact)
                }
            })
        });
        let descriptor = TaskDescriptor::new("t", action).retry(2, std::time::Duration::from_millis(1));
        let graph = node_from(descriptor);
        let idx = graph.index_of("t").unwrap();
        let node = graph.node(idx);
        let bus = EventBus::new();
        let outcome = run_task(node, vec![], &NullTracer, &bus, Instant::now()).await;
        assert!(matches!(outcome, TaskOutcome::Succeeded { .. }));
        assert_eq!(node.attempts(), 3);
    }

    #[tokio::test]
    async fn exhausts_retries_and_fails() {
        let action = fn_action(|_inputs| {
            Box::pin(async move { Err(taskforge_interface::ActionError::new("boom")) })
        });
        let descriptor = TaskDescriptor::new("t", action)
            .on_error(OnError::Continue)
            .retry(1, std::time::Duration::from_millis(0));
        let graph = node_from(descriptor);
        let idx = graph.index_of("t").unwrap();
        let node = graph.node(idx);
        let bus = EventBus::new();
        let outcome = run_task(node, vec![], &NullTracer, &bus, Instant::now()).await;
        match outcome {
            TaskOutcome::Failed { message, .. } => assert_eq!(message, "boom"),
            TaskOutcome::Succeeded { .. } => panic!("expected failure"),
        }
        assert_eq!(node.attempts(), 2);
    }
}
