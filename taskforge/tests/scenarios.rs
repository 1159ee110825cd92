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

//! End-to-end scenarios exercising `Sequence::run`, one per concrete
//! example from SPEC_FULL.md §8, plus the listed boundary behaviors.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use taskforge::{fn_action, value_action, ActionError, Artifact, Config, Event, OnError, SequenceError, Status, TaskDescriptor};

fn string_artifact(a: &Artifact) -> String {
    a.downcast_ref::<String>().unwrap().clone()
}

fn i64_artifact(a: &Artifact) -> i64 {
    *a.downcast_ref::<i64>().unwrap()
}

#[tokio::test]
async fn linear_chain_all_succeed() {
    let a = fn_action(|_inputs| Box::pin(async move { Ok(Arc::new("a".to_string()) as Artifact) }));
    let b = fn_action(|inputs| {
        Box::pin(async move {
            let prefix = string_artifact(&inputs[0]);
            Ok(Arc::new(format!("{prefix}b")) as Artifact)
        })
    });
    let c = fn_action(|inputs| {
        Box::pin(async move {
            let prefix = string_artifact(&inputs[0]);
            Ok(Arc::new(format!("{prefix}c")) as Artifact)
        })
    });

    let mut sequence = taskforge::Sequence::new(Config::default())
        .add_task(TaskDescriptor::new("A", a))
        .add_task(TaskDescriptor::new("B", b).parents(["A"]))
        .add_task(TaskDescriptor::new("C", c).parents(["B"]));

    let report = sequence.run().await.unwrap();
    assert!(report.ok);
    assert_eq!(string_artifact(&sequence.artifact_of("A").unwrap()), "a");
    assert_eq!(string_artifact(&sequence.artifact_of("B").unwrap()), "ab");
    assert_eq!(string_artifact(&sequence.artifact_of("C").unwrap()), "abc");

    let a_report = report.task("A").unwrap();
    let b_report = report.task("B").unwrap();
    let c_report = report.task("C").unwrap();
    assert!(a_report.metrics.unwrap().end_ms <= b_report.metrics.unwrap().start_ms);
    assert!(b_report.metrics.unwrap().end_ms <= c_report.metrics.unwrap().start_ms);
}

#[tokio::test]
async fn diamond_bounded_concurrency() {
    let a = fn_action(|_inputs| Box::pin(async move { Ok(Arc::new(1i64) as Artifact) }));
    let b = fn_action(|inputs| {
        Box::pin(async move { Ok(Arc::new(i64_artifact(&inputs[0]) + 1) as Artifact) })
    });
    let c = fn_action(|inputs| {
        Box::pin(async move { Ok(Arc::new(i64_artifact(&inputs[0]) * 10) as Artifact) })
    });
    let d = fn_action(|inputs| {
        Box::pin(async move { Ok(Arc::new(i64_artifact(&inputs[0]) + i64_artifact(&inputs[1])) as Artifact) })
    });

    let mut sequence = taskforge::Sequence::new(Config {
        max_concurrency: 2,
        verbose: false,
    })
    .add_task(TaskDescriptor::new("A", a))
    .add_task(TaskDescriptor::new("B", b).parents(["A"]))
    .add_task(TaskDescriptor::new("C", c).parents(["A"]))
    .add_task(TaskDescriptor::new("D", d).parents(["B", "C"]));

    let report = sequence.run().await.unwrap();
    assert!(report.ok);
    assert_eq!(i64_artifact(&sequence.artifact_of("A").unwrap()), 1);
    assert_eq!(i64_artifact(&sequence.artifact_of("B").unwrap()), 2);
    assert_eq!(i64_artifact(&sequence.artifact_of("C").unwrap()), 10);
    assert_eq!(i64_artifact(&sequence.artifact_of("D").unwrap()), 12);

    let b_end = report.task("B").unwrap().metrics.unwrap().end_ms;
    let c_end = report.task("C").unwrap().metrics.unwrap().end_ms;
    let d_start = report.task("D").unwrap().metrics.unwrap().start_ms;
    assert!(d_start >= b_end.max(c_end));
}

#[tokio::test]
async fn retry_then_succeed() {
    let attempts = Arc::new(AtomicU32::new(0));
    let action = {
        let attempts = attempts.clone();
        fn_action(move |_inputs| {
            let attempts = attempts.clone();
            Box::pin(async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ActionError::new("not ready"))
                } else {
                    Ok(Arc::new("ok".to_string()) as Artifact)
                }
            })
        })
    };

    let mut sequence = taskforge::Sequence::new(Config::default()).add_task(
        TaskDescriptor::new("T", action).retry(2, Duration::from_millis(1)),
    );

    let report = sequence.run().await.unwrap();
    assert!(report.ok);
    assert_eq!(string_artifact(&sequence.artifact_of("T").unwrap()), "ok");
    assert_eq!(report.task("T").unwrap().attempts, 3);
}

#[tokio::test]
async fn continue_on_error_sibling_is_skipped() {
    let failing = fn_action(|_inputs| Box::pin(async move { Err(ActionError::new("boom")) }));
    let b = value_action("b".to_string());
    let c = fn_action(|inputs| Box::pin(async move { Ok(inputs[0].clone()) }));

    let mut sequence = taskforge::Sequence::new(Config::default())
        .add_task(TaskDescriptor::new("A", failing).on_error(OnError::Continue))
        .add_task(TaskDescriptor::new("B", b))
        .add_task(TaskDescriptor::new("C", c).parents(["A"]));

    let report = sequence.run().await.unwrap();
    assert!(report.ok);
    assert_eq!(report.task("A").unwrap().status, Status::Failed);
    assert_eq!(report.task("B").unwrap().status, Status::Succeeded);
    assert_eq!(report.task("C").unwrap().status, Status::Skipped);
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn abort_on_error_halts_descendants() {
    let failing = fn_action(|_inputs| Box::pin(async move { Err(ActionError::new("boom")) }));
    let b = fn_action(|inputs| Box::pin(async move { Ok(inputs[0].clone()) }));
    let c = value_action("c".to_string());

    let mut sequence = taskforge::Sequence::new(Config::default())
        .add_task(TaskDescriptor::new("A", failing).on_error(OnError::Abort))
        .add_task(TaskDescriptor::new("B", b).parents(["A"]))
        .add_task(TaskDescriptor::new("C", c));

    let err = sequence.run().await.unwrap_err();
    assert_eq!(err, SequenceError::SequenceAborted { at: "A".to_string() });

    let report = sequence.last_report().unwrap();
    assert_eq!(report.task("A").unwrap().status, Status::Failed);
    assert!(!report.ok);
    assert_ne!(report.task("B").unwrap().status, Status::Succeeded);
}

#[tokio::test]
async fn priority_tie_break_among_roots_serial() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let make = |name: &'static str, order: Arc<std::sync::Mutex<Vec<String>>>| {
        fn_action(move |_inputs| {
            let order = order.clone();
            Box::pin(async move {
                order.lock().unwrap().push(name.to_string());
                Ok(Arc::new(()) as Artifact)
            })
        })
    };

    let mut sequence = taskforge::Sequence::new(Config {
        max_concurrency: 1,
        verbose: false,
    })
    .add_task(TaskDescriptor::new("A", make("A", order.clone())).priority(1))
    .add_task(TaskDescriptor::new("B", make("B", order.clone())).priority(5))
    .add_task(TaskDescriptor::new("C", make("C", order.clone())).priority(3));

    let report = sequence.run().await.unwrap();
    assert!(report.ok);
    assert_eq!(*order.lock().unwrap(), vec!["B", "C", "A"]);
}

#[tokio::test]
async fn empty_graph_resolves_immediately() {
    let mut sequence = taskforge::Sequence::new(Config::default());
    let report = sequence.run().await.unwrap();
    assert!(report.ok);
    assert!(report.tasks.is_empty());
}

#[tokio::test]
async fn single_failing_task_reports_failed() {
    let action = fn_action(|_inputs| Box::pin(async move { Err(ActionError::new("nope")) }));
    let mut sequence =
        taskforge::Sequence::new(Config::default()).add_task(TaskDescriptor::new("T", action));
    let report = sequence.run().await.unwrap();
    assert!(report.ok);
    assert_eq!(report.task("T").unwrap().status, Status::Failed);
    assert_eq!(report.task("T").unwrap().attempts, 1);
}

#[tokio::test]
async fn cycle_is_rejected_before_any_action_runs() {
    let ran = Arc::new(AtomicU32::new(0));
    let make = |ran: Arc<AtomicU32>| {
        fn_action(move |_inputs| {
            let ran = ran.clone();
            Box::pin(async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(()) as Artifact)
            })
        })
    };

    let mut sequence = taskforge::Sequence::new(Config::default())
        .add_task(TaskDescriptor::new("A", make(ran.clone())).parents(["B"]))
        .add_task(TaskDescriptor::new("B", make(ran.clone())).parents(["A"]));

    let err = sequence.run().await.unwrap_err();
    assert!(matches!(err, SequenceError::Graph(_)));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn retry_then_succeed_event_grammar() {
    let attempts = Arc::new(AtomicU32::new(0));
    let action = {
        let attempts = attempts.clone();
        fn_action(move |_inputs| {
            let attempts = attempts.clone();
            Box::pin(async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ActionError::new("not ready"))
                } else {
                    Ok(Arc::new("ok".to_string()) as Artifact)
                }
            })
        })
    };

    let mut sequence = taskforge::Sequence::new(Config::default()).add_task(
        TaskDescriptor::new("T", action).retry(2, Duration::from_millis(1)),
    );
    let mut rx = sequence.subscribe();

    let report = sequence.run().await.unwrap();
    assert!(report.ok);

    let mut task_events = Vec::new();
    loop {
        match rx.recv().await.unwrap() {
            Event::SequenceFinished { .. } => break,
            event @ (Event::TaskStarted { .. }
            | Event::TaskAttemptFailed { .. }
            | Event::TaskSucceeded { .. }
            | Event::TaskFailed { .. }) => task_events.push(event),
            Event::SequenceStarted { .. } => {}
        }
    }

    // SPEC_FULL.md §8: exactly one `task_started`, `attempts - 1`
    // `task_attempt_failed` when terminal is `succeeded`.
    let started = task_events
        .iter()
        .filter(|e| matches!(e, Event::TaskStarted { .. }))
        .count();
    let attempt_failed = task_events
        .iter()
        .filter(|e| matches!(e, Event::TaskAttemptFailed { .. }))
        .count();
    let succeeded = task_events
        .iter()
        .filter(|e| matches!(e, Event::TaskSucceeded { .. }))
        .count();
    assert_eq!(started, 1);
    assert_eq!(attempt_failed, 2);
    assert_eq!(succeeded, 1);

    // §5 ordering grammar: task_started precedes task_attempt_failed*
    // precedes the terminal event.
    assert!(matches!(task_events[0], Event::TaskStarted { .. }));
    assert!(matches!(task_events[1], Event::TaskAttemptFailed { .. }));
    assert!(matches!(task_events[2], Event::TaskAttemptFailed { .. }));
    assert!(matches!(task_events[3], Event::TaskSucceeded { .. }));
    assert!(task_events
        .windows(2)
        .all(|pair| pair[0].seq() < pair[1].seq()));
}
