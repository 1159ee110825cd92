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

//! The human-facing `verbose` progress line (SPEC_FULL.md §7): kept from
//! the teacher's `Printer` (a `console::Term` status line with a
//! `[finished/total]` counter) and generalized from "one line rewritten in
//! place" to "one line appended per lifecycle event", since a concurrent
//! DAG has many tasks in flight rather than the teacher's single running
//! command. Color coding and the `+Δs` offset are new, but draw on the same
//! `console::style` the teacher already depends on.

use std::io::Write;
use std::time::Instant;

use console::{style, Term};
use taskforge_runtime::Event;

pub(crate) struct Printer {
    term: Term,
    start: Instant,
    finished: usize,
    total: usize,
}

impl Printer {
    pub fn new(total: usize) -> Self {
        Printer {
            term: Term::stdout(),
            start: Instant::now(),
            finished: 0,
            total,
        }
    }

    fn timestamp(&self) -> String {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        format!("{now} +{:.3}s", self.start.elapsed().as_secs_f64())
    }

    fn write(&mut self, line: String) {
        if self.term.is_term() {
            let _ = self.term.write_line(&line);
        } else {
            let _ = writeln!(self.term, "{line}");
        }
    }

    pub fn handle(&mut self, event: &Event) {
        match event {
            Event::SequenceStarted { .. } => {
                let line = format!("{} {}", self.timestamp(), style("sequence started").cyan());
                self.write(line);
            }
            Event::SequenceFinished { ok, duration_ms, .. } => {
                let verdict = if *ok {
                    style("sequence finished").green()
                } else {
                    style("sequence aborted").red()
                };
                let line = format!("{} {} in {}ms", self.timestamp(), verdict, duration_ms);
                self.write(line);
            }
            Event::TaskStarted { id, attempt, .. } => {
                let line = format!(
                    "{} {} {} (attempt {})",
                    self.timestamp(),
                    style("start").cyan(),
                    id,
                    attempt + 1
                );
                self.write(line);
            }
            Event::TaskAttemptFailed {
                id,
                attempt,
                message,
                ..
            } => {
                let line = format!(
                    "{} {} {} attempt {} failed: {}",
                    self.timestamp(),
                    style("retry").yellow(),
                    id,
                    attempt + 1,
                    message
                );
                self.write(line);
            }
            Event::TaskSucceeded { id, duration_ms, .. } => {
                self.finished += 1;
                let line = format!(
                    "{} {} [{}/{}] {} ({}ms)",
                    self.timestamp(),
                    style("ok").green(),
                    self.finished,
                    self.total,
                    id,
                    duration_ms
                );
                self.write(line);
            }
            Event::TaskFailed { id, attempts, .. } => {
                self.finished += 1;
                let line = format!(
                    "{} {} [{}/{}] {} failed after {} attempt(s)",
                    self.timestamp(),
                    style("fail").red(),
                    self.finished,
                    self.total,
                    id,
                    attempts
                );
                self.write(line);
            }
        }
    }
}
