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

//! Everything needed to execute a validated `taskforge_graph::Graph`: the
//! priority-aware planner, the bounded-concurrency driver, the per-task
//! retry loop, and the observation surface (structured events plus
//! `tracing` mirroring) they publish through. The top-level `taskforge`
//! crate wraps this in the `Sequence` programmatic surface.

mod driver;
mod error;
mod events;
mod planner;
mod report;
mod runner;

pub use driver::drive;
pub use error::SequenceError;
pub use events::{Event, EventBus};
pub use planner::{plan, Plan};
pub use report::{RunReport, TaskReport};
pub use runner::TaskOutcome;
