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

use taskforge_graph::GraphError;
use thiserror::Error;

/// The error taxonomy of §7: build-time failures from the graph crate,
/// promoted into the same enum that the driver itself raises.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequenceError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A task whose descriptor set `onError = abort` exhausted its retries.
    /// Carries the id of the task that triggered the halt; tasks already
    /// in flight at the same level complete and are reported via `RunReport`
    /// before this error is returned.
    #[error("sequence aborted at task '{at}'")]
    SequenceAborted { at: String },
}
