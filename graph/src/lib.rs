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

//! DAG data model: validated construction of a task graph from a flat list
//! of descriptors, plus the per-node state each task mutates as it runs.
//! The runtime crate is the only consumer of the petgraph-level traversal
//! methods here; external callers only ever see ids, status, and artifacts.

mod builder;
mod descriptor;
mod error;
mod node;

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use taskforge_interface::Artifact;

pub use descriptor::{OnError, TaskDescriptor};
pub use error::GraphError;
pub use node::{GraphNode, NodeMetrics, Status};

/// A validated, acyclic task graph. Construct with [`build`].
pub struct Graph {
    pet: petgraph::Graph<GraphNode, ()>,
    id_to_index: HashMap<String, NodeIndex>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.pet.node_count()
    }

    pub fn node(&self, index: NodeIndex) -> &GraphNode {
        &self.pet[index]
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.pet.node_indices()
    }

    /// Gives the runtime crate direct access to petgraph's traversal and
    /// direction-aware neighbor methods. Not meant for use outside this
    /// workspace; callers outside `taskforge-runtime` should stick to
    /// `node`/`index_of`/`indices`.
    #[doc(hidden)]
    pub fn pet(&self) -> &petgraph::Graph<GraphNode, ()> {
        &self.pet
    }

    /// Records the planner's longest-path-from-root assignment on the node.
    /// Called once per node before execution starts; never touched again.
    #[doc(hidden)]
    pub fn set_level(&mut self, index: NodeIndex, level: usize) {
        self.pet[index].level = level;
    }

    /// Terminal transitions a node's mutable state. These wrap the
    /// crate-private `GraphNode` setters so the driver in `taskforge-runtime`
    /// can record outcomes without reaching into petgraph internals itself.
    #[doc(hidden)]
    pub fn finish_success(&self, index: NodeIndex, artifact: Artifact, metrics: NodeMetrics) {
        self.node(index).finish_success(artifact, metrics);
    }

    #[doc(hidden)]
    pub fn finish_failure(&self, index: NodeIndex, metrics: NodeMetrics) {
        self.node(index).finish_failure(metrics);
    }

    #[doc(hidden)]
    pub fn skip(&self, index: NodeIndex) {
        self.node(index).skip();
    }
}

/// Validates `descriptors` (no duplicate ids, no dangling dependency, no
/// cycle) and materializes a [`Graph`]. See [`GraphError`] for the ways
/// this can fail.
pub fn build(descriptors: Vec<TaskDescriptor>) -> Result<Graph, GraphError> {
    builder::build(descriptors)
}
