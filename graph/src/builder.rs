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

use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use crate::{descriptor::TaskDescriptor, error::GraphError, node::GraphNode, Graph};

/// Validates an ordered list of descriptors and materializes a `Graph`.
/// Accepts descriptors in any order: parents may be declared before or
/// after the children that reference them, as long as every referenced id
/// is present somewhere in the list.
pub fn build(descriptors: Vec<TaskDescriptor>) -> Result<Graph, GraphError> {
    let mut pet = petgraph::Graph::<GraphNode, ()>::new();
    let mut id_to_index: HashMap<String, NodeIndex> = HashMap::with_capacity(descriptors.len());

    for (insertion_order, descriptor) in descriptors.iter().enumerate() {
        let node = GraphNode::new(
            descriptor.id.clone(),
            descriptor.action.clone(),
            descriptor.retry_count,
            descriptor.retry_delay,
            descriptor.on_error,
            descriptor.priority,
            insertion_order,
        );
        let index = pet.add_node(node);
        if id_to_index.insert(descriptor.id.clone(), index).is_some() {
            return Err(GraphError::DuplicateTaskId(descriptor.id.clone()));
        }
    }

    for descriptor in &descriptors {
        let child_index = id_to_index[&descriptor.id];
        for parent_id in &descriptor.parents {
            let parent_index =
                id_to_index
                    .get(parent_id)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownDependency {
                        parent: parent_id.clone(),
                        child: descriptor.id.clone(),
                    })?;
            pet.add_edge(parent_index, child_index, ());
            pet[child_index].parents.push(parent_index);
            pet[parent_index].children.push(child_index);
        }
    }

    if petgraph::algo::toposort(&pet, None).is_err() {
        return Err(GraphError::CycleDetected);
    }

    Ok(Graph { pet, id_to_index })
}
