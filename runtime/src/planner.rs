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

//! Priority-respecting topological sort plus longest-path level assignment,
//! the same shape as the teacher's rebuilder's dependency-ordering pass but
//! driven by a priority heap instead of a plain work-list, per §4.2.

use std::{cmp::Ordering, collections::BinaryHeap, collections::HashMap};

use petgraph::graph::NodeIndex;
use petgraph::Direction;
use taskforge_graph::{Graph, GraphError};

/// One node's slot in a priority-ordered ready queue: highest `priority`
/// first, ties broken by earliest `insertion_order`.
#[derive(Eq, PartialEq)]
struct ReadyItem {
    priority: i64,
    insertion_order: usize,
    index: NodeIndex,
}

impl Ord for ReadyItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.insertion_order.cmp(&self.insertion_order))
    }
}

impl PartialOrd for ReadyItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The planner's output: a priority-respecting topological order and the
/// nodes grouped by level (levels\[l\] holds every node at level `l`, already
/// in priority order).
pub struct Plan {
    pub order: Vec<NodeIndex>,
    pub levels: Vec<Vec<NodeIndex>>,
}

impl Plan {
    pub fn max_level(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }
}

/// Computes the plan, mutating `graph` in place to stamp each node's
/// `level`. Fails defensively with `GraphError::CycleDetected` if fewer
/// nodes come out than went in; the graph builder should already have
/// rejected cycles, so this only guards against a future bug.
pub fn plan(graph: &mut Graph) -> Result<Plan, GraphError> {
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::with_capacity(graph.node_count());
    let mut heap: BinaryHeap<ReadyItem> = BinaryHeap::new();

    for index in graph.indices() {
        let degree = graph
            .pet()
            .neighbors_directed(index, Direction::Incoming)
            .count();
        in_degree.insert(index, degree);
        if degree == 0 {
            let node = graph.node(index);
            heap.push(ReadyItem {
                priority: node.priority,
                insertion_order: node.insertion_order,
                index,
            });
        }
    }

    let mut order = Vec::with_capacity(graph.node_count());
    let mut node_level: HashMap<NodeIndex, usize> = HashMap::with_capacity(graph.node_count());

    while let Some(item) = heap.pop() {
        let index = item.index;
        let level = graph
            .node(index)
            .parents
            .iter()
            .map(|parent| node_level[parent] + 1)
            .max()
            .unwrap_or(0);
        node_level.insert(index, level);
        order.push(index);

        for child in graph
            .pet()
            .neighbors_directed(index, Direction::Outgoing)
            .collect::<Vec<_>>()
        {
            let degree = in_degree.get_mut(&child).expect("child was seen in first pass");
            *degree -= 1;
            if *degree == 0 {
                let child_node = graph.node(child);
                heap.push(ReadyItem {
                    priority: child_node.priority,
                    insertion_order: child_node.insertion_order,
                    index: child,
                });
            }
        }
    }

    if order.len() != graph.node_count() {
        return Err(GraphError::CycleDetected);
    }

    let max_level = node_level.values().copied().max().unwrap_or(0);
    let mut levels: Vec<Vec<NodeIndex>> = vec![Vec::new(); max_level + 1];
    for &index in &order {
        let level = node_level[&index];
        graph.set_level(index, level);
        levels[level].push(index);
    }
    if order.is_empty() {
        levels.clear();
    }

    Ok(Plan { order, levels })
}
