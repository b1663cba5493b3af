//! Dependency cycle detection.
//!
//! # Overview
//!
//! A cycle among applications means none of them can be deployed, tested,
//! or reasoned about in isolation. Finding cycles is an analysis result,
//! never a load failure.
//!
//! # Algorithm
//!
//! Iterative depth-first search with three colours (unvisited, in progress,
//! finished). Following an edge into an in-progress node closes a cycle,
//! which is the slice of the active path from that node to the current one.
//! The search restarts from every unvisited application in declaration
//! order so disjoint cycles are all found. O(V+E).
//!
//! Each cycle is rotated to start at its earliest-declared member and
//! rotations are deduplicated. The same node set walked in the opposite
//! direction is a different cycle. Ghost nodes have no outgoing edges and
//! never take part.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashSet;
use std::fmt;

use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::debug;

use super::build::DependencyGraph;
use crate::model::Project;

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// A closed dependency loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Member ids in edge order, starting at the earliest-declared member.
    /// The first id is not repeated at the end.
    pub members: Vec<String>,
}

impl Cycle {
    /// Number of distinct applications in the loop.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// An application that depends on itself.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.members.len() == 1
    }

    /// Two applications depending on each other.
    #[must_use]
    pub fn is_mutual(&self) -> bool {
        self.members.len() == 2
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.members.first() else {
            return Ok(());
        };
        for member in &self.members {
            write!(f, "{member} → ")?;
        }
        write!(f, "{first}")
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    cursor: usize,
}

impl Frame {
    fn new(graph: &DependencyGraph, node: NodeIndex) -> Self {
        Self {
            node,
            successors: graph.successors(node),
            cursor: 0,
        }
    }
}

/// Find dependency cycles of a project. Empty when the graph is a DAG.
#[must_use]
pub fn find_cycles(project: &Project) -> Vec<Cycle> {
    find_cycles_in(&DependencyGraph::from_project(project))
}

/// Find cycles in an already built [`DependencyGraph`].
#[must_use]
pub fn find_cycles_in(graph: &DependencyGraph) -> Vec<Cycle> {
    let mut color = vec![Color::White; graph.node_count()];
    let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
    let mut cycles = Vec::new();

    for start in graph.application_nodes() {
        if color[start.index()] != Color::White {
            continue;
        }
        color[start.index()] = Color::Gray;
        let mut stack = vec![Frame::new(graph, start)];

        while let Some(frame) = stack.last_mut() {
            let Some(&next) = frame.successors.get(frame.cursor) else {
                color[frame.node.index()] = Color::Black;
                stack.pop();
                continue;
            };
            frame.cursor += 1;

            match color[next.index()] {
                Color::White => {
                    color[next.index()] = Color::Gray;
                    stack.push(Frame::new(graph, next));
                }
                Color::Gray => {
                    let Some(pos) = stack.iter().position(|f| f.node == next) else {
                        continue;
                    };
                    let path = canonical_rotation(stack[pos..].iter().map(|f| f.node).collect());
                    if seen.insert(path.clone()) {
                        cycles.push(Cycle {
                            members: path
                                .iter()
                                .filter_map(|&n| graph.node_id(n).map(str::to_string))
                                .collect(),
                        });
                    }
                }
                Color::Black => {}
            }
        }
    }

    debug!(count = cycles.len(), "cycle detection finished");
    cycles
}

/// Rotate so the smallest node index (earliest declaration) comes first.
fn canonical_rotation(mut path: Vec<NodeIndex>) -> Vec<NodeIndex> {
    if let Some(min_pos) = path
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| n.index())
        .map(|(i, _)| i)
    {
        path.rotate_left(min_pos);
    }
    path
}
