//! Typed construction from the merged definition tree.
//!
//! # Overview
//!
//! [`build_project`] turns a [`ProjectDefinition`] into a [`Project`]:
//! group paths are normalised and every missing intermediate segment becomes
//! an implicit group, teams referenced only by applications become implicit
//! teams, and dependency references are split into target and interface.
//! Duplicate ids are kept exactly as declared so the validator can report
//! them.
//!
//! [`DependencyGraph`] is the petgraph view of a project used by the cycle
//! detector and the renderer.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A depends on B". One edge is added per declared
//! dependency, so parallel edges are kept.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::instrument;

use crate::definition::RawApplication;
use crate::loader::ProjectDefinition;
use crate::model::{Application, DependencyRef, GroupTree, Project, Team, normalize_path};

/// Convert the raw tree into typed entities. Deterministic for a given input.
#[instrument(skip(def), fields(project = %def.name))]
pub fn build_project(def: &ProjectDefinition) -> Project {
    let mut groups = GroupTree::new();
    for raw in &def.groups {
        groups.declare(&raw.path, raw.title.clone(), raw.description.clone());
    }

    let applications: Vec<Application> = def
        .applications
        .iter()
        .map(|raw| {
            let app = build_application(raw);
            if let Some(path) = &app.group {
                groups.ensure_path(path);
            }
            app
        })
        .collect();

    let mut teams: Vec<Team> = Vec::new();
    let mut team_names: HashSet<String> = HashSet::new();
    for raw in &def.teams {
        let name = raw.name.trim();
        if name.is_empty() || !team_names.insert(name.to_string()) {
            continue;
        }
        teams.push(Team {
            name: name.to_string(),
            description: raw.description.clone(),
            implicit: false,
        });
    }
    for team in applications.iter().filter_map(|a| a.team.as_deref()) {
        if team_names.insert(team.to_string()) {
            teams.push(Team {
                name: team.to_string(),
                description: None,
                implicit: true,
            });
        }
    }

    Project::new(
        def.name.clone(),
        applications,
        groups,
        teams,
        def.subviews.clone(),
    )
}

fn build_application(raw: &RawApplication) -> Application {
    let id = raw.id.trim().to_string();
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| id.clone(), str::to_string);

    Application {
        name,
        group: raw.group.as_deref().and_then(normalize_path),
        team: raw
            .team
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        summary: raw.summary.clone(),
        description: raw.description.clone(),
        technology: raw.technology.clone(),
        category: raw.category.clone(),
        status: raw.status,
        properties: raw.properties.clone(),
        display: raw.display.clone(),
        dependencies: raw
            .dependencies
            .iter()
            .map(|dep| DependencyRef::parse(dep.target(), dep.relation().map(str::to_string)))
            .collect(),
        source: raw.source.clone(),
        id,
    }
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Node payload: an application id, or the id of an undeclared target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    /// Target of a dangling reference; not an application of the project.
    pub ghost: bool,
}

/// Edge payload, copied from the [`DependencyRef`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphEdge {
    pub relation: Option<String>,
    pub interface: Option<String>,
}

/// Directed dependency graph of one project.
///
/// Application nodes are added first in declaration order, so for an
/// application node `NodeIndex::index()` equals its declaration position.
/// Ghost nodes follow.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub graph: DiGraph<GraphNode, GraphEdge>,
    pub node_map: HashMap<String, NodeIndex>,
    application_count: usize,
}

impl DependencyGraph {
    /// Build the graph. Later duplicates of an id share the first one's node.
    #[must_use]
    pub fn from_project(project: &Project) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

        for app in project.applications() {
            node_map.entry(app.id.clone()).or_insert_with(|| {
                graph.add_node(GraphNode {
                    id: app.id.clone(),
                    ghost: false,
                })
            });
        }
        let application_count = graph.node_count();

        for app in project.applications() {
            let from = node_map[&app.id];
            for dep in &app.dependencies {
                let to = *node_map.entry(dep.target.clone()).or_insert_with(|| {
                    graph.add_node(GraphNode {
                        id: dep.target.clone(),
                        ghost: true,
                    })
                });
                graph.add_edge(
                    from,
                    to,
                    GraphEdge {
                        relation: dep.relation.clone(),
                        interface: dep.interface.clone(),
                    },
                );
            }
        }

        Self {
            graph,
            node_map,
            application_count,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of non-ghost nodes.
    #[must_use]
    pub const fn application_count(&self) -> usize {
        self.application_count
    }

    /// Application nodes in declaration order.
    pub fn application_nodes(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.application_count).map(NodeIndex::new)
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(|n| n.id.as_str())
    }

    #[must_use]
    pub fn is_ghost(&self, idx: NodeIndex) -> bool {
        self.graph.node_weight(idx).is_some_and(|n| n.ghost)
    }

    /// Ids of all ghost nodes, in first-reference order.
    #[must_use]
    pub fn ghost_ids(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .skip(self.application_count)
            .filter_map(|idx| self.node_id(idx))
            .collect()
    }

    /// Outgoing edges of `idx` in declaration order (petgraph iterates them
    /// newest first).
    #[must_use]
    pub fn outgoing(&self, idx: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        self.sorted_edges(idx, Direction::Outgoing)
    }

    /// Incoming edges of `idx` in declaration order.
    #[must_use]
    pub fn incoming(&self, idx: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        self.sorted_edges(idx, Direction::Incoming)
    }

    /// Direct successors in declaration order; parallel edges repeat.
    #[must_use]
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.outgoing(idx).into_iter().map(|(_, n)| n).collect()
    }

    fn sorted_edges(&self, idx: NodeIndex, dir: Direction) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), other)
            })
            .collect();
        edges.sort_by_key(|(edge, _)| edge.index());
        edges
    }
}
