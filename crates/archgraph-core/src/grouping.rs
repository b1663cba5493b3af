//! Presentational views derived from a project.
//!
//! - [`applications_by_group`]: the group hierarchy with each level listing
//!   the applications it owns directly. Every application appears once.
//! - [`grouped_dependencies`]: one application's dependencies bucketed by
//!   the target's group (or by relation label). Buckets are exhaustive and
//!   non-overlapping.
//!
//! Neither view touches the project.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::model::{Application, Project};

// ---------------------------------------------------------------------------
// Applications by group
// ---------------------------------------------------------------------------

/// One level of the applications-by-group tree. The root has an empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ids of directly owned applications, in declaration order.
    pub applications: Vec<String>,
    pub groups: Vec<GroupNode>,
}

impl GroupNode {
    /// Ids of every application at or below this node.
    #[must_use]
    pub fn all_applications(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.applications.iter().map(String::as_str).collect();
        for child in &self.groups {
            out.extend(child.all_applications());
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty() && self.groups.iter().all(Self::is_empty)
    }
}

/// Build the tree mirroring the group hierarchy of `project`.
///
/// Applications whose group is unknown to the tree land at the root so the
/// partition property holds even for hand-built projects.
#[must_use]
pub fn applications_by_group(project: &Project) -> GroupNode {
    let groups = project.groups();
    let mut owned: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut root_apps = Vec::new();

    for app in project.applications() {
        match app.group.as_deref().and_then(|p| groups.index_of(p)) {
            Some(idx) => owned.entry(idx).or_default().push(app.id.clone()),
            None => root_apps.push(app.id.clone()),
        }
    }

    let mut visited = HashSet::new();
    GroupNode {
        name: project.name.clone(),
        path: String::new(),
        title: None,
        applications: root_apps,
        groups: groups
            .children(None)
            .into_iter()
            .filter_map(|idx| subtree(project, idx, &mut owned, &mut visited))
            .collect(),
    }
}

fn subtree(
    project: &Project,
    idx: usize,
    owned: &mut BTreeMap<usize, Vec<String>>,
    visited: &mut HashSet<usize>,
) -> Option<GroupNode> {
    if !visited.insert(idx) {
        return None;
    }
    let group = project.groups().get(idx)?;
    let children = project
        .groups()
        .children(Some(idx))
        .into_iter()
        .filter_map(|child| subtree(project, child, owned, visited))
        .collect();
    Some(GroupNode {
        name: group.name.clone(),
        path: group.path.clone(),
        title: group.title.clone(),
        applications: owned.remove(&idx).unwrap_or_default(),
        groups: children,
    })
}

// ---------------------------------------------------------------------------
// Grouped dependencies
// ---------------------------------------------------------------------------

/// What dependency buckets are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingKey {
    /// The target application's group path.
    #[default]
    Group,
    /// The dependency's relation label.
    Relation,
}

impl fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("group"),
            Self::Relation => f.write_str("relation"),
        }
    }
}

/// One dependency inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedDependency {
    pub target: String,
    /// Display name of the target; the id for dangling targets.
    pub target_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyBucket {
    /// Group path or relation label. Empty for the root group / no label.
    pub key: String,
    /// Targets not declared in the project.
    pub dangling: bool,
    pub dependencies: Vec<GroupedDependency>,
}

/// Partition the direct dependencies of `app` into buckets.
#[must_use]
pub fn grouped_dependencies(
    project: &Project,
    app: &Application,
    key: GroupingKey,
) -> Vec<DependencyBucket> {
    let mut buckets: BTreeMap<(bool, String), Vec<GroupedDependency>> = BTreeMap::new();

    for dep in &app.dependencies {
        let target = project.application(&dep.target);
        let dangling = target.is_none();
        let bucket_key = match (key, target) {
            (GroupingKey::Group, Some(target)) => target.group.clone().unwrap_or_default(),
            (GroupingKey::Group, None) => String::new(),
            (GroupingKey::Relation, _) => dep.relation.clone().unwrap_or_default(),
        };
        buckets
            .entry((dangling, bucket_key))
            .or_default()
            .push(GroupedDependency {
                target: dep.target.clone(),
                target_name: target.map_or_else(|| dep.target.clone(), |t| t.name.clone()),
                interface: dep.interface.clone(),
                relation: dep.relation.clone(),
            });
    }

    let mut out: Vec<DependencyBucket> = buckets
        .into_iter()
        .map(|((dangling, key), mut dependencies)| {
            dependencies.sort_by(|a, b| {
                a.target_name
                    .cmp(&b.target_name)
                    .then_with(|| a.target.cmp(&b.target))
            });
            DependencyBucket {
                key,
                dangling,
                dependencies,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        let first = |bucket: &DependencyBucket| {
            bucket
                .dependencies
                .first()
                .map(|d| d.target_name.clone())
                .unwrap_or_default()
        };
        first(a)
            .cmp(&first(b))
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.dangling.cmp(&b.dangling))
    });
    out
}
