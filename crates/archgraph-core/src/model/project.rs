//! The root aggregate.
//!
//! A [`Project`] owns every application, group, and team of one loaded
//! definition. It is built once per invocation and never mutated afterward;
//! filtered views are new projects.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::application::Application;
use super::group::{Group, GroupTree};
use crate::subview::SubView;

/// An organisational owner of applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Referenced by an application but never declared under `teams`.
    pub implicit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    applications: Vec<Application>,
    groups: GroupTree,
    teams: Vec<Team>,
    subviews: Vec<SubView>,
    // id -> index of the first application declared with that id.
    index: HashMap<String, usize>,
}

impl Project {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        applications: Vec<Application>,
        groups: GroupTree,
        teams: Vec<Team>,
        subviews: Vec<SubView>,
    ) -> Self {
        let mut index = HashMap::with_capacity(applications.len());
        for (idx, app) in applications.iter().enumerate() {
            index.entry(app.id.clone()).or_insert(idx);
        }
        Self {
            name: name.into(),
            applications,
            groups,
            teams,
            subviews,
            index,
        }
    }

    /// Applications in declaration order.
    #[must_use]
    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    /// Look up an application by id. With duplicate ids the first one wins.
    #[must_use]
    pub fn application(&self, id: &str) -> Option<&Application> {
        self.index.get(id).map(|&idx| &self.applications[idx])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub const fn groups(&self) -> &GroupTree {
        &self.groups
    }

    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    #[must_use]
    pub fn subviews(&self) -> &[SubView] {
        &self.subviews
    }

    /// Declared subview names, in declaration order.
    #[must_use]
    pub fn subview_names(&self) -> Vec<String> {
        self.subviews.iter().map(|v| v.name.clone()).collect()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Application>, GroupTree, Vec<Team>, Vec<SubView>) {
        (
            self.name,
            self.applications,
            self.groups,
            self.teams,
            self.subviews,
        )
    }

    /// Derive the project restricted to applications matching `view`.
    ///
    /// Groups are pruned to those that (transitively) hold a kept
    /// application, teams to those owning one. Dependencies are copied as
    /// declared, so targets outside the view become dangling references.
    #[must_use]
    pub fn filtered(&self, view: &SubView) -> Self {
        let applications: Vec<Application> = self
            .applications
            .iter()
            .filter(|app| view.matches(app))
            .cloned()
            .collect();

        let mut keep_groups: HashSet<usize> = HashSet::new();
        for app in &applications {
            let Some(idx) = app.group.as_deref().and_then(|p| self.groups.index_of(p)) else {
                continue;
            };
            keep_groups.insert(idx);
            if let Some(chain) = self.groups.ancestors(idx) {
                keep_groups.extend(chain);
            }
        }

        let mut remap: HashMap<usize, usize> = HashMap::new();
        let mut kept: Vec<Group> = Vec::new();
        for (old, group) in self.groups.iter().enumerate() {
            if keep_groups.contains(&old) {
                remap.insert(old, kept.len());
                kept.push(group.clone());
            }
        }
        for group in &mut kept {
            group.parent = group.parent.and_then(|p| remap.get(&p).copied());
        }

        let owners: HashSet<&str> = applications
            .iter()
            .filter_map(|app| app.team.as_deref())
            .collect();
        let teams = self
            .teams
            .iter()
            .filter(|t| owners.contains(t.name.as_str()))
            .cloned()
            .collect();

        Self::new(
            self.name.clone(),
            applications,
            GroupTree::from_groups(kept),
            teams,
            self.subviews.clone(),
        )
    }
}
