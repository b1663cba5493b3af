//! Proptest strategies shared by the property tests.

#![allow(dead_code)]

use archgraph_core::definition::{RawApplication, RawDependency};
use archgraph_core::graph::build_project;
use archgraph_core::model::{DisplayHints, Project, Status};
use archgraph_core::ProjectDefinition;
use proptest::prelude::*;
use std::collections::BTreeMap;

pub const GROUPS: &[&str] = &["", "shop", "shop/checkout", "shop/search", "platform", "platform/infra/db"];
pub const TEAMS: &[&str] = &["", "orders", "discovery", "infra"];

pub fn app_id(idx: usize) -> String {
    format!("app{idx}")
}

pub fn raw_app(idx: usize, group: &str, team: &str, status: Status, deps: Vec<String>) -> RawApplication {
    RawApplication {
        id: app_id(idx),
        name: None,
        group: (!group.is_empty()).then(|| group.to_string()),
        team: (!team.is_empty()).then(|| team.to_string()),
        summary: None,
        description: None,
        technology: None,
        category: None,
        status,
        properties: BTreeMap::new(),
        display: DisplayHints::default(),
        dependencies: deps.into_iter().map(RawDependency::Target).collect(),
        source: "generated.yml".to_string(),
    }
}

pub fn project_from(apps: Vec<RawApplication>) -> Project {
    build_project(&ProjectDefinition {
        name: "generated".to_string(),
        applications: apps,
        ..ProjectDefinition::default()
    })
}

pub fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        3 => Just(Status::Active),
        1 => Just(Status::Planned),
        1 => Just(Status::Deprecated),
    ]
}

/// Up to `max` applications with arbitrary dependencies, including
/// self-loops, cycles and dangling targets.
pub fn arb_project(max: usize) -> impl Strategy<Value = Project> {
    (1..=max)
        .prop_flat_map(|n| {
            prop::collection::vec(
                (
                    0..GROUPS.len(),
                    0..TEAMS.len(),
                    arb_status(),
                    prop::collection::vec(0..n + 2, 0..4),
                ),
                n,
            )
        })
        .prop_map(|specs| {
            let apps = specs
                .into_iter()
                .enumerate()
                .map(|(idx, (group, team, status, deps))| {
                    // Indices past the end become dangling targets.
                    raw_app(idx, GROUPS[group], TEAMS[team], status, deps.into_iter().map(app_id).collect())
                })
                .collect();
            project_from(apps)
        })
}

/// Applications whose dependencies only point to earlier declarations.
pub fn arb_dag(max: usize) -> impl Strategy<Value = Project> {
    (1..=max)
        .prop_flat_map(|n| prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), n))
        .prop_map(|deps| {
            let apps = deps
                .into_iter()
                .enumerate()
                .map(|(idx, picks)| {
                    let targets = if idx == 0 {
                        Vec::new()
                    } else {
                        picks.into_iter().map(|p| app_id(p.index(idx))).collect()
                    };
                    raw_app(idx, "", "", Status::Active, targets)
                })
                .collect();
            project_from(apps)
        })
}
