//! Referential-integrity checks.
//!
//! [`check`] runs every rule in one pass and returns the findings. Strict
//! and lenient mode share it; they differ only in what [`validate`] does
//! with a non-empty result.
//!
//! Rules:
//!
//! - application ids are unique;
//! - every dependency target names a declared application;
//! - no group is its own ancestor.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::error::{IntegrityError, Violation};
use crate::loader::ValidationMode;
use crate::model::{Application, Project};

/// A project that passed validation, plus any downgraded violations.
#[derive(Debug, Clone)]
pub struct Validated {
    pub project: Project,
    pub warnings: Vec<Violation>,
}

/// Collect every integrity violation of `project`.
#[must_use]
pub fn check(project: &Project) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut first_seen: HashMap<&str, &str> = HashMap::new();

    for app in project.applications() {
        if let Some(first_source) = first_seen.get(app.id.as_str()) {
            violations.push(Violation::DuplicateApplicationId {
                id: app.id.clone(),
                first_source: (*first_source).to_string(),
                duplicate_source: app.source.clone(),
            });
        } else {
            first_seen.insert(&app.id, &app.source);
        }

        for target in app.dependency_targets() {
            if !project.contains(target) {
                violations.push(Violation::UnresolvedDependency {
                    application: app.id.clone(),
                    target: target.to_string(),
                });
            }
        }
    }

    let groups = project.groups();
    for (idx, group) in groups.iter().enumerate() {
        if groups.is_own_ancestor(idx) {
            violations.push(Violation::GroupHierarchyCycle {
                group: group.path.clone(),
            });
        }
    }

    violations
}

/// Check `project` and surface violations according to `mode`.
///
/// Lenient mode repairs what it can: later duplicates of an id are dropped
/// and a group caught in a parent loop is re-attached to the root.
/// Unresolved targets stay as dangling references.
///
/// # Errors
///
/// In strict mode, returns every violation found.
#[instrument(skip(project), fields(applications = project.applications().len()))]
pub fn validate(project: Project, mode: ValidationMode) -> Result<Validated, IntegrityError> {
    let violations = check(&project);
    if violations.is_empty() {
        debug!("project is valid");
        return Ok(Validated {
            project,
            warnings: Vec::new(),
        });
    }

    match mode {
        ValidationMode::Strict => Err(IntegrityError { violations }),
        ValidationMode::Lenient => {
            debug!(count = violations.len(), "downgrading violations to warnings");
            Ok(Validated {
                project: repair(project),
                warnings: violations,
            })
        }
    }
}

fn repair(project: Project) -> Project {
    let (name, applications, mut groups, teams, subviews) = project.into_parts();

    let mut seen: HashSet<String> = HashSet::new();
    let applications: Vec<Application> = applications
        .into_iter()
        .filter(|app| seen.insert(app.id.clone()))
        .collect();

    for idx in 0..groups.len() {
        // Detaching one member breaks the loop for the others too.
        if groups.is_own_ancestor(idx) {
            groups.detach(idx);
        }
    }

    Project::new(name, applications, groups, teams, subviews)
}
