//! Group hierarchy keyed by slash-separated paths.
//!
//! Groups live in an arena ([`GroupTree`]) with parent indices. The root is
//! implicit: a group whose `parent` is `None` hangs directly off the root,
//! and applications without a group belong to the root itself.

use serde::Serialize;
use std::collections::HashMap;

/// Normalise a group path: trims whitespace and drops empty segments.
///
/// Returns `None` when nothing remains (the application lives at the root).
#[must_use]
pub fn normalize_path(raw: &str) -> Option<String> {
    let segments: Vec<&str> = raw
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// `true` if `path` equals `prefix` or lies below it.
#[must_use]
pub fn path_within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// One node of the group hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Full normalised path, e.g. `platform/payments`.
    pub path: String,
    /// Last path segment.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arena index of the parent group; `None` means the root.
    #[serde(skip)]
    pub parent: Option<usize>,
    /// Synthesised from an application path rather than declared.
    pub implicit: bool,
}

/// Arena of groups in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTree {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl GroupTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from pre-linked groups. Used when deriving filtered views.
    #[must_use]
    pub fn from_groups(groups: Vec<Group>) -> Self {
        let mut index = HashMap::with_capacity(groups.len());
        for (idx, group) in groups.iter().enumerate() {
            index.entry(group.path.clone()).or_insert(idx);
        }
        Self { groups, index }
    }

    /// Make sure every prefix of `path` exists, returning the index of the
    /// deepest group. Missing intermediate segments become implicit groups.
    pub fn ensure_path(&mut self, path: &str) -> Option<usize> {
        let normalized = normalize_path(path)?;
        let mut parent = None;
        let mut prefix = String::new();
        for segment in normalized.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            let idx = if let Some(&existing) = self.index.get(&prefix) {
                existing
            } else {
                let idx = self.groups.len();
                self.groups.push(Group {
                    path: prefix.clone(),
                    name: segment.to_string(),
                    title: None,
                    description: None,
                    parent,
                    implicit: true,
                });
                self.index.insert(prefix.clone(), idx);
                idx
            };
            parent = Some(idx);
        }
        parent
    }

    /// Mark a group as explicitly declared, filling in any missing metadata.
    pub fn declare(&mut self, path: &str, title: Option<String>, description: Option<String>) {
        if let Some(idx) = self.ensure_path(path) {
            let group = &mut self.groups[idx];
            group.implicit = false;
            if group.title.is_none() {
                group.title = title;
            }
            if group.description.is_none() {
                group.description = description;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Group> {
        self.groups.get(idx)
    }

    #[must_use]
    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    #[must_use]
    pub fn by_path(&self, path: &str) -> Option<&Group> {
        self.index_of(path).and_then(|idx| self.groups.get(idx))
    }

    /// Indices of the direct children of `parent` (`None` = root), in arena order.
    #[must_use]
    pub fn children(&self, parent: Option<usize>) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.parent == parent)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Walk parent links from `idx`. Returns `None` if the chain loops or
    /// points outside the arena.
    #[must_use]
    pub fn ancestors(&self, idx: usize) -> Option<Vec<usize>> {
        let mut chain = Vec::new();
        let mut cursor = self.groups.get(idx)?.parent;
        while let Some(parent) = cursor {
            if parent == idx || chain.len() > self.groups.len() {
                return None;
            }
            chain.push(parent);
            cursor = self.groups.get(parent)?.parent;
        }
        Some(chain)
    }

    /// `true` if following parent links from `idx` leads back to `idx`.
    #[must_use]
    pub fn is_own_ancestor(&self, idx: usize) -> bool {
        let mut cursor = self.groups.get(idx).and_then(|g| g.parent);
        for _ in 0..self.groups.len() {
            match cursor {
                Some(parent) if parent == idx => return true,
                Some(parent) => cursor = self.groups.get(parent).and_then(|g| g.parent),
                None => return false,
            }
        }
        false
    }

    /// Detach a group from its parent, re-hanging it off the root.
    pub(crate) fn detach(&mut self, idx: usize) {
        if let Some(group) = self.groups.get_mut(idx) {
            group.parent = None;
        }
    }
}
