//! Graph descriptions in Graphviz DOT.
//!
//! Three modes share one set of conventions:
//!
//! - whole system: every application, clustered by group;
//! - neighborhood: one application plus its direct predecessors and
//!   successors, selected by [`RenderOptions::application`];
//! - team relations: one node per team, see [`render_team_graph`].
//!
//! `hide_planned` drops planned applications and every edge touching them
//! in all modes. Rendering only reads the project.

pub mod dot;

use std::path::{Path, PathBuf};

use crate::model::Application;
use crate::settings::{RankDir, Settings};

pub use dot::{escape, render_graph, render_team_graph};

/// Options for the whole-system and neighborhood modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Restrict output to this application's neighborhood.
    pub application: Option<String>,
    pub hide_planned: bool,
    pub rankdir: RankDir,
    /// Wrap applications in one `subgraph cluster_*` per group.
    pub cluster_groups: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            application: None,
            hide_planned: false,
            rankdir: RankDir::default(),
            cluster_groups: true,
        }
    }
}

impl RenderOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            rankdir: settings.rankdir,
            cluster_groups: settings.cluster_groups,
            ..Self::default()
        }
    }
}

/// Options for the team-relation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamRenderOptions {
    /// Collapse parallel team-to-team edges into one, labelled with a count.
    pub summarize_relations: bool,
    pub hide_planned: bool,
    pub rankdir: RankDir,
}

/// Resolves an icon image for an application.
pub trait IconLookup {
    fn icon_for(&self, app: &Application) -> Option<PathBuf>;
}

/// Never returns an icon.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIcons;

impl IconLookup for NoIcons {
    fn icon_for(&self, _app: &Application) -> Option<PathBuf> {
        None
    }
}

/// Looks up `<root>/<technology>.png`.
#[derive(Debug, Clone)]
pub struct IconDirectory {
    root: PathBuf,
}

impl IconDirectory {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl IconLookup for IconDirectory {
    fn icon_for(&self, app: &Application) -> Option<PathBuf> {
        let technology = app.technology.as_deref()?.trim();
        if technology.is_empty() || technology.contains(['/', '\\']) {
            return None;
        }
        let path = self.root.join(format!("{}.png", technology.to_ascii_lowercase()));
        path.is_file().then_some(path)
    }
}
