//! Optional TOML settings.
//!
//! Two files are consulted, both optional:
//!
//! - `archgraph.toml` next to the main definition file (project settings);
//! - `<config_dir>/archgraph/config.toml` (user settings).
//!
//! Project values win over user values; anything unset falls back to the
//! built-in default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fmt, fs};

use crate::error::{ArchError, Result};
use crate::grouping::GroupingKey;

pub const PROJECT_SETTINGS_FILE: &str = "archgraph.toml";

/// Graphviz `rankdir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RankDir {
    #[default]
    Lr,
    Rl,
    Tb,
    Bt,
}

impl fmt::Display for RankDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lr => "LR",
            Self::Rl => "RL",
            Self::Tb => "TB",
            Self::Bt => "BT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GroupingSection {
    #[serde(default)]
    pub key: Option<GroupingKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RenderSection {
    #[serde(default)]
    pub rankdir: Option<RankDir>,
    #[serde(default)]
    pub cluster_groups: Option<bool>,
}

/// Contents of one settings file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub grouping: GroupingSection,
    #[serde(default)]
    pub render: RenderSection,
}

/// Merged settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub grouping_key: GroupingKey,
    pub rankdir: RankDir,
    pub cluster_groups: bool,
    /// Preferred CLI output mode, if configured.
    pub output: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::merge(&SettingsFile::default(), &SettingsFile::default())
    }
}

impl Settings {
    /// Combine project and user files; project values win.
    #[must_use]
    pub fn merge(project: &SettingsFile, user: &SettingsFile) -> Self {
        Self {
            grouping_key: project
                .grouping
                .key
                .or(user.grouping.key)
                .unwrap_or_default(),
            rankdir: project
                .render
                .rankdir
                .or(user.render.rankdir)
                .unwrap_or_default(),
            cluster_groups: project
                .render
                .cluster_groups
                .or(user.render.cluster_groups)
                .unwrap_or(true),
            output: project.output.clone().or_else(|| user.output.clone()),
        }
    }
}

/// Read one settings file. A missing file yields defaults.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ArchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ArchError::parse(path.display().to_string(), e))
}

/// Project settings file for a main definition path.
#[must_use]
pub fn project_settings_path(definition: &Path) -> PathBuf {
    definition
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(PROJECT_SETTINGS_FILE)
}

/// User settings file, if the platform has a config directory.
#[must_use]
pub fn user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("archgraph/config.toml"))
}

/// Load and merge project and user settings for `definition`.
///
/// # Errors
///
/// Fails when either file exists but is malformed.
pub fn load_settings(definition: &Path) -> Result<Settings> {
    let project = load_settings_file(&project_settings_path(definition))?;
    let user = match user_settings_path() {
        Some(path) => load_settings_file(&path)?,
        None => SettingsFile::default(),
    };
    Ok(Settings::merge(&project, &user))
}
