//! Raw, untyped definition tree as read from YAML or JSON fragments.
//!
//! These types mirror the file format one-to-one. Nothing here is
//! validated beyond what serde enforces (required keys, unknown keys,
//! value shapes); typed construction happens in [`crate::graph::build`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ArchError, Result};
use crate::model::{DisplayHints, Status};
use crate::subview::SubView;

/// Serialization format of a definition fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from the file extension. Anything but `.json` is YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// `true` for extensions picked up by directory includes.
    #[must_use]
    pub fn is_definition_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                ["yml", "yaml", "json"]
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }
}

/// One dependency entry: either `- billing` or `- {target: billing, relation: api}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDependency {
    Target(String),
    Detailed(RawDependencyDetail),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDependencyDetail {
    pub target: String,
    #[serde(default)]
    pub relation: Option<String>,
}

impl RawDependency {
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Target(target) | Self::Detailed(RawDependencyDetail { target, .. }) => target,
        }
    }

    #[must_use]
    pub fn relation(&self) -> Option<&str> {
        match self {
            Self::Target(_) => None,
            Self::Detailed(detail) => detail.relation.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawApplication {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub display: DisplayHints,
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
    /// Fragment the entry was read from; filled in by the loader.
    #[serde(skip)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawGroup {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawTeam {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single definition fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub applications: Vec<RawApplication>,
    #[serde(default)]
    pub groups: Vec<RawGroup>,
    #[serde(default)]
    pub teams: Vec<RawTeam>,
    #[serde(default)]
    pub subviews: Vec<SubView>,
}

impl RawDefinition {
    /// Parse one fragment. `source_name` is used in error messages and is
    /// stamped onto every application.
    ///
    /// # Errors
    ///
    /// Returns [`ArchError::ConfigParse`] on syntax errors, unknown keys, or
    /// missing required fields.
    pub fn parse(text: &str, format: Format, source_name: &str) -> Result<Self> {
        let mut def: Self = match format {
            Format::Json => {
                serde_json::from_str(text).map_err(|e| ArchError::parse(source_name, e))?
            }
            // An empty YAML document is an empty fragment, not an error.
            Format::Yaml if text.trim().is_empty() => Self::default(),
            Format::Yaml => {
                serde_yaml::from_str(text).map_err(|e| ArchError::parse(source_name, e))?
            }
        };
        for app in &mut def.applications {
            app.source = source_name.to_string();
        }
        Ok(def)
    }
}
