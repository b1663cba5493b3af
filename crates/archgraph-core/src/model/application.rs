use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

/// Lifecycle status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Planned,
    Deprecated,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Planned => "planned",
            Self::Deprecated => "deprecated",
        }
    }

    #[must_use]
    pub const fn is_planned(self) -> bool {
        matches!(self, Self::Planned)
    }
}

/// Error returned when parsing a status value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    pub got: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status: '{}' (expected active, planned or deprecated)",
            self.got
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "planned" => Ok(Self::Planned),
            "deprecated" => Ok(Self::Deprecated),
            _ => Err(ParseStatusError { got: s.to_string() }),
        }
    }
}

/// Rendering hints attached to an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DisplayHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

impl DisplayHints {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.color.is_none() && self.border_color.is_none()
    }
}

/// A directed "depends on" edge from the declaring application to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRef {
    /// Id of the application depended upon.
    pub target: String,
    /// Interface of the target, when the reference was written `app.interface`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// Free-form relation label (e.g. `api`, `events`, `conformist`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl DependencyRef {
    /// Split a reference of the form `app` or `app.interface`.
    #[must_use]
    pub fn parse(reference: &str, relation: Option<String>) -> Self {
        let reference = reference.trim();
        let (target, interface) = match reference.split_once('.') {
            Some((app, iface)) if !iface.is_empty() => (app, Some(iface.to_string())),
            Some((app, _)) => (app, None),
            None => (reference, None),
        };
        Self {
            target: target.to_string(),
            interface,
            relation: relation.filter(|r| !r.trim().is_empty()),
        }
    }
}

/// A unit of the described architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    /// Display name; defaults to the id.
    pub name: String,
    /// Normalised group path (`platform/payments`), `None` for root-level apps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: Status,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "DisplayHints::is_empty")]
    pub display: DisplayHints,
    pub dependencies: Vec<DependencyRef>,
    /// Definition file the application was declared in.
    #[serde(skip)]
    pub source: String,
}

impl Application {
    /// Minimal application, used by builders and tests.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            group: None,
            team: None,
            summary: None,
            description: None,
            technology: None,
            category: None,
            status: Status::Active,
            properties: BTreeMap::new(),
            display: DisplayHints::default(),
            dependencies: Vec::new(),
            source: String::new(),
        }
    }

    /// Ids of every application this one depends on, in declaration order.
    pub fn dependency_targets(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.target.as_str())
    }

    #[must_use]
    pub fn depends_on(&self, target: &str) -> bool {
        self.dependency_targets().any(|t| t == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_json_roundtrips() {
        assert_eq!(serde_json::to_string(&Status::Planned).unwrap(), "\"planned\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"deprecated\"").unwrap(),
            Status::Deprecated
        );
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(" Planned ".parse::<Status>().unwrap(), Status::Planned);
        let err = "retired".parse::<Status>().unwrap_err();
        assert!(err.to_string().contains("retired"));
    }

    #[test]
    fn dependency_ref_splits_interface() {
        let dep = DependencyRef::parse("billing.invoiceApi", Some("api".to_string()));
        assert_eq!(dep.target, "billing");
        assert_eq!(dep.interface.as_deref(), Some("invoiceApi"));
        assert_eq!(dep.relation.as_deref(), Some("api"));

        let plain = DependencyRef::parse("billing", Some("  ".to_string()));
        assert_eq!(plain.target, "billing");
        assert!(plain.interface.is_none());
        assert!(plain.relation.is_none());
    }
}
