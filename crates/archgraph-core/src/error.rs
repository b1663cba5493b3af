//! Error catalogue for the load → validate → analyze → render pipeline.
//!
//! Every failure surfaced by `archgraph-core` is an [`ArchError`]. Each variant
//! maps onto a stable [`ErrorCode`] so the CLI and the HTTP service can emit
//! machine-readable codes next to the human message.

use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigReadFailed,
    ConfigParseError,
    IncludeCycle,
    UnknownSubView,
    DuplicateApplicationId,
    UnresolvedDependency,
    GroupHierarchyCycle,
    UnknownApplication,
    InvalidRenderOption,
    TemplateReadFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigReadFailed => "E1001",
            Self::ConfigParseError => "E1002",
            Self::IncludeCycle => "E1003",
            Self::UnknownSubView => "E1004",
            Self::DuplicateApplicationId => "E2001",
            Self::UnresolvedDependency => "E2002",
            Self::GroupHierarchyCycle => "E2003",
            Self::UnknownApplication => "E3001",
            Self::InvalidRenderOption => "E3002",
            Self::TemplateReadFailed => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigReadFailed => Some("Check the --config path and file permissions."),
            Self::ConfigParseError => Some("Fix the syntax or missing field in the definition and retry."),
            Self::IncludeCycle => Some("Remove the include that points back to an including file."),
            Self::UnknownSubView => Some("Use one of the subview names declared under `subviews`."),
            Self::DuplicateApplicationId => {
                Some("Rename one of the applications, or pass --skip-validation to keep the first.")
            }
            Self::UnresolvedDependency => {
                Some("Declare the target application, or pass --skip-validation to keep going.")
            }
            Self::GroupHierarchyCycle => Some("Re-declare the groups so no group is its own ancestor."),
            Self::UnknownApplication => Some("Run `archgraph list` to see valid application ids."),
            Self::InvalidRenderOption => Some("Adjust the graph options and retry."),
            Self::TemplateReadFailed => Some("Check the --template-path value."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Integrity violations
// ---------------------------------------------------------------------------

/// One referential-integrity finding produced by the validator.
///
/// In strict mode any violation aborts the load; in lenient mode the same
/// values are returned as warnings next to a best-effort project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Two applications share an id. The first declaration wins in lenient mode.
    DuplicateApplicationId {
        id: String,
        first_source: String,
        duplicate_source: String,
    },
    /// A dependency points at an application id that is not declared.
    UnresolvedDependency { application: String, target: String },
    /// A group is (transitively) its own parent.
    GroupHierarchyCycle { group: String },
}

impl Violation {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateApplicationId { .. } => ErrorCode::DuplicateApplicationId,
            Self::UnresolvedDependency { .. } => ErrorCode::UnresolvedDependency,
            Self::GroupHierarchyCycle { .. } => ErrorCode::GroupHierarchyCycle,
        }
    }

    /// The id of the entity the violation is about.
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::DuplicateApplicationId { id, .. } => id,
            Self::UnresolvedDependency { application, .. } => application,
            Self::GroupHierarchyCycle { group } => group,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateApplicationId {
                id,
                first_source,
                duplicate_source,
            } => write!(
                f,
                "application id '{id}' declared twice ({first_source} and {duplicate_source})"
            ),
            Self::UnresolvedDependency {
                application,
                target,
            } => write!(
                f,
                "application '{application}' depends on unknown application '{target}'"
            ),
            Self::GroupHierarchyCycle { group } => {
                write!(f, "group '{group}' is its own ancestor")
            }
        }
    }
}

/// Strict-mode failure carrying every violation found in the validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityError {
    pub violations: Vec<Violation>,
}

impl IntegrityError {
    /// The first violation, which names the offending entity in the message.
    #[must_use]
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.as_slice() {
            [] => write!(f, "referential integrity violated"),
            [only] => write!(f, "referential integrity violated: {only}"),
            [first, rest @ ..] => write!(
                f,
                "referential integrity violated: {first} (and {} more)",
                rest.len()
            ),
        }
    }
}

impl std::error::Error for IntegrityError {}

// ---------------------------------------------------------------------------
// Render errors
// ---------------------------------------------------------------------------

/// Failure of a single render step. Prior load/validate results stay valid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The application filter names an id that is not in the project.
    #[error("application '{id}' not found in project")]
    UnknownApplication { id: String },

    /// The option combination excludes the very node that was asked for.
    #[error("invalid rendering option: {reason}")]
    InvalidOption { reason: String },
}

// ---------------------------------------------------------------------------
// ArchError
// ---------------------------------------------------------------------------

/// Top-level error type of the core pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// A definition or settings file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Syntax error, unknown key, or missing required field.
    #[error("failed to parse {source_name}: {message}")]
    ConfigParse { source_name: String, message: String },

    /// A definition file includes itself, directly or transitively.
    #[error("include cycle: {} is already being loaded", .path.display())]
    IncludeCycle { path: PathBuf },

    /// The requested subview name is not declared.
    #[error("unknown subview '{name}' (declared: {})", .available.join(", "))]
    UnknownSubView { name: String, available: Vec<String> },

    /// Strict-mode integrity failure.
    #[error(transparent)]
    ReferentialIntegrity(#[from] IntegrityError),

    /// Render-step failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A documentation template could not be read.
    #[error("failed to read template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchError {
    pub(crate) fn parse(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ConfigParse {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Stable error code for this failure.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::ConfigReadFailed,
            Self::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Self::IncludeCycle { .. } => ErrorCode::IncludeCycle,
            Self::UnknownSubView { .. } => ErrorCode::UnknownSubView,
            Self::ReferentialIntegrity(err) => err
                .first()
                .map_or(ErrorCode::InternalUnexpected, Violation::error_code),
            Self::Render(RenderError::UnknownApplication { .. }) => ErrorCode::UnknownApplication,
            Self::Render(RenderError::InvalidOption { .. }) => ErrorCode::InvalidRenderOption,
            Self::Template { .. } => ErrorCode::TemplateReadFailed,
        }
    }

    /// Remediation hint for operators, falling back to a generic retry hint.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code()
            .hint()
            .unwrap_or("Retry the command.")
            .to_string()
    }
}

/// Result alias used across the core crate.
pub type Result<T, E = ArchError> = std::result::Result<T, E>;
