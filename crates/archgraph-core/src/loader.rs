//! Definition loading and the load → build → validate → filter pipeline.
//!
//! [`load_definitions`] reads a main file plus everything it includes into a
//! single merged [`ProjectDefinition`]. [`ProjectLoader`] turns that merged
//! tree into a validated, optionally subview-filtered [`Project`]. The
//! definition is immutable, so one can be shared and loaded repeatedly.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::definition::{Format, RawApplication, RawDefinition, RawGroup, RawTeam};
use crate::error::{ArchError, Result, Violation};
use crate::graph::{build_project, validate};
use crate::model::Project;
use crate::subview::SubView;

/// All fragments of one project merged in inclusion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDefinition {
    pub name: String,
    pub applications: Vec<RawApplication>,
    pub groups: Vec<RawGroup>,
    pub teams: Vec<RawTeam>,
    pub subviews: Vec<SubView>,
    /// Every file read, in merge order.
    pub fragments: Vec<PathBuf>,
    /// BLAKE3 hex digest over fragment paths and contents.
    pub fingerprint: String,
}

impl ProjectDefinition {
    /// Merge already-parsed fragments. The first fragment that sets `name`
    /// names the project.
    ///
    /// # Errors
    ///
    /// Fails when no fragment sets `name` or two subviews share a name.
    pub fn merge(fragments: Vec<(String, RawDefinition)>) -> Result<Self> {
        let first_source = fragments
            .first()
            .map_or_else(|| "<empty>".to_string(), |(source, _)| source.clone());

        let mut name: Option<String> = None;
        let mut merged = Self::default();
        let mut subview_names: HashSet<String> = HashSet::new();

        for (source, def) in fragments {
            if name.is_none() {
                name = def.name.filter(|n| !n.trim().is_empty());
            }
            merged.applications.extend(def.applications);
            merged.groups.extend(def.groups);
            merged.teams.extend(def.teams);
            for view in def.subviews {
                if !subview_names.insert(view.name.clone()) {
                    return Err(ArchError::parse(
                        source,
                        format!("subview '{}' is declared more than once", view.name),
                    ));
                }
                merged.subviews.push(view);
            }
        }

        merged.name =
            name.ok_or_else(|| ArchError::parse(first_source, "missing required field `name`"))?;
        Ok(merged)
    }

    /// Declared subview names, in declaration order.
    #[must_use]
    pub fn subview_names(&self) -> Vec<String> {
        self.subviews.iter().map(|v| v.name.clone()).collect()
    }

    /// Resolve a subview name into its predicate.
    ///
    /// # Errors
    ///
    /// Returns [`ArchError::UnknownSubView`] when `name` is not declared.
    pub fn resolve_subview(&self, name: &str) -> Result<&SubView> {
        self.subviews
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| ArchError::UnknownSubView {
                name: name.to_string(),
                available: self.subview_names(),
            })
    }

    /// Entity tag for a view of this definition. `documents` are extra names
    /// served alongside the view; any change to them changes the tag.
    #[must_use]
    pub fn etag(&self, subview: Option<&str>, documents: &[String]) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.fingerprint.as_bytes());
        hasher.update(b"\0");
        hasher.update(subview.unwrap_or_default().as_bytes());
        for name in documents {
            hasher.update(b"\0");
            hasher.update(name.as_bytes());
        }
        format!("\"{}\"", &hasher.finalize().to_hex()[..16])
    }
}

/// Read `paths` (each with its includes) into one merged definition.
///
/// Later paths are treated as extra fragments after the first. A file
/// reached twice through different include chains is read once.
///
/// # Errors
///
/// I/O failures, parse failures, include cycles, a missing project name, or
/// duplicate subview names.
pub fn load_definitions(paths: &[PathBuf]) -> Result<ProjectDefinition> {
    let mut reader = FragmentReader::default();
    for path in paths {
        reader.read(path)?;
    }

    let fingerprint = reader.hasher.finalize().to_hex().to_string();
    let fragment_paths: Vec<PathBuf> = reader.fragments.iter().map(|(p, _)| p.clone()).collect();
    let mut def = ProjectDefinition::merge(
        reader
            .fragments
            .into_iter()
            .map(|(path, def)| (path.display().to_string(), def))
            .collect(),
    )?;
    def.fragments = fragment_paths;
    def.fingerprint = fingerprint;

    info!(
        project = %def.name,
        fragments = def.fragments.len(),
        applications = def.applications.len(),
        "loaded definition"
    );
    Ok(def)
}

#[derive(Default)]
struct FragmentReader {
    fragments: Vec<(PathBuf, RawDefinition)>,
    // Files currently being expanded; hitting one again is a cycle.
    active: Vec<PathBuf>,
    loaded: HashSet<PathBuf>,
    hasher: blake3::Hasher,
}

impl FragmentReader {
    fn read(&mut self, path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path).map_err(|source| ArchError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if self.active.contains(&canonical) {
            return Err(ArchError::IncludeCycle { path: canonical });
        }
        if !self.loaded.insert(canonical.clone()) {
            debug!(path = %canonical.display(), "fragment already loaded, skipping");
            return Ok(());
        }

        let text = fs::read_to_string(&canonical).map_err(|source| ArchError::Io {
            path: canonical.clone(),
            source,
        })?;
        self.hasher.update(canonical.to_string_lossy().as_bytes());
        self.hasher.update(b"\0");
        self.hasher.update(text.as_bytes());

        let source_name = path.display().to_string();
        let def = RawDefinition::parse(&text, Format::from_path(&canonical), &source_name)?;
        debug!(
            path = %source_name,
            applications = def.applications.len(),
            includes = def.include.len(),
            "parsed fragment"
        );

        let includes = def.include.clone();
        self.fragments.push((path.to_path_buf(), def));

        let base = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        self.active.push(canonical);
        for include in includes {
            let target = base.join(&include);
            if target.is_dir() {
                for file in definition_files_in(&target)? {
                    self.read(&file)?;
                }
            } else {
                self.read(&target)?;
            }
        }
        self.active.pop();
        Ok(())
    }
}

fn definition_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| ArchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ArchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && Format::is_definition_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// ProjectLoader
// ---------------------------------------------------------------------------

/// How integrity violations are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Any violation fails the load.
    #[default]
    Strict,
    /// Violations become warnings next to a repaired project.
    Lenient,
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub project: Project,
    /// Violations downgraded in lenient mode. Always empty in strict mode.
    pub warnings: Vec<Violation>,
    /// Name of the subview the project was filtered by.
    pub subview: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectLoader {
    mode: ValidationMode,
}

impl ProjectLoader {
    #[must_use]
    pub const fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn strict() -> Self {
        Self::new(ValidationMode::Strict)
    }

    #[must_use]
    pub const fn lenient() -> Self {
        Self::new(ValidationMode::Lenient)
    }

    #[must_use]
    pub const fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Build, validate, and optionally filter a project from `def`.
    ///
    /// The subview is resolved first so an unknown name fails before any
    /// integrity work is done.
    ///
    /// # Errors
    ///
    /// [`ArchError::UnknownSubView`] for an undeclared subview, and
    /// [`ArchError::ReferentialIntegrity`] for violations in strict mode.
    pub fn load_project(
        &self,
        def: &ProjectDefinition,
        subview: Option<&str>,
    ) -> Result<LoadedProject> {
        let view = subview.map(|name| def.resolve_subview(name)).transpose()?;

        let project = build_project(def);
        let validated = validate(project, self.mode)?;
        for violation in &validated.warnings {
            warn!(code = %violation.error_code(), "{violation}");
        }

        let project = match view {
            Some(view) => {
                let filtered = validated.project.filtered(view);
                debug!(
                    subview = %view.name,
                    kept = filtered.applications().len(),
                    total = validated.project.applications().len(),
                    "applied subview"
                );
                filtered
            }
            None => validated.project,
        };

        Ok(LoadedProject {
            project,
            warnings: validated.warnings,
            subview: view.map(|v| v.name.clone()),
        })
    }

    /// Read `paths` and load the project in one step.
    ///
    /// # Errors
    ///
    /// Any error of [`load_definitions`] or [`Self::load_project`].
    pub fn load(&self, paths: &[PathBuf], subview: Option<&str>) -> Result<LoadedProject> {
        let def = load_definitions(paths)?;
        self.load_project(&def, subview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn includes_are_merged_in_order() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.yml",
            "name: shop\ninclude: [extra.yml, more]\napplications:\n  - id: a\n",
        );
        write(dir.path(), "extra.yml", "applications:\n  - id: b\n");
        write(dir.path(), "more/2.json", r#"{"applications": [{"id": "d"}]}"#);
        write(dir.path(), "more/1.yaml", "applications:\n  - id: c\n");
        write(dir.path(), "more/notes.txt", "ignored");

        let def = load_definitions(&[main]).unwrap();
        let ids: Vec<&str> = def.applications.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(def.fragments.len(), 4);
        assert_eq!(def.fingerprint.len(), 64);
    }

    #[test]
    fn include_cycle_is_rejected() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "a.yml", "name: loop\ninclude: [b.yml]\n");
        write(dir.path(), "b.yml", "include: [a.yml]\n");

        let err = load_definitions(&[main]).unwrap_err();
        assert!(matches!(err, ArchError::IncludeCycle { .. }), "err: {err}");
    }

    #[test]
    fn diamond_include_reads_file_once() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.yml", "name: d\ninclude: [l.yml, r.yml]\n");
        write(dir.path(), "l.yml", "include: [shared.yml]\n");
        write(dir.path(), "r.yml", "include: [shared.yml]\n");
        write(dir.path(), "shared.yml", "applications:\n  - id: s\n");

        let def = load_definitions(&[main]).unwrap();
        assert_eq!(def.applications.len(), 1);
    }

    #[test]
    fn missing_name_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.yml", "applications: []\n");
        let err = load_definitions(&[main]).unwrap_err();
        assert!(err.to_string().contains("name"), "err: {err}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_definitions(&[PathBuf::from("/nonexistent/arch.yml")]).unwrap_err();
        assert!(matches!(err, ArchError::Io { .. }));
    }

    #[test]
    fn duplicate_subview_is_parse_error() {
        let frags = vec![
            (
                "a.yml".to_string(),
                RawDefinition {
                    name: Some("p".to_string()),
                    subviews: vec![SubView::named("v")],
                    ..RawDefinition::default()
                },
            ),
            (
                "b.yml".to_string(),
                RawDefinition {
                    subviews: vec![SubView::named("v")],
                    ..RawDefinition::default()
                },
            ),
        ];
        let err = ProjectDefinition::merge(frags).unwrap_err();
        assert!(err.to_string().contains("b.yml"));
    }

    #[test]
    fn unknown_subview_fails_before_validation() {
        let def = ProjectDefinition {
            name: "p".to_string(),
            subviews: vec![SubView::named("known")],
            ..ProjectDefinition::default()
        };
        let err = ProjectLoader::strict()
            .load_project(&def, Some("nope"))
            .unwrap_err();
        assert!(matches!(err, ArchError::UnknownSubView { .. }));
    }

    #[test]
    fn etag_varies_with_subview() {
        let def = ProjectDefinition {
            fingerprint: "abc".to_string(),
            ..ProjectDefinition::default()
        };
        assert_ne!(def.etag(None, &[]), def.etag(Some("v"), &[]));
        assert_eq!(def.etag(Some("v"), &[]), def.etag(Some("v"), &[]));
    }

    #[test]
    fn etag_varies_with_documents() {
        let def = ProjectDefinition {
            fingerprint: "abc".to_string(),
            ..ProjectDefinition::default()
        };
        let one = vec!["a.md".to_string()];
        let two = vec!["a.md".to_string(), "b.md".to_string()];
        assert_ne!(def.etag(None, &[]), def.etag(None, &one));
        assert_ne!(def.etag(None, &one), def.etag(None, &two));
    }
}
