pub mod analyze;
pub mod completions;
pub mod documentation;
pub mod graph;
pub mod list;
pub mod serve;
pub mod team_graph;
pub mod validate;

use std::path::PathBuf;

use archgraph_core::settings::Settings;
use archgraph_core::{LoadedProject, ProjectLoader, ValidationMode};

use crate::output::OutputMode;

/// Global flags and settings shared by every project command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Definition files; the first is the main one.
    pub config: Vec<PathBuf>,
    pub subview: Option<String>,
    pub validation: ValidationMode,
    pub output: OutputMode,
    pub settings: Settings,
}

impl Context {
    pub const fn loader(&self) -> ProjectLoader {
        ProjectLoader::new(self.validation)
    }

    /// Read, validate, and filter the project named by the global flags.
    pub fn load(&self) -> anyhow::Result<LoadedProject> {
        Ok(self.loader().load(&self.config, self.subview.as_deref())?)
    }
}
