//! archgraph-core library.
//!
//! Loads declarative architecture definitions, validates them, and derives
//! analysis results and graph descriptions from the typed model.
//!
//! ```text
//! load_definitions ─► ProjectLoader::load_project ─► Project
//!                                                     ├─ graph::find_cycles
//!                                                     ├─ grouping::*
//!                                                     ├─ render::render_graph / render_team_graph
//!                                                     └─ docs::render_documentation
//! ```
//!
//! # Conventions
//!
//! - **Errors**: fallible operations return [`error::Result`]; every
//!   [`error::ArchError`] maps onto a stable [`error::ErrorCode`].
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod definition;
pub mod docs;
pub mod error;
pub mod graph;
pub mod grouping;
pub mod loader;
pub mod model;
pub mod render;
pub mod settings;
pub mod subview;

pub use error::{ArchError, ErrorCode, IntegrityError, RenderError, Result, Violation};
pub use loader::{
    LoadedProject, ProjectDefinition, ProjectLoader, ValidationMode, load_definitions,
};
pub use model::{Application, Project};
