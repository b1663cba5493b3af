//! Dependency graph construction, validation and analysis.
//!
//! ## Pipeline
//!
//! ```text
//! ProjectDefinition
//!        ↓  build::build_project()
//! Project (may hold duplicates / dangling refs)
//!        ↓  validate::validate(mode)
//! Validated { project, warnings }
//!        ↓  build::DependencyGraph::from_project()
//! DependencyGraph
//!        ↓  cycles::find_cycles_in()
//! Vec<Cycle>
//! ```

pub mod build;
pub mod cycles;
pub mod validate;

pub use build::{DependencyGraph, GraphEdge, GraphNode, build_project};
pub use cycles::{Cycle, find_cycles, find_cycles_in};
pub use validate::{Validated, check, validate};
