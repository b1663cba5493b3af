pub mod application;
pub mod group;
pub mod project;

pub use application::{Application, DependencyRef, DisplayHints, ParseStatusError, Status};
pub use group::{Group, GroupTree, normalize_path, path_within};
pub use project::{Project, Team};
