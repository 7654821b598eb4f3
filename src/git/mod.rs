//! Git integration for ignore-rule filtering
//!
//! Every repository found during a traversal is opened once and kept in an
//! [`IgnoreRegistry`] for the rest of the run. The registry answers whether a
//! path is ignored by any of them; the rules themselves are evaluated by git.

mod backend;
mod registry;

pub use backend::{GitCli, IgnoreBackend, RepositoryHandle};
pub use registry::IgnoreRegistry;

/// Name of the repository metadata directory
pub const METADATA_DIR: &str = ".git";
