//! Per-run collection of opened repositories

use crate::git::backend::{IgnoreBackend, RepositoryHandle};
use crate::git::METADATA_DIR;
use std::path::Path;

/// Repositories discovered so far in one traversal
///
/// Handles are kept in discovery order and only ever added. They are released
/// through the backend when the registry is dropped at the end of the run.
pub struct IgnoreRegistry<'b> {
    backend: &'b dyn IgnoreBackend,
    repos: Vec<RepositoryHandle>,
}

impl<'b> IgnoreRegistry<'b> {
    pub fn new(backend: &'b dyn IgnoreBackend) -> Self {
        Self {
            backend,
            repos: Vec::new(),
        }
    }

    /// Open `dir` as a repository if it holds a metadata directory
    ///
    /// Returns true when a new handle was registered. Open failures are
    /// logged and leave the directory without ignore rules of its own.
    pub fn register_if_repository(&mut self, dir: &Path) -> bool {
        if !dir.join(METADATA_DIR).is_dir() {
            return false;
        }

        match self.backend.open_repository(dir) {
            Ok(handle) => {
                tracing::debug!(root = %handle.root().display(), "opened repository");
                self.repos.push(handle);
                true
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "error opening repository");
                false
            }
        }
    }

    /// Whether any registered repository ignores `path`
    ///
    /// Repositories are asked in discovery order and the first positive
    /// answer wins. A failed query counts as "not ignored" for that
    /// repository only.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.repos
            .iter()
            .any(|repo| match self.backend.path_is_ignored(repo, path) {
                Ok(ignored) => ignored,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "error checking ignore rules");
                    false
                }
            })
    }

    /// Registered repository handles, outermost first
    pub fn repositories(&self) -> &[RepositoryHandle] {
        &self.repos
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

impl Drop for IgnoreRegistry<'_> {
    fn drop(&mut self) {
        for repo in self.repos.drain(..) {
            self.backend.release(repo);
        }
    }
}
