//! Ignore-rule backends
//!
//! The default backend drives the `git` binary. Each repository gets one
//! long-running `git check-ignore --stdin` process, started on the first
//! query and stopped when the handle is released, so a run costs one process
//! per repository rather than one per entry.

use crate::error::{Result, SelectError};
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// An opened repository rooted at a discovered directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    root: PathBuf,
}

impl RepositoryHandle {
    /// Create a handle for the repository whose work tree starts at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Work tree root of the repository
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path relative to the work tree, or `None` when outside of it
    pub fn relative<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        path.strip_prefix(&self.root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
    }
}

/// Source of ignore-rule decisions
///
/// Paths handed to the backend are absolute. Implementations decide how to
/// interpret the repository's rules; callers never parse them.
pub trait IgnoreBackend {
    /// Open the repository whose work tree is rooted at `dir`
    fn open_repository(&self, dir: &Path) -> Result<RepositoryHandle>;

    /// Whether `path` is ignored by the rules of `repo`
    fn path_is_ignored(&self, repo: &RepositoryHandle, path: &Path) -> Result<bool>;

    /// Release a handle once the run is over
    fn release(&self, _repo: RepositoryHandle) {}
}

/// Raw bytes of a path as git expects them on stdin
#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

/// A `git check-ignore --stdin` process answering queries for one repository
struct CheckIgnore {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl CheckIgnore {
    fn spawn(root: &Path) -> Result<Self> {
        // GIT_FLUSH makes git flush after every record instead of when the
        // pipe buffer fills up
        let mut child = Command::new("git")
            .args([
                "check-ignore",
                "--stdin",
                "-z",
                "--verbose",
                "--non-matching",
                "--no-index",
            ])
            .current_dir(root)
            .env("GIT_FLUSH", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SelectError::GitError(format!("Failed to run git check-ignore: {}", e)))?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| SelectError::GitError("git check-ignore has no stdout".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }

    /// Ask about one path relative to the repository root
    fn query(&mut self, rel: &Path) -> Result<bool> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SelectError::GitError("git check-ignore stdin closed".to_string()))?;

        let mut request = path_bytes(rel).into_owned();
        request.push(0);
        stdin.write_all(&request)?;
        stdin.flush()?;

        // Record: <source> NUL <line> NUL <pattern> NUL <path> NUL
        let mut fields: [Vec<u8>; 4] = Default::default();
        for field in fields.iter_mut() {
            self.stdout.read_until(0, field)?;
            if field.pop() != Some(0) {
                return Err(SelectError::GitError(format!(
                    "git check-ignore exited while checking '{}'",
                    rel.display()
                )));
            }
        }

        // Empty pattern: no rule matched. Leading '!': a negated rule matched last.
        let pattern = &fields[2];
        Ok(!pattern.is_empty() && pattern[0] != b'!')
    }
}

impl Drop for CheckIgnore {
    fn drop(&mut self) {
        // git exits once its stdin is closed
        drop(self.stdin.take());
        let _ = self.child.wait();
    }
}

/// Backend that asks the `git` command line tool
#[derive(Default)]
pub struct GitCli {
    sessions: RefCell<HashMap<PathBuf, CheckIgnore>>,
}

impl IgnoreBackend for GitCli {
    fn open_repository(&self, dir: &Path) -> Result<RepositoryHandle> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(dir)
            .output()
            .map_err(|e| SelectError::GitError(format!("Failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SelectError::GitError(format!(
                "git rev-parse failed in '{}': {}",
                dir.display(),
                stderr.trim()
            )));
        }

        // A broken metadata directory makes git fall back to an enclosing
        // repository, so the reported top level must be `dir` itself.
        let toplevel = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        let expected = fs::canonicalize(dir)?;
        let actual = fs::canonicalize(&toplevel).unwrap_or(toplevel);
        if actual != expected {
            return Err(SelectError::GitError(format!(
                "'{}' is not a repository root (git resolved '{}')",
                expected.display(),
                actual.display()
            )));
        }

        Ok(RepositoryHandle::new(expected))
    }

    fn path_is_ignored(&self, repo: &RepositoryHandle, path: &Path) -> Result<bool> {
        let Some(rel) = repo.relative(path) else {
            return Ok(false);
        };

        let mut sessions = self.sessions.borrow_mut();
        let session = match sessions.entry(repo.root().to_path_buf()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(CheckIgnore::spawn(repo.root())?),
        };

        let result = session.query(rel);
        if result.is_err() {
            // A broken process is replaced on the next query
            sessions.remove(repo.root());
        }
        result
    }

    fn release(&self, repo: RepositoryHandle) {
        self.sessions.borrow_mut().remove(repo.root());
    }
}
