//! Selection engine
//!
//! Walks the tree depth-first from the root, visiting each directory before
//! its children. Per entry it applies, in order: ignore rules of every
//! repository found so far, the directory pruning test or the binary check,
//! and finally the exact pattern match.

use crate::core::pattern::PatternSet;
use crate::core::signature;
use crate::error::{Result, SelectError};
use crate::git::{GitCli, IgnoreBackend, IgnoreRegistry, METADATA_DIR};
use serde::Serialize;
use std::fs::{self, ReadDir};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Options for one selection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Bypass repository ignore rules entirely
    pub skip_ignore_rules: bool,
}

/// Counters collected during a run, for diagnostics only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    /// Entries skipped because a repository ignores them
    pub ignored: usize,
    /// Files discarded by the binary check
    pub binary: usize,
    /// Directories not descended into
    pub pruned_directories: usize,
    /// Repositories registered during the walk
    pub repositories: usize,
}

/// Result of a selection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected paths relative to the root, in discovery order
    pub files: Vec<PathBuf>,
    pub stats: SelectionStats,
}

/// Select files under `root` using the `git` binary for ignore rules
pub fn select(root: &Path, patterns: &PatternSet, options: SelectOptions) -> Result<Selection> {
    let backend = GitCli::default();
    select_with_backend(root, patterns, options, &backend)
}

/// Select files under `root`, asking `backend` about ignore rules
///
/// Only a root that cannot be opened fails the run. Every other problem is
/// logged and confined to the entry it concerns.
pub fn select_with_backend(
    root: &Path,
    patterns: &PatternSet,
    options: SelectOptions,
    backend: &dyn IgnoreBackend,
) -> Result<Selection> {
    let root_not_found = |e: std::io::Error| SelectError::RootNotFound {
        path: root.display().to_string(),
        reason: e.to_string(),
    };
    let abs_root = fs::canonicalize(root).map_err(root_not_found)?;
    let entries = fs::read_dir(&abs_root).map_err(root_not_found)?;

    let mut walker = Walker {
        patterns,
        options,
        registry: IgnoreRegistry::new(backend),
        selection: Selection::default(),
    };
    walker.visit(&abs_root, Path::new(""), entries);
    Ok(walker.finish())
}

/// Join a directory's relative path and an entry name with `/`
///
/// Names are kept as raw OS strings so that selected paths always exist on
/// disk, whatever their encoding.
fn candidate_path(dir_rel: &Path, name: &OsStr) -> PathBuf {
    if dir_rel.as_os_str().is_empty() {
        return PathBuf::from(name);
    }
    let mut rel = dir_rel.as_os_str().to_owned();
    rel.push("/");
    rel.push(name);
    PathBuf::from(rel)
}

/// Per-run traversal state
struct Walker<'a> {
    patterns: &'a PatternSet,
    options: SelectOptions,
    registry: IgnoreRegistry<'a>,
    selection: Selection,
}

impl Walker<'_> {
    /// Process one directory; `dir_rel` is empty for the root
    fn visit(&mut self, dir_abs: &Path, dir_rel: &Path, entries: ReadDir) {
        if !self.options.skip_ignore_rules {
            self.registry.register_if_repository(dir_abs);
        }

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(dir = %dir_abs.display(), error = %e, "error reading directory entry");
                    continue;
                }
            };

            let name = entry.file_name();
            let rel = candidate_path(dir_rel, &name);
            let abs = entry.path();

            if !self.options.skip_ignore_rules && self.registry.is_ignored(&abs) {
                self.selection.stats.ignored += 1;
                tracing::debug!(path = %rel.display(), "skipping ignored entry");
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %rel.display(), error = %e, "unable to read entry type");
                    continue;
                }
            };

            // Symlinks are neither followed nor selected
            if file_type.is_dir() {
                self.visit_subdir(&abs, &rel, &name);
            } else if file_type.is_file() {
                self.consider_file(&abs, rel);
            }
        }
    }

    fn visit_subdir(&mut self, abs: &Path, rel: &Path, name: &OsStr) {
        if name == "." || name == ".." || name == METADATA_DIR {
            return;
        }

        if !self.patterns.should_descend(rel) {
            self.selection.stats.pruned_directories += 1;
            tracing::debug!(path = %rel.display(), "skipping directory");
            return;
        }

        match fs::read_dir(abs) {
            Ok(entries) => self.visit(abs, rel, entries),
            Err(e) => {
                tracing::warn!(path = %rel.display(), error = %e, "unable to open directory");
            }
        }
    }

    fn consider_file(&mut self, abs: &Path, rel: PathBuf) {
        if signature::is_binary(abs) {
            self.selection.stats.binary += 1;
            return;
        }

        if let Some(pattern) = self.patterns.matching(&rel) {
            tracing::debug!(path = %rel.display(), pattern = pattern.as_str(), "selecting file");
            self.selection.files.push(rel);
        }
    }

    fn finish(self) -> Selection {
        let Walker {
            registry,
            mut selection,
            ..
        } = self;
        selection.stats.repositories = registry.len();
        drop(registry);

        if selection.files.is_empty() && selection.stats.ignored > 0 {
            tracing::info!(
                ignored = selection.stats.ignored,
                "no files selected but some entries were ignored; use -a to bypass ignore rules"
            );
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::RepositoryHandle;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const PNG: &[u8] = b"\x89PNG\r\n\x1A\n\0\0\0\rIHDR";

    /// Backend whose rules are ignored path prefixes per repository root
    #[derive(Default)]
    struct PrefixRules {
        rules: HashMap<PathBuf, Vec<&'static str>>,
    }

    impl PrefixRules {
        fn with(mut self, root: &Path, ignored: &[&'static str]) -> Self {
            self.rules
                .insert(fs::canonicalize(root).unwrap(), ignored.to_vec());
            self
        }
    }

    impl IgnoreBackend for PrefixRules {
        fn open_repository(&self, dir: &Path) -> Result<RepositoryHandle> {
            Ok(RepositoryHandle::new(dir))
        }

        fn path_is_ignored(&self, repo: &RepositoryHandle, path: &Path) -> Result<bool> {
            let Some(rel) = repo.relative(path) else {
                return Ok(false);
            };
            Ok(self
                .rules
                .get(repo.root())
                .is_some_and(|prefixes| prefixes.iter().any(|p| rel.starts_with(p))))
        }
    }

    fn tree(files: &[(&str, &[u8])]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (path, content) in files {
            let full = temp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        temp
    }

    fn run(root: &Path, patterns: &[&str], backend: &PrefixRules, skip: bool) -> Selection {
        let patterns = PatternSet::new(patterns).unwrap();
        let options = SelectOptions {
            skip_ignore_rules: skip,
        };
        select_with_backend(root, &patterns, options, backend).unwrap()
    }

    fn sorted(selection: &Selection) -> Vec<String> {
        let mut files: Vec<String> = selection
            .files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        files.sort_unstable();
        files
    }

    #[test]
    fn test_binary_files_are_dropped() {
        let temp = tree(&[("a.txt", b"hello\n"), ("logo.png", PNG)]);
        let selection = run(temp.path(), &["*.txt"], &PrefixRules::default(), false);

        assert_eq!(sorted(&selection), vec!["a.txt"]);
    }

    #[test]
    fn test_binary_dropped_even_when_pattern_matches() {
        let temp = tree(&[("a.txt", b"hello\n"), ("logo.png", PNG)]);
        let selection = run(temp.path(), &["*"], &PrefixRules::default(), false);

        assert_eq!(sorted(&selection), vec!["a.txt"]);
        assert_eq!(selection.stats.binary, 1);
    }

    #[test]
    fn test_directory_pattern_selects_subtree() {
        let temp = tree(&[("src/main.rs", b"fn main() {}\n"), ("docs/readme.md", b"# hi\n")]);
        let selection = run(temp.path(), &["src/"], &PrefixRules::default(), false);

        assert_eq!(sorted(&selection), vec!["src/main.rs"]);
        assert_eq!(selection.stats.pruned_directories, 1);
    }

    #[test]
    fn test_directory_pattern_reaches_nested_files() {
        let temp = tree(&[("p/x/y.txt", b"nested\n")]);
        let selection = run(temp.path(), &["p/"], &PrefixRules::default(), false);

        assert_eq!(sorted(&selection), vec!["p/x/y.txt"]);
    }

    #[test]
    fn test_recursive_wildcard_descends() {
        let temp = tree(&[
            ("src/lib.rs", b"//\n"),
            ("src/a/b/deep.rs", b"//\n"),
            ("src/a/b/notes.txt", b"text\n"),
            ("target/out.rs", b"//\n"),
        ]);
        let selection = run(temp.path(), &["src/**/*.rs"], &PrefixRules::default(), false);

        assert_eq!(sorted(&selection), vec!["src/a/b/deep.rs", "src/lib.rs"]);
    }

    #[test]
    fn test_no_patterns_selects_all_text() {
        let temp = tree(&[
            ("a.txt", b"a\n"),
            ("nested/b.md", b"b\n"),
            ("nested/tool", b"\x7FELF\x02\x01\x01"),
        ]);
        let selection = run(temp.path(), &[], &PrefixRules::default(), false);

        assert_eq!(sorted(&selection), vec!["a.txt", "nested/b.md"]);
    }

    #[test]
    fn test_ignored_file_excluded_unless_bypassed() {
        let temp = tree(&[
            (".git/HEAD", b"ref: refs/heads/main\n"),
            ("secret.env", b"TOKEN=1\n"),
            ("main.go", b"package main\n"),
        ]);
        let backend = PrefixRules::default().with(temp.path(), &["secret.env"]);

        let selection = run(temp.path(), &["*"], &backend, false);
        assert_eq!(sorted(&selection), vec!["main.go"]);
        assert_eq!(selection.stats.ignored, 1);
        assert_eq!(selection.stats.repositories, 1);

        let selection = run(temp.path(), &["*"], &backend, true);
        assert_eq!(sorted(&selection), vec!["main.go", "secret.env"]);
        assert_eq!(selection.stats.ignored, 0);
        assert_eq!(selection.stats.repositories, 0);
    }

    #[test]
    fn test_metadata_directory_never_selected() {
        let temp = tree(&[(".git/config", b"[core]\n"), ("a.txt", b"a\n")]);
        let selection = run(temp.path(), &["*"], &PrefixRules::default(), true);

        assert_eq!(sorted(&selection), vec!["a.txt"]);
    }

    #[test]
    fn test_outer_repository_rule_wins_over_inner() {
        let temp = tree(&[
            (".git/HEAD", b"x\n"),
            (".gitignore", b"build/\n"),
            ("build/sub/.git/HEAD", b"x\n"),
            ("build/sub/keep.txt", b"keep\n"),
        ]);
        let backend = PrefixRules::default()
            .with(temp.path(), &["build"])
            .with(&temp.path().join("build/sub"), &[]);

        let selection = run(temp.path(), &["*"], &backend, false);
        assert_eq!(sorted(&selection), vec![".gitignore"]);

        let selection = run(temp.path(), &["*"], &backend, true);
        assert_eq!(sorted(&selection), vec![".gitignore", "build/sub/keep.txt"]);
    }

    #[test]
    fn test_inner_repository_rules_apply_below_it() {
        let temp = tree(&[
            (".git/HEAD", b"x\n"),
            ("vendor/lib/.git/HEAD", b"x\n"),
            ("vendor/lib/gen.rs", b"//\n"),
            ("vendor/lib/api.rs", b"//\n"),
        ]);
        let backend = PrefixRules::default()
            .with(temp.path(), &[])
            .with(&temp.path().join("vendor/lib"), &["gen.rs"]);

        let selection = run(temp.path(), &["*.rs"], &backend, false);
        assert_eq!(sorted(&selection), vec!["vendor/lib/api.rs"]);
        assert_eq!(selection.stats.repositories, 2);
    }

    #[test]
    fn test_sibling_repository_rules_do_not_leak() {
        let temp = tree(&[
            ("a/.git/HEAD", b"x\n"),
            ("a/x.txt", b"a\n"),
            ("b/x.txt", b"b\n"),
        ]);
        let backend = PrefixRules::default().with(&temp.path().join("a"), &["x.txt"]);

        let selection = run(temp.path(), &["*.txt"], &backend, false);
        assert_eq!(sorted(&selection), vec!["b/x.txt"]);
    }

    #[test]
    fn test_ignored_directory_is_not_entered() {
        let temp = tree(&[
            (".git/HEAD", b"x\n"),
            ("node_modules/pkg/index.js", b"//\n"),
            ("app.js", b"//\n"),
        ]);
        let backend = PrefixRules::default().with(temp.path(), &["node_modules"]);

        let selection = run(temp.path(), &["*.js"], &backend, false);
        assert_eq!(sorted(&selection), vec!["app.js"]);
        assert_eq!(selection.stats.ignored, 1);
    }

    #[test]
    fn test_root_paths_have_no_prefix() {
        let temp = tree(&[("top.txt", b"t\n")]);
        let selection = run(temp.path(), &["top.txt"], &PrefixRules::default(), false);

        assert_eq!(sorted(&selection), vec!["top.txt"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let patterns = PatternSet::new(["*"]).unwrap();
        let result = select_with_backend(
            &temp.path().join("missing"),
            &patterns,
            SelectOptions::default(),
            &PrefixRules::default(),
        );

        assert!(matches!(result, Err(SelectError::RootNotFound { .. })));
    }

    #[test]
    fn test_runs_are_repeatable_and_unique() {
        let temp = tree(&[
            ("a.rs", b"//\n"),
            ("src/b.rs", b"//\n"),
            ("src/c/d.rs", b"//\n"),
        ]);
        let backend = PrefixRules::default();
        let first = run(temp.path(), &["*.rs", "src/"], &backend, false);
        let second = run(temp.path(), &["*.rs", "src/"], &backend, false);

        assert_eq!(sorted(&first), sorted(&second));
        let mut deduped = sorted(&first);
        deduped.dedup();
        assert_eq!(deduped.len(), first.files.len());
        assert_eq!(first.files.len(), 3);
    }

    #[test]
    fn test_concurrent_runs_are_isolated() {
        let ignored = tree(&[(".git/HEAD", b"x\n"), ("a.txt", b"a\n"), ("b.txt", b"b\n")]);
        let plain = tree(&[("a.txt", b"a\n"), ("b.txt", b"b\n")]);

        std::thread::scope(|s| {
            let first = s.spawn(|| {
                let backend = PrefixRules::default().with(ignored.path(), &["a.txt"]);
                run(ignored.path(), &["*.txt"], &backend, false)
            });
            let second = s.spawn(|| run(plain.path(), &["*.txt"], &PrefixRules::default(), false));

            let first = first.join().unwrap();
            let second = second.join().unwrap();
            assert_eq!(sorted(&first), vec!["b.txt"]);
            assert_eq!(sorted(&second), vec!["a.txt", "b.txt"]);
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let temp = tree(&[("real/a.txt", b"a\n")]);
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("link")).unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("real/a.txt"),
            temp.path().join("b.txt"),
        )
        .unwrap();

        let selection = run(temp.path(), &["*"], &PrefixRules::default(), false);
        assert_eq!(sorted(&selection), vec!["real/a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_returned_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let temp = tree(&[("plain.txt", b"p\n")]);
        let raw = OsStr::from_bytes(b"n\xffm.txt");
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join(raw), b"odd name\n").unwrap();

        let selection = run(temp.path(), &["sub/*.txt"], &PrefixRules::default(), false);

        let expected = Path::new("sub").join(raw);
        assert_eq!(selection.files, vec![expected.clone()]);
        assert!(temp.path().join(&expected).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_left_out() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tree(&[("open.txt", b"o\n"), ("locked.txt", b"l\n")]);
        let locked = temp.path().join("locked.txt");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::File::open(&locked).is_ok() {
            // Privileged users bypass mode bits
            return;
        }

        let selection = run(temp.path(), &["*.txt"], &PrefixRules::default(), false);
        assert_eq!(sorted(&selection), vec!["open.txt"]);
        assert_eq!(selection.stats.binary, 1);
    }
}
