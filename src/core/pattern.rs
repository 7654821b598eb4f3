//! Selection patterns
//!
//! Patterns are shell-style globs matched against paths relative to the
//! traversal root. `*` is not stopped by `/`, so `*.rs` matches `src/main.rs`.
//! A pattern ending in `/` selects everything below that directory and is
//! stored as `<dir>/*`.

use crate::error::{Result, SelectError};
use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;

/// Pattern used when none are supplied
pub const CATCH_ALL: &str = "*";

const SEPARATOR: &str = "/";
const GLOB_META: &[char] = &['*', '?', '[', '{', '\\'];

/// A compiled selection pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Normalized pattern text
    text: String,
    matcher: GlobMatcher,
    /// Leading part of `text` up to the first glob metacharacter
    literal_prefix_len: usize,
    has_wildcard: bool,
}

impl Pattern {
    /// Compile a pattern, expanding a trailing `/` into `/*`
    pub fn new(raw: &str) -> Result<Self> {
        let text = if raw.ends_with(SEPARATOR) {
            format!("{}*", raw)
        } else {
            raw.to_string()
        };

        let matcher = GlobBuilder::new(&text)
            .literal_separator(false)
            .backslash_escape(true)
            .build()
            .map_err(|source| SelectError::InvalidPattern {
                pattern: raw.to_string(),
                source,
            })?
            .compile_matcher();

        let meta = text.find(GLOB_META);
        Ok(Self {
            literal_prefix_len: meta.unwrap_or(text.len()),
            has_wildcard: meta.is_some(),
            matcher,
            text,
        })
    }

    /// The normalized pattern text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Exact match of a file path against this pattern
    ///
    /// Paths are matched as raw bytes, so names that are not valid UTF-8
    /// still match wildcards.
    #[inline]
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        self.matcher.is_match(path.as_ref())
    }

    /// Relaxed test deciding whether a directory is worth descending into
    ///
    /// This trades precision for recall: it may admit directories that end up
    /// contributing nothing, but must never reject one that holds a match.
    /// Conditions (a) to (c) form the basic heuristic and are kept as is,
    /// including the substring test. (d) covers wildcards in the middle of a
    /// pattern, e.g. `src/**/*.rs` reaching `src/a/b/`, which (a) to (c) miss.
    pub fn may_contain(&self, dir_path: impl AsRef<Path>) -> bool {
        let mut dir = dir_path.as_ref().as_os_str().to_owned();
        dir.push(SEPARATOR);
        let dir_bytes = dir.as_encoded_bytes();
        let text = self.text.as_bytes();

        // (a) the directory itself matches
        self.matches(Path::new(&dir))
            // (b) leading wildcard can reach any depth
            || text.starts_with(b"*")
            // (c) the directory is spelled out inside the pattern
            || contains(text, dir_bytes)
            // (d) the directory lies under the pattern's literal prefix
            || (self.has_wildcard && dir_bytes.starts_with(&text[..self.literal_prefix_len]))
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// The full set of patterns for one selection run
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile raw patterns; an empty list selects everything
    pub fn new<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = raw
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if patterns.is_empty() {
            patterns.push(Pattern::new(CATCH_ALL)?);
        }

        for pattern in &patterns {
            tracing::debug!(pattern = pattern.as_str(), "selection pattern");
        }

        Ok(Self { patterns })
    }

    /// First pattern matching the file path, if any
    pub fn matching(&self, path: impl AsRef<Path>) -> Option<&Pattern> {
        let path = path.as_ref();
        self.patterns.iter().find(|p| p.matches(path))
    }

    /// Whether any pattern's relaxed test admits the directory
    pub fn should_descend(&self, dir_path: impl AsRef<Path>) -> bool {
        let dir_path = dir_path.as_ref();
        self.patterns.iter().any(|p| p.may_contain(dir_path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
