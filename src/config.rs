//! Configuration types for lucidshark-selector

use crate::core::{PatternSet, SelectOptions};
use crate::error::Result;
use std::path::PathBuf;

/// Output format for the selected file list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One path per line
    #[default]
    Console,
    /// JSON document with the file list and run statistics
    Json,
}

/// Configuration options for a selection run
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the walk starts from; output paths are relative to it
    pub root: PathBuf,

    /// Glob patterns as given by the user (empty = select everything)
    pub patterns: Vec<String>,

    /// Include files hidden by git ignore rules
    pub skip_ignore_rules: bool,

    /// Output format (console or json)
    pub output_format: OutputFormat,

    /// Terminate console entries with NUL instead of newline
    pub null_terminated: bool,

    /// Path to output file (or "-" for stdout)
    pub output_filename: String,

    /// Diagnostic verbosity: 0 = errors only, 1 = warnings (default), 2 = info, 3+ = debug
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            patterns: Vec::new(),
            skip_ignore_rules: false,
            output_format: OutputFormat::Console,
            null_terminated: false,
            output_filename: String::from("-"),
            verbosity: 1,
        }
    }
}

impl Config {
    /// Options handed to the selection engine
    pub fn select_options(&self) -> SelectOptions {
        SelectOptions {
            skip_ignore_rules: self.skip_ignore_rules,
        }
    }

    /// Compile the configured patterns
    pub fn pattern_set(&self) -> Result<PatternSet> {
        PatternSet::new(&self.patterns)
    }

    /// Output record terminator for console output
    pub fn record_terminator(&self) -> &'static str {
        if self.null_terminated {
            "\0"
        } else {
            "\n"
        }
    }
}
