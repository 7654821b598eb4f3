//! CLI argument parsing using clap

use crate::config::{Config, OutputFormat};
use crate::error::{Result, SelectError};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Text file selector
#[derive(Parser, Debug)]
#[command(name = "lucidshark-selector")]
#[command(author = "Voldeq GmbH")]
#[command(version)]
#[command(about = "Select text files matching glob patterns, honoring git ignore rules", long_about = None)]
pub struct Cli {
    /// Glob patterns to select; a trailing '/' selects everything below a directory.
    /// Selects every text file when omitted
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Include files ignored by git
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Directory to select from
    #[arg(short = 'C', long = "root", value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Output file for results (use "-" for stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = "-")]
    pub output: String,

    /// Output in JSON format
    #[arg(long = "json")]
    pub json: bool,

    /// Terminate paths with NUL instead of newline
    #[arg(short = 'z', long = "null")]
    pub null: bool,

    /// Increase diagnostic output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Parse command line arguments into a Config
    pub fn into_config(self) -> Result<Config> {
        if self.json && self.null {
            return Err(SelectError::OutputFormatConflict);
        }

        let output_format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Console
        };

        let verbosity = if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        };

        Ok(Config {
            root: self.root,
            patterns: self.patterns,
            skip_ignore_rules: self.all,
            output_format,
            null_terminated: self.null,
            output_filename: self.output,
            verbosity,
        })
    }
}
