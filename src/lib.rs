//! lucidshark-selector - text file selection for analysis pipelines
//!
//! Selects the text files under a directory that match a set of glob
//! patterns, skipping anything ignored by the git repositories found along
//! the way and anything that looks like a binary.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod git;
pub mod logging;

pub use crate::core::{select, select_with_backend, PatternSet, SelectOptions, Selection};
pub use crate::error::{Result, SelectError};
