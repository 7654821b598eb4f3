//! lucidshark-selector - select text files for analysis
//!
//! Prints the text files under a directory that match the given glob
//! patterns, leaving out files ignored by git and binary files.

use clap::Parser;
use lucidshark_selector::cli::Cli;
use lucidshark_selector::core::select;
use lucidshark_selector::export::{create_exporter, get_output_writer};
use lucidshark_selector::logging;
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse command line arguments; unknown flags exit with status 2 here
    let cli = Cli::parse();

    let config = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    logging::init(config.verbosity);

    // === Phase 1: Compile Patterns ===
    let patterns = match config.pattern_set() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    // === Phase 2: Select Files ===
    let selection = match select(&config.root, &patterns, config.select_options()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    tracing::info!(
        selected = selection.files.len(),
        ignored = selection.stats.ignored,
        binary = selection.stats.binary,
        repositories = selection.stats.repositories,
        "selection complete"
    );

    // === Phase 3: Export Results ===
    let exporter = create_exporter(config.output_format);
    let mut writer = match get_output_writer(&config.output_filename) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error creating output: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = exporter.export(&selection, &config, &mut *writer) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::from(2);
    }

    if let Err(e) = writer.flush() {
        eprintln!("Error flushing output: {}", e);
        return ExitCode::from(2);
    }

    ExitCode::SUCCESS
}
