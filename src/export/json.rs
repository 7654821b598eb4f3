//! JSON exporter

use crate::config::Config;
use crate::core::{Selection, SelectionStats};
use crate::error::Result;
use crate::export::Exporter;
use serde::Serialize;
use std::io::Write;

/// JSON output exporter
pub struct JsonExporter;

#[derive(Serialize)]
struct JsonOutput {
    /// JSON strings cannot carry raw bytes, so invalid UTF-8 is replaced
    files: Vec<String>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    selected: usize,
    #[serde(flatten)]
    stats: SelectionStats,
}

impl Exporter for JsonExporter {
    fn export(&self, selection: &Selection, _config: &Config, writer: &mut dyn Write) -> Result<()> {
        let output = JsonOutput {
            files: selection
                .files
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            summary: JsonSummary {
                selected: selection.files.len(),
                stats: selection.stats,
            },
        };

        let json = serde_json::to_string_pretty(&output)?;
        writeln!(writer, "{}", json)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_json_export() {
        let selection = Selection {
            files: vec![PathBuf::from("a.txt"), PathBuf::from("src/lib.rs")],
            stats: SelectionStats {
                ignored: 3,
                binary: 1,
                pruned_directories: 2,
                repositories: 1,
            },
        };

        let mut output = Vec::new();
        JsonExporter
            .export(&selection, &Config::default(), &mut output)
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["files"][1], "src/lib.rs");
        assert_eq!(parsed["summary"]["selected"], 2);
        assert_eq!(parsed["summary"]["ignored"], 3);
        assert_eq!(parsed["summary"]["binary"], 1);
        assert_eq!(parsed["summary"]["pruned_directories"], 2);
        assert_eq!(parsed["summary"]["repositories"], 1);
    }
}
