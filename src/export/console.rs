//! Plain path list exporter

use crate::config::Config;
use crate::core::Selection;
use crate::error::Result;
use crate::export::Exporter;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

/// One path per record, newline or NUL terminated
///
/// Paths are written as their raw bytes on unix so that names which are not
/// valid UTF-8 can be opened by whatever reads the list.
pub struct ConsoleExporter;

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

impl Exporter for ConsoleExporter {
    fn export(&self, selection: &Selection, config: &Config, writer: &mut dyn Write) -> Result<()> {
        let terminator = config.record_terminator().as_bytes();
        for path in &selection.files {
            writer.write_all(&path_bytes(path))?;
            writer.write_all(terminator)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn selection() -> Selection {
        Selection {
            files: vec![PathBuf::from("a.txt"), PathBuf::from("src/main.rs")],
            ..Selection::default()
        }
    }

    #[test]
    fn test_newline_terminated() {
        let mut output = Vec::new();
        ConsoleExporter
            .export(&selection(), &Config::default(), &mut output)
            .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "a.txt\nsrc/main.rs\n");
    }

    #[test]
    fn test_null_terminated() {
        let config = Config {
            null_terminated: true,
            ..Config::default()
        };
        let mut output = Vec::new();
        ConsoleExporter.export(&selection(), &config, &mut output).unwrap();

        assert_eq!(output, b"a.txt\0src/main.rs\0");
    }

    #[test]
    fn test_empty_selection_writes_nothing() {
        let mut output = Vec::new();
        ConsoleExporter
            .export(&Selection::default(), &Config::default(), &mut output)
            .unwrap();

        assert!(output.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_written_as_raw_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let selection = Selection {
            files: vec![PathBuf::from(OsStr::from_bytes(b"n\xffm.txt"))],
            ..Selection::default()
        };
        let mut output = Vec::new();
        ConsoleExporter
            .export(&selection, &Config::default(), &mut output)
            .unwrap();

        assert_eq!(output, b"n\xffm.txt\n");
    }
}
