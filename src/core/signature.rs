//! Binary file detection by magic-number sniffing
//!
//! Only the first [`SNIFF_LEN`] bytes of a file are inspected. A file is
//! considered binary when those bytes start with one of the known
//! [`SIGNATURES`]; everything else is treated as text.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes read from each candidate file
pub const SNIFF_LEN: usize = 16;

/// A known binary format header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Human-readable format name (used in diagnostics)
    pub name: &'static str,
    /// Exact byte prefix identifying the format
    pub bytes: &'static [u8],
}

impl Signature {
    const fn new(name: &'static str, bytes: &'static [u8]) -> Self {
        Self { name, bytes }
    }

    /// Check whether `header` starts with this signature
    ///
    /// A header shorter than the signature never matches.
    #[inline]
    pub fn matches(&self, header: &[u8]) -> bool {
        header.len() >= self.bytes.len() && header[..self.bytes.len()] == *self.bytes
    }
}

/// Headers of formats that are never selected
pub static SIGNATURES: &[Signature] = &[
    Signature::new("ELF", b"\x7FELF"),
    Signature::new("PE/DOS executable", b"MZ"),
    Signature::new("JPEG", b"\xFF\xD8\xFF"),
    Signature::new("PNG", b"\x89PNG\r\n\x1A\n"),
    Signature::new("MP3 (ID3 tag)", b"ID3"),
    Signature::new("MP3 (frame sync)", b"\xFF\xFB"),
    Signature::new("OGG", b"OggS"),
    Signature::new("PDF", b"%PDF-"),
    Signature::new("GIF", b"GIF8"),
    Signature::new("ZIP", b"PK\x03\x04"),
    Signature::new("gzip", b"\x1F\x8B"),
    Signature::new("WebAssembly", b"\0asm"),
];

/// Find the first signature matching the given file header
pub fn signature_for(header: &[u8]) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|sig| sig.matches(header))
}

/// Read up to [`SNIFF_LEN`] bytes from the start of a reader
///
/// Read errors end the sniff early; whatever was read so far is returned.
fn read_header(reader: impl Read) -> Vec<u8> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    if let Err(e) = reader.take(SNIFF_LEN as u64).read_to_end(&mut header) {
        tracing::debug!(error = %e, "short read while sniffing file header");
    }
    header
}

/// Decide whether a file is binary
///
/// Files that cannot be opened are reported and treated as binary so they are
/// left out of the selection. A transient open failure therefore drops the
/// file silently from the result apart from the warning.
pub fn is_binary(path: &Path) -> bool {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "unable to open file for binary check, excluding it"
            );
            return true;
        }
    };

    match signature_for(&read_header(file)) {
        Some(sig) => {
            tracing::debug!(path = %path.display(), format = sig.name, "binary signature matched");
            true
        }
        None => false,
    }
}
