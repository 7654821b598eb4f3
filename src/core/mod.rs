//! Core selection: pattern matching, binary detection and the tree walk

pub mod engine;
pub mod pattern;
pub mod signature;

pub use engine::{select, select_with_backend, SelectOptions, Selection, SelectionStats};
pub use pattern::{Pattern, PatternSet, CATCH_ALL};
pub use signature::{is_binary, signature_for, Signature, SIGNATURES};
