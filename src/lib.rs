//! Relieur: MusicXML page binder
//!
//! Concatenates MusicXML files, typically the successive pages of one piece,
//! into a single continuous score. Measures are renumbered, parts are merged
//! by position, and the clef, key, time and divisions that a page merely
//! restates are removed.
//!
//! # Pipeline
//!
//! 1. **resolver**: tokens to a sorted file list
//! 2. **score** / **tree**: MusicXML parsing into a mutable tree
//! 3. **merge**: renumbering and attribute deduplication
//! 4. **output**: serialization of the merged score

pub mod attributes;
pub mod config;
pub mod errors;
pub mod merge;
pub mod output;
pub mod resolver;
pub mod score;
pub mod tree;

// Re-export main API
pub use config::{ClefLineSource, MergeSettings};
pub use errors::{ConfigError, MergeError, ParseError};
pub use merge::{merge_files, merge_tokens, MergeEngine, MergeOutcome, MergeReport};
pub use output::{output_path, write_score};
pub use resolver::resolve_files;
pub use score::ScoreDocument;
