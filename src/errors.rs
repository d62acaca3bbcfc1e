//! Error types for MusicXML merging
//!
//! Defines the error hierarchy for a merge run. Every variant is fatal to the
//! run: nothing is retried and no output file is written once one is raised.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level merge error type
#[derive(Debug, Error)]
pub enum MergeError {
    /// The resolver matched no file at all for the given tokens
    #[error("No files found for {patterns:?}")]
    NoFilesFound { patterns: Vec<String> },

    /// A glob match is missing or is a directory
    #[error("Invalid input {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// A token is not a valid glob pattern
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The merge engine was handed an empty file list
    #[error("Nothing to merge: empty file list")]
    EmptyMerge,

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be parsed as a partwise MusicXML score
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A measure carries no number, or one that is not an integer
    #[error("Invalid measure number {number:?} in part {part} of {source_label}")]
    InvalidMeasureNumber {
        source_label: String,
        part: usize,
        number: Option<String>,
    },

    /// Serializing or writing the merged score failed
    #[error("Cannot write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

/// Fatal XML parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// XML is malformed (not well-formed)
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// MusicXML format not supported (e.g., timewise instead of partwise)
    #[error("Unsupported MusicXML format: {0}")]
    UnsupportedFormat(String),

    /// Required structural element is missing
    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::InvalidXml(err.to_string())
    }
}

/// Errors raised while loading merge settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, MergeError>;
