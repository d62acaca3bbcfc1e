//! Writing the merged score

use crate::errors::{MergeError, Result};
use crate::score::ScoreDocument;
use std::path::{Path, PathBuf};

/// Extension of every written score
pub const MUSICXML_EXTENSION: &str = "musicxml";

/// Output path for a run: the requested name with its extension forced to
/// `.musicxml`, or `relieur.musicxml` when none was given.
pub fn output_path(requested: Option<&Path>) -> PathBuf {
    match requested {
        Some(path) => path.with_extension(MUSICXML_EXTENSION),
        None => PathBuf::from(env!("CARGO_PKG_NAME")).with_extension(MUSICXML_EXTENSION),
    }
}

/// Serialize `score` to `path` and return the absolute path written
pub fn write_score(score: &ScoreDocument, path: &Path, indent: usize) -> Result<PathBuf> {
    let bytes = score.to_musicxml(indent).map_err(|e| MergeError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    std::fs::write(path, bytes).map_err(|e| MergeError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    std::fs::canonicalize(path).map_err(|source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    })
}
