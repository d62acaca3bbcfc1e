//! Input file resolution
//!
//! Turns the user's tokens into the ordered list of files to merge. A token
//! without an extension is a radical and matches `<token>*.musicxml`; any
//! other token is used verbatim as a glob pattern. The combined matches are
//! sorted as strings, which is also the order the pages are merged in, so
//! numbered pages need zero padding (`page01` .. `page10`).

use crate::errors::{MergeError, Result};
use std::path::{Path, PathBuf};

/// Glob suffix appended to a radical
pub const RADICAL_SUFFIX: &str = "*.musicxml";

/// Expand a radical into a glob pattern; patterns with an extension pass through
pub fn expand_token(token: &str) -> String {
    if Path::new(token).extension().is_none() {
        format!("{}{}", token, RADICAL_SUFFIX)
    } else {
        token.to_string()
    }
}

/// Resolve tokens into a sorted, deduplicated list of existing files.
///
/// A token matching nothing is only reported; an empty total result fails
/// with `NoFilesFound`. Any match that is missing or is a directory fails
/// the whole resolution with `InvalidInput`.
pub fn resolve_files<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for token in tokens {
        let pattern = expand_token(token.as_ref());
        let entries = glob::glob(&pattern).map_err(|e| MergeError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        let before = files.len();
        for entry in entries {
            let path = entry.map_err(|e| MergeError::InvalidInput {
                path: e.path().to_path_buf(),
                reason: e.error().to_string(),
            })?;
            check_input(&path)?;
            files.push(path);
        }

        if files.len() == before {
            log::debug!("No file found for {}", pattern);
        }
    }

    if files.is_empty() {
        return Err(MergeError::NoFilesFound {
            patterns: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
        });
    }

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    files.dedup();
    Ok(files)
}

fn check_input(path: &Path) -> Result<()> {
    if !path.exists() {
        log::debug!("The file {} does not exist.", path.display());
        return Err(MergeError::InvalidInput {
            path: path.to_path_buf(),
            reason: "file does not exist".to_string(),
        });
    }
    if path.is_dir() {
        log::debug!("{} is a directory.", path.display());
        return Err(MergeError::InvalidInput {
            path: path.to_path_buf(),
            reason: "is a directory".to_string(),
        });
    }
    Ok(())
}
