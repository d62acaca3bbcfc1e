//! Merge settings
//!
//! Settings have sensible defaults and can be loaded from a JSON file.
//! Missing fields fall back to their default; unknown fields are rejected.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the `Line` field of a clef snapshot is read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClefLineSource {
    /// Read the `<line>` child of the clef
    #[default]
    Line,

    /// Copy the `<sign>` value into the line field, as the first releases of
    /// the tool did. Clefs that differ only by line then compare equal.
    Sign,
}

/// Configuration options for a merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeSettings {
    /// Source of the clef line value used for redundancy checks
    pub clef_line_source: ClefLineSource,

    /// Remove an `<attributes>` block once deduplication has emptied it
    pub drop_empty_attributes: bool,

    /// Indentation width of the written MusicXML
    pub indent: usize,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            clef_line_source: ClefLineSource::Line,
            drop_empty_attributes: false,
            indent: 2,
        }
    }
}

impl MergeSettings {
    /// Load settings from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: MergeSettings =
            serde_json::from_str(r#"{ "clef_line_source": "sign" }"#).unwrap();
        assert_eq!(settings.clef_line_source, ClefLineSource::Sign);
        assert!(!settings.drop_empty_attributes);
        assert_eq!(settings.indent, 2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<MergeSettings, _> = serde_json::from_str(r#"{ "colour": "red" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "drop_empty_attributes": true, "indent": 4 }}"#).unwrap();

        let settings = MergeSettings::from_json_file(file.path()).unwrap();
        assert!(settings.drop_empty_attributes);
        assert_eq!(settings.indent, 4);
        assert_eq!(settings.clef_line_source, ClefLineSource::Line);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MergeSettings::from_json_file(Path::new("/nonexistent/relieur.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
