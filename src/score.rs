//! Partwise score documents
//!
//! `ScoreDocument` wraps an element tree whose root is `<score-partwise>` and
//! gives typed access to its parts and measures.

use crate::errors::{MergeError, ParseError};
use crate::tree::{parse_document, write_document, XmlDocument, XmlElement};
use std::path::Path;

pub const SCORE_PARTWISE: &str = "score-partwise";
pub const PART: &str = "part";
pub const MEASURE: &str = "measure";
pub const ATTRIBUTES: &str = "attributes";

/// A parsed partwise MusicXML score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreDocument {
    xml: XmlDocument,
}

impl ScoreDocument {
    /// Parse MusicXML text. Only `score-partwise` documents are accepted.
    pub fn parse(musicxml: &str) -> Result<Self, ParseError> {
        Self::from_xml(parse_document(musicxml)?)
    }

    pub fn from_xml(xml: XmlDocument) -> Result<Self, ParseError> {
        if xml.root.name != SCORE_PARTWISE {
            return Err(ParseError::UnsupportedFormat(format!(
                "Expected {}, found {}",
                SCORE_PARTWISE, xml.root.name
            )));
        }
        Ok(Self { xml })
    }

    /// Read and parse a MusicXML file
    pub fn load(path: &Path) -> Result<Self, MergeError> {
        let text = std::fs::read_to_string(path).map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| MergeError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn root(&self) -> &XmlElement {
        &self.xml.root
    }

    pub fn parts(&self) -> impl Iterator<Item = &XmlElement> {
        self.xml.root.children_of(PART)
    }

    pub fn parts_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.xml.root.children_of_mut(PART)
    }

    /// Detach every part from the document, in order
    pub fn take_parts(&mut self) -> Vec<XmlElement> {
        self.xml.root.take_children_of(PART)
    }

    /// Measure count of every part, by part index
    pub fn measure_counts(&self) -> Vec<usize> {
        self.parts().map(measure_count).collect()
    }

    /// Serialize back to MusicXML bytes
    pub fn to_musicxml(&self, indent: usize) -> Result<Vec<u8>, quick_xml::Error> {
        write_document(&self.xml, indent)
    }
}

pub fn measures(part: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    part.children_of(MEASURE)
}

pub fn measure_count(part: &XmlElement) -> usize {
    measures(part).count()
}

/// Numeric value of a measure's `number` attribute
pub fn measure_number(measure: &XmlElement) -> Option<i64> {
    measure.attribute("number")?.trim().parse().ok()
}

pub fn set_measure_number(measure: &mut XmlElement, number: i64) {
    measure.set_attribute("number", number.to_string());
}
