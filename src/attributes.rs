//! Staff attribute values and per-part snapshots
//!
//! A snapshot records the last divisions, key, time and clef declared in a
//! part. It is taken once from the main score before anything is merged and
//! decides which declarations restated by later pages are redundant.

use crate::config::ClefLineSource;
use crate::score::{measures, ATTRIBUTES};
use crate::tree::XmlElement;
use serde::Serialize;

/// The attribute declarations subject to deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Divisions,
    Key,
    Time,
    Clef,
}

impl AttributeKind {
    /// Get the MusicXML element name for this declaration
    pub fn xml_name(&self) -> &'static str {
        match self {
            AttributeKind::Divisions => "divisions",
            AttributeKind::Key => "key",
            AttributeKind::Time => "time",
            AttributeKind::Clef => "clef",
        }
    }

    pub fn from_xml_name(name: &str) -> Option<Self> {
        match name {
            "divisions" => Some(AttributeKind::Divisions),
            "key" => Some(AttributeKind::Key),
            "time" => Some(AttributeKind::Time),
            "clef" => Some(AttributeKind::Clef),
            _ => None,
        }
    }
}

/// Key signature fields compared for redundancy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAttributes {
    pub fifths: Option<String>,
    pub key_alter: Option<String>,
    pub mode: Option<String>,
}

impl KeyAttributes {
    pub fn from_element(key: &XmlElement) -> Self {
        Self {
            fifths: last_text(key, "fifths"),
            key_alter: last_text(key, "key-alter"),
            mode: last_text(key, "mode"),
        }
    }
}

/// Time signature fields compared for redundancy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeAttributes {
    pub beats: Option<String>,
    pub beat_type: Option<String>,
    /// Canonical rendering of the `<interchangeable>` subtree
    pub interchangeable: Option<String>,
    pub senza_misura: Option<String>,
}

impl TimeAttributes {
    pub fn from_element(time: &XmlElement) -> Self {
        Self {
            beats: last_text(time, "beats"),
            beat_type: last_text(time, "beat-type"),
            interchangeable: time.children_of("interchangeable").last().map(XmlElement::canonical),
            senza_misura: last_text(time, "senza-misura"),
        }
    }
}

/// Clef fields compared for redundancy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClefAttributes {
    pub sign: Option<String>,
    pub line: Option<String>,
    pub clef_octave_change: Option<String>,
}

impl ClefAttributes {
    pub fn from_element(clef: &XmlElement, line_source: ClefLineSource) -> Self {
        let sign = last_text(clef, "sign");
        let line = match line_source {
            ClefLineSource::Line => last_text(clef, "line"),
            ClefLineSource::Sign => sign.clone(),
        };
        Self {
            sign,
            line,
            clef_octave_change: last_text(clef, "clef-octave-change"),
        }
    }
}

/// Last known attribute state of one part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSnapshot {
    pub divisions: Option<String>,
    pub key: Option<KeyAttributes>,
    pub time: Option<TimeAttributes>,
    pub clef: Option<ClefAttributes>,
}

impl AttributeSnapshot {
    /// Scan every measure of a part; later declarations overwrite earlier ones
    pub fn capture(part: &XmlElement, line_source: ClefLineSource) -> Self {
        let mut snapshot = Self::default();
        for measure in measures(part) {
            for attributes in measure.children_of(ATTRIBUTES) {
                snapshot.observe(attributes, line_source);
            }
        }
        snapshot
    }

    /// Fold one `<attributes>` block into the snapshot
    pub fn observe(&mut self, attributes: &XmlElement, line_source: ClefLineSource) {
        for declaration in attributes.elements() {
            match AttributeKind::from_xml_name(&declaration.name) {
                Some(AttributeKind::Divisions) => {
                    self.divisions = Some(declaration.text().trim().to_string())
                }
                Some(AttributeKind::Key) => self.key = Some(KeyAttributes::from_element(declaration)),
                Some(AttributeKind::Time) => {
                    self.time = Some(TimeAttributes::from_element(declaration))
                }
                Some(AttributeKind::Clef) => {
                    self.clef = Some(ClefAttributes::from_element(declaration, line_source))
                }
                None => {}
            }
        }
    }

    /// Whether `declaration` restates the value held by the snapshot.
    /// A field never seen in the main score matches nothing.
    pub fn restates(&self, declaration: &XmlElement, line_source: ClefLineSource) -> bool {
        match AttributeKind::from_xml_name(&declaration.name) {
            Some(AttributeKind::Divisions) => self
                .divisions
                .as_deref()
                .map_or(false, |divisions| same_divisions(divisions, &declaration.text())),
            Some(AttributeKind::Key) => {
                self.key.as_ref() == Some(&KeyAttributes::from_element(declaration))
            }
            Some(AttributeKind::Time) => {
                self.time.as_ref() == Some(&TimeAttributes::from_element(declaration))
            }
            Some(AttributeKind::Clef) => {
                self.clef.as_ref() == Some(&ClefAttributes::from_element(declaration, line_source))
            }
            None => false,
        }
    }
}

fn last_text(element: &XmlElement, name: &str) -> Option<String> {
    element
        .children_of(name)
        .last()
        .map(|child| child.text().trim().to_string())
}

/// Divisions compare as numbers when both parse, so "2" and "2.0" match
fn same_divisions(held: &str, declared: &str) -> bool {
    let declared = declared.trim();
    match (held.parse::<f64>(), declared.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => held == declared,
    }
}
