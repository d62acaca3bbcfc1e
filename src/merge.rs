//! Merge engine
//!
//! Folds successive MusicXML pages into the first one. For every page the
//! Nth part is appended to the Nth part of the main score, measure numbers are
//! shifted by the length the main part had before the page, and the
//! declarations in a page's first measure that restate the main score's
//! trailing attribute state are deleted.
//!
//! Parts are matched by position only. A page with fewer parts leaves the
//! remaining main parts untouched; extra parts in a page are ignored.

use crate::attributes::{AttributeKind, AttributeSnapshot};
use crate::config::MergeSettings;
use crate::errors::{MergeError, Result};
use crate::resolver::resolve_files;
use crate::score::{
    measure_number, set_measure_number, ScoreDocument, ATTRIBUTES, MEASURE,
};
use crate::tree::XmlElement;
use serde::Serialize;
use std::path::Path;

/// A declaration deleted because it restated the main score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedAttribute {
    /// 1-based part position
    pub part: usize,
    /// Measure number after renumbering
    pub measure: i64,
    pub kind: AttributeKind,
}

/// Summary of a merge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Sources in the order they were merged
    pub files: Vec<String>,
    pub file_count: usize,
    /// Final measure count of the last part of the main score
    pub measures: usize,
    /// Final measure count of every part, by position
    pub part_measures: Vec<usize>,
    pub removed_attributes: Vec<RemovedAttribute>,
}

/// Result of a completed merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: ScoreDocument,
    pub report: MergeReport,
}

impl MergeOutcome {
    /// Number of documents merged, the main one included
    pub fn files(&self) -> usize {
        self.report.file_count
    }

    /// Measure count of the last part of the merged score
    pub fn measures(&self) -> usize {
        self.report.measures
    }
}

/// Accumulates pages into a main score
pub struct MergeEngine {
    main: ScoreDocument,
    snapshots: Vec<AttributeSnapshot>,
    settings: MergeSettings,
    report: MergeReport,
}

impl MergeEngine {
    /// Start from the main score. Its attribute snapshots are captured here
    /// and never recomputed, whatever later pages append.
    pub fn new(main: ScoreDocument, source_label: &str, settings: MergeSettings) -> Self {
        let snapshots = main
            .parts()
            .map(|part| AttributeSnapshot::capture(part, settings.clef_line_source))
            .collect();

        let report = MergeReport {
            files: vec![source_label.to_string()],
            file_count: 1,
            ..MergeReport::default()
        };

        Self {
            main,
            snapshots,
            settings,
            report,
        }
    }

    /// Attribute state of each main part, as captured before merging
    pub fn snapshots(&self) -> &[AttributeSnapshot] {
        &self.snapshots
    }

    /// Append one page to the main score. Every measure number of the page
    /// is checked before the main score is touched, so a failed append
    /// leaves the engine as it was.
    pub fn append(&mut self, mut page: ScoreDocument, source_label: &str) -> Result<()> {
        log::debug!("Processing {}", source_label);
        let current_lens = self.main.measure_counts();
        let mut page_parts = page.take_parts();
        page_parts.truncate(current_lens.len());

        let mut renumbered = Vec::with_capacity(page_parts.len());
        let matched = page_parts.iter_mut().zip(&current_lens).enumerate();
        for (index, (page_part, &current_len)) in matched {
            let mut incoming = Vec::new();
            for measure in page_part.take_children_of(MEASURE) {
                let (number, new_number) = renumber(&measure, current_len, index, source_label)?;
                incoming.push((number, new_number, measure));
            }
            renumbered.push(incoming);
        }

        let main_parts = self.main.parts_mut().enumerate().zip(&self.snapshots);
        for (((index, part), snapshot), incoming) in main_parts.zip(renumbered) {
            log::debug!("Main part has {} measures", current_lens[index]);

            for (number, new_number, mut measure) in incoming {
                if number == 1 {
                    for kind in remove_restated(&mut measure, snapshot, &self.settings) {
                        log::debug!(
                            "Remove {} at measure {}, part {}",
                            kind.xml_name(),
                            new_number,
                            index + 1
                        );
                        self.report.removed_attributes.push(RemovedAttribute {
                            part: index + 1,
                            measure: new_number,
                            kind,
                        });
                    }
                }

                set_measure_number(&mut measure, new_number);
                part.append(measure);
                log::debug!("Added measure {}, part {}", new_number, index + 1);
            }
        }

        self.report.files.push(source_label.to_string());
        self.report.file_count += 1;
        Ok(())
    }

    pub fn finish(mut self) -> MergeOutcome {
        self.report.part_measures = self.main.measure_counts();
        self.report.measures = self.report.part_measures.last().copied().unwrap_or(0);
        MergeOutcome {
            document: self.main,
            report: self.report,
        }
    }
}

/// Original and shifted number of an incoming measure
fn renumber(
    measure: &XmlElement,
    current_len: usize,
    index: usize,
    source_label: &str,
) -> Result<(i64, i64)> {
    measure_number(measure)
        .and_then(|number| {
            let offset = i64::try_from(current_len).ok()?;
            Some((number, number.checked_add(offset)?))
        })
        .ok_or_else(|| MergeError::InvalidMeasureNumber {
            source_label: source_label.to_string(),
            part: index + 1,
            number: measure.attribute("number").map(str::to_string),
        })
}

/// Delete the declarations of a measure that restate `snapshot`, returning
/// their kinds in document order
fn remove_restated(
    measure: &mut XmlElement,
    snapshot: &AttributeSnapshot,
    settings: &MergeSettings,
) -> Vec<AttributeKind> {
    let mut removed = Vec::new();
    for attributes in measure.children_of_mut(ATTRIBUTES) {
        let dropped = attributes
            .remove_elements_where(|declaration| snapshot.restates(declaration, settings.clef_line_source));
        removed.extend(
            dropped
                .iter()
                .filter_map(|declaration| AttributeKind::from_xml_name(&declaration.name)),
        );
    }

    if settings.drop_empty_attributes {
        measure.remove_elements_where(|child| child.name == ATTRIBUTES && child.children.is_empty());
    }
    removed
}

/// Merge files in the given order; the first one is the main score
pub fn merge_files<P: AsRef<Path>>(paths: &[P], settings: &MergeSettings) -> Result<MergeOutcome> {
    let (first, rest) = paths.split_first().ok_or(MergeError::EmptyMerge)?;
    let first = first.as_ref();

    log::info!("Starting with {}", first.display());
    let main = ScoreDocument::load(first)?;
    let mut engine = MergeEngine::new(main, &first.display().to_string(), settings.clone());

    for path in rest {
        let path = path.as_ref();
        let page = ScoreDocument::load(path)?;
        engine.append(page, &path.display().to_string())?;
    }

    let outcome = engine.finish();
    for (index, count) in outcome.report.part_measures.iter().enumerate() {
        log::debug!("Part {} has {} measures", index + 1, count);
    }
    Ok(outcome)
}

/// Resolve tokens and merge the matching files
pub fn merge_tokens<S: AsRef<str>>(tokens: &[S], settings: &MergeSettings) -> Result<MergeOutcome> {
    let files = resolve_files(tokens)?;
    merge_files(&files, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClefLineSource;
    use crate::score::measures;

    fn page(parts: &[&str]) -> ScoreDocument {
        let body: String = parts
            .iter()
            .enumerate()
            .map(|(i, measures)| format!("<part id=\"P{}\">{}</part>", i + 1, measures))
            .collect();
        ScoreDocument::parse(&format!("<score-partwise version=\"3.1\">{}</score-partwise>", body))
            .unwrap()
    }

    const OPENING: &str = r#"<measure number="1"><attributes><divisions>2</divisions><key><fifths>0</fifths></key><time><beats>4</beats><beat-type>4</beat-type></time><clef><sign>G</sign><line>2</line></clef></attributes></measure><measure number="2"/>"#;

    fn numbers(doc: &ScoreDocument, part: usize) -> Vec<String> {
        let part = doc.parts().nth(part).unwrap();
        measures(part)
            .map(|m| m.attribute("number").unwrap().to_string())
            .collect()
    }

    fn first_attributes(doc: &ScoreDocument, part: usize, measure: usize) -> Vec<String> {
        let part = doc.parts().nth(part).unwrap();
        let measure = measures(part).nth(measure).unwrap();
        measure
            .children_of(ATTRIBUTES)
            .flat_map(|a| a.elements().map(|e| e.name.clone()))
            .collect()
    }

    #[test]
    fn test_single_document_is_unchanged() {
        let main = page(&[OPENING]);
        let outcome = MergeEngine::new(main.clone(), "a", MergeSettings::default()).finish();

        assert_eq!(outcome.files(), 1);
        assert_eq!(outcome.measures(), 2);
        assert_eq!(outcome.document, main);
    }

    #[test]
    fn test_renumbers_and_removes_restated_attributes() {
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", MergeSettings::default());
        engine.append(page(&[OPENING]), "b").unwrap();
        let outcome = engine.finish();

        assert_eq!(numbers(&outcome.document, 0), vec!["1", "2", "3", "4"]);
        assert!(first_attributes(&outcome.document, 0, 2).is_empty());
        assert_eq!(outcome.report.removed_attributes.len(), 4);
        assert_eq!(outcome.report.removed_attributes[0].measure, 3);
        assert_eq!(outcome.report.removed_attributes[0].kind, AttributeKind::Divisions);
    }

    #[test]
    fn test_changed_attribute_kept() {
        let modulating = OPENING.replace("<fifths>0</fifths>", "<fifths>3</fifths>");
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", MergeSettings::default());
        engine.append(page(&[&modulating]), "b").unwrap();
        let outcome = engine.finish();

        assert_eq!(first_attributes(&outcome.document, 0, 2), vec!["key"]);
        let kinds: Vec<_> = outcome.report.removed_attributes.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![AttributeKind::Divisions, AttributeKind::Time, AttributeKind::Clef]
        );
    }

    #[test]
    fn test_snapshot_taken_from_main_score_only() {
        // Page b changes the key; page c restates the main score's key and
        // must lose it, even though the merged score ends in b's key.
        let modulating = OPENING.replace("<fifths>0</fifths>", "<fifths>3</fifths>");
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", MergeSettings::default());
        engine.append(page(&[&modulating]), "b").unwrap();
        engine.append(page(&[OPENING]), "c").unwrap();
        let outcome = engine.finish();

        assert_eq!(numbers(&outcome.document, 0), vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(first_attributes(&outcome.document, 0, 2), vec!["key"]);
        assert!(first_attributes(&outcome.document, 0, 4).is_empty());
    }

    #[test]
    fn test_only_first_measure_deduplicated() {
        let restating = r#"<measure number="1"/><measure number="2"><attributes><divisions>2</divisions></attributes></measure>"#;
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", MergeSettings::default());
        engine.append(page(&[restating]), "b").unwrap();
        let outcome = engine.finish();

        assert_eq!(first_attributes(&outcome.document, 0, 3), vec!["divisions"]);
        assert!(outcome.report.removed_attributes.is_empty());
    }

    #[test]
    fn test_positional_part_matching() {
        let main = page(&[OPENING, OPENING]);
        let mut engine = MergeEngine::new(main, "a", MergeSettings::default());
        engine.append(page(&[r#"<measure number="1"/>"#]), "b").unwrap();
        engine
            .append(
                page(&[
                    r#"<measure number="1"/>"#,
                    r#"<measure number="1"/>"#,
                    r#"<measure number="1"/>"#,
                ]),
                "c",
            )
            .unwrap();
        let outcome = engine.finish();

        assert_eq!(outcome.report.part_measures, vec![4, 3]);
        assert_eq!(outcome.document.parts().count(), 2);
        assert_eq!(numbers(&outcome.document, 1), vec!["1", "2", "3"]);
        // The reported count follows the last main part
        assert_eq!(outcome.measures(), 3);
        assert_eq!(outcome.files(), 3);
    }

    #[test]
    fn test_drop_empty_attributes() {
        let settings = MergeSettings {
            drop_empty_attributes: true,
            ..MergeSettings::default()
        };
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", settings);
        engine.append(page(&[OPENING]), "b").unwrap();
        let outcome = engine.finish();

        let part = outcome.document.parts().next().unwrap();
        let third = measures(part).nth(2).unwrap();
        assert!(third.child(ATTRIBUTES).is_none());
    }

    #[test]
    fn test_clef_line_source_sign_drops_changed_line() {
        let tenor = OPENING.replace(
            "<sign>G</sign><line>2</line>",
            "<sign>G</sign><line>1</line>",
        );
        let settings = MergeSettings {
            clef_line_source: ClefLineSource::Sign,
            ..MergeSettings::default()
        };
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", settings);
        engine.append(page(&[&tenor]), "b").unwrap();
        let outcome = engine.finish();
        assert!(first_attributes(&outcome.document, 0, 2).is_empty());

        let mut engine = MergeEngine::new(page(&[OPENING]), "a", MergeSettings::default());
        engine.append(page(&[&tenor]), "b").unwrap();
        let outcome = engine.finish();
        assert_eq!(first_attributes(&outcome.document, 0, 2), vec!["clef"]);
    }

    #[test]
    fn test_invalid_measure_number() {
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", MergeSettings::default());
        let err = engine
            .append(page(&[r#"<measure number="X1"/>"#]), "b")
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::InvalidMeasureNumber { part: 1, .. }
        ));
    }

    #[test]
    fn test_failed_append_leaves_main_score_untouched() {
        let main = page(&[OPENING, OPENING]);
        let mut engine = MergeEngine::new(main.clone(), "a", MergeSettings::default());
        let err = engine
            .append(
                page(&[
                    r#"<measure number="1"/>"#,
                    r#"<measure number="1"/><measure number="x"/>"#,
                ]),
                "b",
            )
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidMeasureNumber { part: 2, .. }));

        let outcome = engine.finish();
        assert_eq!(outcome.report.part_measures, vec![2, 2]);
        assert_eq!(outcome.files(), 1);
        assert_eq!(outcome.document, main);
    }

    #[test]
    fn test_measure_number_overflow_rejected() {
        let mut engine = MergeEngine::new(page(&[OPENING]), "a", MergeSettings::default());
        let huge = format!(r#"<measure number="{}"/>"#, i64::MAX);
        let err = engine.append(page(&[&huge]), "b").unwrap_err();
        assert!(matches!(err, MergeError::InvalidMeasureNumber { part: 1, .. }));
        assert_eq!(engine.finish().measures(), 2);
    }

    #[test]
    fn test_snapshots_come_from_main_score() {
        let main = page(&[OPENING, r#"<measure number="1"/>"#]);
        let engine = MergeEngine::new(main, "a", MergeSettings::default());
        let snapshots = engine.snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].divisions.as_deref(), Some("2"));
        assert_eq!(snapshots[1], AttributeSnapshot::default());
    }

    #[test]
    fn test_empty_file_list() {
        let paths: [&Path; 0] = [];
        let err = merge_files(&paths, &MergeSettings::default()).unwrap_err();
        assert!(matches!(err, MergeError::EmptyMerge));
    }
}
