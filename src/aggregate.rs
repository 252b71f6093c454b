use crate::mapping::ReferenceMapping;
use crate::palette::Rgb;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// One weighted observation of an object and its dominant color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionEntry {
    /// Object label as detected; compared case-insensitively.
    pub class: String,
    /// Color name as detected; used verbatim for voting and scoring.
    pub dominant_name: String,
    #[schemars(with = "[u8; 3]")]
    pub dominant_rgb: Rgb,
    /// Detection confidence, non-negative.
    pub score: f64,
}

impl DetectionEntry {
    pub fn new(class: impl Into<String>, name: impl Into<String>, rgb: Rgb, score: f64) -> Self {
        Self {
            class: class.into(),
            dominant_name: name.into(),
            dominant_rgb: rgb,
            score,
        }
    }
}

/// On-disk layout of a reference source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceFile {
    pub entries: Vec<DetectionEntry>,
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("could not read reference: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reference JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("entry {index} ('{class}') has invalid score {score}")]
    InvalidScore {
        index: usize,
        class: String,
        score: f64,
    },
    #[error("entry {index} ('{class}') has a blank color name")]
    BlankColorName { index: usize, class: String },
}

/// Per-label dominant colors for one reference source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedReference {
    pub colors: ReferenceMapping,
    /// RGB of the single highest-scoring entry per label, in label order.
    pub rgb: Vec<(String, Rgb)>,
}

impl AggregatedReference {
    pub fn rgb_for(&self, label: &str) -> Option<Rgb> {
        self.rgb.iter().find(|(l, _)| l == label).map(|(_, rgb)| *rgb)
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

struct LabelTally {
    label: String,
    // Summed score per color, in order of first appearance.
    color_weights: Vec<(String, f64)>,
    best_score: f64,
    best_rgb: Rgb,
}

impl LabelTally {
    fn new(label: String, entry: &DetectionEntry) -> Self {
        Self {
            label,
            color_weights: Vec::new(),
            best_score: entry.score,
            best_rgb: entry.dominant_rgb,
        }
    }

    fn add(&mut self, color: String, entry: &DetectionEntry) {
        match self.color_weights.iter_mut().find(|(c, _)| *c == color) {
            Some((_, weight)) => *weight += entry.score,
            None => self.color_weights.push((color, entry.score)),
        }
        if entry.score > self.best_score {
            self.best_score = entry.score;
            self.best_rgb = entry.dominant_rgb;
        }
    }

    fn winning_color(&self) -> Option<&str> {
        let mut winner: Option<(&str, f64)> = None;
        for (color, weight) in &self.color_weights {
            match winner {
                Some((_, best)) if *weight <= best => {}
                _ => winner = Some((color.as_str(), *weight)),
            }
        }
        winner.map(|(color, _)| color)
    }
}

/// Reduce detections to one dominant color per (lower-cased) label.
///
/// The winning color has the largest summed score, the earliest-seen color
/// keeping a tie. The reported RGB comes from the entry with the highest
/// individual score, which need not be an entry of the winning color.
pub fn aggregate(entries: &[DetectionEntry]) -> AggregatedReference {
    let mut tallies: Vec<LabelTally> = Vec::new();

    for entry in entries {
        let label = entry.class.to_lowercase();
        let color = entry.dominant_name.clone();
        let index = match tallies.iter().position(|t| t.label == label) {
            Some(index) => index,
            None => {
                tallies.push(LabelTally::new(label, entry));
                tallies.len() - 1
            }
        };
        tallies[index].add(color, entry);
    }

    let mut result = AggregatedReference::default();
    for tally in &tallies {
        if let Some(color) = tally.winning_color() {
            log::debug!(
                "label '{}': {} candidate color(s), dominant '{}'",
                tally.label,
                tally.color_weights.len(),
                color
            );
            result.colors.insert(&tally.label, color);
            result.rgb.push((tally.label.clone(), tally.best_rgb));
        }
    }
    result
}

/// Parse reference JSON and check entry scores and color names.
pub fn parse_reference(input: &str) -> Result<ReferenceFile, ReferenceError> {
    let file: ReferenceFile = serde_json::from_str(input)?;
    for (index, entry) in file.entries.iter().enumerate() {
        if entry.dominant_name.trim().is_empty() {
            return Err(ReferenceError::BlankColorName {
                index,
                class: entry.class.clone(),
            });
        }
        if !entry.score.is_finite() || entry.score < 0.0 {
            return Err(ReferenceError::InvalidScore {
                index,
                class: entry.class.clone(),
                score: entry.score,
            });
        }
    }
    Ok(file)
}

/// Read and aggregate a reference file.
pub fn load_reference(path: &Path) -> Result<AggregatedReference, ReferenceError> {
    let content = std::fs::read_to_string(path)?;
    let file = parse_reference(&content)?;
    Ok(aggregate(&file.entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(class: &str, name: &str, rgb: [u8; 3], score: f64) -> DetectionEntry {
        DetectionEntry::new(class, name, rgb.into(), score)
    }

    #[test]
    fn summed_score_picks_dominant_color() {
        let entries = vec![
            entry("car", "red", [250, 0, 0], 0.9),
            entry("car", "blue", [0, 0, 250], 0.5),
            entry("car", "blue", [0, 0, 240], 0.6),
        ];
        let result = aggregate(&entries);
        assert_eq!(result.colors.get("car"), Some("blue"));
    }

    #[test]
    fn reported_rgb_comes_from_highest_single_score() {
        let entries = vec![
            entry("car", "red", [250, 0, 0], 0.9),
            entry("car", "blue", [0, 0, 250], 0.5),
            entry("car", "blue", [0, 0, 240], 0.6),
        ];
        let result = aggregate(&entries);
        assert_eq!(result.rgb_for("car"), Some(Rgb::new(250, 0, 0)));
    }

    #[test]
    fn ties_keep_first_seen_color() {
        let entries = vec![
            entry("tree", "green", [0, 200, 0], 0.5),
            entry("tree", "brown", [160, 40, 40], 0.5),
        ];
        assert_eq!(aggregate(&entries).colors.get("tree"), Some("green"));

        let entries = vec![
            entry("tree", "brown", [160, 40, 40], 0.5),
            entry("tree", "green", [0, 200, 0], 0.5),
        ];
        let result = aggregate(&entries);
        assert_eq!(result.colors.get("tree"), Some("brown"));
        assert_eq!(result.rgb_for("tree"), Some(Rgb::new(160, 40, 40)));
    }

    #[test]
    fn labels_are_grouped_case_insensitively() {
        let entries = vec![
            entry("Lantern", "red", [255, 0, 0], 0.4),
            entry("LANTERN", "gold", [255, 215, 0], 0.3),
            entry("lantern", "gold", [255, 210, 0], 0.3),
        ];
        let result = aggregate(&entries);
        assert_eq!(result.colors.len(), 1);
        assert_eq!(result.colors.get("lantern"), Some("gold"));
    }

    #[test]
    fn color_names_are_compared_exactly() {
        let entries = vec![
            entry("car", "Red", [255, 0, 0], 0.4),
            entry("car", "red", [255, 0, 0], 0.3),
            entry("car", "red", [255, 0, 0], 0.3),
        ];
        assert_eq!(aggregate(&entries).colors.get("car"), Some("red"));
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let input = r#"{"entries": [
            {"class": "boat", "dominant_rgb": [10, 10, 120], "score": 0.7}
        ]}"#;
        assert!(matches!(
            parse_reference(input),
            Err(ReferenceError::Parse(_))
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let input = r#"{"entries": [
            {"class": "boat", "dominant_name": "navy", "dominant_rgb": [0, 0, 128], "score": 0.7},
            {"class": "sail", "dominant_name": "  ", "dominant_rgb": [250, 250, 250], "score": 0.2}
        ]}"#;
        assert!(matches!(
            parse_reference(input),
            Err(ReferenceError::BlankColorName { index: 1, .. })
        ));
    }

    #[test]
    fn padded_name_is_kept_verbatim() {
        let input = r#"{"entries": [
            {"class": "car", "dominant_name": " red ", "dominant_rgb": [255, 0, 0], "score": 0.9}
        ]}"#;
        let file = parse_reference(input).unwrap();
        assert_eq!(aggregate(&file.entries).colors.get("car"), Some(" red "));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let entries = vec![
            entry("a", "red", [255, 0, 0], 0.2),
            entry("b", "blue", [0, 0, 255], 0.2),
            entry("a", "pink", [255, 192, 203], 0.2),
            entry("c", "gray", [128, 128, 128], 0.0),
        ];
        let first = aggregate(&entries);
        for _ in 0..10 {
            assert_eq!(aggregate(&entries), first);
        }
        let labels: Vec<&str> = first.colors.labels().collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_entries_give_empty_mapping() {
        let file = parse_reference(r#"{"entries": []}"#).unwrap();
        assert!(aggregate(&file.entries).is_empty());
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            parse_reference("not json"),
            Err(ReferenceError::Parse(_))
        ));
        assert!(matches!(
            parse_reference(r#"{"items": []}"#),
            Err(ReferenceError::Parse(_))
        ));
        assert!(matches!(
            parse_reference(
                r#"{"entries": [{"class": "x", "dominant_name": "red", "dominant_rgb": [300, 0, 0], "score": 1.0}]}"#
            ),
            Err(ReferenceError::Parse(_))
        ));
    }

    #[test]
    fn negative_scores_are_rejected() {
        let input = r#"{"entries": [
            {"class": "x", "dominant_name": "red", "dominant_rgb": [255, 0, 0], "score": -0.5}
        ]}"#;
        assert!(matches!(
            parse_reference(input),
            Err(ReferenceError::InvalidScore { index: 0, .. })
        ));
    }

    #[test]
    fn load_reference_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_reference(&dir.path().join("absent.colors.json")).unwrap_err();
        assert!(matches!(err, ReferenceError::Io(_)));
    }
}
