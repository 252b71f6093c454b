use crate::mapping::{ReferenceMapping, UserMapping};
use crate::palette::color_similarity;
use serde::Serialize;

/// Credit weights applied while comparing mappings.
pub mod weights {
    /// Label present with exactly the asserted color.
    pub const EXACT: f64 = 1.0;
    /// Scale applied to color similarity when the label is present with another color.
    pub const PARTIAL: f64 = 0.8;
    /// Added to both numerator and denominator per unmatched reference label
    /// whose color the user asserted elsewhere.
    pub const REVERSE_BONUS: f64 = 0.3;
}

/// How one user entry fared against the reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryOutcome {
    Exact,
    Partial {
        reference_color: String,
        similarity: f64,
    },
    Missing,
}

impl EntryOutcome {
    pub fn similarity(&self) -> f64 {
        match self {
            EntryOutcome::Exact => 1.0,
            EntryOutcome::Partial { similarity, .. } => *similarity,
            EntryOutcome::Missing => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryComparison {
    pub label: String,
    pub color: String,
    pub outcome: EntryOutcome,
}

/// Full result of comparing a user mapping with one reference mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Comparison {
    pub score: f64,
    pub entries: Vec<EntryComparison>,
    pub numerator: f64,
    pub denominator: f64,
    pub reverse_bonuses: usize,
}

impl Comparison {
    /// Per-entry similarities in user order.
    pub fn similarities(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.outcome.similarity()).collect()
    }
}

/// Compare `user` against `reference`, keeping the per-entry detail.
pub fn compare(user: &UserMapping, reference: &ReferenceMapping) -> Comparison {
    if user.is_empty() || reference.is_empty() {
        return Comparison::default();
    }

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut entries = Vec::with_capacity(user.len());

    for (label, color) in user.iter() {
        let outcome = match reference.get(&label.to_lowercase()) {
            Some(reference_color) if reference_color == color => {
                numerator += weights::EXACT;
                EntryOutcome::Exact
            }
            Some(reference_color) => {
                let similarity = color_similarity(color, reference_color);
                numerator += weights::PARTIAL * similarity;
                EntryOutcome::Partial {
                    reference_color: reference_color.to_string(),
                    similarity,
                }
            }
            None => EntryOutcome::Missing,
        };
        denominator += 1.0;
        entries.push(EntryComparison {
            label: label.to_string(),
            color: color.to_string(),
            outcome,
        });
    }

    // Unmatched reference labels whose color the user named elsewhere. The
    // bonus lands on both sides of the ratio.
    let mut reverse_bonuses = 0;
    for (reference_label, reference_color) in reference.iter() {
        if !user.contains_normalized_label(reference_label) && user.contains_color(reference_color)
        {
            numerator += weights::REVERSE_BONUS;
            denominator += weights::REVERSE_BONUS;
            reverse_bonuses += 1;
        }
    }

    let score = if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    };

    Comparison {
        score,
        entries,
        numerator,
        denominator,
        reverse_bonuses,
    }
}

/// Score `user` against `reference`, returning the score and per-entry similarities.
pub fn score(user: &UserMapping, reference: &ReferenceMapping) -> (f64, Vec<f64>) {
    let comparison = compare(user, reference);
    let similarities = comparison.similarities();
    (comparison.score, similarities)
}
