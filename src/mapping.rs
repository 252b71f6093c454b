use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MappingError {
    #[error("malformed pair '{0}', expected label=color")]
    MalformedPair(String),
    #[error("empty label or color in '{0}'")]
    EmptyField(String),
    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),
    #[error("expected a JSON object of label to color name")]
    NotAnObject,
    #[error("color for '{0}' must be a string")]
    NonStringColor(String),
    #[error("invalid JSON: {0}")]
    Json(String),
}

/// Caller-supplied label to color assertions.
///
/// Labels keep their original case for display and entries keep insertion
/// order, which is also the order of per-entry similarities in a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMapping {
    entries: Vec<(String, String)>,
}

impl UserMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, L, C>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (L, C)>,
        L: Into<String>,
        C: Into<String>,
    {
        let mut mapping = Self::new();
        for (label, color) in pairs {
            mapping.insert(label, color)?;
        }
        Ok(mapping)
    }

    /// Parse a JSON object such as `{"skyscraper": "red"}`, keeping key order.
    pub fn from_json_str(input: &str) -> Result<Self, MappingError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| MappingError::Json(e.to_string()))?;
        let object = value.as_object().ok_or(MappingError::NotAnObject)?;

        let mut mapping = Self::new();
        for (label, color) in object {
            let color = color
                .as_str()
                .ok_or_else(|| MappingError::NonStringColor(label.clone()))?;
            mapping.insert(label.as_str(), color)?;
        }
        Ok(mapping)
    }

    pub fn insert(
        &mut self,
        label: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<(), MappingError> {
        let label = label.into();
        let color = color.into();
        if label.trim().is_empty() || color.trim().is_empty() {
            return Err(MappingError::EmptyField(format!("{}={}", label, color)));
        }
        if self.entries.iter().any(|(existing, _)| *existing == label) {
            return Err(MappingError::DuplicateLabel(label));
        }
        self.entries.push((label, color));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any label was asserted with exactly this color string.
    pub fn contains_color(&self, color: &str) -> bool {
        self.entries.iter().any(|(_, c)| c == color)
    }

    /// Whether `label` (already lower-cased) matches any user label ignoring case.
    pub fn contains_normalized_label(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l.to_lowercase() == label)
    }
}

/// Dominant color per label derived from one reference source.
///
/// Labels are stored lower-cased, one color each, in order of first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMapping {
    entries: Vec<(String, String)>,
}

impl ReferenceMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, L, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, C)>,
        L: AsRef<str>,
        C: Into<String>,
    {
        let mut mapping = Self::new();
        for (label, color) in pairs {
            mapping.insert(label.as_ref(), color);
        }
        mapping
    }

    /// Insert or replace the color for `label`; replacing keeps the original position.
    pub fn insert(&mut self, label: &str, color: impl Into<String>) {
        let label = label.to_lowercase();
        let color = color.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = color,
            None => self.entries.push((label, color)),
        }
    }

    /// Color for `label`, which must already be lower-cased.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), c.as_str()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Distinct colors in order of first appearance.
    pub fn distinct_colors(&self) -> Vec<&str> {
        let mut colors: Vec<&str> = Vec::new();
        for (_, color) in &self.entries {
            if !colors.contains(&color.as_str()) {
                colors.push(color);
            }
        }
        colors
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a single `label=color` argument.
pub fn parse_pair(input: &str) -> Result<(String, String), MappingError> {
    let (label, color) = input
        .split_once('=')
        .ok_or_else(|| MappingError::MalformedPair(input.to_string()))?;
    let label = label.trim();
    let color = color.trim();
    if label.is_empty() || color.is_empty() {
        return Err(MappingError::EmptyField(input.to_string()));
    }
    Ok((label.to_string(), color.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pair_trims_whitespace() {
        assert_eq!(
            parse_pair(" skyscraper = red "),
            Ok(("skyscraper".into(), "red".into()))
        );
    }

    #[test]
    fn parse_pair_splits_on_first_equals() {
        assert_eq!(parse_pair("a=b=c"), Ok(("a".into(), "b=c".into())));
    }

    #[test]
    fn parse_pair_errors() {
        assert_eq!(
            parse_pair("lantern"),
            Err(MappingError::MalformedPair("lantern".into()))
        );
        assert_eq!(
            parse_pair("=red"),
            Err(MappingError::EmptyField("=red".into()))
        );
        assert_eq!(
            parse_pair("lantern="),
            Err(MappingError::EmptyField("lantern=".into()))
        );
    }

    #[test]
    fn user_mapping_preserves_order_and_case() {
        let user =
            UserMapping::from_pairs([("Skyscraper", "red"), ("lantern", "gold"), ("Car", "blue")])
                .unwrap();
        let labels: Vec<&str> = user.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Skyscraper", "lantern", "Car"]);
        assert!(user.contains_normalized_label("skyscraper"));
        assert!(!user.contains_normalized_label("Skyscraper"));
    }

    #[test]
    fn user_mapping_rejects_duplicates() {
        let err = UserMapping::from_pairs([("car", "red"), ("car", "blue")]).unwrap_err();
        assert_eq!(err, MappingError::DuplicateLabel("car".into()));

        // Labels differing only in case are distinct keys.
        assert!(UserMapping::from_pairs([("car", "red"), ("Car", "blue")]).is_ok());
    }

    #[test]
    fn contains_color_is_exact() {
        let user = UserMapping::from_pairs([("car", "Red")]).unwrap();
        assert!(user.contains_color("Red"));
        assert!(!user.contains_color("red"));
    }

    #[test]
    fn user_mapping_from_json_keeps_key_order() {
        let user = UserMapping::from_json_str(r#"{"zebra": "white", "apple": "red"}"#).unwrap();
        let labels: Vec<&str> = user.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["zebra", "apple"]);
    }

    #[test]
    fn user_mapping_from_json_errors() {
        assert_eq!(
            UserMapping::from_json_str("[1, 2]"),
            Err(MappingError::NotAnObject)
        );
        assert_eq!(
            UserMapping::from_json_str(r#"{"car": 3}"#),
            Err(MappingError::NonStringColor("car".into()))
        );
        assert!(matches!(
            UserMapping::from_json_str("{"),
            Err(MappingError::Json(_))
        ));
    }

    #[test]
    fn reference_mapping_lowercases_and_replaces_in_place() {
        let mut reference = ReferenceMapping::new();
        reference.insert("Tree", "green");
        reference.insert("car", "blue");
        reference.insert("TREE", "brown");

        assert_eq!(reference.get("tree"), Some("brown"));
        assert_eq!(reference.get("Tree"), None);
        let labels: Vec<&str> = reference.labels().collect();
        assert_eq!(labels, vec!["tree", "car"]);
    }

    #[test]
    fn distinct_colors_in_first_appearance_order() {
        let reference =
            ReferenceMapping::from_pairs([("a", "red"), ("b", "blue"), ("c", "red")]);
        assert_eq!(reference.distinct_colors(), vec!["red", "blue"]);
    }
}
