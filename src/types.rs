//! Shared domain types: the three test types and the binary condition label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::BrainError;

/// Disease category, each backed by its own independently trained model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "Alzheimer's", alias = "alzheimer")]
    Alzheimers,
    #[serde(rename = "Brain Stroke", alias = "brain_stroke")]
    BrainStroke,
    #[serde(rename = "Tumor", alias = "tumor")]
    Tumor,
}

impl TestType {
    /// Selector order shown on the classify page
    pub const ALL: [TestType; 3] = [TestType::Alzheimers, TestType::BrainStroke, TestType::Tumor];

    /// Display label, identical to the selector option text
    pub fn label(&self) -> &'static str {
        match self {
            TestType::Alzheimers => "Alzheimer's",
            TestType::BrainStroke => "Brain Stroke",
            TestType::Tumor => "Tumor",
        }
    }

    /// Stable identifier used in URLs, form values and config keys
    pub fn slug(&self) -> &'static str {
        match self {
            TestType::Alzheimers => "alzheimer",
            TestType::BrainStroke => "brain_stroke",
            TestType::Tumor => "tumor",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TestType {
    type Err = BrainError;

    /// Accepts either the display label or the slug, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        TestType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(needle) || t.slug().eq_ignore_ascii_case(needle))
            .ok_or_else(|| BrainError::InvalidInput(format!("Unknown test type: '{}'", s)))
    }
}

/// Binary outcome of a single inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionLabel {
    Positive,
    Negative,
}

impl ConditionLabel {
    /// Class index 1 is the positive class
    pub fn from_class_index(index: usize) -> Self {
        if index == 1 {
            ConditionLabel::Positive
        } else {
            ConditionLabel::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionLabel::Positive => "Condition Positive",
            ConditionLabel::Negative => "Condition Negative",
        }
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionLabel {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Condition Positive" | "positive" => Ok(ConditionLabel::Positive),
            "Condition Negative" | "negative" => Ok(ConditionLabel::Negative),
            other => Err(BrainError::InvalidInput(format!("Unknown prediction: '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parses_label_and_slug() {
        assert_eq!("Tumor".parse::<TestType>().unwrap(), TestType::Tumor);
        assert_eq!("brain_stroke".parse::<TestType>().unwrap(), TestType::BrainStroke);
        assert_eq!("alzheimer's".parse::<TestType>().unwrap(), TestType::Alzheimers);
        assert!("Migraine".parse::<TestType>().is_err());
    }

    #[test]
    fn test_type_serde_uses_labels() {
        let json = serde_json::to_string(&TestType::Alzheimers).unwrap();
        assert_eq!(json, "\"Alzheimer's\"");
        let back: TestType = serde_json::from_str("\"Brain Stroke\"").unwrap();
        assert_eq!(back, TestType::BrainStroke);
    }

    #[test]
    fn test_label_from_class_index() {
        assert_eq!(ConditionLabel::from_class_index(1), ConditionLabel::Positive);
        assert_eq!(ConditionLabel::from_class_index(0), ConditionLabel::Negative);
        assert_eq!(ConditionLabel::Positive.to_string(), "Condition Positive");
    }
}
