use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::QuestionType;

/// Immutable copy of all recorded answers, keyed by question id.
pub type AnswerSheet = BTreeMap<QuestionId, AnswerValue>;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("not a finite number: {0:?}")]
    InvalidNumeric(String),
}

//
// ─── ANSWER VALUE ──────────────────────────────────────────────────────────────
//

/// Raw value recorded for a question.
///
/// Comparison against a [`CorrectAnswer`] is string-normalized: both sides are
/// rendered to text and compared exactly (no case folding, no partial credit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AnswerValue {
    /// Selected option value of a multiple-choice question.
    Choice(String),
    /// Numerical answer type entry.
    Numeric(f64),
    /// Free text entry.
    Text(String),
}

impl AnswerValue {
    #[must_use]
    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice(value.into())
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Parse a numerical entry as typed by the candidate.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::InvalidNumeric` if the input is not a finite number.
    pub fn parse_numeric(input: &str) -> Result<Self, AnswerError> {
        let trimmed = input.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Self::Numeric(value)),
            _ => Err(AnswerError::InvalidNumeric(input.to_string())),
        }
    }

    /// Reject numeric values that cannot be stored and read back (NaN, infinities).
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::InvalidNumeric` for a non-finite numeric value.
    pub fn validate(&self) -> Result<(), AnswerError> {
        match self {
            AnswerValue::Numeric(value) if !value.is_finite() => {
                Err(AnswerError::InvalidNumeric(value.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Question type this value is valid for.
    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerValue::Choice(_) => QuestionType::MultipleChoice,
            AnswerValue::Numeric(_) => QuestionType::Numerical,
            AnswerValue::Text(_) => QuestionType::Text,
        }
    }

    /// String form used for comparisons.
    #[must_use]
    pub fn normalized(&self) -> String {
        match self {
            AnswerValue::Choice(value) | AnswerValue::Text(value) => value.clone(),
            AnswerValue::Numeric(value) => format_number(*value),
        }
    }

    /// An empty value counts as unattempted.
    #[must_use]
    pub fn is_attempted(&self) -> bool {
        match self {
            AnswerValue::Choice(value) | AnswerValue::Text(value) => !value.is_empty(),
            AnswerValue::Numeric(value) => value.is_finite(),
        }
    }

    /// Exact match against the key. A missing key never matches.
    #[must_use]
    pub fn matches(&self, correct: Option<&CorrectAnswer>) -> bool {
        correct.is_some_and(|key| self.normalized() == key.as_str())
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

// Integral values print without a fractional part; -0 prints as 0.
fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

//
// ─── CORRECT ANSWER ────────────────────────────────────────────────────────────
//

/// Answer key of a question, kept in its string-normalized form.
///
/// Deserializes from a JSON string, number or boolean.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CorrectAnswer(String);

impl CorrectAnswer {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn from_number(value: f64) -> Self {
        Self(format_number(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for CorrectAnswer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawScalar::deserialize(deserializer)?;
        Ok(match raw {
            RawScalar::Bool(value) => Self(value.to_string()),
            RawScalar::Number(value) => Self::from_number(value),
            RawScalar::Text(value) => Self(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_normalize_like_plain_numbers() {
        assert_eq!(AnswerValue::Numeric(4.0).normalized(), "4");
        assert_eq!(AnswerValue::Numeric(2.5).normalized(), "2.5");
        assert_eq!(AnswerValue::Numeric(-0.0).normalized(), "0");
    }

    #[test]
    fn matching_is_exact_after_normalization() {
        let key = CorrectAnswer::new("4");
        assert!(AnswerValue::Numeric(4.0).matches(Some(&key)));
        assert!(AnswerValue::choice("4").matches(Some(&key)));
        assert!(!AnswerValue::text("4.0").matches(Some(&key)));

        let key = CorrectAnswer::new("Paris");
        assert!(!AnswerValue::text("paris").matches(Some(&key)));
    }

    #[test]
    fn missing_key_never_matches() {
        assert!(!AnswerValue::choice("a").matches(None));
    }

    #[test]
    fn empty_values_are_unattempted() {
        assert!(!AnswerValue::choice("").is_attempted());
        assert!(!AnswerValue::text("").is_attempted());
        assert!(AnswerValue::text(" ").is_attempted());
    }

    #[test]
    fn parse_numeric_rejects_garbage() {
        assert_eq!(
            AnswerValue::parse_numeric(" 12.5 ").unwrap(),
            AnswerValue::Numeric(12.5)
        );
        assert!(AnswerValue::parse_numeric("abc").is_err());
        assert!(AnswerValue::parse_numeric("inf").is_err());
    }

    #[test]
    fn correct_answer_accepts_json_scalars() {
        let from_number: CorrectAnswer = serde_json::from_str("4").unwrap();
        let from_string: CorrectAnswer = serde_json::from_str("\"4\"").unwrap();
        let from_bool: CorrectAnswer = serde_json::from_str("true").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_bool.as_str(), "true");
    }

    #[test]
    fn answer_value_serializes_as_tagged_union() {
        let json = serde_json::to_string(&AnswerValue::choice("b")).unwrap();
        assert_eq!(json, r#"{"kind":"choice","value":"b"}"#);
        let back: AnswerValue = serde_json::from_str(r#"{"kind":"numeric","value":3}"#).unwrap();
        assert_eq!(back, AnswerValue::Numeric(3.0));
    }
}
