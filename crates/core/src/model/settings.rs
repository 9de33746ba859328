use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamSettingsError {
    #[error("question weight must be finite and > 0")]
    InvalidWeight,

    #[error("penalty fraction must be in [0, 1]")]
    InvalidPenaltyFraction,

    #[error("exam duration must be > 0 seconds")]
    InvalidDuration,
}

//
// ─── MARKING SCHEME ────────────────────────────────────────────────────────────
//

/// Default weight of every question under the fixed scheme.
pub const DEFAULT_QUESTION_WEIGHT: f64 = 1.5;

/// Default share of the weight lost on an incorrect attempt.
pub const DEFAULT_PENALTY_FRACTION: f64 = 1.0 / 3.0;

/// Default total duration: one global timer of three hours.
pub const DEFAULT_DURATION_SECS: u32 = 3 * 60 * 60;

/// How much a question is worth and what a wrong attempt costs.
///
/// `Fixed` ignores each question's declared `marks`; `Declared` uses them as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum MarkingScheme {
    Fixed { weight: f64, penalty_fraction: f64 },
    Declared { penalty_fraction: f64 },
}

impl MarkingScheme {
    /// Fixed weight with the given penalty fraction.
    ///
    /// # Errors
    ///
    /// Returns `ExamSettingsError` if either value is out of range.
    pub fn fixed(weight: f64, penalty_fraction: f64) -> Result<Self, ExamSettingsError> {
        validate_weight(weight)?;
        validate_penalty(penalty_fraction)?;
        Ok(Self::Fixed {
            weight,
            penalty_fraction,
        })
    }

    /// Declared per-question marks with the given penalty fraction.
    ///
    /// # Errors
    ///
    /// Returns `ExamSettingsError::InvalidPenaltyFraction` if out of range.
    pub fn declared(penalty_fraction: f64) -> Result<Self, ExamSettingsError> {
        validate_penalty(penalty_fraction)?;
        Ok(Self::Declared { penalty_fraction })
    }

    /// Effective weight of `question` under this scheme.
    #[must_use]
    pub fn weight_of(&self, question: &Question) -> f64 {
        match self {
            MarkingScheme::Fixed { weight, .. } => *weight,
            MarkingScheme::Declared { .. } => {
                if question.marks.is_finite() && question.marks > 0.0 {
                    question.marks
                } else {
                    0.0
                }
            }
        }
    }

    #[must_use]
    pub fn penalty_fraction(&self) -> f64 {
        match self {
            MarkingScheme::Fixed {
                penalty_fraction, ..
            }
            | MarkingScheme::Declared { penalty_fraction } => *penalty_fraction,
        }
    }

    /// Amount subtracted for an incorrect attempt on `question`.
    #[must_use]
    pub fn penalty_of(&self, question: &Question) -> f64 {
        self.weight_of(question) * self.penalty_fraction()
    }
}

impl Default for MarkingScheme {
    fn default() -> Self {
        Self::Fixed {
            weight: DEFAULT_QUESTION_WEIGHT,
            penalty_fraction: DEFAULT_PENALTY_FRACTION,
        }
    }
}

fn validate_weight(weight: f64) -> Result<(), ExamSettingsError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(ExamSettingsError::InvalidWeight)
    }
}

fn validate_penalty(fraction: f64) -> Result<(), ExamSettingsError> {
    if fraction.is_finite() && (0.0..=1.0).contains(&fraction) {
        Ok(())
    } else {
        Err(ExamSettingsError::InvalidPenaltyFraction)
    }
}

//
// ─── EXAM SETTINGS ─────────────────────────────────────────────────────────────
//

/// Per-session configuration: total duration and marking scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSettings {
    duration_secs: u32,
    marking: MarkingScheme,
}

impl ExamSettings {
    /// Creates custom exam settings.
    ///
    /// # Errors
    ///
    /// Returns `ExamSettingsError::InvalidDuration` for a zero duration.
    pub fn new(duration_secs: u32, marking: MarkingScheme) -> Result<Self, ExamSettingsError> {
        if duration_secs == 0 {
            return Err(ExamSettingsError::InvalidDuration);
        }
        Ok(Self {
            duration_secs,
            marking,
        })
    }

    /// Settings with an arbitrary duration, including zero.
    ///
    /// A zero duration makes the timer expire immediately on start.
    #[must_use]
    pub fn with_duration_unchecked(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn marking(&self) -> &MarkingScheme {
        &self.marking
    }
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            marking: MarkingScheme::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scheme_costs_half_a_mark_per_wrong_answer() {
        let scheme = MarkingScheme::default();
        let question = Question::numerical("q", "x", None).with_marks(2.0);
        assert!((scheme.weight_of(&question) - 1.5).abs() < 1e-12);
        assert!((scheme.penalty_of(&question) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn declared_scheme_uses_question_marks() {
        let scheme = MarkingScheme::declared(1.0 / 3.0).unwrap();
        let question = Question::numerical("q", "x", None).with_marks(3.0);
        assert!((scheme.weight_of(&question) - 3.0).abs() < 1e-12);
        assert!((scheme.penalty_of(&question) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            MarkingScheme::fixed(0.0, 0.3).unwrap_err(),
            ExamSettingsError::InvalidWeight
        );
        assert_eq!(
            MarkingScheme::fixed(1.0, 1.5).unwrap_err(),
            ExamSettingsError::InvalidPenaltyFraction
        );
        assert_eq!(
            ExamSettings::new(0, MarkingScheme::default()).unwrap_err(),
            ExamSettingsError::InvalidDuration
        );
    }

    #[test]
    fn defaults_run_three_hours() {
        let settings = ExamSettings::default();
        assert_eq!(settings.duration_secs(), 10_800);
        assert_eq!(*settings.marking(), MarkingScheme::default());
    }
}
