use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a question, unique within an assessment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a single exam attempt (one submission of one session).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generates a fresh random `AttemptId`
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

/// Role tag of an assessment section.
///
/// The set is closed: sections are concatenated in the order of [`SectionKey::ORDER`]
/// and never discovered from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Aptitude,
    Core,
}

impl SectionKey {
    /// Declared section order used to flatten an assessment.
    pub const ORDER: [SectionKey; 2] = [SectionKey::Aptitude, SectionKey::Core];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Aptitude => "aptitude",
            SectionKey::Core => "core",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSectionKey(pub String);

impl fmt::Display for UnknownSectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section key: {}", self.0)
    }
}

impl std::error::Error for UnknownSectionKey {}

impl FromStr for SectionKey {
    type Err = UnknownSectionKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "aptitude" => Ok(SectionKey::Aptitude),
            "core" => Ok(SectionKey::Core),
            other => Err(UnknownSectionKey(other.to_string())),
        }
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for QuestionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_order_is_aptitude_then_core() {
        assert_eq!(SectionKey::ORDER, [SectionKey::Aptitude, SectionKey::Core]);
    }

    #[test]
    fn section_key_parses_known_tags() {
        assert_eq!("core".parse::<SectionKey>().unwrap(), SectionKey::Core);
        assert_eq!(" aptitude ".parse::<SectionKey>().unwrap(), SectionKey::Aptitude);
        let err = "physics".parse::<SectionKey>().unwrap_err();
        assert_eq!(err, UnknownSectionKey("physics".into()));
    }

    #[test]
    fn question_id_serializes_as_plain_string() {
        let id = QuestionId::new("q1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"q1\"");
        assert_eq!(format!("{id:?}"), "QuestionId(q1)");
    }
}
