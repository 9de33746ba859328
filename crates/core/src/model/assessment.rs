use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::ids::SectionKey;
use crate::model::question::Question;

/// A named, ordered sub-list of questions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Nominal limit in seconds. Exposed for display only; the exam runs one global timer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

/// The fixed set of section slots. A missing slot is an empty section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aptitude: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<Section>,
}

impl Sections {
    #[must_use]
    pub fn get(&self, key: SectionKey) -> Option<&Section> {
        match key {
            SectionKey::Aptitude => self.aptitude.as_ref(),
            SectionKey::Core => self.core.as_ref(),
        }
    }

    pub fn set(&mut self, key: SectionKey, section: Section) {
        match key {
            SectionKey::Aptitude => self.aptitude = Some(section),
            SectionKey::Core => self.core = Some(section),
        }
    }
}

/// Assessment document as supplied by the assessment source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Sections,
}

impl Assessment {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sections: Sections::default(),
        }
    }

    #[must_use]
    pub fn with_section(mut self, key: SectionKey, section: Section) -> Self {
        self.sections.set(key, section);
        self
    }

    /// Concatenate sections in declared order into the flat sequence the engine runs over.
    #[must_use]
    pub fn layout(&self) -> QuestionLayout {
        QuestionLayout::from_sections(&self.sections)
    }
}

/// Position of one section inside the flattened question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    pub key: SectionKey,
    pub title: String,
    pub range: Range<usize>,
    pub time_limit: Option<u32>,
}

impl SectionSpan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Flattened question sequence plus the section boundaries inside it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestionLayout {
    questions: Vec<Question>,
    spans: Vec<SectionSpan>,
}

impl QuestionLayout {
    /// Questions without an id are skipped; absent sections contribute nothing.
    #[must_use]
    pub fn from_sections(sections: &Sections) -> Self {
        let mut questions = Vec::new();
        let mut spans = Vec::with_capacity(SectionKey::ORDER.len());

        for key in SectionKey::ORDER {
            let Some(section) = sections.get(key) else {
                continue;
            };
            let start = questions.len();
            questions.extend(section.questions.iter().filter(|q| q.has_id()).cloned());
            spans.push(SectionSpan {
                key,
                title: section.title.clone(),
                range: start..questions.len(),
                time_limit: section.time_limit,
            });
        }

        Self { questions, spans }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn spans(&self) -> &[SectionSpan] {
        &self.spans
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Section containing the 0-based `index`.
    #[must_use]
    pub fn section_of(&self, index: usize) -> Option<&SectionSpan> {
        self.spans.iter().find(|span| span.range.contains(&index))
    }

    /// Section key for every question, in list order.
    #[must_use]
    pub fn section_keys(&self) -> Vec<SectionKey> {
        let mut keys = Vec::with_capacity(self.questions.len());
        for span in &self.spans {
            keys.extend(std::iter::repeat_n(span.key, span.len()));
        }
        keys
    }
}
