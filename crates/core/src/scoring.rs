//! Negative-marking scorer.
//!
//! Correct attempts earn the question weight, incorrect attempts lose
//! `weight * penalty_fraction`, unattempted questions contribute nothing. Section and
//! total scores are floored at zero; topic scores are not.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{AnswerSheet, MarkingScheme, Question, QuestionLayout, SectionKey};

/// Bucket for questions without a usable topic label.
pub const FALLBACK_TOPIC: &str = "Other";

const TOPIC_SEPARATOR: &str = " - ";

/// Per-question result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Unattempted,
}

/// Aggregate scores of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub section_scores: BTreeMap<SectionKey, f64>,
    pub total_score: f64,
    pub max_score: f64,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub unattempted_count: u32,
}

/// Analytics for one topic group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub topic: String,
    pub total: u32,
    pub attempted: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    /// Not floored: a weak topic may report a negative score.
    pub score: f64,
}

impl TopicStats {
    fn new(topic: String) -> Self {
        Self {
            topic,
            total: 0,
            attempted: 0,
            correct: 0,
            incorrect: 0,
            unattempted: 0,
            score: 0.0,
        }
    }

    /// Share of the topic's questions answered correctly, in percent.
    #[must_use]
    pub fn correct_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

/// Grouping key for a question: the part before `" - "`, or the whole label.
#[must_use]
pub fn topic_key(question: &Question) -> String {
    let Some(label) = question.topic_label() else {
        return FALLBACK_TOPIC.to_string();
    };
    let head = match label.split_once(TOPIC_SEPARATOR) {
        Some((head, _)) => head.trim(),
        None => label,
    };
    if head.is_empty() {
        label.to_string()
    } else {
        head.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    marking: MarkingScheme,
}

impl ScoringEngine {
    #[must_use]
    pub fn new(marking: MarkingScheme) -> Self {
        Self { marking }
    }

    #[must_use]
    pub fn marking(&self) -> &MarkingScheme {
        &self.marking
    }

    #[must_use]
    pub fn outcome(question: &Question, answers: &AnswerSheet) -> Outcome {
        match answers.get(&question.id) {
            Some(value) if value.is_attempted() => {
                if value.matches(question.correct_answer.as_ref()) {
                    Outcome::Correct
                } else {
                    Outcome::Incorrect
                }
            }
            _ => Outcome::Unattempted,
        }
    }

    /// Signed contribution of one question to its section.
    #[must_use]
    pub fn contribution(&self, question: &Question, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Correct => self.marking.weight_of(question),
            Outcome::Incorrect => -self.marking.penalty_of(question),
            Outcome::Unattempted => 0.0,
        }
    }

    /// Score a flattened layout; every section in the layout gets an entry.
    #[must_use]
    pub fn score_layout(&self, layout: &QuestionLayout, answers: &AnswerSheet) -> ScoreCard {
        let mut card = self.score(layout.questions(), &layout.section_keys(), answers);
        for span in layout.spans() {
            card.section_scores.entry(span.key).or_insert(0.0);
        }
        card
    }

    /// Score `questions`, where `sections[i]` is the section of `questions[i]`.
    #[must_use]
    pub fn score(
        &self,
        questions: &[Question],
        sections: &[SectionKey],
        answers: &AnswerSheet,
    ) -> ScoreCard {
        let mut raw: BTreeMap<SectionKey, f64> = BTreeMap::new();
        let mut max_score = 0.0;
        let mut correct_count = 0_u32;
        let mut incorrect_count = 0_u32;
        let mut attempted = 0_u32;

        for (question, key) in questions.iter().zip(sections.iter().copied()) {
            let outcome = Self::outcome(question, answers);
            *raw.entry(key).or_insert(0.0) += self.contribution(question, outcome);
            max_score += self.marking.weight_of(question);

            match outcome {
                Outcome::Correct => {
                    correct_count += 1;
                    attempted += 1;
                }
                Outcome::Incorrect => {
                    incorrect_count += 1;
                    attempted += 1;
                }
                Outcome::Unattempted => {}
            }
        }

        let section_scores: BTreeMap<SectionKey, f64> = raw
            .into_iter()
            .map(|(key, score)| (key, score.max(0.0)))
            .collect();
        let total_score = section_scores.values().sum::<f64>().max(0.0);
        // Counts absent and empty answers alike, so the three counts always sum to the total.
        let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);

        ScoreCard {
            section_scores,
            total_score,
            max_score,
            correct_count,
            incorrect_count,
            unattempted_count: total.saturating_sub(attempted),
        }
    }

    /// Group questions by topic and sort by correct percentage, then question count.
    #[must_use]
    pub fn topic_breakdown(&self, questions: &[Question], answers: &AnswerSheet) -> Vec<TopicStats> {
        let mut order: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<TopicStats> = Vec::new();

        for question in questions {
            let key = topic_key(question);
            let index = *order.entry(key.clone()).or_insert_with(|| {
                groups.push(TopicStats::new(key));
                groups.len() - 1
            });
            let stats = &mut groups[index];
            let outcome = Self::outcome(question, answers);

            stats.total += 1;
            match outcome {
                Outcome::Correct => {
                    stats.attempted += 1;
                    stats.correct += 1;
                }
                Outcome::Incorrect => {
                    stats.attempted += 1;
                    stats.incorrect += 1;
                }
                Outcome::Unattempted => stats.unattempted += 1,
            }
            stats.score += self.contribution(question, outcome);
        }

        groups.sort_by(|a, b| {
            b.correct_percentage()
                .partial_cmp(&a.correct_percentage())
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.total.cmp(&a.total))
        });
        groups
    }
}
