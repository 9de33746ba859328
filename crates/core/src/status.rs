use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Palette state of one question. The two flags are independent axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStatus {
    pub answered: bool,
    pub marked_for_review: bool,
}

/// Combined view of both flags, for palette colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    NotAnswered,
    Answered,
    MarkedForReview,
    AnsweredAndMarked,
}

impl QuestionStatus {
    #[must_use]
    pub fn kind(self) -> StatusKind {
        match (self.answered, self.marked_for_review) {
            (false, false) => StatusKind::NotAnswered,
            (true, false) => StatusKind::Answered,
            (false, true) => StatusKind::MarkedForReview,
            (true, true) => StatusKind::AnsweredAndMarked,
        }
    }
}

/// Per-position status keyed by 1-based question position.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    statuses: BTreeMap<usize, QuestionStatus>,
}

impl StatusTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `answered`; `marked_for_review` is left as is.
    pub fn on_answered(&mut self, position: usize) -> QuestionStatus {
        let status = self.statuses.entry(position).or_default();
        status.answered = true;
        *status
    }

    /// Flip `marked_for_review`; `answered` is left as is.
    pub fn toggle_review_mark(&mut self, position: usize) -> QuestionStatus {
        let status = self.statuses.entry(position).or_default();
        status.marked_for_review = !status.marked_for_review;
        *status
    }

    #[must_use]
    pub fn status_of(&self, position: usize) -> QuestionStatus {
        self.statuses.get(&position).copied().unwrap_or_default()
    }

    /// Positions whose status matches `kind`, in ascending order.
    pub fn positions_with(&self, kind: StatusKind) -> impl Iterator<Item = usize> + '_ {
        self.statuses
            .iter()
            .filter(move |(_, status)| status.kind() == kind)
            .map(|(position, _)| *position)
    }

    pub fn clear(&mut self) {
        self.statuses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_positions_default_to_neither_flag() {
        let tracker = StatusTracker::new();
        assert_eq!(tracker.status_of(7), QuestionStatus::default());
        assert_eq!(tracker.status_of(7).kind(), StatusKind::NotAnswered);
    }

    #[test]
    fn flags_are_independent_in_all_four_combinations() {
        let mut tracker = StatusTracker::new();

        // 1: answered only
        tracker.on_answered(1);
        // 2: marked only
        tracker.toggle_review_mark(2);
        // 3: answered then marked
        tracker.on_answered(3);
        tracker.toggle_review_mark(3);
        // 4: marked then answered
        tracker.toggle_review_mark(4);
        tracker.on_answered(4);

        assert_eq!(tracker.status_of(1).kind(), StatusKind::Answered);
        assert_eq!(tracker.status_of(2).kind(), StatusKind::MarkedForReview);
        assert_eq!(tracker.status_of(3).kind(), StatusKind::AnsweredAndMarked);
        assert_eq!(tracker.status_of(4).kind(), StatusKind::AnsweredAndMarked);
        assert_eq!(tracker.status_of(5).kind(), StatusKind::NotAnswered);
    }

    #[test]
    fn unmarking_keeps_answered() {
        let mut tracker = StatusTracker::new();
        tracker.on_answered(1);
        tracker.toggle_review_mark(1);
        let status = tracker.toggle_review_mark(1);
        assert!(status.answered);
        assert!(!status.marked_for_review);
    }

    #[test]
    fn re_answering_keeps_review_mark() {
        let mut tracker = StatusTracker::new();
        tracker.toggle_review_mark(1);
        tracker.on_answered(1);
        let status = tracker.on_answered(1);
        assert!(status.marked_for_review);
    }

    #[test]
    fn positions_with_filters_by_kind() {
        let mut tracker = StatusTracker::new();
        tracker.on_answered(2);
        tracker.toggle_review_mark(5);
        tracker.on_answered(1);
        let answered: Vec<usize> = tracker.positions_with(StatusKind::Answered).collect();
        assert_eq!(answered, [1, 2]);
    }
}
