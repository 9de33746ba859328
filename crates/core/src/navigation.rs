use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("question index {index} is out of range (0..{len})")]
    OutOfRange { index: i64, len: usize },
}

/// Outcome of [`NavigationController::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(usize),
    /// Already on the last question. Callers treat this as a submission trigger.
    AtEnd,
}

/// Cursor over a fixed-length question sequence.
#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    current: usize,
    len: usize,
}

impl NavigationController {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { current: 0, len }
    }

    /// 0-based index of the current question.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.len
    }

    pub fn next(&mut self) -> Step {
        if self.current + 1 < self.len {
            self.current += 1;
            Step::Moved(self.current)
        } else {
            Step::AtEnd
        }
    }

    /// Retreat by one; no-op at index 0. Returns the resulting index.
    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// # Errors
    ///
    /// Returns `NavigationError::OutOfRange` and leaves the cursor untouched when
    /// `index` is outside `0..len`.
    pub fn jump_to(&mut self, index: i64) -> Result<usize, NavigationError> {
        match usize::try_from(index) {
            Ok(target) if target < self.len => {
                self.current = target;
                Ok(target)
            }
            _ => Err(NavigationError::OutOfRange {
                index,
                len: self.len,
            }),
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_jumps_are_no_ops() {
        let mut nav = NavigationController::new(4);
        nav.jump_to(2).unwrap();

        assert_eq!(
            nav.jump_to(-1),
            Err(NavigationError::OutOfRange { index: -1, len: 4 })
        );
        assert!(nav.jump_to(4).is_err());
        assert_eq!(nav.current(), 2);
    }

    #[test]
    fn next_at_last_index_does_not_wrap() {
        let mut nav = NavigationController::new(3);
        assert_eq!(nav.next(), Step::Moved(1));
        assert_eq!(nav.next(), Step::Moved(2));
        assert!(nav.is_last());
        assert_eq!(nav.next(), Step::AtEnd);
        assert_eq!(nav.current(), 2);
    }

    #[test]
    fn previous_at_zero_is_a_no_op() {
        let mut nav = NavigationController::new(3);
        assert_eq!(nav.previous(), 0);
        nav.next();
        assert_eq!(nav.previous(), 0);
    }

    #[test]
    fn empty_sequence_rejects_every_jump() {
        let mut nav = NavigationController::new(0);
        assert!(nav.is_empty());
        assert_eq!(nav.next(), Step::AtEnd);
        assert!(nav.jump_to(0).is_err());
    }
}
