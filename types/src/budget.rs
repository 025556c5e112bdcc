//! Per-day question budget invariant type.
//!
//! Guarantees the five-questions-per-suspect-per-day cap by construction.

/// Remaining questions a suspect will answer on the current day.
///
/// A suspect answers at most [`QuestionBudget::MAX`] questions per day. The
/// budget is derived from the recorded turn count, so it can never drift from
/// the interrogation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionBudget(u8);

impl QuestionBudget {
    pub const MAX: u8 = 5;

    #[must_use]
    pub fn full() -> Self {
        Self(Self::MAX)
    }

    /// Budget left after `turns_recorded` questions have been answered.
    #[must_use]
    pub fn after(turns_recorded: usize) -> Self {
        let spent = u8::try_from(turns_recorded).unwrap_or(u8::MAX);
        Self(Self::MAX.saturating_sub(spent))
    }

    #[must_use]
    pub fn remaining(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_exhausted(self) -> bool {
        self.0 == 0
    }

    /// Consume one question. Returns the decremented budget, or `None` if exhausted.
    #[must_use]
    pub fn take_one(self) -> Option<QuestionBudget> {
        if self.0 > 0 { Some(Self(self.0 - 1)) } else { None }
    }
}
