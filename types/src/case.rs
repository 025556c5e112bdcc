//! The case-progression state machine.
//!
//! A [`CaseRun`] is the aggregate root for one playthrough: it owns every
//! [`DaySession`] and [`Clue`], tracks the current phase, and guards every
//! transition. It performs no IO; the engine crate drives it and supplies the
//! provider answers and clue text.
//!
//! Phases advance monotonically:
//!
//! ```text
//! Intro -> Investigating(1) -> Investigating(2) -> Investigating(3)
//!       -> FinalAccusation -> Resolved
//! ```
//!
//! There is no path back from `Resolved`; "play again" replaces the whole
//! value with [`CaseRun::new`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{QuestionBudget, SuspectKey};

/// Number of in-game days per run.
pub const TOTAL_DAYS: u8 = 3;

/// Number of top suspects that must be named to end a day.
pub const TOP_SUSPECT_COUNT: usize = 3;

/// One question/answer exchange with a suspect.
///
/// Created only by a successful orchestrator call and never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterrogationTurn {
    pub suspect: SuspectKey,
    pub question: String,
    pub answer: String,
    pub asked_at: SystemTime,
}

impl InterrogationTurn {
    #[must_use]
    pub fn new(suspect: SuspectKey, question: String, answer: String) -> Self {
        Self {
            suspect,
            question,
            answer,
            asked_at: SystemTime::now(),
        }
    }
}

/// A piece of evidence unlocked by naming a suspect at day end.
///
/// Once created it is permanent and visible for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub day: u8,
    pub suspect: SuspectKey,
    pub text: String,
    pub discovered: bool,
}

/// One in-game day: who was interviewed, what was asked, and (once sealed)
/// which three suspects the player flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySession {
    day: u8,
    interviewed: BTreeSet<SuspectKey>,
    turns: BTreeMap<SuspectKey, Vec<InterrogationTurn>>,
    top_suspects: Option<Vec<SuspectKey>>,
}

impl DaySession {
    fn new(day: u8) -> Self {
        Self {
            day,
            interviewed: BTreeSet::new(),
            turns: BTreeMap::new(),
            top_suspects: None,
        }
    }

    #[must_use]
    pub fn day(&self) -> u8 {
        self.day
    }

    /// A day is sealed once its top-suspect selection has been submitted.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.top_suspects.is_some()
    }

    #[must_use]
    pub fn interviewed(&self) -> &BTreeSet<SuspectKey> {
        &self.interviewed
    }

    #[must_use]
    pub fn turns_for(&self, suspect: &SuspectKey) -> &[InterrogationTurn] {
        self.turns.get(suspect).map_or(&[], Vec::as_slice)
    }

    /// Questions the suspect will still answer today.
    #[must_use]
    pub fn budget_for(&self, suspect: &SuspectKey) -> QuestionBudget {
        QuestionBudget::after(self.turns_for(suspect).len())
    }

    #[must_use]
    pub fn top_suspects(&self) -> Option<&[SuspectKey]> {
        self.top_suspects.as_deref()
    }
}

/// Where a [`CaseRun`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasePhase {
    /// Initial phase; no day has begun.
    Intro,
    /// Interrogations are open for the given day (1-based).
    Investigating { day: u8 },
    /// All three days are sealed; awaiting the single accusation.
    FinalAccusation,
    /// Terminal. Only a full reset leaves this phase.
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    #[error("the investigation has already begun")]
    AlreadyStarted,
    #[error("no investigation is in progress")]
    NotInvestigating,
    #[error("{suspect} will not answer any more questions today")]
    BudgetExceeded { suspect: SuspectKey },
    #[error("exactly {TOP_SUSPECT_COUNT} top suspects are required, got {got}")]
    WrongTopSuspectCount { got: usize },
    #[error("top suspects must be distinct: {suspect} was named twice")]
    DuplicateTopSuspect { suspect: SuspectKey },
    #[error("no accusation is being accepted right now")]
    NotAwaitingAccusation,
    #[error("the accusation has already been made")]
    AlreadyResolved,
}

/// The aggregate root for one playthrough.
///
/// Exclusively owns its day sessions and clues. An explicit value with no
/// hidden globals: callers hold it directly (or behind their own lock), so
/// multiple concurrent runs need no redesign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRun {
    phase: CasePhase,
    sessions: Vec<DaySession>,
    clues: Vec<Clue>,
    accusation: Option<SuspectKey>,
}

impl CaseRun {
    /// A fresh run at `Intro` with no history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: CasePhase::Intro,
            sessions: Vec::new(),
            clues: Vec::new(),
            accusation: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> CasePhase {
        self.phase
    }

    /// The day currently under investigation, if any.
    #[must_use]
    pub fn current_day(&self) -> Option<u8> {
        match self.phase {
            CasePhase::Investigating { day } => Some(day),
            _ => None,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &[DaySession] {
        &self.sessions
    }

    #[must_use]
    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    #[must_use]
    pub fn accusation(&self) -> Option<&SuspectKey> {
        self.accusation.as_ref()
    }

    /// Begin day 1. Valid only from `Intro`.
    pub fn begin(&mut self) -> Result<(), CaseError> {
        if self.phase != CasePhase::Intro {
            return Err(CaseError::AlreadyStarted);
        }
        self.sessions.push(DaySession::new(1));
        self.phase = CasePhase::Investigating { day: 1 };
        Ok(())
    }

    fn current_session(&self) -> Result<&DaySession, CaseError> {
        match self.phase {
            CasePhase::Investigating { .. } => {
                self.sessions.last().ok_or(CaseError::NotInvestigating)
            }
            _ => Err(CaseError::NotInvestigating),
        }
    }

    fn current_session_mut(&mut self) -> Result<&mut DaySession, CaseError> {
        match self.phase {
            CasePhase::Investigating { .. } => {
                self.sessions.last_mut().ok_or(CaseError::NotInvestigating)
            }
            _ => Err(CaseError::NotInvestigating),
        }
    }

    /// Check the ask guard without recording anything.
    ///
    /// The engine calls this before contacting the provider so that an
    /// exhausted budget never costs a network round trip.
    pub fn ensure_can_ask(&self, suspect: &SuspectKey) -> Result<(), CaseError> {
        let session = self.current_session()?;
        if session.budget_for(suspect).is_exhausted() {
            return Err(CaseError::BudgetExceeded {
                suspect: suspect.clone(),
            });
        }
        Ok(())
    }

    /// Append a completed turn to the current day's log.
    ///
    /// Re-checks the guard so a racing caller cannot overrun the budget.
    pub fn record_turn(&mut self, turn: InterrogationTurn) -> Result<(), CaseError> {
        self.ensure_can_ask(&turn.suspect)?;
        let session = self.current_session_mut()?;
        session.turns.entry(turn.suspect.clone()).or_default().push(turn);
        Ok(())
    }

    /// Add a suspect to today's interviewed set. Idempotent, informational.
    pub fn mark_interviewed(&mut self, suspect: SuspectKey) -> Result<(), CaseError> {
        let session = self.current_session_mut()?;
        session.interviewed.insert(suspect);
        Ok(())
    }

    /// Validate a top-suspect selection without committing it.
    pub fn validate_top_suspects(&self, top: &[SuspectKey]) -> Result<(), CaseError> {
        self.current_session()?;
        if top.len() != TOP_SUSPECT_COUNT {
            return Err(CaseError::WrongTopSuspectCount { got: top.len() });
        }
        let mut seen = BTreeSet::new();
        for suspect in top {
            if !seen.insert(suspect) {
                return Err(CaseError::DuplicateTopSuspect {
                    suspect: suspect.clone(),
                });
            }
        }
        Ok(())
    }

    /// Seal the current day with its top suspects and unlocked clues, then
    /// advance to the next day or to `FinalAccusation`.
    ///
    /// The caller must have settled all clue lookups first; this commits the
    /// whole transition atomically so a failed lookup never half-seals a day.
    pub fn seal_day(&mut self, top: Vec<SuspectKey>, clues: Vec<Clue>) -> Result<(), CaseError> {
        self.validate_top_suspects(&top)?;
        let day = self.current_day().ok_or(CaseError::NotInvestigating)?;

        let session = self.current_session_mut()?;
        session.top_suspects = Some(top);
        self.clues.extend(clues);

        if day < TOTAL_DAYS {
            self.sessions.push(DaySession::new(day + 1));
            self.phase = CasePhase::Investigating { day: day + 1 };
        } else {
            self.phase = CasePhase::FinalAccusation;
        }
        Ok(())
    }

    /// Record the terminal accusation. Valid exactly once per run.
    pub fn accuse(&mut self, suspect: SuspectKey) -> Result<(), CaseError> {
        match self.phase {
            CasePhase::FinalAccusation => {
                self.accusation = Some(suspect);
                self.phase = CasePhase::Resolved;
                Ok(())
            }
            CasePhase::Resolved => Err(CaseError::AlreadyResolved),
            _ => Err(CaseError::NotAwaitingAccusation),
        }
    }
}

impl Default for CaseRun {
    fn default() -> Self {
        Self::new()
    }
}
