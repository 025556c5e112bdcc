//! Interrogation orchestration and case progression for Gumshoe.
//!
//! # Architecture
//!
//! - [`Interrogator`] - the request orchestrator: validates the suspect and
//!   question, assembles the provider prompt from content, and executes the
//!   call under the bounded-retry policy in `gumshoe_providers`.
//! - [`Investigation`] - the session driver: owns one
//!   [`gumshoe_types::CaseRun`] and enforces day/question budgets, clue
//!   unlocking, and accusation finality around the orchestrator's latency
//!   and failure modes.
//!
//! Failures never partially commit: a turn is recorded only after the
//! provider answered, and a day seals only after every clue lookup settled.

mod interrogate;
mod session;

pub use interrogate::{InterrogationError, Interrogator};
pub use session::{Investigation, Verdict};
