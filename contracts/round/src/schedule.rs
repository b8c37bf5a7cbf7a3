//! # Schedule validation
//!
//! The four invariants every round schedule must satisfy, checked at
//! initialization and re-checked in full on every single-timestamp update:
//!
//! 1. `apps_start < apps_end` — the application window is non-empty.
//! 2. `apps_end <= round_end` — applications close no later than the round.
//! 3. `round_start < round_end` — the voting window is non-empty.
//! 4. `apps_start <= round_start` — voting never opens before applications.
//!
//! Violations panic with the error naming the violated invariant, so a
//! caller always learns which timestamp to fix.

use shared::RoundSchedule;
use soroban_sdk::{panic_with_error, Env};

use crate::Error;

/// Selector for one of the four schedule timestamps, tying together the
/// field accessed and the event topic announcing its update.
#[derive(Clone, Copy)]
pub enum TimeField {
    AppsStart,
    AppsEnd,
    RoundStart,
    RoundEnd,
}

impl TimeField {
    /// Event topic announcing an update of this field.
    pub fn topic(self) -> &'static str {
        match self {
            TimeField::AppsStart => "apps_start",
            TimeField::AppsEnd => "apps_end",
            TimeField::RoundStart => "round_start",
            TimeField::RoundEnd => "round_end",
        }
    }

    pub fn get(self, s: &RoundSchedule) -> u64 {
        match self {
            TimeField::AppsStart => s.apps_start,
            TimeField::AppsEnd => s.apps_end,
            TimeField::RoundStart => s.round_start,
            TimeField::RoundEnd => s.round_end,
        }
    }

    pub fn set(self, s: &mut RoundSchedule, value: u64) {
        match self {
            TimeField::AppsStart => s.apps_start = value,
            TimeField::AppsEnd => s.apps_end = value,
            TimeField::RoundStart => s.round_start = value,
            TimeField::RoundEnd => s.round_end = value,
        }
    }
}

/// Validate the full invariant set against a proposed schedule.
pub fn validate(env: &Env, s: &RoundSchedule) {
    if s.apps_start >= s.apps_end {
        panic_with_error!(env, Error::ApplicationsWindowInvalid);
    }
    if s.round_start >= s.round_end {
        panic_with_error!(env, Error::RoundWindowInvalid);
    }
    if s.apps_end > s.round_end || s.apps_start > s.round_start {
        panic_with_error!(env, Error::StartAfterEnd);
    }
}

/// Reject a timestamp strictly in the past.
///
/// Applied to `apps_start` at initialization and to the proposed new value
/// on every schedule update.
pub fn require_not_passed(env: &Env, time: u64) {
    if time < env.ledger().timestamp() {
        panic_with_error!(env, Error::AlreadyPassed);
    }
}

/// True while `apps_start <= now < apps_end`.
pub fn accepting_applications(env: &Env, s: &RoundSchedule) -> bool {
    let now = env.ledger().timestamp();
    s.apps_start <= now && now < s.apps_end
}

/// True while `round_start <= now < round_end`.
pub fn voting_open(env: &Env, s: &RoundSchedule) -> bool {
    let now = env.ledger().timestamp();
    s.round_start <= now && now < s.round_end
}

/// True once `now >= round_end`.
pub fn round_ended(env: &Env, s: &RoundSchedule) -> bool {
    env.ledger().timestamp() >= s.round_end
}
