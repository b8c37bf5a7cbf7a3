//! # Types
//!
//! Data structures owned by the round contract.
//!
//! ## Config / mutable-state split
//!
//! A round is stored as several independent ledger entries rather than one
//! struct:
//!
//! - [`RoundConfig`] — written once at initialization; never mutated
//!   (token, strategy bindings, owning program).
//! - `RoundSchedule`, the three metadata pointers, `match_amount` and the
//!   ready-for-payout latch — each its own entry, mutated independently.
//!
//! Schedule updates are the hot mutation path; keeping them in a small entry
//! avoids rewriting the strategy bindings on every timestamp change. The
//! public API exposes the reconstructed [`RoundDetails`] view.
//!
//! ## Derived phases
//!
//! The round never stores a phase enum. "Accepting applications" and
//! "voting" are derived from the schedule at call time and evaluated
//! independently — the two windows may overlap or be disjoint.

use shared::{MetadataPointer, RoundSchedule};
use soroban_sdk::{contracttype, Address, BytesN};

/// Immutable round configuration, written once by `initialize`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundConfig {
    /// Token custodying the match funds.
    pub token: Address,
    /// Bound voting strategy contract.
    pub voting_strategy: Address,
    /// Bound payout strategy contract.
    pub payout_strategy: Address,
    /// Owning program in the program registry.
    pub program_id: u64,
}

/// One application submission. Append-only: resubmitting for the same
/// project creates a new record; the log retains both.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Application {
    pub applicant: Address,
    pub project_id: BytesN<32>,
    pub meta: MetadataPointer,
    pub submitted_at: u64,
}

/// Full round view, reconstructed from the split storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundDetails {
    pub token: Address,
    pub voting_strategy: Address,
    pub payout_strategy: Address,
    pub program_id: u64,
    pub schedule: RoundSchedule,
    pub round_meta: MetadataPointer,
    pub application_meta: MetadataPointer,
    pub projects_meta: MetadataPointer,
    pub match_amount: i128,
    pub ready_for_payout: bool,
}
