//! # Shared Types
//!
//! Value types passed between the grant-round contracts. Everything here is
//! plain data: the [`MetadataPointer`] indirection, the [`RoundSchedule`]
//! window configuration, and the [`RoundParams`] bundle the factory forwards
//! untouched to `Round::initialize`.
//!
//! Schedule *validation* lives in the round contract — these types carry no
//! logic so that every contract crate can depend on them without pulling in
//! round semantics.

#![no_std]

use soroban_sdk::{contracttype, Address, String, Vec};

/// Pointer to an off-ledger document.
///
/// `protocol` identifies the resolution scheme (e.g. `1` = IPFS) and
/// `pointer` is the opaque locator. The contracts never inspect either field;
/// resolution is the content-storage client's job. Equality is structural.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetadataPointer {
    pub protocol: u32,
    pub pointer: String,
}

/// The four timestamps defining a round's application and voting windows.
///
/// All times are ledger timestamps (seconds). The windows may overlap or be
/// disjoint; the round evaluates them independently.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundSchedule {
    /// Applications accepted from this time (inclusive).
    pub apps_start: u64,
    /// Applications accepted until this time (exclusive).
    pub apps_end: u64,
    /// Votes accepted from this time (inclusive).
    pub round_start: u64,
    /// Votes accepted until this time (exclusive); the round ends here.
    pub round_end: u64,
}

/// Everything `Round::initialize` needs, bundled so the factory can pass it
/// through without unpacking.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundParams {
    /// Token custodying the match funds.
    pub token: Address,
    pub schedule: RoundSchedule,
    /// Bound voting strategy contract.
    pub voting_strategy: Address,
    /// Bound payout strategy contract.
    pub payout_strategy: Address,
    /// Pointer to the round document.
    pub round_meta: MetadataPointer,
    /// Pointer to the application form schema.
    pub application_meta: MetadataPointer,
    /// Pointer to the approved-projects document.
    pub projects_meta: MetadataPointer,
    /// Owning program in the program registry.
    pub program_id: u64,
    /// Initial ADMIN set; must be non-empty.
    pub admins: Vec<Address>,
    /// Initial OPERATOR set.
    pub operators: Vec<Address>,
}
