//! # Events
//!
//! Every mutation the round performs is mirrored by exactly one event; the
//! off-chain indexer reconstructs its read model from this stream alone, so
//! the topic symbols and data shapes here are a wire contract.
//!
//! | Topic           | Extra topic      | Data                      |
//! |-----------------|------------------|---------------------------|
//! | `round_init`    | —                | [`RoundInitialized`]      |
//! | `application`   | `project_id`     | [`NewApplication`]        |
//! | `round_meta`    | —                | [`MetaPtrUpdated`]        |
//! | `app_meta`      | —                | [`MetaPtrUpdated`]        |
//! | `projects_meta` | —                | [`MetaPtrUpdated`]        |
//! | `apps_start`    | —                | [`TimeUpdated`]           |
//! | `apps_end`      | —                | [`TimeUpdated`]           |
//! | `round_start`   | —                | [`TimeUpdated`]           |
//! | `round_end`     | —                | [`TimeUpdated`]           |
//! | `match_amount`  | —                | [`MatchAmountUpdated`]    |
//! | `escrow`        | —                | [`FundsEscrowed`]         |
//!
//! Update events always carry `(old, new)` so consumers can validate their
//! current view before overwriting it.

use shared::{MetadataPointer, RoundSchedule};
use soroban_sdk::{contracttype, Address, BytesN, Env, Symbol};

/// Carries the full initial configuration so the read model never has to
/// reconstruct it from later update events.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundInitialized {
    pub program_id: u64,
    pub token: Address,
    pub voting_strategy: Address,
    pub payout_strategy: Address,
    pub schedule: RoundSchedule,
    pub round_meta: MetadataPointer,
    pub application_meta: MetadataPointer,
    pub projects_meta: MetadataPointer,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewApplication {
    pub project_id: BytesN<32>,
    pub meta: MetadataPointer,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetaPtrUpdated {
    pub old: MetadataPointer,
    pub new: MetadataPointer,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeUpdated {
    pub old: u64,
    pub new: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchAmountUpdated {
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsEscrowed {
    pub amount: i128,
    pub destination: Address,
}

pub fn round_initialized(env: &Env, data: RoundInitialized) {
    env.events()
        .publish((Symbol::new(env, "round_init"),), data);
}

pub fn new_application(env: &Env, data: NewApplication) {
    env.events().publish(
        (Symbol::new(env, "application"), data.project_id.clone()),
        data,
    );
}

/// `topic` is one of `round_meta`, `app_meta`, `projects_meta`.
pub fn meta_updated(env: &Env, topic: &str, old: MetadataPointer, new: MetadataPointer) {
    env.events()
        .publish((Symbol::new(env, topic),), MetaPtrUpdated { old, new });
}

/// `topic` is one of `apps_start`, `apps_end`, `round_start`, `round_end`.
pub fn time_updated(env: &Env, topic: &str, old: u64, new: u64) {
    env.events()
        .publish((Symbol::new(env, topic),), TimeUpdated { old, new });
}

pub fn match_amount_updated(env: &Env, amount: i128) {
    env.events().publish(
        (Symbol::new(env, "match_amount"),),
        MatchAmountUpdated { amount },
    );
}

pub fn funds_escrowed(env: &Env, amount: i128, destination: Address) {
    env.events().publish(
        (Symbol::new(env, "escrow"),),
        FundsEscrowed {
            amount,
            destination,
        },
    );
}
