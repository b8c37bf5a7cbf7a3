//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the round.
//!
//! ## Instance storage (round-lifetime TTL)
//!
//! | Key              | Type              | Description                      |
//! |------------------|-------------------|----------------------------------|
//! | `Initialized`    | `bool`            | One-time initialization guard    |
//! | `Config`         | `RoundConfig`     | Immutable bindings               |
//! | `Schedule`       | `RoundSchedule`   | The four window timestamps       |
//! | `RoundMeta`      | `MetadataPointer` | Round document pointer           |
//! | `ApplicationMeta`| `MetadataPointer` | Application form pointer         |
//! | `ProjectsMeta`   | `MetadataPointer` | Approved-projects pointer        |
//! | `MatchAmount`    | `i128`            | Committed match funds            |
//! | `ReadyForPayout` | `bool`            | Escrow handshake latch           |
//! | `AppCount`       | `u32`             | Append-only application counter  |
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                | Type          | Description                        |
//! |--------------------|---------------|------------------------------------|
//! | `Application(n)`   | `Application` | The n-th submitted application     |
//!
//! The initialization guard is an explicit flag rather than "config entry
//! happens to be absent", so a half-written state can never masquerade as
//! uninitialized.

use shared::{MetadataPointer, RoundSchedule};
use soroban_sdk::{contracttype, panic_with_error, Env};

use crate::types::{Application, RoundConfig};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Initialized,
    Config,
    Schedule,
    RoundMeta,
    ApplicationMeta,
    ProjectsMeta,
    MatchAmount,
    ReadyForPayout,
    AppCount,
    Application(u32),
}

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

// ── Initialization guard ─────────────────────────────────────────────

/// Mark the round initialized; panics if it already was.
pub fn set_initialized(env: &Env) {
    if env
        .storage()
        .instance()
        .get::<_, bool>(&DataKey::Initialized)
        .unwrap_or(false)
    {
        panic_with_error!(env, Error::AlreadyInitialized);
    }
    env.storage().instance().set(&DataKey::Initialized, &true);
    bump_instance(env);
}

// ── Config / schedule / pointers ─────────────────────────────────────

pub fn save_config(env: &Env, config: &RoundConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

/// Fails with `NotInitialized` if the round was never initialized.
pub fn load_config(env: &Env) -> RoundConfig {
    bump_instance(env);
    match env.storage().instance().get(&DataKey::Config) {
        Some(config) => config,
        None => panic_with_error!(env, Error::NotInitialized),
    }
}

pub fn save_schedule(env: &Env, schedule: &RoundSchedule) {
    env.storage().instance().set(&DataKey::Schedule, schedule);
    bump_instance(env);
}

pub fn load_schedule(env: &Env) -> RoundSchedule {
    bump_instance(env);
    match env.storage().instance().get(&DataKey::Schedule) {
        Some(schedule) => schedule,
        None => panic_with_error!(env, Error::NotInitialized),
    }
}

/// The three metadata pointer slots.
#[derive(Clone, Copy)]
pub enum MetaSlot {
    Round,
    Application,
    Projects,
}

impl MetaSlot {
    fn key(&self) -> DataKey {
        match self {
            MetaSlot::Round => DataKey::RoundMeta,
            MetaSlot::Application => DataKey::ApplicationMeta,
            MetaSlot::Projects => DataKey::ProjectsMeta,
        }
    }
}

pub fn save_meta(env: &Env, slot: MetaSlot, meta: &MetadataPointer) {
    env.storage().instance().set(&slot.key(), meta);
    bump_instance(env);
}

pub fn load_meta(env: &Env, slot: MetaSlot) -> MetadataPointer {
    bump_instance(env);
    match env.storage().instance().get(&slot.key()) {
        Some(meta) => meta,
        None => panic_with_error!(env, Error::NotInitialized),
    }
}

// ── Match amount / payout latch ──────────────────────────────────────

pub fn load_match_amount(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::MatchAmount)
        .unwrap_or(0)
}

pub fn save_match_amount(env: &Env, amount: i128) {
    env.storage().instance().set(&DataKey::MatchAmount, &amount);
    bump_instance(env);
}

pub fn is_ready_for_payout(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::ReadyForPayout)
        .unwrap_or(false)
}

pub fn set_ready_for_payout(env: &Env) {
    env.storage().instance().set(&DataKey::ReadyForPayout, &true);
    bump_instance(env);
}

// ── Applications ─────────────────────────────────────────────────────

/// Append an application record, returning its index in the log.
pub fn push_application(env: &Env, application: &Application) -> u32 {
    let count: u32 = env
        .storage()
        .instance()
        .get(&DataKey::AppCount)
        .unwrap_or(0);
    let key = DataKey::Application(count);
    env.storage().persistent().set(&key, application);
    bump_persistent(env, &key);
    env.storage()
        .instance()
        .set(&DataKey::AppCount, &(count + 1));
    bump_instance(env);
    count
}

pub fn application_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::AppCount)
        .unwrap_or(0)
}

pub fn load_application(env: &Env, index: u32) -> Option<Application> {
    let key = DataKey::Application(index);
    let application = env.storage().persistent().get(&key);
    if application.is_some() {
        bump_persistent(env, &key);
    }
    application
}
