//! # Round Contract
//!
//! The central state machine of the grant-round protocol: a time-boxed
//! funding cycle that accepts project applications during one window,
//! accepts weighted votes during another, and — once the round has ended
//! and a payout distribution is committed — escrows its match funds to the
//! bound payout strategy in a one-shot handshake.
//!
//! | Phase       | Entry Point(s)                                          |
//! |-------------|---------------------------------------------------------|
//! | Bootstrap   | [`Round::initialize`]                                   |
//! | Role admin  | `grant_role`, `revoke_role`                             |
//! | Applying    | [`Round::apply_to_round`]                               |
//! | Voting      | [`Round::vote`]                                         |
//! | Operations  | `update_*_meta`, `update_*_time`, `update_match_amount`,|
//! |             | `update_distribution`                                   |
//! | Settlement  | [`Round::set_ready_for_payout`]                         |
//! | Queries     | `get_round`, `get_application`, `has_role`, …           |
//!
//! ## Architecture
//!
//! Authorization is fully delegated to [`roles`], schedule rules to
//! [`schedule`], storage access to [`storage`], and strategy calls go
//! through the opaque clients in [`strategy`]. This file contains only the
//! public entry points and event emissions.

#![no_std]

use shared::{MetadataPointer, RoundParams};
use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, token, Address, Bytes, BytesN, Env,
    Vec,
};

pub mod events;
pub mod roles;
mod schedule;
mod storage;
pub mod strategy;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_payout;
#[cfg(test)]
mod test_schedule;

use schedule::TimeField;
use storage::MetaSlot;
use strategy::{PayoutClient, VotingClient};

pub use roles::Role;
pub use types::{Application, RoundConfig, RoundDetails};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NoAdminsConfigured = 2,
    MissingRole = 3,
    ApplicationsWindowInvalid = 4,
    RoundWindowInvalid = 5,
    StartAfterEnd = 6,
    AlreadyPassed = 7,
    NotAcceptingApplications = 8,
    RoundNotActive = 9,
    RoundHasEnded = 10,
    LesserThanCurrentMatchAmount = 11,
    RoundHasNotEnded = 12,
    DistributionNotSet = 13,
    AlreadyReady = 14,
    InsufficientFunds = 15,
    NotInitialized = 16,
}

#[contract]
pub struct Round;

#[contractimpl]
impl Round {
    // ─────────────────────────────────────────────────────────
    // Initialization
    // ─────────────────────────────────────────────────────────

    /// Initialize the round. Callable exactly once, normally by the round
    /// factory immediately after deployment.
    ///
    /// Validates the schedule invariants, seeds the role registry (the
    /// admin list must be non-empty), binds and `init`s both strategies,
    /// and emits `round_init`. The token, strategy bindings and owning
    /// program are immutable afterwards.
    pub fn initialize(env: Env, params: RoundParams) {
        storage::set_initialized(&env);

        schedule::validate(&env, &params.schedule);
        schedule::require_not_passed(&env, params.schedule.apps_start);

        roles::seed(&env, &params.admins, &params.operators);

        let config = RoundConfig {
            token: params.token.clone(),
            voting_strategy: params.voting_strategy.clone(),
            payout_strategy: params.payout_strategy.clone(),
            program_id: params.program_id,
        };
        storage::save_config(&env, &config);
        storage::save_schedule(&env, &params.schedule);
        storage::save_meta(&env, MetaSlot::Round, &params.round_meta);
        storage::save_meta(&env, MetaSlot::Application, &params.application_meta);
        storage::save_meta(&env, MetaSlot::Projects, &params.projects_meta);

        let this = env.current_contract_address();
        VotingClient::new(&env, &params.voting_strategy).init(&this);
        PayoutClient::new(&env, &params.payout_strategy).init(&this, &params.token);

        events::round_initialized(
            &env,
            events::RoundInitialized {
                program_id: params.program_id,
                token: params.token,
                voting_strategy: params.voting_strategy,
                payout_strategy: params.payout_strategy,
                schedule: params.schedule,
                round_meta: params.round_meta,
                application_meta: params.application_meta,
                projects_meta: params.projects_meta,
            },
        );
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `who`. `caller` must hold `Admin`.
    pub fn grant_role(env: Env, caller: Address, role: Role, who: Address) {
        caller.require_auth();
        roles::require_role(&env, Role::Admin, &caller);
        roles::grant(&env, role, &who);
    }

    /// Revoke `role` from `who`. `caller` must hold `Admin`.
    ///
    /// Revoking the last admin is allowed and permanently locks role
    /// management for this round.
    pub fn revoke_role(env: Env, caller: Address, role: Role, who: Address) {
        caller.require_auth();
        roles::require_role(&env, Role::Admin, &caller);
        roles::revoke(&env, role, &who);
    }

    pub fn has_role(env: Env, role: Role, who: Address) -> bool {
        roles::has_role(&env, role, &who)
    }

    pub fn member_count(env: Env, role: Role) -> u32 {
        roles::member_count(&env, role)
    }

    pub fn member_at(env: Env, role: Role, index: u32) -> Option<Address> {
        roles::member_at(&env, role, index)
    }

    // ─────────────────────────────────────────────────────────
    // Applications
    // ─────────────────────────────────────────────────────────

    /// Submit an application for `project_id`. Callable by anyone while the
    /// application window is open.
    ///
    /// The log is append-only: resubmission adds a new record rather than
    /// overwriting the previous one.
    pub fn apply_to_round(env: Env, applicant: Address, project_id: BytesN<32>, meta: MetadataPointer) {
        applicant.require_auth();

        let sched = storage::load_schedule(&env);
        if !schedule::accepting_applications(&env, &sched) {
            panic_with_error!(&env, Error::NotAcceptingApplications);
        }

        let application = Application {
            applicant,
            project_id: project_id.clone(),
            meta: meta.clone(),
            submitted_at: env.ledger().timestamp(),
        };
        storage::push_application(&env, &application);

        events::new_application(&env, events::NewApplication { project_id, meta });
    }

    pub fn application_count(env: Env) -> u32 {
        storage::application_count(&env)
    }

    pub fn get_application(env: Env, index: u32) -> Option<Application> {
        storage::load_application(&env, index)
    }

    /// All submissions for `project_id`, in submission order.
    pub fn applications_for_project(env: Env, project_id: BytesN<32>) -> Vec<Application> {
        let mut found = Vec::new(&env);
        for index in 0..storage::application_count(&env) {
            if let Some(application) = storage::load_application(&env, index) {
                if application.project_id == project_id {
                    found.push_back(application);
                }
            }
        }
        found
    }

    // ─────────────────────────────────────────────────────────
    // Voting
    // ─────────────────────────────────────────────────────────

    /// Forward `encoded_votes` to the bound voting strategy with
    /// `voter = caller`. Callable by anyone while the voting window is open.
    ///
    /// The round does not decode the entries; vote shape is entirely the
    /// strategy's concern.
    pub fn vote(env: Env, caller: Address, encoded_votes: Vec<Bytes>) {
        caller.require_auth();

        let sched = storage::load_schedule(&env);
        if !schedule::voting_open(&env, &sched) {
            panic_with_error!(&env, Error::RoundNotActive);
        }

        let config = storage::load_config(&env);
        VotingClient::new(&env, &config.voting_strategy).vote(&encoded_votes, &caller);
    }

    // ─────────────────────────────────────────────────────────
    // Operator mutations
    // ─────────────────────────────────────────────────────────

    /// Overwrite the round document pointer. `caller` must hold `Operator`;
    /// fails once the round has ended.
    pub fn update_round_meta(env: Env, caller: Address, new_meta: MetadataPointer) {
        Self::update_meta(&env, caller, MetaSlot::Round, "round_meta", new_meta);
    }

    /// Overwrite the application form pointer.
    pub fn update_application_meta(env: Env, caller: Address, new_meta: MetadataPointer) {
        Self::update_meta(&env, caller, MetaSlot::Application, "app_meta", new_meta);
    }

    /// Overwrite the approved-projects pointer.
    pub fn update_projects_meta(env: Env, caller: Address, new_meta: MetadataPointer) {
        Self::update_meta(&env, caller, MetaSlot::Projects, "projects_meta", new_meta);
    }

    /// Move the application window opening time.
    ///
    /// Re-validates the full invariant set against the other three current
    /// timestamps; the new value must not be in the past.
    pub fn update_applications_start_time(env: Env, caller: Address, new_time: u64) {
        Self::update_time(&env, caller, TimeField::AppsStart, new_time);
    }

    /// Move the application window closing time.
    pub fn update_applications_end_time(env: Env, caller: Address, new_time: u64) {
        Self::update_time(&env, caller, TimeField::AppsEnd, new_time);
    }

    /// Move the voting window opening time.
    pub fn update_round_start_time(env: Env, caller: Address, new_time: u64) {
        Self::update_time(&env, caller, TimeField::RoundStart, new_time);
    }

    /// Move the round end time.
    pub fn update_round_end_time(env: Env, caller: Address, new_time: u64) {
        Self::update_time(&env, caller, TimeField::RoundEnd, new_time);
    }

    /// Raise the committed match amount. `caller` must hold `Operator`.
    ///
    /// The amount is monotone: lowering it would retroactively shrink the
    /// balance the payout handshake was promised, so a lesser value fails.
    pub fn update_match_amount(env: Env, caller: Address, new_amount: i128) {
        caller.require_auth();
        roles::require_role(&env, Role::Operator, &caller);

        let sched = storage::load_schedule(&env);
        if schedule::round_ended(&env, &sched) {
            panic_with_error!(&env, Error::RoundHasEnded);
        }
        if new_amount < storage::load_match_amount(&env) {
            panic_with_error!(&env, Error::LesserThanCurrentMatchAmount);
        }

        storage::save_match_amount(&env, new_amount);
        events::match_amount_updated(&env, new_amount);
    }

    /// Forward a distribution update to the bound payout strategy.
    /// `caller` must hold `Operator`.
    ///
    /// The strategy itself rejects updates once readiness is latched.
    pub fn update_distribution(
        env: Env,
        caller: Address,
        merkle_root: BytesN<32>,
        dist_meta: MetadataPointer,
    ) {
        caller.require_auth();
        roles::require_role(&env, Role::Operator, &caller);

        let config = storage::load_config(&env);
        PayoutClient::new(&env, &config.payout_strategy).update_distribution(
            &env.current_contract_address(),
            &merkle_root,
            &dist_meta,
        );
    }

    // ─────────────────────────────────────────────────────────
    // Settlement
    // ─────────────────────────────────────────────────────────

    /// Escrow the match funds to the payout strategy and latch readiness.
    /// `caller` must hold `Operator`. Callable at most once, only after the
    /// round has ended, only once a distribution is committed, and only if
    /// the round custodies at least `match_amount` of the token.
    ///
    /// The transfer and the latch happen in one invocation: any failure
    /// rolls both back.
    pub fn set_ready_for_payout(env: Env, caller: Address) {
        caller.require_auth();
        roles::require_role(&env, Role::Operator, &caller);

        let sched = storage::load_schedule(&env);
        if !schedule::round_ended(&env, &sched) {
            panic_with_error!(&env, Error::RoundHasNotEnded);
        }
        if storage::is_ready_for_payout(&env) {
            panic_with_error!(&env, Error::AlreadyReady);
        }

        let config = storage::load_config(&env);
        let payout = PayoutClient::new(&env, &config.payout_strategy);
        if !payout.is_distribution_set() {
            panic_with_error!(&env, Error::DistributionNotSet);
        }

        let match_amount = storage::load_match_amount(&env);
        let this = env.current_contract_address();
        let token_client = token::Client::new(&env, &config.token);
        if token_client.balance(&this) < match_amount {
            panic_with_error!(&env, Error::InsufficientFunds);
        }

        token_client.transfer(&this, &config.payout_strategy, &match_amount);
        payout.set_ready_for_payout(&this);
        storage::set_ready_for_payout(&env);

        events::funds_escrowed(&env, match_amount, config.payout_strategy);
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_round(env: Env) -> RoundDetails {
        let config = storage::load_config(&env);
        RoundDetails {
            token: config.token,
            voting_strategy: config.voting_strategy,
            payout_strategy: config.payout_strategy,
            program_id: config.program_id,
            schedule: storage::load_schedule(&env),
            round_meta: storage::load_meta(&env, MetaSlot::Round),
            application_meta: storage::load_meta(&env, MetaSlot::Application),
            projects_meta: storage::load_meta(&env, MetaSlot::Projects),
            match_amount: storage::load_match_amount(&env),
            ready_for_payout: storage::is_ready_for_payout(&env),
        }
    }

    pub fn is_accepting_applications(env: Env) -> bool {
        let sched = storage::load_schedule(&env);
        schedule::accepting_applications(&env, &sched)
    }

    pub fn is_voting_open(env: Env) -> bool {
        let sched = storage::load_schedule(&env);
        schedule::voting_open(&env, &sched)
    }

    pub fn is_ready_for_payout(env: Env) -> bool {
        storage::is_ready_for_payout(&env)
    }
}

impl Round {
    /// Shared body of the three metadata update entry points.
    fn update_meta(
        env: &Env,
        caller: Address,
        slot: MetaSlot,
        topic: &str,
        new_meta: MetadataPointer,
    ) {
        caller.require_auth();
        roles::require_role(env, Role::Operator, &caller);

        let sched = storage::load_schedule(env);
        if schedule::round_ended(env, &sched) {
            panic_with_error!(env, Error::RoundHasEnded);
        }

        let old = storage::load_meta(env, slot);
        storage::save_meta(env, slot, &new_meta);
        events::meta_updated(env, topic, old, new_meta);
    }

    /// Shared body of the four schedule update entry points. The proposed
    /// value is written into a copy of the schedule, which is then validated
    /// in full before being stored.
    fn update_time(env: &Env, caller: Address, field: TimeField, new_time: u64) {
        caller.require_auth();
        roles::require_role(env, Role::Operator, &caller);

        let current = storage::load_schedule(env);
        if schedule::round_ended(env, &current) {
            panic_with_error!(env, Error::RoundHasEnded);
        }
        schedule::require_not_passed(env, new_time);

        let old = field.get(&current);
        let mut proposed = current;
        field.set(&mut proposed, new_time);
        schedule::validate(env, &proposed);

        storage::save_schedule(env, &proposed);
        events::time_updated(env, field.topic(), old, new_time);
    }
}
