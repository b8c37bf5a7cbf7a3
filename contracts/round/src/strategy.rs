//! # Strategy interfaces
//!
//! The round binds to one voting strategy and one payout strategy and calls
//! them only through these interfaces — it holds opaque addresses and never
//! branches on which concrete strategy it talks to. Sub-calls run inside the
//! round's own invocation, so a strategy failure aborts the whole operation
//! with nothing observed.

use shared::MetadataPointer;
use soroban_sdk::{contractclient, Address, Bytes, BytesN, Env, Vec};

/// Voting strategies accept encoded vote records from the bound round and
/// re-emit them as `voted` events tagged with the round address.
#[contractclient(name = "VotingClient")]
pub trait VotingStrategy {
    /// Bind the strategy to `round`. Callable exactly once, by the round.
    fn init(env: Env, round: Address);

    /// Forward `votes` on behalf of `voter`. Only the bound round may call.
    fn vote(env: Env, votes: Vec<Bytes>, voter: Address);
}

/// Payout strategies hold a committed distribution and execute withdrawal
/// once the round escrows the match funds.
#[contractclient(name = "PayoutClient")]
pub trait PayoutStrategy {
    /// Bind the strategy to `round` and the escrow `token`. Callable exactly
    /// once, by the round.
    fn init(env: Env, round: Address, token: Address);

    /// Overwrite the committed distribution. Only the bound round may call,
    /// and only before readiness is latched.
    fn update_distribution(
        env: Env,
        caller: Address,
        merkle_root: BytesN<32>,
        dist_meta: MetadataPointer,
    );

    /// Latch readiness. Only the bound round may call, exactly once, as the
    /// final step of the escrow handshake.
    fn set_ready_for_payout(env: Env, caller: Address);

    fn is_distribution_set(env: Env) -> bool;

    fn is_ready_for_payout(env: Env) -> bool;
}
