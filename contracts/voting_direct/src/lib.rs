//! # Direct Voting Strategy
//!
//! The simplest voting strategy: the round forwards encoded vote records
//! together with the authenticated caller, and the strategy re-emits each
//! record as a `voted` event attributed to that caller and tagged with the
//! round address.
//!
//! The strategy is stateless beyond its round binding. It performs no fund
//! movement and no scoring — it only shapes and tags events; anything
//! downstream (quadratic-funding math, matching) happens off-ledger over
//! the event stream.
//!
//! Vote records are XDR-encoded [`DirectVote`] tuples. The round passes
//! them through verbatim, so a malformed entry fails here, aborting the
//! whole `vote` invocation.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, symbol_short,
    xdr::FromXdr, Address, Bytes, BytesN, Env, Symbol, Vec,
};


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyLinked = 1,
    NotLinked = 2,
    MalformedVote = 3,
    InvalidVote = 4,
}

/// One vote record as the submission UI encodes it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectVote {
    pub token: Address,
    pub amount: i128,
    pub beneficiary: Address,
    pub project_id: BytesN<32>,
}

/// The `voted` event payload, one per decoded record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteCast {
    pub token: Address,
    pub amount: i128,
    pub voter: Address,
    pub beneficiary: Address,
    pub project_id: BytesN<32>,
    pub round: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    Round,
}

#[contract]
pub struct DirectVoting;

#[contractimpl]
impl DirectVoting {
    /// Bind this strategy to `round`. Callable exactly once; the round
    /// itself makes this call during its initialization, so the binding is
    /// authenticated by the invoker-contract auth of `round`.
    pub fn init(env: Env, round: Address) {
        round.require_auth();
        if env.storage().instance().has(&DataKey::Round) {
            panic_with_error!(&env, Error::AlreadyLinked);
        }
        env.storage().instance().set(&DataKey::Round, &round);

        env.events().publish(
            (Symbol::new(&env, "voting_init"), round),
            symbol_short!("direct"),
        );
    }

    /// Decode each entry of `votes` and emit a `voted` event attributed to
    /// `voter`. Only the bound round may call.
    pub fn vote(env: Env, votes: Vec<Bytes>, voter: Address) {
        let round = bound_round(&env);
        round.require_auth();

        for encoded in votes.iter() {
            let vote = match DirectVote::from_xdr(&env, &encoded) {
                Ok(vote) => vote,
                Err(_) => panic_with_error!(&env, Error::MalformedVote),
            };
            if vote.amount < 0 {
                panic_with_error!(&env, Error::InvalidVote);
            }

            env.events().publish(
                (symbol_short!("voted"), round.clone()),
                VoteCast {
                    token: vote.token,
                    amount: vote.amount,
                    voter: voter.clone(),
                    beneficiary: vote.beneficiary,
                    project_id: vote.project_id,
                    round: round.clone(),
                },
            );
        }
    }

    /// The round this strategy is bound to.
    pub fn get_round(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Round)
    }

    /// Strategy kind discriminator, surfaced for the indexer's read model.
    pub fn kind(_env: Env) -> Symbol {
        symbol_short!("direct")
    }
}

fn bound_round(env: &Env) -> Address {
    match env.storage().instance().get(&DataKey::Round) {
        Some(round) => round,
        None => panic_with_error!(env, Error::NotLinked),
    }
}
