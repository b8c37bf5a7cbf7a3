//! # Relay Voting Strategy
//!
//! Variant of the direct strategy for rounds whose votes arrive through a
//! relayer (gasless submission, batched off-ledger collection). Each record
//! carries one extra leading field, `on_behalf_of`: the principal the vote
//! is attributed to. The forwarded caller — the relayer — authenticates the
//! submission but is *not* recorded as the voter.
//!
//! The strategy trusts the relayer to forward honest attributions; it only
//! shapes and tags events, exactly like the direct variant. The emitted
//! `voted` payload is identical in shape, so the indexer handles both
//! strategies with one code path.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, symbol_short,
    xdr::FromXdr, Address, Bytes, BytesN, Env, Symbol, Vec,
};

#[cfg(test)]
mod test;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyLinked = 1,
    NotLinked = 2,
    MalformedVote = 3,
    InvalidVote = 4,
}

/// One relayed vote record: a direct vote with the attributed principal
/// prepended.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelayVote {
    pub on_behalf_of: Address,
    pub token: Address,
    pub amount: i128,
    pub beneficiary: Address,
    pub project_id: BytesN<32>,
}

/// The `voted` event payload. Same shape as the direct strategy's.
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
pub struct RelayVoting;

#[contractimpl]
impl RelayVoting {
    /// Bind this strategy to `round`. Callable exactly once, by the round.
    pub fn init(env: Env, round: Address) {
        round.require_auth();
        if env.storage().instance().has(&DataKey::Round) {
            panic_with_error!(&env, Error::AlreadyLinked);
        }
        env.storage().instance().set(&DataKey::Round, &round);

        env.events().publish(
            (Symbol::new(&env, "voting_init"), round),
            symbol_short!("relay"),
        );
    }

    /// Decode each entry of `votes` and emit a `voted` event attributed to
    /// the record's `on_behalf_of` principal. The forwarded `voter` — the
    /// relayer — is deliberately ignored in the attribution.
    pub fn vote(env: Env, votes: Vec<Bytes>, voter: Address) {
        let _ = voter;
        let round = bound_round(&env);
        round.require_auth();

        for encoded in votes.iter() {
            let vote = match RelayVote::from_xdr(&env, &encoded) {
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
                    voter: vote.on_behalf_of,
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
        symbol_short!("relay")
    }
}

fn bound_round(env: &Env) -> Address {
    match env.storage().instance().get(&DataKey::Round) {
        Some(round) => round,
        None => panic_with_error!(env, Error::NotLinked),
    }
}
