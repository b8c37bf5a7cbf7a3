//! # Merkle Payout Strategy
//!
//! Holds the committed distribution for a round — a Merkle root over
//! `(recipient, amount)` leaves plus a pointer to the full distribution
//! document — custodies the escrowed match funds, and pays each leaf out at
//! most once against a valid proof.
//!
//! ## Lifecycle
//!
//! 1. `init` — the round binds itself and the escrow token. Once.
//! 2. `update_distribution` — the round overwrites root and pointer, any
//!    number of times, until readiness is latched.
//! 3. `set_ready_for_payout` — the round latches readiness as the final
//!    step of its escrow handshake. Once. The distribution is frozen from
//!    here on.
//! 4. `payout` — anyone presents a proof; a valid unclaimed leaf transfers
//!    its amount to the recipient and is marked claimed.
//!
//! The readiness latch can only ever be flipped by the bound round, so a
//! strategy can never report ready without the round having escrowed funds
//! in the same invocation.

#![no_std]

use shared::MetadataPointer;
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, symbol_short, token,
    xdr::ToXdr, Address, BytesN, Env, Symbol, Vec,
};

mod merkle;


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyLinked = 1,
    NotLinked = 2,
    NotRoundContract = 3,
    DistributionFrozen = 4,
    AlreadyReady = 5,
    NotReadyForPayout = 6,
    InvalidProof = 7,
    AlreadyClaimed = 8,
    DistributionNotSet = 9,
}

/// The committed distribution: root digest plus document pointer.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Distribution {
    pub merkle_root: BytesN<32>,
    pub dist_meta: MetadataPointer,
}

/// One distribution leaf. Hashed with SHA-256 over its XDR encoding.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionLeaf {
    pub recipient: Address,
    pub amount: i128,
}

/// The `distribution` event payload.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionUpdated {
    pub merkle_root: BytesN<32>,
    pub dist_meta: MetadataPointer,
}

/// The `claimed` event payload.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimExecuted {
    pub recipient: Address,
    pub amount: i128,
    pub leaf: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    Round,
    Token,
    Distribution,
    Ready,
    Claimed(BytesN<32>),
}

#[contract]
pub struct MerklePayout;

#[contractimpl]
impl MerklePayout {
    /// Bind this strategy to `round` and the escrow `token`. Callable
    /// exactly once, by the round during its initialization.
    pub fn init(env: Env, round: Address, token: Address) {
        round.require_auth();
        if env.storage().instance().has(&DataKey::Round) {
            panic_with_error!(&env, Error::AlreadyLinked);
        }
        env.storage().instance().set(&DataKey::Round, &round);
        env.storage().instance().set(&DataKey::Token, &token);

        env.events()
            .publish((Symbol::new(&env, "payout_init"), round), token);
    }

    /// Overwrite the committed distribution. Only callable by the bound
    /// round (which gates it behind its operator role), and only until
    /// readiness is latched.
    pub fn update_distribution(
        env: Env,
        caller: Address,
        merkle_root: BytesN<32>,
        dist_meta: MetadataPointer,
    ) {
        caller.require_auth();
        require_bound_round(&env, &caller);
        if is_ready(&env) {
            panic_with_error!(&env, Error::DistributionFrozen);
        }

        let distribution = Distribution {
            merkle_root: merkle_root.clone(),
            dist_meta: dist_meta.clone(),
        };
        env.storage()
            .instance()
            .set(&DataKey::Distribution, &distribution);

        env.events().publish(
            (Symbol::new(&env, "distribution"),),
            DistributionUpdated {
                merkle_root,
                dist_meta,
            },
        );
    }

    /// Latch readiness. Only the bound round may call, exactly once; the
    /// round does so in the same invocation that transfers the escrow.
    pub fn set_ready_for_payout(env: Env, caller: Address) {
        caller.require_auth();
        require_bound_round(&env, &caller);
        if is_ready(&env) {
            panic_with_error!(&env, Error::AlreadyReady);
        }
        env.storage().instance().set(&DataKey::Ready, &true);

        env.events()
            .publish((symbol_short!("ready"), caller), true);
    }

    /// Pay out one distribution leaf.
    ///
    /// Verifies `proof` against the committed root for the
    /// `(recipient, amount)` leaf, transfers `amount` of the escrow token
    /// to `recipient`, and marks the leaf claimed. Each leaf pays out at
    /// most once; a replay fails with `AlreadyClaimed`.
    pub fn payout(env: Env, proof: Vec<BytesN<32>>, recipient: Address, amount: i128) {
        if !is_ready(&env) {
            panic_with_error!(&env, Error::NotReadyForPayout);
        }

        // Readiness implies a committed distribution; treat a miss as unset.
        let distribution: Distribution =
            match env.storage().instance().get(&DataKey::Distribution) {
                Some(d) => d,
                None => panic_with_error!(&env, Error::DistributionNotSet),
            };

        let leaf = leaf_hash(&env, &recipient, amount);
        if env.storage().persistent().has(&DataKey::Claimed(leaf.clone())) {
            panic_with_error!(&env, Error::AlreadyClaimed);
        }
        if !merkle::verify(&env, &proof, &distribution.merkle_root, &leaf) {
            panic_with_error!(&env, Error::InvalidProof);
        }

        let token_addr: Address = match env.storage().instance().get(&DataKey::Token) {
            Some(t) => t,
            None => panic_with_error!(&env, Error::NotLinked),
        };
        token::Client::new(&env, &token_addr).transfer(
            &env.current_contract_address(),
            &recipient,
            &amount,
        );
        env.storage()
            .persistent()
            .set(&DataKey::Claimed(leaf.clone()), &true);

        env.events().publish(
            (symbol_short!("claimed"), recipient.clone()),
            ClaimExecuted {
                recipient,
                amount,
                leaf,
            },
        );
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn is_distribution_set(env: Env) -> bool {
        env.storage().instance().has(&DataKey::Distribution)
    }

    pub fn is_ready_for_payout(env: Env) -> bool {
        is_ready(&env)
    }

    pub fn get_distribution(env: Env) -> Option<Distribution> {
        env.storage().instance().get(&DataKey::Distribution)
    }

    pub fn get_round(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Round)
    }

    pub fn has_claimed(env: Env, recipient: Address, amount: i128) -> bool {
        let leaf = leaf_hash(&env, &recipient, amount);
        env.storage().persistent().has(&DataKey::Claimed(leaf))
    }
}

/// Hash of the `(recipient, amount)` leaf, exposed so distribution builders
/// and tests share one definition.
pub fn leaf_hash(env: &Env, recipient: &Address, amount: i128) -> BytesN<32> {
    let leaf = DistributionLeaf {
        recipient: recipient.clone(),
        amount,
    };
    env.crypto().sha256(&leaf.to_xdr(env)).into()
}

fn is_ready(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Ready)
        .unwrap_or(false)
}

fn require_bound_round(env: &Env, caller: &Address) {
    let round: Address = match env.storage().instance().get(&DataKey::Round) {
        Some(round) => round,
        None => panic_with_error!(env, Error::NotLinked),
    };
    if *caller != round {
        panic_with_error!(env, Error::NotRoundContract);
    }
}
