//! # Round Factory
//!
//! Creates round instances bound to the *currently configured*
//! implementation: the factory stores the WASM hash of the round contract,
//! deploys a fresh instance from it on every `create_round`, and invokes
//! `initialize` on the new instance in the same atomic unit.
//!
//! Swapping the implementation (`update_round_contract`) affects future
//! creates only — every existing round keeps the code it was deployed with.
//! There is no retroactive migration.
//!
//! The factory validates the owning program against the program registry
//! before deploying, so a round can never be created against a program that
//! does not exist.

#![no_std]

use shared::RoundParams;
use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, contracttype, panic_with_error,
    Address, BytesN, Env, Symbol,
};

#[cfg(test)]
mod test;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotAuthorized = 3,
    ProgramNotFound = 4,
}

/// The `round_created` event payload.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundCreated {
    pub round: Address,
    pub program_id: u64,
    pub implementation: BytesN<32>,
}

/// The `impl_updated` event payload.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImplementationUpdated {
    pub old: BytesN<32>,
    pub new: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    Admin,
    Registry,
    RoundWasmHash,
}

/// The slice of the registry interface the factory consumes.
#[contractclient(name = "RegistryClient")]
pub trait ProgramRegistry {
    fn program_exists(env: Env, id: u64) -> bool;
}

/// The slice of the round interface the factory consumes.
#[contractclient(name = "RoundClient")]
pub trait Round {
    fn initialize(env: Env, params: RoundParams);
}

#[contract]
pub struct RoundFactory;

#[contractimpl]
impl RoundFactory {
    /// Configure the factory. Callable exactly once.
    ///
    /// - `admin` may later swap the round implementation.
    /// - `registry` is the program registry rounds are validated against.
    /// - `round_wasm_hash` is the initial round implementation (an
    ///   already-uploaded WASM hash).
    pub fn init(env: Env, admin: Address, registry: Address, round_wasm_hash: BytesN<32>) {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            panic_with_error!(&env, Error::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Registry, &registry);
        env.storage()
            .instance()
            .set(&DataKey::RoundWasmHash, &round_wasm_hash);
    }

    /// Deploy and initialize a new round owned by `params.program_id`.
    ///
    /// `salt` disambiguates multiple rounds deployed by this factory;
    /// callers pass a fresh value per round. Returns the round address.
    pub fn create_round(env: Env, caller: Address, params: RoundParams, salt: BytesN<32>) -> Address {
        caller.require_auth();

        let registry: Address = require_configured(&env, DataKey::Registry);
        if !RegistryClient::new(&env, &registry).program_exists(&params.program_id) {
            panic_with_error!(&env, Error::ProgramNotFound);
        }

        let implementation: BytesN<32> = require_configured(&env, DataKey::RoundWasmHash);
        let round = env
            .deployer()
            .with_current_contract(salt)
            .deploy_v2(implementation.clone(), ());

        RoundClient::new(&env, &round).initialize(&params);

        env.events().publish(
            (Symbol::new(&env, "round_created"), round.clone()),
            RoundCreated {
                round: round.clone(),
                program_id: params.program_id,
                implementation,
            },
        );
        round
    }

    /// Swap the implementation used by future `create_round` calls.
    /// Admin-gated; already-created rounds are unaffected.
    pub fn update_round_contract(env: Env, caller: Address, new_wasm_hash: BytesN<32>) {
        caller.require_auth();
        let admin: Address = require_configured(&env, DataKey::Admin);
        if caller != admin {
            panic_with_error!(&env, Error::NotAuthorized);
        }

        let old: BytesN<32> = require_configured(&env, DataKey::RoundWasmHash);
        env.storage()
            .instance()
            .set(&DataKey::RoundWasmHash, &new_wasm_hash);

        env.events().publish(
            (Symbol::new(&env, "impl_updated"),),
            ImplementationUpdated {
                old,
                new: new_wasm_hash,
            },
        );
    }

    pub fn get_round_implementation(env: Env) -> BytesN<32> {
        require_configured(&env, DataKey::RoundWasmHash)
    }

    pub fn get_registry(env: Env) -> Address {
        require_configured(&env, DataKey::Registry)
    }
}

fn require_configured<T: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>>(
    env: &Env,
    key: DataKey,
) -> T {
    match env.storage().instance().get(&key) {
        Some(value) => value,
        None => panic_with_error!(env, Error::NotInitialized),
    }
}
