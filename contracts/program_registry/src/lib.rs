//! # Program Registry
//!
//! Programs are the grouping/ownership entities above rounds: a metadata
//! pointer plus admin and operator sets, created once and mutated only
//! through role-gated metadata updates. The registry assigns auto-increment
//! ids from a stored counter; the round factory validates program
//! references against it before creating a round.
//!
//! Program role sets live inside the program record — unlike the round's
//! registry there is no enumeration requirement here, and the sets are
//! small enough to scan.

#![no_std]

use shared::MetadataPointer;
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, Address, Env, Symbol,
    Vec,
};


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NoAdminsConfigured = 1,
    ProgramNotFound = 2,
    MissingRole = 3,
}

/// One program record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    pub id: u64,
    pub meta: MetadataPointer,
    pub admins: Vec<Address>,
    pub operators: Vec<Address>,
}

/// The `program_created` event payload.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramCreated {
    pub program_id: u64,
    pub meta: MetadataPointer,
}

/// The `program_meta` event payload.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramMetaUpdated {
    pub program_id: u64,
    pub old: MetadataPointer,
    pub new: MetadataPointer,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    ProgramCount,
    Program(u64),
}

#[contract]
pub struct ProgramRegistry;

#[contractimpl]
impl ProgramRegistry {
    /// Create a program. `caller` pays for and authorizes the creation and
    /// is typically (but not necessarily) in the admin list, which must be
    /// non-empty. Returns the new program id.
    pub fn create_program(
        env: Env,
        caller: Address,
        meta: MetadataPointer,
        admins: Vec<Address>,
        operators: Vec<Address>,
    ) -> u64 {
        caller.require_auth();
        if admins.is_empty() {
            panic_with_error!(&env, Error::NoAdminsConfigured);
        }

        let id = next_program_id(&env);
        let program = Program {
            id,
            meta: meta.clone(),
            admins,
            operators,
        };
        env.storage().persistent().set(&DataKey::Program(id), &program);

        env.events().publish(
            (Symbol::new(&env, "program_created"), id),
            ProgramCreated {
                program_id: id,
                meta,
            },
        );
        id
    }

    /// Overwrite a program's metadata pointer. `caller` must hold the
    /// program's admin or operator role.
    pub fn update_program_meta(env: Env, caller: Address, id: u64, new_meta: MetadataPointer) {
        caller.require_auth();

        let mut program = load_program(&env, id);
        if !program.admins.contains(&caller) && !program.operators.contains(&caller) {
            panic_with_error!(&env, Error::MissingRole);
        }

        let old = program.meta.clone();
        program.meta = new_meta.clone();
        env.storage().persistent().set(&DataKey::Program(id), &program);

        env.events().publish(
            (Symbol::new(&env, "program_meta"), id),
            ProgramMetaUpdated {
                program_id: id,
                old,
                new: new_meta,
            },
        );
    }

    /// Add `who` to a program's admin or operator set. Admin-gated.
    pub fn grant_program_role(env: Env, caller: Address, id: u64, who: Address, admin: bool) {
        caller.require_auth();

        let mut program = load_program(&env, id);
        if !program.admins.contains(&caller) {
            panic_with_error!(&env, Error::MissingRole);
        }

        let set = if admin {
            &mut program.admins
        } else {
            &mut program.operators
        };
        if !set.contains(&who) {
            set.push_back(who);
            env.storage().persistent().set(&DataKey::Program(id), &program);
        }
    }

    /// Remove `who` from a program's admin or operator set. Admin-gated;
    /// removing the last admin is allowed.
    pub fn revoke_program_role(env: Env, caller: Address, id: u64, who: Address, admin: bool) {
        caller.require_auth();

        let mut program = load_program(&env, id);
        if !program.admins.contains(&caller) {
            panic_with_error!(&env, Error::MissingRole);
        }

        let set = if admin {
            &mut program.admins
        } else {
            &mut program.operators
        };
        if let Some(index) = set.first_index_of(&who) {
            set.remove(index);
            env.storage().persistent().set(&DataKey::Program(id), &program);
        }
    }

    pub fn get_program(env: Env, id: u64) -> Program {
        load_program(&env, id)
    }

    pub fn program_exists(env: Env, id: u64) -> bool {
        env.storage().persistent().has(&DataKey::Program(id))
    }

    pub fn program_count(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::ProgramCount)
            .unwrap_or(0)
    }
}

/// Atomically reads, increments, and stores the program counter, returning
/// the pre-increment value as the new program's id.
fn next_program_id(env: &Env) -> u64 {
    let current: u64 = env
        .storage()
        .instance()
        .get(&DataKey::ProgramCount)
        .unwrap_or(0);
    env.storage()
        .instance()
        .set(&DataKey::ProgramCount, &(current + 1));
    current
}

fn load_program(env: &Env, id: u64) -> Program {
    match env.storage().persistent().get(&DataKey::Program(id)) {
        Some(program) => program,
        None => panic_with_error!(env, Error::ProgramNotFound),
    }
}
