//! # Roles
//!
//! Per-round access-control registry: two named roles, each mapped to a set
//! of addresses. Pure authorization predicate — no round semantics live
//! here.
//!
//! | Role       | May do                                                    |
//! |------------|-----------------------------------------------------------|
//! | `Admin`    | grant / revoke roles                                      |
//! | `Operator` | schedule, metadata, match-amount and payout mutations     |
//!
//! Membership is stored as one `Vec<Address>` per role in instance storage;
//! the sets are expected to stay small (a handful of addresses), so linear
//! scans cover both membership checks and enumeration.
//!
//! An admin revoking the last admin is allowed. The registry goes
//! permanently unadministered in that case; callers accept that outcome by
//! issuing the revoke.

use soroban_sdk::{contracttype, panic_with_error, vec, Address, Env, Symbol, Vec};

use crate::Error;

/// Named roles recognized by the round.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Admin,
    Operator,
}

/// Role storage keys (instance tier, round-lifetime TTL).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum RoleKey {
    Members(Role),
}

fn members(env: &Env, role: Role) -> Vec<Address> {
    env.storage()
        .instance()
        .get(&RoleKey::Members(role))
        .unwrap_or_else(|| vec![env])
}

fn save_members(env: &Env, role: Role, list: &Vec<Address>) {
    env.storage().instance().set(&RoleKey::Members(role), list);
}

/// Install the initial role sets at initialization.
///
/// Panics with `NoAdminsConfigured` if `admins` is empty — a round with no
/// administrators could never manage roles at all.
pub fn seed(env: &Env, admins: &Vec<Address>, operators: &Vec<Address>) {
    if admins.is_empty() {
        panic_with_error!(env, Error::NoAdminsConfigured);
    }
    for admin in admins.iter() {
        grant(env, Role::Admin, &admin);
    }
    for operator in operators.iter() {
        grant(env, Role::Operator, &operator);
    }
}

/// Return `true` if `who` holds `role`.
pub fn has_role(env: &Env, role: Role, who: &Address) -> bool {
    members(env, role).contains(who)
}

/// Panic with `MissingRole` unless `who` holds `role`.
pub fn require_role(env: &Env, role: Role, who: &Address) {
    if !has_role(env, role, who) {
        panic_with_error!(env, Error::MissingRole);
    }
}

/// Add `who` to `role`. Idempotent. Authorization is the entry point's job.
pub fn grant(env: &Env, role: Role, who: &Address) {
    let mut list = members(env, role);
    if !list.contains(who) {
        list.push_back(who.clone());
        save_members(env, role, &list);
        env.events()
            .publish((Symbol::new(env, "role_set"), who.clone()), role);
    }
}

/// Remove `who` from `role`. No-op if not a member.
pub fn revoke(env: &Env, role: Role, who: &Address) {
    let list = members(env, role);
    if let Some(index) = list.first_index_of(who) {
        let mut list = list;
        list.remove(index);
        save_members(env, role, &list);
        env.events()
            .publish((Symbol::new(env, "role_del"), who.clone()), role);
    }
}

/// Number of addresses holding `role`.
pub fn member_count(env: &Env, role: Role) -> u32 {
    members(env, role).len()
}

/// Address at `index` in `role`'s member list, or `None` past the end.
pub fn member_at(env: &Env, role: Role, index: u32) -> Option<Address> {
    members(env, role).get(index)
}
