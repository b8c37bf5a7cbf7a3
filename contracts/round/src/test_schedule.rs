//! Schedule invariant coverage: creation-time validation, update-time
//! re-validation, and the not-in-the-past rule.

extern crate std;

use soroban_sdk::{testutils::Address as _, vec, Address, Env};

use payout_merkle::MerklePayout;
use shared::{RoundParams, RoundSchedule};
use voting_direct::DirectVoting;

use crate::invariants;
use crate::test::{meta, schedule, setup, warp_to};
use crate::{Error, Round, RoundClient};

/// Initialize a fresh round with `s`, returning the typed error if any.
fn try_initialize(env: &Env, s: RoundSchedule) -> Result<(), Error> {
    let client = RoundClient::new(env, &env.register(Round, ()));
    let voting = env.register(DirectVoting, ());
    let payout = env.register(MerklePayout, ());
    let token_admin = Address::generate(env);
    let token = env
        .register_stellar_asset_contract_v2(token_admin)
        .address();

    let result = client.try_initialize(&RoundParams {
        token,
        schedule: s,
        voting_strategy: voting,
        payout_strategy: payout,
        round_meta: meta(env, "ipfs://round"),
        application_meta: meta(env, "ipfs://form"),
        projects_meta: meta(env, "ipfs://projects"),
        program_id: 0,
        admins: vec![env, Address::generate(env)],
        operators: vec![env],
    });
    match result {
        Ok(_) => Ok(()),
        Err(Ok(error)) => Err(error.try_into().unwrap()),
        Err(Err(_)) => panic!("unexpected invoke error"),
    }
}

fn sched(apps_start: u64, apps_end: u64, round_start: u64, round_end: u64) -> RoundSchedule {
    RoundSchedule {
        apps_start,
        apps_end,
        round_start,
        round_end,
    }
}

#[test]
fn creation_validates_each_invariant() {
    let env = Env::default();
    env.mock_all_auths();

    // The reference schedule passes.
    assert_eq!(try_initialize(&env, sched(100, 250, 500, 1000)), Ok(()));

    // Applications window inverted.
    assert_eq!(
        try_initialize(&env, sched(100, 50, 500, 1000)),
        Err(Error::ApplicationsWindowInvalid)
    );
    // Empty applications window.
    assert_eq!(
        try_initialize(&env, sched(100, 100, 500, 1000)),
        Err(Error::ApplicationsWindowInvalid)
    );
    // Voting window inverted.
    assert_eq!(
        try_initialize(&env, sched(100, 250, 1000, 500)),
        Err(Error::RoundWindowInvalid)
    );
    // Applications close after the round ends.
    assert_eq!(
        try_initialize(&env, sched(100, 1200, 500, 1000)),
        Err(Error::StartAfterEnd)
    );
    // Applications open after voting starts.
    assert_eq!(
        try_initialize(&env, sched(600, 700, 500, 1000)),
        Err(Error::StartAfterEnd)
    );
}

#[test]
fn creation_rejects_a_schedule_already_begun() {
    let env = Env::default();
    env.mock_all_auths();
    warp_to(&env, 150);

    // apps_start = 100 is in the past at now = 150.
    assert_eq!(
        try_initialize(&env, sched(100, 250, 500, 1000)),
        Err(Error::AlreadyPassed)
    );
    // Starting exactly now is fine.
    assert_eq!(try_initialize(&env, sched(150, 250, 500, 1000)), Ok(()));
}

#[test]
fn creation_matches_the_invariant_predicate() {
    // Cross-check the contract against the closed-form predicate over a
    // grid of timestamp combinations.
    let env = Env::default();
    env.mock_all_auths();

    let points: [u64; 4] = [100, 250, 500, 1000];
    for &a0 in &points {
        for &a1 in &points {
            for &r0 in &points {
                for &r1 in &points {
                    let accepted = try_initialize(&env, sched(a0, a1, r0, r1)).is_ok();
                    assert_eq!(
                        accepted,
                        invariants::schedule_is_valid(a0, a1, r0, r1),
                        "divergence at ({a0}, {a1}, {r0}, {r1})"
                    );
                }
            }
        }
    }
}

#[test]
fn updates_revalidate_against_the_other_three_times() {
    let s = setup();

    // Pushing the applications end past the round end violates ordering.
    assert_eq!(
        s.client.try_update_applications_end_time(&s.operator, &2000),
        Err(Ok(Error::StartAfterEnd.into()))
    );
    // Pulling the round end below the round start inverts the voting window.
    assert_eq!(
        s.client.try_update_round_end_time(&s.operator, &400),
        Err(Ok(Error::RoundWindowInvalid.into()))
    );
    // Moving the applications start after the round start violates ordering.
    assert_eq!(
        s.client.try_update_applications_start_time(&s.operator, &600),
        Err(Ok(Error::StartAfterEnd.into()))
    );
    // Failed updates leave the schedule untouched.
    assert_eq!(s.client.get_round().schedule, schedule());

    // A consistent extension passes and is visible.
    s.client.update_round_end_time(&s.operator, &2000);
    s.client.update_applications_end_time(&s.operator, &1500);
    let updated = s.client.get_round().schedule;
    assert_eq!(updated.round_end, 2000);
    assert_eq!(updated.apps_end, 1500);
}

#[test]
fn updates_reject_past_times() {
    let s = setup();
    warp_to(&s.env, 600);

    assert_eq!(
        s.client.try_update_round_end_time(&s.operator, &550),
        Err(Ok(Error::AlreadyPassed.into()))
    );
}

#[test]
fn nothing_moves_after_round_end() {
    let s = setup();
    warp_to(&s.env, 1200);

    assert_eq!(
        s.client.try_update_round_end_time(&s.operator, &2000),
        Err(Ok(Error::RoundHasEnded.into()))
    );
    assert_eq!(
        s.client.try_update_applications_start_time(&s.operator, &1300),
        Err(Ok(Error::RoundHasEnded.into()))
    );
}
