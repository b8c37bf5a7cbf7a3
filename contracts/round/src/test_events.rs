//! The event stream is the indexer's only input, so topics and payload
//! shapes are asserted exactly.

extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec,
    xdr::ToXdr,
    Address, BytesN, Env, IntoVal, Symbol, TryIntoVal,
};

use payout_merkle::MerklePayout;
use shared::{RoundParams, RoundSchedule};
use voting_relay::{RelayVote, RelayVoting};

use crate::events::{
    FundsEscrowed, MatchAmountUpdated, MetaPtrUpdated, NewApplication, TimeUpdated,
};
use crate::test::{encoded_direct_vote, meta, project, schedule, setup, warp_to};
use crate::{Round, RoundClient};

/// Topics and data of the last event published by `contract`.
fn last_event(env: &Env) -> (Address, soroban_sdk::Vec<soroban_sdk::Val>, soroban_sdk::Val) {
    env.events().all().last().expect("no events found")
}

#[test]
fn application_event_tags_the_project() {
    let s = setup();
    warp_to(&s.env, 110);

    let project_id = project(&s.env, 7);
    let applicant = Address::generate(&s.env);
    s.client
        .apply_to_round(&applicant, &project_id, &meta(&s.env, "ipfs://app"));

    let (source, topics, data) = last_event(&s.env);
    assert_eq!(source, s.client.address);
    assert_eq!(
        topics,
        vec![
            &s.env,
            Symbol::new(&s.env, "application").into_val(&s.env),
            project_id.clone().into_val(&s.env),
        ]
    );
    let payload: NewApplication = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        payload,
        NewApplication {
            project_id,
            meta: meta(&s.env, "ipfs://app"),
        }
    );
}

#[test]
fn meta_updates_carry_old_and_new() {
    let s = setup();

    s.client
        .update_application_meta(&s.operator, &meta(&s.env, "ipfs://form-v2"));

    let (source, topics, data) = last_event(&s.env);
    assert_eq!(source, s.client.address);
    assert_eq!(
        topics,
        vec![&s.env, Symbol::new(&s.env, "app_meta").into_val(&s.env)]
    );
    let payload: MetaPtrUpdated = data.try_into_val(&s.env).unwrap();
    assert_eq!(payload.old, meta(&s.env, "ipfs://form"));
    assert_eq!(payload.new, meta(&s.env, "ipfs://form-v2"));
}

#[test]
fn time_updates_carry_old_and_new() {
    let s = setup();

    s.client.update_round_end_time(&s.operator, &2000);

    let (source, topics, data) = last_event(&s.env);
    assert_eq!(source, s.client.address);
    assert_eq!(
        topics,
        vec![&s.env, Symbol::new(&s.env, "round_end").into_val(&s.env)]
    );
    let payload: TimeUpdated = data.try_into_val(&s.env).unwrap();
    assert_eq!(payload, TimeUpdated { old: 1000, new: 2000 });
}

#[test]
fn match_amount_event_carries_the_new_amount() {
    let s = setup();

    s.client.update_match_amount(&s.operator, &42);

    let (source, topics, data) = last_event(&s.env);
    assert_eq!(source, s.client.address);
    assert_eq!(
        topics,
        vec![&s.env, Symbol::new(&s.env, "match_amount").into_val(&s.env)]
    );
    let payload: MatchAmountUpdated = data.try_into_val(&s.env).unwrap();
    assert_eq!(payload, MatchAmountUpdated { amount: 42 });
}

#[test]
fn escrow_event_records_amount_and_destination() {
    let s = setup();
    s.client.update_match_amount(&s.operator, &50);

    warp_to(&s.env, 1100);
    s.client.update_distribution(
        &s.operator,
        &BytesN::from_array(&s.env, &[0xaa; 32]),
        &meta(&s.env, "ipfs://dist"),
    );
    soroban_sdk::token::StellarAssetClient::new(&s.env, &s.token).mint(&s.client.address, &50);

    s.client.set_ready_for_payout(&s.operator);

    let (source, topics, data) = last_event(&s.env);
    assert_eq!(source, s.client.address);
    assert_eq!(
        topics,
        vec![&s.env, Symbol::new(&s.env, "escrow").into_val(&s.env)]
    );
    let payload: FundsEscrowed = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        payload,
        FundsEscrowed {
            amount: 50,
            destination: s.payout.clone(),
        }
    );
}

#[test]
fn direct_votes_are_attributed_to_the_caller() {
    let s = setup();
    warp_to(&s.env, 600);

    let voter = Address::generate(&s.env);
    s.client.vote(
        &voter,
        &vec![&s.env, encoded_direct_vote(&s.env, &s.token, 75, 3)],
    );

    let (source, topics, data) = last_event(&s.env);
    assert_eq!(source, s.voting);
    assert_eq!(
        topics,
        vec![
            &s.env,
            symbol_short!("voted").into_val(&s.env),
            s.client.address.clone().into_val(&s.env),
        ]
    );
    let payload: voting_direct::VoteCast = data.try_into_val(&s.env).unwrap();
    assert_eq!(payload.voter, voter);
    assert_eq!(payload.amount, 75);
    assert_eq!(payload.round, s.client.address);
}

#[test]
fn relayed_votes_are_attributed_to_the_named_principal() {
    let env = Env::default();
    env.mock_all_auths();

    let client = RoundClient::new(&env, &env.register(Round, ()));
    let voting = env.register(RelayVoting, ());
    let payout = env.register(MerklePayout, ());
    let token_admin = Address::generate(&env);
    let token = env.register_stellar_asset_contract_v2(token_admin).address();
    let admin = Address::generate(&env);

    client.initialize(&RoundParams {
        token: token.clone(),
        schedule: schedule(),
        voting_strategy: voting.clone(),
        payout_strategy: payout,
        round_meta: meta(&env, "ipfs://round"),
        application_meta: meta(&env, "ipfs://form"),
        projects_meta: meta(&env, "ipfs://projects"),
        program_id: 0,
        admins: vec![&env, admin.clone()],
        operators: vec![&env],
    });

    warp_to(&env, 600);
    let relayer = Address::generate(&env);
    let principal = Address::generate(&env);
    let record = RelayVote {
        on_behalf_of: principal.clone(),
        token: token.clone(),
        amount: 30,
        beneficiary: Address::generate(&env),
        project_id: project(&env, 5),
    };
    client.vote(&relayer, &vec![&env, record.to_xdr(&env)]);

    let all_events = env.events().all();
    let (source, _, data) = all_events.last().expect("no events found");
    assert_eq!(source, voting);
    let payload: voting_relay::VoteCast = data.try_into_val(&env).unwrap();
    assert_eq!(payload.voter, principal);
    assert_ne!(payload.voter, relayer);
    assert_eq!(payload.round, client.address);
}

#[test]
fn schedule_fields_emit_their_own_topics() {
    let s = setup();

    // Push round_end out first so earlier fields have headroom, then check
    // each topic symbol matches its field.
    let cases: [(&str, fn(&crate::test::Setup, u64)); 4] = [
        ("round_end", |s, t| {
            s.client.update_round_end_time(&s.operator, &t)
        }),
        ("round_start", |s, t| {
            s.client.update_round_start_time(&s.operator, &t)
        }),
        ("apps_end", |s, t| {
            s.client.update_applications_end_time(&s.operator, &t)
        }),
        ("apps_start", |s, t| {
            s.client.update_applications_start_time(&s.operator, &t)
        }),
    ];
    let targets: [u64; 4] = [2000, 600, 300, 150];
    // Old values from the initial (100, 250, 500, 1000) schedule, in the
    // same update order. Each event must report the field it changed, not
    // a neighbour.
    let olds: [u64; 4] = [1000, 500, 250, 100];

    for (((topic, apply), target), old) in cases.iter().zip(targets.iter()).zip(olds.iter()) {
        apply(&s, *target);
        let (_, topics, data) = last_event(&s.env);
        assert_eq!(
            topics,
            vec![&s.env, Symbol::new(&s.env, topic).into_val(&s.env)]
        );
        let payload: TimeUpdated = data.try_into_val(&s.env).unwrap();
        assert_eq!(payload.old, *old);
        assert_eq!(payload.new, *target);
    }

    let final_schedule = s.client.get_round().schedule;
    assert_eq!(
        final_schedule,
        RoundSchedule {
            apps_start: 150,
            apps_end: 300,
            round_start: 600,
            round_end: 2000,
        }
    );
}
