extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec,
    xdr::ToXdr,
    Address, Bytes, BytesN, Env, TryIntoVal,
};

use crate::{Error, RelayVote, RelayVoting, RelayVotingClient, VoteCast};

fn setup() -> (Env, RelayVotingClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(RelayVoting, ());
    let client = RelayVotingClient::new(&env, &contract_id);
    let round = Address::generate(&env);
    client.init(&round);
    (env, client, round)
}

#[test]
fn vote_is_attributed_to_on_behalf_of_not_relayer() {
    let (env, client, round) = setup();

    let relayer = Address::generate(&env);
    let principal = Address::generate(&env);
    let vote = RelayVote {
        on_behalf_of: principal.clone(),
        token: Address::generate(&env),
        amount: 900,
        beneficiary: Address::generate(&env),
        project_id: BytesN::from_array(&env, &[3u8; 32]),
    };
    client.vote(&vec![&env, vote.clone().to_xdr(&env)], &relayer);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("no events found");
    let data: VoteCast = last_event.2.try_into_val(&env).unwrap();

    assert_eq!(data.voter, principal);
    assert_ne!(data.voter, relayer);
    assert_eq!(data.round, round);
    assert_eq!(data.amount, 900);
}

#[test]
fn rebinding_fails() {
    let (env, client, _round) = setup();
    let other = Address::generate(&env);
    assert_eq!(client.try_init(&other), Err(Ok(Error::AlreadyLinked.into())));
}

#[test]
fn direct_shaped_payload_is_malformed_here() {
    let (env, client, _round) = setup();
    let relayer = Address::generate(&env);

    // A payload missing the leading on_behalf_of field does not decode as
    // a RelayVote.
    let garbage = Bytes::from_array(&env, &[0u8; 8]);
    assert_eq!(
        client.try_vote(&vec![&env, garbage], &relayer),
        Err(Ok(Error::MalformedVote.into()))
    );
}

#[test]
fn relay_kind_reported() {
    let (_env, client, _round) = setup();
    assert_eq!(client.kind(), symbol_short!("relay"));
}
