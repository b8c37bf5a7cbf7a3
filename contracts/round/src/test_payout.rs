//! The ready-for-payout handshake: precondition ordering, escrow atomicity,
//! and the end-to-end claim flow through the Merkle payout strategy.

extern crate std;

use soroban_sdk::{testutils::Address as _, token, vec, Address, BytesN};

use payout_merkle::MerklePayoutClient;

use crate::test::{meta, setup, warp_to, Setup};
use crate::Error;

fn token_client(s: &Setup) -> token::Client<'_> {
    token::Client::new(&s.env, &s.token)
}

fn mint_to_round(s: &Setup, amount: i128) {
    token::StellarAssetClient::new(&s.env, &s.token).mint(&s.client.address, &amount);
}

fn commit_distribution(s: &Setup, root: &BytesN<32>) {
    s.client
        .update_distribution(&s.operator, root, &meta(&s.env, "ipfs://dist"));
}

#[test]
fn handshake_requires_round_end() {
    let s = setup();
    s.client.update_match_amount(&s.operator, &5);

    warp_to(&s.env, 900);
    assert_eq!(
        s.client.try_set_ready_for_payout(&s.operator),
        Err(Ok(Error::RoundHasNotEnded.into()))
    );
}

#[test]
fn handshake_walks_through_each_precondition() {
    let s = setup();
    s.client.update_match_amount(&s.operator, &5);
    warp_to(&s.env, 1100);

    let payout = MerklePayoutClient::new(&s.env, &s.payout);
    let tokens = token_client(&s);

    // No distribution committed yet.
    assert_eq!(
        s.client.try_set_ready_for_payout(&s.operator),
        Err(Ok(Error::DistributionNotSet.into()))
    );
    assert!(!payout.is_ready_for_payout());

    // Distribution committed but the round custodies 4 < 5.
    commit_distribution(&s, &BytesN::from_array(&s.env, &[0xaa; 32]));
    mint_to_round(&s, 4);
    assert_eq!(
        s.client.try_set_ready_for_payout(&s.operator),
        Err(Ok(Error::InsufficientFunds.into()))
    );
    // Failed attempts moved nothing and latched nothing.
    assert_eq!(tokens.balance(&s.client.address), 4);
    assert_eq!(tokens.balance(&s.payout), 0);
    assert!(!payout.is_ready_for_payout());
    assert!(!s.client.is_ready_for_payout());

    // Topped up: the handshake escrows and latches in one step.
    mint_to_round(&s, 1);
    s.client.set_ready_for_payout(&s.operator);
    assert_eq!(tokens.balance(&s.client.address), 0);
    assert_eq!(tokens.balance(&s.payout), 5);
    assert!(payout.is_ready_for_payout());
    assert!(s.client.is_ready_for_payout());

    // The latch is one-shot.
    assert_eq!(
        s.client.try_set_ready_for_payout(&s.operator),
        Err(Ok(Error::AlreadyReady.into()))
    );
}

#[test]
fn raising_match_amount_raises_the_balance_requirement() {
    let s = setup();
    s.client.update_match_amount(&s.operator, &5);
    s.client.update_match_amount(&s.operator, &10);

    warp_to(&s.env, 1100);
    commit_distribution(&s, &BytesN::from_array(&s.env, &[0xbb; 32]));

    mint_to_round(&s, 5);
    assert_eq!(
        s.client.try_set_ready_for_payout(&s.operator),
        Err(Ok(Error::InsufficientFunds.into()))
    );

    mint_to_round(&s, 5);
    s.client.set_ready_for_payout(&s.operator);
    assert_eq!(token_client(&s).balance(&s.payout), 10);
}

#[test]
fn handshake_is_operator_gated() {
    let s = setup();
    warp_to(&s.env, 1100);

    let stranger = Address::generate(&s.env);
    assert_eq!(
        s.client.try_set_ready_for_payout(&stranger),
        Err(Ok(Error::MissingRole.into()))
    );
    // Admin alone does not carry the operator role.
    assert_eq!(
        s.client.try_set_ready_for_payout(&s.admin),
        Err(Ok(Error::MissingRole.into()))
    );
}

#[test]
fn distribution_updates_only_flow_through_operators() {
    let s = setup();
    let stranger = Address::generate(&s.env);
    let root = BytesN::from_array(&s.env, &[0xcc; 32]);

    assert_eq!(
        s.client
            .try_update_distribution(&stranger, &root, &meta(&s.env, "ipfs://dist")),
        Err(Ok(Error::MissingRole.into()))
    );

    s.client
        .update_distribution(&s.operator, &root, &meta(&s.env, "ipfs://dist"));
    let payout = MerklePayoutClient::new(&s.env, &s.payout);
    assert!(payout.is_distribution_set());
    assert_eq!(payout.get_distribution().unwrap().merkle_root, root);
}

#[test]
fn escrowed_funds_are_claimable_against_the_distribution() {
    let s = setup();
    s.client.update_match_amount(&s.operator, &100);

    let alice = Address::generate(&s.env);
    let bob = Address::generate(&s.env);
    let leaf_alice = payout_merkle::leaf_hash(&s.env, &alice, 60);
    let leaf_bob = payout_merkle::leaf_hash(&s.env, &bob, 40);
    let root = {
        // Sorted-pair convention shared with the strategy.
        let (lo, hi) = if leaf_alice < leaf_bob {
            (&leaf_alice, &leaf_bob)
        } else {
            (&leaf_bob, &leaf_alice)
        };
        let mut joined = soroban_sdk::Bytes::new(&s.env);
        joined.append(&soroban_sdk::Bytes::from(lo.clone()));
        joined.append(&soroban_sdk::Bytes::from(hi.clone()));
        let root: BytesN<32> = s.env.crypto().sha256(&joined).into();
        root
    };

    warp_to(&s.env, 1100);
    commit_distribution(&s, &root);
    mint_to_round(&s, 100);
    s.client.set_ready_for_payout(&s.operator);

    let payout = MerklePayoutClient::new(&s.env, &s.payout);
    payout.payout(&vec![&s.env, leaf_bob.clone()], &alice, &60);
    payout.payout(&vec![&s.env, leaf_alice.clone()], &bob, &40);

    let tokens = token_client(&s);
    assert_eq!(tokens.balance(&alice), 60);
    assert_eq!(tokens.balance(&bob), 40);
    assert_eq!(tokens.balance(&s.payout), 0);
}
