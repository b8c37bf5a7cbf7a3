//! # Merkle proof verification
//!
//! Sorted-pair SHA-256 tree: each internal node hashes the concatenation of
//! its two children in ascending byte order, so a proof needs no left/right
//! position bits. The distribution builder off-ledger must use the same
//! convention.

use soroban_sdk::{Bytes, BytesN, Env, Vec};

/// Hash a sorted pair of nodes.
pub fn hash_pair(env: &Env, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let mut joined = Bytes::new(env);
    joined.append(&Bytes::from(lo.clone()));
    joined.append(&Bytes::from(hi.clone()));
    env.crypto().sha256(&joined).into()
}

/// Fold `leaf` up through `proof` and compare the result to `root`.
pub fn verify(env: &Env, proof: &Vec<BytesN<32>>, root: &BytesN<32>, leaf: &BytesN<32>) -> bool {
    let mut computed = leaf.clone();
    for sibling in proof.iter() {
        computed = hash_pair(env, &computed, &sibling);
    }
    computed == *root
}
