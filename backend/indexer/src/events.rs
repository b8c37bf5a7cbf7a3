//! Canonical event types emitted by the on-chain protocol contracts.
//!
//! These mirror the Soroban events defined in `contracts/round/src/events.rs`,
//! the two voting strategies, the Merkle payout strategy, the program
//! registry, and the round factory. The leading topic symbol identifies the
//! event; the second topic (when present) carries the key the event is
//! scoped to (round address, program id, project id, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// All recognised event kinds across the protocol's contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A program was registered (`program_created`, from the registry).
    ProgramCreated,
    /// A program's metadata pointer changed (`program_meta`).
    ProgramMetaUpdated,
    /// The factory deployed and confirmed a round (`round_created`).
    RoundCreated,
    /// The factory switched implementations (`impl_updated`).
    ImplementationUpdated,
    /// A round bound its configuration (`round_init`, from the round).
    RoundInitialized,
    /// A voting strategy bound itself to a round (`voting_init`).
    VotingInit,
    /// A payout strategy bound itself to a round (`payout_init`).
    PayoutInit,
    /// Round document pointer changed (`round_meta`).
    RoundMetaUpdated,
    /// Application form pointer changed (`app_meta`).
    ApplicationMetaUpdated,
    /// Approved-projects pointer changed (`projects_meta`).
    ProjectsMetaUpdated,
    /// Application window opening moved (`apps_start`).
    AppsStartUpdated,
    /// Application window closing moved (`apps_end`).
    AppsEndUpdated,
    /// Voting window opening moved (`round_start`).
    RoundStartUpdated,
    /// Round end moved (`round_end`).
    RoundEndUpdated,
    /// Committed match amount raised (`match_amount`).
    MatchAmountUpdated,
    /// A project applied to a round (`application`).
    NewApplication,
    /// A vote was cast through a strategy (`voted`).
    Voted,
    /// A payout distribution was committed (`distribution`).
    DistributionUpdated,
    /// A payout strategy latched readiness (`ready`).
    ReadyForPayout,
    /// A round escrowed its match funds (`escrow`).
    FundsEscrowed,
    /// A distribution leaf was paid out (`claimed`).
    Claimed,
    /// A role was granted (`role_set`).
    RoleSet,
    /// A role was revoked (`role_del`).
    RoleDel,
    /// An event whose topic we don't recognise.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban.
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "program_created" => Self::ProgramCreated,
            "program_meta" => Self::ProgramMetaUpdated,
            "round_created" => Self::RoundCreated,
            "impl_updated" => Self::ImplementationUpdated,
            "round_init" => Self::RoundInitialized,
            "voting_init" => Self::VotingInit,
            "payout_init" => Self::PayoutInit,
            "round_meta" => Self::RoundMetaUpdated,
            "app_meta" => Self::ApplicationMetaUpdated,
            "projects_meta" => Self::ProjectsMetaUpdated,
            "apps_start" => Self::AppsStartUpdated,
            "apps_end" => Self::AppsEndUpdated,
            "round_start" => Self::RoundStartUpdated,
            "round_end" => Self::RoundEndUpdated,
            "match_amount" => Self::MatchAmountUpdated,
            "application" => Self::NewApplication,
            "voted" => Self::Voted,
            "distribution" => Self::DistributionUpdated,
            "ready" => Self::ReadyForPayout,
            "escrow" => Self::FundsEscrowed,
            "claimed" => Self::Claimed,
            "role_set" => Self::RoleSet,
            "role_del" => Self::RoleDel,
            _ => Self::Unknown,
        }
    }

    /// Short identifier suitable for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgramCreated => "program_created",
            Self::ProgramMetaUpdated => "program_meta",
            Self::RoundCreated => "round_created",
            Self::ImplementationUpdated => "impl_updated",
            Self::RoundInitialized => "round_init",
            Self::VotingInit => "voting_init",
            Self::PayoutInit => "payout_init",
            Self::RoundMetaUpdated => "round_meta",
            Self::ApplicationMetaUpdated => "app_meta",
            Self::ProjectsMetaUpdated => "projects_meta",
            Self::AppsStartUpdated => "apps_start",
            Self::AppsEndUpdated => "apps_end",
            Self::RoundStartUpdated => "round_start",
            Self::RoundEndUpdated => "round_end",
            Self::MatchAmountUpdated => "match_amount",
            Self::NewApplication => "application",
            Self::Voted => "voted",
            Self::DistributionUpdated => "distribution",
            Self::ReadyForPayout => "ready",
            Self::FundsEscrowed => "escrow",
            Self::Claimed => "claimed",
            Self::RoleSet => "role_set",
            Self::RoleDel => "role_del",
            Self::Unknown => "unknown",
        }
    }
}

/// A decoded chain event, ready for the projector.
///
/// `data` is the RPC's XDR-to-JSON rendering of the event payload; the
/// projector pulls typed fields out of it with the helpers below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEvent {
    pub kind: EventKind,
    /// The emitting contract.
    pub contract_id: String,
    /// Second topic entry, normalised to a string (address, id, digest).
    pub topic_key: Option<String>,
    pub data: Value,
    pub ledger: i64,
    pub timestamp: i64,
    pub tx_hash: Option<String>,
    /// The chain's unique event id; idempotency key for append-only tables.
    pub event_id: Option<String>,
}

// ─────────────────────────────────────────────────────────
// JSON field helpers
// ─────────────────────────────────────────────────────────

/// String-valued field of a JSON object payload.
pub fn field_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Unsigned integer field; the RPC renders u64 as either a number or a
/// decimal string.
pub fn field_u64(value: &Value, key: &str) -> Option<u64> {
    let v = value.get(key)?;
    v.as_u64().or_else(|| v.as_str()?.parse().ok())
}

/// Amount field (i128). Always normalised to a decimal string because i128
/// exceeds JSON's number range.
pub fn field_amount(value: &Value, key: &str) -> Option<String> {
    let v = value.get(key)?;
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Nested `MetadataPointer { protocol, pointer }` field.
pub fn field_meta(value: &Value, key: &str) -> Option<(i64, String)> {
    let obj = value.get(key)?;
    let protocol = obj.get("protocol")?.as_i64()?;
    let pointer = obj.get("pointer")?.as_str()?.to_string();
    Some((protocol, pointer))
}

/// Digest or byte-string field, normalised to lowercase hex. The RPC renders
/// `BytesN<32>` either as a hex string or as a JSON byte array.
pub fn field_bytes_hex(value: &Value, key: &str) -> Option<String> {
    normalize_bytes(value.get(key)?)
}

/// Normalise a JSON rendering of chain bytes to lowercase hex.
pub fn normalize_bytes(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.to_lowercase()),
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|i| i.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect();
            bytes.map(hex::encode)
        }
        _ => None,
    }
}
