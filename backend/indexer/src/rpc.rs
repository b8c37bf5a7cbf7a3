//! Soroban RPC client — polls `getEvents` and decodes protocol events.
//!
//! Unlike a single-contract indexer, the contract set here is open: the
//! factory deploys new round contracts at runtime and each round binds its
//! own strategy contracts, so the query cannot enumerate contract ids up
//! front. Events are fetched unfiltered and classified downstream — the
//! projector anchors on the configured factory/registry addresses and only
//! trusts round-scoped events once the factory has confirmed the round.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or
//!   rate-limit response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried,
//!   but at most [`MAX_RETRIES`] times per call; after that the error is
//!   returned so the poll loop stays responsive to shutdown.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{normalize_bytes, ChainEvent, EventKind};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;
const MAX_RETRIES: u32 = 5;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[allow(dead_code)]
pub struct RawEvent {
    /// XDR-decoded topic list
    pub topic: Vec<String>,
    /// XDR-decoded event value / data
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger` — the ledger sequence to scan from (inclusive).
/// * `cursor`       — optional opaque pagination cursor from a previous response.
/// * `limit`        — maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
///
/// Retryable failures (transport errors, rate limits, soft RPC errors) are
/// retried with back-off at most [`MAX_RETRIES`] times; after that the last
/// error is returned to the caller.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;
    let mut retries_left = MAX_RETRIES;

    loop {
        let params = build_params(start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let failure = match response {
            Err(e) => {
                warn!("RPC request failed: {e}");
                IndexerError::Http(e)
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC");
                    IndexerError::Rpc {
                        code: status.as_u16() as i64,
                        message: "rate limited".to_string(),
                    }
                } else {
                    let body: RpcResponse = resp.json().await?;

                    match body.error {
                        Some(err) => {
                            // Code -32600 / -32601 are hard failures; everything
                            // else is worth a retry
                            let hard = err.code == -32600 || err.code == -32601;
                            let failure = IndexerError::Rpc {
                                code: err.code,
                                message: err.message,
                            };
                            if hard {
                                return Err(failure);
                            }
                            warn!("RPC soft error: {failure}");
                            failure
                        }
                        None => {
                            let result = body.result.ok_or_else(|| {
                                IndexerError::EventParse(
                                    "Empty result from getEvents".to_string(),
                                )
                            })?;

                            debug!(
                                "Fetched {} events (latest_ledger={:?})",
                                result.events.len(),
                                result.latest_ledger
                            );

                            return Ok((result.events, result.cursor, result.latest_ledger));
                        }
                    }
                }
            }
        };

        if retries_left == 0 {
            return Err(failure);
        }
        retries_left -= 1;
        debug!("Retrying in {backoff}s ({retries_left} retries left)");
        tokio::time::sleep(Duration::from_secs(backoff)).await;
        backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
    }
}

fn build_params(start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [ { "type": "contract" } ],
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events. Events from failed invocations and
/// entries without an emitting contract are dropped.
pub fn decode_events(raw: &[RawEvent]) -> Vec<ChainEvent> {
    raw.iter().filter_map(decode_single).collect()
}

fn decode_single(raw: &RawEvent) -> Option<ChainEvent> {
    if raw.in_successful_contract_call == Some(false) {
        return None;
    }
    let contract_id = raw.contract_id.clone()?;

    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(&extract_symbol(first_topic));

    let topic_key = raw.topic.get(1).and_then(|t| extract_topic_key(t));

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    Some(ChainEvent {
        kind,
        contract_id,
        topic_key,
        data: raw.value.clone(),
        ledger,
        timestamp,
        tx_hash: raw.tx_hash.clone(),
        event_id: raw.id.clone(),
    })
}

/// Extract a Soroban Symbol from the XDR-decoded topic string.
/// The RPC may return `{"type":"symbol","value":"voted"}` or just the raw
/// string.
fn extract_symbol(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    // Fallback: treat the raw string as the symbol
    raw.to_string()
}

/// Extract the second topic entry — an address, a u64 id or a byte digest —
/// into one canonical string form.
fn extract_topic_key(raw: &str) -> Option<String> {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(inner) = v.get("value") {
            if let Some(n) = inner.as_u64() {
                return Some(n.to_string());
            }
            if let Some(s) = normalize_topic_value(inner) {
                return Some(s);
            }
        }
    }
    Some(raw.to_string())
}

fn normalize_topic_value(v: &Value) -> Option<String> {
    match v {
        // Addresses are already Strkey strings; keep them verbatim.
        Value::String(s) if s.starts_with('C') || s.starts_with('G') => Some(s.clone()),
        _ => normalize_bytes(v),
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
