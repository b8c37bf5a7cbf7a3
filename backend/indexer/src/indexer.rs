//! Long-running background task that polls the Soroban RPC and projects
//! decoded protocol events into the read model.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::projector::{self, Anchors};
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Run the indexer loop until `cancel` fires.
///
/// The cursor is persisted after every fully projected batch, so a restart
/// resumes from the last applied ledger rather than re-scanning history.
pub async fn run(state: Arc<IndexerState>, cancel: CancellationToken) {
    info!(
        "Indexer starting — factory: {}, registry: {}",
        state.config.factory_contract_id, state.config.registry_contract_id
    );

    let anchors = Anchors {
        factory: state.config.factory_contract_id.clone(),
        registry: state.config.registry_contract_id.clone(),
    };

    // Load the cursor from the DB; fall back to the configured start ledger.
    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let mut cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);
    let mut current_ledger = if last_ledger > 0 {
        last_ledger as u32
    } else {
        state.config.start_ledger
    };

    info!("Resuming from ledger {current_ledger}");

    loop {
        match poll_once(&state, &anchors, current_ledger, cursor.as_deref()).await {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(e) => {
                error!("Indexer poll error: {e}");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Indexer shutting down");
                return;
            }
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    state: &IndexerState,
    anchors: &Anchors,
    start_ledger: u32,
    cursor: Option<&str>,
) -> crate::errors::Result<(u32, Option<String>)> {
    let (raw_events, next_cursor, latest_ledger) = rpc::fetch_events(
        &state.client,
        &state.config.rpc_url,
        start_ledger,
        cursor,
        state.config.events_per_page,
    )
    .await?;

    if !raw_events.is_empty() {
        let decoded = rpc::decode_events(&raw_events);
        // Ledger order is the RPC's delivery order; apply sequentially.
        for ev in &decoded {
            projector::apply_event(&state.pool, anchors, ev).await?;
        }
        info!(
            "Polled {} raw events → {} projected",
            raw_events.len(),
            decoded.len()
        );
    }

    // Advance the ledger cursor:
    // - If there is a next_cursor string, keep the same start_ledger so the next
    //   call paginates within the same ledger range.
    // - Otherwise advance to the latest known ledger.
    let next_ledger = latest_ledger
        .map(|l| (l as u32).max(start_ledger))
        .unwrap_or(start_ledger);

    // Persist cursor so restarts are deterministic.
    db::save_cursor(&state.pool, next_ledger as i64, next_cursor.as_deref()).await?;

    Ok((next_ledger, next_cursor))
}
