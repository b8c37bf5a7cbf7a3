//! Applies decoded chain events to the read model, in ledger order.
//!
//! ## Trust anchors
//!
//! Events arrive unfiltered, so each handler decides whether the emitting
//! contract is trustworthy:
//!
//! * `program_created` / `program_meta` are only accepted from the
//!   configured registry contract.
//! * `round_created` / `impl_updated` are only accepted from the configured
//!   factory contract.
//! * `round_init`, `voting_init` and `payout_init` are staged from any
//!   contract; their rows only become visible once a factory-confirmed
//!   round references them.
//! * Round-scoped updates (`application`, `voted`, pointer/time/amount
//!   changes, `distribution`, `escrow`) are only applied to rounds already
//!   present in the read model.
//!
//! ## Missing-reference policy
//!
//! When `round_created` references a program or voting strategy that is not
//! yet in the read model, the round is skipped with a warning rather than
//! recorded with a dangling reference. A skipped round is only recovered by
//! re-delivery of its events. The payout strategy is weaker: if it never
//! announced itself, its raw address from the staged init is recorded
//! as-is.
//!
//! Every handler is idempotent by primary key, so re-processing the same
//! event twice is a no-op.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::db::{self, ApplicationRow, MetaColumn, RoundInitRow, TimeColumn, VoteRow};
use crate::errors::Result;
use crate::events::{field_amount, field_bytes_hex, field_meta, field_str, field_u64, ChainEvent, EventKind};

/// Contract addresses the projector anchors trust on.
#[derive(Debug, Clone)]
pub struct Anchors {
    pub factory: String,
    pub registry: String,
}

/// Apply one event to the read model.
///
/// Returns `Ok(())` even when the event is skipped; only infrastructure
/// failures (database errors) propagate.
pub async fn apply_event(pool: &SqlitePool, anchors: &Anchors, ev: &ChainEvent) -> Result<()> {
    match ev.kind {
        EventKind::ProgramCreated => apply_program_created(pool, anchors, ev).await,
        EventKind::ProgramMetaUpdated => apply_program_meta(pool, anchors, ev).await,
        EventKind::RoundInitialized => apply_round_init(pool, ev).await,
        EventKind::VotingInit => apply_voting_init(pool, ev).await,
        EventKind::PayoutInit => apply_payout_init(pool, ev).await,
        EventKind::RoundCreated => apply_round_created(pool, anchors, ev).await,
        EventKind::NewApplication => apply_application(pool, ev).await,
        EventKind::Voted => apply_vote(pool, ev).await,
        EventKind::RoundMetaUpdated => apply_meta_update(pool, ev, MetaColumn::Round).await,
        EventKind::ApplicationMetaUpdated => {
            apply_meta_update(pool, ev, MetaColumn::Application).await
        }
        EventKind::ProjectsMetaUpdated => apply_meta_update(pool, ev, MetaColumn::Projects).await,
        EventKind::AppsStartUpdated => apply_time_update(pool, ev, TimeColumn::AppsStart).await,
        EventKind::AppsEndUpdated => apply_time_update(pool, ev, TimeColumn::AppsEnd).await,
        EventKind::RoundStartUpdated => apply_time_update(pool, ev, TimeColumn::RoundStart).await,
        EventKind::RoundEndUpdated => apply_time_update(pool, ev, TimeColumn::RoundEnd).await,
        EventKind::MatchAmountUpdated => apply_match_amount(pool, ev).await,
        EventKind::DistributionUpdated => apply_distribution(pool, ev).await,
        EventKind::FundsEscrowed => apply_escrow(pool, ev).await,
        // Latching and claims are observable through the round row and the
        // strategy contract itself; role churn and implementation swaps are
        // not part of the read model.
        EventKind::ReadyForPayout
        | EventKind::Claimed
        | EventKind::ImplementationUpdated
        | EventKind::RoleSet
        | EventKind::RoleDel => {
            debug!(kind = ev.kind.as_str(), contract = %ev.contract_id, "event noted, not materialized");
            Ok(())
        }
        EventKind::Unknown => {
            debug!(contract = %ev.contract_id, "unrecognised event topic, ignored");
            Ok(())
        }
    }
}

async fn apply_program_created(
    pool: &SqlitePool,
    anchors: &Anchors,
    ev: &ChainEvent,
) -> Result<()> {
    if ev.contract_id != anchors.registry {
        debug!(contract = %ev.contract_id, "program_created from foreign contract, ignored");
        return Ok(());
    }
    let (Some(id), Some((protocol, pointer))) =
        (field_u64(&ev.data, "program_id"), field_meta(&ev.data, "meta"))
    else {
        warn!(ledger = ev.ledger, "malformed program_created payload, skipped");
        return Ok(());
    };
    db::upsert_program(pool, id as i64, protocol, &pointer, ev.ledger).await
}

async fn apply_program_meta(pool: &SqlitePool, anchors: &Anchors, ev: &ChainEvent) -> Result<()> {
    if ev.contract_id != anchors.registry {
        return Ok(());
    }
    let (Some(id), Some((protocol, pointer))) =
        (field_u64(&ev.data, "program_id"), field_meta(&ev.data, "new"))
    else {
        warn!(ledger = ev.ledger, "malformed program_meta payload, skipped");
        return Ok(());
    };
    if !db::update_program_meta(pool, id as i64, protocol, &pointer).await? {
        warn!(program_id = id, "program_meta for unknown program, skipped");
    }
    Ok(())
}

async fn apply_round_init(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    let payload = (|| {
        let program_id = field_u64(&ev.data, "program_id")?;
        let token = field_str(&ev.data, "token")?;
        let voting_strategy = field_str(&ev.data, "voting_strategy")?;
        let payout_strategy = field_str(&ev.data, "payout_strategy")?;
        let schedule = ev.data.get("schedule")?;
        let apps_start = field_u64(schedule, "apps_start")?;
        let apps_end = field_u64(schedule, "apps_end")?;
        let round_start = field_u64(schedule, "round_start")?;
        let round_end = field_u64(schedule, "round_end")?;
        let round_meta = field_meta(&ev.data, "round_meta")?;
        let application_meta = field_meta(&ev.data, "application_meta")?;
        let projects_meta = field_meta(&ev.data, "projects_meta")?;
        Some(RoundInitRow {
            round: ev.contract_id.clone(),
            program_id: program_id as i64,
            token,
            voting_strategy,
            payout_strategy,
            apps_start: apps_start as i64,
            apps_end: apps_end as i64,
            round_start: round_start as i64,
            round_end: round_end as i64,
            round_meta_protocol: round_meta.0,
            round_meta_pointer: round_meta.1,
            application_meta_protocol: application_meta.0,
            application_meta_pointer: application_meta.1,
            projects_meta_protocol: projects_meta.0,
            projects_meta_pointer: projects_meta.1,
            ledger: ev.ledger,
        })
    })();
    let Some(row) = payload else {
        warn!(contract = %ev.contract_id, ledger = ev.ledger, "malformed round_init payload, skipped");
        return Ok(());
    };
    db::stage_round_init(pool, &row).await
}

async fn apply_voting_init(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    let Some(round) = ev.topic_key.as_deref() else {
        warn!(contract = %ev.contract_id, "voting_init without round topic, skipped");
        return Ok(());
    };
    // The data payload is the strategy kind symbol, either bare or wrapped
    // in a `{"type":"symbol","value":…}` object.
    let kind = ev
        .data
        .as_str()
        .map(String::from)
        .or_else(|| field_str(&ev.data, "value"))
        .unwrap_or_else(|| "unknown".to_string());
    db::upsert_voting_strategy(pool, &ev.contract_id, round, &kind, ev.ledger).await
}

async fn apply_payout_init(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    let Some(round) = ev.topic_key.as_deref() else {
        warn!(contract = %ev.contract_id, "payout_init without round topic, skipped");
        return Ok(());
    };
    let token = ev
        .data
        .as_str()
        .map(String::from)
        .or_else(|| field_str(&ev.data, "value"))
        .unwrap_or_default();
    db::upsert_payout_strategy(pool, &ev.contract_id, round, &token, ev.ledger).await
}

/// The factory confirmed a round. This is where the missing-reference
/// policy bites: no rounds row is ever written with a dangling program or
/// voting-strategy reference.
async fn apply_round_created(pool: &SqlitePool, anchors: &Anchors, ev: &ChainEvent) -> Result<()> {
    if ev.contract_id != anchors.factory {
        debug!(contract = %ev.contract_id, "round_created from foreign contract, ignored");
        return Ok(());
    }
    let Some(round) = ev.topic_key.clone().or_else(|| field_str(&ev.data, "round")) else {
        warn!(ledger = ev.ledger, "round_created without round address, skipped");
        return Ok(());
    };

    let Some(init) = db::get_round_init(pool, &round).await? else {
        warn!(round = %round, "round_created before round_init was seen, skipped");
        return Ok(());
    };
    if !db::program_exists(pool, init.program_id).await? {
        warn!(
            round = %round,
            program_id = init.program_id,
            "round references a program not yet in the read model, skipped"
        );
        return Ok(());
    }
    if !db::voting_strategy_exists(pool, &init.voting_strategy).await? {
        warn!(
            round = %round,
            strategy = %init.voting_strategy,
            "round references an unannounced voting strategy, skipped"
        );
        return Ok(());
    }
    if db::payout_strategy_round(pool, &init.payout_strategy).await?.is_none() {
        // Tolerated: the raw address from the init is recorded instead of a
        // strategy reference.
        warn!(
            round = %round,
            strategy = %init.payout_strategy,
            "payout strategy never announced itself, recording raw address"
        );
    }

    let implementation =
        field_bytes_hex(&ev.data, "implementation").unwrap_or_else(|| "unknown".to_string());
    db::insert_round(pool, &init, &implementation, ev.ledger).await
}

async fn apply_application(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    if !db::round_exists(pool, &ev.contract_id).await? {
        warn!(round = %ev.contract_id, "application for unknown round, skipped");
        return Ok(());
    }
    let Some(event_id) = ev.event_id.clone() else {
        warn!(round = %ev.contract_id, "application event without id, skipped");
        return Ok(());
    };
    let Some((protocol, pointer)) = field_meta(&ev.data, "meta") else {
        warn!(round = %ev.contract_id, "malformed application payload, skipped");
        return Ok(());
    };
    let project_id = ev
        .topic_key
        .clone()
        .or_else(|| field_bytes_hex(&ev.data, "project_id"))
        .unwrap_or_default();

    db::insert_application(
        pool,
        &ApplicationRow {
            event_id,
            round: ev.contract_id.clone(),
            project_id,
            meta_protocol: protocol,
            meta_pointer: pointer,
            ledger: ev.ledger,
            timestamp: ev.timestamp,
        },
    )
    .await?;
    Ok(())
}

async fn apply_vote(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    // `voted` is emitted by the strategy contract, tagged with the round.
    let Some(round) = ev.topic_key.clone().or_else(|| field_str(&ev.data, "round")) else {
        warn!(contract = %ev.contract_id, "voted event without round topic, skipped");
        return Ok(());
    };
    if !db::round_exists(pool, &round).await? {
        warn!(round = %round, "vote for unknown round, skipped");
        return Ok(());
    }
    let Some(event_id) = ev.event_id.clone() else {
        warn!(round = %round, "voted event without id, skipped");
        return Ok(());
    };
    let payload = (|| {
        Some(VoteRow {
            event_id,
            round: round.clone(),
            voter: field_str(&ev.data, "voter")?,
            beneficiary: field_str(&ev.data, "beneficiary")?,
            project_id: field_bytes_hex(&ev.data, "project_id")?,
            token: field_str(&ev.data, "token")?,
            amount: field_amount(&ev.data, "amount")?,
            ledger: ev.ledger,
            timestamp: ev.timestamp,
        })
    })();
    let Some(row) = payload else {
        warn!(round = %round, "malformed voted payload, skipped");
        return Ok(());
    };
    db::insert_vote(pool, &row).await?;
    Ok(())
}

async fn apply_meta_update(pool: &SqlitePool, ev: &ChainEvent, column: MetaColumn) -> Result<()> {
    let Some((protocol, pointer)) = field_meta(&ev.data, "new") else {
        warn!(round = %ev.contract_id, "malformed meta update payload, skipped");
        return Ok(());
    };
    if !db::update_round_meta(pool, &ev.contract_id, column, protocol, &pointer).await? {
        warn!(round = %ev.contract_id, "meta update for unknown round, skipped");
    }
    Ok(())
}

async fn apply_time_update(pool: &SqlitePool, ev: &ChainEvent, column: TimeColumn) -> Result<()> {
    let Some(value) = field_u64(&ev.data, "new") else {
        warn!(round = %ev.contract_id, "malformed time update payload, skipped");
        return Ok(());
    };
    if !db::update_round_time(pool, &ev.contract_id, column, value as i64).await? {
        warn!(round = %ev.contract_id, "time update for unknown round, skipped");
    }
    Ok(())
}

async fn apply_match_amount(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    let Some(amount) = field_amount(&ev.data, "amount") else {
        warn!(round = %ev.contract_id, "malformed match_amount payload, skipped");
        return Ok(());
    };
    if !db::update_round_match_amount(pool, &ev.contract_id, &amount).await? {
        warn!(round = %ev.contract_id, "match_amount for unknown round, skipped");
    }
    Ok(())
}

/// `distribution` is emitted by the payout strategy; resolve the round
/// through the strategy's announcement.
async fn apply_distribution(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    let Some(round) = db::payout_strategy_round(pool, &ev.contract_id).await? else {
        warn!(contract = %ev.contract_id, "distribution from unannounced strategy, skipped");
        return Ok(());
    };
    let Some(root) = field_bytes_hex(&ev.data, "merkle_root") else {
        warn!(round = %round, "malformed distribution payload, skipped");
        return Ok(());
    };
    if !db::update_round_distribution(pool, &round, &root).await? {
        warn!(round = %round, "distribution for unknown round, skipped");
    }
    Ok(())
}

async fn apply_escrow(pool: &SqlitePool, ev: &ChainEvent) -> Result<()> {
    if !db::mark_round_ready(pool, &ev.contract_id).await? {
        warn!(round = %ev.contract_id, "escrow for unknown round, skipped");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────
