//! Database layer — migrations, queries, and cursor management.
//!
//! Every write here is an idempotent upsert keyed by the entity's primary
//! key (contract address, program id, or the chain's event id), so replaying
//! a batch of events is a no-op.

use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::errors::Result;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Make sure the file is created if it doesn't exist yet.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProgramRow {
    pub id: i64,
    pub meta_protocol: i64,
    pub meta_pointer: String,
    pub created_ledger: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoundRow {
    pub address: String,
    pub program_id: i64,
    pub implementation: String,
    pub token: String,
    pub voting_strategy: String,
    pub payout_strategy: String,
    pub apps_start: i64,
    pub apps_end: i64,
    pub round_start: i64,
    pub round_end: i64,
    pub round_meta_protocol: i64,
    pub round_meta_pointer: String,
    pub application_meta_protocol: i64,
    pub application_meta_pointer: String,
    pub projects_meta_protocol: i64,
    pub projects_meta_pointer: String,
    pub match_amount: String,
    pub distribution_root: Option<String>,
    pub ready_for_payout: i64,
    pub created_ledger: i64,
    pub created_at: i64,
}

/// Staged `round_init` configuration, pending factory confirmation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoundInitRow {
    pub round: String,
    pub program_id: i64,
    pub token: String,
    pub voting_strategy: String,
    pub payout_strategy: String,
    pub apps_start: i64,
    pub apps_end: i64,
    pub round_start: i64,
    pub round_end: i64,
    pub round_meta_protocol: i64,
    pub round_meta_pointer: String,
    pub application_meta_protocol: i64,
    pub application_meta_pointer: String,
    pub projects_meta_protocol: i64,
    pub projects_meta_pointer: String,
    pub ledger: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApplicationRow {
    pub event_id: String,
    pub round: String,
    pub project_id: String,
    pub meta_protocol: i64,
    pub meta_pointer: String,
    pub ledger: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VoteRow {
    pub event_id: String,
    pub round: String,
    pub voter: String,
    pub beneficiary: String,
    pub project_id: String,
    pub token: String,
    pub amount: String,
    pub ledger: i64,
    pub timestamp: i64,
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger (and optionally a pagination cursor string).
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Programs
// ─────────────────────────────────────────────────────────

pub async fn upsert_program(
    pool: &SqlitePool,
    id: i64,
    meta_protocol: i64,
    meta_pointer: &str,
    ledger: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO programs (id, meta_protocol, meta_pointer, created_ledger)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(meta_protocol)
    .bind(meta_pointer)
    .bind(ledger)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_program_meta(
    pool: &SqlitePool,
    id: i64,
    meta_protocol: i64,
    meta_pointer: &str,
) -> Result<bool> {
    let rows = sqlx::query("UPDATE programs SET meta_protocol = ?2, meta_pointer = ?3 WHERE id = ?1")
        .bind(id)
        .bind(meta_protocol)
        .bind(meta_pointer)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn program_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM programs WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn list_programs(pool: &SqlitePool) -> Result<Vec<ProgramRow>> {
    let rows = sqlx::query_as::<_, ProgramRow>(
        "SELECT * FROM programs ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────

pub async fn upsert_voting_strategy(
    pool: &SqlitePool,
    address: &str,
    round: &str,
    kind: &str,
    ledger: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO voting_strategies (address, round, kind, ledger)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (address) DO NOTHING
        "#,
    )
    .bind(address)
    .bind(round)
    .bind(kind)
    .bind(ledger)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn voting_strategy_exists(pool: &SqlitePool, address: &str) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM voting_strategies WHERE address = ?1")
        .bind(address)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn upsert_payout_strategy(
    pool: &SqlitePool,
    address: &str,
    round: &str,
    token: &str,
    ledger: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payout_strategies (address, round, token, ledger)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (address) DO NOTHING
        "#,
    )
    .bind(address)
    .bind(round)
    .bind(token)
    .bind(ledger)
    .execute(pool)
    .await?;
    Ok(())
}

/// The round a payout strategy is bound to, if it has announced itself.
pub async fn payout_strategy_round(pool: &SqlitePool, address: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT round FROM payout_strategies WHERE address = ?1")
            .bind(address)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Round staging + confirmation
// ─────────────────────────────────────────────────────────

pub async fn stage_round_init(pool: &SqlitePool, row: &RoundInitRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO round_inits
            (round, program_id, token, voting_strategy, payout_strategy,
             apps_start, apps_end, round_start, round_end,
             round_meta_protocol, round_meta_pointer,
             application_meta_protocol, application_meta_pointer,
             projects_meta_protocol, projects_meta_pointer, ledger)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ON CONFLICT (round) DO NOTHING
        "#,
    )
    .bind(&row.round)
    .bind(row.program_id)
    .bind(&row.token)
    .bind(&row.voting_strategy)
    .bind(&row.payout_strategy)
    .bind(row.apps_start)
    .bind(row.apps_end)
    .bind(row.round_start)
    .bind(row.round_end)
    .bind(row.round_meta_protocol)
    .bind(&row.round_meta_pointer)
    .bind(row.application_meta_protocol)
    .bind(&row.application_meta_pointer)
    .bind(row.projects_meta_protocol)
    .bind(&row.projects_meta_pointer)
    .bind(row.ledger)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_round_init(pool: &SqlitePool, round: &str) -> Result<Option<RoundInitRow>> {
    let row = sqlx::query_as::<_, RoundInitRow>("SELECT * FROM round_inits WHERE round = ?1")
        .bind(round)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert the confirmed round row. A conflict on the address means the
/// `round_created` event was re-delivered; it is silently ignored.
pub async fn insert_round(
    pool: &SqlitePool,
    init: &RoundInitRow,
    implementation: &str,
    ledger: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rounds
            (address, program_id, implementation, token, voting_strategy, payout_strategy,
             apps_start, apps_end, round_start, round_end,
             round_meta_protocol, round_meta_pointer,
             application_meta_protocol, application_meta_pointer,
             projects_meta_protocol, projects_meta_pointer, created_ledger)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        ON CONFLICT (address) DO NOTHING
        "#,
    )
    .bind(&init.round)
    .bind(init.program_id)
    .bind(implementation)
    .bind(&init.token)
    .bind(&init.voting_strategy)
    .bind(&init.payout_strategy)
    .bind(init.apps_start)
    .bind(init.apps_end)
    .bind(init.round_start)
    .bind(init.round_end)
    .bind(init.round_meta_protocol)
    .bind(&init.round_meta_pointer)
    .bind(init.application_meta_protocol)
    .bind(&init.application_meta_pointer)
    .bind(init.projects_meta_protocol)
    .bind(&init.projects_meta_pointer)
    .bind(ledger)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn round_exists(pool: &SqlitePool, address: &str) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM rounds WHERE address = ?1")
        .bind(address)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Which metadata pointer column pair a `*_meta` event maps to.
#[derive(Debug, Clone, Copy)]
pub enum MetaColumn {
    Round,
    Application,
    Projects,
}

pub async fn update_round_meta(
    pool: &SqlitePool,
    address: &str,
    column: MetaColumn,
    protocol: i64,
    pointer: &str,
) -> Result<bool> {
    let sql = match column {
        MetaColumn::Round => {
            "UPDATE rounds SET round_meta_protocol = ?2, round_meta_pointer = ?3 WHERE address = ?1"
        }
        MetaColumn::Application => {
            "UPDATE rounds SET application_meta_protocol = ?2, application_meta_pointer = ?3 WHERE address = ?1"
        }
        MetaColumn::Projects => {
            "UPDATE rounds SET projects_meta_protocol = ?2, projects_meta_pointer = ?3 WHERE address = ?1"
        }
    };
    let rows = sqlx::query(sql)
        .bind(address)
        .bind(protocol)
        .bind(pointer)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

/// Which schedule column a `*_start` / `*_end` event maps to.
#[derive(Debug, Clone, Copy)]
pub enum TimeColumn {
    AppsStart,
    AppsEnd,
    RoundStart,
    RoundEnd,
}

pub async fn update_round_time(
    pool: &SqlitePool,
    address: &str,
    column: TimeColumn,
    value: i64,
) -> Result<bool> {
    let sql = match column {
        TimeColumn::AppsStart => "UPDATE rounds SET apps_start = ?2 WHERE address = ?1",
        TimeColumn::AppsEnd => "UPDATE rounds SET apps_end = ?2 WHERE address = ?1",
        TimeColumn::RoundStart => "UPDATE rounds SET round_start = ?2 WHERE address = ?1",
        TimeColumn::RoundEnd => "UPDATE rounds SET round_end = ?2 WHERE address = ?1",
    };
    let rows = sqlx::query(sql)
        .bind(address)
        .bind(value)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn update_round_match_amount(
    pool: &SqlitePool,
    address: &str,
    amount: &str,
) -> Result<bool> {
    let rows = sqlx::query("UPDATE rounds SET match_amount = ?2 WHERE address = ?1")
        .bind(address)
        .bind(amount)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn update_round_distribution(
    pool: &SqlitePool,
    address: &str,
    root: &str,
) -> Result<bool> {
    let rows = sqlx::query("UPDATE rounds SET distribution_root = ?2 WHERE address = ?1")
        .bind(address)
        .bind(root)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn mark_round_ready(pool: &SqlitePool, address: &str) -> Result<bool> {
    let rows = sqlx::query("UPDATE rounds SET ready_for_payout = 1 WHERE address = ?1")
        .bind(address)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn list_rounds(pool: &SqlitePool) -> Result<Vec<RoundRow>> {
    let rows = sqlx::query_as::<_, RoundRow>(
        "SELECT * FROM rounds ORDER BY created_ledger ASC, address ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn rounds_for_program(pool: &SqlitePool, program_id: i64) -> Result<Vec<RoundRow>> {
    let rows = sqlx::query_as::<_, RoundRow>(
        "SELECT * FROM rounds WHERE program_id = ?1 ORDER BY created_ledger ASC, address ASC",
    )
    .bind(program_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_round(pool: &SqlitePool, address: &str) -> Result<Option<RoundRow>> {
    let row = sqlx::query_as::<_, RoundRow>("SELECT * FROM rounds WHERE address = ?1")
        .bind(address)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

// ─────────────────────────────────────────────────────────
// Applications and votes
// ─────────────────────────────────────────────────────────

pub async fn insert_application(pool: &SqlitePool, row: &ApplicationRow) -> Result<bool> {
    let rows = sqlx::query(
        r#"
        INSERT OR IGNORE INTO applications
            (event_id, round, project_id, meta_protocol, meta_pointer, ledger, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&row.event_id)
    .bind(&row.round)
    .bind(&row.project_id)
    .bind(row.meta_protocol)
    .bind(&row.meta_pointer)
    .bind(row.ledger)
    .bind(row.timestamp)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

pub async fn insert_vote(pool: &SqlitePool, row: &VoteRow) -> Result<bool> {
    let rows = sqlx::query(
        r#"
        INSERT OR IGNORE INTO votes
            (event_id, round, voter, beneficiary, project_id, token, amount, ledger, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&row.event_id)
    .bind(&row.round)
    .bind(&row.voter)
    .bind(&row.beneficiary)
    .bind(&row.project_id)
    .bind(&row.token)
    .bind(&row.amount)
    .bind(row.ledger)
    .bind(row.timestamp)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows > 0)
}

pub async fn applications_for_round(
    pool: &SqlitePool,
    round: &str,
) -> Result<Vec<ApplicationRow>> {
    let rows = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE round = ?1 ORDER BY ledger ASC, event_id ASC",
    )
    .bind(round)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn votes_for_round(pool: &SqlitePool, round: &str) -> Result<Vec<VoteRow>> {
    let rows = sqlx::query_as::<_, VoteRow>(
        "SELECT * FROM votes WHERE round = ?1 ORDER BY ledger ASC, event_id ASC",
    )
    .bind(round)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
