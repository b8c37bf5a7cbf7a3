//! Error surface of the indexer.
//!
//! Everything funnels into [`IndexerError`]. The poll loop logs and keeps
//! going, so the variants exist mainly to keep the failure domains apart in
//! the logs: storage, transport, the RPC protocol itself, and our own
//! decoding of what it returns.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A JSON-RPC level failure: a hard error code, or a soft one that
    /// survived every retry.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event parse error: {0}")]
    EventParse(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
