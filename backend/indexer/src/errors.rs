//! Errors raised while polling, storing, and projecting FundChain events.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    /// SQLite query or connection failure. The poll is retried next tick.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Transport failure talking to the Soroban RPC.
    #[error("RPC transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or malformed environment variable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An RPC event (or the RPC response itself) could not be decoded.
    #[error("Event parse error: {0}")]
    EventParse(String),

    /// An event amount that does not fit the read model (not an integer, or
    /// overflows i128). The event is stored but left unprojected.
    #[error("Read model error: {0}")]
    Projection(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
