//! Common error types for the analytics tools

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for analytics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the store, CLI and HTTP API
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error, including busy/locked)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A migration file failed to apply
    #[error("Migration {} failed: {source}", file.display())]
    Migration {
        file: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored row could not be decoded
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}
