//! # AppError
//!
//! Centralized error handling for Daybook.
//! Maps journal policy failures and infrastructure failures to one taxonomy.

use thiserror::Error;

/// The primary error type for all dj-core operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AppError {
    /// No resolved user identity for the request.
    #[error("unauthorized")]
    Unauthorized,

    /// Validation failure (e.g., empty content, malformed date)
    #[error("{0}")]
    InvalidInput(String),

    /// The diary day already has an entry.
    #[error("{0}")]
    Conflict(String),

    /// Mutating an entry whose day has elapsed.
    #[error("{0}")]
    Forbidden(String),

    /// No entry for the requested day.
    #[error("{0}")]
    NotFound(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn entry_not_found() -> Self {
        Self::NotFound("Entry not found".into())
    }

    /// Raised for any attempt to `action` ("edit", "delete") an entry that is
    /// not today's.
    pub fn past_entry(action: &str) -> Self {
        Self::Forbidden(format!("Can only {action} today's entry"))
    }

    pub fn already_written() -> Self {
        Self::Conflict("Entry already exists for today".into())
    }

    /// Converts an error raised by a port (repo, media store) into the taxonomy.
    ///
    /// Typed rejections travelling inside the `anyhow::Error` keep their
    /// meaning; anything else becomes `Internal`.
    pub fn from_port(err: anyhow::Error) -> Self {
        if err.downcast_ref::<DuplicateEntry>().is_some() {
            return Self::already_written();
        }
        if let Some(rejected) = err.downcast_ref::<MediaRejected>() {
            return Self::InvalidInput(rejected.0.clone());
        }
        Self::Internal(format!("{err:#}"))
    }
}

/// Returned by an `EntryRepo` when the store's (user, date) uniqueness
/// constraint rejects an insert.
#[derive(Error, Debug)]
#[error("an entry for {user_id} on {date} already exists")]
pub struct DuplicateEntry {
    pub user_id: String,
    pub date: chrono::NaiveDate,
}

/// Returned by a `MediaStore` when an upload is not an acceptable image.
#[derive(Error, Debug)]
#[error("rejected upload: {0}")]
pub struct MediaRejected(pub String);

/// A specialized Result type for Daybook logic.
pub type Result<T> = std::result::Result<T, AppError>;
