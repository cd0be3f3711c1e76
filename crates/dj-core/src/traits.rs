//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Entry, EntryChanges, NewEntry, SortOrder};

/// Data persistence contract for diary entries.
///
/// Implementations must enforce uniqueness of (user_id, date) themselves and
/// report a violation as [`crate::DuplicateEntry`].
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EntryRepo: Send + Sync {
    async fn find_entry(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<Option<Entry>>;

    /// Every entry the user owns, sorted by diary day.
    async fn list_entries(&self, user_id: &str, order: SortOrder) -> anyhow::Result<Vec<Entry>>;

    /// Persists a new entry and returns it with its store-assigned id.
    async fn insert_entry(&self, entry: NewEntry) -> anyhow::Result<Entry>;

    /// Applies `changes` and returns the updated entry, or `None` if there was nothing to update.
    async fn update_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
        changes: EntryChanges,
    ) -> anyhow::Result<Option<Entry>>;

    /// Returns whether an entry was removed.
    async fn delete_entry(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<bool>;
}

/// Media storage contract for attached images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media id. Unacceptable uploads fail
    /// with [`crate::MediaRejected`].
    async fn save_upload(&self, data: Bytes, content_type: &str) -> anyhow::Result<String>;
    /// Public URL of the original image.
    fn url(&self, media_id: &str) -> String;
    /// Public URL of the thumbnail.
    fn thumbnail_url(&self, media_id: &str) -> String;
}

/// Identity contract. Tokens are issued elsewhere; this only resolves them.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionProvider: Send + Sync {
    /// Returns the stable user id behind `token`, or `AppError::Unauthorized`.
    fn resolve(&self, token: &str) -> Result<String>;
}
