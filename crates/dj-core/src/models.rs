//! # Domain Models
//!
//! These structs represent the core entities of Daybook.
//! Entries use UUID v7 ids so they sort by creation time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::{normalize_tags, parse_tag_list};

/// One diary entry. At most one exists per (user, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    /// Opaque owner id handed out by the session provider
    pub user_id: String,
    /// The diary day, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Rich-text markup produced by the editor; stored verbatim after trimming
    pub content: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

/// A validated entry that has not been persisted yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: String,
    pub date: NaiveDate,
    pub content: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Replacement values for a same-day edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChanges {
    pub content: String,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest diary day first
    Ascending,
    /// Newest diary day first
    Descending,
}

/// Typed replacement for free-form query construction.
///
/// Every field is optional; `None` means "do not filter on this".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Case-insensitive substring to look for in the content
    pub search: Option<String>,
    /// Entry matches when it carries at least one of these tags
    pub tags: Option<Vec<String>>,
    /// `Some(true)` keeps only entries with an attached image
    pub has_image: Option<bool>,
}

impl EntryFilter {
    /// Builds a filter from raw query-string values, defaulting each option once.
    ///
    /// Blank searches and empty tag lists are dropped; `has_image` is only
    /// enabled by the literal `true`.
    pub fn from_params(search: Option<&str>, tags: Option<&str>, has_image: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let tags = tags.map(parse_tag_list).filter(|t| !t.is_empty());
        let has_image = (has_image == Some("true")).then_some(true);
        Self { search, tags, has_image }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = normalize_tags(tags);
        self.tags = (!tags.is_empty()).then_some(tags);
        self
    }

    pub fn images_only(mut self) -> Self {
        self.has_image = Some(true);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.tags.is_none() && self.has_image != Some(true)
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(needle) = &self.search {
            if !entry.content.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(wanted) = &self.tags {
            if !wanted.iter().any(|tag| entry.tags.contains(tag)) {
                return false;
            }
        }
        if self.has_image == Some(true) && !entry.has_image() {
            return false;
        }
        true
    }
}

/// How streaks are derived from the entry history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakMode {
    /// Runs of consecutive diary days.
    #[default]
    Consecutive,
    /// Earlier approximation: current is 1 when today or yesterday has an
    /// entry, longest is `max(1, total / 3)`.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u32,
}

/// Aggregate writing statistics. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_entries: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub entries_per_day: Vec<DayCount>,
    pub tag_frequency: Vec<TagCount>,
}
