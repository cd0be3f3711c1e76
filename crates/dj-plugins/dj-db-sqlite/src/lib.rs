//! # dj-db-sqlite
//!
//! SQLite implementation of `EntryRepo`.
//!
//! The `UNIQUE (user_id, date)` constraint is the authoritative guard for the
//! one-entry-per-day rule; the service only checks first to fail early.

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use dj_core::dates::{format_diary_day, parse_diary_day};
use dj_core::models::{Entry, EntryChanges, NewEntry, SortOrder};
use dj_core::traits::EntryRepo;
use dj_core::DuplicateEntry;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id         TEXT PRIMARY KEY NOT NULL,
    user_id    TEXT NOT NULL,
    date       TEXT NOT NULL,
    content    TEXT NOT NULL,
    tags       TEXT NOT NULL DEFAULT '[]',
    image_url  TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, date)
)
"#;

const COLUMNS: &str = "id, user_id, date, content, tags, image_url, created_at, updated_at";

pub struct SqliteEntryRepo {
    pool: SqlitePool,
}

impl SqliteEntryRepo {
    /// Opens (creating if needed) the database at `url` and ensures the schema.
    ///
    /// In-memory databases live as long as their connection, so they get a
    /// single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .context("creating entries table")?;
        info!("entry store ready");
        Ok(Self { pool })
    }
}

fn entry_from_row(row: &SqliteRow) -> anyhow::Result<Entry> {
    let id: String = row.try_get("id")?;
    let date: String = row.try_get("date")?;
    let tags: String = row.try_get("tags")?;
    Ok(Entry {
        id: Uuid::parse_str(&id).with_context(|| format!("corrupt entry id {id}"))?,
        user_id: row.try_get("user_id")?,
        date: parse_diary_day(&date)?,
        content: row.try_get("content")?,
        tags: serde_json::from_str(&tags).with_context(|| format!("corrupt tags for entry {id}"))?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl EntryRepo for SqliteEntryRepo {
    async fn find_entry(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<Option<Entry>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM entries WHERE user_id = ? AND date = ?"
        ))
        .bind(user_id)
        .bind(format_diary_day(date))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn list_entries(&self, user_id: &str, order: SortOrder) -> anyhow::Result<Vec<Entry>> {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        sqlx::query(&format!(
            "SELECT {COLUMNS} FROM entries WHERE user_id = ? ORDER BY date {direction}"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(entry_from_row)
        .collect()
    }

    async fn insert_entry(&self, entry: NewEntry) -> anyhow::Result<Entry> {
        let stored = Entry {
            id: Uuid::now_v7(),
            user_id: entry.user_id,
            date: entry.date,
            content: entry.content,
            tags: entry.tags,
            image_url: entry.image_url,
            created_at: entry.created_at,
            updated_at: entry.created_at,
        };

        let result = sqlx::query(&format!(
            "INSERT INTO entries ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(stored.id.to_string())
        .bind(&stored.user_id)
        .bind(format_diary_day(stored.date))
        .bind(&stored.content)
        .bind(serde_json::to_string(&stored.tags)?)
        .bind(&stored.image_url)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(stored),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(DuplicateEntry {
                user_id: stored.user_id,
                date: stored.date,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_entry(
        &self,
        user_id: &str,
        date: NaiveDate,
        changes: EntryChanges,
    ) -> anyhow::Result<Option<Entry>> {
        let row = sqlx::query(&format!(
            "UPDATE entries SET content = ?, tags = ?, updated_at = ? \
             WHERE user_id = ? AND date = ? RETURNING {COLUMNS}"
        ))
        .bind(&changes.content)
        .bind(serde_json::to_string(&changes.tags)?)
        .bind(changes.updated_at)
        .bind(user_id)
        .bind(format_diary_day(date))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn delete_entry(&self, user_id: &str, date: NaiveDate) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE user_id = ? AND date = ?")
            .bind(user_id)
            .bind(format_diary_day(date))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
