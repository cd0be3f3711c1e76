//! # Entry Service
//!
//! Enforces the journal rules on top of an [`EntryRepo`]:
//! one entry per diary day, non-empty content, and immutable history
//! (only today's entry can be edited or deleted).
//!
//! "Today" always comes from the server [`Clock`], never from the caller.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::dates::{Clock, SystemClock};
use crate::error::{AppError, Result};
use crate::models::{Entry, EntryChanges, EntryFilter, NewEntry, SortOrder, StreakMode, UserStats};
use crate::stats;
use crate::text::normalize_tags;
use crate::traits::EntryRepo;

/// Today's diary day and whatever has been written on it so far.
#[derive(Debug, Clone)]
pub struct TodayStatus {
    pub date: NaiveDate,
    pub entry: Option<Entry>,
}

/// Closest written days around a given day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbours {
    pub previous: Option<NaiveDate>,
    pub next: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct EntryService {
    repo: Arc<dyn EntryRepo>,
    clock: Arc<dyn Clock>,
    streak_mode: StreakMode,
}

impl EntryService {
    pub fn new(repo: Arc<dyn EntryRepo>) -> Self {
        Self {
            repo,
            clock: Arc::new(SystemClock),
            streak_mode: StreakMode::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_streak_mode(mut self, mode: StreakMode) -> Self {
        self.streak_mode = mode;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The user's entries matching `filter`, newest first.
    pub async fn list(&self, user_id: &str, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let entries = self
            .repo
            .list_entries(user_id, SortOrder::Descending)
            .await
            .map_err(AppError::from_port)?;
        if filter.is_empty() {
            return Ok(entries);
        }
        Ok(entries.into_iter().filter(|e| filter.matches(e)).collect())
    }

    pub async fn get(&self, user_id: &str, date: NaiveDate) -> Result<Entry> {
        self.repo
            .find_entry(user_id, date)
            .await
            .map_err(AppError::from_port)?
            .ok_or_else(AppError::entry_not_found)
    }

    /// Publishes today's entry.
    pub async fn create(
        &self,
        user_id: &str,
        content: &str,
        tags: Option<Vec<String>>,
        image_url: Option<String>,
    ) -> Result<Entry> {
        let content = self.check_publishable(user_id, content).await?;
        let now = self.clock.now();
        let today = now.date_naive();

        let entry = NewEntry {
            user_id: user_id.to_string(),
            date: today,
            content,
            tags: normalize_tags(tags.unwrap_or_default()),
            image_url: image_url.filter(|url| !url.trim().is_empty()),
            created_at: now,
        };

        let created = self.repo.insert_entry(entry).await.map_err(AppError::from_port)?;
        debug!(user_id, id = %created.id, %today, "entry created");
        Ok(created)
    }

    /// Replaces content and tags of today's entry.
    pub async fn update(
        &self,
        user_id: &str,
        date: NaiveDate,
        content: &str,
        tags: Option<Vec<String>>,
    ) -> Result<Entry> {
        self.ensure_mutable(user_id, date, "edit")?;
        let content = require_content(content)?;

        let changes = EntryChanges {
            content,
            tags: normalize_tags(tags.unwrap_or_default()),
            updated_at: self.clock.now(),
        };
        self.repo
            .update_entry(user_id, date, changes)
            .await
            .map_err(AppError::from_port)?
            .ok_or_else(AppError::entry_not_found)
    }

    pub async fn delete(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        self.ensure_mutable(user_id, date, "delete")?;

        let deleted = self.repo.delete_entry(user_id, date).await.map_err(AppError::from_port)?;
        if !deleted {
            return Err(AppError::entry_not_found());
        }
        debug!(user_id, %date, "entry deleted");
        Ok(())
    }

    /// Runs every check `create` makes before writing, so callers can reject a
    /// submission before touching other stores (e.g. saving its image).
    pub async fn check_publishable(&self, user_id: &str, content: &str) -> Result<String> {
        let content = require_content(content)?;
        let today = self.today();

        // Early reject only; the store's uniqueness constraint is authoritative.
        if self.repo.find_entry(user_id, today).await.map_err(AppError::from_port)?.is_some() {
            debug!(user_id, %today, "rejecting second entry for the day");
            return Err(AppError::already_written());
        }
        Ok(content)
    }

    pub async fn today_status(&self, user_id: &str) -> Result<TodayStatus> {
        let date = self.today();
        let entry = self.repo.find_entry(user_id, date).await.map_err(AppError::from_port)?;
        Ok(TodayStatus { date, entry })
    }

    pub async fn neighbours(&self, user_id: &str, date: NaiveDate) -> Result<Neighbours> {
        let entries = self
            .repo
            .list_entries(user_id, SortOrder::Ascending)
            .await
            .map_err(AppError::from_port)?;
        Ok(Neighbours {
            previous: entries.iter().rev().map(|e| e.date).find(|d| *d < date),
            next: entries.iter().map(|e| e.date).find(|d| *d > date),
        })
    }

    /// Every tag the user has used, first-seen over newest-first entries.
    pub async fn tags(&self, user_id: &str) -> Result<Vec<String>> {
        let entries = self
            .repo
            .list_entries(user_id, SortOrder::Descending)
            .await
            .map_err(AppError::from_port)?;
        Ok(normalize_tags(entries.iter().flat_map(|e| e.tags.iter())))
    }

    pub async fn stats(&self, user_id: &str) -> Result<UserStats> {
        let entries = self
            .repo
            .list_entries(user_id, SortOrder::Ascending)
            .await
            .map_err(AppError::from_port)?;
        Ok(stats::compute(&entries, self.today(), self.streak_mode))
    }

    /// Forbidden unless `date` is today.
    pub fn ensure_mutable(&self, user_id: &str, date: NaiveDate, action: &str) -> Result<()> {
        let today = self.today();
        if date != today {
            warn!(user_id, %date, %today, action, "attempt to change a past entry");
            return Err(AppError::past_entry(action));
        }
        Ok(())
    }
}

fn require_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid("Content is required"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::FixedClock;
    use crate::error::DuplicateEntry;
    use crate::traits::MockEntryRepo;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn service(repo: MockEntryRepo) -> EntryService {
        EntryService::new(Arc::new(repo)).with_clock(Arc::new(FixedClock::on(today())))
    }

    fn stored(new: NewEntry) -> Entry {
        Entry {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            date: new.date,
            content: new.content,
            tags: new.tags,
            image_url: new.image_url,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    fn entry_on(date: NaiveDate, tags: &[&str]) -> Entry {
        let now = Utc::now();
        Entry {
            id: Uuid::now_v7(),
            user_id: "u1".into(),
            date,
            content: "<p>hello</p>".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_stamps_today_and_normalizes() {
        let mut repo = MockEntryRepo::new();
        repo.expect_find_entry().times(1).returning(|user, date| {
            assert_eq!(user, "u1");
            assert_eq!(date, today());
            Ok(None)
        });
        repo.expect_insert_entry().times(1).returning(|new| Ok(stored(new)));

        let entry = service(repo)
            .create(
                "u1",
                "  <p>Dear diary</p>  ",
                Some(vec!["happy".into(), " happy".into(), "".into()]),
                Some("   ".into()),
            )
            .await
            .unwrap();

        assert_eq!(entry.date, today());
        assert_eq!(entry.content, "<p>Dear diary</p>");
        assert_eq!(entry.tags, vec!["happy"]);
        assert_eq!(entry.image_url, None);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_second_entry_of_the_day() {
        let mut repo = MockEntryRepo::new();
        repo.expect_find_entry()
            .returning(|_, date| Ok(Some(entry_on(date, &[]))));
        repo.expect_insert_entry().never();

        let err = service(repo).create("u1", "again", None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_maps_store_uniqueness_violation_to_conflict() {
        let mut repo = MockEntryRepo::new();
        repo.expect_find_entry().returning(|_, _| Ok(None));
        repo.expect_insert_entry().returning(|new| {
            Err(DuplicateEntry {
                user_id: new.user_id,
                date: new.date,
            }
            .into())
        });

        let err = service(repo).create("u1", "racing", None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn blank_content_never_reaches_the_store() {
        let mut repo = MockEntryRepo::new();
        repo.expect_find_entry().never();
        repo.expect_insert_entry().never();
        repo.expect_update_entry().never();
        let svc = service(repo);

        for content in ["", "   ", "\n\t"] {
            let err = svc.create("u1", content, None, None).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
            let err = svc.update("u1", today(), content, None).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn publish_check_matches_create() {
        let mut repo = MockEntryRepo::new();
        repo.expect_find_entry().times(1).returning(|_, date| Ok(Some(entry_on(date, &[]))));
        repo.expect_insert_entry().never();
        let svc = service(repo);

        let err = svc.check_publishable("u1", "  ").await.unwrap_err();
        assert_eq!(err, AppError::invalid("Content is required"));
        let err = svc.check_publishable("u1", "second").await.unwrap_err();
        assert_eq!(err, AppError::already_written());
    }

    #[test]
    fn only_today_passes_the_mutability_check() {
        let svc = service(MockEntryRepo::new());
        assert!(svc.ensure_mutable("u1", today(), "edit").is_ok());
        assert_eq!(
            svc.ensure_mutable("u1", today() - Duration::days(1), "delete"),
            Err(AppError::Forbidden("Can only delete today's entry".into()))
        );
    }

    #[tokio::test]
    async fn past_entries_are_immutable() {
        let mut repo = MockEntryRepo::new();
        repo.expect_update_entry().never();
        repo.expect_delete_entry().never();
        let svc = service(repo);

        for date in [today() - Duration::days(1), today() + Duration::days(1)] {
            let err = svc.update("u1", date, "edit", None).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
            let err = svc.delete("u1", date).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
    }

    #[tokio::test]
    async fn update_missing_entry_is_not_found() {
        let mut repo = MockEntryRepo::new();
        repo.expect_update_entry().returning(|_, _, _| Ok(None));

        let err = service(repo).update("u1", today(), "text", None).await.unwrap_err();
        assert_eq!(err, AppError::NotFound("Entry not found".into()));
    }

    #[tokio::test]
    async fn update_replaces_content_and_tags() {
        let mut repo = MockEntryRepo::new();
        repo.expect_update_entry().times(1).returning(|user, date, changes| {
            let mut e = entry_on(date, &["old"]);
            e.user_id = user.to_string();
            e.content = changes.content;
            e.tags = changes.tags;
            e.updated_at = changes.updated_at;
            Ok(Some(e))
        });

        let e = service(repo)
            .update("u1", today(), " <p>new</p> ", Some(vec!["b".into(), "b".into()]))
            .await
            .unwrap();
        assert_eq!(e.content, "<p>new</p>");
        assert_eq!(e.tags, vec!["b"]);
        assert_eq!(e.updated_at, FixedClock::on(today()).now());
    }

    #[tokio::test]
    async fn delete_nothing_is_not_found() {
        let mut repo = MockEntryRepo::new();
        repo.expect_delete_entry().returning(|_, _| Ok(false));
        let err = service(repo).delete("u1", today()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_applies_filter() {
        let mut repo = MockEntryRepo::new();
        repo.expect_list_entries().returning(|_, order| {
            assert_eq!(order, SortOrder::Descending);
            let mut third = entry_on(today(), &["happy", "tired"]);
            third.image_url = Some("/static/uploads/ab/cd/abcd".into());
            Ok(vec![
                third,
                entry_on(today() - Duration::days(1), &["sad"]),
                entry_on(today() - Duration::days(2), &["happy"]),
            ])
        });
        let svc = service(repo);

        let happy = svc
            .list("u1", &EntryFilter::default().with_tags(["happy"]))
            .await
            .unwrap();
        assert_eq!(happy.len(), 2);
        assert!(happy.iter().all(|e| e.tags.contains(&"happy".to_string())));

        let images = svc.list("u1", &EntryFilter::default().images_only()).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].date, today());
    }

    #[tokio::test]
    async fn store_failures_become_internal() {
        let mut repo = MockEntryRepo::new();
        repo.expect_find_entry()
            .returning(|_, _| Err(anyhow::anyhow!("database is locked")));
        let err = service(repo).get("u1", today()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn neighbours_and_tags() {
        let mut repo = MockEntryRepo::new();
        repo.expect_list_entries().returning(|_, order| {
            let mut entries = vec![
                entry_on(today() - Duration::days(9), &["a"]),
                entry_on(today() - Duration::days(5), &["b", "a"]),
                entry_on(today(), &["c"]),
            ];
            if order == SortOrder::Descending {
                entries.reverse();
            }
            Ok(entries)
        });
        let svc = service(repo);

        let n = svc.neighbours("u1", today() - Duration::days(5)).await.unwrap();
        assert_eq!(n.previous, Some(today() - Duration::days(9)));
        assert_eq!(n.next, Some(today()));

        assert_eq!(svc.tags("u1").await.unwrap(), vec!["c", "b", "a"]);
    }
}
