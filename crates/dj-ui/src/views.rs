//! View models: entries and statistics flattened into what the templates print.

use dj_core::dates::{format_diary_day, format_long_date, format_short_date};
use dj_core::text::{preview, reading_minutes, word_count};
use dj_core::{DayCount, Entry, TagCount, UserStats};

/// Cards show at most this many tags.
pub const CARD_TAGS: usize = 4;

#[derive(Debug, Clone)]
pub struct EntryCard {
    pub date: String,
    pub long_date: String,
    pub preview: String,
    pub tags: Vec<String>,
    pub hidden_tags: usize,
    pub reading_minutes: usize,
    pub has_image: bool,
}

impl EntryCard {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            date: format_diary_day(entry.date),
            long_date: format_long_date(entry.date),
            preview: preview(&entry.content),
            tags: entry.tags.iter().take(CARD_TAGS).cloned().collect(),
            hidden_tags: entry.tags.len().saturating_sub(CARD_TAGS),
            reading_minutes: reading_minutes(&entry.content),
            has_image: entry.has_image(),
        }
    }
}

/// A clickable tag filter. `value` is the tag selection after clicking it.
#[derive(Debug, Clone)]
pub struct TagChip {
    pub name: String,
    pub selected: bool,
    pub value: String,
}

impl TagChip {
    pub fn build(all_tags: &[String], selected: &[String]) -> Vec<Self> {
        all_tags
            .iter()
            .map(|tag| {
                let is_selected = selected.contains(tag);
                let next: Vec<&str> = if is_selected {
                    selected.iter().filter(|t| *t != tag).map(String::as_str).collect()
                } else {
                    selected.iter().map(String::as_str).chain([tag.as_str()]).collect()
                };
                TagChip {
                    name: tag.clone(),
                    selected: is_selected,
                    value: next.join(","),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct EntryDetail {
    pub date: String,
    pub long_date: String,
    /// Stored markup, rendered unescaped: it only ever reaches its own author.
    pub content: String,
    pub tags: Vec<String>,
    pub tags_joined: String,
    pub image_url: Option<String>,
    pub word_count: usize,
    pub reading_minutes: usize,
    pub editable: bool,
}

impl EntryDetail {
    pub fn from_entry(entry: &Entry, editable: bool) -> Self {
        Self {
            date: format_diary_day(entry.date),
            long_date: format_long_date(entry.date),
            content: entry.content.clone(),
            tags: entry.tags.clone(),
            tags_joined: entry.tags.join(", "),
            image_url: entry.image_url.clone().filter(|_| entry.has_image()),
            word_count: word_count(&entry.content),
            reading_minutes: reading_minutes(&entry.content),
            editable,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsSummary {
    pub total_entries: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub distinct_tags: usize,
}

impl StatsSummary {
    pub fn from_stats(stats: &UserStats) -> Self {
        Self {
            total_entries: stats.total_entries,
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            distinct_tags: stats.tag_frequency.len(),
        }
    }
}

/// One column of the 30-day histogram.
#[derive(Debug, Clone)]
pub struct ActivityBar {
    pub label: String,
    pub count: u32,
    pub height_pct: u32,
}

impl ActivityBar {
    pub fn build(days: &[DayCount]) -> Vec<Self> {
        let max = days.iter().map(|d| d.count).max().unwrap_or(0).max(1);
        days.iter()
            .map(|d| ActivityBar {
                label: format_short_date(d.date),
                count: d.count,
                height_pct: d.count * 100 / max,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct TagBar {
    pub tag: String,
    pub count: u32,
    pub width_pct: u32,
}

impl TagBar {
    pub fn build(frequency: &[TagCount], n: usize) -> Vec<Self> {
        let top = dj_core::stats::top_tags(frequency, n);
        let max = top.first().map_or(1, |t| t.count.max(1));
        top.iter()
            .map(|t| TagBar {
                tag: t.tag.clone(),
                count: t.count,
                width_pct: t.count * 100 / max,
            })
            .collect()
    }
}
