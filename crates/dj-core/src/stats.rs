//! # Statistics Engine
//!
//! Pure functions over one user's entry history. Nothing here fails: an empty
//! history produces zero counts, empty rankings and an all-zero histogram.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;

use crate::dates::days_back;
use crate::models::{DayCount, Entry, StreakMode, TagCount, UserStats};

/// Width of the activity histogram, in days.
pub const ACTIVITY_WINDOW_DAYS: u32 = 30;

/// Builds the full [`UserStats`] for `entries` (expected in ascending date order).
pub fn compute(entries: &[Entry], today: NaiveDate, mode: StreakMode) -> UserStats {
    let streaks = streaks(entries, today, mode);
    UserStats {
        total_entries: total_entries(entries),
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        entries_per_day: entries_per_day(entries, today, ACTIVITY_WINDOW_DAYS),
        tag_frequency: tag_frequency(entries),
    }
}

pub fn total_entries(entries: &[Entry]) -> u32 {
    u32::try_from(entries.len()).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

pub fn streaks(entries: &[Entry], today: NaiveDate, mode: StreakMode) -> Streaks {
    let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date).collect();
    let yesterday = today.pred_opt();

    match mode {
        StreakMode::Consecutive => {
            let anchor = if days.contains(&today) {
                Some(today)
            } else {
                yesterday.filter(|d| days.contains(d))
            };
            let current = anchor.map_or(0, |end| run_ending_at(&days, end));
            Streaks {
                current,
                longest: longest_run(&days).max(current),
            }
        }
        StreakMode::Legacy => {
            let recent = days.contains(&today) || yesterday.is_some_and(|d| days.contains(&d));
            if recent {
                Streaks {
                    current: 1,
                    longest: (total_entries(entries) / 3).max(1),
                }
            } else {
                Streaks::default()
            }
        }
    }
}

fn run_ending_at(days: &BTreeSet<NaiveDate>, end: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = Some(end);
    while let Some(d) = day.filter(|d| days.contains(d)) {
        count += 1;
        day = d.pred_opt();
    }
    count
}

fn longest_run(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

/// Entry counts for the `window` days ending at `today`, oldest first.
pub fn entries_per_day(entries: &[Entry], today: NaiveDate, window: u32) -> Vec<DayCount> {
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.date).or_default() += 1;
    }
    days_back(today, window)
        .into_iter()
        .map(|date| DayCount {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Number of entries carrying each tag, most used first.
///
/// Ties keep the order in which tags were first seen.
pub fn tag_frequency(entries: &[Entry]) -> Vec<TagCount> {
    let mut ranking: Vec<TagCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let mut seen_here: HashSet<&str> = HashSet::new();
        for tag in &entry.tags {
            if !seen_here.insert(tag.as_str()) {
                continue;
            }
            match index.get(tag.as_str()) {
                Some(&i) => ranking[i].count += 1,
                None => {
                    index.insert(tag.as_str(), ranking.len());
                    ranking.push(TagCount {
                        tag: tag.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    // stable: equal counts stay in first-seen order
    ranking.sort_by(|a, b| b.count.cmp(&a.count));
    ranking
}

pub fn top_tags(frequency: &[TagCount], n: usize) -> &[TagCount] {
    &frequency[..frequency.len().min(n)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn entry_on(date: NaiveDate, tags: &[&str]) -> Entry {
        let now = Utc::now();
        Entry {
            id: Uuid::now_v7(),
            user_id: "u1".into(),
            date,
            content: "<p>x</p>".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn empty_history_is_all_zero() {
        let stats = compute(&[], today(), StreakMode::Consecutive);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 0);
        assert!(stats.tag_frequency.is_empty());
        assert_eq!(stats.entries_per_day.len(), 30);
        assert!(stats.entries_per_day.iter().all(|d| d.count == 0));
    }

    #[test]
    fn tag_frequency_counts_entries_and_keeps_first_seen_ties() {
        let entries = vec![
            entry_on(days_ago(2), &["a", "b"]),
            entry_on(days_ago(1), &["a"]),
            entry_on(today(), &["b", "b"]),
        ];
        let freq = tag_frequency(&entries);
        assert_eq!(
            freq,
            vec![
                TagCount { tag: "a".into(), count: 2 },
                TagCount { tag: "b".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn tag_frequency_sorts_descending() {
        let entries = vec![
            entry_on(days_ago(3), &["rare"]),
            entry_on(days_ago(2), &["work"]),
            entry_on(days_ago(1), &["work", "gym"]),
            entry_on(today(), &["gym", "work"]),
        ];
        let tags: Vec<_> = tag_frequency(&entries).into_iter().map(|t| (t.tag, t.count)).collect();
        assert_eq!(
            tags,
            vec![("work".into(), 3), ("gym".into(), 2), ("rare".into(), 1)]
        );
        assert_eq!(top_tags(&tag_frequency(&entries), 2).len(), 2);
        assert_eq!(top_tags(&tag_frequency(&entries), 10).len(), 3);
    }

    #[test]
    fn histogram_marks_the_right_day() {
        let entries = vec![entry_on(days_ago(5), &[])];
        let per_day = entries_per_day(&entries, today(), ACTIVITY_WINDOW_DAYS);
        assert_eq!(per_day.len(), 30);
        assert_eq!(per_day.first().unwrap().date, days_ago(29));
        assert_eq!(per_day.last().unwrap().date, today());
        assert_eq!(per_day.iter().filter(|d| d.count == 0).count(), 29);
        assert_eq!(per_day[24].count, 1);
        assert_eq!(per_day[24].date, days_ago(5));
    }

    #[test]
    fn histogram_ignores_days_outside_window() {
        let entries = vec![entry_on(days_ago(30), &[]), entry_on(days_ago(400), &[])];
        let per_day = entries_per_day(&entries, today(), ACTIVITY_WINDOW_DAYS);
        assert!(per_day.iter().all(|d| d.count == 0));
    }

    #[test]
    fn consecutive_streak_ending_today() {
        let entries: Vec<_> = [4, 2, 1, 0].iter().map(|&n| entry_on(days_ago(n), &[])).collect();
        let s = streaks(&entries, today(), StreakMode::Consecutive);
        assert_eq!(s, Streaks { current: 3, longest: 3 });
    }

    #[test]
    fn consecutive_streak_may_end_yesterday() {
        let entries: Vec<_> = [3, 2, 1].iter().map(|&n| entry_on(days_ago(n), &[])).collect();
        let s = streaks(&entries, today(), StreakMode::Consecutive);
        assert_eq!(s.current, 3);
    }

    #[test]
    fn consecutive_streak_broken_keeps_longest() {
        let entries: Vec<_> = [20, 19, 18, 17, 10, 2]
            .iter()
            .map(|&n| entry_on(days_ago(n), &[]))
            .collect();
        let s = streaks(&entries, today(), StreakMode::Consecutive);
        assert_eq!(s, Streaks { current: 0, longest: 4 });
    }

    #[test]
    fn legacy_streak_heuristic() {
        let entries: Vec<_> = [40, 30, 20, 10, 5, 3, 1].iter().map(|&n| entry_on(days_ago(n), &[])).collect();
        let s = streaks(&entries, today(), StreakMode::Legacy);
        assert_eq!(s, Streaks { current: 1, longest: 2 });

        let stale = vec![entry_on(days_ago(3), &[])];
        assert_eq!(streaks(&stale, today(), StreakMode::Legacy), Streaks::default());

        let single = vec![entry_on(today(), &[])];
        assert_eq!(
            streaks(&single, today(), StreakMode::Legacy),
            Streaks { current: 1, longest: 1 }
        );
    }
}
