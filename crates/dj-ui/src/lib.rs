//! # dj-ui
//!
//! Server-rendered pages. Templates only ever see the view models defined
//! here; the theme travels with every page as an explicit value.

pub mod theme;
pub mod views;

use askama::Template;

pub use theme::Theme;
pub use views::*;

/// Shown instead of any page when the request carries no valid session.
#[derive(Template)]
#[template(path = "sign_in.html")]
pub struct SignInTemplate {
    pub theme: Theme,
    pub title: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub theme: Theme,
    pub title: String,
    pub status: u16,
    pub message: String,
}

/// The entry list with its search and filter controls.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub theme: Theme,
    pub title: String,
    pub cards: Vec<EntryCard>,
    pub chips: Vec<TagChip>,
    pub search: String,
    /// Comma-joined tags currently selected, carried by the search button
    pub selected_tags: String,
    pub images_only: bool,
    pub filtered: bool,
    pub wrote_today: bool,
}

#[derive(Template)]
#[template(path = "new.html")]
pub struct NewEntryTemplate {
    pub theme: Theme,
    pub title: String,
    pub today: String,
    pub today_long: String,
    pub content: String,
    pub tags: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "already_written.html")]
pub struct AlreadyWrittenTemplate {
    pub theme: Theme,
    pub title: String,
    pub today: String,
}

#[derive(Template)]
#[template(path = "entry.html")]
pub struct EntryTemplate {
    pub theme: Theme,
    pub title: String,
    pub entry: EntryDetail,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub theme: Theme,
    pub title: String,
    pub user_id: String,
    pub summary: StatsSummary,
    pub bars: Vec<ActivityBar>,
    pub top_tags: Vec<TagBar>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use dj_core::{Entry, UserStats};

    fn entry() -> Entry {
        let now = Utc::now();
        Entry {
            id: uuid::Uuid::now_v7(),
            user_id: "u1".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            content: "<p>Went <b>hiking</b> & saw a <script>fox</script></p>".into(),
            tags: vec!["outdoors".into(), "<b>".into()],
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn index_escapes_previews_and_tags() {
        let page = IndexTemplate {
            theme: Theme::Dark,
            title: "Entries".into(),
            cards: vec![EntryCard::from_entry(&entry())],
            chips: TagChip::build(&["outdoors".to_string()], &[]),
            search: "\"quoted\"".into(),
            selected_tags: String::new(),
            images_only: false,
            filtered: false,
            wrote_today: true,
        };
        let html = page.render().unwrap();
        assert!(html.contains("October 18, 2026"));
        assert!(html.contains("class=\"dark\""));
        assert!(!html.contains("<b>"));
        assert!(!html.contains("\"quoted\""));
    }

    #[test]
    fn entry_page_shows_edit_form_only_when_editable() {
        let mut detail = EntryDetail::from_entry(&entry(), true);
        let page = EntryTemplate {
            theme: Theme::Light,
            title: "Entry".into(),
            entry: detail.clone(),
            previous: Some("2026-10-10".into()),
            next: None,
            error: None,
        };
        let html = page.render().unwrap();
        assert!(html.contains("action=\"/entry/2026-10-18/delete\""));
        assert!(html.contains("href=\"/entry/2026-10-10\""));

        detail.editable = false;
        let page = EntryTemplate {
            theme: Theme::Light,
            title: "Entry".into(),
            entry: detail,
            previous: None,
            next: None,
            error: None,
        };
        assert!(!page.render().unwrap().contains("/delete"));
    }

    #[test]
    fn profile_renders_thirty_bars() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let stats: UserStats = dj_core::stats::compute(&[entry()], today, Default::default());
        let page = ProfileTemplate {
            theme: Theme::Light,
            title: "Profile".into(),
            user_id: "u1".into(),
            summary: StatsSummary::from_stats(&stats),
            bars: ActivityBar::build(&stats.entries_per_day),
            top_tags: TagBar::build(&stats.tag_frequency, 10),
        };
        let html = page.render().unwrap();
        assert_eq!(html.matches("class=\"bar").count(), 30);
        assert!(html.contains("outdoors"));
    }
}
