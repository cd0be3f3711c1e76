//! # dj-api page handlers
//!
//! Server-rendered HTML on top of the same `EntryService` the JSON API uses.
//! Forms post back and redirect; validation failures re-render the form.

use askama::Template;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_TYPE, REFERER, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use bytes::Bytes;
use dj_core::dates::{format_diary_day, format_long_date};
use dj_core::text::parse_tag_list;
use dj_core::{AppError, Entry};
use dj_ui::theme::THEME_COOKIE;
use dj_ui::{
    ActivityBar, AlreadyWrittenTemplate, EntryCard, EntryDetail, EntryTemplate, ErrorTemplate,
    IndexTemplate, NewEntryTemplate, ProfileTemplate, SignInTemplate, StatsSummary, TagBar,
    TagChip, Theme,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::auth::{theme_from, PageUser};
use crate::error::{public_message, report, status_for, GENERIC_FAILURE};
use crate::handlers::{lookup_day, mutable_day, ListParams};
use crate::state::AppState;

const STYLESHEET: &str = include_str!("../assets/daybook.css");
const TOP_TAGS: usize = 10;
const THEME_MAX_AGE_SECS: u32 = 60 * 60 * 24 * 365;

type PageResult = Result<Response, PageError>;

/// An `AppError` rendered as a page in the visitor's theme.
#[derive(Debug)]
pub struct PageError {
    theme: Theme,
    err: AppError,
}

impl PageError {
    pub fn new(theme: Theme, err: AppError) -> Self {
        Self { theme, err }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        if self.err == AppError::Unauthorized {
            let page = SignInTemplate {
                theme: self.theme,
                title: "Sign in".into(),
            };
            return render(StatusCode::UNAUTHORIZED, &page);
        }
        report(&self.err);
        let status = status_for(&self.err);
        let page = ErrorTemplate {
            theme: self.theme,
            title: status.canonical_reason().unwrap_or("Error").into(),
            status: status.as_u16(),
            message: public_message(&self.err),
        };
        render(status, &page)
    }
}

impl PageUser {
    fn fail(&self) -> impl Fn(AppError) -> PageError + Copy {
        let theme = self.theme;
        move |err| PageError::new(theme, err)
    }
}

fn render<T: Template>(status: StatusCode, page: &T) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    user: PageUser,
    Query(params): Query<ListParams>,
) -> PageResult {
    let fail = user.fail();
    let filter = params.to_filter();
    let entries = state.entries.list(&user.user_id, &filter).await.map_err(fail)?;
    let all_tags = state.entries.tags(&user.user_id).await.map_err(fail)?;
    let today = state.entries.today_status(&user.user_id).await.map_err(fail)?;

    let selected = filter.tags.clone().unwrap_or_default();
    let page = IndexTemplate {
        theme: user.theme,
        title: "Entries".into(),
        cards: entries.iter().map(EntryCard::from_entry).collect(),
        chips: TagChip::build(&all_tags, &selected),
        search: filter.search.clone().unwrap_or_default(),
        selected_tags: selected.join(","),
        images_only: filter.has_image == Some(true),
        filtered: !filter.is_empty(),
        wrote_today: today.entry.is_some(),
    };
    Ok(render(StatusCode::OK, &page))
}

fn new_entry_page(
    theme: Theme,
    today: chrono::NaiveDate,
    content: String,
    tags: String,
    error: Option<String>,
) -> NewEntryTemplate {
    NewEntryTemplate {
        theme,
        title: "New entry".into(),
        today: format_diary_day(today),
        today_long: format_long_date(today),
        content,
        tags,
        error,
    }
}

pub async fn new_entry_form(State(state): State<AppState>, user: PageUser) -> PageResult {
    let today = state.entries.today_status(&user.user_id).await.map_err(user.fail())?;
    if today.entry.is_some() {
        let page = AlreadyWrittenTemplate {
            theme: user.theme,
            title: "Already written".into(),
            today: format_diary_day(today.date),
        };
        return Ok(render(StatusCode::OK, &page));
    }
    let page = new_entry_page(user.theme, today.date, String::new(), String::new(), None);
    Ok(render(StatusCode::OK, &page))
}

#[derive(Default)]
struct PublishForm {
    content: String,
    tags: String,
    image: Option<(Bytes, String)>,
}

async fn read_publish_form(multipart: &mut Multipart) -> Result<PublishForm, AppError> {
    let malformed =
        |e: axum::extract::multipart::MultipartError| AppError::invalid(format!("malformed form: {e}"));
    let mut form = PublishForm::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") => form.content = field.text().await.map_err(malformed)?,
            Some("tags") => form.tags = field.text().await.map_err(malformed)?,
            Some("image") => {
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let data = field.bytes().await.map_err(malformed)?;
                if !data.is_empty() {
                    form.image = Some((data, content_type));
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn publish(state: &AppState, user_id: &str, form: &mut PublishForm) -> Result<Entry, AppError> {
    // Rejected submissions never reach the media store.
    state.entries.check_publishable(user_id, &form.content).await?;
    let image_url = match form.image.take() {
        Some((data, content_type)) => {
            let media_id = state
                .media
                .save_upload(data, &content_type)
                .await
                .map_err(AppError::from_port)?;
            Some(state.media.url(&media_id))
        }
        None => None,
    };
    let tags = parse_tag_list(&form.tags);
    state.entries.create(user_id, &form.content, Some(tags), image_url).await
}

pub async fn publish_entry(
    State(state): State<AppState>,
    user: PageUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> PageResult {
    let fail = user.fail();
    let mut multipart = multipart.map_err(|r| fail(AppError::invalid(r.body_text())))?;
    let mut form = read_publish_form(&mut multipart).await.map_err(fail)?;

    match publish(&state, &user.user_id, &mut form).await {
        Ok(entry) => {
            info!(user_id = %user.user_id, date = %entry.date, "entry published");
            Ok(Redirect::to("/").into_response())
        }
        Err(err @ (AppError::InvalidInput(_) | AppError::Conflict(_))) => {
            let page = new_entry_page(
                user.theme,
                state.entries.today(),
                form.content,
                form.tags,
                Some(err.to_string()),
            );
            Ok(render(StatusCode::BAD_REQUEST, &page))
        }
        Err(err) => Err(PageError::new(user.theme, err)),
    }
}

async fn entry_page(
    state: &AppState,
    user: &PageUser,
    date: chrono::NaiveDate,
    error: Option<String>,
) -> Result<EntryTemplate, AppError> {
    let entry = state.entries.get(&user.user_id, date).await?;
    let neighbours = state.entries.neighbours(&user.user_id, date).await?;
    let editable = date == state.entries.today();
    Ok(EntryTemplate {
        theme: user.theme,
        title: format_long_date(date),
        entry: EntryDetail::from_entry(&entry, editable),
        previous: neighbours.previous.map(format_diary_day),
        next: neighbours.next.map(format_diary_day),
        error,
    })
}

pub async fn show_entry(
    State(state): State<AppState>,
    user: PageUser,
    Path(date): Path<String>,
) -> PageResult {
    let fail = user.fail();
    let date = lookup_day(&date).map_err(fail)?;
    let page = entry_page(&state, &user, date, None).await.map_err(fail)?;
    Ok(render(StatusCode::OK, &page))
}

#[derive(Debug, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: String,
}

pub async fn save_entry(
    State(state): State<AppState>,
    user: PageUser,
    Path(date): Path<String>,
    form: Result<Form<EntryForm>, FormRejection>,
) -> PageResult {
    let fail = user.fail();
    let date = mutable_day(&state, &user.user_id, &date, "edit").map_err(fail)?;
    let Form(form) = form.map_err(|r| fail(AppError::invalid(r.body_text())))?;
    let tags = parse_tag_list(&form.tags);

    match state.entries.update(&user.user_id, date, &form.content, Some(tags)).await {
        Ok(_) => Ok(Redirect::to(&format!("/entry/{}", format_diary_day(date))).into_response()),
        Err(err @ AppError::InvalidInput(_)) => {
            let page = entry_page(&state, &user, date, Some(err.to_string()))
                .await
                .map_err(fail)?;
            Ok(render(StatusCode::BAD_REQUEST, &page))
        }
        Err(err) => Err(fail(err)),
    }
}

pub async fn remove_entry(
    State(state): State<AppState>,
    user: PageUser,
    Path(date): Path<String>,
) -> PageResult {
    let fail = user.fail();
    let date = mutable_day(&state, &user.user_id, &date, "delete").map_err(fail)?;
    state.entries.delete(&user.user_id, date).await.map_err(fail)?;
    info!(user_id = %user.user_id, %date, "entry deleted");
    Ok(Redirect::to("/").into_response())
}

pub async fn profile(State(state): State<AppState>, user: PageUser) -> PageResult {
    let stats = state.entries.stats(&user.user_id).await.map_err(user.fail())?;
    let page = ProfileTemplate {
        theme: user.theme,
        title: "Profile".into(),
        user_id: user.user_id.clone(),
        summary: StatsSummary::from_stats(&stats),
        bars: ActivityBar::build(&stats.entries_per_day),
        top_tags: TagBar::build(&stats.tag_frequency, TOP_TAGS),
    };
    Ok(render(StatusCode::OK, &page))
}

/// Same-site path of the page the request came from.
fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| {
            let after_scheme = referer.split_once("://").map_or(referer, |(_, rest)| rest);
            after_scheme.find('/').map(|i| &after_scheme[i..])
        })
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or("/")
        .to_string()
}

/// Flips the theme cookie. Works without a session.
pub async fn toggle_theme(headers: HeaderMap) -> Response {
    let theme = theme_from(&headers).toggled();
    let cookie = format!(
        "{THEME_COOKIE}={}; Path=/; Max-Age={THEME_MAX_AGE_SECS}; SameSite=Lax",
        theme.as_str()
    );
    ([(SET_COOKIE, cookie)], Redirect::to(&back_path(&headers))).into_response()
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}
