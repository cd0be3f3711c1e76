//! # dj-api JSON handlers
//!
//! Thin glue between HTTP and `EntryService`: extract, delegate, serialize.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::Json;
use chrono::NaiveDate;
use dj_core::dates::parse_diary_day;
use dj_core::{AppError, Entry, EntryFilter, UserStats};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `Json<T>` whose rejections answer as `{"error": ...}`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// A path segment that is not a diary day names no entry.
pub(crate) fn lookup_day(raw: &str) -> Result<NaiveDate, AppError> {
    parse_diary_day(raw).map_err(|_| AppError::entry_not_found())
}

/// The day a mutation targets. Anything but today, including a segment that
/// is not a date at all, is Forbidden.
pub(crate) fn mutable_day(
    state: &AppState,
    user_id: &str,
    raw: &str,
    action: &str,
) -> Result<NaiveDate, AppError> {
    let date = parse_diary_day(raw).map_err(|_| AppError::past_entry(action))?;
    state.entries.ensure_mutable(user_id, date, action)?;
    Ok(date)
}

/// `?search=&tags=a,b&hasImage=true`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub tags: Option<String>,
    pub has_image: Option<String>,
}

impl ListParams {
    pub fn to_filter(&self) -> EntryFilter {
        EntryFilter::from_params(
            self.search.as_deref(),
            self.tags.as_deref(),
            self.has_image.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryBody {
    #[serde(default)]
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryBody {
    #[serde(default)]
    pub content: String,
    pub tags: Option<Vec<String>>,
}

pub async fn list_entries(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Entry>> {
    let entries = state.entries.list(&user_id, &params.to_filter()).await?;
    Ok(Json(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(date): Path<String>,
) -> ApiResult<Entry> {
    let date = lookup_day(&date)?;
    Ok(Json(state.entries.get(&user_id, date).await?))
}

pub async fn create_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(body): JsonBody<CreateEntryBody>,
) -> ApiResult<Entry> {
    let entry = state
        .entries
        .create(&user_id, &body.content, body.tags, body.image_url)
        .await?;
    info!(%user_id, date = %entry.date, "entry published");
    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(date): Path<String>,
    body: Result<JsonBody<UpdateEntryBody>, ApiError>,
) -> ApiResult<Entry> {
    // Past days are refused whatever the body holds.
    let date = mutable_day(&state, &user_id, &date, "edit")?;
    let JsonBody(body) = body?;
    let entry = state
        .entries
        .update(&user_id, date, &body.content, body.tags)
        .await?;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(date): Path<String>,
) -> ApiResult<Value> {
    let date = mutable_day(&state, &user_id, &date, "delete")?;
    state.entries.delete(&user_id, date).await?;
    info!(%user_id, %date, "entry deleted");
    Ok(Json(json!({ "message": "Entry deleted successfully" })))
}

pub async fn user_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<UserStats> {
    Ok(Json(state.entries.stats(&user_id).await?))
}

/// Accepts one `image` part and returns the URL to store as `imageUrl`.
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid(format!("malformed upload: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid(format!("malformed upload: {e}")))?;
        let media_id = state
            .media
            .save_upload(data, &content_type)
            .await
            .map_err(AppError::from_port)?;
        info!(%user_id, %media_id, "image uploaded");
        return Ok(Json(json!({ "imageUrl": state.media.url(&media_id) })));
    }
    Err(AppError::invalid("missing image field").into())
}
