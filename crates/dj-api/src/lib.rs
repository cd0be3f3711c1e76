//! # dj-api
//!
//! The web routing and orchestration layer for Daybook: a JSON API under
//! `/api` and server-rendered pages at the root.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod state;

use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

pub use error::ApiError;
pub use state::AppState;

/// Room for the non-file fields of a multipart form.
const FORM_OVERHEAD_BYTES: usize = 256 * 1024;

/// Where uploaded media lives on disk and where it is served from.
#[derive(Debug, Clone)]
pub struct MediaRoutes {
    pub root: PathBuf,
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

impl MediaRoutes {
    /// Cap for multipart uploads: one image plus the form around it.
    pub fn upload_body_limit(&self) -> usize {
        self.max_upload_bytes + FORM_OVERHEAD_BYTES
    }

    /// Cap for JSON entry bodies, which may carry the image inline as a
    /// base64 data URL.
    pub fn entry_body_limit(&self) -> usize {
        self.max_upload_bytes.div_ceil(3) * 4 + FORM_OVERHEAD_BYTES
    }
}

/// JSON resource surface, mounted under `/api`.
pub fn api_routes(media: &MediaRoutes) -> Router<AppState> {
    Router::new()
        .route("/entries", get(handlers::list_entries).post(handlers::create_entry))
        .route(
            "/entries/{date}",
            get(handlers::get_entry)
                .put(handlers::update_entry)
                .delete(handlers::delete_entry),
        )
        // Applies only to the routes above.
        .layer(DefaultBodyLimit::max(media.entry_body_limit()))
        .route("/stats", get(handlers::user_stats))
        .route("/uploads", post(handlers::upload_image))
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/new", get(pages::new_entry_form).post(pages::publish_entry))
        .route("/entry/{date}", get(pages::show_entry).post(pages::save_entry))
        .route("/entry/{date}/delete", post(pages::remove_entry))
        .route("/profile", get(pages::profile))
        .route("/theme", post(pages::toggle_theme))
        .route("/assets/daybook.css", get(pages::stylesheet))
}

/// Assembles the full application.
pub fn router(state: AppState, media: &MediaRoutes) -> Router {
    let app = Router::new()
        .merge(page_routes())
        .nest("/api", api_routes(media))
        .route("/healthz", get(|| async { "ok" }))
        .nest_service(&media.url_prefix, ServeDir::new(&media.root))
        .layer(DefaultBodyLimit::max(media.upload_body_limit()))
        .with_state(state);

    middleware::standard_middleware(app)
}
