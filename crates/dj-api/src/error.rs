use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dj_core::AppError;
use serde_json::json;
use tracing::error;

pub const GENERIC_FAILURE: &str = "Something went wrong";

/// `AppError` as seen over HTTP: `{"error": "..."}` with the mapped status.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid(rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self(AppError::invalid(rejection.body_text()))
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        AppError::InvalidInput(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to show a client. Internal details stay in the logs.
pub fn public_message(err: &AppError) -> String {
    match err {
        AppError::Unauthorized => "Unauthorized".into(),
        AppError::Internal(_) => GENERIC_FAILURE.into(),
        other => other.to_string(),
    }
}

/// Logs the detail of an internal failure. Called once per error response.
pub fn report(err: &AppError) {
    if let AppError::Internal(detail) = err {
        error!(%detail, "request failed");
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        report(&self.0);
        let status = status_for(&self.0);
        (status, Json(json!({ "error": public_message(&self.0) }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_stays_out_of_the_response() {
        let err = AppError::Internal("database is locked".into());
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(public_message(&err), GENERIC_FAILURE);
        assert_eq!(public_message(&AppError::entry_not_found()), "Entry not found");
        assert_eq!(status_for(&AppError::already_written()), StatusCode::BAD_REQUEST);
    }
}
