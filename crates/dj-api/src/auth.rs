//! Request identity. The token comes from `Authorization: Bearer …` or from
//! the session cookie; the `SessionProvider` turns it into a user id.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use dj_core::AppError;
use dj_ui::theme::THEME_COOKIE;
use dj_ui::Theme;

use crate::error::ApiError;
use crate::pages::PageError;
use crate::state::AppState;

/// The authenticated owner of the request, for JSON endpoints.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// The authenticated owner of the request, for HTML pages.
#[derive(Debug, Clone)]
pub struct PageUser {
    pub user_id: String,
    pub theme: Theme,
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

pub fn theme_from(headers: &HeaderMap) -> Theme {
    Theme::from_cookie(cookie_value(headers, THEME_COOKIE))
}

fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);
    bearer
        .or_else(|| cookie_value(headers, cookie_name))
        .filter(|token| !token.is_empty())
}

fn resolve_user(parts: &Parts, state: &AppState) -> Result<String, AppError> {
    let token = session_token(&parts.headers, &state.session_cookie).ok_or(AppError::Unauthorized)?;
    state.sessions.resolve(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve_user(parts, state)?))
    }
}

impl FromRequestParts<AppState> for PageUser {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let theme = theme_from(&parts.headers);
        let user_id = resolve_user(parts, state).map_err(|err| PageError::new(theme, err))?;
        Ok(PageUser { user_id, theme })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc.def; other=1"));
        assert_eq!(cookie_value(&headers, "session"), Some("abc.def"));
        assert_eq!(theme_from(&headers), Theme::Dark);
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        headers.insert(COOKIE, HeaderValue::from_static("session=cookie-tok"));
        assert_eq!(session_token(&headers, "session"), Some("tok"));

        headers.remove(AUTHORIZATION);
        assert_eq!(session_token(&headers, "session"), Some("cookie-tok"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        headers.remove(COOKIE);
        assert_eq!(session_token(&headers, "session"), None);
    }
}
