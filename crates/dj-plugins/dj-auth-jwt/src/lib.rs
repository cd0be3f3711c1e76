//! # dj-auth-jwt
//!
//! HS256 session-token implementation of `SessionProvider`.
//! Tokens are minted by the external identity service; the `sub` claim is the
//! stable user id and `exp` is always enforced.

use dj_core::error::{AppError, Result};
use dj_core::traits::SessionProvider;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
}

pub struct JwtSessionProvider {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtSessionProvider {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            decoding: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

impl SessionProvider for JwtSessionProvider {
    fn resolve(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "rejected session token");
            AppError::Unauthorized
        })?;
        if data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized);
        }
        Ok(data.claims.sub)
    }
}

/// Signs a session token. Used by the seed tooling and tests; production
/// tokens come from the identity service sharing the same secret.
pub fn issue_token(secret: &SecretString, user_id: &str, expires_at: u64) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("signing session token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn in_an_hour() -> u64 {
        (Utc::now() + Duration::hours(1)).timestamp() as u64
    }

    #[test]
    fn resolves_valid_token() {
        let key = secret("correct horse battery staple");
        let token = issue_token(&key, "user-42", in_an_hour()).unwrap();
        assert_eq!(JwtSessionProvider::new(&key).resolve(&token).unwrap(), "user-42");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = issue_token(&secret("one"), "user-42", in_an_hour()).unwrap();
        let err = JwtSessionProvider::new(&secret("two")).resolve(&token).unwrap_err();
        assert_eq!(err, AppError::Unauthorized);
    }

    #[test]
    fn rejects_expired_token() {
        let key = secret("k");
        let expired = (Utc::now() - Duration::hours(2)).timestamp() as u64;
        let token = issue_token(&key, "user-42", expired).unwrap();
        assert_eq!(
            JwtSessionProvider::new(&key).resolve(&token).unwrap_err(),
            AppError::Unauthorized
        );
    }

    #[test]
    fn rejects_garbage_and_blank_subject() {
        let key = secret("k");
        let provider = JwtSessionProvider::new(&key);
        assert!(provider.resolve("not.a.token").is_err());

        let token = issue_token(&key, "  ", in_an_hour()).unwrap();
        assert!(provider.resolve(&token).is_err());
    }
}
