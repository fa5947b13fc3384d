//! Bearer-token gate and extractors for protected routes.

use crate::auth::password::SecretHasher;
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::error::{AppError, AuthError};
use crate::models::AdminIdentity;
use crate::storage::{AttemptLimiter, CredentialStore};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Application state shared across handlers.
///
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CredentialStore>,
    /// `None` disables login throttling.
    pub limiter: Option<Arc<dyn AttemptLimiter>>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<SecretHasher>,
}

/// Pull the token out of `Authorization: Bearer {token}`.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    Ok(token)
}

/// Middleware that rejects any request without a valid session token.
///
/// On success the [`AdminIdentity`] is stored in the request extensions
/// before the handler runs.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let verified = bearer_token(request.headers()).and_then(|token| state.tokens.verify(token));

    let claims = match verified {
        Ok(claims) => claims,
        Err(reason) => {
            tracing::warn!(
                action = "token_rejected",
                reason = reason.kind(),
                path = %request.uri().path(),
                "Protected route rejected request"
            );
            return Err(AppError::Unauthorized(reason));
        }
    };

    request
        .extensions_mut()
        .insert(AdminIdentity::from(claims));

    Ok(next.run(request).await)
}

/// Authenticated admin extractor.
///
/// Reads the identity left by [`require_admin`]. A route that was not wrapped
/// by the gate yields 401 rather than running unauthenticated.
pub struct AdminSession(pub AdminIdentity);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AdminIdentity>() {
            Some(identity) => Ok(AdminSession(identity.clone())),
            None => {
                tracing::warn!(
                    action = "token_rejected",
                    reason = AuthError::MissingCredential.kind(),
                    path = %parts.uri.path(),
                    "Route reached without a verified session"
                );
                Err(AppError::Unauthorized(AuthError::MissingCredential))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_present() {
        let headers = headers_with("Bearer abc.def");
        assert_eq!(bearer_token(&headers), Ok("abc.def"));
    }

    #[test]
    fn test_bearer_scheme_case_insensitive() {
        let headers = headers_with("bearer abc.def");
        assert_eq!(bearer_token(&headers), Ok("abc.def"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn test_wrong_scheme() {
        for value in ["Basic YWRtaW46cGFzcw==", "Token abc", "abc.def", "Bearer", "Bearer   "] {
            assert_eq!(
                bearer_token(&headers_with(value)),
                Err(AuthError::MalformedToken),
                "{:?}",
                value
            );
        }
    }

    #[test]
    fn test_non_ascii_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        assert_eq!(bearer_token(&headers), Err(AuthError::MalformedToken));
    }
}
