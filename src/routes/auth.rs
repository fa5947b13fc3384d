//! Auth API endpoints.

use crate::auth::middleware::AppState;
use crate::error::{AppError, AuthError};
use crate::models::{LoginRequest, LoginResponse};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    response::IntoResponse,
    Json,
};
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;

/// Longest secret accepted before hashing; Argon2 cost grows with input.
pub const MAX_SECRET_BYTES: usize = 1024;
pub const MAX_IDENTIFIER_BYTES: usize = 254;

fn validate_login(req: &LoginRequest) -> Result<(), AppError> {
    if req.identifier.is_empty() || req.identifier.len() > MAX_IDENTIFIER_BYTES {
        return Err(AppError::BadRequest(format!(
            "Identifier must be 1-{} bytes",
            MAX_IDENTIFIER_BYTES
        )));
    }
    if req.secret.is_empty() || req.secret.len() > MAX_SECRET_BYTES {
        return Err(AppError::BadRequest(format!(
            "Secret must be 1-{} bytes",
            MAX_SECRET_BYTES
        )));
    }
    Ok(())
}

/// Serde's message names fields and positions; keep it in the logs only.
fn login_body_rejected(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection.body_text(), "Login body rejected");
    AppError::BadRequest(
        "Body must be a JSON object with string fields identifier and secret".to_string(),
    )
}

fn ip_hash(addr: &SocketAddr) -> String {
    let mut hasher = std::hash::DefaultHasher::new();
    addr.ip().hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// POST /api/auth/login - Verify credentials and issue a session token
///
/// Unknown identifiers and wrong secrets produce the same response and cost
/// the same Argon2 work.
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body.map_err(login_body_rejected)?;
    validate_login(&req)?;

    if let Some(limiter) = &state.limiter {
        let max = state.config.rate_limit_login_per_min;
        let key = format!("ratelimit:login:{}", addr.ip());
        if !limiter.allow(&key, max, 60).await? {
            tracing::warn!(action = "rate_limited", endpoint = "auth/login", ip_hash = %ip_hash(&addr), "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
    }

    let credential = state.store.find_by_identifier(&req.identifier).await?;

    let hasher = state.hasher.clone();
    let stored_hash = credential.as_ref().map(|c| c.secret_hash.clone());
    let secret = req.secret;
    let verified = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => hasher.verify(&secret, &hash),
        None => hasher.verify_decoy(&secret),
    })
    .await?;

    let credential = match credential {
        Some(credential) if verified => credential,
        found => {
            tracing::warn!(
                action = "login_failed",
                identifier = %req.identifier,
                known_identifier = found.is_some(),
                "Login rejected"
            );
            return Err(AppError::Unauthorized(AuthError::InvalidCredential));
        }
    };

    let issued = state.tokens.issue(&credential.identifier, credential.role)?;

    tracing::info!(action = "login_success", identifier = %credential.identifier, role = %credential.role, expires_at = issued.claims.exp, "Admin authenticated");

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_at: issued.claims.exp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroizing;

    fn request(identifier: &str, secret: &str) -> LoginRequest {
        LoginRequest {
            identifier: identifier.to_string(),
            secret: Zeroizing::new(secret.to_string()),
        }
    }

    #[test]
    fn test_validate_login() {
        assert!(validate_login(&request("admin", "correct-horse")).is_ok());
        assert!(matches!(
            validate_login(&request("", "x")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_login(&request("admin", "")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_login(&request("admin", &"x".repeat(MAX_SECRET_BYTES + 1))),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_login(&request(&"a".repeat(MAX_IDENTIFIER_BYTES + 1), "x")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_ip_hash_ignores_port() {
        let addr: SocketAddr = "203.0.113.7:4000".parse().unwrap();
        let other_port: SocketAddr = "203.0.113.7:5000".parse().unwrap();
        let other_ip: SocketAddr = "203.0.113.8:4000".parse().unwrap();
        assert_eq!(ip_hash(&addr), ip_hash(&other_port));
        assert_ne!(ip_hash(&addr), ip_hash(&other_ip));
    }
}
