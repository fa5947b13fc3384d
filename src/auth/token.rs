//! Stateless session tokens sealed with HMAC-SHA256.
//!
//! Wire format: `base64url(claims_json) "." base64url(hmac(claims_segment))`,
//! both segments unpadded. Nothing is stored server-side; a token dies only
//! when `exp` passes.

use crate::error::{AppError, AuthError};
use crate::models::{unix_now, AdminIdentity, Role};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signed token payload. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

impl From<SessionClaims> for AdminIdentity {
    fn from(claims: SessionClaims) -> Self {
        AdminIdentity {
            subject: claims.sub,
            role: claims.role,
            expires_at: claims.exp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Issues and verifies session tokens with one process-wide key.
#[derive(Clone)]
pub struct TokenService {
    mac: HmacSha256,
    ttl_secs: u64,
}

impl TokenService {
    /// `ttl_secs` must be non-zero; a token with `exp == iat` could never verify.
    pub fn new(key: &[u8], ttl_secs: u64) -> Result<Self, AppError> {
        if ttl_secs == 0 {
            return Err(AppError::Internal("Token TTL must be greater than zero".to_string()));
        }
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| AppError::Internal(format!("HMAC key: {}", e)))?;
        Ok(Self { mac, ttl_secs })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, AppError> {
        self.issue_at(subject, role, unix_now())
    }

    pub fn issue_at(&self, subject: &str, role: Role, now: u64) -> Result<IssuedToken, AppError> {
        let claims = SessionClaims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        let payload = serde_json::to_vec(&claims)
            .map_err(|e| AppError::Internal(format!("JSON error: {}", e)))?;
        let payload_segment = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac.clone();
        mac.update(payload_segment.as_bytes());
        let signature_segment = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{}.{}", payload_segment, signature_segment),
            claims,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.verify_at(token, unix_now())
    }

    /// Validate a token against the clock value `now`.
    ///
    /// Signature is checked before the payload is decoded, so nothing in an
    /// unsigned payload is ever parsed.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<SessionClaims, AuthError> {
        let (payload_segment, signature_segment) = token
            .split_once('.')
            .ok_or(AuthError::MalformedToken)?;
        if payload_segment.is_empty() || signature_segment.contains('.') {
            return Err(AuthError::MalformedToken);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_segment)
            .map_err(|_| AuthError::MalformedToken)?;

        // verify_slice compares in constant time
        let mut mac = self.mac.clone();
        mac.update(payload_segment.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidCredential)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_segment)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

        if claims.exp <= claims.iat {
            return Err(AuthError::MalformedToken);
        }
        if now < claims.iat {
            return Err(AuthError::InvalidCredential);
        }
        if now >= claims.exp {
            return Err(AuthError::ExpiredCredential);
        }

        Ok(claims)
    }
}
