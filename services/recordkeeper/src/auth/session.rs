//! Session token minting and verification.
//!
//! # Purpose
//! Session tokens are HS256 JWTs whose `sub` is the officer id. They are minted
//! by the sign-in service sharing the secret and verified here on every
//! mutating request.
//!
//! # Key invariants
//! - Only HS256 is accepted; `iss` and `exp` are mandatory and validated.
//! - The token carries no rank. Rank is read from the store at resolution
//!   time so a demotion takes effect on the next request.
//!
//! # Security model
//! - The secret must never be logged; [`SessionKeys`] does not implement
//!   `Debug` for that reason.
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use roster_common::ids::OfficerId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Allowed clock skew when checking `exp`.
const LEEWAY_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid subject: {0}")]
    Subject(String),
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
}

impl SessionKeys {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
        }
    }

    /// Mint a session token for `officer` valid for `ttl`.
    ///
    /// # Errors
    /// - `Jwt` if encoding fails.
    pub fn issue(&self, officer: OfficerId, ttl: Duration) -> Result<String, SessionError> {
        let now = now_epoch_seconds();
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            sub: officer.to_string(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify `token` and return the officer id it was issued for.
    ///
    /// # Errors
    /// - `Jwt` for bad signatures, foreign issuers, expiry or malformed tokens.
    /// - `Subject` if `sub` is not an officer id.
    pub fn verify(&self, token: &str) -> Result<OfficerId, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = LEEWAY_SECS;
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)?;
        OfficerId::from_str(&data.claims.sub).map_err(|_| SessionError::Subject(data.claims.sub))
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
