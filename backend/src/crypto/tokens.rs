// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Access tokens are RS256-signed JWTs. Refresh tokens are opaque strings of
//! the form `<token_id>.<secret>`, of which only a SHA-256 hash is stored.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rptvtypes::identifiers::{Email, Roles, UserId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::instrument;

use super::{random_bytes, RandomnessError};

/// Key id put into the header of every access token.
pub const KEY_ID: &str = "rptv-rs256";

const REFRESH_TOKEN_ID_BYTES: usize = 12;
const REFRESH_TOKEN_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign access token: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("Invalid access token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("Malformed refresh token")]
    MalformedRefreshToken,
    #[error("Token lifetime of {0} seconds is out of range")]
    LifetimeOutOfRange(u64),
    #[error("Token expiry is out of range")]
    ExpiryOutOfRange,
    #[error(transparent)]
    Randomness(#[from] RandomnessError),
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub sub: UserId,
    pub email: String,
    pub roles: Roles,
}

pub struct AccessTokenIssuer {
    key: EncodingKey,
    issuer: String,
    ttl: TimeDelta,
}

impl AccessTokenIssuer {
    pub fn new(
        key: EncodingKey,
        issuer: impl Into<String>,
        ttl_seconds: u64,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            key,
            issuer: issuer.into(),
            ttl: lifetime(ttl_seconds)?,
        })
    }

    pub fn issue(&self, sub: UserId, email: &Email, roles: &Roles) -> Result<String, TokenError> {
        self.issue_at(sub, email, roles, Utc::now())
    }

    #[instrument(level = "debug", skip(self, email, roles))]
    pub fn issue_at(
        &self,
        sub: UserId,
        email: &Email,
        roles: &Roles,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims {
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expiry(now, self.ttl)?.timestamp(),
            sub,
            email: email.to_string(),
            roles: roles.clone(),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(KEY_ID.to_owned());
        jsonwebtoken::encode(&header, &claims, &self.key).map_err(TokenError::Signing)
    }
}

pub struct AccessTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl AccessTokenVerifier {
    pub fn new(key: DecodingKey, issuer: &str) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

/// A freshly generated refresh token. `token` is handed to the client, the
/// rest is persisted.
#[derive(Debug, Clone)]
pub struct GeneratedRefreshToken {
    pub token_id: String,
    pub token: String,
    pub hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct RefreshTokenFactory {
    ttl: TimeDelta,
}

impl RefreshTokenFactory {
    pub fn new(ttl_seconds: u64) -> Result<Self, TokenError> {
        Ok(Self {
            ttl: lifetime(ttl_seconds)?,
        })
    }

    pub fn generate(&self, now: DateTime<Utc>) -> Result<GeneratedRefreshToken, TokenError> {
        let expires_at = expiry(now, self.ttl)?;
        let token_id = URL_SAFE_NO_PAD.encode(random_bytes::<REFRESH_TOKEN_ID_BYTES>()?);
        let secret = URL_SAFE_NO_PAD.encode(random_bytes::<REFRESH_TOKEN_SECRET_BYTES>()?);
        let token = format!("{token_id}.{secret}");
        let hash = hash_refresh_token(&token);
        Ok(GeneratedRefreshToken {
            token_id,
            token,
            hash,
            issued_at: now,
            expires_at,
        })
    }
}

/// The part of a presented refresh token before the first `.`.
pub fn extract_token_id(presented: &str) -> Result<&str, TokenError> {
    match presented.split_once('.') {
        Some((token_id, _)) if !token_id.is_empty() => Ok(token_id),
        _ => Err(TokenError::MalformedRefreshToken),
    }
}

/// Hex-encoded SHA-256 of the presented refresh token.
pub fn hash_refresh_token(presented: &str) -> String {
    hex::encode(Sha256::digest(presented.as_bytes()))
}

/// Compares the hash of `presented` with `stored_hash` in constant time.
pub fn matches(presented: &str, stored_hash: &str) -> bool {
    let computed = hash_refresh_token(presented);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

fn lifetime(seconds: u64) -> Result<TimeDelta, TokenError> {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or(TokenError::LifetimeOutOfRange(seconds))
}

fn expiry(now: DateTime<Utc>, ttl: TimeDelta) -> Result<DateTime<Utc>, TokenError> {
    now.checked_add_signed(ttl).ok_or(TokenError::ExpiryOutOfRange)
}
