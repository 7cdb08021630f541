// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use rptvtypes::identifiers::UserId;
use uuid::Uuid;

use crate::crypto::tokens::GeneratedRefreshToken;

/// Persisted form of a refresh token. Only the hash of the presented token is
/// stored; `token_id` is the public lookup key.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_id: String,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    pub fn new(user_id: UserId, token: &GeneratedRefreshToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_id: token.token_id.clone(),
            token_hash: token.hash.clone(),
            issued_at: token.issued_at,
            expires_at: token.expires_at,
            revoked: false,
        }
    }

    /// A token is usable up to and including its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
