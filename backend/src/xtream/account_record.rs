// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use rptvtypes::{identifiers::UserId, messages::XtreamAccountView};
use uuid::Uuid;

/// An Xtream provider account of a user. `username_enc` and `password_enc`
/// hold EAR payloads produced by [`crate::crypto::ear::CredentialCipher`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct XtreamAccountRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub api_url: String,
    pub username_enc: String,
    pub password_enc: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl XtreamAccountRecord {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

impl From<XtreamAccountRecord> for XtreamAccountView {
    fn from(record: XtreamAccountRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            api_url: record.api_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
