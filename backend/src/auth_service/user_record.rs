// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use rptvtypes::identifiers::{Email, Roles, UserId};

/// A registered account. The password is only kept as an Argon2 PHC hash.
#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct UserRecord {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub roles: Roles,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(email: Email, password_hash: String, roles: Roles, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::random(),
            email,
            password_hash,
            roles,
            created_at: now,
            updated_at: now,
        }
    }
}
