// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    /// A lock of an in-memory storage provider was poisoned.
    #[error("Poisoned lock")]
    PoisonedLock,
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &e {
            if db_error.is_unique_violation() {
                let constraint = db_error.constraint().unwrap_or_default().to_owned();
                return Self::UniqueViolation(constraint);
            }
        }
        Self::Database(e.into())
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
