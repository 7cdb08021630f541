// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use rptvtypes::identifiers::UserId;
use uuid::Uuid;

use crate::errors::StorageError;

use super::account_record::XtreamAccountRecord;

/// Storage provider trait for Xtream accounts.
#[async_trait]
pub trait XtreamStorageProvider: Sync + Send + 'static {
    /// All accounts of the given user, oldest first.
    async fn list_accounts(&self, user_id: UserId)
        -> Result<Vec<XtreamAccountRecord>, StorageError>;

    async fn load_account(&self, id: Uuid) -> Result<Option<XtreamAccountRecord>, StorageError>;

    async fn create_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError>;

    /// Overwrite the mutable fields (name, URL, credentials, `updated_at`) of
    /// the account with the same id.
    async fn update_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError>;

    /// Returns `false` if there was no account with the given id.
    async fn delete_account(&self, id: Uuid) -> Result<bool, StorageError>;
}
