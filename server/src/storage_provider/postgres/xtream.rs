// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use rptvbackend::{
    errors::StorageError,
    xtream::{account_record::XtreamAccountRecord, storage_provider_trait::XtreamStorageProvider},
};
use rptvtypes::identifiers::UserId;
use uuid::Uuid;

use super::PostgresStorage;

const ACCOUNT_COLUMNS: &str =
    "id, user_id, name, api_url, username_enc, password_enc, created_at, updated_at";

#[async_trait]
impl XtreamStorageProvider for PostgresStorage {
    async fn list_accounts(
        &self,
        user_id: UserId,
    ) -> Result<Vec<XtreamAccountRecord>, StorageError> {
        let accounts = sqlx::query_as::<_, XtreamAccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM xtream_accounts
            WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn load_account(&self, id: Uuid) -> Result<Option<XtreamAccountRecord>, StorageError> {
        let account = sqlx::query_as::<_, XtreamAccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM xtream_accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn create_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO xtream_accounts
                (id, user_id, name, api_url, username_enc, password_enc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(&account.name)
        .bind(&account.api_url)
        .bind(&account.username_enc)
        .bind(&account.password_enc)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE xtream_accounts
            SET name = $2, api_url = $3, username_enc = $4, password_enc = $5, updated_at = $6
            WHERE id = $1",
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.api_url)
        .bind(&account.username_enc)
        .bind(&account.password_enc)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM xtream_accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
