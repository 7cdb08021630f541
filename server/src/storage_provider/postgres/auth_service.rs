// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rptvbackend::{
    auth_service::{
        errors::{CreateInviteError, CreateUserError, RegisterUserError},
        refresh_token::RefreshTokenRecord,
        storage_provider_trait::AuthStorageProvider,
        user_record::UserRecord,
    },
    errors::StorageError,
    invites::InviteCodeRecord,
};
use rptvtypes::identifiers::{Email, UserId};
use sqlx::PgConnection;
use uuid::Uuid;

use super::PostgresStorage;

const USER_COLUMNS: &str = "id, email, password_hash, roles, created_at, updated_at";
const INVITE_COLUMNS: &str = "id, code, max_uses, uses, expires_at, created_at";
const REFRESH_TOKEN_COLUMNS: &str =
    "id, user_id, token_id, token_hash, issued_at, expires_at, revoked";

async fn insert_user(
    connection: &mut PgConnection,
    user: &UserRecord,
) -> Result<(), CreateUserError> {
    let result = sqlx::query(
        "INSERT INTO users (id, email, password_hash, roles, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.roles)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(connection)
    .await;
    match result.map_err(StorageError::from) {
        Ok(_) => Ok(()),
        Err(StorageError::UniqueViolation(_)) => Err(CreateUserError::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl AuthStorageProvider for PostgresStorage {
    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn load_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StorageError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn load_user_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StorageError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: &UserRecord) -> Result<(), CreateUserError> {
        let mut connection = self.pool.acquire().await.map_err(StorageError::from)?;
        insert_user(&mut connection, user).await
    }

    async fn create_user_with_invite(
        &self,
        code: &str,
        now: DateTime<Utc>,
        user: &UserRecord,
    ) -> Result<(), RegisterUserError> {
        let mut transaction = self.pool.begin().await.map_err(StorageError::from)?;

        // The row lock serializes concurrent registrations with the same code.
        let invite = sqlx::query_as::<_, InviteCodeRecord>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invite_codes WHERE code = $1 FOR UPDATE"
        ))
        .bind(code)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(StorageError::from)?
        .ok_or(RegisterUserError::InviteNotFound)?;
        invite.check_consumable(now)?;

        insert_user(&mut *transaction, user).await?;

        sqlx::query("UPDATE invite_codes SET uses = uses + 1 WHERE id = $1")
            .bind(invite.id)
            .execute(&mut *transaction)
            .await
            .map_err(StorageError::from)?;

        transaction.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn create_invite(&self, invite: &InviteCodeRecord) -> Result<(), CreateInviteError> {
        let result = sqlx::query(
            "INSERT INTO invite_codes (id, code, max_uses, uses, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(invite.id)
        .bind(&invite.code)
        .bind(invite.max_uses)
        .bind(invite.uses)
        .bind(invite.expires_at)
        .bind(invite.created_at)
        .execute(&self.pool)
        .await;
        match result.map_err(StorageError::from) {
            Ok(_) => Ok(()),
            Err(StorageError::UniqueViolation(_)) => Err(CreateInviteError::DuplicateCode),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_invites(&self) -> Result<Vec<InviteCodeRecord>, StorageError> {
        let invites = sqlx::query_as::<_, InviteCodeRecord>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invite_codes ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(invites)
    }

    async fn revoke_invite(&self, code: &str) -> Result<Option<InviteCodeRecord>, StorageError> {
        let invite = sqlx::query_as::<_, InviteCodeRecord>(&format!(
            "UPDATE invite_codes SET max_uses = uses WHERE code = $1 RETURNING {INVITE_COLUMNS}"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    async fn store_refresh_token(&self, token: &RefreshTokenRecord) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO refresh_tokens
                (id, user_id, token_id, token_hash, issued_at, expires_at, revoked)
            VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_id)
        .bind(&token.token_hash)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_refresh_token(
        &self,
        token_id: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let token = sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "SELECT {REFRESH_TOKEN_COLUMNS} FROM refresh_tokens WHERE token_id = $1"
        ))
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> Result<bool, StorageError> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1 AND NOT revoked")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn revoke_all_refresh_tokens(&self, user_id: UserId) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
