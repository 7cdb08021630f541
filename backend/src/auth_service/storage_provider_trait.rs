// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rptvtypes::identifiers::{Email, UserId};
use uuid::Uuid;

use crate::{errors::StorageError, invites::InviteCodeRecord};

use super::{
    errors::{CreateInviteError, CreateUserError, RegisterUserError},
    refresh_token::RefreshTokenRecord,
    user_record::UserRecord,
};

/// Storage provider trait for users, invite codes and refresh tokens.
#[async_trait]
pub trait AuthStorageProvider: Sync + Send + 'static {
    /// Check that the storage backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;

    // === Users ===

    async fn load_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StorageError>;

    async fn load_user_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StorageError>;

    /// Create a new user. Fails with [`CreateUserError::EmailTaken`] if a user
    /// with the same email exists.
    async fn create_user(&self, user: &UserRecord) -> Result<(), CreateUserError>;

    /// Atomically consume one use of the invite with the given code and create
    /// the user. The invite is checked with
    /// [`InviteCodeRecord::check_consumable`] at `now`. If any step fails,
    /// neither the invite nor the users are modified.
    async fn create_user_with_invite(
        &self,
        code: &str,
        now: DateTime<Utc>,
        user: &UserRecord,
    ) -> Result<(), RegisterUserError>;

    // === Invite codes ===

    async fn create_invite(&self, invite: &InviteCodeRecord) -> Result<(), CreateInviteError>;

    /// All invite codes, oldest first.
    async fn list_invites(&self) -> Result<Vec<InviteCodeRecord>, StorageError>;

    /// Set `max_uses` to the current `uses` of the invite with the given code.
    /// Returns the updated record or `None` if there is no such invite.
    async fn revoke_invite(&self, code: &str) -> Result<Option<InviteCodeRecord>, StorageError>;

    // === Refresh tokens ===

    async fn store_refresh_token(&self, token: &RefreshTokenRecord) -> Result<(), StorageError>;

    async fn load_refresh_token(
        &self,
        token_id: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError>;

    /// Revoke the token with the given id if it isn't revoked yet. Returns
    /// `true` if this call revoked it.
    async fn revoke_refresh_token(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Revoke all tokens of the given user and return how many were revoked.
    async fn revoke_all_refresh_tokens(&self, user_id: UserId) -> Result<u64, StorageError>;
}
