// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Storage provider keeping everything in process memory. Used by tests and
//! for running the server without a database.

use std::{collections::HashMap, sync::RwLock};

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
    xtream::{account_record::XtreamAccountRecord, storage_provider_trait::XtreamStorageProvider},
};
use rptvtypes::identifiers::{Email, UserId};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStorage {
    users: RwLock<HashMap<UserId, UserRecord>>,
    invites: RwLock<HashMap<String, InviteCodeRecord>>,
    // Indexed by the public token id.
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
    xtream_accounts: RwLock<HashMap<Uuid, XtreamAccountRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert_user(
    users: &mut HashMap<UserId, UserRecord>,
    user: &UserRecord,
) -> Result<(), CreateUserError> {
    if users.values().any(|existing| existing.email == user.email) {
        return Err(CreateUserError::EmailTaken);
    }
    users.insert(user.id, user.clone());
    Ok(())
}

#[async_trait]
impl AuthStorageProvider for MemoryStorage {
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn load_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StorageError> {
        let users = self.users.read().map_err(|_| StorageError::PoisonedLock)?;
        Ok(users.get(&user_id).cloned())
    }

    async fn load_user_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StorageError> {
        let users = self.users.read().map_err(|_| StorageError::PoisonedLock)?;
        Ok(users.values().find(|user| &user.email == email).cloned())
    }

    async fn create_user(&self, user: &UserRecord) -> Result<(), CreateUserError> {
        let mut users = self.users.write().map_err(|_| StorageError::PoisonedLock)?;
        insert_user(&mut users, user)
    }

    async fn create_user_with_invite(
        &self,
        code: &str,
        now: DateTime<Utc>,
        user: &UserRecord,
    ) -> Result<(), RegisterUserError> {
        // Both locks are held until the user is inserted. Lock order is
        // invites before users.
        let mut invites = self
            .invites
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        let invite = invites
            .get_mut(code)
            .ok_or(RegisterUserError::InviteNotFound)?;
        invite.check_consumable(now)?;
        let mut users = self.users.write().map_err(|_| StorageError::PoisonedLock)?;
        insert_user(&mut users, user)?;
        invite.uses += 1;
        Ok(())
    }

    async fn create_invite(&self, invite: &InviteCodeRecord) -> Result<(), CreateInviteError> {
        let mut invites = self
            .invites
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        if invites.contains_key(&invite.code) {
            return Err(CreateInviteError::DuplicateCode);
        }
        invites.insert(invite.code.clone(), invite.clone());
        Ok(())
    }

    async fn list_invites(&self) -> Result<Vec<InviteCodeRecord>, StorageError> {
        let invites = self.invites.read().map_err(|_| StorageError::PoisonedLock)?;
        let mut invites: Vec<_> = invites.values().cloned().collect();
        invites.sort_by_key(|invite| invite.created_at);
        Ok(invites)
    }

    async fn revoke_invite(&self, code: &str) -> Result<Option<InviteCodeRecord>, StorageError> {
        let mut invites = self
            .invites
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        Ok(invites.get_mut(code).map(|invite| {
            invite.revoke();
            invite.clone()
        }))
    }

    async fn store_refresh_token(&self, token: &RefreshTokenRecord) -> Result<(), StorageError> {
        let mut tokens = self
            .refresh_tokens
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        if tokens.contains_key(&token.token_id) {
            return Err(StorageError::UniqueViolation(
                "refresh_tokens_token_id_key".to_owned(),
            ));
        }
        tokens.insert(token.token_id.clone(), token.clone());
        Ok(())
    }

    async fn load_refresh_token(
        &self,
        token_id: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let tokens = self
            .refresh_tokens
            .read()
            .map_err(|_| StorageError::PoisonedLock)?;
        Ok(tokens.get(token_id).cloned())
    }

    async fn revoke_refresh_token(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut tokens = self
            .refresh_tokens
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        match tokens.values_mut().find(|token| token.id == id) {
            Some(token) if !token.revoked => {
                token.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_refresh_tokens(&self, user_id: UserId) -> Result<u64, StorageError> {
        let mut tokens = self
            .refresh_tokens
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        let mut revoked = 0;
        for token in tokens
            .values_mut()
            .filter(|token| token.user_id == user_id && !token.revoked)
        {
            token.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[async_trait]
impl XtreamStorageProvider for MemoryStorage {
    async fn list_accounts(
        &self,
        user_id: UserId,
    ) -> Result<Vec<XtreamAccountRecord>, StorageError> {
        let accounts = self
            .xtream_accounts
            .read()
            .map_err(|_| StorageError::PoisonedLock)?;
        let mut accounts: Vec<_> = accounts
            .values()
            .filter(|account| account.is_owned_by(user_id))
            .cloned()
            .collect();
        accounts.sort_by_key(|account| account.created_at);
        Ok(accounts)
    }

    async fn load_account(&self, id: Uuid) -> Result<Option<XtreamAccountRecord>, StorageError> {
        let accounts = self
            .xtream_accounts
            .read()
            .map_err(|_| StorageError::PoisonedLock)?;
        Ok(accounts.get(&id).cloned())
    }

    async fn create_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError> {
        let mut accounts = self
            .xtream_accounts
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError> {
        let mut accounts = self
            .xtream_accounts
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        if let Some(existing) = accounts.get_mut(&account.id) {
            existing.name.clone_from(&account.name);
            existing.api_url.clone_from(&account.api_url);
            existing.username_enc.clone_from(&account.username_enc);
            existing.password_enc.clone_from(&account.password_enc);
            existing.updated_at = account.updated_at;
        }
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut accounts = self
            .xtream_accounts
            .write()
            .map_err(|_| StorageError::PoisonedLock)?;
        Ok(accounts.remove(&id).is_some())
    }
}
