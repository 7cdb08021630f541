// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Invite codes gate registration. Admins create, list and revoke them.

use chrono::{DateTime, Utc};
use rptvtypes::{
    messages::{CreateInviteParams, InviteCodeView},
    validation::ValidationError,
};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth_service::{
        errors::{CreateInviteError, InviteUnusable},
        storage_provider_trait::AuthStorageProvider,
    },
    errors::StorageError,
};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InviteCodeRecord {
    pub id: Uuid,
    pub code: String,
    pub max_uses: i32,
    pub uses: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InviteCodeRecord {
    pub fn new(
        code: String,
        max_uses: i32,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            max_uses,
            uses: 0,
            expires_at,
            created_at: now,
        }
    }

    /// Expiry is checked before the use count. An invite is still valid at
    /// the exact instant it expires.
    pub fn check_consumable(&self, now: DateTime<Utc>) -> Result<(), InviteUnusable> {
        if self.expires_at.is_some_and(|expires_at| expires_at < now) {
            return Err(InviteUnusable::Expired);
        }
        if self.uses >= self.max_uses {
            return Err(InviteUnusable::UsedUp);
        }
        Ok(())
    }

    pub fn revoke(&mut self) {
        self.max_uses = self.uses;
    }
}

impl From<InviteCodeRecord> for InviteCodeView {
    fn from(record: InviteCodeRecord) -> Self {
        Self {
            id: record.id,
            code: record.code,
            max_uses: record.max_uses,
            uses: record.uses,
            expires_at: record.expires_at,
            created_at: record.created_at,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum InviteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invite code already exists")]
    DuplicateCode,
    #[error("Invite not found")]
    NotFound,
    /// Storage provider error
    #[error("Storage provider error")]
    StorageError,
}

impl From<StorageError> for InviteError {
    fn from(e: StorageError) -> Self {
        tracing::error!(error = %e, "Storage provider error");
        Self::StorageError
    }
}

impl From<CreateInviteError> for InviteError {
    fn from(e: CreateInviteError) -> Self {
        match e {
            CreateInviteError::DuplicateCode => Self::DuplicateCode,
            CreateInviteError::Storage(e) => e.into(),
        }
    }
}

/// A fresh invite code: a v4 UUID without hyphens.
pub fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()
}

pub struct InviteService {}

impl InviteService {
    #[instrument(skip(storage_provider))]
    pub async fn create<Asp: AuthStorageProvider>(
        storage_provider: &Asp,
        params: &CreateInviteParams,
    ) -> Result<InviteCodeView, InviteError> {
        let invite = params.validate()?;
        let code = invite.code.unwrap_or_else(generate_code);
        let record = InviteCodeRecord::new(code, invite.max_uses, invite.expires_at, Utc::now());
        storage_provider.create_invite(&record).await?;
        info!(invite_id = %record.id, "Created invite code");
        Ok(record.into())
    }

    pub async fn list<Asp: AuthStorageProvider>(
        storage_provider: &Asp,
    ) -> Result<Vec<InviteCodeView>, InviteError> {
        let invites = storage_provider.list_invites().await?;
        Ok(invites.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(storage_provider))]
    pub async fn revoke<Asp: AuthStorageProvider>(
        storage_provider: &Asp,
        code: &str,
    ) -> Result<InviteCodeView, InviteError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError {
                field: "code",
                reason: "must not be blank".to_owned(),
            }
            .into());
        }
        storage_provider
            .revoke_invite(code)
            .await?
            .map(Into::into)
            .ok_or(InviteError::NotFound)
    }
}
