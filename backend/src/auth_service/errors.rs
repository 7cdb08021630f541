// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use rptvtypes::validation::ValidationError;
use thiserror::Error;

use crate::errors::StorageError;

/// Error creating a user without an invite.
#[derive(Error, Debug)]
pub enum CreateUserError {
    /// A user with that email already exists.
    #[error("Email already registered")]
    EmailTaken,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why an invite code can't be consumed right now.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum InviteUnusable {
    #[error("Invite code expired")]
    Expired,
    #[error("Invite code already used up")]
    UsedUp,
}

/// Error of the compound "consume invite and create user" operation. Nothing
/// is persisted if this is returned.
#[derive(Error, Debug)]
pub enum RegisterUserError {
    #[error("Invalid invite code")]
    InviteNotFound,
    #[error(transparent)]
    InviteUnusable(#[from] InviteUnusable),
    #[error("Email already registered")]
    EmailTaken,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CreateUserError> for RegisterUserError {
    fn from(e: CreateUserError) -> Self {
        match e {
            CreateUserError::EmailTaken => Self::EmailTaken,
            CreateUserError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Error creating an invite code.
#[derive(Error, Debug)]
pub enum CreateInviteError {
    #[error("Invite code already exists")]
    DuplicateCode,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors of the account operations of the [`super::AuthService`].
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid invite code")]
    InvalidInviteCode,
    #[error("Invite code expired")]
    InviteExpired,
    #[error("Invite code already used up")]
    InviteUsedUp,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token revoked")]
    RefreshTokenRevoked,
    #[error("Refresh token expired")]
    RefreshTokenExpired,
    /// The subject of an otherwise valid access token no longer exists.
    #[error("Unknown user")]
    UnknownUser,
    /// Storage provider error
    #[error("Storage provider error")]
    StorageError,
    /// Hashing, signing or randomness failure
    #[error("Library error")]
    LibraryError,
}

impl From<RegisterUserError> for AuthError {
    fn from(e: RegisterUserError) -> Self {
        match e {
            RegisterUserError::InviteNotFound => Self::InvalidInviteCode,
            RegisterUserError::InviteUnusable(InviteUnusable::Expired) => Self::InviteExpired,
            RegisterUserError::InviteUnusable(InviteUnusable::UsedUp) => Self::InviteUsedUp,
            RegisterUserError::EmailTaken => Self::EmailTaken,
            RegisterUserError::Storage(e) => e.into(),
        }
    }
}

impl From<CreateUserError> for AuthError {
    fn from(e: CreateUserError) -> Self {
        match e {
            CreateUserError::EmailTaken => Self::EmailTaken,
            CreateUserError::Storage(e) => e.into(),
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        tracing::error!(error = %e, "Storage provider error");
        Self::StorageError
    }
}
