// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Account registration, login and the access/refresh token lifecycle.

use chrono::{DateTime, Utc};
use jsonwebtoken::EncodingKey;
use rptvtypes::{
    identifiers::{Email, Roles, UserId},
    messages::{LoginRequest, MeResponse, RefreshRequest, RegisterRequest, TokenPair},
    validation::ValidationError,
};
use tracing::{info, instrument, warn};

use crate::{
    crypto::{
        password::{hash_password, verify_password},
        tokens::{
            extract_token_id, matches, AccessClaims, AccessTokenIssuer, RefreshTokenFactory,
            TokenError,
        },
    },
    settings::JwtSettings,
};

use self::{
    errors::AuthError, refresh_token::RefreshTokenRecord,
    storage_provider_trait::AuthStorageProvider, user_record::UserRecord,
};

pub mod errors;
pub mod refresh_token;
pub mod storage_provider_trait;
pub mod user_record;

pub struct AuthService {
    access_tokens: AccessTokenIssuer,
    refresh_tokens: RefreshTokenFactory,
}

impl AuthService {
    /// Fails if a configured token lifetime is out of range.
    pub fn new(signing_key: EncodingKey, settings: &JwtSettings) -> Result<Self, TokenError> {
        Ok(Self {
            access_tokens: AccessTokenIssuer::new(
                signing_key,
                settings.issuer.clone(),
                settings.access_token_ttl,
            )?,
            refresh_tokens: RefreshTokenFactory::new(settings.refresh_token_ttl)?,
        })
    }

    /// Register a new user with role `USER`, consuming one use of the given
    /// invite code.
    #[instrument(skip_all)]
    pub async fn register<Asp: AuthStorageProvider>(
        &self,
        storage_provider: &Asp,
        request: &RegisterRequest,
    ) -> Result<TokenPair, AuthError> {
        let registration = request.validate()?;
        let password_hash = hash_password(&registration.password).map_err(|error| {
            warn!(%error, "Failed to hash password");
            AuthError::LibraryError
        })?;
        let now = Utc::now();
        let user = UserRecord::new(registration.email, password_hash, Roles::user(), now);
        storage_provider
            .create_user_with_invite(&registration.invite_code, now, &user)
            .await?;
        info!(user_id = %user.id, "Registered new user");
        self.issue_token_pair(storage_provider, &user, now).await
    }

    #[instrument(skip_all)]
    pub async fn login<Asp: AuthStorageProvider>(
        &self,
        storage_provider: &Asp,
        request: &LoginRequest,
    ) -> Result<TokenPair, AuthError> {
        let login = request.validate()?;
        let user = storage_provider
            .load_user_by_email(&login.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&login.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        self.issue_token_pair(storage_provider, &user, Utc::now())
            .await
    }

    /// Exchange a refresh token for a new token pair. The presented token is
    /// revoked, so each refresh token can be used once.
    #[instrument(skip_all)]
    pub async fn refresh<Asp: AuthStorageProvider>(
        &self,
        storage_provider: &Asp,
        request: &RefreshRequest,
    ) -> Result<TokenPair, AuthError> {
        let presented = request.validate()?;
        let token_id = extract_token_id(presented).map_err(|_| AuthError::InvalidRefreshToken)?;
        let record = storage_provider
            .load_refresh_token(token_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if record.revoked {
            return Err(AuthError::RefreshTokenRevoked);
        }
        if !matches(presented, &record.token_hash) {
            return Err(AuthError::InvalidRefreshToken);
        }
        let now = Utc::now();
        if record.is_expired(now) {
            return Err(AuthError::RefreshTokenExpired);
        }
        // A concurrent refresh with the same token may have won.
        if !storage_provider.revoke_refresh_token(record.id).await? {
            return Err(AuthError::RefreshTokenRevoked);
        }
        let user = storage_provider
            .load_user(record.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        self.issue_token_pair(storage_provider, &user, now).await
    }

    /// Revoke the presented refresh token if it is valid. Unknown or
    /// malformed tokens are ignored.
    #[instrument(skip_all)]
    pub async fn logout<Asp: AuthStorageProvider>(
        &self,
        storage_provider: &Asp,
        request: &RefreshRequest,
    ) -> Result<(), AuthError> {
        let presented = request.refresh_token.trim();
        let Ok(token_id) = extract_token_id(presented) else {
            return Ok(());
        };
        let Some(record) = storage_provider.load_refresh_token(token_id).await? else {
            return Ok(());
        };
        if matches(presented, &record.token_hash) {
            storage_provider.revoke_refresh_token(record.id).await?;
        }
        Ok(())
    }

    /// Revoke every refresh token of the user.
    #[instrument(skip(self, storage_provider))]
    pub async fn logout_all<Asp: AuthStorageProvider>(
        &self,
        storage_provider: &Asp,
        user_id: UserId,
    ) -> Result<(), AuthError> {
        let revoked = storage_provider.revoke_all_refresh_tokens(user_id).await?;
        info!(revoked, "Revoked all refresh tokens");
        Ok(())
    }

    pub fn me(claims: &AccessClaims) -> MeResponse {
        MeResponse {
            sub: claims.sub,
            email: claims.email.clone(),
            roles: claims.roles.clone(),
        }
    }

    /// Load the user an access token was issued to.
    pub async fn current_user<Asp: AuthStorageProvider>(
        storage_provider: &Asp,
        claims: &AccessClaims,
    ) -> Result<UserRecord, AuthError> {
        storage_provider
            .load_user(claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)
    }

    /// Create a user directly, without an invite.
    #[instrument(skip(storage_provider, password))]
    pub async fn register_user<Asp: AuthStorageProvider>(
        storage_provider: &Asp,
        email: &Email,
        password: &str,
        roles: Roles,
    ) -> Result<UserRecord, AuthError> {
        let password_hash = hash_password(password).map_err(|error| {
            warn!(%error, "Failed to hash password");
            AuthError::LibraryError
        })?;
        let user = UserRecord::new(email.clone(), password_hash, roles, Utc::now());
        storage_provider.create_user(&user).await?;
        Ok(user)
    }

    /// Create an account with roles `USER,ADMIN` unless a user with the email
    /// exists already. Returns whether an account was created.
    #[instrument(skip(storage_provider, password))]
    pub async fn ensure_admin<Asp: AuthStorageProvider>(
        storage_provider: &Asp,
        email: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        let email: Email = email.parse().map_err(|e: rptvtypes::identifiers::EmailError| {
            ValidationError {
                field: "email",
                reason: e.to_string(),
            }
        })?;
        if storage_provider.load_user_by_email(&email).await?.is_some() {
            return Ok(false);
        }
        match Self::register_user(storage_provider, &email, password, Roles::admin()).await {
            Ok(_) => {
                info!(%email, "Created admin account");
                Ok(true)
            }
            // Another instance created it in the meantime.
            Err(AuthError::EmailTaken) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn issue_token_pair<Asp: AuthStorageProvider>(
        &self,
        storage_provider: &Asp,
        user: &UserRecord,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let access_token = self
            .access_tokens
            .issue_at(user.id, &user.email, &user.roles, now)
            .map_err(|error| {
                warn!(%error, "Failed to issue access token");
                AuthError::LibraryError
            })?;
        let refresh_token = self.refresh_tokens.generate(now).map_err(|error| {
            warn!(%error, "Failed to generate refresh token");
            AuthError::LibraryError
        })?;
        storage_provider
            .store_refresh_token(&RefreshTokenRecord::new(user.id, &refresh_token))
            .await?;
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.token,
        })
    }
}
