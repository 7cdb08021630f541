// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Validation of incoming requests. Each request type validates into a typed
//! counterpart that the backend works with.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::{
    identifiers::Email,
    messages::{
        CreateInviteParams, CreateXtreamAccount, LoginRequest, RefreshRequest, RegisterRequest,
        UpdateXtreamAccount,
    },
};

pub const PASSWORD_LENGTH: RangeInclusive<usize> = 8..=128;
pub const INVITE_MAX_USES: RangeInclusive<i32> = 1..=1000;
pub const MAX_INVITE_CODE_LENGTH: usize = 64;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 120;
pub const MAX_API_URL_LENGTH: usize = 512;
/// Upper bound in bytes for Xtream usernames and passwords, so that their
/// encrypted form fits the storage column.
pub const MAX_CREDENTIAL_LENGTH: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

fn not_blank<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(trimmed)
}

/// Credentials are stored as given. Only blankness is judged on the trimmed
/// value.
fn credential(field: &'static str, value: &str) -> Result<String, ValidationError> {
    not_blank(field, value)?;
    if value.len() > MAX_CREDENTIAL_LENGTH {
        return Err(ValidationError::new(
            field,
            format!("must not be longer than {MAX_CREDENTIAL_LENGTH} bytes"),
        ));
    }
    Ok(value.to_owned())
}

fn max_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must not be longer than {max} characters"),
        ));
    }
    Ok(())
}

fn email(value: &str) -> Result<Email, ValidationError> {
    value
        .parse()
        .map_err(|e: crate::identifiers::EmailError| ValidationError::new("email", e.to_string()))
}

fn api_url(value: &str) -> Result<String, ValidationError> {
    let value = not_blank("apiUrl", value)?;
    max_length("apiUrl", value, MAX_API_URL_LENGTH)?;
    let url = Url::parse(value)
        .map_err(|e| ValidationError::new("apiUrl", format!("is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ValidationError::new(
            "apiUrl",
            "must be an absolute http or https URL",
        ));
    }
    Ok(value.to_owned())
}

fn account_name(value: &str) -> Result<String, ValidationError> {
    let value = not_blank("name", value)?;
    max_length("name", value, MAX_ACCOUNT_NAME_LENGTH)?;
    Ok(value.to_owned())
}

#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub email: Email,
    pub password: String,
    pub invite_code: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<ValidatedRegistration, ValidationError> {
        let email = email(&self.email)?;
        not_blank("password", &self.password)?;
        let length = self.password.chars().count();
        if !PASSWORD_LENGTH.contains(&length) {
            return Err(ValidationError::new(
                "password",
                format!(
                    "length must be between {} and {}",
                    PASSWORD_LENGTH.start(),
                    PASSWORD_LENGTH.end()
                ),
            ));
        }
        let invite_code = not_blank("inviteCode", &self.invite_code)?.to_owned();
        Ok(ValidatedRegistration {
            email,
            password: self.password.clone(),
            invite_code,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedLogin {
    pub email: Email,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<ValidatedLogin, ValidationError> {
        let email = email(&self.email)?;
        not_blank("password", &self.password)?;
        Ok(ValidatedLogin {
            email,
            password: self.password.clone(),
        })
    }
}

impl RefreshRequest {
    pub fn validate(&self) -> Result<&str, ValidationError> {
        not_blank("refreshToken", &self.refresh_token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInvite {
    pub max_uses: i32,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` when the server should generate a code.
    pub code: Option<String>,
}

impl CreateInviteParams {
    pub fn validate(&self) -> Result<ValidatedInvite, ValidationError> {
        if !INVITE_MAX_USES.contains(&self.max_uses) {
            return Err(ValidationError::new(
                "maxUses",
                format!(
                    "must be between {} and {}",
                    INVITE_MAX_USES.start(),
                    INVITE_MAX_USES.end()
                ),
            ));
        }
        let expires_at = match self.expires_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| {
                        ValidationError::new("expiresAt", format!("is not an RFC 3339 date: {e}"))
                    })?
                    .with_timezone(&Utc),
            ),
        };
        let code = match self.code.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => {
                max_length("code", code, MAX_INVITE_CODE_LENGTH)?;
                Some(code.to_owned())
            }
        };
        Ok(ValidatedInvite {
            max_uses: self.max_uses,
            expires_at,
            code,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedXtreamAccount {
    pub name: String,
    pub api_url: String,
    pub username: String,
    pub password: String,
}

impl CreateXtreamAccount {
    pub fn validate(&self) -> Result<ValidatedXtreamAccount, ValidationError> {
        Ok(ValidatedXtreamAccount {
            name: account_name(&self.name)?,
            api_url: api_url(&self.api_url)?,
            username: credential("username", &self.username)?,
            password: credential("password", &self.password)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidatedXtreamUpdate {
    pub name: Option<String>,
    pub api_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl UpdateXtreamAccount {
    pub fn validate(&self) -> Result<ValidatedXtreamUpdate, ValidationError> {
        Ok(ValidatedXtreamUpdate {
            name: self.name.as_deref().map(account_name).transpose()?,
            api_url: self.api_url.as_deref().map(api_url).transpose()?,
            username: self
                .username
                .as_deref()
                .map(|u| credential("username", u))
                .transpose()?,
            password: self
                .password
                .as_deref()
                .map(|p| credential("password", p))
                .transpose()?,
        })
    }
}
