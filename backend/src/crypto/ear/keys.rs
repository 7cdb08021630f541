// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The master key used for EAR of upstream credentials.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretBox};
use thiserror::Error;

use crate::crypto::{random_bytes, RandomnessError};

use super::{traits::EarKey, AEAD_KEY_SIZE};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MasterKeyError {
    #[error("Missing encryption master key (Base64-encoded 256-bit key)")]
    Missing,
    #[error("Encryption master key is not valid Base64")]
    NotBase64,
    #[error("Encryption master key must be 32 bytes when Base64-decoded, got {0}")]
    WrongLength(usize),
}

/// Key to encrypt/decrypt the credentials of Xtream accounts.
pub struct CredentialEarKey {
    key: SecretBox<[u8; AEAD_KEY_SIZE]>,
}

impl CredentialEarKey {
    /// Decode the key from its Base64 representation.
    pub fn from_base64(encoded: &str) -> Result<Self, MasterKeyError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(MasterKeyError::Missing);
        }
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| MasterKeyError::NotBase64)?;
        let key: [u8; AEAD_KEY_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| MasterKeyError::WrongLength(bytes.len()))?;
        Ok(Self {
            key: SecretBox::new(Box::new(key)),
        })
    }

    /// Generate a fresh random key.
    pub fn random() -> Result<Self, RandomnessError> {
        Ok(Self {
            key: SecretBox::new(Box::new(random_bytes::<AEAD_KEY_SIZE>()?)),
        })
    }

    /// Base64 representation, suitable for the `encryption.master_key`
    /// setting.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key.expose_secret())
    }
}

impl EarKey for CredentialEarKey {
    fn secret(&self) -> &[u8; AEAD_KEY_SIZE] {
        self.key.expose_secret()
    }
}

// Ensures that keys are not printed in debug outputs.
impl std::fmt::Debug for CredentialEarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEarKey: [[REDACTED]]").finish()
    }
}
