// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! This module contains traits to facilitate EAR of values on the backend.
//! Any key used for EAR needs to implement the [`EarKey`] trait.

use aes_gcm::aead::{Aead as AesGcmAead, Key, KeyInit, Nonce};
use thiserror::Error;
use tracing::instrument;

use crate::crypto::{random_bytes, RandomnessError};

use super::{Aead, Ciphertext, AEAD_KEY_SIZE, AEAD_NONCE_SIZE};

/// Errors that can occur during an encryption operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    /// Not enough randomness to generate a nonce
    #[error("Not enough randomness to generate a nonce")]
    RandomnessError,
    /// Error encrypting the plaintext
    #[error("Encryption failed")]
    LibraryError,
}

impl From<RandomnessError> for EncryptionError {
    fn from(_: RandomnessError) -> Self {
        Self::RandomnessError
    }
}

/// Errors that can occur during a decryption operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("Ciphertext is not valid Base64")]
    NotBase64,
    #[error("Unsupported crypto payload version: {0}")]
    UnsupportedVersion(u8),
    #[error("Ciphertext is truncated")]
    Truncated,
    /// Authentication of the ciphertext failed.
    #[error("Decryption failed")]
    DecryptionError,
    #[error("Plaintext is not valid UTF-8")]
    NotUtf8,
}

/// A trait meant for structs holding a symmetric key of size [`AEAD_KEY_SIZE`].
/// It enables use of these keys for encryption and decryption operations.
pub trait EarKey {
    fn secret(&self) -> &[u8; AEAD_KEY_SIZE];

    // Encrypt the given plaintext under the given key. Generates a random nonce internally.
    #[instrument(level = "trace", skip_all, fields(key_type = std::any::type_name::<Self>()))]
    fn encrypt(&self, plaintext: &[u8]) -> Result<Ciphertext, EncryptionError> {
        let key = Key::<Aead>::from_slice(self.secret());
        let cipher = Aead::new(key);
        let nonce = random_bytes::<AEAD_NONCE_SIZE>()?;
        let ciphertext = cipher
            .encrypt(Nonce::<Aead>::from_slice(&nonce), plaintext)
            .map_err(|_| EncryptionError::LibraryError)?;
        Ok(Ciphertext { ciphertext, nonce })
    }

    // Decrypt the given ciphertext (including the nonce) using the given key.
    #[instrument(level = "trace", skip_all, fields(key_type = std::any::type_name::<Self>()))]
    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Vec<u8>, DecryptionError> {
        let key = Key::<Aead>::from_slice(self.secret());
        let cipher = Aead::new(key);
        cipher
            .decrypt(
                Nonce::<Aead>::from_slice(&ciphertext.nonce),
                ciphertext.ciphertext.as_slice(),
            )
            .map_err(|_| DecryptionError::DecryptionError)
    }
}
