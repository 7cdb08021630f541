// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! This module and its submodules contain structs and types to facilitate
//! encryption at rest (EAR) of upstream credentials on the backend.
//!
//! Encrypted values are stored as Base64 of
//! `[version: 1 byte][nonce: 12 bytes][ciphertext || tag]`.

pub mod keys;
mod traits;

use aes_gcm::Aes256Gcm;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::instrument;

pub use keys::{CredentialEarKey, MasterKeyError};
pub use traits::{DecryptionError, EarKey, EncryptionError};

/// This type determines the AEAD scheme used for encryption at rest (EAR) by
/// the backend.
pub type Aead = Aes256Gcm;
/// Key size of the above AEAD scheme
const AEAD_KEY_SIZE: usize = 32;
const AEAD_NONCE_SIZE: usize = 12;
const AEAD_TAG_SIZE: usize = 16;

/// Version byte of the serialized payload.
const PAYLOAD_VERSION: u8 = 1;

// Convenience struct that allows us to keep ciphertext and nonce together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    ciphertext: Vec<u8>,
    nonce: [u8; AEAD_NONCE_SIZE],
}

impl Ciphertext {
    /// Serialize into the versioned, Base64-encoded storage format.
    pub fn to_payload(&self) -> String {
        let mut packed = Vec::with_capacity(1 + AEAD_NONCE_SIZE + self.ciphertext.len());
        packed.push(PAYLOAD_VERSION);
        packed.extend_from_slice(&self.nonce);
        packed.extend_from_slice(&self.ciphertext);
        STANDARD.encode(packed)
    }

    /// Parse the versioned, Base64-encoded storage format.
    pub fn from_payload(payload: &str) -> Result<Self, DecryptionError> {
        let packed = STANDARD
            .decode(payload)
            .map_err(|_| DecryptionError::NotBase64)?;
        let (&version, rest) = packed.split_first().ok_or(DecryptionError::Truncated)?;
        if version != PAYLOAD_VERSION {
            return Err(DecryptionError::UnsupportedVersion(version));
        }
        if rest.len() < AEAD_NONCE_SIZE + AEAD_TAG_SIZE {
            return Err(DecryptionError::Truncated);
        }
        let (nonce, ciphertext) = rest.split_at(AEAD_NONCE_SIZE);
        let nonce = nonce.try_into().map_err(|_| DecryptionError::Truncated)?;
        Ok(Self {
            ciphertext: ciphertext.to_vec(),
            nonce,
        })
    }
}

/// Encrypts and decrypts string values under the configured master key.
#[derive(Debug)]
pub struct CredentialCipher {
    key: CredentialEarKey,
}

impl CredentialCipher {
    pub fn new(key: CredentialEarKey) -> Self {
        Self { key }
    }

    /// Build a cipher from a Base64-encoded master key.
    pub fn from_base64(master_key: &str) -> Result<Self, MasterKeyError> {
        Ok(Self::new(CredentialEarKey::from_base64(master_key)?))
    }

    /// Generate a fresh random master key in its Base64 representation.
    pub fn generate_key_b64() -> Result<String, EncryptionError> {
        Ok(CredentialEarKey::random()?.to_base64())
    }

    #[instrument(level = "trace", skip_all)]
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let ciphertext = self.key.encrypt(plaintext.as_bytes())?;
        Ok(ciphertext.to_payload())
    }

    #[instrument(level = "trace", skip_all)]
    pub fn decrypt(&self, payload: &str) -> Result<String, DecryptionError> {
        let ciphertext = Ciphertext::from_payload(payload)?;
        let plaintext = self.key.decrypt(&ciphertext)?;
        String::from_utf8(plaintext).map_err(|_| DecryptionError::NotUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_key_cipher() -> CredentialCipher {
        CredentialCipher::from_base64(&STANDARD.encode([0u8; 32])).unwrap()
    }

    #[test]
    fn encrypt_decrypt() {
        let cipher = zero_key_cipher();
        let payload = cipher.encrypt("alice").unwrap();
        assert_ne!(payload, "alice");
        assert_eq!(cipher.decrypt(&payload).unwrap(), "alice");

        let packed = STANDARD.decode(&payload).unwrap();
        assert_eq!(packed[0], PAYLOAD_VERSION);
        assert_eq!(packed.len(), 1 + AEAD_NONCE_SIZE + "alice".len() + AEAD_TAG_SIZE);
    }

    #[test]
    fn nonces_are_fresh() {
        let cipher = zero_key_cipher();
        assert_ne!(cipher.encrypt("secret").unwrap(), cipher.encrypt("secret").unwrap());
    }

    #[test]
    fn empty_plaintext() {
        let cipher = zero_key_cipher();
        let payload = cipher.encrypt("").unwrap();
        assert_eq!(cipher.decrypt(&payload).unwrap(), "");
    }

    #[test]
    fn tampering_is_detected() {
        let cipher = zero_key_cipher();
        let payload = cipher.encrypt("secret").unwrap();
        let mut packed = STANDARD.decode(&payload).unwrap();
        let last = packed.len() - 1;
        packed[last] ^= 0x01;
        assert_eq!(
            cipher.decrypt(&STANDARD.encode(&packed)),
            Err(DecryptionError::DecryptionError)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let payload = zero_key_cipher().encrypt("secret").unwrap();
        let other = CredentialCipher::from_base64(&CredentialCipher::generate_key_b64().unwrap())
            .unwrap();
        assert_eq!(other.decrypt(&payload), Err(DecryptionError::DecryptionError));
    }

    #[test]
    fn malformed_payloads() {
        let cipher = zero_key_cipher();
        assert_eq!(cipher.decrypt("not base64!"), Err(DecryptionError::NotBase64));
        assert_eq!(cipher.decrypt(""), Err(DecryptionError::Truncated));

        let mut packed = STANDARD.decode(cipher.encrypt("secret").unwrap()).unwrap();
        packed[0] = 2;
        assert_eq!(
            cipher.decrypt(&STANDARD.encode(&packed)),
            Err(DecryptionError::UnsupportedVersion(2))
        );
        assert_eq!(
            DecryptionError::UnsupportedVersion(2).to_string(),
            "Unsupported crypto payload version: 2"
        );

        let short = STANDARD.encode([PAYLOAD_VERSION; 20]);
        assert_eq!(cipher.decrypt(&short), Err(DecryptionError::Truncated));
    }

    #[test]
    fn master_key_validation() {
        assert_eq!(
            CredentialCipher::from_base64("  ").unwrap_err(),
            MasterKeyError::Missing
        );
        assert_eq!(
            CredentialCipher::from_base64("%%%").unwrap_err(),
            MasterKeyError::NotBase64
        );
        assert_eq!(
            CredentialCipher::from_base64(&STANDARD.encode([1u8; 16])).unwrap_err(),
            MasterKeyError::WrongLength(16)
        );
    }

    #[test]
    fn generated_keys_round_trip_through_base64() {
        let encoded = CredentialCipher::generate_key_b64().unwrap();
        assert_eq!(STANDARD.decode(&encoded).unwrap().len(), AEAD_KEY_SIZE);
        let key = CredentialEarKey::from_base64(&encoded).unwrap();
        assert_eq!(key.to_base64(), encoded);
    }
}
