// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Loading of the RS256 key pair used to sign and verify access tokens.

use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("Missing jwt.{0} for JWT signing and validation")]
    MissingPath(&'static str),
    #[error("Failed to read RSA key from path: {path}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load RSA key from path: {path}")]
    Invalid {
        path: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

fn read_pem(setting: &'static str, path: &str) -> Result<Vec<u8>, KeyLoadError> {
    if path.trim().is_empty() {
        return Err(KeyLoadError::MissingPath(setting));
    }
    std::fs::read(Path::new(path)).map_err(|source| KeyLoadError::Unreadable {
        path: path.to_owned(),
        source,
    })
}

/// Load the public key (SPKI or PKCS#1 PEM) used to verify access tokens.
pub fn load_decoding_key(path: &str) -> Result<DecodingKey, KeyLoadError> {
    let pem = read_pem("public_key_path", path)?;
    DecodingKey::from_rsa_pem(&pem).map_err(|source| KeyLoadError::Invalid {
        path: path.to_owned(),
        source,
    })
}

/// Load the private key (PKCS#8 or PKCS#1 PEM) used to sign access tokens.
pub fn load_encoding_key(path: &str) -> Result<EncodingKey, KeyLoadError> {
    let pem = read_pem("private_key_path", path)?;
    EncodingKey::from_rsa_pem(&pem).map_err(|source| KeyLoadError::Invalid {
        path: path.to_owned(),
        source,
    })
}
