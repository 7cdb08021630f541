// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cryptographic building blocks of the backend: encryption at rest (EAR) of
//! upstream credentials, password hashing, and the issuing and verification
//! of access and refresh tokens.

use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

pub mod ear;
pub mod keys;
pub mod password;
pub mod tokens;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RandomnessError {
    #[error("Insufficient randomness")]
    InsufficientRandomness,
}

/// Fill a fresh array with bytes from the operating system's RNG.
pub(crate) fn random_bytes<const LENGTH: usize>() -> Result<[u8; LENGTH], RandomnessError> {
    let mut bytes = [0; LENGTH];
    OsRng
        .try_fill_bytes(bytes.as_mut_slice())
        .map_err(|_| RandomnessError::InsufficientRandomness)?;
    Ok(bytes)
}
