// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// A response of an upstream provider, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// No response was received from the upstream provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Connect(String),
    #[error("{0}")]
    Request(String),
}

impl UpstreamError {
    /// Short name of the failure, reported as `error` of a probe.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "Timeout",
            Self::Connect(_) => "ConnectError",
            Self::Request(_) => "RequestError",
        }
    }
}

#[async_trait]
pub trait UpstreamProvider: Sync + Send + Debug + 'static {
    async fn get(&self, url: Url) -> Result<UpstreamResponse, UpstreamError>;
}
