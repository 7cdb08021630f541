// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTTP client for the rptv REST API

use std::time::Duration;

use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use rptvtypes::{
    endpoint_paths::{ENDPOINT_HEALTH_CHECK, ENDPOINT_INFO, ENDPOINT_ROOT},
    messages::{AppInfo, AppStatus, ErrorBody, HealthStatus},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

pub mod admin_api;
pub mod auth_api;
pub mod xtream_api;

#[derive(Error, Debug)]
pub enum ApiClientInitError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error("Failed to parse URL {0}")]
    UrlParsingError(String),
}

#[derive(Error, Debug)]
pub enum ApiClientError {
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

impl ApiClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|status| status.as_u16()),
        }
    }

    /// The JSON error body of a non-2xx response, if it has one.
    pub fn error_body(&self) -> Option<ErrorBody> {
        match self {
            Self::Status { body, .. } => serde_json::from_str(body).ok(),
            Self::Network(_) => None,
        }
    }
}

pub type HttpClient = reqwest::Client;

// ApiClient is a wrapper around a reqwest client.
// It exposes a single function for each API endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: HttpClient,
    url: Url,
}

impl ApiClient {
    /// Creates a new HTTP client.
    pub fn new_http_client() -> reqwest::Result<Client> {
        ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(4))
            .user_agent("RptvClient/0.1")
            .build()
    }

    /// Creates a new API client that connects to the given base URL.
    ///
    /// # Arguments
    /// url - The base URL or hostname:port tuple of the server. Without a
    /// scheme, `http` is assumed.
    pub fn initialize(url: impl AsRef<str>) -> Result<Self, ApiClientInitError> {
        let url = url.as_ref();
        let url = if url.contains("://") {
            url.to_owned()
        } else {
            format!("http://{url}")
        };
        let url = Url::parse(&url).map_err(|_| ApiClientInitError::UrlParsingError(url.clone()))?;
        Ok(Self {
            client: Self::new_http_client()?,
            url,
        })
    }

    /// Builds a URL for a given endpoint.
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.url.as_str().trim_end_matches('/'), endpoint)
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.client.get(self.build_url(endpoint))
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client.post(self.build_url(endpoint))
    }

    fn put(&self, endpoint: &str) -> RequestBuilder {
        self.client.put(self.build_url(endpoint))
    }

    fn delete(&self, endpoint: &str) -> RequestBuilder {
        self.client.delete(self.build_url(endpoint))
    }

    pub async fn root(&self) -> Result<AppStatus, ApiClientError> {
        json_response(self.get(ENDPOINT_ROOT).send().await?).await
    }

    /// Call the health check endpoint
    pub async fn health_check(&self) -> Result<HealthStatus, ApiClientError> {
        json_response(self.get(ENDPOINT_HEALTH_CHECK).send().await?).await
    }

    pub async fn info(&self) -> Result<AppInfo, ApiClientError> {
        json_response(self.get(ENDPOINT_INFO).send().await?).await
    }
}

async fn check_status(response: Response) -> Result<Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "Request failed");
    Err(ApiClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiClientError> {
    Ok(check_status(response).await?.json().await?)
}

async fn empty_response(response: Response) -> Result<(), ApiClientError> {
    check_status(response).await?;
    Ok(())
}
