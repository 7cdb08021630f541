// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use reqwest::Client;
use rptvbackend::{
    settings::UpstreamSettings,
    xtream::upstream_provider_trait::{UpstreamError, UpstreamProvider, UpstreamResponse},
};
use url::Url;

/// Calls Xtream providers over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpUpstreamProvider {
    client: Client,
}

impl HttpUpstreamProvider {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.response_timeout())
            .pool_max_idle_per_host(settings.max_idle_connections)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

fn upstream_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout(e.to_string())
    } else if e.is_connect() {
        UpstreamError::Connect(e.to_string())
    } else {
        UpstreamError::Request(e.to_string())
    }
}

#[async_trait]
impl UpstreamProvider for HttpUpstreamProvider {
    async fn get(&self, url: Url) -> Result<UpstreamResponse, UpstreamError> {
        // The URL carries credentials, only the host is logged.
        tracing::debug!(host = url.host_str().unwrap_or_default(), "Calling upstream");
        let response = self.client.get(url).send().await.map_err(upstream_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(upstream_error)?;
        Ok(UpstreamResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn provider(response_timeout_ms: u64) -> HttpUpstreamProvider {
        HttpUpstreamProvider::new(&UpstreamSettings {
            response_timeout_ms,
            ..Default::default()
        })
        .unwrap()
    }

    #[actix_rt::test]
    async fn returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/player_api.php"))
            .and(query_param("username", "u"))
            .respond_with(ResponseTemplate::new(403).set_body_string("nope"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/player_api.php?username=u", server.uri())).unwrap();
        let response = provider(15_000).get(url).await.unwrap();
        assert_eq!(response.status, 403);
        assert_eq!(response.body, b"nope");
    }

    #[actix_rt::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let error = provider(50).get(url).await.unwrap_err();
        assert_eq!(error.kind(), "Timeout");
    }

    #[actix_rt::test]
    async fn refused_connection() {
        // Nothing listens on the discard port.
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let error = provider(1_000).get(url).await.unwrap_err();
        assert_eq!(error.kind(), "ConnectError");
    }
}
