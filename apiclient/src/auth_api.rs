// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use rptvtypes::{
    endpoint_paths::{
        ENDPOINT_AUTH_LOGIN, ENDPOINT_AUTH_LOGOUT, ENDPOINT_AUTH_LOGOUT_ALL, ENDPOINT_AUTH_ME,
        ENDPOINT_AUTH_REFRESH, ENDPOINT_AUTH_REGISTER,
    },
    messages::{LoginRequest, MeResponse, RefreshRequest, RegisterRequest, TokenPair},
};

use crate::{empty_response, json_response, ApiClient, ApiClientError};

impl ApiClient {
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        invite_code: &str,
    ) -> Result<TokenPair, ApiClientError> {
        let request = RegisterRequest {
            email: email.to_owned(),
            password: password.to_owned(),
            invite_code: invite_code.to_owned(),
        };
        let response = self.post(ENDPOINT_AUTH_REGISTER).json(&request).send().await?;
        json_response(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiClientError> {
        let request = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let response = self.post(ENDPOINT_AUTH_LOGIN).json(&request).send().await?;
        json_response(response).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiClientError> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_owned(),
        };
        let response = self.post(ENDPOINT_AUTH_REFRESH).json(&request).send().await?;
        json_response(response).await
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<(), ApiClientError> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_owned(),
        };
        let response = self.post(ENDPOINT_AUTH_LOGOUT).json(&request).send().await?;
        empty_response(response).await
    }

    pub async fn logout_all(&self, access_token: &str) -> Result<(), ApiClientError> {
        let response = self
            .post(ENDPOINT_AUTH_LOGOUT_ALL)
            .bearer_auth(access_token)
            .send()
            .await?;
        empty_response(response).await
    }

    pub async fn me(&self, access_token: &str) -> Result<MeResponse, ApiClientError> {
        let response = self
            .get(ENDPOINT_AUTH_ME)
            .bearer_auth(access_token)
            .send()
            .await?;
        json_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    #[tokio::test]
    async fn login_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_AUTH_LOGIN))
            .and(body_json(
                serde_json::json!({"email": "a@b.cd", "password": "secret"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"accessToken": "access", "refreshToken": "id.secret"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::initialize(server.uri()).unwrap();
        let tokens = client.login("a@b.cd", "secret").await.unwrap();
        assert_eq!(tokens.access_token, "access");
        assert_eq!(tokens.refresh_token, "id.secret");
    }

    #[tokio::test]
    async fn bearer_token_and_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT_AUTH_ME))
            .and(header("authorization", "Bearer expired"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": 401,
                "error": "Unauthorized",
                "message": "Invalid access token",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::initialize(server.uri()).unwrap();
        let err = client.me("expired").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.error_body().unwrap().message, "Invalid access token");
    }
}
