// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use rptvtypes::{
    endpoint_paths::ENDPOINT_XTREAM,
    messages::{
        CreateXtreamAccount, ProbeResult, StatusResponse, UpdateXtreamAccount, XtreamAccountView,
    },
};
use uuid::Uuid;

use crate::{json_response, ApiClient, ApiClientError};

fn account_endpoint(id: Uuid) -> String {
    format!("{ENDPOINT_XTREAM}/{id}")
}

impl ApiClient {
    pub async fn list_xtream_accounts(
        &self,
        access_token: &str,
    ) -> Result<Vec<XtreamAccountView>, ApiClientError> {
        let response = self
            .get(ENDPOINT_XTREAM)
            .bearer_auth(access_token)
            .send()
            .await?;
        json_response(response).await
    }

    pub async fn create_xtream_account(
        &self,
        access_token: &str,
        account: &CreateXtreamAccount,
    ) -> Result<XtreamAccountView, ApiClientError> {
        let response = self
            .post(ENDPOINT_XTREAM)
            .bearer_auth(access_token)
            .json(account)
            .send()
            .await?;
        json_response(response).await
    }

    pub async fn update_xtream_account(
        &self,
        access_token: &str,
        id: Uuid,
        update: &UpdateXtreamAccount,
    ) -> Result<XtreamAccountView, ApiClientError> {
        let response = self
            .put(&account_endpoint(id))
            .bearer_auth(access_token)
            .json(update)
            .send()
            .await?;
        json_response(response).await
    }

    pub async fn delete_xtream_account(
        &self,
        access_token: &str,
        id: Uuid,
    ) -> Result<StatusResponse, ApiClientError> {
        let response = self
            .delete(&account_endpoint(id))
            .bearer_auth(access_token)
            .send()
            .await?;
        json_response(response).await
    }

    /// Ask the server to probe the upstream provider of the account.
    pub async fn test_xtream_account(
        &self,
        access_token: &str,
        id: Uuid,
    ) -> Result<ProbeResult, ApiClientError> {
        let response = self
            .get(&format!("{}/test", account_endpoint(id)))
            .bearer_auth(access_token)
            .send()
            .await?;
        json_response(response).await
    }
}
