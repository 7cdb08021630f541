// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use rptvtypes::{
    endpoint_paths::{ENDPOINT_ADMIN_INVITES, ENDPOINT_ADMIN_INVITES_REVOKE},
    messages::{CreateInviteParams, InviteCodeView, RevokeInviteParams, StatusResponse},
};

use crate::{json_response, ApiClient, ApiClientError};

impl ApiClient {
    pub async fn create_invite(
        &self,
        access_token: &str,
        params: &CreateInviteParams,
    ) -> Result<InviteCodeView, ApiClientError> {
        let response = self
            .post(ENDPOINT_ADMIN_INVITES)
            .bearer_auth(access_token)
            .query(params)
            .send()
            .await?;
        json_response(response).await
    }

    pub async fn list_invites(
        &self,
        access_token: &str,
    ) -> Result<Vec<InviteCodeView>, ApiClientError> {
        let response = self
            .get(ENDPOINT_ADMIN_INVITES)
            .bearer_auth(access_token)
            .send()
            .await?;
        json_response(response).await
    }

    pub async fn revoke_invite(
        &self,
        access_token: &str,
        code: &str,
    ) -> Result<StatusResponse, ApiClientError> {
        let response = self
            .post(ENDPOINT_ADMIN_INVITES_REVOKE)
            .bearer_auth(access_token)
            .query(&RevokeInviteParams {
                code: code.to_owned(),
            })
            .send()
            .await?;
        json_response(response).await
    }
}
