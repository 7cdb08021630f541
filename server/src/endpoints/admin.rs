// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use actix_web::{
    web::{Data, Query},
    HttpResponse,
};
use rptvbackend::{auth_service::storage_provider_trait::AuthStorageProvider, invites::InviteService};
use rptvtypes::messages::{CreateInviteParams, RevokeInviteParams, StatusResponse};

use crate::{auth::AdminUser, errors::ApiError};

#[tracing::instrument(name = "Create invite", skip_all, fields(admin = %admin.0.sub))]
pub(crate) async fn create_invite<Asp: AuthStorageProvider>(
    admin: AdminUser,
    storage_provider: Data<Asp>,
    params: Query<CreateInviteParams>,
) -> Result<HttpResponse, ApiError> {
    let invite = InviteService::create(storage_provider.get_ref(), &params).await?;
    Ok(HttpResponse::Ok().json(invite))
}

pub(crate) async fn list_invites<Asp: AuthStorageProvider>(
    _admin: AdminUser,
    storage_provider: Data<Asp>,
) -> Result<HttpResponse, ApiError> {
    let invites = InviteService::list(storage_provider.get_ref()).await?;
    Ok(HttpResponse::Ok().json(invites))
}

#[tracing::instrument(name = "Revoke invite", skip_all, fields(admin = %admin.0.sub))]
pub(crate) async fn revoke_invite<Asp: AuthStorageProvider>(
    admin: AdminUser,
    storage_provider: Data<Asp>,
    params: Query<RevokeInviteParams>,
) -> Result<HttpResponse, ApiError> {
    InviteService::revoke(storage_provider.get_ref(), &params.code).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::new("revoked")))
}
