// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Endpoints for the Xtream accounts of the authenticated user. The user
//! behind the token must still exist.

use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use rptvbackend::{
    auth_service::{storage_provider_trait::AuthStorageProvider, AuthService},
    xtream::{
        storage_provider_trait::XtreamStorageProvider, upstream_provider_trait::UpstreamProvider,
        XtreamService,
    },
};
use rptvtypes::{
    identifiers::UserId,
    messages::{CreateXtreamAccount, StatusResponse, UpdateXtreamAccount},
};
use uuid::Uuid;

use crate::{auth::Authenticated, errors::ApiError};

async fn owner<Sp: AuthStorageProvider>(
    storage_provider: &Sp,
    user: &Authenticated,
) -> Result<UserId, ApiError> {
    let user = AuthService::current_user(storage_provider, &user.0).await?;
    Ok(user.id)
}

pub(crate) async fn list_accounts<Sp: AuthStorageProvider + XtreamStorageProvider>(
    user: Authenticated,
    storage_provider: Data<Sp>,
) -> Result<HttpResponse, ApiError> {
    let owner = owner(storage_provider.get_ref(), &user).await?;
    let accounts = XtreamService::list_for(storage_provider.get_ref(), owner).await?;
    Ok(HttpResponse::Ok().json(accounts))
}

#[tracing::instrument(name = "Create Xtream account", skip_all, fields(user_id = %user.0.sub))]
pub(crate) async fn create_account<Sp: AuthStorageProvider + XtreamStorageProvider>(
    user: Authenticated,
    storage_provider: Data<Sp>,
    xtream_service: Data<XtreamService>,
    request: Json<CreateXtreamAccount>,
) -> Result<HttpResponse, ApiError> {
    let owner = owner(storage_provider.get_ref(), &user).await?;
    let account = xtream_service
        .create(storage_provider.get_ref(), owner, &request)
        .await?;
    Ok(HttpResponse::Ok().json(account))
}

#[tracing::instrument(name = "Update Xtream account", skip_all, fields(user_id = %user.0.sub))]
pub(crate) async fn update_account<Sp: AuthStorageProvider + XtreamStorageProvider>(
    user: Authenticated,
    storage_provider: Data<Sp>,
    xtream_service: Data<XtreamService>,
    id: Path<Uuid>,
    request: Json<UpdateXtreamAccount>,
) -> Result<HttpResponse, ApiError> {
    let owner = owner(storage_provider.get_ref(), &user).await?;
    let account = xtream_service
        .update(storage_provider.get_ref(), owner, id.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(account))
}

#[tracing::instrument(name = "Delete Xtream account", skip_all, fields(user_id = %user.0.sub))]
pub(crate) async fn delete_account<Sp: AuthStorageProvider + XtreamStorageProvider>(
    user: Authenticated,
    storage_provider: Data<Sp>,
    id: Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let owner = owner(storage_provider.get_ref(), &user).await?;
    XtreamService::delete(storage_provider.get_ref(), owner, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::new("deleted")))
}

#[tracing::instrument(name = "Probe Xtream account", skip_all, fields(user_id = %user.0.sub))]
pub(crate) async fn probe_account<
    Sp: AuthStorageProvider + XtreamStorageProvider,
    Up: UpstreamProvider,
>(
    user: Authenticated,
    storage_provider: Data<Sp>,
    upstream_provider: Data<Up>,
    xtream_service: Data<XtreamService>,
    id: Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let owner = owner(storage_provider.get_ref(), &user).await?;
    let result = xtream_service
        .probe(
            storage_provider.get_ref(),
            upstream_provider.get_ref(),
            owner,
            id.into_inner(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(result))
}
