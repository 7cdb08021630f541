// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use actix_web::{
    web::{Data, Json},
    HttpResponse,
};
use rptvbackend::auth_service::{storage_provider_trait::AuthStorageProvider, AuthService};
use rptvtypes::messages::{LoginRequest, RefreshRequest, RegisterRequest};

use crate::{auth::Authenticated, errors::ApiError};

#[tracing::instrument(name = "Register user", skip_all)]
pub(crate) async fn register<Asp: AuthStorageProvider>(
    auth_service: Data<AuthService>,
    storage_provider: Data<Asp>,
    request: Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let tokens = auth_service
        .register(storage_provider.get_ref(), &request)
        .await?;
    Ok(HttpResponse::Created().json(tokens))
}

#[tracing::instrument(name = "Log in", skip_all)]
pub(crate) async fn login<Asp: AuthStorageProvider>(
    auth_service: Data<AuthService>,
    storage_provider: Data<Asp>,
    request: Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let tokens = auth_service
        .login(storage_provider.get_ref(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[tracing::instrument(name = "Refresh tokens", skip_all)]
pub(crate) async fn refresh<Asp: AuthStorageProvider>(
    auth_service: Data<AuthService>,
    storage_provider: Data<Asp>,
    request: Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    let tokens = auth_service
        .refresh(storage_provider.get_ref(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[tracing::instrument(name = "Log out", skip_all)]
pub(crate) async fn logout<Asp: AuthStorageProvider>(
    auth_service: Data<AuthService>,
    storage_provider: Data<Asp>,
    request: Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    auth_service
        .logout(storage_provider.get_ref(), &request)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(name = "Log out everywhere", skip_all, fields(user_id = %user.0.sub))]
pub(crate) async fn logout_all<Asp: AuthStorageProvider>(
    user: Authenticated,
    auth_service: Data<AuthService>,
    storage_provider: Data<Asp>,
) -> Result<HttpResponse, ApiError> {
    auth_service
        .logout_all(storage_provider.get_ref(), user.0.sub)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub(crate) async fn me(user: Authenticated) -> HttpResponse {
    HttpResponse::Ok().json(AuthService::me(&user.0))
}
