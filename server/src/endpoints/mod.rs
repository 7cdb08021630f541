// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use actix_web::{web::Data, HttpResponse, Responder};
use rptvbackend::auth_service::storage_provider_trait::AuthStorageProvider;
use rptvtypes::{
    messages::{AppInfo, AppInfoDetails, AppStatus, HealthState, HealthStatus},
    APP_NAME,
};
use tracing::error;

pub mod admin;
pub mod auth;
pub mod xtream;

pub(crate) async fn root() -> impl Responder {
    HttpResponse::Ok().json(AppStatus {
        app: APP_NAME.to_owned(),
        status: "ok".to_owned(),
    })
}

/// `UP` if the storage provider is reachable, `DOWN` with 503 otherwise.
pub(crate) async fn health_check<Asp: AuthStorageProvider>(
    storage_provider: Data<Asp>,
) -> impl Responder {
    match storage_provider.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthStatus {
            status: HealthState::Up,
        }),
        Err(e) => {
            error!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(HealthStatus {
                status: HealthState::Down,
            })
        }
    }
}

pub(crate) async fn info() -> impl Responder {
    HttpResponse::Ok().json(AppInfo {
        app: AppInfoDetails {
            name: APP_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        },
    })
}
