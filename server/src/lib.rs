// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! rptv server.

pub mod auth;
pub mod configurations;
pub mod endpoints;
pub mod errors;
pub mod network_provider;
pub mod request_id;
pub mod storage_provider;
pub mod telemetry;

use actix_web::{
    dev::{Server, Service},
    web::{self, Data, JsonConfig, PathConfig, QueryConfig},
    App, HttpServer,
};
use rptvbackend::{
    auth_service::{storage_provider_trait::AuthStorageProvider, AuthService},
    crypto::tokens::AccessTokenVerifier,
    xtream::{
        storage_provider_trait::XtreamStorageProvider, upstream_provider_trait::UpstreamProvider,
        XtreamService,
    },
};
use rptvtypes::endpoint_paths::*;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::{
    endpoints::{admin, auth as auth_endpoints, health_check, info, root, xtream},
    errors::{json_error_handler, not_found, path_error_handler, query_error_handler},
    request_id::RequestIdRootSpanBuilder,
};

/// Configure and run the server application.
pub fn run<S: AuthStorageProvider + XtreamStorageProvider, U: UpstreamProvider>(
    listener: TcpListener,
    storage_provider: S,
    auth_service: AuthService,
    xtream_service: XtreamService,
    token_verifier: AccessTokenVerifier,
    upstream_provider: U,
) -> Result<Server, std::io::Error> {
    // Wrap providers and services in a Data<T>
    let storage_provider_data = Data::new(storage_provider);
    let auth_service_data = Data::new(auth_service);
    let xtream_service_data = Data::new(xtream_service);
    let token_verifier_data = Data::new(token_verifier);
    let upstream_provider_data = Data::new(upstream_provider);

    let address = listener.local_addr()?;
    tracing::info!(
        "Starting server, listening on {}:{}",
        address.ip(),
        address.port()
    );

    let account_path = format!("{ENDPOINT_XTREAM}/{{id}}");
    let probe_path = format!("{ENDPOINT_XTREAM}/{{id}}/test");

    // Create & run the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::<RequestIdRootSpanBuilder>::new())
            // Registered last so that it runs first and the root span can
            // pick up the request id.
            .wrap_fn(|request, service| {
                let request_id = request_id::assign(&request);
                let response = service.call(request);
                async move {
                    let mut response = response.await?;
                    request_id::echo(&mut response, &request_id);
                    Ok::<_, actix_web::Error>(response)
                }
            })
            .app_data(JsonConfig::default().error_handler(json_error_handler))
            .app_data(QueryConfig::default().error_handler(query_error_handler))
            .app_data(PathConfig::default().error_handler(path_error_handler))
            .app_data(storage_provider_data.clone())
            .app_data(auth_service_data.clone())
            .app_data(xtream_service_data.clone())
            .app_data(token_verifier_data.clone())
            .app_data(upstream_provider_data.clone())
            // Public endpoints
            .route(ENDPOINT_ROOT, web::get().to(root))
            .route(ENDPOINT_HEALTH_CHECK, web::get().to(health_check::<S>))
            .route(ENDPOINT_INFO, web::get().to(info))
            // Auth endpoints
            .route(
                ENDPOINT_AUTH_REGISTER,
                web::post().to(auth_endpoints::register::<S>),
            )
            .route(ENDPOINT_AUTH_LOGIN, web::post().to(auth_endpoints::login::<S>))
            .route(
                ENDPOINT_AUTH_REFRESH,
                web::post().to(auth_endpoints::refresh::<S>),
            )
            .route(ENDPOINT_AUTH_LOGOUT, web::post().to(auth_endpoints::logout::<S>))
            .route(
                ENDPOINT_AUTH_LOGOUT_ALL,
                web::post().to(auth_endpoints::logout_all::<S>),
            )
            .route(ENDPOINT_AUTH_ME, web::get().to(auth_endpoints::me))
            // Admin endpoints
            .route(
                ENDPOINT_ADMIN_INVITES,
                web::post().to(admin::create_invite::<S>),
            )
            .route(ENDPOINT_ADMIN_INVITES, web::get().to(admin::list_invites::<S>))
            .route(
                ENDPOINT_ADMIN_INVITES_REVOKE,
                web::post().to(admin::revoke_invite::<S>),
            )
            // Xtream endpoints
            .route(ENDPOINT_XTREAM, web::get().to(xtream::list_accounts::<S>))
            .route(ENDPOINT_XTREAM, web::post().to(xtream::create_account::<S>))
            .route(&account_path, web::put().to(xtream::update_account::<S>))
            .route(&account_path, web::delete().to(xtream::delete_account::<S>))
            .route(&probe_path, web::get().to(xtream::probe_account::<S, U>))
            .default_service(web::route().to(not_found))
    })
    .listen(listener)?
    .run();
    Ok(server)
}
