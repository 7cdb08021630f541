// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::net::TcpListener;

use rptvbackend::{
    auth_service::AuthService,
    crypto::{
        ear::CredentialCipher,
        keys::{load_decoding_key, load_encoding_key},
        tokens::AccessTokenVerifier,
    },
    xtream::XtreamService,
};
use rptvserver::{
    configurations::*,
    network_provider::HttpUpstreamProvider,
    run,
    storage_provider::postgres::PostgresStorage,
    telemetry::{get_subscriber, init_subscriber},
};
use secrecy::ExposeSecret;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Configure logging/trace subscription
    let subscriber = get_subscriber("rptvserver".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    // Load configuration
    let configuration = get_configuration("server/").expect("Could not load configuration.");

    if configuration.application.host.is_empty() {
        panic!("No host configured.");
    }

    // Key material
    let signing_key = load_encoding_key(&configuration.jwt.private_key_path)
        .expect("Could not load the JWT signing key.");
    let verifying_key = load_decoding_key(&configuration.jwt.public_key_path)
        .expect("Could not load the JWT verification key.");
    let cipher = CredentialCipher::from_base64(configuration.encryption.master_key.expose_secret())
        .expect("Invalid encryption master key.");

    let auth_service = AuthService::new(signing_key, &configuration.jwt)
        .expect("Invalid JWT token lifetimes.");
    let token_verifier = AccessTokenVerifier::new(verifying_key, &configuration.jwt.issuer);
    let xtream_service = XtreamService::new(cipher);
    let upstream_provider = HttpUpstreamProvider::new(&configuration.upstream)
        .expect("Could not build the upstream HTTP client.");

    // Storage
    let storage_provider = PostgresStorage::new(&configuration.database)
        .await
        .expect("Failed to connect to database.");

    if let Some(admin) = &configuration.application.admin {
        let created = AuthService::ensure_admin(
            &storage_provider,
            &admin.email,
            admin.password.expose_secret(),
        )
        .await
        .expect("Could not create the admin account.");
        if !created {
            tracing::info!("Admin account exists already");
        }
    }

    // Port binding
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address).expect("Failed to bind to port.");

    // Start the server
    run(
        listener,
        storage_provider,
        auth_service,
        xtream_service,
        token_verifier,
        upstream_provider,
    )?
    .await
}
