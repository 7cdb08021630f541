#![allow(dead_code)]

// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::net::{SocketAddr, TcpListener};

use once_cell::sync::Lazy;
use rptvapiclient::ApiClient;
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
    configurations::{JwtSettings, UpstreamSettings},
    network_provider::HttpUpstreamProvider,
    run,
    storage_provider::memory::MemoryStorage,
    telemetry::{get_subscriber, init_subscriber},
};
use rptvtypes::messages::{CreateInviteParams, TokenPair};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "Passw0rd!";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // This allows us to choose not to capture traces for tests that pass.
    // To get all logs just run `TEST_LOG=true cargo test health_check_works | bunyan`.
    // bunyan can be installed via `cargo install bunyan`.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: SocketAddr,
    pub client: ApiClient,
    /// Tokens of the bootstrap admin account.
    pub admin: TokenPair,
}

impl TestApp {
    pub fn url(&self, endpoint: &str) -> String {
        format!("http://{}{}", self.address, endpoint)
    }

    /// Create an invite code with the given number of uses.
    pub async fn invite(&self, max_uses: i32) -> String {
        let params = CreateInviteParams {
            max_uses,
            ..Default::default()
        };
        self.client
            .create_invite(&self.admin.access_token, &params)
            .await
            .expect("Failed to create invite")
            .code
    }

    /// Register a new user with [`PASSWORD`] through a fresh invite.
    pub async fn register(&self, email: &str) -> TokenPair {
        let code = self.invite(1).await;
        self.client
            .register(email, PASSWORD, &code)
            .await
            .expect("Failed to register user")
    }
}

/// Start the server on a random port with in-memory storage and an admin
/// account.
pub async fn spawn_app() -> TestApp {
    // Initialize tracing subscription only once.
    Lazy::force(&TRACING);

    let jwt = JwtSettings {
        issuer: "rptv".to_owned(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        public_key_path: "tests/fixtures/jwt_public.pem".to_owned(),
        private_key_path: "tests/fixtures/jwt_private.pem".to_owned(),
    };
    let signing_key = load_encoding_key(&jwt.private_key_path).unwrap();
    let verifying_key = load_decoding_key(&jwt.public_key_path).unwrap();
    let auth_service = AuthService::new(signing_key, &jwt).unwrap();
    let token_verifier = AccessTokenVerifier::new(verifying_key, &jwt.issuer);

    let master_key = CredentialCipher::generate_key_b64().unwrap();
    let xtream_service = XtreamService::new(CredentialCipher::from_base64(&master_key).unwrap());
    let upstream_provider = HttpUpstreamProvider::new(&UpstreamSettings {
        response_timeout_ms: 2_000,
        ..Default::default()
    })
    .unwrap();

    let storage_provider = MemoryStorage::new();
    AuthService::ensure_admin(&storage_provider, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();

    // Port binding
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port.");
    let address = listener.local_addr().unwrap();

    // Start the server
    let server = run(
        listener,
        storage_provider,
        auth_service,
        xtream_service,
        token_verifier,
        upstream_provider,
    )
    .expect("Failed to bind to address.");

    // Execute the server in the background
    tokio::spawn(server);

    let client = ApiClient::initialize(address.to_string()).expect("Failed to initialize client");
    let admin = client
        .login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("Admin login failed");

    TestApp {
        address,
        client,
        admin,
    }
}
