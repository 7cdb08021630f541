// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Configuration for the server.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub encryption: EncryptionSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
}

/// Configuration for the application.
#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    // If this isn't present, no admin account is created on start-up.
    #[serde(default)]
    pub admin: Option<AdminSettings>,
}

/// Credentials of an admin account that is created on start-up if no user
/// with that email exists yet.
#[derive(Deserialize, Clone, Debug)]
pub struct AdminSettings {
    pub email: String,
    pub password: SecretString,
}

/// Configuration for the database.
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub name: String,
    pub cacertpath: Option<String>,
}

/// Signing and lifetime configuration of issued tokens.
#[derive(Deserialize, Clone, Debug)]
pub struct JwtSettings {
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Lifetime of access tokens in seconds.
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl: u64,
    /// Lifetime of refresh tokens in seconds.
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl: u64,
    #[serde(default)]
    pub public_key_path: String,
    #[serde(default)]
    pub private_key_path: String,
}

/// Encryption at rest of upstream credentials.
#[derive(Deserialize, Clone, Debug)]
pub struct EncryptionSettings {
    /// Base64 encoding of a 256-bit key.
    pub master_key: SecretString,
}

/// HTTP client configuration for calls to Xtream providers.
#[derive(Deserialize, Clone, Debug)]
pub struct UpstreamSettings {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            max_idle_connections: default_max_idle_connections(),
        }
    }
}

impl UpstreamSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

fn default_issuer() -> String {
    "rptv".to_owned()
}

fn default_access_token_ttl() -> u64 {
    900
}

fn default_refresh_token_ttl() -> u64 {
    // 30 days
    2_592_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_response_timeout_ms() -> u64 {
    15_000
}

fn default_max_idle_connections() -> usize {
    100
}

impl DatabaseSettings {
    /// Add the TLS mode to the connection string if the CA certificate path is
    /// set.
    fn add_tls_mode(&self, mut connection_string: String) -> String {
        if let Some(ref ca_cert_path) = self.cacertpath {
            connection_string.push_str(&format!("?sslmode=verify-ca&sslrootcert={}", ca_cert_path));
        }
        connection_string
    }

    /// Get the connection string for the database.
    pub fn connection_string(&self) -> String {
        let connection_string = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.name
        );
        self.add_tls_mode(connection_string)
    }

    /// Get the connection string for the database without the database name.
    pub fn connection_string_without_database(&self) -> String {
        let connection_string = format!(
            "postgres://{}:{}@{}:{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port
        );
        self.add_tls_mode(connection_string)
    }
}
