// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::{Connection, Executor, PgConnection, PgPool};

use crate::configurations::DatabaseSettings;

pub mod auth_service;
pub mod xtream;

#[cfg(test)]
mod tests;

/// Storage provider backed by PostgreSQL. Implements the auth and the Xtream
/// storage traits on the same pool.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect to the configured database, creating it if necessary, and run
    /// all pending migrations.
    pub async fn new(settings: &DatabaseSettings) -> Result<Self, sqlx::Error> {
        let pool = connect_to_database(settings).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn connect_to_database(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let mut connection =
        PgConnection::connect(&settings.connection_string_without_database()).await?;
    let db_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT datname FROM pg_catalog.pg_database WHERE datname = $1
        )",
    )
    .bind(&settings.name)
    .fetch_one(&mut connection)
    .await?;
    if !db_exists {
        tracing::info!(database = %settings.name, "Creating database");
        connection
            .execute(format!(r#"CREATE DATABASE "{}";"#, settings.name).as_str())
            .await?;
    }
    // Migrate database
    let connection_pool = PgPool::connect(&settings.connection_string()).await?;
    sqlx::migrate!("./migrations").run(&connection_pool).await?;
    Ok(connection_pool)
}
