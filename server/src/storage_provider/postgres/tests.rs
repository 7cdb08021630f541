// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! These tests need a PostgreSQL server reachable through `DATABASE_URL`.
//! Run them with `cargo test -- --ignored`.

use chrono::{Duration, Utc};
use rptvbackend::{
    auth_service::{
        errors::{CreateInviteError, CreateUserError, InviteUnusable, RegisterUserError},
        refresh_token::RefreshTokenRecord,
        storage_provider_trait::AuthStorageProvider,
        user_record::UserRecord,
    },
    invites::InviteCodeRecord,
    xtream::{account_record::XtreamAccountRecord, storage_provider_trait::XtreamStorageProvider},
};
use rptvtypes::identifiers::{Email, Roles};
use sqlx::PgPool;
use uuid::Uuid;

use super::PostgresStorage;

fn user(email: &str) -> UserRecord {
    UserRecord::new(
        email.parse().unwrap(),
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
        Roles::user(),
        Utc::now(),
    )
}

#[sqlx::test]
#[ignore]
async fn users(pool: PgPool) -> anyhow::Result<()> {
    let storage = PostgresStorage::from_pool(pool);
    storage.ping().await?;

    let alice = user("alice@example.com");
    storage.create_user(&alice).await?;
    assert!(matches!(
        storage.create_user(&user("alice@example.com")).await,
        Err(CreateUserError::EmailTaken)
    ));

    let loaded = storage.load_user(alice.id).await?.unwrap();
    assert_eq!(loaded.email, alice.email);
    assert_eq!(loaded.roles, Roles::user());

    let email: Email = "ALICE@example.com".parse()?;
    assert_eq!(storage.load_user_by_email(&email).await?.unwrap().id, alice.id);
    Ok(())
}

#[sqlx::test]
#[ignore]
async fn registration_with_invite(pool: PgPool) -> anyhow::Result<()> {
    let storage = PostgresStorage::from_pool(pool);
    let now = Utc::now();
    storage
        .create_invite(&InviteCodeRecord::new("code".to_owned(), 1, None, now))
        .await?;
    assert!(matches!(
        storage
            .create_invite(&InviteCodeRecord::new("code".to_owned(), 1, None, now))
            .await,
        Err(CreateInviteError::DuplicateCode)
    ));

    storage
        .create_user_with_invite("code", now, &user("alice@example.com"))
        .await?;
    let result = storage
        .create_user_with_invite("code", now, &user("bob@example.com"))
        .await;
    assert!(matches!(
        result,
        Err(RegisterUserError::InviteUnusable(InviteUnusable::UsedUp))
    ));

    let invites = storage.list_invites().await?;
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].uses, 1);
    Ok(())
}

#[sqlx::test]
#[ignore]
async fn failed_registration_rolls_back(pool: PgPool) -> anyhow::Result<()> {
    let storage = PostgresStorage::from_pool(pool);
    let now = Utc::now();
    storage
        .create_invite(&InviteCodeRecord::new("code".to_owned(), 3, None, now))
        .await?;
    storage.create_user(&user("alice@example.com")).await?;

    let result = storage
        .create_user_with_invite("code", now, &user("alice@example.com"))
        .await;
    assert!(matches!(result, Err(RegisterUserError::EmailTaken)));
    assert_eq!(storage.list_invites().await?[0].uses, 0);

    let revoked = storage.revoke_invite("code").await?.unwrap();
    assert_eq!(revoked.max_uses, 0);
    assert!(storage.revoke_invite("missing").await?.is_none());
    Ok(())
}

#[sqlx::test]
#[ignore]
async fn refresh_tokens(pool: PgPool) -> anyhow::Result<()> {
    let storage = PostgresStorage::from_pool(pool);
    let alice = user("alice@example.com");
    storage.create_user(&alice).await?;
    let now = Utc::now();
    let token = RefreshTokenRecord {
        id: Uuid::new_v4(),
        user_id: alice.id,
        token_id: "token-id".to_owned(),
        token_hash: "hash".to_owned(),
        issued_at: now,
        expires_at: now + Duration::days(30),
        revoked: false,
    };
    storage.store_refresh_token(&token).await?;
    let loaded = storage.load_refresh_token("token-id").await?.unwrap();
    assert_eq!(loaded.user_id, alice.id);
    assert!(!loaded.revoked);

    assert!(storage.revoke_refresh_token(token.id).await?);
    assert!(!storage.revoke_refresh_token(token.id).await?);
    assert_eq!(storage.revoke_all_refresh_tokens(alice.id).await?, 0);
    Ok(())
}

#[sqlx::test]
#[ignore]
async fn xtream_accounts(pool: PgPool) -> anyhow::Result<()> {
    let storage = PostgresStorage::from_pool(pool);
    let alice = user("alice@example.com");
    storage.create_user(&alice).await?;
    let now = Utc::now();
    let mut account = XtreamAccountRecord {
        id: Uuid::new_v4(),
        user_id: alice.id,
        name: "Provider".to_owned(),
        api_url: "http://provider.example".to_owned(),
        username_enc: "AQ-user".to_owned(),
        password_enc: "AQ-pass".to_owned(),
        created_at: now,
        updated_at: now,
    };
    storage.create_account(&account).await?;
    assert_eq!(storage.list_accounts(alice.id).await?.len(), 1);

    account.name = "Renamed".to_owned();
    storage.update_account(&account).await?;
    let loaded = storage.load_account(account.id).await?.unwrap();
    assert_eq!(loaded.name, "Renamed");

    assert!(storage.delete_account(account.id).await?);
    assert!(!storage.delete_account(account.id).await?);
    assert!(storage.list_accounts(alice.id).await?.is_empty());
    Ok(())
}
