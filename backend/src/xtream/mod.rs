// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Xtream Codes provider accounts of users. Credentials are encrypted at rest
//! and only decrypted to probe the upstream provider.

use chrono::Utc;
use rptvtypes::{
    endpoint_paths::XTREAM_PLAYER_API,
    identifiers::UserId,
    messages::{CreateXtreamAccount, ProbeResult, UpdateXtreamAccount, XtreamAccountView},
    validation::ValidationError,
};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{crypto::ear::CredentialCipher, errors::StorageError};

use self::{
    account_record::XtreamAccountRecord,
    storage_provider_trait::XtreamStorageProvider,
    upstream_provider_trait::{UpstreamError, UpstreamProvider, UpstreamResponse},
};

pub mod account_record;
pub mod storage_provider_trait;
pub mod upstream_provider_trait;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum XtreamError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The account doesn't exist or belongs to another user.
    #[error("Xtream account not found")]
    NotFound,
    /// Storage provider error
    #[error("Storage provider error")]
    StorageError,
    /// Encryption or decryption of credentials failed
    #[error("Library error")]
    LibraryError,
}

impl From<StorageError> for XtreamError {
    fn from(e: StorageError) -> Self {
        error!(error = %e, "Storage provider error");
        Self::StorageError
    }
}

/// URL of the `player_api.php` endpoint below `api_url`, with the credentials
/// as URL-encoded query parameters.
pub fn probe_url(api_url: &str, username: &str, password: &str) -> Result<Url, url::ParseError> {
    let mut base = api_url.to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }
    let mut url = Url::parse(&base)?.join(XTREAM_PLAYER_API)?;
    url.query_pairs_mut()
        .append_pair("username", username)
        .append_pair("password", password);
    Ok(url)
}

/// Interpret what the upstream provider answered.
pub fn probe_result(outcome: Result<UpstreamResponse, UpstreamError>) -> ProbeResult {
    match outcome {
        Ok(UpstreamResponse { status, body }) => {
            if body.iter().all(u8::is_ascii_whitespace) {
                return ProbeResult::responded(status, serde_json::json!({}));
            }
            match serde_json::from_slice(&body) {
                Ok(body) => ProbeResult::responded(status, body),
                Err(e) => ProbeResult::failed(
                    Some(status),
                    "InvalidResponseBody",
                    format!("Response body is not valid JSON: {e}"),
                ),
            }
        }
        Err(e) => ProbeResult::failed(None, e.kind(), e.to_string()),
    }
}

pub struct XtreamService {
    cipher: CredentialCipher,
}

impl XtreamService {
    pub fn new(cipher: CredentialCipher) -> Self {
        Self { cipher }
    }

    pub async fn list_for<Xsp: XtreamStorageProvider>(
        storage_provider: &Xsp,
        owner: UserId,
    ) -> Result<Vec<XtreamAccountView>, XtreamError> {
        let accounts = storage_provider.list_accounts(owner).await?;
        Ok(accounts.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, storage_provider, request))]
    pub async fn create<Xsp: XtreamStorageProvider>(
        &self,
        storage_provider: &Xsp,
        owner: UserId,
        request: &CreateXtreamAccount,
    ) -> Result<XtreamAccountView, XtreamError> {
        let account = request.validate()?;
        let now = Utc::now();
        let record = XtreamAccountRecord {
            id: Uuid::new_v4(),
            user_id: owner,
            name: account.name,
            api_url: account.api_url,
            username_enc: self.encrypt(&account.username)?,
            password_enc: self.encrypt(&account.password)?,
            created_at: now,
            updated_at: now,
        };
        storage_provider.create_account(&record).await?;
        info!(account_id = %record.id, "Created Xtream account");
        Ok(record.into())
    }

    /// Accounts of other users are reported as [`XtreamError::NotFound`].
    pub async fn get_owned<Xsp: XtreamStorageProvider>(
        storage_provider: &Xsp,
        owner: UserId,
        id: Uuid,
    ) -> Result<XtreamAccountRecord, XtreamError> {
        storage_provider
            .load_account(id)
            .await?
            .filter(|account| account.is_owned_by(owner))
            .ok_or(XtreamError::NotFound)
    }

    #[instrument(skip(self, storage_provider, request))]
    pub async fn update<Xsp: XtreamStorageProvider>(
        &self,
        storage_provider: &Xsp,
        owner: UserId,
        id: Uuid,
        request: &UpdateXtreamAccount,
    ) -> Result<XtreamAccountView, XtreamError> {
        let update = request.validate()?;
        let mut record = Self::get_owned(storage_provider, owner, id).await?;
        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(api_url) = update.api_url {
            record.api_url = api_url;
        }
        if let Some(username) = update.username {
            record.username_enc = self.encrypt(&username)?;
        }
        if let Some(password) = update.password {
            record.password_enc = self.encrypt(&password)?;
        }
        record.updated_at = Utc::now();
        storage_provider.update_account(&record).await?;
        Ok(record.into())
    }

    #[instrument(skip(storage_provider))]
    pub async fn delete<Xsp: XtreamStorageProvider>(
        storage_provider: &Xsp,
        owner: UserId,
        id: Uuid,
    ) -> Result<(), XtreamError> {
        let record = Self::get_owned(storage_provider, owner, id).await?;
        if !storage_provider.delete_account(record.id).await? {
            return Err(XtreamError::NotFound);
        }
        info!("Deleted Xtream account");
        Ok(())
    }

    /// Call `player_api.php` of the account's provider with the stored
    /// credentials. Upstream failures are reported in the result, not as
    /// errors.
    #[instrument(skip(self, storage_provider, upstream_provider))]
    pub async fn probe<Xsp: XtreamStorageProvider, Up: UpstreamProvider>(
        &self,
        storage_provider: &Xsp,
        upstream_provider: &Up,
        owner: UserId,
        id: Uuid,
    ) -> Result<ProbeResult, XtreamError> {
        let record = Self::get_owned(storage_provider, owner, id).await?;
        let username = self.decrypt(&record.username_enc)?;
        let password = self.decrypt(&record.password_enc)?;
        let url = match probe_url(&record.api_url, &username, &password) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Stored API URL can't be used");
                return Ok(ProbeResult::failed(
                    None,
                    "RequestError",
                    format!("Invalid API URL: {e}"),
                ));
            }
        };
        let result = probe_result(upstream_provider.get(url).await);
        info!(ok = result.ok, status = ?result.status, "Probed upstream provider");
        Ok(result)
    }

    fn encrypt(&self, plaintext: &str) -> Result<String, XtreamError> {
        self.cipher.encrypt(plaintext).map_err(|e| {
            error!(error = %e, "Failed to encrypt credential");
            XtreamError::LibraryError
        })
    }

    fn decrypt(&self, payload: &str) -> Result<String, XtreamError> {
        self.cipher.decrypt(payload).map_err(|e| {
            error!(error = %e, "Failed to decrypt credential");
            XtreamError::LibraryError
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct TestStorage {
        accounts: Mutex<HashMap<Uuid, XtreamAccountRecord>>,
    }

    #[async_trait]
    impl XtreamStorageProvider for TestStorage {
        async fn list_accounts(
            &self,
            user_id: UserId,
        ) -> Result<Vec<XtreamAccountRecord>, StorageError> {
            let mut accounts: Vec<_> = self
                .accounts
                .lock()
                .unwrap()
                .values()
                .filter(|a| a.user_id == user_id)
                .cloned()
                .collect();
            accounts.sort_by_key(|a| a.created_at);
            Ok(accounts)
        }

        async fn load_account(
            &self,
            id: Uuid,
        ) -> Result<Option<XtreamAccountRecord>, StorageError> {
            Ok(self.accounts.lock().unwrap().get(&id).cloned())
        }

        async fn create_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError> {
            self.accounts
                .lock()
                .unwrap()
                .insert(account.id, account.clone());
            Ok(())
        }

        async fn update_account(&self, account: &XtreamAccountRecord) -> Result<(), StorageError> {
            self.create_account(account).await
        }

        async fn delete_account(&self, id: Uuid) -> Result<bool, StorageError> {
            Ok(self.accounts.lock().unwrap().remove(&id).is_some())
        }
    }

    #[derive(Debug)]
    struct RecordingUpstream {
        response: Result<UpstreamResponse, UpstreamError>,
        requested: Mutex<Vec<Url>>,
    }

    #[async_trait]
    impl UpstreamProvider for RecordingUpstream {
        async fn get(&self, url: Url) -> Result<UpstreamResponse, UpstreamError> {
            self.requested.lock().unwrap().push(url);
            self.response.clone()
        }
    }

    fn service() -> XtreamService {
        XtreamService::new(
            CredentialCipher::from_base64(&CredentialCipher::generate_key_b64().unwrap()).unwrap(),
        )
    }

    fn create_request() -> CreateXtreamAccount {
        CreateXtreamAccount {
            name: "My IPTV".to_owned(),
            api_url: "http://provider.example:8080".to_owned(),
            username: "alice".to_owned(),
            password: "p&ss word".to_owned(),
        }
    }

    #[test]
    fn probe_url_encoding() {
        let url = probe_url("http://provider.example:8080", "alice", "p&ss word").unwrap();
        assert_eq!(
            url.as_str(),
            "http://provider.example:8080/player_api.php?username=alice&password=p%26ss+word"
        );
        let url = probe_url("http://provider.example/xtream/", "a", "b").unwrap();
        assert_eq!(
            url.as_str(),
            "http://provider.example/xtream/player_api.php?username=a&password=b"
        );
    }

    #[test]
    fn probe_results() {
        let ok = probe_result(Ok(UpstreamResponse {
            status: 200,
            body: br#"{"user_info":{"auth":1}}"#.to_vec(),
        }));
        assert!(ok.ok);
        assert_eq!(ok.status, Some(200));
        assert_eq!(
            ok.response,
            Some(serde_json::json!({"user_info": {"auth": 1}}))
        );

        let empty = probe_result(Ok(UpstreamResponse {
            status: 401,
            body: Vec::new(),
        }));
        assert!(!empty.ok);
        assert_eq!(empty.status, Some(401));
        assert_eq!(empty.response, Some(serde_json::json!({})));

        let html = probe_result(Ok(UpstreamResponse {
            status: 200,
            body: b"<html></html>".to_vec(),
        }));
        assert!(!html.ok);
        assert_eq!(html.status, Some(200));
        assert_eq!(html.error.as_deref(), Some("InvalidResponseBody"));

        let timeout = probe_result(Err(UpstreamError::Timeout("timed out".to_owned())));
        assert!(!timeout.ok);
        assert_eq!(timeout.status, None);
        assert_eq!(timeout.error.as_deref(), Some("Timeout"));
        assert_eq!(timeout.message.as_deref(), Some("timed out"));
    }

    #[tokio::test]
    async fn credentials_are_encrypted_at_rest() {
        let storage = TestStorage::default();
        let service = service();
        let owner = UserId::random();
        let view = service
            .create(&storage, owner, &create_request())
            .await
            .unwrap();
        assert_eq!(view.name, "My IPTV");

        let record = XtreamService::get_owned(&storage, owner, view.id)
            .await
            .unwrap();
        assert_ne!(record.username_enc, "alice");
        assert_ne!(record.password_enc, "p&ss word");
        assert_eq!(service.decrypt(&record.username_enc).unwrap(), "alice");
        assert_eq!(service.decrypt(&record.password_enc).unwrap(), "p&ss word");
    }

    #[tokio::test]
    async fn other_users_accounts_are_not_found() {
        let storage = TestStorage::default();
        let service = service();
        let owner = UserId::random();
        let intruder = UserId::random();
        let view = service
            .create(&storage, owner, &create_request())
            .await
            .unwrap();

        assert_eq!(
            XtreamService::get_owned(&storage, intruder, view.id).await,
            Err(XtreamError::NotFound)
        );
        assert_eq!(
            service
                .update(&storage, intruder, view.id, &UpdateXtreamAccount::default())
                .await,
            Err(XtreamError::NotFound)
        );
        assert_eq!(
            XtreamService::delete(&storage, intruder, view.id).await,
            Err(XtreamError::NotFound)
        );
        assert!(XtreamService::list_for(&storage, intruder)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            XtreamService::list_for(&storage, owner).await.unwrap(),
            vec![view]
        );
    }

    #[tokio::test]
    async fn partial_update() {
        let storage = TestStorage::default();
        let service = service();
        let owner = UserId::random();
        let created = service
            .create(&storage, owner, &create_request())
            .await
            .unwrap();
        let before = XtreamService::get_owned(&storage, owner, created.id)
            .await
            .unwrap();

        let update = UpdateXtreamAccount {
            name: Some("Renamed".to_owned()),
            password: Some("new-password".to_owned()),
            ..Default::default()
        };
        let updated = service
            .update(&storage, owner, created.id, &update)
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.api_url, created.api_url);
        assert!(updated.updated_at >= created.updated_at);

        let after = XtreamService::get_owned(&storage, owner, created.id)
            .await
            .unwrap();
        assert_eq!(after.username_enc, before.username_enc);
        assert_eq!(service.decrypt(&after.password_enc).unwrap(), "new-password");

        let invalid = UpdateXtreamAccount {
            api_url: Some("ftp://provider.example".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&storage, owner, created.id, &invalid).await,
            Err(XtreamError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn probe_uses_decrypted_credentials() {
        let storage = TestStorage::default();
        let service = service();
        let owner = UserId::random();
        let created = service
            .create(&storage, owner, &create_request())
            .await
            .unwrap();
        let upstream = RecordingUpstream {
            response: Ok(UpstreamResponse {
                status: 200,
                body: b"{}".to_vec(),
            }),
            requested: Mutex::new(Vec::new()),
        };

        let result = service
            .probe(&storage, &upstream, owner, created.id)
            .await
            .unwrap();
        assert!(result.ok);
        let requested = upstream.requested.lock().unwrap();
        assert_eq!(requested.len(), 1);
        assert_eq!(
            requested[0].query(),
            Some("username=alice&password=p%26ss+word")
        );
    }

    #[tokio::test]
    async fn delete_removes_account() {
        let storage = TestStorage::default();
        let service = service();
        let owner = UserId::random();
        let created = service
            .create(&storage, owner, &create_request())
            .await
            .unwrap();
        XtreamService::delete(&storage, owner, created.id)
            .await
            .unwrap();
        assert_eq!(
            XtreamService::get_owned(&storage, owner, created.id).await,
            Err(XtreamError::NotFound)
        );
    }
}
