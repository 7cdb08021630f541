// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

mod utils;

use rptvbackend::crypto::{keys::load_encoding_key, tokens::AccessTokenIssuer};
use rptvtypes::{
    endpoint_paths::ENDPOINT_XTREAM,
    identifiers::{Roles, UserId},
    messages::{CreateXtreamAccount, UpdateXtreamAccount},
    validation::MAX_CREDENTIAL_LENGTH,
};
use uuid::Uuid;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub use utils::*;

fn account(api_url: &str) -> CreateXtreamAccount {
    CreateXtreamAccount {
        name: "My provider".to_owned(),
        api_url: api_url.to_owned(),
        username: "xuser".to_owned(),
        password: "p&ss word".to_owned(),
    }
}

#[actix_rt::test]
#[tracing::instrument(name = "Xtream CRUD", skip_all)]
async fn account_lifecycle() {
    let app = spawn_app().await;
    let token = app.register("alice@example.com").await.access_token;

    let created = app
        .client
        .create_xtream_account(&token, &account("http://provider.example"))
        .await
        .unwrap();
    assert_eq!(created.name, "My provider");
    assert_eq!(created.api_url, "http://provider.example");

    let accounts = app.client.list_xtream_accounts(&token).await.unwrap();
    assert_eq!(accounts, vec![created.clone()]);

    let update = UpdateXtreamAccount {
        name: Some("Renamed".to_owned()),
        ..Default::default()
    };
    let updated = app
        .client
        .update_xtream_account(&token, created.id, &update)
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.api_url, created.api_url);
    assert!(updated.updated_at >= created.updated_at);

    let status = app
        .client
        .delete_xtream_account(&token, created.id)
        .await
        .unwrap();
    assert_eq!(status.status, "deleted");
    let err = app
        .client
        .delete_xtream_account(&token, created.id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(app.client.list_xtream_accounts(&token).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn credentials_are_never_returned() {
    let app = spawn_app().await;
    let token = app.register("alice@example.com").await.access_token;
    app.client
        .create_xtream_account(&token, &account("http://provider.example"))
        .await
        .unwrap();

    let body = reqwest::Client::new()
        .get(app.url(ENDPOINT_XTREAM))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains("xuser"));
    assert!(!body.contains("username"));
    assert!(!body.contains("password"));
}

#[actix_rt::test]
async fn invalid_accounts_are_rejected() {
    let app = spawn_app().await;
    let token = app.register("alice@example.com").await.access_token;

    for api_url in ["not a url", "ftp://provider.example", ""] {
        let err = app
            .client
            .create_xtream_account(&token, &account(api_url))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400), "{api_url}");
    }

    let mut blank_name = account("http://provider.example");
    blank_name.name = "  ".to_owned();
    let err = app
        .client
        .create_xtream_account(&token, &blank_name)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    let mut long_password = account("http://provider.example");
    long_password.password = "p".repeat(MAX_CREDENTIAL_LENGTH + 1);
    let err = app
        .client
        .create_xtream_account(&token, &long_password)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.error_body().unwrap().message.starts_with("password"));
}

#[actix_rt::test]
async fn tokens_of_deleted_users_are_rejected() {
    let app = spawn_app().await;
    let signing_key = load_encoding_key("tests/fixtures/jwt_private.pem").unwrap();
    let issuer = AccessTokenIssuer::new(signing_key, "rptv", 900).unwrap();
    let email = "ghost@example.com".parse().unwrap();
    let token = issuer
        .issue(UserId::random(), &email, &Roles::user())
        .unwrap();

    // The token itself is valid.
    app.client.me(&token).await.unwrap();

    let err = app.client.list_xtream_accounts(&token).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.error_body().unwrap().message, "Unknown user");
}

#[actix_rt::test]
async fn accounts_are_isolated_between_users() {
    let app = spawn_app().await;
    let alice = app.register("alice@example.com").await.access_token;
    let bob = app.register("bob@example.com").await.access_token;

    let created = app
        .client
        .create_xtream_account(&alice, &account("http://provider.example"))
        .await
        .unwrap();

    assert!(app.client.list_xtream_accounts(&bob).await.unwrap().is_empty());
    let update = UpdateXtreamAccount {
        name: Some("Stolen".to_owned()),
        ..Default::default()
    };
    let err = app
        .client
        .update_xtream_account(&bob, created.id, &update)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    let err = app
        .client
        .test_xtream_account(&bob, created.id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    let err = app
        .client
        .delete_xtream_account(&bob, created.id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));

    let err = app
        .client
        .delete_xtream_account(&alice, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(app.client.list_xtream_accounts(&alice).await.unwrap().len(), 1);
}

#[actix_rt::test]
#[tracing::instrument(name = "Probe upstream", skip_all)]
async fn probe_calls_player_api_with_credentials() {
    let app = spawn_app().await;
    let token = app.register("alice@example.com").await.access_token;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xtream/player_api.php"))
        .and(query_param("username", "xuser"))
        .and(query_param("password", "p&ss word"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user_info": {"auth": 1, "status": "Active"},
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let created = app
        .client
        .create_xtream_account(&token, &account(&format!("{}/xtream", upstream.uri())))
        .await
        .unwrap();
    let result = app
        .client
        .test_xtream_account(&token, created.id)
        .await
        .unwrap();
    assert!(result.ok);
    assert_eq!(result.status, Some(200));
    assert_eq!(
        result.response.unwrap()["user_info"]["status"],
        "Active"
    );
}

#[actix_rt::test]
async fn probe_reports_upstream_failures() {
    let app = spawn_app().await;
    let token = app.register("alice@example.com").await.access_token;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .mount(&upstream)
        .await;

    let created = app
        .client
        .create_xtream_account(&token, &account(&upstream.uri()))
        .await
        .unwrap();
    let result = app
        .client
        .test_xtream_account(&token, created.id)
        .await
        .unwrap();
    assert!(!result.ok);
    assert_eq!(result.status, Some(502));
    assert_eq!(result.error.as_deref(), Some("InvalidResponseBody"));

    // Nothing listens on the discard port.
    let unreachable = app
        .client
        .create_xtream_account(&token, &account("http://127.0.0.1:9"))
        .await
        .unwrap();
    let result = app
        .client
        .test_xtream_account(&token, unreachable.id)
        .await
        .unwrap();
    assert!(!result.ok);
    assert_eq!(result.status, None);
    assert_eq!(result.error.as_deref(), Some("ConnectError"));
}

#[actix_rt::test]
async fn credentials_keep_surrounding_whitespace() {
    let app = spawn_app().await;
    let token = app.register("alice@example.com").await.access_token;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/player_api.php"))
        .and(query_param("username", " alice"))
        .and(query_param("password", "secret  "))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(2)
        .mount(&upstream)
        .await;

    let mut spaced = account(&upstream.uri());
    spaced.username = " alice".to_owned();
    spaced.password = "secret  ".to_owned();
    let created = app
        .client
        .create_xtream_account(&token, &spaced)
        .await
        .unwrap();
    let result = app
        .client
        .test_xtream_account(&token, created.id)
        .await
        .unwrap();
    assert!(result.ok);

    // Updated credentials are stored as given too.
    app.client
        .update_xtream_account(
            &token,
            created.id,
            &UpdateXtreamAccount {
                username: Some(" alice".to_owned()),
                password: Some("secret  ".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let result = app
        .client
        .test_xtream_account(&token, created.id)
        .await
        .unwrap();
    assert!(result.ok);
}
