//! Account lifecycle against a mock mail API.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tempbox_api::Client;
use tempbox_core::accounts::{self, ACCOUNTS_FILE, AccountStore};
use tempbox_core::auth::AUTH_FILE;
use tempbox_core::{AuthStore, Error};

struct Fixture {
    _dir: TempDir,
    client: Client,
    auth: AuthStore,
    accounts: AccountStore,
}

async fn fixture(server: &MockServer) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthStore::open(dir.path().join(AUTH_FILE)).await.unwrap();
    let accounts = AccountStore::new(dir.path().join(ACCOUNTS_FILE));
    Fixture {
        client: Client::with_base_url(&server.uri()).unwrap(),
        auth,
        accounts,
        _dir: dir,
    }
}

fn account_json(id: &str, address: &str) -> serde_json::Value {
    json!({
        "@id": format!("/accounts/{id}"),
        "id": id,
        "address": address,
        "quota": 40_000_000,
        "used": 0,
        "isDisabled": false,
        "isDeleted": false,
        "createdAt": "2024-03-01T10:00:00+00:00",
        "updatedAt": "2024-03-01T10:00:00+00:00"
    })
}

async fn mount_account_api(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/accounts"))
        .respond_with(|request: &wiremock::Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            let address = body["address"].as_str().unwrap().to_string();
            ResponseTemplate::new(201).set_body_json(account_json("acc1", &address))
        })
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "jwt", "id": "acc1"})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_account_stores_and_logs_in() {
    let server = MockServer::start().await;
    mount_account_api(&server).await;
    let f = fixture(&server).await;

    let created = accounts::create_account(&f.client, &f.auth, &f.accounts, "me@mail.gw", "s3cret!")
        .await
        .unwrap();
    assert!(created.logged_in);
    assert_eq!(created.account.address, "me@mail.gw");

    let session = f.auth.current().unwrap();
    assert_eq!(session.token, "jwt");
    assert_eq!(session.account_id, "acc1");
    assert_eq!(session.address, "me@mail.gw");

    let stored = f.accounts.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].password, "s3cret!");
}

#[tokio::test]
async fn test_create_account_survives_failed_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(account_json("acc1", "me@mail.gw")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials."})))
        .mount(&server)
        .await;
    let f = fixture(&server).await;

    let created = accounts::create_account(&f.client, &f.auth, &f.accounts, "me@mail.gw", "s3cret!")
        .await
        .unwrap();
    assert!(!created.logged_in);
    assert!(f.auth.current().is_none());
    assert_eq!(f.accounts.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_input_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let f = fixture(&server).await;

    let err = accounts::create_account(&f.client, &f.auth, &f.accounts, "not-an-address", "pw")
        .await
        .unwrap_err();
    match err {
        Error::Validation(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_random_account_uses_active_domain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hydra:member": [
                {"id": "d1", "domain": "inactive.gw", "isActive": false, "isPrivate": false},
                {"id": "d2", "domain": "active.gw", "isActive": true, "isPrivate": false}
            ]
        })))
        .mount(&server)
        .await;
    mount_account_api(&server).await;
    let f = fixture(&server).await;

    let created = accounts::create_random_account(&f.client, &f.auth, &f.accounts)
        .await
        .unwrap();
    let (local, domain) = created.account.address.split_once('@').unwrap();
    assert_eq!(domain, "active.gw");
    assert_eq!(local.len(), 8);
    assert!(local.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_eq!(created.password.len(), 16);
    assert!(created.logged_in);
}

#[tokio::test]
async fn test_random_account_falls_back_without_domains() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hydra:member": []})))
        .mount(&server)
        .await;
    mount_account_api(&server).await;
    let f = fixture(&server).await;

    let created = accounts::create_random_account(&f.client, &f.auth, &f.accounts)
        .await
        .unwrap();
    let suffix = format!("@{}", accounts::service::FALLBACK_DOMAIN);
    assert!(created.account.address.ends_with(&suffix));
}

#[tokio::test]
async fn test_stored_account_login() {
    let server = MockServer::start().await;
    mount_account_api(&server).await;
    let f = fixture(&server).await;
    f.accounts
        .save(accounts::GeneratedAccount::new("acc1", "me@mail.gw", "s3cret!"))
        .await
        .unwrap();

    let state = accounts::login_stored(&f.client, &f.auth, &f.accounts, "me@mail.gw")
        .await
        .unwrap();
    assert_eq!(state.token, "jwt");

    let err = accounts::login_stored(&f.client, &f.auth, &f.accounts, "other@mail.gw")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AccountNotFound(_)));
}

#[tokio::test]
async fn test_delete_current_account_logs_out() {
    let server = MockServer::start().await;
    mount_account_api(&server).await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/accounts/acc1$"))
        .and(header("Authorization", "Bearer jwt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let f = fixture(&server).await;

    accounts::create_account(&f.client, &f.auth, &f.accounts, "me@mail.gw", "s3cret!")
        .await
        .unwrap();
    accounts::delete_current_account(&f.client, &f.auth, &f.accounts)
        .await
        .unwrap();

    assert!(f.auth.current().is_none());
    assert!(f.accounts.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_remote_delete_keeps_local_state() {
    let server = MockServer::start().await;
    mount_account_api(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    let f = fixture(&server).await;

    accounts::create_account(&f.client, &f.auth, &f.accounts, "me@mail.gw", "s3cret!")
        .await
        .unwrap();
    let err = accounts::delete_current_account(&f.client, &f.auth, &f.accounts)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api(ref e) if e.is_rate_limited()));
    assert!(f.auth.current().is_some());
    assert_eq!(f.accounts.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_whoami_needs_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/acc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("acc1", "me@mail.gw")))
        .mount(&server)
        .await;
    mount_account_api(&server).await;
    let f = fixture(&server).await;

    let err = accounts::current_account(&f.client, &f.auth).await.unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));

    accounts::login(&f.client, &f.auth, "me@mail.gw", "s3cret!")
        .await
        .unwrap();
    let account = accounts::current_account(&f.client, &f.auth).await.unwrap();
    assert_eq!(account.address, "me@mail.gw");
}
