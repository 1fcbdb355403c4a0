//! Mock HTTP server tests for the mail.gw client.
//!
//! Uses [`wiremock`] to emulate the service so the full request/response
//! path runs without touching the real API.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tempbox_api::{Client, Error};

fn client(server: &MockServer) -> Client {
    Client::with_base_url(&server.uri()).unwrap()
}

fn authed(server: &MockServer) -> Client {
    client(server).with_token("jwt-token")
}

fn summary(id: &str, created_at: &str) -> serde_json::Value {
    json!({
        "@id": format!("/messages/{id}"),
        "@type": "Message",
        "id": id,
        "accountId": "/accounts/acc1",
        "msgid": format!("<{id}@example.com>"),
        "from": {"address": "alice@example.com", "name": "Alice"},
        "to": [{"address": "me@mail.gw", "name": ""}],
        "subject": "Hello",
        "intro": "Hi there",
        "seen": false,
        "isDeleted": false,
        "hasAttachments": false,
        "size": 1200,
        "downloadUrl": format!("/messages/{id}/download"),
        "createdAt": created_at,
        "updatedAt": created_at
    })
}

#[tokio::test]
async fn test_domains_are_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains"))
        .and(header("Accept", "application/ld+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hydra:member": [
                {"id": "d1", "domain": "mail.gw", "isActive": true, "isPrivate": false},
                {"id": "d2", "domain": "example.gw", "isActive": false, "isPrivate": false}
            ],
            "hydra:totalItems": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let domains = client(&server).domains().await.unwrap();
    assert_eq!(domains.len(), 2);
    assert_eq!(domains[0].domain, "mail.gw");
    assert!(domains[0].is_active);
    assert!(!domains[1].is_active);
}

#[tokio::test]
async fn test_login_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_json(json!({"address": "me@mail.gw", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-token", "id": "acc1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = client(&server).login("me@mail.gw", "pw").await.unwrap();
    assert_eq!(token.token, "jwt-token");
    assert_eq!(token.id, "acc1");
}

#[tokio::test]
async fn test_create_account_reports_conflict_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "@type": "ConstraintViolationList",
            "hydra:title": "An error occurred",
            "hydra:description": "address: This value is already used."
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_account("taken@mail.gw", "pw")
        .await
        .unwrap_err();
    match err {
        Error::Status { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "address: This value is already used.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_messages_listed_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/messages"))
        .and(header("Authorization", "Bearer jwt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hydra:member": [
                summary("m1", "2024-03-01T10:00:00+00:00"),
                summary("m2", "2024-03-02T10:00:00+00:00")
            ],
            "hydra:totalItems": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = authed(&server).list_messages().await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, "m1");
    assert_eq!(messages[0].sender().to_string(), "Alice <alice@example.com>");
}

#[tokio::test]
async fn test_calls_without_token_fail_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server).list_messages().await.unwrap_err();
    assert!(matches!(err, Error::MissingToken));
}

#[tokio::test]
async fn test_rate_limit_is_recognised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = authed(&server).list_messages().await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.status_code(), Some(429));
    assert_eq!(err.to_string(), "API error 429: Too Many Requests");
}

#[tokio::test]
async fn test_message_fetched_with_html_parts() {
    let server = MockServer::start().await;
    let mut body = summary("m1", "2024-03-01T10:00:00+00:00");
    body["text"] = json!("hello");
    body["html"] = json!(["<p>hello</p>"]);
    body["cc"] = json!([]);
    body["bcc"] = json!([]);
    body["flagged"] = json!(false);
    body["attachments"] = json!([]);
    Mock::given(method("GET"))
        .and(path("/messages/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let message = authed(&server).message("m1").await.unwrap();
    assert_eq!(message.html_body().as_deref(), Some("<p>hello</p>"));
    assert_eq!(message.text.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_mark_read_sends_merge_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/messages/m1"))
        .and(header("Content-Type", "application/merge-patch+json"))
        .and(body_json(json!({"seen": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"seen": true})))
        .expect(1)
        .mount(&server)
        .await;

    authed(&server).mark_read("m1").await.unwrap();
}

#[tokio::test]
async fn test_delete_message_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/messages/m1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    authed(&server).delete_message("m1").await.unwrap();
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hydra:member": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::with_base_url(&format!("{}/api", server.uri())).unwrap();
    assert!(client.domains().await.unwrap().is_empty());
}
