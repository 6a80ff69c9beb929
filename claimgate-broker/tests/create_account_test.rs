//! Tests for the account creation endpoint

mod common;

use claimgate_core::{AccountId, RegistryStore};
use common::{case, create_test_server, login, SESSION_COOKIE};
use serde_json::Value;

/// Test: account creation requires an active session
#[tokio::test]
async fn test_create_account_requires_login() {
    let (server, _, _) = create_test_server();

    let response = server.post("/api/create_account").await;
    assert_eq!(response.status_code(), 401);
}

/// Test: a credible identity with a free address creates an account and
/// the address is assigned to it
#[tokio::test]
async fn test_create_account_assigns_address() {
    let (server, _, store) = create_test_server();

    let session = login(&server, &case("com", "joe", None)).await;
    let response = server
        .post("/api/create_account")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    let account = AccountId(body["account"].as_u64().unwrap());
    assert_eq!(
        store.assigned_account("joe@example.com").unwrap(),
        Some(account)
    );
}

/// Test: an already-linked identity cannot create a second account
#[tokio::test]
async fn test_create_account_twice_conflicts() {
    let (server, _, _) = create_test_server();

    let session = login(&server, &case("com", "joe", None)).await;
    let response = server
        .post("/api/create_account")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session.clone()))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/api/create_account")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;
    assert_eq!(response.status_code(), 409);
}

/// Test: an identity claiming an owned address is not eligible
#[tokio::test]
async fn test_create_account_denied_for_owned_address() {
    let (server, _, store) = create_test_server();
    store.seed_assignment("admin@example.org", AccountId(1));

    let session = login(&server, &case("org", "admin", None)).await;
    let response = server
        .post("/api/create_account")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session))
        .await;
    assert_eq!(response.status_code(), 403);
}
