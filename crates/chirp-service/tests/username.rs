//! Username selection integration tests.

mod common;

use axum::http::StatusCode;
use chirp_store::Store;
use common::{assert_redirect, TestHarness};

#[tokio::test]
async fn claiming_a_username_creates_image_directory() {
    let harness = TestHarness::new();

    harness.sign_up("uid-alice", "alice").await;

    let alice = harness
        .store
        .get_user(&TestHarness::identity("uid-alice"))
        .unwrap()
        .unwrap();
    assert_eq!(alice.username, "alice");
    assert!(harness.blob_dir.path().join("alice").is_dir());

    let page = harness.get_as("uid-alice", "/").await.text();
    assert!(page.contains("Timeline"));
    assert!(page.contains("@alice"));
}

#[tokio::test]
async fn taken_username_rerenders_form() {
    let harness = TestHarness::new();
    harness.sign_up("uid-alice", "alice").await;

    let (name, value) = TestHarness::cookie("uid-mallory");
    let response = harness
        .server
        .post("/set-username")
        .add_header(name, value)
        .form(&[("username", "alice")])
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("This username is already taken."));

    let mallory = harness
        .store
        .get_user(&TestHarness::identity("uid-mallory"))
        .unwrap()
        .unwrap();
    assert!(mallory.username.is_empty());
}

#[tokio::test]
async fn invalid_username_rerenders_form() {
    let harness = TestHarness::new();
    let (name, value) = TestHarness::cookie("uid-alice");

    let response = harness
        .server
        .post("/set-username")
        .add_header(name, value)
        .form(&[("username", "../etc")])
        .await;

    response.assert_status_ok();
    let page = response.text();
    assert!(page.contains("Choose a username"));
    assert!(page.contains("Username cannot start with a dot."));
    assert!(harness.store.find_user_by_username("../etc").unwrap().is_none());
}

#[tokio::test]
async fn username_cannot_be_changed() {
    let harness = TestHarness::new();
    harness.sign_up("uid-alice", "alice").await;

    let (name, value) = TestHarness::cookie("uid-alice");
    let response = harness
        .server
        .post("/set-username")
        .add_header(name, value)
        .form(&[("username", "alice2")])
        .await;

    assert_redirect(&response, "/");
    assert!(harness.store.find_user_by_username("alice2").unwrap().is_none());
    assert!(harness.store.find_user_by_username("alice").unwrap().is_some());
}

#[tokio::test]
async fn username_page_redirects_once_chosen() {
    let harness = TestHarness::new();

    let response = harness.get_as("uid-alice", "/set-username").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    harness.sign_up("uid-alice", "alice").await;

    let response = harness.get_as("uid-alice", "/set-username").await;
    assert_redirect(&response, "/");
}
