//! Common test utilities for chirp integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::{COOKIE, LOCATION};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use tempfile::TempDir;

use chirp_core::IdentityKey;
use chirp_service::{create_router, AppState, IdentityVerifier, ServiceConfig, VerifiedClaims};
use chirp_store::{BlobStore, FsBlobStore, MemoryStore, Store, StoredBlob};

/// Prefix of tokens accepted by [`StaticVerifier`]; the rest is the uid.
pub const TEST_TOKEN_PREFIX: &str = "test-token:";

/// Accepts `test-token:<uid>` and rejects everything else.
pub struct StaticVerifier;

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Option<VerifiedClaims> {
        let uid = token.strip_prefix(TEST_TOKEN_PREFIX)?;
        Some(VerifiedClaims {
            identity: uid.parse().ok()?,
            email: Some(format!("{uid}@example.com")),
        })
    }
}

/// Filesystem blob store that counts the calls made to it.
pub struct CountingBlobStore {
    inner: FsBlobStore,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingBlobStore {
    pub fn new(inner: FsBlobStore) -> Self {
        Self {
            inner,
            uploads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Number of `upload` calls so far.
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls so far.
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for CountingBlobStore {
    async fn upload(
        &self,
        directory: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> chirp_store::Result<StoredBlob> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.inner.upload(directory, file_name, data).await
    }

    async fn delete(&self, key: &str) -> chirp_store::Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn create_directory(&self, name: &str) -> chirp_store::Result<()> {
        self.inner.create_directory(name).await
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The document store behind the server.
    pub store: Arc<MemoryStore>,
    /// The blob store behind the server, counting its calls.
    pub blobs: Arc<CountingBlobStore>,
    /// Temporary directory for uploaded images (kept alive for test duration).
    pub blob_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with an empty store.
    pub fn new() -> Self {
        let blob_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(MemoryStore::new());

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: blob_dir.path().to_string_lossy().to_string(),
            blob_dir: blob_dir.path().to_string_lossy().to_string(),
            media_base_url: "/media".into(),
            firebase_project_id: "chirp-test".into(),
            firebase_api_key: Some("test-api-key".into()),
            firebase_auth_domain: Some("chirp-test.firebaseapp.com".into()),
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            ..ServiceConfig::default()
        };

        let blobs = Arc::new(CountingBlobStore::new(FsBlobStore::new(
            blob_dir.path(),
            "/media",
        )));
        let state = AppState::new(store.clone(), blobs.clone(), Arc::new(StaticVerifier), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            blobs,
            blob_dir,
        }
    }

    /// Cookie header for a signed-in uid.
    pub fn cookie(uid: &str) -> (HeaderName, HeaderValue) {
        let value = format!("token={TEST_TOKEN_PREFIX}{uid}");
        (COOKIE, HeaderValue::from_str(&value).expect("valid cookie"))
    }

    /// Cookie header carrying a token the verifier rejects.
    pub fn bad_cookie() -> (HeaderName, HeaderValue) {
        (COOKIE, HeaderValue::from_static("token=forged"))
    }

    /// Sign `uid` in and claim `username` for it.
    pub async fn sign_up(&self, uid: &str, username: &str) {
        let (name, value) = Self::cookie(uid);
        let response = self
            .server
            .post("/set-username")
            .add_header(name, value)
            .form(&[("username", username)])
            .await;
        assert_redirect(&response, "/");
    }

    /// Post a tweet as `uid`, optionally with an image.
    pub async fn post_tweet(&self, uid: &str, body: &str, image: Option<&[u8]>) -> TestResponse {
        let (name, value) = Self::cookie(uid);
        let mut form = MultipartForm::new().add_text("tweet", body);
        if let Some(bytes) = image {
            form = form.add_part(
                "tweetImage",
                Part::bytes(bytes.to_vec())
                    .file_name("photo.png")
                    .mime_type("image/png"),
            );
        }
        self.server
            .post("/post")
            .add_header(name, value)
            .multipart(form)
            .await
    }

    /// GET a page as `uid`.
    pub async fn get_as(&self, uid: &str, path: &str) -> TestResponse {
        let (name, value) = Self::cookie(uid);
        self.server.get(path).add_header(name, value).await
    }

    /// The identity key for a uid.
    pub fn identity(uid: &str) -> IdentityKey {
        uid.parse().expect("valid identity")
    }

    /// Number of image files currently in blob storage.
    pub fn blob_count(&self) -> usize {
        count_files(self.blob_dir.path())
    }

    /// Tweet count of a user's log.
    pub fn tweet_count(&self, uid: &str) -> usize {
        self.store
            .get_user(&Self::identity(uid))
            .expect("store read")
            .map_or(0, |u| u.tweets.len())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        count_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

/// Assert a See Other redirect to `location`.
pub fn assert_redirect(response: &TestResponse, location: &str) {
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), location);
}
