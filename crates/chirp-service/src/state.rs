//! Application state.

use std::sync::Arc;

use chirp_store::{BlobStore, Store};

use crate::auth::IdentityVerifier;
use crate::config::ServiceConfig;
use crate::templates::Templates;

/// Application state shared across handlers.
///
/// Every client is constructed once at startup and lives as long as the
/// process.
#[derive(Clone)]
pub struct AppState {
    /// The document store.
    pub store: Arc<dyn Store>,

    /// The blob store for image attachments.
    pub blobs: Arc<dyn BlobStore>,

    /// Verifier for session tokens.
    pub verifier: Arc<dyn IdentityVerifier>,

    /// Compiled page templates.
    pub templates: Arc<Templates>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        verifier: Arc<dyn IdentityVerifier>,
        config: ServiceConfig,
    ) -> Self {
        if config.firebase_api_key.is_none() {
            tracing::warn!("Firebase web API key not configured - sign-in page will not load");
        }

        Self {
            store,
            blobs,
            verifier,
            templates: Arc::new(Templates::new()),
            config,
        }
    }
}
