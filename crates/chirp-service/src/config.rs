//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Google's published keys for Firebase ID tokens.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Issuer prefix of Firebase ID tokens; the project ID is appended.
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the document store data directory (default: "/data/chirp").
    pub data_dir: String,

    /// Root directory of uploaded images (default: "/data/chirp/blobs").
    pub blob_dir: String,

    /// URL prefix uploaded images are served under (default: "/media").
    pub media_base_url: String,

    /// Firebase project ID; the expected token audience.
    pub firebase_project_id: String,

    /// Firebase web API key, handed to the sign-in page.
    pub firebase_api_key: Option<String>,

    /// Firebase auth domain, handed to the sign-in page.
    pub firebase_auth_domain: Option<String>,

    /// URL of the JWKS document used to verify ID tokens.
    pub jwks_url: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Firebase secrets file structure.
#[derive(Debug, Deserialize)]
struct FirebaseSecrets {
    project_id: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    auth_domain: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (firebase_project_id, firebase_api_key, firebase_auth_domain) =
            load_firebase_secrets();
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/chirp".into());

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            blob_dir: std::env::var("BLOB_DIR").unwrap_or_else(|_| format!("{data_dir}/blobs")),
            data_dir,
            media_base_url: std::env::var("MEDIA_BASE_URL").unwrap_or_else(|_| "/media".into()),
            firebase_project_id,
            firebase_api_key,
            firebase_auth_domain,
            jwks_url: std::env::var("JWKS_URL").unwrap_or_else(|_| DEFAULT_JWKS_URL.into()),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024), // 10MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }

    /// The issuer ID tokens must carry.
    #[must_use]
    pub fn token_issuer(&self) -> String {
        format!("{FIREBASE_ISSUER_PREFIX}{}", self.firebase_project_id)
    }
}

/// Load Firebase settings from file or environment.
fn load_firebase_secrets() -> (String, Option<String>, Option<String>) {
    let secret_paths = [".secrets/firebase.json", "../.secrets/firebase.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<FirebaseSecrets>(path) {
            tracing::info!(path = %path, "Loaded Firebase settings from file");
            return (secrets.project_id, secrets.api_key, secrets.auth_domain);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Firebase secrets file not found, using environment variables");
    (
        std::env::var("FIREBASE_PROJECT_ID").unwrap_or_else(|_| "chirp".into()),
        std::env::var("FIREBASE_API_KEY").ok(),
        std::env::var("FIREBASE_AUTH_DOMAIN").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/chirp".into(),
            blob_dir: "/data/chirp/blobs".into(),
            media_base_url: "/media".into(),
            firebase_project_id: "chirp".into(),
            firebase_api_key: None,
            firebase_auth_domain: None,
            jwks_url: DEFAULT_JWKS_URL.into(),
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_includes_project() {
        let config = ServiceConfig {
            firebase_project_id: "my-project".into(),
            ..ServiceConfig::default()
        };
        assert_eq!(
            config.token_issuer(),
            "https://securetoken.google.com/my-project"
        );
    }

    #[test]
    fn secrets_file_parses() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("firebase.json");
        std::fs::write(
            &path,
            r#"{"project_id": "demo", "api_key": "k", "auth_domain": "demo.firebaseapp.com"}"#,
        )
        .unwrap();

        let secrets: FirebaseSecrets = load_secrets_file(path.to_str().unwrap()).unwrap();
        assert_eq!(secrets.project_id, "demo");
        assert_eq!(secrets.api_key.as_deref(), Some("k"));
        assert!(load_secrets_file::<FirebaseSecrets>("/nonexistent/firebase.json").is_err());
    }
}
