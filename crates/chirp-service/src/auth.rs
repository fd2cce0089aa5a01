//! Identity verification and the session extractor.
//!
//! Every request carries its credential in the `token` cookie: a Firebase ID
//! token set by the sign-in page. The token is verified on every request and
//! nothing is kept server-side between requests. A missing token and a token
//! that fails verification are indistinguishable to handlers; both produce an
//! anonymous [`Session`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use chirp_core::IdentityKey;

use crate::config::ServiceConfig;
use crate::state::AppState;

// ============================================================================
// Constants
// ============================================================================

/// Name of the cookie holding the ID token.
pub const SESSION_COOKIE: &str = "token";

/// How long to cache JWKS keys before refreshing.
const JWKS_CACHE_DURATION: Duration = Duration::from_secs(3600); // 1 hour

/// Minimum time between JWKS fetches triggered by an unknown key id.
const JWKS_MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Timeout for JWKS fetch requests.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Claims of a successfully verified ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedClaims {
    /// The user's identity key (`sub` claim).
    pub identity: IdentityKey,
    /// The user's email address, if the provider shared it.
    pub email: Option<String>,
}

/// Verifies bearer credentials against an identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a token, returning its claims or `None` if it is not valid.
    async fn verify(&self, token: &str) -> Option<VerifiedClaims>;
}

/// The identity behind the current request, if any.
#[derive(Debug, Clone)]
pub struct Session(pub Option<VerifiedClaims>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Session(None));
        };

        let claims = state.verifier.verify(token).await;
        if claims.is_none() {
            tracing::debug!("Session token rejected, treating request as anonymous");
        }
        Ok(Session(claims))
    }
}

/// Extract the session token from the request cookies.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

// ============================================================================
// Firebase ID token verification
// ============================================================================

/// JWT claims structure for Firebase ID tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (Firebase uid).
    pub sub: String,
    /// Audience (the Firebase project ID).
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    pub iat: i64,
    /// Email address of the account, if any.
    #[serde(default)]
    pub email: Option<String>,
}

/// JWKS (JSON Web Key Set) response structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    /// List of JWK keys.
    pub keys: Vec<Jwk>,
}

/// Single JSON Web Key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: String,
    /// Key ID.
    pub kid: Option<String>,
    /// Algorithm (e.g., "RS256").
    pub alg: Option<String>,
    /// RSA public key modulus (base64url encoded).
    pub n: Option<String>,
    /// RSA public key exponent (base64url encoded).
    pub e: Option<String>,
    /// Key use (e.g., "sig" for signature).
    #[serde(rename = "use")]
    pub key_use: Option<String>,
}

/// Cached signing keys.
struct KeyCache {
    /// Cached keys mapped by kid.
    keys: HashMap<String, DecodingKey>,
    /// Default key (for tokens without kid).
    default_key: Option<DecodingKey>,
    /// When the cache was last updated; `None` forces a fetch.
    last_updated: Option<Instant>,
}

impl KeyCache {
    fn is_expired(&self) -> bool {
        self.last_updated
            .map_or(true, |at| at.elapsed() >= JWKS_CACHE_DURATION)
    }

    /// Whether a cache miss may trigger another fetch yet.
    fn may_refetch(&self) -> bool {
        self.last_updated
            .map_or(true, |at| at.elapsed() >= JWKS_MIN_REFETCH_INTERVAL)
    }
}

/// Verifies Firebase ID tokens against Google's published keys.
pub struct FirebaseVerifier {
    /// Reusable HTTP client for JWKS fetches.
    client: reqwest::Client,
    jwks_url: String,
    audience: String,
    issuer: String,
    cache: RwLock<KeyCache>,
}

impl FirebaseVerifier {
    /// Create a verifier for the configured project.
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            jwks_url: config.jwks_url.clone(),
            audience: config.firebase_project_id.clone(),
            issuer: config.token_issuer(),
            cache: RwLock::new(KeyCache {
                keys: HashMap::new(),
                default_key: None,
                last_updated: None,
            }),
        }
    }

    /// Validate a token, reporting why it was rejected.
    async fn validate(&self, token: &str) -> Result<JwtClaims, String> {
        let header = decode_header(token).map_err(|e| format!("bad header: {e}"))?;

        let decoding_key = self.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let token_data = decode::<JwtClaims>(token, &decoding_key, &validation)
            .map_err(|e| format!("validation failed: {e}"))?;

        Ok(token_data.claims)
    }

    /// Get a decoding key from cache or fetch from the JWKS endpoint.
    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, String> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if !cache.is_expired() {
                let cached = match kid {
                    Some(kid) => cache.keys.get(kid),
                    None => cache.default_key.as_ref(),
                };
                if let Some(key) = cached {
                    return Ok(key.clone());
                }
                if !cache.may_refetch() {
                    return Err(format!("no signing key for kid {kid:?}, refetch throttled"));
                }
            }
        }

        // Cache miss or expired - fetch JWKS
        let jwks = self.fetch_jwks().await?;

        let mut cache = self.cache.write().await;
        cache.keys.clear();
        cache.default_key = None;
        cache.last_updated = Some(Instant::now());

        for jwk in &jwks.keys {
            if let Some(decoding_key) = jwk_to_decoding_key(jwk) {
                if let Some(ref key_kid) = jwk.kid {
                    cache.keys.insert(key_kid.clone(), decoding_key.clone());
                }
                // Set first key as default
                if cache.default_key.is_none() {
                    cache.default_key = Some(decoding_key);
                }
            }
        }

        let key = match kid {
            Some(kid) => cache.keys.get(kid),
            None => cache.default_key.as_ref(),
        };
        key.cloned()
            .ok_or_else(|| format!("no signing key for kid {kid:?}"))
    }

    /// Fetch JWKS from the identity provider.
    async fn fetch_jwks(&self) -> Result<Jwks, String> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self.client.get(&self.jwks_url).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %self.jwks_url, "Failed to fetch JWKS");
            format!("JWKS fetch failed: {e}")
        })?;

        if !response.status().is_success() {
            tracing::error!(
                status = %response.status(),
                url = %self.jwks_url,
                "JWKS fetch returned non-success status"
            );
            return Err(format!("JWKS fetch returned {}", response.status()));
        }

        let jwks: Jwks = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JWKS response");
            format!("JWKS parse failed: {e}")
        })?;

        tracing::info!(keys_count = %jwks.keys.len(), "JWKS fetched successfully");

        Ok(jwks)
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Option<VerifiedClaims> {
        let claims = match self.validate(token).await {
            Ok(claims) => claims,
            Err(reason) => {
                tracing::debug!(reason = %reason, "ID token rejected");
                return None;
            }
        };

        let identity = claims.sub.parse::<IdentityKey>().ok()?;
        Some(VerifiedClaims {
            identity,
            email: claims.email,
        })
    }
}

/// Convert a JWK to a `DecodingKey`.
fn jwk_to_decoding_key(jwk: &Jwk) -> Option<DecodingKey> {
    // Only support RSA keys for now
    if jwk.kty != "RSA" {
        tracing::debug!(kty = %jwk.kty, "Skipping non-RSA JWK");
        return None;
    }

    let n = jwk.n.as_ref()?;
    let e = jwk.e.as_ref()?;

    DecodingKey::from_rsa_components(n, e).ok()
}
