//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, home, profile, search, tweets, username};
use crate::state::AppState;

/// Maximum concurrent requests for page routes.
const PAGE_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /media/*` - Uploaded images, when served locally
///
/// ## Pages (session cookie; anonymous visitors get the landing page)
/// - `GET /` - Timeline
/// - `GET|POST /set-username` - Choose a username
/// - `GET /profile` - Own tweets
/// - `GET|POST /post` - Compose a tweet
/// - `POST /search-username` - Search users by name prefix
/// - `POST /search-tweet` - Search tweets by body prefix
/// - `GET /view-profile/{person}` - Another user's profile
/// - `POST /follow/{person}` - Follow a user
/// - `POST /unfollow/{person}` - Unfollow a user
/// - `GET /edit-tweet/{index}` - Edit form for an own tweet
/// - `POST /edit-tweet` - Save an edit
/// - `POST /delete-tweet` - Delete an own tweet
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;
    let media = media_mount(&state.config.media_base_url).map(|path| {
        (path.to_string(), ServeDir::new(&state.config.blob_dir))
    });

    let state = Arc::new(state);

    let pages = Router::new()
        .route("/", get(home::home))
        .route(
            "/set-username",
            get(username::username_page).post(username::set_username),
        )
        .route("/profile", get(profile::own_profile))
        .route("/post", get(tweets::compose).post(tweets::post_tweet))
        .route("/search-username", post(search::search_username))
        .route("/search-tweet", post(search::search_tweet))
        .route("/view-profile/:person", get(profile::view_profile))
        .route("/follow/:person", post(profile::follow))
        .route("/unfollow/:person", post(profile::unfollow))
        .route(
            "/edit-tweet",
            get(tweets::edit_page_bare).post(tweets::edit_tweet),
        )
        .route("/edit-tweet/:index", get(tweets::edit_page_at))
        .route("/delete-tweet", post(tweets::delete_tweet))
        .layer(ConcurrencyLimitLayer::new(PAGE_MAX_CONCURRENT_REQUESTS));

    let mut router = Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .merge(pages);

    if let Some((path, serve_dir)) = media {
        router = router.nest_service(&path, serve_dir);
    }

    router
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// The local path to serve uploads under, if uploads are not hosted
/// elsewhere.
fn media_mount(media_base_url: &str) -> Option<&str> {
    let path = media_base_url.trim_end_matches('/');
    (path.starts_with('/') && path.len() > 1).then_some(path)
}
