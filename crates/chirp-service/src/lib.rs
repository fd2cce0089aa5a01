//! Chirp HTTP service.
//!
//! Server-rendered pages for a small micro-blogging site:
//!
//! - Sign-in through Firebase ID tokens carried in a cookie
//! - Usernames, timelines and profiles
//! - Posting, editing and deleting tweets with optional images
//! - Prefix search over users and tweets
//!
//! # Authentication
//!
//! Every request is authenticated independently from the `token` cookie.
//! Requests without a valid token see the landing page whatever route they
//! ask for.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for the router

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod templates;

pub use auth::{FirebaseVerifier, IdentityVerifier, Session, VerifiedClaims};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use templates::Templates;
