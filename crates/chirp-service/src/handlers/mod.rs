//! Page handlers.
//!
//! Every handler first resolves the [`Viewer`] behind the request:
//!
//! - **Anonymous** - no valid session; the landing page is rendered.
//! - **`NeedsUsername`** - signed in but no username yet; the username form is
//!   rendered instead of the requested page.
//! - **Ready** - the requested action runs.

pub mod health;
pub mod home;
pub mod profile;
pub mod search;
pub mod tweets;
pub mod username;

use axum::extract::rejection::FormRejection;
use axum::response::{IntoResponse, Response};
use axum::Form;
use chrono::{DateTime, Utc};
use minijinja::{context, Value};
use serde::Serialize;

use chirp_core::{ChirpError, Tweet, User};

use crate::auth::{Session, VerifiedClaims};
use crate::error::ApiError;
use crate::state::AppState;

/// Who is making the request.
#[derive(Debug)]
pub enum Viewer {
    /// No valid session.
    Anonymous,
    /// Signed in, username not chosen yet.
    NeedsUsername {
        /// Verified token claims.
        claims: VerifiedClaims,
        /// The freshly loaded user document.
        user: User,
    },
    /// Signed in with a username.
    Ready {
        /// Verified token claims.
        claims: VerifiedClaims,
        /// The freshly loaded user document.
        user: User,
    },
}

impl Viewer {
    /// Resolve the viewer for a session, creating the user document on first
    /// sight of a new identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the user document cannot be loaded or created.
    pub fn resolve(state: &AppState, session: Session) -> Result<Self, ApiError> {
        let Some(claims) = session.0 else {
            return Ok(Self::Anonymous);
        };

        let user = state.store.get_or_create_user(&claims.identity)?;
        if user.has_username() {
            Ok(Self::Ready { claims, user })
        } else {
            Ok(Self::NeedsUsername { claims, user })
        }
    }
}

/// Resolve the viewer, or produce the page to show instead of the requested
/// one.
///
/// # Errors
///
/// Returns an error if the viewer cannot be resolved or the fallback page
/// fails to render.
pub fn require_ready(
    state: &AppState,
    session: Session,
) -> Result<Result<(VerifiedClaims, User), Response>, ApiError> {
    match Viewer::resolve(state, session)? {
        Viewer::Anonymous => Ok(Err(landing_page(state)?)),
        Viewer::NeedsUsername { claims, user } => {
            Ok(Err(username_form(state, &claims, &user, &[], "")?))
        }
        Viewer::Ready { claims, user } => Ok(Ok((claims, user))),
    }
}

/// The signed-in user, as shown in page chrome.
#[derive(Debug, Serialize)]
pub struct ViewerInfo {
    /// Username, empty if not chosen yet.
    pub username: String,
    /// Email address from the token, if any.
    pub email: Option<String>,
}

/// A tweet as rendered in lists.
#[derive(Debug, Serialize)]
pub struct TweetView {
    /// Newest-first position in the viewer's own log, when it is editable.
    pub position: Option<usize>,
    /// Author username.
    pub author: String,
    /// Posting time, formatted for display.
    pub posted_at: String,
    /// Text content.
    pub body: String,
    /// Attached image, if any.
    pub image_url: Option<String>,
}

impl TweetView {
    /// A read-only view of a tweet.
    #[must_use]
    pub fn new(tweet: &Tweet) -> Self {
        Self {
            position: None,
            author: tweet.author.clone(),
            posted_at: format_time(tweet.created_at),
            body: tweet.body.clone(),
            image_url: tweet.image_url.clone(),
        }
    }

    /// A view of one of the viewer's own tweets, with edit and delete links.
    #[must_use]
    pub fn owned(tweet: &Tweet, position: usize) -> Self {
        Self {
            position: Some(position),
            ..Self::new(tweet)
        }
    }
}

/// Unwrap a form body.
///
/// Handlers take the body as a `Result` so that a visitor without a usable
/// session gets the landing page or username form, whatever they posted.
/// Call this only once the viewer is resolved.
pub fn form_body<T>(body: Result<Form<T>, FormRejection>) -> Result<T, ApiError> {
    body.map(|Form(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// The user-facing text of a validation error.
pub fn form_message(err: ChirpError) -> String {
    match err {
        ChirpError::InvalidUsername(msg) | ChirpError::InvalidTweet(msg) => msg,
        other => other.to_string(),
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The context shared by every page: viewer, sign-in settings and errors.
pub fn base_context(state: &AppState, viewer: Option<ViewerInfo>, errors: &[String]) -> Value {
    context! {
        viewer => viewer,
        errors => errors,
        firebase => context! {
            api_key => state.config.firebase_api_key,
            auth_domain => state.config.firebase_auth_domain,
            project_id => state.config.firebase_project_id,
        },
    }
}

/// Base context for a signed-in user.
pub fn signed_in_context(
    state: &AppState,
    claims: &VerifiedClaims,
    user: &User,
    errors: &[String],
) -> Value {
    base_context(
        state,
        Some(ViewerInfo {
            username: user.username.clone(),
            email: claims.email.clone(),
        }),
        errors,
    )
}

/// The public landing page with the sign-in form.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn landing_page(state: &AppState) -> Result<Response, ApiError> {
    let ctx = context! { tweets => Vec::<TweetView>::new(), ..base_context(state, None, &[]) };
    Ok(state.templates.render("main.html", ctx)?.into_response())
}

/// The username form, optionally with errors and the rejected input.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn username_form(
    state: &AppState,
    claims: &VerifiedClaims,
    user: &User,
    errors: &[String],
    attempted: &str,
) -> Result<Response, ApiError> {
    let ctx = context! {
        username => attempted,
        ..signed_in_context(state, claims, user, errors)
    };
    Ok(state
        .templates
        .render("set-username.html", ctx)?
        .into_response())
}
