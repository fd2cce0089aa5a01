//! Choosing a username.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use chirp_core::validate_username;
use chirp_store::StoreError;

use super::{form_body, form_message, landing_page, username_form, Viewer};
use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// Shown when another account already holds the requested name.
pub const USERNAME_TAKEN_MESSAGE: &str = "This username is already taken.";

/// Username form body.
#[derive(Debug, Deserialize)]
pub struct UsernameForm {
    /// Requested username.
    pub username: String,
}

/// `GET /set-username` - the username form.
pub async fn username_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    match Viewer::resolve(&state, session)? {
        Viewer::Anonymous => landing_page(&state),
        Viewer::NeedsUsername { claims, user } => username_form(&state, &claims, &user, &[], ""),
        Viewer::Ready { .. } => Ok(Redirect::to("/").into_response()),
    }
}

/// `POST /set-username` - claim a username.
///
/// On success the user's image directory is created and the browser goes
/// home. Invalid or taken names re-render the form with the error.
pub async fn set_username(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Result<Form<UsernameForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let (claims, user) = match Viewer::resolve(&state, session)? {
        Viewer::Anonymous => return landing_page(&state),
        Viewer::Ready { .. } => return Ok(Redirect::to("/").into_response()),
        Viewer::NeedsUsername { claims, user } => (claims, user),
    };
    let form = form_body(form)?;

    let requested = form.username.trim();
    if let Err(e) = validate_username(requested) {
        return username_form(&state, &claims, &user, &[form_message(e)], requested);
    }

    match state.store.set_username(&claims.identity, requested) {
        Ok(_) => {}
        Err(StoreError::UsernameTaken { .. }) => {
            return username_form(
                &state,
                &claims,
                &user,
                &[USERNAME_TAKEN_MESSAGE.to_string()],
                requested,
            );
        }
        Err(StoreError::UsernameAlreadySet) => return Ok(Redirect::to("/").into_response()),
        Err(e) => return Err(e.into()),
    }

    state.blobs.create_directory(requested).await?;

    tracing::info!(identity = %claims.identity, username = %requested, "Username claimed");

    Ok(Redirect::to("/").into_response())
}
