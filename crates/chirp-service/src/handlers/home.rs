//! The home page.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use minijinja::context;

use chirp_store::build_timeline;

use super::{landing_page, username_form, signed_in_context, TweetView, Viewer};
use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /` - landing page, username form or timeline depending on the viewer.
pub async fn home(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    match Viewer::resolve(&state, session)? {
        Viewer::Anonymous => landing_page(&state),
        Viewer::NeedsUsername { claims, user } => username_form(&state, &claims, &user, &[], ""),
        Viewer::Ready { claims, user } => {
            let tweets: Vec<TweetView> = build_timeline(state.store.as_ref(), &user)?
                .iter()
                .map(TweetView::new)
                .collect();

            let ctx = context! {
                tweets => tweets,
                ..signed_in_context(&state, &claims, &user, &[])
            };
            Ok(state.templates.render("main.html", ctx)?.into_response())
        }
    }
}
