//! Prefix search over usernames and tweet bodies.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Form;
use minijinja::context;
use serde::{Deserialize, Serialize};

use chirp_store::{search_tweets, search_users};

use super::{form_body, require_ready, signed_in_context, TweetView};
use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// User search form body.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// Username prefix.
    #[serde(default)]
    pub username: String,
}

/// Tweet search form body.
#[derive(Debug, Deserialize)]
pub struct TweetQuery {
    /// Body prefix.
    #[serde(default)]
    pub content: String,
}

/// A user search hit.
#[derive(Debug, Serialize)]
struct UserHit {
    username: String,
    followers: usize,
}

/// `POST /search-username` - users whose name starts with the query.
pub async fn search_username(
    State(state): State<Arc<AppState>>,
    session: Session,
    query: Result<Form<UserQuery>, FormRejection>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };
    let query = form_body(query)?;

    let users: Vec<UserHit> = search_users(state.store.as_ref(), &query.username)?
        .into_iter()
        .map(|u| UserHit {
            followers: u.followers.len(),
            username: u.username,
        })
        .collect();
    tracing::debug!(query = %query.username, hits = users.len(), "User search");

    let ctx = context! {
        query => query.username,
        users => users,
        ..signed_in_context(&state, &claims, &user, &[])
    };
    Ok(state
        .templates
        .render("user-search-results.html", ctx)?
        .into_response())
}

/// `POST /search-tweet` - tweets whose body starts with the query.
pub async fn search_tweet(
    State(state): State<Arc<AppState>>,
    session: Session,
    query: Result<Form<TweetQuery>, FormRejection>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };
    let query = form_body(query)?;

    let tweets: Vec<TweetView> = search_tweets(state.store.as_ref(), &query.content)?
        .iter()
        .map(TweetView::new)
        .collect();
    tracing::debug!(query = %query.content, hits = tweets.len(), "Tweet search");

    let ctx = context! {
        query => query.content,
        tweets => tweets,
        ..signed_in_context(&state, &claims, &user, &[])
    };
    Ok(state
        .templates
        .render("tweet-search-results.html", ctx)?
        .into_response())
}
