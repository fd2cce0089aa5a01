//! Profiles and the follow graph.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use minijinja::context;
use serde::Serialize;

use chirp_core::User;

use super::{require_ready, signed_in_context, TweetView};
use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// How many tweets another user's profile shows.
pub const PROFILE_TWEET_LIMIT: usize = 10;

/// Profile header data.
#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    username: &'a str,
    following: usize,
    followers: usize,
    is_self: bool,
    is_following: bool,
}

impl<'a> ProfileView<'a> {
    fn new(person: &'a User, viewer: &User) -> Self {
        Self {
            username: &person.username,
            following: person.following.len(),
            followers: person.followers.len(),
            is_self: person.identity == viewer.identity,
            is_following: viewer.is_following(&person.username),
        }
    }
}

/// `GET /profile` - the viewer's own tweets, newest first, with edit and
/// delete links.
pub async fn own_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };

    // Positions index the log itself so they stay aligned with `tweet_at`.
    let mut tweets = Vec::with_capacity(user.tweets.len());
    for (position, id) in user.tweets.iter().rev().enumerate() {
        if let Some(tweet) = state.store.get_tweet(id)? {
            tweets.push(TweetView::owned(&tweet, position));
        }
    }

    let ctx = context! {
        profile => ProfileView::new(&user, &user),
        tweets => tweets,
        ..signed_in_context(&state, &claims, &user, &[])
    };
    Ok(state
        .templates
        .render("view-profile.html", ctx)?
        .into_response())
}

/// `GET /view-profile/{person}` - another user's profile and recent tweets.
pub async fn view_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(person): Path<String>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };

    if person == user.username {
        return Ok(Redirect::to("/profile").into_response());
    }

    let profile = state
        .store
        .find_user_by_username(&person)?
        .ok_or_else(|| ApiError::NotFound(format!("no user named {person}")))?;

    let tweets: Vec<TweetView> = state
        .store
        .tweets_of(&profile)?
        .iter()
        .take(PROFILE_TWEET_LIMIT)
        .map(TweetView::new)
        .collect();

    let ctx = context! {
        profile => ProfileView::new(&profile, &user),
        tweets => tweets,
        ..signed_in_context(&state, &claims, &user, &[])
    };
    Ok(state
        .templates
        .render("view-profile.html", ctx)?
        .into_response())
}

/// `POST /follow/{person}`
pub async fn follow(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(person): Path<String>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };

    state.store.follow(&claims.identity, &person)?;
    tracing::debug!(follower = %user.username, followee = %person, "Followed");

    Ok(Redirect::to(&profile_path(&person)).into_response())
}

/// `POST /unfollow/{person}`
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(person): Path<String>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };

    state.store.unfollow(&claims.identity, &person)?;
    tracing::debug!(follower = %user.username, followee = %person, "Unfollowed");

    Ok(Redirect::to(&profile_path(&person)).into_response())
}

// Usernames are restricted to URL-safe characters, so no escaping is needed.
fn profile_path(username: &str) -> String {
    format!("/view-profile/{username}")
}
