//! Posting, editing and deleting tweets.

use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::rejection::FormRejection;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use minijinja::context;
use serde::{Deserialize, Serialize};

use chirp_core::{validate_tweet_body, ImageRef, Tweet, TweetId, TweetUpdate, User};

use super::{form_body, form_message, require_ready, signed_in_context};
use crate::auth::{Session, VerifiedClaims};
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Multipart form
// ============================================================================

/// An uploaded image file.
#[derive(Debug)]
struct Upload {
    file_name: String,
    data: Vec<u8>,
}

/// Fields of the post and edit forms.
#[derive(Debug, Default)]
struct TweetForm {
    tweet_id: Option<String>,
    body: Option<String>,
    image: Option<Upload>,
}

impl TweetForm {
    /// Read the multipart body. An empty file input means no image.
    async fn read(multipart: Result<Multipart, MultipartRejection>) -> Result<Self, ApiError> {
        let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("malformed form: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "tweet" => form.body = Some(read_text(field).await?),
                "tweet_id" => form.tweet_id = Some(read_text(field).await?),
                "tweetImage" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_owned);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("malformed upload: {e}")))?;

                    if file_name.is_empty() || data.is_empty() {
                        continue;
                    }
                    if content_type.is_some_and(|ct| !ct.starts_with("image/")) {
                        return Err(ApiError::BadRequest("only images can be attached".into()));
                    }
                    form.image = Some(Upload {
                        file_name,
                        data: data.to_vec(),
                    });
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn body(&self) -> Result<&str, ApiError> {
        self.body
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("missing field: tweet".into()))
    }
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed form: {e}")))
}

/// Store an upload under the author's directory.
async fn store_image(state: &AppState, user: &User, upload: Upload) -> Result<ImageRef, ApiError> {
    let stored = state
        .blobs
        .upload(&user.username, &upload.file_name, upload.data)
        .await?;
    Ok(ImageRef {
        url: stored.public_url,
        blob_key: stored.key,
    })
}

/// Best-effort removal of a blob that is no longer referenced.
async fn discard_blob(state: &AppState, key: &str) {
    if let Err(e) = state.blobs.delete(key).await {
        tracing::warn!(key = %key, error = %e, "Failed to delete blob");
    }
}

// ============================================================================
// Post
// ============================================================================

fn compose_page(
    state: &AppState,
    claims: &VerifiedClaims,
    user: &User,
    errors: &[String],
    body: &str,
) -> Result<Response, ApiError> {
    let ctx = context! {
        body => body,
        ..signed_in_context(state, claims, user, errors)
    };
    Ok(state.templates.render("add-tweet.html", ctx)?.into_response())
}

/// `GET /post` - the compose form.
pub async fn compose(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    match require_ready(&state, session)? {
        Ok((claims, user)) => compose_page(&state, &claims, &user, &[], ""),
        Err(page) => Ok(page),
    }
}

/// `POST /post` - publish a tweet with an optional image.
pub async fn post_tweet(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };

    let mut form = TweetForm::read(multipart).await?;
    let body = form.body()?.to_string();
    if let Err(e) = validate_tweet_body(&body) {
        return compose_page(&state, &claims, &user, &[form_message(e)], &body);
    }

    let image = match form.image.take() {
        Some(upload) => Some(store_image(&state, &user, upload).await?),
        None => None,
    };
    let uploaded_key = image.as_ref().map(|i| i.blob_key.clone());

    let tweet = Tweet::new(user.username.as_str(), body, image);
    if let Err(e) = state.store.create_tweet(&claims.identity, &tweet) {
        if let Some(key) = uploaded_key {
            discard_blob(&state, &key).await;
        }
        return Err(e.into());
    }

    tracing::info!(author = %tweet.author, tweet_id = %tweet.id, "Tweet posted");

    Ok(Redirect::to("/").into_response())
}

// ============================================================================
// Edit
// ============================================================================

/// Edit form data.
#[derive(Debug, Serialize)]
struct EditView<'a> {
    id: String,
    body: &'a str,
    image_url: Option<&'a str>,
}

fn edit_page(
    state: &AppState,
    claims: &VerifiedClaims,
    user: &User,
    errors: &[String],
    tweet: &Tweet,
    body: &str,
) -> Result<Response, ApiError> {
    let ctx = context! {
        tweet => EditView {
            id: tweet.id.to_string(),
            body,
            image_url: tweet.image_url.as_deref(),
        },
        ..signed_in_context(state, claims, user, errors)
    };
    Ok(state
        .templates
        .render("edit-tweet.html", ctx)?
        .into_response())
}

fn load_tweet(state: &AppState, id: &TweetId) -> Result<Tweet, ApiError> {
    state
        .store
        .get_tweet(id)?
        .ok_or_else(|| ApiError::NotFound(format!("tweet not found: {id}")))
}

/// `GET /edit-tweet/{index}` - the edit form for the viewer's tweet at a
/// newest-first position.
pub async fn edit_page_at(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(index): Path<String>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };

    let id = index
        .parse::<usize>()
        .ok()
        .and_then(|index| user.tweet_at(index))
        .ok_or_else(|| ApiError::NotFound(format!("no tweet at position {index}")))?;
    let tweet = load_tweet(&state, &id)?;

    edit_page(&state, &claims, &user, &[], &tweet, &tweet.body)
}

/// `GET /edit-tweet` - there is nothing to edit without a position.
pub async fn edit_page_bare(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    match require_ready(&state, session)? {
        Ok(_) => Ok(Redirect::to("/profile").into_response()),
        Err(page) => Ok(page),
    }
}

/// `POST /edit-tweet` - save an edit to one of the viewer's tweets.
///
/// A new image replaces the old one, whose blob is then deleted. Without a
/// new image the current one is kept.
pub async fn edit_tweet(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };

    let mut form = TweetForm::read(multipart).await?;
    let id: TweetId = form
        .tweet_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("missing field: tweet_id".into()))?
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid tweet id".into()))?;

    if !user.owns_tweet(&id) {
        tracing::warn!(username = %user.username, tweet_id = %id, "Edit of foreign tweet refused");
        return Err(ApiError::Forbidden);
    }
    let existing = load_tweet(&state, &id)?;

    let body = form.body()?.to_string();
    if let Err(e) = validate_tweet_body(&body) {
        return edit_page(&state, &claims, &user, &[form_message(e)], &existing, &body);
    }

    let image = match form.image.take() {
        Some(upload) => Some(store_image(&state, &user, upload).await?),
        None => None,
    };
    let replaced_key = image.as_ref().and(existing.blob_key.clone());
    let uploaded_key = image.as_ref().map(|i| i.blob_key.clone());

    if let Err(e) = state.store.update_tweet(&id, TweetUpdate { body, image }) {
        if let Some(key) = uploaded_key {
            discard_blob(&state, &key).await;
        }
        return Err(e.into());
    }

    if let Some(key) = replaced_key {
        discard_blob(&state, &key).await;
    }

    tracing::info!(author = %user.username, tweet_id = %id, "Tweet edited");

    Ok(Redirect::to("/profile").into_response())
}

// ============================================================================
// Delete
// ============================================================================

/// Delete form body.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    /// Newest-first position of the tweet in the viewer's log.
    pub index: usize,
}

/// `POST /delete-tweet` - delete the viewer's tweet at a newest-first
/// position, along with its image.
pub async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let (claims, user) = match require_ready(&state, session)? {
        Ok(ready) => ready,
        Err(page) => return Ok(page),
    };
    let form = form_body(form)?;

    let id = user
        .tweet_at(form.index)
        .ok_or_else(|| ApiError::NotFound(format!("no tweet at position {}", form.index)))?;

    let removed = state.store.delete_tweet(&claims.identity, &id)?;
    if let Some(key) = removed.blob_key.as_deref() {
        state.blobs.delete(key).await?;
    }

    tracing::info!(author = %user.username, tweet_id = %id, "Tweet deleted");

    Ok(Redirect::to("/profile").into_response())
}
