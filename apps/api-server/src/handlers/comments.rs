//! Comment handlers. Every route is nested under its post.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blog_core::domain::{Authored, Comment};
use blog_core::error::DomainError;
use blog_core::ports::BaseRepository;
use blog_shared::dto::CommentRequest;

use super::{redirect, urls};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn find_comment(state: &AppState, post_id: Uuid, comment_id: Uuid) -> AppResult<Comment> {
    state
        .comments
        .find_in_post(post_id, comment_id)
        .await?
        .ok_or_else(|| DomainError::not_found("comment", comment_id).into())
}

/// POST /api/posts/{post_id}/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    // Only posts the commenter can see accept comments.
    state
        .posts
        .find_visible(post_id, Some(identity.user_id), Utc::now())
        .await?
        .ok_or_else(|| DomainError::not_found("post", post_id))?;

    let comment = Comment::new(post_id, identity.user_id, body.into_inner().text);
    comment.validate()?;

    let comment = state.comments.create(comment).await?;
    tracing::info!(%post_id, comment_id = %comment.id, "Comment added");

    Ok(redirect(urls::post_detail(post_id), Some(comment.id)))
}

/// PUT /api/posts/{post_id}/comments/{comment_id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let mut comment = find_comment(&state, post_id, comment_id).await?;

    if !comment.is_owned_by(identity.user_id) {
        tracing::warn!(%comment_id, user_id = %identity.user_id, "Refused edit of another user's comment");
        return Ok(redirect(urls::post_detail(post_id), None));
    }

    comment.text = body.into_inner().text;
    comment.validate()?;

    let comment = state.comments.update(comment).await?;
    tracing::info!(%post_id, %comment_id, "Comment updated");

    Ok(redirect(urls::post_detail(post_id), Some(comment.id)))
}

/// DELETE /api/posts/{post_id}/comments/{comment_id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = find_comment(&state, post_id, comment_id).await?;

    if !comment.is_owned_by(identity.user_id) {
        tracing::warn!(%comment_id, user_id = %identity.user_id, "Refused delete of another user's comment");
        return Ok(redirect(urls::post_detail(post_id), None));
    }

    state.comments.delete(comment_id).await?;
    tracing::info!(%post_id, %comment_id, "Comment deleted");

    Ok(redirect(urls::post_detail(post_id), None))
}
