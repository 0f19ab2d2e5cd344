//! Post handlers: home feed, post page and author-only mutations.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blog_core::domain::{Authored, FeedScope, Post};
use blog_core::error::DomainError;
use blog_core::ports::BaseRepository;
use blog_core::{PageNumber, PageRequest};
use blog_shared::dto::{PageQuery, PostDetailResponse, PostRequest};

use super::{current_user, presenters, redirect, urls};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Copy the form onto a post, keeping its id, author and creation time.
fn apply(post: &mut Post, req: PostRequest) {
    post.title = req.title;
    post.text = req.text;
    post.pub_date = req.pub_date;
    post.image = req.image;
    post.is_published = req.is_published;
    post.location_id = req.location_id;
    post.category_id = req.category_id;
}

/// Validate the post and make sure its category and location exist.
async fn check(state: &AppState, post: &Post) -> AppResult<()> {
    post.validate()?;

    if let Some(id) = post.category_id {
        if state.categories.find_by_id(id).await?.is_none() {
            return Err(DomainError::validation(format!("category {id} does not exist")).into());
        }
    }
    if let Some(id) = post.location_id {
        if state.locations.find_by_id(id).await?.is_none() {
            return Err(DomainError::validation(format!("location {id} does not exist")).into());
        }
    }
    Ok(())
}

async fn find_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("post", id).into())
}

/// GET /api/posts?page=
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::new(PageNumber::parse(query.page.as_deref())?);

    let page = state.posts.feed(FeedScope::Public, Utc::now(), page).await?;

    Ok(HttpResponse::Ok().json(presenters::feed_page(page)))
}

/// GET /api/posts/{post_id}
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let entry = state
        .posts
        .find_visible(post_id, viewer.user_id(), Utc::now())
        .await?
        .ok_or_else(|| DomainError::not_found("post", post_id))?;

    let comments = state.comments.find_by_post(post_id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: presenters::post(entry),
        comments: comments.into_iter().map(presenters::comment).collect(),
    }))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let author = current_user(&state, &identity).await?;
    let req = body.into_inner();

    let mut post = Post::new(author.id, String::new(), String::new(), req.pub_date);
    apply(&mut post, req);
    check(&state, &post).await?;

    let post = state.posts.create(post).await?;
    tracing::info!(post_id = %post.id, author_id = %author.id, "Post created");

    Ok(redirect(urls::profile(&author.username), Some(post.id)))
}

/// PUT /api/posts/{post_id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let mut post = find_post(&state, post_id).await?;

    if !post.is_owned_by(identity.user_id) {
        tracing::warn!(%post_id, user_id = %identity.user_id, "Refused edit of another user's post");
        return Ok(redirect(urls::post_detail(post_id), None));
    }

    apply(&mut post, body.into_inner());
    check(&state, &post).await?;

    let post = state.posts.update(post).await?;
    tracing::info!(%post_id, "Post updated");

    Ok(redirect(urls::post_detail(post.id), Some(post.id)))
}

/// DELETE /api/posts/{post_id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = find_post(&state, post_id).await?;

    if !post.is_owned_by(identity.user_id) {
        tracing::warn!(%post_id, user_id = %identity.user_id, "Refused delete of another user's post");
        return Ok(redirect(urls::post_detail(post_id), None));
    }

    let author = current_user(&state, &identity).await?;
    state.posts.delete(post_id).await?;
    tracing::info!(%post_id, "Post deleted");

    Ok(redirect(urls::profile(&author.username), None))
}
