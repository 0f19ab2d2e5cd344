//! Profile page and profile edit.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blog_core::domain::FeedScope;
use blog_core::error::DomainError;
use blog_core::ports::BaseRepository;
use blog_core::{PageNumber, PageRequest};
use blog_shared::dto::{PageQuery, ProfileFeedResponse, UpdateProfileRequest};

use super::{current_user, presenters, redirect, urls};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/profile/{username}?page=
///
/// Owners see all of their posts, hidden ones included; everyone else gets
/// the public subset.
pub async fn feed(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();

    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("user", &username))?;

    let is_owner = viewer.user_id() == Some(user.id);
    let scope = FeedScope::Author {
        author_id: user.id,
        include_hidden: is_owner,
    };

    let page = PageRequest::new(PageNumber::parse(query.page.as_deref())?);
    let posts = state.posts.feed(scope, Utc::now(), page).await?;

    Ok(HttpResponse::Ok().json(ProfileFeedResponse {
        profile: presenters::user(&user, is_owner),
        posts: presenters::feed_page(posts),
    }))
}

/// PUT /api/profile
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let mut user = current_user(&state, &identity).await?;
    let req = body.into_inner();

    if let Some(other) = state.users.find_by_username(&req.username).await? {
        if other.id != user.id {
            return Err(DomainError::Duplicate("username".to_string()).into());
        }
    }
    if let Some(other) = state.users.find_by_email(&req.email).await? {
        if other.id != user.id {
            return Err(DomainError::Duplicate("email".to_string()).into());
        }
    }

    user.first_name = req.first_name;
    user.last_name = req.last_name;
    user.username = req.username;
    user.email = req.email;
    user.updated_at = Utc::now();
    user.validate()?;

    let user = state.users.update(user).await?;
    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(redirect(urls::INDEX.to_string(), Some(user.id)))
}
