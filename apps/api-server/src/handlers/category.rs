//! Category feed.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blog_core::domain::FeedScope;
use blog_core::error::DomainError;
use blog_core::{PageNumber, PageRequest};
use blog_shared::dto::{CategoryFeedResponse, PageQuery};

use super::presenters;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/category/{slug}?page=
///
/// Unpublished categories answer 404, exactly like missing ones.
pub async fn feed(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| DomainError::not_found("category", &slug))?;

    let page = PageRequest::new(PageNumber::parse(query.page.as_deref())?);
    let posts = state
        .posts
        .feed(FeedScope::Category(category.id), Utc::now(), page)
        .await?;

    Ok(HttpResponse::Ok().json(CategoryFeedResponse {
        category: presenters::category(category),
        posts: presenters::feed_page(posts),
    }))
}
