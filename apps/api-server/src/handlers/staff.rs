//! Staff-only management of categories and locations.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blog_core::domain::{Category, ListFilter, Location};
use blog_core::error::DomainError;
use blog_core::ports::BaseRepository;
use blog_shared::dto::{CategoryRequest, LocationRequest, StaffListQuery};

use super::presenters;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn filter(query: StaffListQuery) -> ListFilter {
    ListFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        is_published: query.is_published,
    }
}

/// Slugs are unique; `current` is the category being edited, if any.
async fn ensure_slug_free(state: &AppState, slug: &str, current: Option<Uuid>) -> AppResult<()> {
    match state.categories.find_by_slug(slug).await? {
        Some(existing) if Some(existing.id) != current => {
            Err(DomainError::Duplicate(format!("slug '{slug}'")).into())
        }
        _ => Ok(()),
    }
}

/// GET /api/staff/categories?search=&is_published=
pub async fn list_categories(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<StaffListQuery>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;

    let categories = state.categories.list(&filter(query.into_inner())).await?;

    Ok(HttpResponse::Ok().json(
        categories
            .into_iter()
            .map(presenters::category)
            .collect::<Vec<_>>(),
    ))
}

/// POST /api/staff/categories
pub async fn create_category(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let req = body.into_inner();

    let mut category = Category::new(req.title, req.description, req.slug);
    category.is_published = req.is_published;
    category.validate()?;
    ensure_slug_free(&state, &category.slug, None).await?;

    let category = state.categories.create(category).await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");

    Ok(HttpResponse::Created().json(presenters::category(category)))
}

/// PUT /api/staff/categories/{id}
pub async fn update_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let id = path.into_inner();
    let req = body.into_inner();

    let mut category = state
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("category", id))?;

    category.title = req.title;
    category.description = req.description;
    category.slug = req.slug;
    category.is_published = req.is_published;
    category.validate()?;
    ensure_slug_free(&state, &category.slug, Some(id)).await?;

    let category = state.categories.update(category).await?;
    tracing::info!(category_id = %id, "Category updated");

    Ok(HttpResponse::Ok().json(presenters::category(category)))
}

/// DELETE /api/staff/categories/{id}
///
/// Posts of the category stay, without a category.
pub async fn delete_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let id = path.into_inner();

    state.categories.delete(id).await?;
    tracing::info!(category_id = %id, "Category deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/staff/locations?search=&is_published=
pub async fn list_locations(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<StaffListQuery>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;

    let locations = state.locations.list(&filter(query.into_inner())).await?;

    Ok(HttpResponse::Ok().json(
        locations
            .into_iter()
            .map(presenters::location)
            .collect::<Vec<_>>(),
    ))
}

/// POST /api/staff/locations
pub async fn create_location(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<LocationRequest>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let req = body.into_inner();

    let mut location = Location::new(req.name);
    location.is_published = req.is_published;
    location.validate()?;

    let location = state.locations.create(location).await?;
    tracing::info!(location_id = %location.id, "Location created");

    Ok(HttpResponse::Created().json(presenters::location(location)))
}

/// PUT /api/staff/locations/{id}
pub async fn update_location(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<LocationRequest>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let id = path.into_inner();
    let req = body.into_inner();

    let mut location = state
        .locations
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("location", id))?;

    location.name = req.name;
    location.is_published = req.is_published;
    location.validate()?;

    let location = state.locations.update(location).await?;
    tracing::info!(location_id = %id, "Location updated");

    Ok(HttpResponse::Ok().json(presenters::location(location)))
}

/// DELETE /api/staff/locations/{id}
pub async fn delete_location(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    identity.require_staff()?;
    let id = path.into_inner();

    state.locations.delete(id).await?;
    tracing::info!(location_id = %id, "Location deleted");

    Ok(HttpResponse::NoContent().finish())
}
