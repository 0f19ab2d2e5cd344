//! HTTP handlers and route configuration.

mod auth;
mod category;
mod comments;
mod health;
mod posts;
mod presenters;
mod profile;
mod staff;


use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use blog_core::domain::User;
use blog_core::ports::BaseRepository;
use blog_shared::RedirectResponse;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimit;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/register")
                            .wrap(RateLimit)
                            .route(web::post().to(auth::register)),
                    )
                    .service(
                        web::resource("/login")
                            .wrap(RateLimit)
                            .route(web::post().to(auth::login)),
                    )
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(posts::index))
                            .route(web::post().to(posts::create)),
                    )
                    .service(
                        web::resource("/{post_id}")
                            .route(web::get().to(posts::detail))
                            .route(web::put().to(posts::update))
                            .route(web::delete().to(posts::delete)),
                    )
                    .route("/{post_id}/comments", web::post().to(comments::create))
                    .service(
                        web::resource("/{post_id}/comments/{comment_id}")
                            .route(web::put().to(comments::update))
                            .route(web::delete().to(comments::delete)),
                    ),
            )
            .route("/category/{slug}", web::get().to(category::feed))
            .route("/profile", web::put().to(profile::edit))
            .route("/profile/{username}", web::get().to(profile::feed))
            // Staff-only management of categories and locations
            .service(
                web::scope("/staff")
                    .service(
                        web::resource("/categories")
                            .route(web::get().to(staff::list_categories))
                            .route(web::post().to(staff::create_category)),
                    )
                    .service(
                        web::resource("/categories/{id}")
                            .route(web::put().to(staff::update_category))
                            .route(web::delete().to(staff::delete_category)),
                    )
                    .service(
                        web::resource("/locations")
                            .route(web::get().to(staff::list_locations))
                            .route(web::post().to(staff::create_location)),
                    )
                    .service(
                        web::resource("/locations/{id}")
                            .route(web::put().to(staff::update_location))
                            .route(web::delete().to(staff::delete_location)),
                    ),
            ),
    );
}

/// Canonical URLs that mutations redirect to.
pub(crate) mod urls {
    use uuid::Uuid;

    pub const INDEX: &str = "/api/posts";

    pub fn post_detail(id: Uuid) -> String {
        format!("/api/posts/{id}")
    }

    pub fn profile(username: &str) -> String {
        format!("/api/profile/{username}")
    }
}

/// `302 Found` to `location`, with the location repeated in the body.
pub(crate) fn redirect(location: String, id: Option<Uuid>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.clone()))
        .json(RedirectResponse { location, id })
}

/// Load the requester's account. A token for a deleted user is rejected.
pub(crate) async fn current_user(state: &AppState, identity: &Identity) -> AppResult<User> {
    state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}
