//! Authentication handlers.

use actix_web::{HttpResponse, web};

use blog_core::domain::User;
use blog_core::error::DomainError;
use blog_core::ports::BaseRepository;
use blog_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::{current_user, presenters};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut user = User::new(req.username, req.email, String::new());
    user.first_name = req.first_name;
    user.last_name = req.last_name;
    user.validate()?;

    if state.users.find_by_username(&user.username).await?.is_some() {
        return Err(DomainError::Duplicate("username".to_string()).into());
    }
    if state.users.find_by_email(&user.email).await?.is_some() {
        return Err(DomainError::Duplicate("email".to_string()).into());
    }

    user.password_hash = state.passwords.hash(&req.password)?;

    let user = state.users.create(user).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::warn!(username = %req.username, "Failed login attempt");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = current_user(&state, &identity).await?;
    Ok(HttpResponse::Ok().json(presenters::user(&user, true)))
}
