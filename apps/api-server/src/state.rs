//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PasswordService, PostRepository,
    RateLimiter, TokenService, UserRepository,
};
use blog_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Throttle for the auth endpoints; `None` disables it.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl AppState {
    /// State backed by the in-memory store.
    pub fn in_memory(store: &InMemoryStore, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            users: Arc::new(store.users()),
            categories: Arc::new(store.categories()),
            locations: Arc::new(store.locations()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Build the application state with appropriate implementations.
    pub async fn build(config: &AppConfig) -> std::io::Result<Self> {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());

        let state = Self::storage(config, tokens).await?;

        #[cfg(feature = "rate-limit")]
        let state =
            state.with_rate_limiter(Arc::new(blog_infra::InMemoryRateLimiter::from_env()));

        tracing::info!(
            rate_limited = state.rate_limiter.is_some(),
            "Application state initialized"
        );

        Ok(state)
    }

    #[cfg(feature = "postgres")]
    async fn storage(config: &AppConfig, tokens: Arc<dyn TokenService>) -> std::io::Result<Self> {
        use blog_infra::database::{
            PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
            PostgresPostRepository, PostgresUserRepository, connect,
        };
        use migration::{Migrator, MigratorTrait};

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Ok(Self::in_memory(&InMemoryStore::new(), tokens));
        };

        let db = connect(db_config).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            std::io::Error::other(e)
        })?;

        if config.auto_migrate {
            Migrator::up(&db, None).await.map_err(|e| {
                tracing::error!(error = %e, "Migration failed");
                std::io::Error::other(e)
            })?;
            tracing::info!("Database migrations applied");
        }

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            locations: Arc::new(PostgresLocationRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db)),
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            rate_limiter: None,
        })
    }

    #[cfg(not(feature = "postgres"))]
    async fn storage(_config: &AppConfig, tokens: Arc<dyn TokenService>) -> std::io::Result<Self> {
        tracing::info!("Running without postgres feature - using in-memory store");
        Ok(Self::in_memory(&InMemoryStore::new(), tokens))
    }
}
