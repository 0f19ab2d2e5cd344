use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Category, Comment, CommentEntry, FeedEntry, FeedScope, ListFilter, Location, Post, User,
};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity; `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the foreign-key policy to
    /// dependants (cascade or set-null).
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    /// Find a category by slug, published or not.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// Staff listing, ordered by title.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Category>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {
    /// Staff listing, ordered by name.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Location>, RepoError>;
}

#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of a feed, newest `pub_date` first, each entry carrying its
    /// comment count. Returns `NotFound` for a page past the end.
    async fn feed(
        &self,
        scope: FeedScope,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<Page<FeedEntry>, RepoError>;

    /// A single post, if `viewer` is allowed to see it at `now`.
    async fn find_visible(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<FeedEntry>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError>;

    /// A comment, only if it belongs to the given post.
    async fn find_in_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, RepoError>;
}
