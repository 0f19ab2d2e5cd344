//! In-memory storage - used when no database is configured and in tests.
//!
//! Enforces the same unique keys, foreign keys and `ON DELETE` rules as the
//! PostgreSQL schema. Data is lost on process restart.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{
    AuthorRef, Category, Comment, CommentEntry, FeedEntry, FeedScope, ListFilter, Location, Post,
    User,
};
use blog_core::error::RepoError;
use blog_core::pagination::{Page, PageRequest};
use blog_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};

/// All rows, one map per table.
#[derive(Default)]
pub struct MemoryTables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl MemoryTables {
    fn category_of(&self, post: &Post) -> Option<&Category> {
        post.category_id.and_then(|id| self.categories.get(&id))
    }

    fn author_ref(&self, author_id: Uuid) -> Result<AuthorRef, RepoError> {
        self.users
            .get(&author_id)
            .map(AuthorRef::from)
            .ok_or_else(|| RepoError::Query(format!("user {author_id} is missing")))
    }

    fn feed_entry(&self, post: &Post) -> Result<FeedEntry, RepoError> {
        Ok(FeedEntry {
            author: self.author_ref(post.author_id)?,
            category: self.category_of(post).cloned(),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id))
                .cloned(),
            comment_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as u64,
            post: post.clone(),
        })
    }

    fn in_scope(&self, post: &Post, scope: FeedScope, now: DateTime<Utc>) -> bool {
        let public = || post.is_public(self.category_of(post), now);
        match scope {
            FeedScope::Public => public(),
            FeedScope::Category(category_id) => post.category_id == Some(category_id) && public(),
            FeedScope::Author {
                author_id,
                include_hidden,
            } => post.author_id == author_id && (include_hidden || public()),
        }
    }
}

/// A row type living in [`MemoryTables`].
pub trait StoredEntity: Clone + Send + Sync + 'static {
    const NAME: &'static str;

    fn id(&self) -> Uuid;

    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self>;

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self>;

    /// Unique keys, checked against every other row.
    fn check_unique(&self, _tables: &MemoryTables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Foreign keys must point at existing rows.
    fn check_references(&self, _tables: &MemoryTables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Apply `ON DELETE` rules to rows referencing the deleted `id`.
    fn on_delete(_id: Uuid, _tables: &mut MemoryTables) {}
}

fn missing_reference(what: &str, id: Uuid) -> RepoError {
    RepoError::Constraint(format!("{what} {id} does not exist"))
}

impl StoredEntity for User {
    const NAME: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check_unique(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        for other in tables.users.values().filter(|u| u.id != self.id) {
            if other.username == self.username {
                return Err(RepoError::Constraint("username already exists".into()));
            }
            if other.email == self.email {
                return Err(RepoError::Constraint("email already exists".into()));
            }
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        let post_ids: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in post_ids {
            tables.posts.remove(&post_id);
            Post::on_delete(post_id, tables);
        }
        tables.comments.retain(|_, c| c.author_id != id);
    }
}

impl StoredEntity for Category {
    const NAME: &'static str = "category";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.categories
    }

    fn check_unique(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        if tables
            .categories
            .values()
            .any(|c| c.id != self.id && c.slug == self.slug)
        {
            return Err(RepoError::Constraint("slug already exists".into()));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
    }
}

impl StoredEntity for Location {
    const NAME: &'static str = "location";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.locations
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.locations
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
    }
}

impl StoredEntity for Post {
    const NAME: &'static str = "post";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.posts
    }

    fn check_references(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing_reference("user", self.author_id));
        }
        if let Some(id) = self.category_id.filter(|id| !tables.categories.contains_key(id)) {
            return Err(missing_reference("category", id));
        }
        if let Some(id) = self.location_id.filter(|id| !tables.locations.contains_key(id)) {
            return Err(missing_reference("location", id));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        tables.comments.retain(|_, c| c.post_id != id);
    }
}

impl StoredEntity for Comment {
    const NAME: &'static str = "comment";

    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.comments
    }

    fn check_references(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        if !tables.posts.contains_key(&self.post_id) {
            return Err(missing_reference("post", self.post_id));
        }
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing_reference("user", self.author_id));
        }
        Ok(())
    }
}

/// Shared handle on the in-memory tables, handing out per-entity repositories.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<MemoryTables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryRepository::new(self.tables.clone())
    }
}

/// Generic in-memory repository over one table.
pub struct InMemoryRepository<E> {
    tables: Arc<RwLock<MemoryTables>>,
    _entity: PhantomData<E>,
}

impl<E> InMemoryRepository<E> {
    fn new(tables: Arc<RwLock<MemoryTables>>) -> Self {
        Self {
            tables,
            _entity: PhantomData,
        }
    }
}

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryLocationRepository = InMemoryRepository<Location>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

#[async_trait]
impl<E: StoredEntity> BaseRepository<E, Uuid> for InMemoryRepository<E> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, RepoError> {
        let tables = self.tables.read().await;
        Ok(E::table(&tables).get(&id).cloned())
    }

    async fn create(&self, entity: E) -> Result<E, RepoError> {
        let mut tables = self.tables.write().await;

        if E::table(&tables).contains_key(&entity.id()) {
            return Err(RepoError::Constraint(format!(
                "{} {} already exists",
                E::NAME,
                entity.id()
            )));
        }
        entity.check_references(&tables)?;
        entity.check_unique(&tables)?;

        E::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, RepoError> {
        let mut tables = self.tables.write().await;

        if !E::table(&tables).contains_key(&entity.id()) {
            return Err(RepoError::NotFound);
        }
        entity.check_references(&tables)?;
        entity.check_unique(&tables)?;

        E::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        if E::table_mut(&mut tables).remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        E::on_delete(id, &mut tables);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| filter.matches(&c.title, c.is_published))
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables
            .locations
            .values()
            .filter(|l| filter.matches(&l.name, l.is_published))
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn feed(
        &self,
        scope: FeedScope,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<Page<FeedEntry>, RepoError> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| tables.in_scope(p, scope, now))
            .collect();
        posts.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let page = page.slice(posts).ok_or(RepoError::NotFound)?;
        let items = page
            .items
            .iter()
            .map(|post| tables.feed_entry(post))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            number: page.number,
            per_page: page.per_page,
            total_items: page.total_items,
            total_pages: page.total_pages,
        })
    }

    async fn find_visible(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<FeedEntry>, RepoError> {
        let tables = self.tables.read().await;

        match tables.posts.get(&id) {
            Some(post) if post.is_visible_to(viewer, tables.category_of(post), now) => {
                tables.feed_entry(post).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let tables = self.tables.read().await;

        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by_key(|c| c.created_at);

        comments
            .into_iter()
            .map(|comment| {
                Ok(CommentEntry {
                    author: tables.author_ref(comment.author_id)?,
                    comment: comment.clone(),
                })
            })
            .collect()
    }

    async fn find_in_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .filter(|c| c.post_id == post_id)
            .cloned())
    }
}
