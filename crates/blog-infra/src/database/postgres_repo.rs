//! PostgreSQL repository implementations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blog_core::domain::{
    AuthorRef, Category, Comment, CommentEntry, FeedEntry, FeedScope, ListFilter, Location, User,
};
use blog_core::error::RepoError;
use blog_core::pagination::{Page, PageRequest};
use blog_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***{domain}"),
                _ => format!("***{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

/// Lowercased `%needle%` with LIKE wildcards in the needle taken literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `LOWER(col) LIKE '%needle%' ESCAPE '\'`
fn icontains<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(contains_pattern(needle)).escape('\\'))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Category>, RepoError> {
        let mut query = CategoryEntity::find();
        if let Some(search) = &filter.search {
            query = query.filter(icontains(category::Column::Title, search));
        }
        if let Some(is_published) = filter.is_published {
            query = query.filter(category::Column::IsPublished.eq(is_published));
        }

        let result = query
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Location>, RepoError> {
        let mut query = LocationEntity::find();
        if let Some(search) = &filter.search {
            query = query.filter(icontains(location::Column::Name, search));
        }
        if let Some(is_published) = filter.is_published {
            query = query.filter(location::Column::IsPublished.eq(is_published));
        }

        let result = query
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Published, already out, and filed under a published category.
///
/// Needs the category table joined in.
fn public_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(post::Column::IsPublished.eq(true))
        .add(post::Column::PubDate.lte(now))
        .add(category::Column::IsPublished.eq(true))
}

fn posts_with_category() -> Select<PostEntity> {
    PostEntity::find().join(JoinType::LeftJoin, post::Relation::Category.def())
}

fn scoped(scope: FeedScope, now: DateTime<Utc>) -> Select<PostEntity> {
    let query = posts_with_category();
    match scope {
        FeedScope::Public => query.filter(public_condition(now)),
        FeedScope::Category(category_id) => query
            .filter(public_condition(now))
            .filter(post::Column::CategoryId.eq(category_id)),
        FeedScope::Author {
            author_id,
            include_hidden,
        } => {
            let query = query.filter(post::Column::AuthorId.eq(author_id));
            if include_hidden {
                query
            } else {
                query.filter(public_condition(now))
            }
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: Uuid,
    comment_count: i64,
}

impl PostgresPostRepository {
    /// Load authors, categories, locations and comment counts for a batch
    /// of posts, preserving the batch order.
    async fn hydrate(&self, posts: Vec<post::Model>) -> Result<Vec<FeedEntry>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let author_ids: HashSet<Uuid> = posts.iter().map(|p| p.author_id).collect();
        let category_ids: HashSet<Uuid> = posts.iter().filter_map(|p| p.category_id).collect();
        let location_ids: HashSet<Uuid> = posts.iter().filter_map(|p| p.location_id).collect();

        let authors: HashMap<Uuid, user::Model> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let categories: HashMap<Uuid, category::Model> = CategoryEntity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let locations: HashMap<Uuid, location::Model> = LocationEntity::find()
            .filter(location::Column::Id.is_in(location_ids))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let counts: HashMap<Uuid, u64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_model::<CommentCount>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|c| (c.post_id, c.comment_count.max(0) as u64))
            .collect();

        posts
            .into_iter()
            .map(|model| {
                let author = authors.get(&model.author_id).ok_or_else(|| {
                    RepoError::Query(format!("author of post {} is missing", model.id))
                })?;
                let category = model
                    .category_id
                    .and_then(|id| categories.get(&id))
                    .cloned()
                    .map(Into::into);
                let location = model
                    .location_id
                    .and_then(|id| locations.get(&id))
                    .cloned()
                    .map(Into::into);
                let comment_count = counts.get(&model.id).copied().unwrap_or(0);

                Ok(FeedEntry {
                    author: AuthorRef {
                        id: author.id,
                        username: author.username.clone(),
                    },
                    category,
                    location,
                    comment_count,
                    post: model.into(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn feed(
        &self,
        scope: FeedScope,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<Page<FeedEntry>, RepoError> {
        let paginator = scoped(scope, now)
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, page.per_page);

        let total_items = paginator.num_items().await.map_err(map_db_err)?;
        let number = page.resolve(total_items).ok_or(RepoError::NotFound)?;
        let models = paginator
            .fetch_page(number - 1)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(?scope, page = number, total_items, "Loaded feed page");

        Ok(Page {
            items: self.hydrate(models).await?,
            number,
            per_page: page.per_page,
            total_items,
            total_pages: page.total_pages(total_items),
        })
    }

    async fn find_visible(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<FeedEntry>, RepoError> {
        let visibility = match viewer {
            Some(viewer) => Condition::any()
                .add(post::Column::AuthorId.eq(viewer))
                .add(public_condition(now)),
            None => public_condition(now),
        };

        let model = posts_with_category()
            .filter(post::Column::Id.eq(id))
            .filter(visibility)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        match model {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        rows.into_iter()
            .map(|(comment, author)| {
                let author = author.ok_or_else(|| {
                    RepoError::Query(format!("author of comment {} is missing", comment.id))
                })?;
                Ok(CommentEntry {
                    author: AuthorRef {
                        id: author.id,
                        username: author.username,
                    },
                    comment: Comment::from(comment),
                })
            })
            .collect()
    }

    async fn find_in_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(comment_id)
            .filter(comment::Column::PostId.eq(post_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}
