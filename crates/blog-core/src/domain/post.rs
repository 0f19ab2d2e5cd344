use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Authored, Category, MAX_IMAGE_LEN, check_max_len, check_text, check_title};
use crate::error::DomainError;

/// Post entity - a blog publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    /// A date in the future schedules the post; it stays hidden until then.
    pub pub_date: DateTime<Utc>,
    /// Reference to an uploaded image (path or URL).
    pub image: Option<String>,
    pub is_published: bool,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new published post without category or location.
    pub fn new(author_id: Uuid, title: String, text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            text,
            pub_date,
            image: None,
            is_published: true,
            location_id: None,
            category_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_title("title", &self.title)?;
        check_text("text", &self.text)?;
        if let Some(image) = &self.image {
            check_max_len("image", image, MAX_IMAGE_LEN)?;
        }
        Ok(())
    }

    /// Whether anonymous readers and other users may see the post.
    ///
    /// `category` must be the post's own category (or `None` if it has none).
    /// Uncategorised posts are never public.
    pub fn is_public(&self, category: Option<&Category>, now: DateTime<Utc>) -> bool {
        self.is_published && self.pub_date <= now && category.is_some_and(|c| c.is_published)
    }

    /// Visibility for a particular viewer: authors always see their own posts.
    pub fn is_visible_to(
        &self,
        viewer: Option<Uuid>,
        category: Option<&Category>,
        now: DateTime<Utc>,
    ) -> bool {
        viewer.is_some_and(|id| self.is_owned_by(id)) || self.is_public(category, now)
    }
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_image_reference_length_limit() {
        let mut post = Post::new(Uuid::new_v4(), "Title".into(), "Body".into(), Utc::now());
        post.image = Some("i".repeat(MAX_IMAGE_LEN));
        assert!(post.validate().is_ok());

        post.image = Some("i".repeat(MAX_IMAGE_LEN + 1));
        assert!(post.validate().is_err());
    }

    fn published_category() -> Category {
        Category::new("News".into(), "Daily news".into(), "news".into())
    }

    fn post_in(category: &Category, pub_date: DateTime<Utc>) -> Post {
        let mut post = Post::new(Uuid::new_v4(), "Title".into(), "Body".into(), pub_date);
        post.category_id = Some(category.id);
        post
    }

    #[test]
    fn test_published_post_is_public() {
        let now = Utc::now();
        let category = published_category();
        let post = post_in(&category, now - TimeDelta::hours(1));

        assert!(post.is_public(Some(&category), now));
        assert!(post.is_visible_to(None, Some(&category), now));
    }

    #[test]
    fn test_future_post_visible_only_to_author() {
        let now = Utc::now();
        let category = published_category();
        let post = post_in(&category, now + TimeDelta::days(1));

        assert!(!post.is_public(Some(&category), now));
        assert!(!post.is_visible_to(None, Some(&category), now));
        assert!(!post.is_visible_to(Some(Uuid::new_v4()), Some(&category), now));
        assert!(post.is_visible_to(Some(post.author_id), Some(&category), now));
    }

    #[test]
    fn test_unpublished_category_hides_post() {
        let now = Utc::now();
        let mut category = published_category();
        category.is_published = false;
        let post = post_in(&category, now - TimeDelta::hours(1));

        assert!(post.is_published);
        assert!(!post.is_public(Some(&category), now));
        assert!(post.is_visible_to(Some(post.author_id), Some(&category), now));
    }

    #[test]
    fn test_uncategorised_or_unpublished_post_is_hidden() {
        let now = Utc::now();
        let category = published_category();

        let loose = Post::new(Uuid::new_v4(), "t".into(), "b".into(), now);
        assert!(!loose.is_public(None, now));

        let mut draft = post_in(&category, now);
        draft.is_published = false;
        assert!(!draft.is_public(Some(&category), now));
    }

    #[test]
    fn test_ownership() {
        let post = Post::new(Uuid::new_v4(), "t".into(), "b".into(), Utc::now());
        assert!(post.is_owned_by(post.author_id));
        assert!(!post.is_owned_by(Uuid::new_v4()));
    }
}
