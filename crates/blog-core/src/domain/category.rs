use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MAX_SLUG_LEN, check_max_len, check_title};
use crate::error::DomainError;

/// Thematic category; its slug is the public URL key of the category feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    /// Unpublishing a category hides every post in it from public feeds.
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(title: String, description: String, slug: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            slug,
            is_published: true,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_title("title", &self.title)?;
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::validation(
                "slug may contain only latin letters, digits, hyphen and underscore",
            ));
        }
        check_max_len("slug", &self.slug, MAX_SLUG_LEN)
    }
}

/// `[-a-zA-Z0-9_]+`
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("travel_2024-spring"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("путешествия"));
        assert!(!is_valid_slug("with space"));
    }

    #[test]
    fn test_validate_category() {
        let category = Category::new("Travel".into(), "Trips".into(), "travel".into());
        assert!(category.is_published);
        assert!(category.validate().is_ok());

        let bad = Category::new("".into(), "Trips".into(), "travel".into());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_slug_length_limit() {
        let mut category = Category::new("Travel".into(), "Trips".into(), "a".repeat(MAX_SLUG_LEN));
        assert!(category.validate().is_ok());

        category.slug.push('a');
        assert!(category.validate().is_err());
    }
}
