//! Read models assembled by the repositories for feeds and post pages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Comment, Location, Post, User};

/// Which posts a feed draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Home feed: every publicly visible post.
    Public,
    /// Publicly visible posts of one category.
    Category(Uuid),
    /// Posts of one author. `include_hidden` is set when the author is
    /// looking at their own profile and drops the visibility filter.
    Author { author_id: Uuid, include_hidden: bool },
}

/// Public face of a user, as shown next to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for AuthorRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// A post with everything a feed or detail page shows alongside it.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub post: Post,
    pub author: AuthorRef,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}

#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: AuthorRef,
}

/// Filter for the staff listings of categories and locations.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Case-insensitive substring of the title or name.
    pub search: Option<String>,
    pub is_published: Option<bool>,
}

impl ListFilter {
    pub fn matches(&self, label: &str, is_published: bool) -> bool {
        let search_ok = self
            .search
            .as_deref()
            .is_none_or(|needle| label.to_lowercase().contains(&needle.to_lowercase()));
        let published_ok = self.is_published.is_none_or(|want| want == is_published);
        search_ok && published_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter() {
        let any = ListFilter::default();
        assert!(any.matches("Travel", false));

        let filter = ListFilter {
            search: Some("TRAV".into()),
            is_published: Some(true),
        };
        assert!(filter.matches("Travel notes", true));
        assert!(!filter.matches("Travel notes", false));
        assert!(!filter.matches("Cooking", true));
    }
}
