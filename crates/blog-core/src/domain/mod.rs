//! Domain entities - the core business objects.

mod category;
mod comment;
mod feed;
mod location;
mod post;
mod user;

pub use category::Category;
pub use comment::Comment;
pub use feed::{AuthorRef, CommentEntry, FeedEntry, FeedScope, ListFilter};
pub use location::Location;
pub use post::Post;
pub use user::{ROLE_STAFF, ROLE_USER, User};

use uuid::Uuid;

use crate::error::DomainError;

/// Upper bound for titles and names, matching the `VARCHAR(256)` columns.
pub const MAX_TITLE_LEN: usize = 256;
/// `categories.slug` is `VARCHAR(50)`.
pub const MAX_SLUG_LEN: usize = 50;
/// `users.email` is `VARCHAR(254)`.
pub const MAX_EMAIL_LEN: usize = 254;
/// `users.username`, `first_name` and `last_name` are `VARCHAR(150)`.
pub const MAX_NAME_LEN: usize = 150;
/// `posts.image` is `VARCHAR(512)`.
pub const MAX_IMAGE_LEN: usize = 512;

/// Anything with a single author that only that author may change.
pub trait Authored {
    fn author_id(&self) -> Uuid;

    fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author_id() == user_id
    }
}

fn check_title(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    check_max_len(field, value, MAX_TITLE_LEN)
}

/// Column limits count characters, not bytes.
fn check_max_len(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn check_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
