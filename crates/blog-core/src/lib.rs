//! # Blog Core
//!
//! The domain layer of the Blogicum backend: entities, the post visibility
//! rules, ownership checks, feed pagination and the ports that
//! infrastructure implements. No database or HTTP dependencies live here.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;

pub use error::{DomainError, RepoError};
pub use pagination::{POSTS_PER_PAGE, Page, PageNumber, PageRequest};
