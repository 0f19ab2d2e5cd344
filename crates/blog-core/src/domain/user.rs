use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MAX_EMAIL_LEN, MAX_NAME_LEN, check_max_len};
use crate::error::DomainError;

/// Role carried by every authenticated user.
pub const ROLE_USER: &str = "user";
/// Role that unlocks the category and location management API.
pub const ROLE_STAFF: &str = "staff";

/// User entity - an author of posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            is_staff: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn roles(&self) -> Vec<String> {
        let mut roles = vec![ROLE_USER.to_string()];
        if self.is_staff {
            roles.push(ROLE_STAFF.to_string());
        }
        roles
    }

    /// Usernames end up in profile URLs, so they are restricted to the
    /// characters that survive a path segment unescaped.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.username.is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }
        check_max_len("username", &self.username, MAX_NAME_LEN)?;
        if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
        {
            return Err(DomainError::validation(
                "username may contain only letters, digits and @/./+/-/_",
            ));
        }
        if !self.email.contains('@') {
            return Err(DomainError::validation("Invalid email address"));
        }
        check_max_len("email", &self.email, MAX_EMAIL_LEN)?;
        check_max_len("first_name", &self.first_name, MAX_NAME_LEN)?;
        check_max_len("last_name", &self.last_name, MAX_NAME_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_gets_extra_role() {
        let mut user = User::new("ann".into(), "ann@example.com".into(), "hash".into());
        assert_eq!(user.roles(), vec![ROLE_USER.to_string()]);

        user.is_staff = true;
        assert!(user.roles().iter().any(|r| r == ROLE_STAFF));
    }

    #[test]
    fn test_validate_username() {
        let mut user = User::new("ann.b-1".into(), "ann@example.com".into(), "hash".into());
        assert!(user.validate().is_ok());

        user.username = "ann/../admin".into();
        assert!(user.validate().is_err());

        user.username = "ann".into();
        user.email = "not-an-email".into();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_column_length_limits() {
        let mut user = User::new("ann".into(), "ann@example.com".into(), "hash".into());
        user.first_name = "f".repeat(MAX_NAME_LEN);
        user.last_name = "l".repeat(MAX_NAME_LEN);
        user.email = format!("{}@example.com", "e".repeat(MAX_EMAIL_LEN - 12));
        assert!(user.validate().is_ok());

        user.email.insert(0, 'e');
        assert!(user.validate().is_err());

        user.email = "ann@example.com".into();
        user.last_name.push('l');
        assert!(user.validate().is_err());

        user.last_name.clear();
        user.username = "u".repeat(MAX_NAME_LEN + 1);
        assert!(user.validate().is_err());
    }
}
