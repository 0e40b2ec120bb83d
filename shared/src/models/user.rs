//! User models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_username;

/// A registered user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Only shown to the user themselves
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    pub join_date: DateTime<Utc>,
    pub active: bool,
}

impl User {
    /// Profile as seen by other users
    pub fn public(mut self) -> Self {
        self.email = None;
        self
    }
}

/// Compact user reference nested into other resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

/// Input for registering a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 32), custom = "validate_username")]
    pub username: String,
    #[validate(email, length(max = 64))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Input for a partial user update
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 32), custom = "validate_username")]
    pub username: Option<String>,
    #[validate(email, length(max = 64))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
}

impl UpdateUserInput {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Login credentials
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub data: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_input_validation() {
        let input = CreateUserInput {
            username: "test_user".to_string(),
            email: "test@test.com".to_string(),
            password: "test_pass".to_string(),
        };
        assert!(input.validate().is_ok());

        let input = CreateUserInput {
            username: "bad name!".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_update_user_input_skips_absent_fields() {
        let input = UpdateUserInput::default();
        assert!(input.is_empty());
        assert!(input.validate().is_ok());

        let input = UpdateUserInput {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(!input.is_empty());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_user_serialization_has_no_password() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            join_date: Utc::now(),
            active: true,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");

        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("email").is_none());
    }
}
