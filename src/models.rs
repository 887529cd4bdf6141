//! Entity and wire models
//! Mission: Define users, lists and items plus the JSON contracts exposed over HTTP

use serde::{Deserialize, Serialize};

/// Maximum field lengths, in characters.
pub const MAX_USER_NAME_LEN: usize = 100;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_LIST_NAME_LEN: usize = 200;
pub const MAX_ITEM_NAME_LEN: usize = 300;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub is_admin: bool,
}

/// A to-do list owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: i64,
    pub name: String,
    #[serde(rename = "ownerID")]
    pub owner_id: i64,
    #[serde(rename = "ownerName", skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub list_id: i64,
}

/// User response (sanitized)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub is_admin: bool,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(rename = "ownerID")]
    pub owner_id: i64,
}

/// Body for renaming a list or item, and for adding an item.
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// Checks a required text field: non-blank and within `max_len` characters.
pub fn validate_text(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.chars().count() > max_len {
        return Err(format!("{field} must be at most {max_len} characters"));
    }
    Ok(())
}
