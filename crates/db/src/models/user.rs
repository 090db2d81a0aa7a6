//! Directory mirror rows used to resolve names and avatars.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use angus_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub tenant_id: DbId,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The display fields of a user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserName {
    pub id: DbId,
    pub full_name: String,
    pub avatar: Option<String>,
}

/// DTO for registering a user in the directory mirror.
#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(max = 1000))]
    pub avatar: Option<String>,
}
