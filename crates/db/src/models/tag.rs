//! Tag and tag-target models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

/// Lightweight tag info returned when listing tags of a target.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TagInfo {
    pub id: DbId,
    pub name: String,
}

/// Tag row with how many targets carry it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagUsage {
    pub id: DbId,
    pub name: String,
    pub usage_count: i64,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTags {
    pub project_id: DbId,
    #[validate(length(min = 1, max = 100))]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTag {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Full replacement of a target's tag set.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceTags {
    pub tag_ids: Vec<DbId>,
}
