use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::activity::TargetType;
use angus_core::types::{DbId, Timestamp};

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub target_type: String,
    pub target_id: DbId,
    pub content: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComment {
    pub target_type: TargetType,
    pub target_id: DbId,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Comment with the author's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
}

/// Query parameters selecting the commented target.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommentTarget {
    pub target_type: TargetType,
    pub target_id: DbId,
}
