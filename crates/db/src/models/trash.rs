//! Trash listing rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use angus_core::activity::TargetType;
use angus_core::types::{DbId, Timestamp};

/// A single soft-deleted item surfaced in the trash list.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrashedItem {
    pub id: DbId,
    pub target_type: String,
    pub name: String,
    pub project_id: DbId,
    pub deleted_at: Timestamp,
    pub last_modified_by: DbId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrashListParams {
    #[serde(rename = "type")]
    pub target_type: Option<TargetType>,
    pub project_id: Option<DbId>,
}
