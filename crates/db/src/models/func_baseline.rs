//! Functional baseline model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::types::{DbId, Timestamp};

use crate::models::tag::TagInfo;
use crate::models::RefItem;

/// A row from the `func_baselines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FuncBaseline {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub plan_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub established: bool,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

/// A row from the `func_baseline_cases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FuncBaselineCase {
    pub id: DbId,
    pub baseline_id: DbId,
    pub case_id: DbId,
    pub case_snapshot: serde_json::Value,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBaseline {
    pub plan_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[serde(default)]
    pub case_ids: Vec<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBaseline {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineCaseIds {
    pub case_ids: Vec<DbId>,
}

/// Snapshot of a baseline case plus live enrichment of the underlying case.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineCaseDetail {
    pub baseline_id: DbId,
    pub case_id: DbId,
    pub snapshot: serde_json::Value,
    pub tags: Vec<TagInfo>,
    pub ref_tasks: Vec<RefItem>,
    pub ref_cases: Vec<RefItem>,
    pub created_by: DbId,
    pub creator_name: Option<String>,
    pub creator_avatar: Option<String>,
    pub tester_id: Option<DbId>,
    pub tester_name: Option<String>,
    pub comment_count: i64,
}
