//! Functional review model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::func::CaseReviewStatus;
use angus_core::types::{DbId, Timestamp};

/// A row from the `func_reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FuncReview {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub plan_id: DbId,
    pub name: String,
    pub status: String,
    pub owner_id: DbId,
    pub participant_ids: Vec<DbId>,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    pub description: Option<String>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

/// A row from the `func_review_cases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FuncReviewCase {
    pub id: DbId,
    pub review_id: DbId,
    pub case_id: DbId,
    pub review_status: String,
    pub reviewer_id: Option<DbId>,
    pub review_remark: Option<String>,
    pub review_date: Option<Timestamp>,
    pub case_snapshot: serde_json::Value,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReview {
    pub plan_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub owner_id: Option<DbId>,
    #[serde(default)]
    pub participant_ids: Vec<DbId>,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[serde(default)]
    pub case_ids: Vec<DbId>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewCaseInput {
    pub review_status: CaseReviewStatus,
    #[validate(length(max = 2000))]
    pub review_remark: Option<String>,
}
