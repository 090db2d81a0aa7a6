//! Report model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::report::ReportTemplate;
use angus_core::types::{DbId, Timestamp};

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub template: String,
    pub category: String,
    pub status: String,
    pub target_id: DbId,
    pub content_filter: Option<serde_json::Value>,
    pub failure_message: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

/// A row from the `report_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportRecord {
    pub id: DbId,
    pub report_id: DbId,
    pub content: serde_json::Value,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReport {
    pub project_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 40))]
    pub version: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub template: ReportTemplate,
    pub target_id: DbId,
    pub content_filter: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReport {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 40))]
    pub version: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub content_filter: Option<serde_json::Value>,
}
