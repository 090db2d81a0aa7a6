//! Task sprint model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::types::{DbId, Timestamp};

/// A row from the `task_sprints` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskSprint {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub status: String,
    pub owner_id: DbId,
    pub start_date: Timestamp,
    pub deadline_date: Timestamp,
    pub acceptance_criteria: Option<String>,
    pub other_information: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSprint {
    pub project_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub owner_id: Option<DbId>,
    pub start_date: Timestamp,
    pub deadline_date: Timestamp,
    #[validate(length(max = 20000))]
    pub acceptance_criteria: Option<String>,
    #[validate(length(max = 20000))]
    pub other_information: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSprint {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub owner_id: Option<DbId>,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    #[validate(length(max = 20000))]
    pub acceptance_criteria: Option<String>,
    #[validate(length(max = 20000))]
    pub other_information: Option<String>,
}
