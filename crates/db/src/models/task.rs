//! Task model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::error::CoreError;
use angus_core::priority::Priority;
use angus_core::stats::TaskStat;
use angus_core::task::{TaskStatus, TaskType};
use angus_core::types::{DbId, Timestamp};

use crate::models::tag::TagInfo;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub sprint_id: Option<DbId>,
    pub name: String,
    pub code: String,
    pub task_type: String,
    pub status: String,
    pub priority: String,
    pub assignee_id: Option<DbId>,
    pub confirmer_id: Option<DbId>,
    pub deadline_date: Option<Timestamp>,
    pub start_date: Option<Timestamp>,
    pub processed_date: Option<Timestamp>,
    pub confirmed_date: Option<Timestamp>,
    pub completed_date: Option<Timestamp>,
    pub canceled_date: Option<Timestamp>,
    pub eval_workload: Option<f64>,
    pub actual_workload: Option<f64>,
    pub failure_count: i32,
    pub description: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn status(&self) -> Result<TaskStatus, CoreError> {
        TaskStatus::from_str_value(&self.status)
    }

    pub fn to_stat(&self) -> Result<TaskStat, CoreError> {
        Ok(TaskStat {
            status: self.status()?,
            deadline_date: self.deadline_date,
            failure_count: self.failure_count,
            eval_workload: self.eval_workload,
            actual_workload: self.actual_workload,
            start_date: self.start_date,
            completed_date: self.completed_date,
            assignee_id: self.assignee_id,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTask {
    pub project_id: DbId,
    pub sprint_id: Option<DbId>,
    #[validate(length(min = 1, max = 400))]
    pub name: String,
    pub task_type: Option<TaskType>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<DbId>,
    pub confirmer_id: Option<DbId>,
    pub deadline_date: Option<Timestamp>,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub eval_workload: Option<f64>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<DbId>,
}

/// Normalized insert values; `code` is allocated inside the insert transaction.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub sprint_id: Option<DbId>,
    pub name: String,
    pub task_type: TaskType,
    pub priority: Priority,
    pub assignee_id: Option<DbId>,
    pub confirmer_id: Option<DbId>,
    pub deadline_date: Option<Timestamp>,
    pub eval_workload: Option<f64>,
    pub description: Option<String>,
    pub created_by: DbId,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 400))]
    pub name: Option<String>,
    pub task_type: Option<TaskType>,
    pub priority: Option<Priority>,
    pub confirmer_id: Option<DbId>,
    pub deadline_date: Option<Timestamp>,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub eval_workload: Option<f64>,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub actual_workload: Option<f64>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignTask {
    pub assignee_id: Option<DbId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmTask {
    pub passed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveTask {
    pub sprint_id: Option<DbId>,
}

/// Task with its tags and comment count.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub tags: Vec<TagInfo>,
    pub assignee_name: Option<String>,
    pub confirmer_name: Option<String>,
    pub comment_count: i64,
}
