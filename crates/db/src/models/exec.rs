//! Execution job model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::exec::{ExecStatus, ScriptType};
use angus_core::types::{DbId, Timestamp};

/// A row from the `execs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Exec {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub script_type: String,
    pub plugin: String,
    pub script_id: Option<DbId>,
    pub script_yaml: String,
    pub status: String,
    pub priority: i32,
    pub thread_count: i32,
    pub iterations: Option<i64>,
    pub duration_secs: Option<i64>,
    pub ignore_assertions: bool,
    pub available_node_ids: Vec<DbId>,
    pub assign_node_ids: Vec<DbId>,
    pub exec_by: Option<DbId>,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    pub meter_status: Option<String>,
    pub meter_message: Option<String>,
    pub sample_summary: Option<serde_json::Value>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExec {
    pub project_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub script_type: ScriptType,
    #[validate(length(min = 1, max = 100))]
    pub plugin: Option<String>,
    pub script_id: Option<DbId>,
    #[validate(length(min = 1, max = 1000000))]
    pub script_yaml: String,
    #[validate(range(min = 0, max = 10000))]
    pub priority: Option<i32>,
    pub thread_count: i32,
    pub iterations: Option<i64>,
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub ignore_assertions: bool,
    #[serde(default)]
    pub available_node_ids: Vec<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateExec {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1000000))]
    pub script_yaml: Option<String>,
    #[validate(range(min = 0, max = 10000))]
    pub priority: Option<i32>,
    pub thread_count: Option<i32>,
    pub iterations: Option<i64>,
    pub duration_secs: Option<i64>,
    pub ignore_assertions: Option<bool>,
    pub available_node_ids: Option<Vec<DbId>>,
}

/// Status report posted by the runner.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExecResultReport {
    pub status: ExecStatus,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    #[serde(default)]
    pub assign_node_ids: Vec<DbId>,
    #[validate(length(max = 100))]
    pub meter_status: Option<String>,
    #[validate(length(max = 4000))]
    pub meter_message: Option<String>,
    pub sample_summary: Option<serde_json::Value>,
}
