//! Activity log rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use angus_core::activity::{describe, ActivityType, TargetType};
use angus_core::context::RequestContext;
use angus_core::types::{DbId, Timestamp};

/// A row from the `activities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Activity {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: Option<DbId>,
    pub user_id: DbId,
    pub target_type: String,
    pub target_id: DbId,
    pub target_name: String,
    pub activity_type: String,
    pub detail: String,
    pub opt_date: Timestamp,
}

/// An activity about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub tenant_id: DbId,
    pub project_id: Option<DbId>,
    pub user_id: DbId,
    pub target_type: TargetType,
    pub target_id: DbId,
    pub target_name: String,
    pub activity_type: ActivityType,
    pub detail: String,
}

impl NewActivity {
    pub fn new(
        ctx: &RequestContext,
        project_id: Option<DbId>,
        target_type: TargetType,
        target_id: DbId,
        target_name: &str,
        activity_type: ActivityType,
    ) -> Self {
        NewActivity {
            tenant_id: ctx.tenant_id,
            project_id,
            user_id: ctx.user_id,
            target_type,
            target_id,
            target_name: target_name.to_string(),
            activity_type,
            detail: describe(activity_type, target_type, target_name),
        }
    }
}

/// Query parameters for listing the activities of one target.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetActivityParams {
    pub target_type: TargetType,
    pub target_id: DbId,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
