//! Membership, quota and target lookups shared by the services.

use angus_core::activity::TargetType;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::quota::{check_quota, QuotaKind};
use angus_core::types::DbId;
use angus_db::models::project::Project;
use angus_db::repositories::{FuncCaseRepo, ProjectRepo, SettingRepo, TaskRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Load a live project the caller may act on.
///
/// Owners, USER members and tenant admins pass.
pub async fn require_project(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(pool, ctx.tenant_id, project_id)
        .await?
        .ok_or(AppError::not_found("Project", project_id))?;
    require_member(pool, ctx, project_id).await?;
    Ok(project)
}

/// Membership check without loading the project; works for trashed projects.
pub async fn require_member(pool: &PgPool, ctx: &RequestContext, project_id: DbId) -> AppResult<()> {
    if ctx.is_admin || ProjectRepo::is_member(pool, project_id, ctx.user_id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(format!(
            "Not a member of project {project_id}"
        ))))
    }
}

/// Refuse adding `increment` items of `kind` when the tenant limit is reached.
pub async fn enforce_quota(
    pool: &PgPool,
    ctx: &RequestContext,
    kind: QuotaKind,
    current: i64,
    increment: i64,
) -> AppResult<()> {
    let limit = SettingRepo::quota_limit(pool, ctx.tenant_id, kind).await?;
    check_quota(kind, current, increment, limit)?;
    Ok(())
}

/// A live task or case that tags and comments attach to.
#[derive(Debug, Clone)]
pub struct TaggableTarget {
    pub target_type: TargetType,
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
}

/// Resolve a tag/comment target and check the caller's membership.
pub async fn require_taggable(
    pool: &PgPool,
    ctx: &RequestContext,
    target_type: TargetType,
    id: DbId,
) -> AppResult<TaggableTarget> {
    let (project_id, name) = match target_type {
        TargetType::Task => {
            let task = TaskRepo::find_by_id(pool, ctx.tenant_id, id)
                .await?
                .ok_or(AppError::not_found("Task", id))?;
            (task.project_id, task.name)
        }
        TargetType::FuncCase => {
            let case = FuncCaseRepo::find_by_id(pool, ctx.tenant_id, id)
                .await?
                .ok_or(AppError::not_found("FuncCase", id))?;
            (case.project_id, case.name)
        }
        other => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{other} targets cannot carry tags or comments"
            ))))
        }
    };
    require_member(pool, ctx, project_id).await?;
    Ok(TaggableTarget {
        target_type,
        id,
        project_id,
        name,
    })
}

/// Trim a required name, rejecting blanks.
pub fn required_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
