//! Project commands and queries.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::project::{check_project_dates, normalize_project_name, MemberType};
use angus_core::quota::QuotaKind;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::project::{
    AddMembers, CreateProject, NewProject, Project, ProjectDetail, UpdateProject,
};
use angus_db::models::Paged;
use angus_db::repositories::{ActivityRepo, ProjectRepo, UserRepo};
use angus_db::search::PROJECT_SEARCH;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, search};

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateProject) -> AppResult<Project> {
    biz::run(
        async {
            let new = NewProject::assemble(ctx, input)?;
            let current = ProjectRepo::count(pool, ctx.tenant_id).await?;
            access::enforce_quota(pool, ctx, QuotaKind::Projects, current, 1).await?;
            Ok::<_, AppError>(new)
        },
        |new| async move {
            let mut tx = pool.begin().await?;
            let project = ProjectRepo::insert(&mut tx, &new).await?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &project, ActivityType::Created),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                user_id = ctx.user_id,
                project_id = project.id,
                "Project created"
            );
            Ok(project)
        },
    )
    .await
}

pub async fn update(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: UpdateProject,
) -> AppResult<Project> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let project = access::require_project(pool, ctx, id).await?;
            let name = input
                .name
                .as_deref()
                .map(normalize_project_name)
                .transpose()?;
            check_project_dates(
                input.start_date.or(project.start_date),
                input.deadline_date.or(project.deadline_date),
            )?;
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let project = ProjectRepo::update(
                &mut tx,
                ctx.tenant_id,
                id,
                input,
                name.as_deref(),
                ctx.user_id,
            )
            .await?
            .ok_or(AppError::not_found("Project", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &project, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, project_id = id, "Project updated");
            Ok(project)
        },
    )
    .await
}

/// Move a project to the trash. Only its owner or an admin may do this.
pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(require_owner(pool, ctx, id), |project| async move {
        let mut tx = pool.begin().await?;
        if !ProjectRepo::soft_delete(&mut tx, ctx.tenant_id, id, ctx.user_id).await? {
            return Err(AppError::not_found("Project", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &project, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, project_id = id, "Project moved to trash");
        Ok(())
    })
    .await
}

pub async fn detail(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<ProjectDetail> {
    let project = access::require_project(pool, ctx, id).await?;
    let members = ProjectRepo::member_views(pool, ctx.tenant_id, id).await?;
    let owner_name = UserRepo::name_of(pool, ctx.tenant_id, project.owner_id)
        .await?
        .map(|u| u.full_name);
    Ok(ProjectDetail::assemble(project, members, owner_name))
}

pub async fn add_members(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: AddMembers,
) -> AppResult<u64> {
    let input = &input;
    biz::run(
        async {
            if input.member_ids.is_empty() {
                return Err(AppError::Core(CoreError::Validation(
                    "member_ids must not be empty".to_string(),
                )));
            }
            require_owner(pool, ctx, id).await
        },
        |project| async move {
            let mut tx = pool.begin().await?;
            let added = ProjectRepo::add_members(
                &mut tx,
                id,
                input.member_type,
                &input.member_ids,
                ctx.user_id,
            )
            .await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &project, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(project_id = id, added, "Project members added");
            Ok(added)
        },
    )
    .await
}

/// Remove one member. The owner's own membership is kept.
pub async fn remove_member(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    member_type: MemberType,
    member_id: DbId,
) -> AppResult<()> {
    biz::run(
        async {
            let project = require_owner(pool, ctx, id).await?;
            if member_type == MemberType::User && member_id == project.owner_id {
                return Err(AppError::Core(CoreError::Business(
                    "The project owner cannot be removed".to_string(),
                )));
            }
            Ok::<_, AppError>(project)
        },
        |project| async move {
            let mut tx = pool.begin().await?;
            if !ProjectRepo::remove_member(&mut tx, id, member_type, member_id).await? {
                return Err(AppError::not_found("ProjectMember", member_id));
            }
            ActivityRepo::insert(&mut tx, &activity(ctx, &project, ActivityType::Updated)).await?;
            tx.commit().await?;
            Ok(())
        },
    )
    .await
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
) -> AppResult<Paged<Project>> {
    search::scoped_search(pool, ctx, &PROJECT_SEARCH, req, None).await
}

async fn require_owner(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    if ctx.is_admin || project.owner_id == ctx.user_id {
        Ok(project)
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner or an administrator can do this".to_string(),
        )))
    }
}

fn activity(ctx: &RequestContext, project: &Project, kind: ActivityType) -> NewActivity {
    NewActivity::new(
        ctx,
        Some(project.id),
        TargetType::Project,
        project.id,
        &project.name,
        kind,
    )
}
