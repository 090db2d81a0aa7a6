//! Functional test plan commands and queries.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::func::{next_plan_status, PlanStatus};
use angus_core::quota::QuotaKind;
use angus_core::search::SearchRequest;
use angus_core::sprint::{check_sprint_date_range, normalize_name, LifecycleAction};
use angus_core::stats::CaseCount;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::func_case::FuncCase;
use angus_db::models::func_plan::{CreatePlan, FuncPlan, UpdatePlan};
use angus_db::models::Paged;
use angus_db::repositories::func_plan_repo::NewPlan;
use angus_db::repositories::{ActivityRepo, FuncCaseRepo, FuncPlanRepo};
use angus_db::search::PLAN_SEARCH;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, search};

#[derive(Debug, Serialize)]
pub struct PlanDetail {
    #[serde(flatten)]
    pub plan: FuncPlan,
    pub case_count: CaseCount,
}

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreatePlan) -> AppResult<FuncPlan> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            access::require_project(pool, ctx, input.project_id).await?;
            let name = normalize_name(&input.name)?;
            check_sprint_date_range(input.start_date, input.deadline_date, Utc::now())?;
            let current = FuncPlanRepo::count_in_project(pool, input.project_id).await?;
            access::enforce_quota(pool, ctx, QuotaKind::PlansPerProject, current, 1).await?;
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let plan = FuncPlanRepo::insert(
                &mut tx,
                ctx,
                &NewPlan {
                    project_id: input.project_id,
                    name: &name,
                    owner_id: input.owner_id.unwrap_or(ctx.user_id),
                    start_date: input.start_date,
                    deadline_date: input.deadline_date,
                    review_flag: input.review_flag,
                    description: input.description.as_deref(),
                },
            )
            .await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &plan, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                project_id = plan.project_id,
                plan_id = plan.id,
                "Plan created"
            );
            Ok(plan)
        },
    )
    .await
}

pub async fn update(pool: &PgPool, ctx: &RequestContext, id: DbId, input: UpdatePlan) -> AppResult<FuncPlan> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let plan = load(pool, ctx, id).await?;
            let name = input.name.as_deref().map(normalize_name).transpose()?;
            let start = input.start_date.unwrap_or(plan.start_date);
            let deadline = input.deadline_date.unwrap_or(plan.deadline_date);
            if start != plan.start_date || deadline != plan.deadline_date {
                check_sprint_date_range(start, deadline, Utc::now())?;
            }
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let plan = FuncPlanRepo::update(&mut tx, ctx, id, name.as_deref(), input)
                .await?
                .ok_or(AppError::not_found("FuncPlan", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &plan, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, plan_id = id, "Plan updated");
            Ok(plan)
        },
    )
    .await
}

pub async fn change_status(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    action: LifecycleAction,
) -> AppResult<FuncPlan> {
    biz::run(
        async {
            let plan = load(pool, ctx, id).await?;
            let current = PlanStatus::from_str_value(&plan.status)?;
            Ok::<_, AppError>((current, next_plan_status(current, action)?))
        },
        |(current, next)| async move {
            let mut tx = pool.begin().await?;
            let plan = FuncPlanRepo::set_status(&mut tx, ctx, id, current, next)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Conflict(format!(
                        "Plan {id} changed status concurrently"
                    )))
                })?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &plan, ActivityType::StatusUpdated),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(plan_id = id, status = %next, "Plan status changed");
            Ok(plan)
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |plan| async move {
        let mut tx = pool.begin().await?;
        if !FuncPlanRepo::soft_delete(&mut tx, ctx, id).await? {
            return Err(AppError::not_found("FuncPlan", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &plan, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, plan_id = id, "Plan moved to trash");
        Ok(())
    })
    .await
}

pub async fn detail(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<PlanDetail> {
    let plan = load(pool, ctx, id).await?;
    let cases = FuncCaseRepo::list_for_stats(pool, ctx.tenant_id, plan.project_id, Some(id)).await?;
    let stats = cases.iter().map(FuncCase::to_stat).collect::<Result<Vec<_>, _>>()?;
    Ok(PlanDetail {
        case_count: CaseCount::from_stats(&stats, Utc::now()),
        plan,
    })
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<FuncPlan>> {
    search::scoped_search(pool, ctx, &PLAN_SEARCH, req, project_id).await
}

/// A live plan the caller may act on.
pub(crate) async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<FuncPlan> {
    let plan = FuncPlanRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("FuncPlan", id))?;
    access::require_member(pool, ctx, plan.project_id).await?;
    Ok(plan)
}

fn activity(ctx: &RequestContext, plan: &FuncPlan, kind: ActivityType) -> NewActivity {
    NewActivity::new(ctx, Some(plan.project_id), TargetType::FuncPlan, plan.id, &plan.name, kind)
}
