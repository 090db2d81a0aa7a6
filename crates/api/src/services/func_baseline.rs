//! Baselines: frozen snapshots of a plan's cases.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::func::check_baseline_editable;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::func_baseline::{
    BaselineCaseDetail, CreateBaseline, FuncBaseline, FuncBaselineCase, UpdateBaseline,
};
use angus_db::models::func_case::FuncCase;
use angus_db::models::Paged;
use angus_db::repositories::{ActivityRepo, FuncBaselineRepo, FuncCaseRepo};
use angus_db::search::BASELINE_SEARCH;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, func_plan, search};

pub async fn create(
    pool: &PgPool,
    ctx: &RequestContext,
    input: CreateBaseline,
) -> AppResult<FuncBaseline> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let plan = func_plan::load(pool, ctx, input.plan_id).await?;
            let name = access::required_name(&input.name)?;
            let cases = plan_cases(pool, ctx, plan.id, &input.case_ids).await?;
            Ok::<_, AppError>((plan, name, cases))
        },
        |(plan, name, cases)| async move {
            let mut tx = pool.begin().await?;
            let baseline = FuncBaselineRepo::insert(
                &mut tx,
                ctx,
                plan.project_id,
                plan.id,
                &name,
                input.description.as_deref(),
            )
            .await?;
            let added = FuncBaselineRepo::add_cases(&mut tx, baseline.id, &cases, ctx.user_id).await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &baseline, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                plan_id = plan.id,
                baseline_id = baseline.id,
                cases = added,
                "Baseline created"
            );
            Ok(baseline)
        },
    )
    .await
}

pub async fn update(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: UpdateBaseline,
) -> AppResult<FuncBaseline> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let baseline = load(pool, ctx, id).await?;
            check_baseline_editable(baseline.established)?;
            let name = input.name.as_deref().map(access::required_name).transpose()?;
            Ok::<_, AppError>(name)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let baseline = FuncBaselineRepo::update(&mut tx, ctx, id, name.as_deref(), input)
                .await?
                .ok_or(AppError::not_found("FuncBaseline", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &baseline, ActivityType::Updated)).await?;
            tx.commit().await?;
            Ok(baseline)
        },
    )
    .await
}

/// Snapshot more cases of the plan into an open baseline.
pub async fn add_cases(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    case_ids: &[DbId],
) -> AppResult<u64> {
    biz::run(
        async {
            let baseline = load(pool, ctx, id).await?;
            check_baseline_editable(baseline.established)?;
            if case_ids.is_empty() {
                return Err(AppError::Core(CoreError::Validation(
                    "case_ids must not be empty".to_string(),
                )));
            }
            let cases = plan_cases(pool, ctx, baseline.plan_id, case_ids).await?;
            Ok::<_, AppError>((baseline, cases))
        },
        |(baseline, cases)| async move {
            let mut tx = pool.begin().await?;
            let added = FuncBaselineRepo::add_cases(&mut tx, id, &cases, ctx.user_id).await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &baseline, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(baseline_id = id, added, "Baseline cases added");
            Ok(added)
        },
    )
    .await
}

pub async fn remove_cases(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    case_ids: &[DbId],
) -> AppResult<u64> {
    biz::run(
        async {
            let baseline = load(pool, ctx, id).await?;
            check_baseline_editable(baseline.established)?;
            Ok::<_, AppError>(baseline)
        },
        |baseline| async move {
            let mut tx = pool.begin().await?;
            let removed = FuncBaselineRepo::remove_cases(&mut tx, id, case_ids).await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &baseline, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(baseline_id = id, removed, "Baseline cases removed");
            Ok(removed)
        },
    )
    .await
}

/// Freeze the baseline. Established baselines reject further changes.
pub async fn establish(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<FuncBaseline> {
    biz::run(
        async {
            let baseline = load(pool, ctx, id).await?;
            check_baseline_editable(baseline.established)?;
            Ok::<_, AppError>(baseline)
        },
        |_| async move {
            let mut tx = pool.begin().await?;
            let baseline = FuncBaselineRepo::establish(&mut tx, ctx, id)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Conflict(format!(
                        "Baseline {id} is already established"
                    )))
                })?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &baseline, ActivityType::BaselineEstablished),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(baseline_id = id, "Baseline established");
            Ok(baseline)
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |baseline| async move {
        let mut tx = pool.begin().await?;
        if !FuncBaselineRepo::delete(&mut tx, ctx.tenant_id, id).await? {
            return Err(AppError::not_found("FuncBaseline", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &baseline, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, baseline_id = id, "Baseline deleted");
        Ok(())
    })
    .await
}

pub async fn get(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<FuncBaseline> {
    load(pool, ctx, id).await
}

pub async fn list_cases(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
) -> AppResult<Vec<FuncBaselineCase>> {
    load(pool, ctx, id).await?;
    Ok(FuncBaselineRepo::list_cases(pool, id).await?)
}

/// The snapshot of one case enriched with its live tags, associations,
/// creator, tester and comment count.
pub async fn case_detail(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    case_id: DbId,
) -> AppResult<BaselineCaseDetail> {
    load(pool, ctx, id).await?;
    FuncBaselineRepo::case_detail(pool, ctx.tenant_id, id, case_id)
        .await?
        .ok_or(AppError::not_found("FuncBaselineCase", case_id))
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<FuncBaseline>> {
    search::scoped_search(pool, ctx, &BASELINE_SEARCH, req, project_id).await
}

async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<FuncBaseline> {
    let baseline = FuncBaselineRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("FuncBaseline", id))?;
    access::require_member(pool, ctx, baseline.project_id).await?;
    Ok(baseline)
}

/// Live cases of `plan_id`; every requested id must resolve.
pub(crate) async fn plan_cases(
    pool: &PgPool,
    ctx: &RequestContext,
    plan_id: DbId,
    case_ids: &[DbId],
) -> AppResult<Vec<FuncCase>> {
    if case_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids = case_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    let cases = FuncCaseRepo::find_in_plan(pool, ctx.tenant_id, plan_id, &ids).await?;
    if cases.len() != ids.len() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Some cases do not belong to plan {plan_id}"
        ))));
    }
    Ok(cases)
}

fn activity(ctx: &RequestContext, baseline: &FuncBaseline, kind: ActivityType) -> NewActivity {
    NewActivity::new(
        ctx,
        Some(baseline.project_id),
        TargetType::FuncBaseline,
        baseline.id,
        &baseline.name,
        kind,
    )
}
