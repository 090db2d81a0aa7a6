//! Functional test case commands and queries.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::func::{result_update, MAX_CASE_STEPS};
use angus_core::priority::Priority;
use angus_core::quota::QuotaKind;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::func_case::{
    CaseDetail, CaseStep, CreateCase, FuncCase, NewCase, SetCaseRefs, SetCaseResult, UpdateCase,
};
use angus_db::models::Paged;
use angus_db::repositories::{
    ActivityRepo, CommentRepo, FuncCaseRepo, FuncPlanRepo, TagRepo, TaskRepo, UserRepo,
};
use angus_db::search::CASE_SEARCH;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, func_plan, search, tag};

/// Associated task and case ids after deduplication.
struct CaseRefs {
    task_ids: Vec<DbId>,
    case_ids: Vec<DbId>,
}

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateCase) -> AppResult<FuncCase> {
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let plan = func_plan::load(pool, ctx, input.plan_id).await?;
            let current = FuncCaseRepo::count_in_plan(pool, plan.id).await?;
            access::enforce_quota(pool, ctx, QuotaKind::CasesPerPlan, current, 1).await?;

            let steps = steps_json(&input.steps)?;
            let tag_ids = tag::check_tags(pool, ctx, plan.project_id, &input.tag_ids).await?;
            let refs = check_refs(pool, plan.project_id, None, &input.ref_task_ids, &input.ref_case_ids).await?;

            let new = NewCase {
                tenant_id: ctx.tenant_id,
                project_id: plan.project_id,
                plan_id: plan.id,
                name: access::required_name(&input.name)?,
                priority: input.priority.unwrap_or(Priority::Medium),
                tester_id: input.tester_id.unwrap_or(ctx.user_id),
                developer_id: input.developer_id,
                deadline_date: input.deadline_date,
                eval_workload: input.eval_workload,
                precondition: input.precondition,
                steps,
                description: input.description,
                created_by: ctx.user_id,
            };
            Ok::<_, AppError>((new, tag_ids, refs))
        },
        |(new, tag_ids, refs)| async move {
            let mut tx = pool.begin().await?;
            let case = FuncCaseRepo::insert(&mut tx, &new).await?;
            if !tag_ids.is_empty() {
                TagRepo::replace_targets_in(&mut tx, ctx, TargetType::FuncCase, case.id, &tag_ids)
                    .await?;
            }
            if !refs.task_ids.is_empty() || !refs.case_ids.is_empty() {
                FuncCaseRepo::replace_refs(&mut tx, case.id, &refs.task_ids, &refs.case_ids, ctx.user_id)
                    .await?;
            }
            ActivityRepo::insert(&mut tx, &activity(ctx, &case, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                plan_id = case.plan_id,
                case_id = case.id,
                code = %case.code,
                "Case created"
            );
            Ok(case)
        },
    )
    .await
}

pub async fn update(pool: &PgPool, ctx: &RequestContext, id: DbId, input: UpdateCase) -> AppResult<FuncCase> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            load(pool, ctx, id).await?;
            let name = input.name.as_deref().map(access::required_name).transpose()?;
            let steps = input.steps.as_deref().map(steps_json).transpose()?;
            Ok::<_, AppError>((name, steps))
        },
        |(name, steps)| async move {
            let mut tx = pool.begin().await?;
            let case = FuncCaseRepo::update(&mut tx, ctx, id, name.as_deref(), steps.as_ref(), input)
                .await?
                .ok_or(AppError::not_found("FuncCase", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &case, ActivityType::Updated)).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, case_id = id, "Case updated");
            Ok(case)
        },
    )
    .await
}

/// Record a test result, counting runs and failures.
pub async fn set_result(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: SetCaseResult,
) -> AppResult<FuncCase> {
    let input = &input;
    biz::run(
        async {
            let case = load(pool, ctx, id).await?;
            if input.actual_workload.is_some_and(|w| w < 0.0) {
                return Err(AppError::Core(CoreError::Validation(
                    "actual_workload must not be negative".to_string(),
                )));
            }
            let plan = FuncPlanRepo::find_by_id(pool, ctx.tenant_id, case.plan_id)
                .await?
                .ok_or(AppError::not_found("FuncPlan", case.plan_id))?;
            let update = result_update(plan.review_flag, case.review_status()?, input.result)?;
            Ok::<_, AppError>(update)
        },
        |update| async move {
            let mut tx = pool.begin().await?;
            let case = FuncCaseRepo::set_result(&mut tx, ctx, id, &update, input.actual_workload)
                .await?
                .ok_or(AppError::not_found("FuncCase", id))?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &case, ActivityType::ResultUpdated),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(case_id = id, result = %update.result, "Case result recorded");
            Ok(case)
        },
    )
    .await
}

/// Replace the tasks and cases a case is associated with.
pub async fn set_refs(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: SetCaseRefs,
) -> AppResult<CaseDetail> {
    biz::run(
        async {
            let case = load(pool, ctx, id).await?;
            let refs = check_refs(pool, case.project_id, Some(id), &input.task_ids, &input.case_ids).await?;
            Ok::<_, AppError>((case, refs))
        },
        |(case, refs)| async move {
            let mut tx = pool.begin().await?;
            FuncCaseRepo::replace_refs(&mut tx, id, &refs.task_ids, &refs.case_ids, ctx.user_id)
                .await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &case, ActivityType::Updated)).await?;
            tx.commit().await?;
            enrich(pool, ctx, case).await
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |case| async move {
        let mut tx = pool.begin().await?;
        if !FuncCaseRepo::soft_delete(&mut tx, ctx, id).await? {
            return Err(AppError::not_found("FuncCase", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &case, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, case_id = id, "Case moved to trash");
        Ok(())
    })
    .await
}

pub async fn detail(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<CaseDetail> {
    let case = load(pool, ctx, id).await?;
    enrich(pool, ctx, case).await
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<FuncCase>> {
    search::scoped_search(pool, ctx, &CASE_SEARCH, req, project_id).await
}

/// A live case the caller may act on.
pub(crate) async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<FuncCase> {
    let case = FuncCaseRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("FuncCase", id))?;
    access::require_member(pool, ctx, case.project_id).await?;
    Ok(case)
}

async fn enrich(pool: &PgPool, ctx: &RequestContext, case: FuncCase) -> AppResult<CaseDetail> {
    let tags = TagRepo::tags_of(pool, TargetType::FuncCase, case.id).await?;
    let (ref_tasks, ref_cases) = FuncCaseRepo::ref_targets(pool, case.id).await?;
    let comment_count = CommentRepo::count_for(pool, TargetType::FuncCase, case.id).await?;
    let tester_name = UserRepo::name_of(pool, ctx.tenant_id, case.tester_id)
        .await?
        .map(|u| u.full_name);
    Ok(CaseDetail {
        case,
        tags,
        ref_tasks,
        ref_cases,
        tester_name,
        comment_count,
    })
}

fn steps_json(steps: &[CaseStep]) -> AppResult<serde_json::Value> {
    if steps.len() > MAX_CASE_STEPS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "A case has at most {MAX_CASE_STEPS} steps"
        ))));
    }
    if steps.iter().any(|s| s.step.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation(
            "Case steps must not be empty".to_string(),
        )));
    }
    serde_json::to_value(steps).map_err(|e| AppError::InternalError(e.to_string()))
}

/// Deduplicate associations and require them to live in the same project.
async fn check_refs(
    pool: &PgPool,
    project_id: DbId,
    case_id: Option<DbId>,
    task_ids: &[DbId],
    case_ids: &[DbId],
) -> AppResult<CaseRefs> {
    let task_ids = dedup(task_ids);
    let case_ids = dedup(case_ids);
    if case_id.is_some_and(|id| case_ids.contains(&id)) {
        return Err(AppError::Core(CoreError::Validation(
            "A case cannot be associated with itself".to_string(),
        )));
    }
    if !task_ids.is_empty()
        && TaskRepo::count_in_project(pool, project_id, &task_ids).await? != task_ids.len() as i64
    {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Associated tasks must belong to project {project_id}"
        ))));
    }
    if !case_ids.is_empty()
        && FuncCaseRepo::count_in_project(pool, project_id, &case_ids).await?
            != case_ids.len() as i64
    {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Associated cases must belong to project {project_id}"
        ))));
    }
    Ok(CaseRefs { task_ids, case_ids })
}

fn dedup(ids: &[DbId]) -> Vec<DbId> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

fn activity(ctx: &RequestContext, case: &FuncCase, kind: ActivityType) -> NewActivity {
    NewActivity::new(ctx, Some(case.project_id), TargetType::FuncCase, case.id, &case.name, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(text: &str) -> CaseStep {
        CaseStep {
            step: text.to_string(),
            expected_result: None,
        }
    }

    #[test]
    fn steps_serialize_in_order() {
        let json = steps_json(&[step("Open login"), step("Submit")]).unwrap();
        assert_eq!(json[0]["step"], "Open login");
        assert_eq!(json[1]["step"], "Submit");
    }

    #[test]
    fn too_many_steps_rejected() {
        let steps: Vec<CaseStep> = (0..=MAX_CASE_STEPS).map(|i| step(&format!("s{i}"))).collect();
        assert!(steps_json(&steps).is_err());
    }

    #[test]
    fn blank_step_rejected() {
        assert!(steps_json(&[step("  ")]).is_err());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
