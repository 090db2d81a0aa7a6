//! Integration tests for functional test plans, cases and baselines.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;

use angus_core::activity::TargetType;
use angus_core::context::RequestContext;
use angus_core::func::{result_update, CaseReviewStatus, CaseTestResult, PlanStatus};
use angus_core::priority::Priority;
use angus_core::task::TaskType;
use angus_db::models::func_case::{FuncCase, NewCase};
use angus_db::models::func_plan::FuncPlan;
use angus_db::models::project::{NewProject, Project};
use angus_db::models::task::NewTask;
use angus_db::models::user::CreateUser;
use angus_db::repositories::func_plan_repo::NewPlan;
use angus_db::repositories::{
    CommentRepo, FuncBaselineRepo, FuncCaseRepo, FuncPlanRepo, ProjectRepo, TagRepo, TaskRepo,
    UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TENANT: i64 = 9;

fn ctx(user_id: i64) -> RequestContext {
    RequestContext::new(TENANT, user_id, false)
}

async fn seed_plan(pool: &PgPool, user_id: i64) -> (Project, FuncPlan) {
    let now = Utc::now();
    let mut tx = pool.begin().await.unwrap();
    let project = ProjectRepo::insert(
        &mut tx,
        &NewProject {
            tenant_id: TENANT,
            name: "Storefront".to_string(),
            description: None,
            owner_id: user_id,
            start_date: None,
            deadline_date: None,
            created_by: user_id,
            member_user_ids: vec![user_id],
        },
    )
    .await
    .unwrap();
    let plan = FuncPlanRepo::insert(
        &mut tx,
        &ctx(user_id),
        &NewPlan {
            project_id: project.id,
            name: "Release 2.0",
            owner_id: user_id,
            start_date: now,
            deadline_date: now + Duration::days(10),
            review_flag: false,
            description: None,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    (project, plan)
}

fn new_case(plan: &FuncPlan, name: &str, tester_id: i64, created_by: i64) -> NewCase {
    NewCase {
        tenant_id: TENANT,
        project_id: plan.project_id,
        plan_id: plan.id,
        name: name.to_string(),
        priority: Priority::Medium,
        tester_id,
        developer_id: None,
        deadline_date: None,
        eval_workload: Some(2.0),
        precondition: None,
        steps: json!([{ "step": "open page", "expected_result": "page loads" }]),
        description: None,
        created_by,
    }
}

async fn seed_case(pool: &PgPool, plan: &FuncPlan, name: &str) -> FuncCase {
    let mut tx = pool.begin().await.unwrap();
    let case = FuncCaseRepo::insert(&mut tx, &new_case(plan, name, 1, 1))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    case
}

async fn seed_user(pool: &PgPool, username: &str, full_name: &str) -> i64 {
    UserRepo::create(
        pool,
        TENANT,
        &CreateUser {
            username: username.to_string(),
            full_name: full_name.to_string(),
            avatar: Some(format!("/avatars/{username}.png")),
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Codes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn case_codes_are_sequential_per_project(pool: PgPool) {
    let (_, plan) = seed_plan(&pool, 1).await;
    let first = seed_case(&pool, &plan, "Login").await;
    let second = seed_case(&pool, &plan, "Logout").await;

    assert_eq!(first.code, "C000001");
    assert_eq!(second.code, "C000002");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn trashed_cases_keep_their_code_slot(pool: PgPool) {
    let (_, plan) = seed_plan(&pool, 1).await;
    let first = seed_case(&pool, &plan, "Search").await;

    let mut tx = pool.begin().await.unwrap();
    FuncCaseRepo::soft_delete(&mut tx, &ctx(1), first.id).await.unwrap();
    tx.commit().await.unwrap();

    let next = seed_case(&pool, &plan, "Filter").await;
    assert_eq!(next.code, "C000002");
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn results_accumulate_counters(pool: PgPool) {
    let (_, plan) = seed_plan(&pool, 1).await;
    let case = seed_case(&pool, &plan, "Cart").await;

    let failed = result_update(false, CaseReviewStatus::Pending, CaseTestResult::NotPassed).unwrap();
    let passed = result_update(false, CaseReviewStatus::Pending, CaseTestResult::Passed).unwrap();

    let mut tx = pool.begin().await.unwrap();
    FuncCaseRepo::set_result(&mut tx, &ctx(1), case.id, &failed, None)
        .await
        .unwrap();
    let updated = FuncCaseRepo::set_result(&mut tx, &ctx(1), case.id, &passed, Some(3.5))
        .await
        .unwrap()
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.test_result, "PASSED");
    assert_eq!(updated.test_num, 2);
    assert_eq!(updated.test_fail_num, 1);
    assert_eq!(updated.actual_workload, Some(3.5));
    assert!(updated.test_result_handle_date.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_to_pending_clears_handle_date(pool: PgPool) {
    let (_, plan) = seed_plan(&pool, 1).await;
    let case = seed_case(&pool, &plan, "Payment").await;

    let passed = result_update(false, CaseReviewStatus::Pending, CaseTestResult::Passed).unwrap();
    let pending = result_update(false, CaseReviewStatus::Pending, CaseTestResult::Pending).unwrap();

    let mut tx = pool.begin().await.unwrap();
    FuncCaseRepo::set_result(&mut tx, &ctx(1), case.id, &passed, None)
        .await
        .unwrap();
    let reset = FuncCaseRepo::set_result(&mut tx, &ctx(1), case.id, &pending, None)
        .await
        .unwrap()
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(reset.test_result, "PENDING");
    assert!(reset.test_result_handle_date.is_none());
    assert_eq!(reset.test_num, 1);
}

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn baseline_keeps_first_snapshot(pool: PgPool) {
    let (project, plan) = seed_plan(&pool, 1).await;
    let case = seed_case(&pool, &plan, "Original name").await;

    let mut tx = pool.begin().await.unwrap();
    let baseline =
        FuncBaselineRepo::insert(&mut tx, &ctx(1), project.id, plan.id, "v1", None)
            .await
            .unwrap();
    let added = FuncBaselineRepo::add_cases(&mut tx, baseline.id, &[case.clone()], 1)
        .await
        .unwrap();
    assert_eq!(added, 1);

    let mut renamed = case.clone();
    renamed.name = "Renamed".to_string();
    let again = FuncBaselineRepo::add_cases(&mut tx, baseline.id, &[renamed], 1)
        .await
        .unwrap();
    assert_eq!(again, 0);
    tx.commit().await.unwrap();

    let row = FuncBaselineRepo::find_case(&pool, baseline.id, case.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.case_snapshot["name"], "Original name");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn establish_only_once(pool: PgPool) {
    let (project, plan) = seed_plan(&pool, 1).await;

    let mut tx = pool.begin().await.unwrap();
    let baseline =
        FuncBaselineRepo::insert(&mut tx, &ctx(1), project.id, plan.id, "v1", None)
            .await
            .unwrap();
    let first = FuncBaselineRepo::establish(&mut tx, &ctx(1), baseline.id)
        .await
        .unwrap();
    let second = FuncBaselineRepo::establish(&mut tx, &ctx(1), baseline.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(first.is_some_and(|b| b.established));
    assert!(second.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn baseline_case_detail_is_enriched(pool: PgPool) {
    let creator = seed_user(&pool, "ana", "Ana Costa").await;
    let tester = seed_user(&pool, "li", "Li Wei").await;
    let (project, plan) = seed_plan(&pool, creator).await;

    let mut tx = pool.begin().await.unwrap();
    let case = FuncCaseRepo::insert(&mut tx, &new_case(&plan, "Checkout", tester, creator))
        .await
        .unwrap();
    let linked = FuncCaseRepo::insert(&mut tx, &new_case(&plan, "Refund", tester, creator))
        .await
        .unwrap();
    let task = TaskRepo::insert(
        &mut tx,
        &NewTask {
            tenant_id: TENANT,
            project_id: project.id,
            sprint_id: None,
            name: "Fix checkout bug".to_string(),
            task_type: TaskType::Bug,
            priority: Priority::High,
            assignee_id: None,
            confirmer_id: None,
            deadline_date: None,
            eval_workload: None,
            description: None,
            created_by: creator,
        },
    )
    .await
    .unwrap();
    FuncCaseRepo::replace_refs(&mut tx, case.id, &[task.id], &[linked.id], creator)
        .await
        .unwrap();
    let tags = TagRepo::create_or_get(&mut tx, &ctx(creator), project.id, &["p0".to_string()])
        .await
        .unwrap();
    TagRepo::replace_targets_in(&mut tx, &ctx(creator), TargetType::FuncCase, case.id, &[tags[0].id])
        .await
        .unwrap();
    CommentRepo::insert(&mut tx, TENANT, project.id, TargetType::FuncCase, case.id, "ok", tester)
        .await
        .unwrap();
    let baseline =
        FuncBaselineRepo::insert(&mut tx, &ctx(creator), project.id, plan.id, "v1", None)
            .await
            .unwrap();
    FuncBaselineRepo::add_cases(&mut tx, baseline.id, &[case.clone()], creator)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let detail = FuncBaselineRepo::case_detail(&pool, TENANT, baseline.id, case.id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(detail.snapshot["code"], case.code.as_str());
    assert_eq!(detail.tags.len(), 1);
    assert_eq!(detail.tags[0].name, "p0");
    assert_eq!(detail.ref_tasks.len(), 1);
    assert_eq!(detail.ref_tasks[0].id, task.id);
    assert_eq!(detail.ref_cases.len(), 1);
    assert_eq!(detail.ref_cases[0].code, linked.code);
    assert_eq!(detail.created_by, creator);
    assert_eq!(detail.creator_name.as_deref(), Some("Ana Costa"));
    assert_eq!(detail.creator_avatar.as_deref(), Some("/avatars/ana.png"));
    assert_eq!(detail.tester_id, Some(tester));
    assert_eq!(detail.tester_name.as_deref(), Some("Li Wei"));
    assert_eq!(detail.comment_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn baseline_case_detail_missing_case(pool: PgPool) {
    let (project, plan) = seed_plan(&pool, 1).await;
    let mut tx = pool.begin().await.unwrap();
    let baseline =
        FuncBaselineRepo::insert(&mut tx, &ctx(1), project.id, plan.id, "v1", None)
            .await
            .unwrap();
    tx.commit().await.unwrap();

    let detail = FuncBaselineRepo::case_detail(&pool, TENANT, baseline.id, 4242)
        .await
        .unwrap();
    assert!(detail.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_plan_transition_is_refused(pool: PgPool) {
    let (_, plan) = seed_plan(&pool, 7).await;

    let mut tx = pool.begin().await.unwrap();
    let started = FuncPlanRepo::set_status(
        &mut tx,
        &ctx(7),
        plan.id,
        PlanStatus::Pending,
        PlanStatus::InProgress,
    )
    .await
    .unwrap();
    assert_eq!(started.unwrap().status, "IN_PROGRESS");

    // A second writer that still saw PENDING loses.
    let stale = FuncPlanRepo::set_status(
        &mut tx,
        &ctx(7),
        plan.id,
        PlanStatus::Pending,
        PlanStatus::Blocked,
    )
    .await;
    assert_matches!(stale, Ok(None));
    tx.commit().await.unwrap();

    let plan = FuncPlanRepo::find_by_id(&pool, TENANT, plan.id).await.unwrap().unwrap();
    assert_eq!(plan.status, "IN_PROGRESS");
}
