//! Integration tests for criteria search over tasks.

use serde_json::json;
use sqlx::PgPool;

use angus_core::activity::TargetType;
use angus_core::context::RequestContext;
use angus_core::priority::Priority;
use angus_core::project::MemberType;
use angus_core::search::{OrderSort, SearchCriteria, SearchOp, SearchRequest};
use angus_core::task::TaskType;
use angus_db::models::project::NewProject;
use angus_db::models::task::{NewTask, Task};
use angus_db::repositories::{ProjectRepo, TagRepo, TaskRepo};
use angus_db::search::{search, SearchScope, TASK_SEARCH};

const TENANT: i64 = 4;

fn ctx() -> RequestContext {
    RequestContext::new(TENANT, 40, false)
}

/// A project with tasks named `names`, priorities cycling HIGH, LOW.
async fn seed(pool: &PgPool, project_name: &str, names: &[&str]) -> Vec<Task> {
    let mut tx = pool.begin().await.unwrap();
    let project = ProjectRepo::insert(
        &mut tx,
        &NewProject {
            tenant_id: TENANT,
            name: project_name.to_string(),
            description: None,
            owner_id: 40,
            start_date: None,
            deadline_date: None,
            created_by: 40,
            member_user_ids: vec![40],
        },
    )
    .await
    .unwrap();

    let mut tasks = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let task = TaskRepo::insert(
            &mut tx,
            &NewTask {
                tenant_id: TENANT,
                project_id: project.id,
                sprint_id: None,
                name: name.to_string(),
                task_type: TaskType::Task,
                priority: if i % 2 == 0 { Priority::High } else { Priority::Low },
                assignee_id: None,
                confirmer_id: None,
                deadline_date: None,
                eval_workload: None,
                description: None,
                created_by: 40,
            },
        )
        .await
        .unwrap();
        tasks.push(task);
    }
    tx.commit().await.unwrap();
    tasks
}

async fn run(pool: &PgPool, project_id: i64, req: SearchRequest) -> (Vec<Task>, i64) {
    let compiled = TASK_SEARCH.compile(&req).unwrap();
    let page = search::<Task>(
        pool,
        &TASK_SEARCH,
        &compiled,
        SearchScope {
            tenant_id: TENANT,
            project_id: Some(project_id),
            member_id: None,
        },
    )
    .await
    .unwrap();
    (page.items, page.total)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn filters_by_enum_and_keyword(pool: PgPool) {
    let tasks = seed(&pool, "Search A", &["Login page", "Login api", "Logout", "Signup"]).await;
    let project_id = tasks[0].project_id;

    let req = SearchRequest {
        filters: vec![SearchCriteria::new("priority", SearchOp::Equal, Some(json!("HIGH")))],
        keyword: Some("login".to_string()),
        ..SearchRequest::default()
    };
    let (items, total) = run(&pool, project_id, req).await;

    assert_eq!(total, 1);
    assert_eq!(items[0].name, "Login page");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn keyword_matches_code(pool: PgPool) {
    let tasks = seed(&pool, "Search B", &["One", "Two"]).await;
    let req = SearchRequest {
        keyword: Some(tasks[1].code.clone()),
        ..SearchRequest::default()
    };
    let (items, total) = run(&pool, tasks[0].project_id, req).await;
    assert_eq!(total, 1);
    assert_eq!(items[0].id, tasks[1].id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pages_with_stable_order(pool: PgPool) {
    let tasks = seed(&pool, "Search C", &["a", "b", "c", "d", "e"]).await;
    let project_id = tasks[0].project_id;

    let req = SearchRequest {
        page_no: Some(2),
        page_size: Some(2),
        order_by: Some("id".to_string()),
        order_sort: Some(OrderSort::Asc),
        ..SearchRequest::default()
    };
    let (items, total) = run(&pool, project_id, req).await;

    assert_eq!(total, 5);
    let ids: Vec<i64> = items.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![tasks[2].id, tasks[3].id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn trashed_and_foreign_rows_excluded(pool: PgPool) {
    let mine = seed(&pool, "Search D", &["keep", "drop"]).await;
    seed(&pool, "Search E", &["elsewhere"]).await;

    let mut tx = pool.begin().await.unwrap();
    TaskRepo::soft_delete(&mut tx, &ctx(), mine[1].id).await.unwrap();
    tx.commit().await.unwrap();

    let (items, total) = run(&pool, mine[0].project_id, SearchRequest::default()).await;
    assert_eq!(total, 1);
    assert_eq!(items[0].id, mine[0].id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tag_filter_uses_associations(pool: PgPool) {
    let tasks = seed(&pool, "Search F", &["tagged", "plain"]).await;
    let project_id = tasks[0].project_id;

    let mut tx = pool.begin().await.unwrap();
    let tags = TagRepo::create_or_get(&mut tx, &ctx(), project_id, &["smoke".to_string()])
        .await
        .unwrap();
    TagRepo::replace_targets_in(&mut tx, &ctx(), TargetType::Task, tasks[0].id, &[tags[0].id])
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let with_tag = SearchRequest {
        filters: vec![SearchCriteria::new("tag_id", SearchOp::Equal, Some(json!(tags[0].id)))],
        ..SearchRequest::default()
    };
    let (items, _) = run(&pool, project_id, with_tag).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, tasks[0].id);

    let without_tag = SearchRequest {
        filters: vec![SearchCriteria::new("tag_id", SearchOp::NotIn, Some(json!([tags[0].id])))],
        ..SearchRequest::default()
    };
    let (items, _) = run(&pool, project_id, without_tag).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, tasks[1].id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_result_has_zero_total(pool: PgPool) {
    let tasks = seed(&pool, "Search G", &["x"]).await;
    let req = SearchRequest {
        keyword: Some("no such task".to_string()),
        ..SearchRequest::default()
    };
    let (items, total) = run(&pool, tasks[0].project_id, req).await;
    assert_eq!(total, 0);
    assert!(items.is_empty());
}

async fn run_unscoped(pool: &PgPool, member_id: Option<i64>) -> Vec<i64> {
    let compiled = TASK_SEARCH.compile(&SearchRequest::default()).unwrap();
    let page = search::<Task>(
        pool,
        &TASK_SEARCH,
        &compiled,
        SearchScope {
            tenant_id: TENANT,
            project_id: None,
            member_id,
        },
    )
    .await
    .unwrap();
    let mut ids: Vec<i64> = page.items.iter().map(|t| t.id).collect();
    ids.sort_unstable();
    ids
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unscoped_search_sees_only_member_projects(pool: PgPool) {
    let joined = seed(&pool, "Search H", &["visible"]).await;
    let foreign = seed(&pool, "Search I", &["hidden"]).await;

    // User 50 owns nothing and belongs nowhere yet.
    assert!(run_unscoped(&pool, Some(50)).await.is_empty());

    let mut tx = pool.begin().await.unwrap();
    ProjectRepo::add_members(&mut tx, joined[0].project_id, MemberType::User, &[50], 40)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(run_unscoped(&pool, Some(50)).await, vec![joined[0].id]);

    // Owner sees both; admins are not narrowed.
    assert_eq!(run_unscoped(&pool, Some(40)).await, vec![joined[0].id, foreign[0].id]);
    assert_eq!(run_unscoped(&pool, None).await, vec![joined[0].id, foreign[0].id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unscoped_search_skips_trashed_projects(pool: PgPool) {
    let live = seed(&pool, "Search J", &["live"]).await;
    let trashed = seed(&pool, "Search K", &["gone"]).await;

    let mut tx = pool.begin().await.unwrap();
    ProjectRepo::soft_delete(&mut tx, TENANT, trashed[0].project_id, 40)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(run_unscoped(&pool, Some(40)).await, vec![live[0].id]);
}
