//! Integration tests for soft delete, trash listing, restore and purge.
//!
//! - Trashed rows disappear from `find_by_id` and show up in the trash
//! - Restore is refused while a parent is still trashed
//! - Purge hard-deletes and sweeps tag and comment rows of purged targets

use chrono::{Duration, Utc};
use sqlx::PgPool;

use angus_core::activity::TargetType;
use angus_core::context::RequestContext;
use angus_core::priority::Priority;
use angus_core::task::TaskType;
use angus_db::models::project::{NewProject, Project};
use angus_db::models::sprint::TaskSprint;
use angus_db::models::task::{NewTask, Task};
use angus_db::repositories::sprint_repo::NewSprint;
use angus_db::repositories::{
    CommentRepo, ProjectRepo, SprintRepo, TagRepo, TaskRepo, TrashRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TENANT: i64 = 3;

fn ctx() -> RequestContext {
    RequestContext::new(TENANT, 30, false)
}

async fn seed_project(pool: &PgPool, name: &str) -> Project {
    let ctx = ctx();
    let mut tx = pool.begin().await.unwrap();
    let project = ProjectRepo::insert(
        &mut tx,
        &NewProject {
            tenant_id: TENANT,
            name: name.to_string(),
            description: None,
            owner_id: ctx.user_id,
            start_date: None,
            deadline_date: None,
            created_by: ctx.user_id,
            member_user_ids: vec![ctx.user_id],
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    project
}

async fn seed_sprint(pool: &PgPool, project_id: i64) -> TaskSprint {
    let now = Utc::now();
    let mut tx = pool.begin().await.unwrap();
    let sprint = SprintRepo::insert(
        &mut tx,
        &ctx(),
        &NewSprint {
            project_id,
            name: "Sprint 1",
            owner_id: 30,
            start_date: now,
            deadline_date: now + Duration::days(14),
            acceptance_criteria: None,
            other_information: None,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    sprint
}

async fn seed_task(pool: &PgPool, project_id: i64, sprint_id: Option<i64>) -> Task {
    let mut tx = pool.begin().await.unwrap();
    let task = TaskRepo::insert(
        &mut tx,
        &NewTask {
            tenant_id: TENANT,
            project_id,
            sprint_id,
            name: "Checkout smoke".to_string(),
            task_type: TaskType::Task,
            priority: Priority::High,
            assignee_id: None,
            confirmer_id: None,
            deadline_date: None,
            eval_workload: None,
            description: None,
            created_by: 30,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    task
}

async fn trash_task(pool: &PgPool, id: i64) {
    let mut tx = pool.begin().await.unwrap();
    assert!(TaskRepo::soft_delete(&mut tx, &ctx(), id).await.unwrap());
    tx.commit().await.unwrap();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn soft_deleted_task_moves_to_trash(pool: PgPool) {
    let project = seed_project(&pool, "Trash A").await;
    let task = seed_task(&pool, project.id, None).await;

    trash_task(&pool, task.id).await;

    assert!(TaskRepo::find_by_id(&pool, TENANT, task.id).await.unwrap().is_none());
    let items = TrashRepo::list(&pool, TENANT, None, None).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, task.id);
    assert_eq!(items[0].target_type, "TASK");
    assert_eq!(items[0].project_id, project.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_soft_delete_returns_false(pool: PgPool) {
    let project = seed_project(&pool, "Trash B").await;
    let task = seed_task(&pool, project.id, None).await;
    trash_task(&pool, task.id).await;

    let mut tx = pool.begin().await.unwrap();
    assert!(!TaskRepo::soft_delete(&mut tx, &ctx(), task.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_type_and_project(pool: PgPool) {
    let one = seed_project(&pool, "Trash C1").await;
    let two = seed_project(&pool, "Trash C2").await;
    let a = seed_task(&pool, one.id, None).await;
    let b = seed_task(&pool, two.id, None).await;
    trash_task(&pool, a.id).await;
    trash_task(&pool, b.id).await;

    let mut tx = pool.begin().await.unwrap();
    ProjectRepo::soft_delete(&mut tx, TENANT, two.id, 30).await.unwrap();
    tx.commit().await.unwrap();

    let all = TrashRepo::list(&pool, TENANT, None, None).await.unwrap();
    assert_eq!(all.len(), 3);

    let tasks = TrashRepo::list(&pool, TENANT, Some(TargetType::Task), None)
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);

    let in_one = TrashRepo::list(&pool, TENANT, None, Some(one.id)).await.unwrap();
    assert_eq!(in_one.len(), 1);
    assert_eq!(in_one[0].id, a.id);

    let other_tenant = TrashRepo::list(&pool, TENANT + 1, None, None).await.unwrap();
    assert!(other_tenant.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restore_refused_while_sprint_trashed(pool: PgPool) {
    let project = seed_project(&pool, "Trash D").await;
    let sprint = seed_sprint(&pool, project.id).await;
    let task = seed_task(&pool, project.id, Some(sprint.id)).await;
    trash_task(&pool, task.id).await;

    let mut tx = pool.begin().await.unwrap();
    SprintRepo::soft_delete(&mut tx, &ctx(), sprint.id).await.unwrap();
    tx.commit().await.unwrap();

    let parent = TrashRepo::trashed_parent(&pool, TargetType::Task, task.id)
        .await
        .unwrap();
    assert_eq!(parent, Some(TargetType::TaskSprint));

    let mut tx = pool.begin().await.unwrap();
    assert!(TrashRepo::restore(&mut tx, TENANT, TargetType::TaskSprint, sprint.id, 30)
        .await
        .unwrap());
    tx.commit().await.unwrap();

    let parent = TrashRepo::trashed_parent(&pool, TargetType::Task, task.id)
        .await
        .unwrap();
    assert_eq!(parent, None);

    let mut tx = pool.begin().await.unwrap();
    assert!(TrashRepo::restore(&mut tx, TENANT, TargetType::Task, task.id, 30)
        .await
        .unwrap());
    tx.commit().await.unwrap();
    assert!(TaskRepo::find_by_id(&pool, TENANT, task.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restore_of_live_row_is_noop(pool: PgPool) {
    let project = seed_project(&pool, "Trash E").await;
    let task = seed_task(&pool, project.id, None).await;

    let mut tx = pool.begin().await.unwrap();
    let restored = TrashRepo::restore(&mut tx, TENANT, TargetType::Task, task.id, 30)
        .await
        .unwrap();
    assert!(!restored);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_one_sweeps_tags_and_comments(pool: PgPool) {
    let project = seed_project(&pool, "Trash F").await;
    let task = seed_task(&pool, project.id, None).await;

    let mut tx = pool.begin().await.unwrap();
    let tags = TagRepo::create_or_get(&mut tx, &ctx(), project.id, &["gone".to_string()])
        .await
        .unwrap();
    let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
    TagRepo::replace_targets_in(&mut tx, &ctx(), TargetType::Task, task.id, &tag_ids)
        .await
        .unwrap();
    CommentRepo::insert(&mut tx, TENANT, project.id, TargetType::Task, task.id, "note", 30)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    trash_task(&pool, task.id).await;

    let mut tx = pool.begin().await.unwrap();
    assert!(TrashRepo::purge_one(&mut tx, TENANT, TargetType::Task, task.id)
        .await
        .unwrap());
    tx.commit().await.unwrap();

    assert!(TrashRepo::find(&pool, TENANT, TargetType::Task, task.id)
        .await
        .unwrap()
        .is_none());
    assert!(TagRepo::tags_of(&pool, TargetType::Task, task.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        CommentRepo::count_for(&pool, TargetType::Task, task.id).await.unwrap(),
        0
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_one_ignores_live_rows(pool: PgPool) {
    let project = seed_project(&pool, "Trash G").await;
    let task = seed_task(&pool, project.id, None).await;

    let mut tx = pool.begin().await.unwrap();
    let purged = TrashRepo::purge_one(&mut tx, TENANT, TargetType::Task, task.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(!purged);
    assert!(TaskRepo::find_by_id(&pool, TENANT, task.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_all_empties_the_trash(pool: PgPool) {
    let keep = seed_project(&pool, "Trash Keep").await;
    let drop = seed_project(&pool, "Trash Drop").await;
    let live = seed_task(&pool, keep.id, None).await;
    let dead = seed_task(&pool, keep.id, None).await;
    trash_task(&pool, dead.id).await;

    let mut tx = pool.begin().await.unwrap();
    ProjectRepo::soft_delete(&mut tx, TENANT, drop.id, 30).await.unwrap();
    let removed = TrashRepo::purge_all(&mut tx, TENANT).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(removed, 2);
    assert!(TrashRepo::list(&pool, TENANT, None, None).await.unwrap().is_empty());
    assert!(TaskRepo::find_by_id(&pool, TENANT, live.id).await.unwrap().is_some());
    assert!(ProjectRepo::find_by_id(&pool, TENANT, keep.id).await.unwrap().is_some());
}
