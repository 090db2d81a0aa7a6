//! Integration tests for tag creation and target tag replacement.

use sqlx::PgPool;

use angus_core::activity::{ActivityType, TargetType};
use angus_core::context::RequestContext;
use angus_core::priority::Priority;
use angus_core::task::TaskType;
use angus_db::models::project::NewProject;
use angus_db::models::task::{NewTask, Task};
use angus_db::repositories::tag_repo::TagTarget;
use angus_db::repositories::{ActivityRepo, ProjectRepo, TagRepo, TaskRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ctx() -> RequestContext {
    RequestContext::new(1, 100, false)
}

async fn seed_task(pool: &PgPool) -> Task {
    let ctx = ctx();
    let mut tx = pool.begin().await.unwrap();
    let project = ProjectRepo::insert(
        &mut tx,
        &NewProject {
            tenant_id: ctx.tenant_id,
            name: "Tagging".to_string(),
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
    let task = TaskRepo::insert(
        &mut tx,
        &NewTask {
            tenant_id: ctx.tenant_id,
            project_id: project.id,
            sprint_id: None,
            name: "Write login tests".to_string(),
            task_type: TaskType::Task,
            priority: Priority::Medium,
            assignee_id: None,
            confirmer_id: None,
            deadline_date: None,
            eval_workload: None,
            description: None,
            created_by: ctx.user_id,
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    task
}

async fn seed_tags(pool: &PgPool, project_id: i64, names: &[&str]) -> Vec<i64> {
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let mut tx = pool.begin().await.unwrap();
    let tags = TagRepo::create_or_get(&mut tx, &ctx(), project_id, &names)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    tags.into_iter().map(|t| t.id).collect()
}

fn target(task: &Task) -> TagTarget<'_> {
    TagTarget {
        project_id: task.project_id,
        target_type: TargetType::Task,
        target_id: task.id,
        name: &task.name,
    }
}

async fn tag_ids_of(pool: &PgPool, task: &Task) -> Vec<i64> {
    let mut ids: Vec<i64> = TagRepo::tags_of(pool, TargetType::Task, task.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    ids.sort();
    ids
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_or_get_returns_existing_tag(pool: PgPool) {
    let task = seed_task(&pool).await;
    let first = seed_tags(&pool, task.project_id, &["smoke"]).await;
    let second = seed_tags(&pool, task.project_id, &["smoke", "regression"]).await;

    assert_eq!(second.len(), 2);
    assert_eq!(first[0], second[0], "same name must resolve to the same tag");
    assert_eq!(TagRepo::count_in_project(&pool, task.project_id).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replace_makes_tag_set_equal_to_request(pool: PgPool) {
    let task = seed_task(&pool).await;
    let tags = seed_tags(&pool, task.project_id, &["a", "b", "c"]).await;

    TagRepo::replace_targets(&pool, &ctx(), target(&task), &[tags[0], tags[1]])
        .await
        .unwrap();
    let diff = TagRepo::replace_targets(&pool, &ctx(), target(&task), &[tags[1], tags[2]])
        .await
        .unwrap();

    assert_eq!(diff.to_delete, vec![tags[0]]);
    assert_eq!(diff.to_add, vec![tags[2]]);
    let mut expected = vec![tags[1], tags[2]];
    expected.sort();
    assert_eq!(tag_ids_of(&pool, &task).await, expected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_replace_is_a_noop(pool: PgPool) {
    let task = seed_task(&pool).await;
    let tags = seed_tags(&pool, task.project_id, &["x", "y"]).await;

    TagRepo::replace_targets(&pool, &ctx(), target(&task), &tags)
        .await
        .unwrap();
    let again = TagRepo::replace_targets(&pool, &ctx(), target(&task), &tags)
        .await
        .unwrap();
    assert!(again.is_empty());

    let activities =
        ActivityRepo::list_for_target(&pool, 1, TargetType::Task, task.id, None, None)
            .await
            .unwrap();
    let tag_updates = activities
        .iter()
        .filter(|a| a.activity_type == ActivityType::TagUpdated.as_str())
        .count();
    assert_eq!(tag_updates, 1, "an unchanged tag set must not be logged");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_request_clears_tags(pool: PgPool) {
    let task = seed_task(&pool).await;
    let tags = seed_tags(&pool, task.project_id, &["only"]).await;

    TagRepo::replace_targets(&pool, &ctx(), target(&task), &tags)
        .await
        .unwrap();
    TagRepo::replace_targets(&pool, &ctx(), target(&task), &[])
        .await
        .unwrap();

    assert!(tag_ids_of(&pool, &task).await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn usage_counts_follow_associations(pool: PgPool) {
    let task = seed_task(&pool).await;
    let tags = seed_tags(&pool, task.project_id, &["used", "unused"]).await;
    TagRepo::replace_targets(&pool, &ctx(), target(&task), &tags[..1])
        .await
        .unwrap();

    let usage = TagRepo::list_by_project(&pool, 1, task.project_id, None)
        .await
        .unwrap();
    let used = usage.iter().find(|u| u.name == "used").unwrap();
    let unused = usage.iter().find(|u| u.name == "unused").unwrap();
    assert_eq!(used.usage_count, 1);
    assert_eq!(unused.usage_count, 0);
}
