//! Repository for the `comments` table.

use sqlx::PgPool;

use angus_core::activity::TargetType;
use angus_core::types::DbId;

use crate::models::comment::{Comment, CommentView};
use crate::PgTx;

const COLUMNS: &str = "\
    c.id, c.tenant_id, c.project_id, c.target_type, c.target_id, c.content, \
    c.created_by, c.created_at";

pub struct CommentRepo;

impl CommentRepo {
    pub async fn insert(
        tx: &mut PgTx<'_>,
        tenant_id: DbId,
        project_id: DbId,
        target_type: TargetType,
        target_id: DbId,
        content: &str,
        user_id: DbId,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments AS c \
                 (tenant_id, project_id, target_type, target_id, content, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(tenant_id)
            .bind(project_id)
            .bind(target_type.as_str())
            .bind(target_id)
            .bind(content)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments c WHERE c.tenant_id = $1 AND c.id = $2");
        sqlx::query_as::<_, Comment>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Comments on a target with author names, oldest first.
    pub async fn list_for(
        pool: &PgPool,
        tenant_id: DbId,
        target_type: TargetType,
        target_id: DbId,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, u.full_name AS author_name, u.avatar AS author_avatar \
             FROM comments c \
             LEFT JOIN users u ON u.id = c.created_by AND u.tenant_id = c.tenant_id \
             WHERE c.tenant_id = $1 AND c.target_type = $2 AND c.target_id = $3 \
             ORDER BY c.created_at, c.id"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(tenant_id)
            .bind(target_type.as_str())
            .bind(target_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(CommentRow::into_view).collect())
    }

    pub async fn count_for(
        pool: &PgPool,
        target_type: TargetType,
        target_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM comments WHERE target_type = $1 AND target_id = $2",
        )
        .bind(target_type.as_str())
        .bind(target_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn delete(tx: &mut PgTx<'_>, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    #[sqlx(flatten)]
    comment: Comment,
    author_name: Option<String>,
    author_avatar: Option<String>,
}

impl CommentRow {
    fn into_view(self) -> CommentView {
        CommentView {
            comment: self.comment,
            author_name: self.author_name,
            author_avatar: self.author_avatar,
        }
    }
}
