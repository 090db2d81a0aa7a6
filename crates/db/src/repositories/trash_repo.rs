//! Repository for cross-table trash operations.
//!
//! Provides a unified view of soft-deleted projects, sprints, tasks, plans,
//! cases and reports, plus restore with a parent check and single-item or
//! bulk purge (hard delete).

use sqlx::PgPool;

use angus_core::activity::TargetType;
use angus_core::types::{DbId, Timestamp};

use crate::models::trash::TrashedItem;
use crate::PgTx;

/// Purge order: leaves first so cascades do not hide rows from the count.
const PURGE_ORDER: &[TargetType] = &[
    TargetType::Task,
    TargetType::FuncCase,
    TargetType::TaskSprint,
    TargetType::FuncPlan,
    TargetType::Report,
    TargetType::Project,
];

pub struct TrashRepo;

impl TrashRepo {
    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// Soft-deleted items of a tenant, newest deletion first.
    ///
    /// `target_type` narrows to one table; `project_id` to one project.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        target_type: Option<TargetType>,
        project_id: Option<DbId>,
    ) -> Result<Vec<TrashedItem>, sqlx::Error> {
        let selects: Vec<String> = trashable_types(target_type)
            .map(|tt| {
                format!(
                    "SELECT id, '{code}' AS target_type, name, {project} AS project_id, \
                         deleted_at, last_modified_by \
                     FROM {table} \
                     WHERE tenant_id = $1 AND deleted_at IS NOT NULL \
                       AND ($2::BIGINT IS NULL OR {project} = $2)",
                    code = tt.as_str(),
                    table = tt.table(),
                    project = project_column(tt),
                )
            })
            .collect();
        let sql = format!("{} ORDER BY deleted_at DESC, id DESC", selects.join(" UNION ALL "));
        sqlx::query_as::<_, TrashedItem>(&sql)
            .bind(tenant_id)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// A trashed item by type and id.
    pub async fn find(
        pool: &PgPool,
        tenant_id: DbId,
        target_type: TargetType,
        id: DbId,
    ) -> Result<Option<TrashedItem>, sqlx::Error> {
        let sql = format!(
            "SELECT id, '{code}' AS target_type, name, {project} AS project_id, \
                 deleted_at, last_modified_by \
             FROM {table} \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NOT NULL",
            code = target_type.as_str(),
            table = target_type.table(),
            project = project_column(target_type),
        );
        sqlx::query_as::<_, TrashedItem>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Restore
    // -----------------------------------------------------------------------

    /// Kind of the first trashed parent of an item, if any.
    pub async fn trashed_parent(
        pool: &PgPool,
        target_type: TargetType,
        id: DbId,
    ) -> Result<Option<TargetType>, sqlx::Error> {
        for &(fk_col, parent) in parent_links(target_type) {
            let sql = format!(
                "SELECT p.deleted_at \
                 FROM {child} c \
                 JOIN {parent_table} p ON p.id = c.{fk_col} \
                 WHERE c.id = $1",
                child = target_type.table(),
                parent_table = parent.table(),
            );
            let row: Option<(Option<Timestamp>,)> =
                sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
            if let Some((Some(_),)) = row {
                return Ok(Some(parent));
            }
        }
        Ok(None)
    }

    pub async fn restore(
        tx: &mut PgTx<'_>,
        tenant_id: DbId,
        target_type: TargetType,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NULL, last_modified_by = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NOT NULL",
            target_type.table()
        );
        let result = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(id)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Purge (hard delete)
    // -----------------------------------------------------------------------

    /// Hard-delete one trashed item. Returns `false` when no trashed row matched.
    pub async fn purge_one(
        tx: &mut PgTx<'_>,
        tenant_id: DbId,
        target_type: TargetType,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NOT NULL",
            target_type.table()
        );
        let result = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        Self::sweep_orphans(tx, tenant_id).await?;
        Ok(true)
    }

    /// Hard-delete every trashed item of a tenant. Returns the number of
    /// trashed rows removed (cascaded children are not counted).
    pub async fn purge_all(tx: &mut PgTx<'_>, tenant_id: DbId) -> Result<u64, sqlx::Error> {
        let mut total = 0;
        for target_type in PURGE_ORDER {
            let sql = format!(
                "DELETE FROM {} WHERE tenant_id = $1 AND deleted_at IS NOT NULL",
                target_type.table()
            );
            let result = sqlx::query(&sql).bind(tenant_id).execute(&mut **tx).await?;
            total += result.rows_affected();
        }
        Self::sweep_orphans(tx, tenant_id).await?;
        Ok(total)
    }

    /// Tag and comment rows reference tasks and cases without a foreign key;
    /// drop the ones whose target is gone.
    async fn sweep_orphans(tx: &mut PgTx<'_>, tenant_id: DbId) -> Result<(), sqlx::Error> {
        for target_type in [TargetType::Task, TargetType::FuncCase] {
            for assoc in ["tag_targets", "comments"] {
                let sql = format!(
                    "DELETE FROM {assoc} a \
                     WHERE a.tenant_id = $1 AND a.target_type = $2 \
                       AND NOT EXISTS (SELECT 1 FROM {table} x WHERE x.id = a.target_id)",
                    table = target_type.table(),
                );
                sqlx::query(&sql)
                    .bind(tenant_id)
                    .bind(target_type.as_str())
                    .execute(&mut **tx)
                    .await?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn trashable_types(filter: Option<TargetType>) -> impl Iterator<Item = TargetType> {
    TargetType::ALL
        .iter()
        .copied()
        .filter(move |tt| tt.is_trashable() && filter.map_or(true, |f| f == *tt))
}

/// Expression yielding the owning project id.
fn project_column(target_type: TargetType) -> &'static str {
    match target_type {
        TargetType::Project => "id",
        _ => "project_id",
    }
}

/// Foreign keys to parents that must be live before a restore.
fn parent_links(target_type: TargetType) -> &'static [(&'static str, TargetType)] {
    match target_type {
        TargetType::Task => &[
            ("sprint_id", TargetType::TaskSprint),
            ("project_id", TargetType::Project),
        ],
        TargetType::FuncCase => &[
            ("plan_id", TargetType::FuncPlan),
            ("project_id", TargetType::Project),
        ],
        TargetType::TaskSprint | TargetType::FuncPlan | TargetType::Report => {
            &[("project_id", TargetType::Project)]
        }
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trashable_filter() {
        assert_eq!(trashable_types(None).count(), 6);
        let only: Vec<_> = trashable_types(Some(TargetType::Task)).collect();
        assert_eq!(only, vec![TargetType::Task]);
        assert_eq!(trashable_types(Some(TargetType::Node)).count(), 0);
    }

    #[test]
    fn parents_are_trashable() {
        for tt in TargetType::ALL.iter().filter(|t| t.is_trashable()) {
            for (_, parent) in parent_links(*tt) {
                assert!(parent.is_trashable());
            }
        }
        assert!(parent_links(TargetType::Project).is_empty());
    }
}
