//! Search-criteria SQL assembly.
//!
//! A [`SearchSpec`] declares, per entity, which keys clients may filter and
//! sort on. [`SearchSpec::compile`] validates a [`SearchRequest`] against it;
//! [`search`] renders the compiled predicates through `sqlx::QueryBuilder`
//! so every client value is a bound parameter. Only identifiers from the
//! static spec are pushed as SQL text.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use angus_core::activity::{ActivityType, TargetType};
use angus_core::error::CoreError;
use angus_core::exec::{ExecStatus, ScriptType};
use angus_core::func::{CaseReviewStatus, CaseTestResult, PlanStatus, ReviewStatus};
use angus_core::priority::Priority;
use angus_core::project::MemberType;
use angus_core::report::{ReportCategory, ReportStatus, ReportTemplate};
use angus_core::search::{
    self, keyword_pattern, resolve_order, FieldDef, FieldKind, Operand, OrderSort, Page,
    Predicate, SearchOp, SearchRequest, TypedValue,
};
use angus_core::sprint::SprintStatus;
use angus_core::task::{TaskStatus, TaskType};
use angus_core::types::DbId;

use crate::models::Paged;

/// Static description of a searchable table.
#[derive(Debug, Clone, Copy)]
pub struct SearchSpec {
    pub table: &'static str,
    /// Select list; must match the row struct.
    pub columns: &'static str,
    pub fields: &'static [FieldDef],
    /// Columns the free-text keyword is matched against.
    pub match_columns: &'static [&'static str],
    pub default_order: &'static str,
    pub sortable: &'static [FieldDef],
    pub soft_delete: bool,
    /// Column naming the project a row belongs to; `None` for tenant-level
    /// tables such as nodes.
    pub project_column: Option<&'static str>,
    /// Target type used when resolving `tag_id` filters.
    pub tag_target: Option<TargetType>,
}

/// A request that passed validation against its spec.
#[derive(Debug, Clone)]
pub struct CompiledSearch {
    pub predicates: Vec<Predicate>,
    pub keyword: Option<String>,
    pub order_column: &'static str,
    pub order_sort: OrderSort,
    pub page: Page,
}

/// Tenant and project bounds applied to every search.
#[derive(Debug, Clone, Copy)]
pub struct SearchScope {
    pub tenant_id: DbId,
    pub project_id: Option<DbId>,
    /// Without a `project_id`, limits rows to live projects this user owns
    /// or is a USER member of. `None` for tenant admins.
    pub member_id: Option<DbId>,
}

impl SearchSpec {
    pub fn compile(&self, req: &SearchRequest) -> Result<CompiledSearch, CoreError> {
        Ok(CompiledSearch {
            predicates: search::compile(self.fields, &req.filters)?,
            keyword: keyword_pattern(req.keyword.as_deref())?,
            order_column: resolve_order(req.order_by.as_deref(), self.sortable, self.default_order)?,
            order_sort: req.order_sort.unwrap_or(OrderSort::Desc),
            page: Page::clamp(req.page_no, req.page_size),
        })
    }
}

/// Run a compiled search and return one page plus the total match count.
pub async fn search<T>(
    pool: &PgPool,
    spec: &SearchSpec,
    compiled: &CompiledSearch,
    scope: SearchScope,
) -> Result<Paged<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut count_qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT COUNT(*) FROM {} t",
        spec.table
    ));
    push_where(&mut count_qb, spec, compiled, scope);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

    if total == 0 {
        return Ok(Paged {
            items: Vec::new(),
            total,
        });
    }

    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM {} t",
        spec.columns, spec.table
    ));
    push_where(&mut qb, spec, compiled, scope);
    let dir = compiled.order_sort.as_str();
    qb.push(format!(
        " ORDER BY t.{} {dir}, t.id {dir} LIMIT ",
        compiled.order_column
    ));
    qb.push_bind(compiled.page.page_size);
    qb.push(" OFFSET ");
    qb.push_bind(compiled.page.offset());

    let items = qb.build_query_as::<T>().fetch_all(pool).await?;
    Ok(Paged { items, total })
}

fn push_where(
    qb: &mut QueryBuilder<'_, Postgres>,
    spec: &SearchSpec,
    compiled: &CompiledSearch,
    scope: SearchScope,
) {
    qb.push(" WHERE t.tenant_id = ");
    qb.push_bind(scope.tenant_id);
    if let Some(column) = spec.project_column {
        match (scope.project_id, scope.member_id) {
            (Some(project_id), _) => {
                qb.push(format!(" AND t.{column} = "));
                qb.push_bind(project_id);
            }
            (None, Some(user_id)) => push_member_projects(qb, column, scope.tenant_id, user_id),
            (None, None) => {}
        }
    }
    if spec.soft_delete {
        qb.push(" AND t.deleted_at IS NULL");
    }

    for predicate in &compiled.predicates {
        qb.push(" AND ");
        push_predicate(qb, spec, predicate);
    }

    if let Some(pattern) = &compiled.keyword {
        if !spec.match_columns.is_empty() {
            qb.push(" AND (");
            for (i, column) in spec.match_columns.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("t.{column} ILIKE "));
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }
}

/// `t.<column> IN (<live projects the user owns or belongs to>)`.
fn push_member_projects(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    tenant_id: DbId,
    user_id: DbId,
) {
    qb.push(format!(
        " AND t.{column} IN (SELECT p.id FROM projects p WHERE p.tenant_id = "
    ));
    qb.push_bind(tenant_id);
    qb.push(" AND p.deleted_at IS NULL AND (p.owner_id = ");
    qb.push_bind(user_id);
    qb.push(" OR EXISTS (SELECT 1 FROM project_members m WHERE m.project_id = p.id AND m.member_type = ");
    qb.push_bind(MemberType::User.as_str());
    qb.push(" AND m.member_id = ");
    qb.push_bind(user_id);
    qb.push(")))");
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, spec: &SearchSpec, p: &Predicate) {
    if p.kind == FieldKind::TagRef {
        push_tag_predicate(qb, spec, p);
        return;
    }

    qb.push(format!("t.{} ", p.column));
    match (&p.operand, p.op) {
        (Operand::None, op) => {
            qb.push(op.sql());
        }
        (Operand::One(value), op) => {
            qb.push(op.sql());
            qb.push(" ");
            push_value(qb, value);
        }
        (Operand::Many(values), op) => {
            qb.push(op.sql());
            qb.push(" (");
            push_list(qb, values);
            qb.push(")");
        }
    }
}

/// `tag_id` filters become an (anti-)semi-join on `tag_targets`.
fn push_tag_predicate(qb: &mut QueryBuilder<'_, Postgres>, spec: &SearchSpec, p: &Predicate) {
    let target = spec.tag_target.unwrap_or(TargetType::Task);
    if p.op == SearchOp::NotIn {
        qb.push("NOT ");
    }
    qb.push("EXISTS (SELECT 1 FROM tag_targets tt WHERE tt.target_type = ");
    qb.push_bind(target.as_str());
    qb.push(" AND tt.target_id = t.id AND tt.tag_id ");
    match &p.operand {
        Operand::One(value) => {
            qb.push("= ");
            push_value(qb, value);
        }
        Operand::Many(values) => {
            qb.push("IN (");
            push_list(qb, values);
            qb.push(")");
        }
        Operand::None => {
            qb.push("IS NOT NULL");
        }
    }
    qb.push(")");
}

fn push_list(qb: &mut QueryBuilder<'_, Postgres>, values: &[TypedValue]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(qb, value);
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &TypedValue) {
    match value {
        TypedValue::Int(v) => qb.push_bind(*v),
        TypedValue::Float(v) => qb.push_bind(*v),
        TypedValue::Text(v) => qb.push_bind(v.clone()),
        TypedValue::Time(v) => qb.push_bind(*v),
        TypedValue::Bool(v) => qb.push_bind(*v),
    };
}

// ---------------------------------------------------------------------------
// Entity specs
// ---------------------------------------------------------------------------

const fn id(key: &'static str) -> FieldDef {
    FieldDef::new(key, key, FieldKind::Id)
}

const fn text(key: &'static str) -> FieldDef {
    FieldDef::new(key, key, FieldKind::Text)
}

const fn time(key: &'static str) -> FieldDef {
    FieldDef::new(key, key, FieldKind::Timestamp)
}

const fn code(key: &'static str, codes: &'static [&'static str]) -> FieldDef {
    FieldDef::new(key, key, FieldKind::Enum(codes))
}

const TAG_ID: FieldDef = FieldDef::new("tag_id", "id", FieldKind::TagRef);

pub const PROJECT_SEARCH: SearchSpec = SearchSpec {
    table: "projects",
    columns: crate::repositories::project_repo::COLUMNS,
    fields: &[
        id("id"),
        text("name"),
        id("owner_id"),
        id("created_by"),
        time("start_date"),
        time("deadline_date"),
        time("created_at"),
    ],
    match_columns: &["name", "description"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("created_at"), time("deadline_date")],
    soft_delete: true,
    project_column: Some("id"),
    tag_target: None,
};

pub const SPRINT_SEARCH: SearchSpec = SearchSpec {
    table: "task_sprints",
    columns: crate::repositories::sprint_repo::COLUMNS,
    fields: &[
        id("id"),
        text("name"),
        code("status", SprintStatus::CODES),
        id("owner_id"),
        id("created_by"),
        time("start_date"),
        time("deadline_date"),
        time("created_at"),
    ],
    match_columns: &["name"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("start_date"), time("deadline_date")],
    soft_delete: true,
    project_column: Some("project_id"),
    tag_target: None,
};

pub const TASK_SEARCH: SearchSpec = SearchSpec {
    table: "tasks",
    columns: crate::repositories::task_repo::COLUMNS,
    fields: &[
        id("id"),
        id("sprint_id"),
        text("name"),
        text("code"),
        code("task_type", TaskType::CODES),
        code("status", TaskStatus::CODES),
        code("priority", Priority::CODES),
        id("assignee_id"),
        id("confirmer_id"),
        id("created_by"),
        time("deadline_date"),
        time("completed_date"),
        time("created_at"),
        FieldDef::new("failure_count", "failure_count", FieldKind::Number),
        TAG_ID,
    ],
    match_columns: &["name", "code"],
    default_order: "id",
    sortable: &[
        id("id"),
        text("name"),
        text("code"),
        text("priority"),
        time("deadline_date"),
        time("created_at"),
    ],
    soft_delete: true,
    project_column: Some("project_id"),
    tag_target: Some(TargetType::Task),
};

pub const PLAN_SEARCH: SearchSpec = SearchSpec {
    table: "func_plans",
    columns: crate::repositories::func_plan_repo::COLUMNS,
    fields: &[
        id("id"),
        text("name"),
        code("status", PlanStatus::CODES),
        id("owner_id"),
        FieldDef::new("review_flag", "review_flag", FieldKind::Bool),
        time("start_date"),
        time("deadline_date"),
        time("created_at"),
    ],
    match_columns: &["name"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("deadline_date"), time("created_at")],
    soft_delete: true,
    project_column: Some("project_id"),
    tag_target: None,
};

pub const CASE_SEARCH: SearchSpec = SearchSpec {
    table: "func_cases",
    columns: crate::repositories::func_case_repo::COLUMNS,
    fields: &[
        id("id"),
        id("plan_id"),
        text("name"),
        text("code"),
        code("priority", Priority::CODES),
        id("tester_id"),
        id("developer_id"),
        code("review_status", CaseReviewStatus::CODES),
        code("test_result", CaseTestResult::CODES),
        id("created_by"),
        time("deadline_date"),
        time("test_result_handle_date"),
        time("created_at"),
        FieldDef::new("test_num", "test_num", FieldKind::Number),
        FieldDef::new("test_fail_num", "test_fail_num", FieldKind::Number),
        TAG_ID,
    ],
    match_columns: &["name", "code"],
    default_order: "id",
    sortable: &[
        id("id"),
        text("name"),
        text("code"),
        text("priority"),
        time("deadline_date"),
        time("created_at"),
    ],
    soft_delete: true,
    project_column: Some("project_id"),
    tag_target: Some(TargetType::FuncCase),
};

pub const REVIEW_SEARCH: SearchSpec = SearchSpec {
    table: "func_reviews",
    columns: crate::repositories::func_review_repo::COLUMNS,
    fields: &[
        id("id"),
        id("plan_id"),
        text("name"),
        code("status", ReviewStatus::CODES),
        id("owner_id"),
        time("created_at"),
    ],
    match_columns: &["name"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("created_at")],
    soft_delete: false,
    project_column: Some("project_id"),
    tag_target: None,
};

pub const BASELINE_SEARCH: SearchSpec = SearchSpec {
    table: "func_baselines",
    columns: crate::repositories::func_baseline_repo::COLUMNS,
    fields: &[
        id("id"),
        id("plan_id"),
        text("name"),
        FieldDef::new("established", "established", FieldKind::Bool),
        time("created_at"),
    ],
    match_columns: &["name"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("created_at")],
    soft_delete: false,
    project_column: Some("project_id"),
    tag_target: None,
};

pub const EXEC_SEARCH: SearchSpec = SearchSpec {
    table: "execs",
    columns: crate::repositories::exec_repo::COLUMNS,
    fields: &[
        id("id"),
        text("name"),
        code("script_type", ScriptType::CODES),
        code("status", ExecStatus::CODES),
        text("plugin"),
        id("script_id"),
        id("exec_by"),
        id("created_by"),
        time("start_at"),
        time("end_at"),
        time("created_at"),
    ],
    match_columns: &["name"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("start_at"), time("created_at")],
    soft_delete: false,
    project_column: Some("project_id"),
    tag_target: None,
};

pub const REPORT_SEARCH: SearchSpec = SearchSpec {
    table: "reports",
    columns: crate::repositories::report_repo::COLUMNS,
    fields: &[
        id("id"),
        text("name"),
        code("template", ReportTemplate::CODES),
        code("category", ReportCategory::CODES),
        code("status", ReportStatus::CODES),
        id("target_id"),
        id("created_by"),
        time("created_at"),
    ],
    match_columns: &["name", "description"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("created_at")],
    soft_delete: true,
    project_column: Some("project_id"),
    tag_target: None,
};

pub const NODE_SEARCH: SearchSpec = SearchSpec {
    table: "nodes",
    columns: crate::repositories::node_repo::COLUMNS,
    fields: &[
        id("id"),
        text("name"),
        text("ip"),
        FieldDef::new("enabled", "enabled", FieldKind::Bool),
        FieldDef::new("agent_installed", "agent_installed", FieldKind::Bool),
        time("created_at"),
    ],
    match_columns: &["name", "ip"],
    default_order: "id",
    sortable: &[id("id"), text("name"), time("created_at")],
    soft_delete: false,
    project_column: None,
    tag_target: None,
};

pub const ACTIVITY_SEARCH: SearchSpec = SearchSpec {
    table: "activities",
    columns: crate::repositories::activity_repo::COLUMNS,
    fields: &[
        id("id"),
        id("user_id"),
        code("target_type", TargetType::CODES),
        id("target_id"),
        code("activity_type", ActivityType::CODES),
        time("opt_date"),
    ],
    match_columns: &["target_name", "detail"],
    default_order: "opt_date",
    sortable: &[id("id"), time("opt_date")],
    soft_delete: false,
    project_column: Some("project_id"),
    tag_target: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> SearchRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn compile_applies_defaults() {
        let compiled = TASK_SEARCH.compile(&SearchRequest::default()).unwrap();
        assert!(compiled.predicates.is_empty());
        assert_eq!(compiled.order_column, "id");
        assert_eq!(compiled.order_sort, OrderSort::Desc);
        assert_eq!(compiled.page, Page { page_no: 1, page_size: 20 });
    }

    #[test]
    fn compile_rejects_unlisted_fields() {
        let req = request(json!({"filters": [{"key": "deleted_at", "op": "IS_NULL"}]}));
        assert!(TASK_SEARCH.compile(&req).is_err());
    }

    #[test]
    fn compile_rejects_unknown_sort() {
        let req = request(json!({"order_by": "description"}));
        assert!(TASK_SEARCH.compile(&req).is_err());
    }

    #[test]
    fn where_clause_binds_everything() {
        let req = request(json!({
            "filters": [
                {"key": "status", "op": "IN", "value": ["PENDING", "IN_PROGRESS"]},
                {"key": "tag_id", "op": "EQUAL", "value": 9},
                {"key": "name", "op": "MATCH", "value": "login'; DROP TABLE tasks; --"}
            ],
            "keyword": "pay"
        }));
        let compiled = TASK_SEARCH.compile(&req).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        push_where(
            &mut qb,
            &TASK_SEARCH,
            &compiled,
            SearchScope {
                tenant_id: 1,
                project_id: Some(2),
                member_id: Some(5),
            },
        );
        let sql = qb.sql();
        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.contains("t.status IN ($3, $4)"));
        assert!(sql.contains("EXISTS (SELECT 1 FROM tag_targets tt WHERE tt.target_type = $5"));
        assert!(sql.contains("t.name ILIKE $7"));
        assert!(sql.contains("(t.name ILIKE $8 OR t.code ILIKE $9)"));
        assert!(sql.contains("t.deleted_at IS NULL"));
    }

    #[test]
    fn not_in_tags_uses_anti_join() {
        let req = request(json!({"filters": [{"key": "tag_id", "op": "NOT_IN", "value": [1, 2]}]}));
        let compiled = CASE_SEARCH.compile(&req).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_where(
            &mut qb,
            &CASE_SEARCH,
            &compiled,
            SearchScope {
                tenant_id: 1,
                project_id: None,
                member_id: None,
            },
        );
        assert!(qb.sql().contains("NOT EXISTS (SELECT 1 FROM tag_targets"));
        assert!(!qb.sql().contains("t.project_id"));
    }

    #[test]
    fn non_admin_without_project_is_limited_to_member_projects() {
        let compiled = TASK_SEARCH.compile(&request(json!({}))).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_where(
            &mut qb,
            &TASK_SEARCH,
            &compiled,
            SearchScope {
                tenant_id: 1,
                project_id: None,
                member_id: Some(5),
            },
        );
        let sql = qb.sql();
        assert!(sql.contains("t.project_id IN (SELECT p.id FROM projects p WHERE p.tenant_id = $2"));
        assert!(sql.contains("p.deleted_at IS NULL AND (p.owner_id = $3"));
        assert!(sql.contains("m.member_id = $5"));
    }

    #[test]
    fn explicit_project_skips_member_subquery() {
        let compiled = TASK_SEARCH.compile(&request(json!({}))).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_where(
            &mut qb,
            &TASK_SEARCH,
            &compiled,
            SearchScope {
                tenant_id: 1,
                project_id: Some(2),
                member_id: Some(5),
            },
        );
        assert!(qb.sql().contains("t.project_id = $2"));
        assert!(!qb.sql().contains("project_members"));
    }

    #[test]
    fn project_listing_filters_on_id() {
        let compiled = PROJECT_SEARCH.compile(&request(json!({}))).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_where(
            &mut qb,
            &PROJECT_SEARCH,
            &compiled,
            SearchScope {
                tenant_id: 1,
                project_id: None,
                member_id: Some(5),
            },
        );
        assert!(qb.sql().contains("t.id IN (SELECT p.id FROM projects p"));
    }
}
