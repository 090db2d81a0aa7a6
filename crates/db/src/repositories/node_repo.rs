//! Repository for the `nodes` and `node_metrics` tables.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::types::{DbId, Timestamp};

use crate::models::node::{CreateNode, NewNodeMetric, Node, NodeMetric, UpdateNode};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.name, t.ip, t.roles, t.enabled, t.cpu_cores, \
    t.memory_bytes, t.disk_bytes, t.agent_installed, t.created_by, t.created_at, \
    t.last_modified_by, t.updated_at";

/// Column list for `node_metrics` SELECT queries.
const METRIC_COLUMNS: &str = "\
    id, node_id, cpu_percent, memory_percent, disk_percent, \
    network_rx_bytes, network_tx_bytes, sampled_at";

pub struct NodeRepo;

impl NodeRepo {
    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// `roles` must already be validated and deduplicated.
    pub async fn insert(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        input: &CreateNode,
        roles: &[&str],
    ) -> Result<Node, sqlx::Error> {
        let query = format!(
            "INSERT INTO nodes AS t \
                 (tenant_id, name, ip, roles, cpu_cores, memory_bytes, disk_bytes, \
                  created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(ctx.tenant_id)
            .bind(input.name.trim())
            .bind(input.ip.trim())
            .bind(roles)
            .bind(input.cpu_cores)
            .bind(input.memory_bytes)
            .bind(input.disk_bytes)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Node>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM nodes t WHERE t.tenant_id = $1 AND t.id = $2");
        sqlx::query_as::<_, Node>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        input: &UpdateNode,
        roles: Option<&[&str]>,
    ) -> Result<Option<Node>, sqlx::Error> {
        let query = format!(
            "UPDATE nodes t SET \
                 name = COALESCE($3, t.name), \
                 ip = COALESCE($4, t.ip), \
                 roles = COALESCE($5, t.roles), \
                 cpu_cores = COALESCE($6, t.cpu_cores), \
                 memory_bytes = COALESCE($7, t.memory_bytes), \
                 disk_bytes = COALESCE($8, t.disk_bytes), \
                 last_modified_by = $9, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.ip.as_deref().map(str::trim))
            .bind(roles)
            .bind(input.cpu_cores)
            .bind(input.memory_bytes)
            .bind(input.disk_bytes)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn set_enabled(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        enabled: bool,
    ) -> Result<Option<Node>, sqlx::Error> {
        let query = format!(
            "UPDATE nodes t SET enabled = $3, last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(enabled)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Delete a node; its metric history cascades.
    pub async fn delete(tx: &mut PgTx<'_>, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM nodes WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool, tenant_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nodes WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Agent metrics
    // -----------------------------------------------------------------------

    /// Store one agent sample and mark the node's agent as installed.
    pub async fn insert_metric(
        tx: &mut PgTx<'_>,
        node_id: DbId,
        sample: &NewNodeMetric,
        sampled_at: Timestamp,
    ) -> Result<NodeMetric, sqlx::Error> {
        sqlx::query("UPDATE nodes SET agent_installed = TRUE WHERE id = $1 AND NOT agent_installed")
            .bind(node_id)
            .execute(&mut **tx)
            .await?;

        let query = format!(
            "INSERT INTO node_metrics \
                 (node_id, cpu_percent, memory_percent, disk_percent, \
                  network_rx_bytes, network_tx_bytes, sampled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {METRIC_COLUMNS}"
        );
        sqlx::query_as::<_, NodeMetric>(&query)
            .bind(node_id)
            .bind(sample.cpu_percent)
            .bind(sample.memory_percent)
            .bind(sample.disk_percent)
            .bind(sample.network_rx_bytes)
            .bind(sample.network_tx_bytes)
            .bind(sampled_at)
            .fetch_one(&mut **tx)
            .await
    }

    /// The most recent sample of every node of a tenant.
    ///
    /// Uses `DISTINCT ON` to pick the newest row per node.
    pub async fn latest_metrics(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<Vec<NodeMetric>, sqlx::Error> {
        sqlx::query_as::<_, NodeMetric>(
            "SELECT DISTINCT ON (m.node_id) \
                 m.id, m.node_id, m.cpu_percent, m.memory_percent, m.disk_percent, \
                 m.network_rx_bytes, m.network_tx_bytes, m.sampled_at \
             FROM node_metrics m \
             JOIN nodes n ON n.id = m.node_id \
             WHERE n.tenant_id = $1 \
             ORDER BY m.node_id, m.sampled_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    /// Samples of a node within `[from, to]`, oldest first.
    pub async fn metrics_between(
        pool: &PgPool,
        node_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<NodeMetric>, sqlx::Error> {
        let query = format!(
            "SELECT {METRIC_COLUMNS} FROM node_metrics \
             WHERE node_id = $1 AND sampled_at BETWEEN $2 AND $3 \
             ORDER BY sampled_at"
        );
        sqlx::query_as::<_, NodeMetric>(&query)
            .bind(node_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Delete samples older than the cutoff. Returns the number removed.
    pub async fn delete_metrics_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM node_metrics WHERE sampled_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
