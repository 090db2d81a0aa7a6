//! Execution nodes (tenant admin) and the agent metric feed.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::node::{bucket_average, check_window, parse_roles, validate_ip, validate_percent, MetricBucket};
use angus_core::quota::QuotaKind;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::node::{CreateNode, MetricsQuery, NewNodeMetric, Node, NodeMetric, UpdateNode};
use angus_db::models::Paged;
use angus_db::repositories::{ActivityRepo, NodeRepo};
use angus_db::search::NODE_SEARCH;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, search};

/// Bucket width used when the query names none.
const DEFAULT_BUCKET_SECS: i64 = 60;

#[derive(Debug, Serialize)]
pub struct MetricHistory {
    pub node_id: DbId,
    pub bucket_secs: i64,
    pub buckets: Vec<MetricBucket>,
}

pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateNode) -> AppResult<Node> {
    let input = &input;
    biz::run(
        async {
            ctx.require_admin()?;
            input.validate().map_err(CoreError::from)?;
            access::required_name(&input.name)?;
            validate_ip(&input.ip)?;
            let roles = parse_roles(&input.roles)?;
            let current = NodeRepo::count(pool, ctx.tenant_id).await?;
            access::enforce_quota(pool, ctx, QuotaKind::Nodes, current, 1).await?;
            Ok::<_, AppError>(roles)
        },
        |roles| async move {
            let codes: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
            let mut tx = pool.begin().await?;
            let node = NodeRepo::insert(&mut tx, ctx, input, &codes).await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &node, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                node_id = node.id,
                ip = %node.ip,
                "Node registered"
            );
            Ok(node)
        },
    )
    .await
}

pub async fn update(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    input: UpdateNode,
) -> AppResult<Node> {
    let input = &input;
    biz::run(
        async {
            ctx.require_admin()?;
            input.validate().map_err(CoreError::from)?;
            load(pool, ctx, id).await?;
            if let Some(name) = &input.name {
                access::required_name(name)?;
            }
            if let Some(ip) = &input.ip {
                validate_ip(ip)?;
            }
            let roles = input.roles.as_deref().map(parse_roles).transpose()?;
            Ok::<_, AppError>(roles)
        },
        |roles| async move {
            let codes: Option<Vec<&str>> =
                roles.map(|roles| roles.iter().map(|r| r.as_str()).collect());
            let mut tx = pool.begin().await?;
            let node = NodeRepo::update(&mut tx, ctx, id, input, codes.as_deref())
                .await?
                .ok_or(AppError::not_found("Node", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &node, ActivityType::Updated)).await?;
            tx.commit().await?;
            Ok(node)
        },
    )
    .await
}

pub async fn set_enabled(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    enabled: bool,
) -> AppResult<Node> {
    biz::run(
        async {
            ctx.require_admin()?;
            load(pool, ctx, id).await
        },
        |_| async move {
            let mut tx = pool.begin().await?;
            let node = NodeRepo::set_enabled(&mut tx, ctx, id, enabled)
                .await?
                .ok_or(AppError::not_found("Node", id))?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &node, ActivityType::StatusUpdated))
                .await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, node_id = id, enabled, "Node toggled");
            Ok(node)
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(
        async {
            ctx.require_admin()?;
            load(pool, ctx, id).await
        },
        |node| async move {
            let mut tx = pool.begin().await?;
            if !NodeRepo::delete(&mut tx, ctx.tenant_id, id).await? {
                return Err(AppError::not_found("Node", id));
            }
            ActivityRepo::insert(&mut tx, &activity(ctx, &node, ActivityType::Deleted)).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, node_id = id, "Node deleted");
            Ok(())
        },
    )
    .await
}

pub async fn get(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Node> {
    load(pool, ctx, id).await
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
) -> AppResult<Paged<Node>> {
    search::scoped_search(pool, ctx, &NODE_SEARCH, req, None).await
}

/// Store one agent sample. Disabled nodes reject samples.
pub async fn push_metric(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    sample: NewNodeMetric,
) -> AppResult<NodeMetric> {
    let sample = &sample;
    biz::run(
        async {
            let node = load(pool, ctx, id).await?;
            if !node.enabled {
                return Err(AppError::Core(CoreError::Business(format!(
                    "Node {id} is disabled"
                ))));
            }
            check_sample(sample)?;
            Ok::<_, AppError>(())
        },
        |()| async move {
            let sampled_at = sample.sampled_at.unwrap_or_else(Utc::now);
            let mut tx = pool.begin().await?;
            let metric = NodeRepo::insert_metric(&mut tx, id, sample, sampled_at).await?;
            tx.commit().await?;

            tracing::debug!(node_id = id, cpu = metric.cpu_percent, "Node metric stored");
            Ok(metric)
        },
    )
    .await
}

/// Newest sample of every node in the tenant.
pub async fn latest(pool: &PgPool, ctx: &RequestContext) -> AppResult<Vec<NodeMetric>> {
    Ok(NodeRepo::latest_metrics(pool, ctx.tenant_id).await?)
}

pub async fn history(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    query: &MetricsQuery,
) -> AppResult<MetricHistory> {
    check_window(query.from, query.to)?;
    let bucket_secs = query.bucket_secs.unwrap_or(DEFAULT_BUCKET_SECS);
    if bucket_secs <= 0 {
        return Err(AppError::BadRequest("bucket_secs must be positive".to_string()));
    }
    load(pool, ctx, id).await?;
    let samples = NodeRepo::metrics_between(pool, id, query.from, query.to).await?;
    let points: Vec<_> = samples.iter().map(NodeMetric::point).collect();
    Ok(MetricHistory {
        node_id: id,
        bucket_secs,
        buckets: bucket_average(&points, bucket_secs),
    })
}

async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Node> {
    NodeRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Node", id))
}

fn check_sample(sample: &NewNodeMetric) -> Result<(), CoreError> {
    validate_percent("cpu_percent", sample.cpu_percent)?;
    validate_percent("memory_percent", sample.memory_percent)?;
    validate_percent("disk_percent", sample.disk_percent)?;
    if sample.network_rx_bytes < 0 || sample.network_tx_bytes < 0 {
        return Err(CoreError::Validation(
            "Network counters must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn activity(ctx: &RequestContext, node: &Node, kind: ActivityType) -> NewActivity {
    NewActivity::new(ctx, None, TargetType::Node, node.id, &node.name, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cpu: f64) -> NewNodeMetric {
        NewNodeMetric {
            cpu_percent: cpu,
            memory_percent: 40.0,
            disk_percent: 10.0,
            network_rx_bytes: 0,
            network_tx_bytes: 0,
            sampled_at: None,
        }
    }

    #[test]
    fn samples_are_percentages() {
        assert!(check_sample(&sample(99.5)).is_ok());
        assert!(check_sample(&sample(100.5)).is_err());
        assert!(check_sample(&sample(f64::NAN)).is_err());
    }

    #[test]
    fn negative_counters_rejected() {
        let mut s = sample(1.0);
        s.network_tx_bytes = -1;
        assert!(check_sample(&s).is_err());
    }
}
