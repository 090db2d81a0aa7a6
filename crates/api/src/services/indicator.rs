//! Per-target indicators with fallback to the tenant defaults.

use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::indicator::{
    resolve, FuncIndicator, PerfIndicator, ResolvedIndicator, StabilityIndicator,
};
use angus_db::models::indicator::IndicatorTarget;
use angus_db::repositories::indicator_repo::IndicatorKind;
use angus_db::repositories::IndicatorRepo;
use sqlx::PgPool;

use crate::cache::SettingsCache;
use crate::error::{AppError, AppResult};

pub async fn set_perf(
    pool: &PgPool,
    ctx: &RequestContext,
    target: IndicatorTarget,
    value: PerfIndicator,
) -> AppResult<PerfIndicator> {
    biz::run(
        async {
            value.validate()?;
            Ok::<_, AppError>(value)
        },
        |value| async move {
            let mut tx = pool.begin().await?;
            IndicatorRepo::upsert_perf(&mut tx, ctx, target, &value).await?;
            tx.commit().await?;
            log_set(ctx, target, "perf");
            Ok(value)
        },
    )
    .await
}

pub async fn set_stability(
    pool: &PgPool,
    ctx: &RequestContext,
    target: IndicatorTarget,
    value: StabilityIndicator,
) -> AppResult<StabilityIndicator> {
    biz::run(
        async {
            value.validate()?;
            Ok::<_, AppError>(value)
        },
        |value| async move {
            let mut tx = pool.begin().await?;
            IndicatorRepo::upsert_stability(&mut tx, ctx, target, &value).await?;
            tx.commit().await?;
            log_set(ctx, target, "stability");
            Ok(value)
        },
    )
    .await
}

pub async fn set_func(
    pool: &PgPool,
    ctx: &RequestContext,
    target: IndicatorTarget,
    value: FuncIndicator,
) -> AppResult<FuncIndicator> {
    let mut tx = pool.begin().await?;
    IndicatorRepo::upsert_func(&mut tx, ctx, target, &value).await?;
    tx.commit().await?;
    log_set(ctx, target, "func");
    Ok(value)
}

pub async fn get_perf(
    pool: &PgPool,
    cache: &SettingsCache,
    ctx: &RequestContext,
    target: IndicatorTarget,
) -> AppResult<ResolvedIndicator<PerfIndicator>> {
    let own = IndicatorRepo::find_perf(pool, ctx.tenant_id, target)
        .await?
        .map(PerfIndicator::try_from)
        .transpose()?;
    let defaults = cache.get_or_load(pool, ctx.tenant_id).await?;
    Ok(resolve(own, defaults.perf_indicator))
}

pub async fn get_stability(
    pool: &PgPool,
    cache: &SettingsCache,
    ctx: &RequestContext,
    target: IndicatorTarget,
) -> AppResult<ResolvedIndicator<StabilityIndicator>> {
    let own = IndicatorRepo::find_stability(pool, ctx.tenant_id, target)
        .await?
        .map(StabilityIndicator::try_from)
        .transpose()?;
    let defaults = cache.get_or_load(pool, ctx.tenant_id).await?;
    Ok(resolve(own, defaults.stability_indicator))
}

pub async fn get_func(
    pool: &PgPool,
    cache: &SettingsCache,
    ctx: &RequestContext,
    target: IndicatorTarget,
) -> AppResult<ResolvedIndicator<FuncIndicator>> {
    let own = IndicatorRepo::find_func(pool, ctx.tenant_id, target)
        .await?
        .map(FuncIndicator::try_from)
        .transpose()?;
    let defaults = cache.get_or_load(pool, ctx.tenant_id).await?;
    Ok(resolve(own, defaults.func_indicator))
}

/// Drop the target's own indicator so reads fall back to the default.
/// Resetting a target without one is a no-op.
pub async fn reset(
    pool: &PgPool,
    ctx: &RequestContext,
    kind: IndicatorKind,
    target: IndicatorTarget,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let removed = IndicatorRepo::delete(&mut tx, ctx.tenant_id, kind, target).await?;
    tx.commit().await?;

    tracing::info!(
        tenant_id = ctx.tenant_id,
        target_type = %target.target_type,
        target_id = target.target_id,
        kind = ?kind,
        removed,
        "Indicator reset"
    );
    Ok(())
}

fn log_set(ctx: &RequestContext, target: IndicatorTarget, kind: &str) {
    tracing::info!(
        tenant_id = ctx.tenant_id,
        user_id = ctx.user_id,
        target_type = %target.target_type,
        target_id = target.target_id,
        kind,
        "Indicator set"
    );
}
