//! Repository for the per-target indicator tables.
//!
//! Each target (API or scenario) has at most one perf, one stability and one
//! func indicator. Setting is an upsert; resetting deletes the row so reads
//! fall back to the tenant default.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::indicator::{FuncIndicator, PerfIndicator, StabilityIndicator};
use angus_core::types::DbId;

use crate::models::indicator::{
    IndicatorFuncRow, IndicatorPerfRow, IndicatorStabilityRow, IndicatorTarget,
};
use crate::PgTx;

/// Indicator kinds, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Perf,
    Stability,
    Func,
}

impl IndicatorKind {
    fn table(self) -> &'static str {
        match self {
            IndicatorKind::Perf => "indicator_perfs",
            IndicatorKind::Stability => "indicator_stabilities",
            IndicatorKind::Func => "indicator_funcs",
        }
    }
}

pub struct IndicatorRepo;

impl IndicatorRepo {
    // -----------------------------------------------------------------------
    // Upserts
    // -----------------------------------------------------------------------

    pub async fn upsert_perf(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        target: IndicatorTarget,
        value: &PerfIndicator,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO indicator_perfs \
                 (tenant_id, target_type, target_id, threads, duration_secs, ramp_up_threads, \
                  ramp_up_interval_secs, art_ms, percentile, tps, error_rate, \
                  created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
             ON CONFLICT ON CONSTRAINT uq_indicator_perfs_target DO UPDATE SET \
                 threads = EXCLUDED.threads, \
                 duration_secs = EXCLUDED.duration_secs, \
                 ramp_up_threads = EXCLUDED.ramp_up_threads, \
                 ramp_up_interval_secs = EXCLUDED.ramp_up_interval_secs, \
                 art_ms = EXCLUDED.art_ms, \
                 percentile = EXCLUDED.percentile, \
                 tps = EXCLUDED.tps, \
                 error_rate = EXCLUDED.error_rate, \
                 last_modified_by = EXCLUDED.last_modified_by, \
                 updated_at = NOW()",
        )
        .bind(ctx.tenant_id)
        .bind(target.target_type.as_str())
        .bind(target.target_id)
        .bind(value.threads)
        .bind(value.duration_secs)
        .bind(value.ramp_up_threads)
        .bind(value.ramp_up_interval_secs)
        .bind(value.art_ms)
        .bind(value.percentile.as_str())
        .bind(value.tps)
        .bind(value.error_rate)
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn upsert_stability(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        target: IndicatorTarget,
        value: &StabilityIndicator,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO indicator_stabilities \
                 (tenant_id, target_type, target_id, threads, duration_secs, art_ms, \
                  percentile, tps, error_rate, cpu, memory, disk, network_mbps, \
                  created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14) \
             ON CONFLICT ON CONSTRAINT uq_indicator_stabilities_target DO UPDATE SET \
                 threads = EXCLUDED.threads, \
                 duration_secs = EXCLUDED.duration_secs, \
                 art_ms = EXCLUDED.art_ms, \
                 percentile = EXCLUDED.percentile, \
                 tps = EXCLUDED.tps, \
                 error_rate = EXCLUDED.error_rate, \
                 cpu = EXCLUDED.cpu, \
                 memory = EXCLUDED.memory, \
                 disk = EXCLUDED.disk, \
                 network_mbps = EXCLUDED.network_mbps, \
                 last_modified_by = EXCLUDED.last_modified_by, \
                 updated_at = NOW()",
        )
        .bind(ctx.tenant_id)
        .bind(target.target_type.as_str())
        .bind(target.target_id)
        .bind(value.threads)
        .bind(value.duration_secs)
        .bind(value.art_ms)
        .bind(value.percentile.as_str())
        .bind(value.tps)
        .bind(value.error_rate)
        .bind(value.cpu)
        .bind(value.memory)
        .bind(value.disk)
        .bind(value.network_mbps)
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn upsert_func(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        target: IndicatorTarget,
        value: &FuncIndicator,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO indicator_funcs \
                 (tenant_id, target_type, target_id, smoke, smoke_check_setting, \
                  security, security_check_setting, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             ON CONFLICT ON CONSTRAINT uq_indicator_funcs_target DO UPDATE SET \
                 smoke = EXCLUDED.smoke, \
                 smoke_check_setting = EXCLUDED.smoke_check_setting, \
                 security = EXCLUDED.security, \
                 security_check_setting = EXCLUDED.security_check_setting, \
                 last_modified_by = EXCLUDED.last_modified_by, \
                 updated_at = NOW()",
        )
        .bind(ctx.tenant_id)
        .bind(target.target_type.as_str())
        .bind(target.target_id)
        .bind(value.smoke)
        .bind(value.smoke_check_setting.as_str())
        .bind(value.security)
        .bind(value.security_check_setting.as_str())
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_perf(
        pool: &PgPool,
        tenant_id: DbId,
        target: IndicatorTarget,
    ) -> Result<Option<IndicatorPerfRow>, sqlx::Error> {
        sqlx::query_as::<_, IndicatorPerfRow>(
            "SELECT threads, duration_secs, ramp_up_threads, ramp_up_interval_secs, art_ms, \
                 percentile, tps, error_rate \
             FROM indicator_perfs \
             WHERE tenant_id = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(tenant_id)
        .bind(target.target_type.as_str())
        .bind(target.target_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_stability(
        pool: &PgPool,
        tenant_id: DbId,
        target: IndicatorTarget,
    ) -> Result<Option<IndicatorStabilityRow>, sqlx::Error> {
        sqlx::query_as::<_, IndicatorStabilityRow>(
            "SELECT threads, duration_secs, art_ms, percentile, tps, error_rate, \
                 cpu, memory, disk, network_mbps \
             FROM indicator_stabilities \
             WHERE tenant_id = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(tenant_id)
        .bind(target.target_type.as_str())
        .bind(target.target_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_func(
        pool: &PgPool,
        tenant_id: DbId,
        target: IndicatorTarget,
    ) -> Result<Option<IndicatorFuncRow>, sqlx::Error> {
        sqlx::query_as::<_, IndicatorFuncRow>(
            "SELECT smoke, smoke_check_setting, security, security_check_setting \
             FROM indicator_funcs \
             WHERE tenant_id = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(tenant_id)
        .bind(target.target_type.as_str())
        .bind(target.target_id)
        .fetch_optional(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Remove a target's own indicator. Returns `true` if one existed.
    pub async fn delete(
        tx: &mut PgTx<'_>,
        tenant_id: DbId,
        kind: IndicatorKind,
        target: IndicatorTarget,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND target_type = $2 AND target_id = $3",
            kind.table()
        );
        let result = sqlx::query(&query)
            .bind(tenant_id)
            .bind(target.target_type.as_str())
            .bind(target.target_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
