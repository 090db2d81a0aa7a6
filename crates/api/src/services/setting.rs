//! Tenant settings and quotas.
//!
//! Reads go through [`SettingsCache`]; every write evicts the tenant entry
//! after the transaction commits.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_db::models::activity::NewActivity;
use angus_db::models::setting::{QuotaView, TenantSettings, UpdateQuota, UpdateSettings};
use angus_db::repositories::{ActivityRepo, SettingRepo};
use sqlx::PgPool;

use crate::cache::SettingsCache;
use crate::error::{AppError, AppResult};

const SETTINGS_NAME: &str = "Tenant settings";

pub async fn get(
    pool: &PgPool,
    cache: &SettingsCache,
    ctx: &RequestContext,
) -> AppResult<TenantSettings> {
    Ok(cache.get_or_load(pool, ctx.tenant_id).await?)
}

/// Replace the default indicators named in `input`; absent ones are kept.
pub async fn update(
    pool: &PgPool,
    cache: &SettingsCache,
    ctx: &RequestContext,
    input: UpdateSettings,
) -> AppResult<TenantSettings> {
    biz::run(
        async {
            ctx.require_admin()?;
            if let Some(perf) = &input.perf_indicator {
                perf.validate()?;
            }
            if let Some(stability) = &input.stability_indicator {
                stability.validate()?;
            }
            let current = SettingRepo::get_settings(pool, ctx.tenant_id).await?;
            Ok::<_, AppError>(merge(current, input))
        },
        |merged| async move {
            let mut tx = pool.begin().await?;
            let saved = SettingRepo::upsert_settings(&mut tx, &merged, ctx.user_id).await?;
            ActivityRepo::insert(
                &mut tx,
                &NewActivity::new(
                    ctx,
                    None,
                    TargetType::Setting,
                    ctx.tenant_id,
                    SETTINGS_NAME,
                    ActivityType::Updated,
                ),
            )
            .await?;
            tx.commit().await?;
            cache.evict(ctx.tenant_id).await;

            tracing::info!(tenant_id = ctx.tenant_id, user_id = ctx.user_id, "Tenant settings updated");
            Ok(saved)
        },
    )
    .await
}

pub async fn quotas(pool: &PgPool, ctx: &RequestContext) -> AppResult<Vec<QuotaView>> {
    Ok(SettingRepo::list_quotas(pool, ctx.tenant_id).await?)
}

pub async fn update_quota(
    pool: &PgPool,
    cache: &SettingsCache,
    ctx: &RequestContext,
    input: UpdateQuota,
) -> AppResult<Vec<QuotaView>> {
    biz::run(
        async {
            ctx.require_admin()?;
            if input.quota < 0 {
                return Err(AppError::Core(CoreError::Validation(
                    "Quota must not be negative".to_string(),
                )));
            }
            Ok::<_, AppError>(input)
        },
        |input| async move {
            let mut tx = pool.begin().await?;
            SettingRepo::upsert_quota(&mut tx, ctx.tenant_id, input.name, input.quota).await?;
            ActivityRepo::insert(
                &mut tx,
                &NewActivity::new(
                    ctx,
                    None,
                    TargetType::Setting,
                    ctx.tenant_id,
                    input.name.as_str(),
                    ActivityType::Updated,
                ),
            )
            .await?;
            tx.commit().await?;
            cache.evict(ctx.tenant_id).await;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                quota = %input.name,
                limit = input.quota,
                "Tenant quota updated"
            );
            Ok(SettingRepo::list_quotas(pool, ctx.tenant_id).await?)
        },
    )
    .await
}

fn merge(current: TenantSettings, input: UpdateSettings) -> TenantSettings {
    TenantSettings {
        tenant_id: current.tenant_id,
        perf_indicator: input.perf_indicator.unwrap_or(current.perf_indicator),
        stability_indicator: input
            .stability_indicator
            .unwrap_or(current.stability_indicator),
        func_indicator: input.func_indicator.unwrap_or(current.func_indicator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use angus_core::indicator::PerfIndicator;

    #[test]
    fn merge_keeps_absent_indicators() {
        let perf = PerfIndicator {
            threads: 8,
            ..PerfIndicator::default()
        };
        let merged = merge(
            TenantSettings::defaults(3),
            UpdateSettings {
                perf_indicator: Some(perf.clone()),
                ..UpdateSettings::default()
            },
        );
        assert_eq!(merged.perf_indicator, perf);
        assert_eq!(merged.stability_indicator, TenantSettings::defaults(3).stability_indicator);
        assert_eq!(merged.tenant_id, 3);
    }
}
