//! Repository for the `tenant_settings` and `tenant_quotas` tables.

use sqlx::types::Json;
use sqlx::PgPool;

use angus_core::quota::QuotaKind;
use angus_core::types::DbId;

use crate::models::setting::{QuotaView, TenantQuotaRow, TenantSettings, TenantSettingsRow};
use crate::PgTx;

const SETTINGS_COLUMNS: &str = "\
    tenant_id, perf_indicator, stability_indicator, func_indicator, \
    last_modified_by, updated_at";

pub struct SettingRepo;

impl SettingRepo {
    // -----------------------------------------------------------------------
    // Default indicators
    // -----------------------------------------------------------------------

    /// Stored settings, or built-in defaults when the tenant has none.
    pub async fn get_settings(pool: &PgPool, tenant_id: DbId) -> Result<TenantSettings, sqlx::Error> {
        let query = format!("SELECT {SETTINGS_COLUMNS} FROM tenant_settings WHERE tenant_id = $1");
        let row = sqlx::query_as::<_, TenantSettingsRow>(&query)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map_or_else(|| TenantSettings::defaults(tenant_id), TenantSettings::from))
    }

    pub async fn upsert_settings(
        tx: &mut PgTx<'_>,
        settings: &TenantSettings,
        user_id: DbId,
    ) -> Result<TenantSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO tenant_settings \
                 (tenant_id, perf_indicator, stability_indicator, func_indicator, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (tenant_id) DO UPDATE SET \
                 perf_indicator = EXCLUDED.perf_indicator, \
                 stability_indicator = EXCLUDED.stability_indicator, \
                 func_indicator = EXCLUDED.func_indicator, \
                 last_modified_by = EXCLUDED.last_modified_by, \
                 updated_at = NOW() \
             RETURNING {SETTINGS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TenantSettingsRow>(&query)
            .bind(settings.tenant_id)
            .bind(Json(&settings.perf_indicator))
            .bind(Json(&settings.stability_indicator))
            .bind(Json(&settings.func_indicator))
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(row.into())
    }

    // -----------------------------------------------------------------------
    // Quotas
    // -----------------------------------------------------------------------

    /// Effective limit of one quota kind.
    pub async fn quota_limit(
        pool: &PgPool,
        tenant_id: DbId,
        kind: QuotaKind,
    ) -> Result<i64, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT quota FROM tenant_quotas WHERE tenant_id = $1 AND name = $2")
                .bind(tenant_id)
                .bind(kind.as_str())
                .fetch_optional(pool)
                .await?;
        Ok(row.map_or_else(|| kind.default_limit(), |(quota,)| quota))
    }

    /// Every quota kind with its effective limit.
    pub async fn list_quotas(pool: &PgPool, tenant_id: DbId) -> Result<Vec<QuotaView>, sqlx::Error> {
        let overrides = sqlx::query_as::<_, TenantQuotaRow>(
            "SELECT name, quota FROM tenant_quotas WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(QuotaKind::ALL
            .iter()
            .map(|&kind| match overrides.iter().find(|o| o.name == kind.as_str()) {
                Some(row) => QuotaView {
                    name: kind,
                    quota: row.quota,
                    is_default: false,
                },
                None => QuotaView {
                    name: kind,
                    quota: kind.default_limit(),
                    is_default: true,
                },
            })
            .collect())
    }

    pub async fn upsert_quota(
        tx: &mut PgTx<'_>,
        tenant_id: DbId,
        kind: QuotaKind,
        quota: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tenant_quotas (tenant_id, name, quota) VALUES ($1, $2, $3) \
             ON CONFLICT (tenant_id, name) DO UPDATE SET quota = EXCLUDED.quota, updated_at = NOW()",
        )
        .bind(tenant_id)
        .bind(kind.as_str())
        .bind(quota)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
