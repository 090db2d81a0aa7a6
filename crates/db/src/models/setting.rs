//! Tenant settings and quota rows.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use angus_core::indicator::{FuncIndicator, PerfIndicator, StabilityIndicator};
use angus_core::quota::QuotaKind;
use angus_core::types::{DbId, Timestamp};

/// A row from the `tenant_settings` table.
#[derive(Debug, Clone, FromRow)]
pub struct TenantSettingsRow {
    pub tenant_id: DbId,
    pub perf_indicator: Json<PerfIndicator>,
    pub stability_indicator: Json<StabilityIndicator>,
    pub func_indicator: Json<FuncIndicator>,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

/// Default indicators of a tenant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantSettings {
    pub tenant_id: DbId,
    pub perf_indicator: PerfIndicator,
    pub stability_indicator: StabilityIndicator,
    pub func_indicator: FuncIndicator,
}

impl TenantSettings {
    /// Settings of a tenant that never saved any.
    pub fn defaults(tenant_id: DbId) -> Self {
        TenantSettings {
            tenant_id,
            perf_indicator: PerfIndicator::default(),
            stability_indicator: StabilityIndicator::default(),
            func_indicator: FuncIndicator::default(),
        }
    }
}

impl From<TenantSettingsRow> for TenantSettings {
    fn from(row: TenantSettingsRow) -> Self {
        TenantSettings {
            tenant_id: row.tenant_id,
            perf_indicator: row.perf_indicator.0,
            stability_indicator: row.stability_indicator.0,
            func_indicator: row.func_indicator.0,
        }
    }
}

/// Partial update; absent indicators keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    pub perf_indicator: Option<PerfIndicator>,
    pub stability_indicator: Option<StabilityIndicator>,
    pub func_indicator: Option<FuncIndicator>,
}

/// A row from the `tenant_quotas` table.
#[derive(Debug, Clone, FromRow)]
pub struct TenantQuotaRow {
    pub name: String,
    pub quota: i64,
}

/// Effective quota of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaView {
    pub name: QuotaKind,
    pub quota: i64,
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuota {
    pub name: QuotaKind,
    pub quota: i64,
}
