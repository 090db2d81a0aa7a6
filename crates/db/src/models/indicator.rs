//! Per-target indicator rows.

use serde::Deserialize;
use sqlx::FromRow;

use angus_core::error::CoreError;
use angus_core::indicator::{
    CheckSetting, FuncIndicator, IndicatorTargetType, Percentile, PerfIndicator,
    StabilityIndicator,
};
use angus_core::types::DbId;

/// A row from the `indicator_perfs` table (indicator columns only).
#[derive(Debug, Clone, FromRow)]
pub struct IndicatorPerfRow {
    pub threads: i32,
    pub duration_secs: i64,
    pub ramp_up_threads: Option<i32>,
    pub ramp_up_interval_secs: Option<i64>,
    pub art_ms: i64,
    pub percentile: String,
    pub tps: f64,
    pub error_rate: f64,
}

impl TryFrom<IndicatorPerfRow> for PerfIndicator {
    type Error = CoreError;

    fn try_from(row: IndicatorPerfRow) -> Result<Self, Self::Error> {
        Ok(PerfIndicator {
            threads: row.threads,
            duration_secs: row.duration_secs,
            ramp_up_threads: row.ramp_up_threads,
            ramp_up_interval_secs: row.ramp_up_interval_secs,
            art_ms: row.art_ms,
            percentile: Percentile::from_str_value(&row.percentile)?,
            tps: row.tps,
            error_rate: row.error_rate,
        })
    }
}

/// A row from the `indicator_stabilities` table (indicator columns only).
#[derive(Debug, Clone, FromRow)]
pub struct IndicatorStabilityRow {
    pub threads: i32,
    pub duration_secs: i64,
    pub art_ms: i64,
    pub percentile: String,
    pub tps: f64,
    pub error_rate: f64,
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub disk: Option<f64>,
    pub network_mbps: Option<f64>,
}

impl TryFrom<IndicatorStabilityRow> for StabilityIndicator {
    type Error = CoreError;

    fn try_from(row: IndicatorStabilityRow) -> Result<Self, Self::Error> {
        Ok(StabilityIndicator {
            threads: row.threads,
            duration_secs: row.duration_secs,
            art_ms: row.art_ms,
            percentile: Percentile::from_str_value(&row.percentile)?,
            tps: row.tps,
            error_rate: row.error_rate,
            cpu: row.cpu,
            memory: row.memory,
            disk: row.disk,
            network_mbps: row.network_mbps,
        })
    }
}

/// A row from the `indicator_funcs` table (indicator columns only).
#[derive(Debug, Clone, FromRow)]
pub struct IndicatorFuncRow {
    pub smoke: bool,
    pub smoke_check_setting: String,
    pub security: bool,
    pub security_check_setting: String,
}

impl TryFrom<IndicatorFuncRow> for FuncIndicator {
    type Error = CoreError;

    fn try_from(row: IndicatorFuncRow) -> Result<Self, Self::Error> {
        Ok(FuncIndicator {
            smoke: row.smoke,
            smoke_check_setting: CheckSetting::from_str_value(&row.smoke_check_setting)?,
            security: row.security,
            security_check_setting: CheckSetting::from_str_value(&row.security_check_setting)?,
        })
    }
}

/// Path parameters identifying an indicator target.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IndicatorTarget {
    pub target_type: IndicatorTargetType,
    pub target_id: DbId,
}
