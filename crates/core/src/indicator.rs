//! Target indicators: pass/fail thresholds for APIs and scenarios.
//!
//! A tenant holds one default of each kind in its settings; a target may
//! override it. Reads fall back to the tenant default.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::macros::define_code_enum;

define_code_enum! {
    IndicatorTargetType {
        Api => "API",
        Scenario => "SCENARIO",
    }
}

define_code_enum! {
    Percentile {
        P50 => "P50",
        P75 => "P75",
        P90 => "P90",
        P95 => "P95",
        P99 => "P99",
    }
}

define_code_enum! {
    /// How a smoke or security check decides pass/fail.
    CheckSetting {
        NotVerified => "NOT_VERIFIED",
        ApiAvailable => "API_AVAILABLE",
        SatisfyFuncIndicator => "SATISFY_FUNC_INDICATOR",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfIndicator {
    pub threads: i32,
    pub duration_secs: i64,
    pub ramp_up_threads: Option<i32>,
    pub ramp_up_interval_secs: Option<i64>,
    /// Average response time ceiling in milliseconds.
    pub art_ms: i64,
    pub percentile: Percentile,
    pub tps: f64,
    /// Error rate ceiling in percent.
    pub error_rate: f64,
}

impl Default for PerfIndicator {
    fn default() -> Self {
        Self {
            threads: 50,
            duration_secs: 50 * 60,
            ramp_up_threads: None,
            ramp_up_interval_secs: None,
            art_ms: 500,
            percentile: Percentile::P90,
            tps: 100.0,
            error_rate: 0.01,
        }
    }
}

impl PerfIndicator {
    pub fn validate(&self) -> Result<(), CoreError> {
        positive("threads", self.threads as f64)?;
        positive("duration_secs", self.duration_secs as f64)?;
        positive("art_ms", self.art_ms as f64)?;
        positive("tps", self.tps)?;
        percent("error_rate", self.error_rate)?;
        if let Some(ramp) = self.ramp_up_threads {
            if ramp < 1 || ramp > self.threads {
                return Err(CoreError::Validation(
                    "ramp_up_threads must be between 1 and threads".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityIndicator {
    pub threads: i32,
    pub duration_secs: i64,
    pub art_ms: i64,
    pub percentile: Percentile,
    pub tps: f64,
    pub error_rate: f64,
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub disk: Option<f64>,
    pub network_mbps: Option<f64>,
}

impl Default for StabilityIndicator {
    fn default() -> Self {
        Self {
            threads: 200,
            duration_secs: 30 * 60,
            art_ms: 500,
            percentile: Percentile::P90,
            tps: 200.0,
            error_rate: 0.01,
            cpu: Some(75.0),
            memory: Some(75.0),
            disk: Some(75.0),
            network_mbps: None,
        }
    }
}

impl StabilityIndicator {
    pub fn validate(&self) -> Result<(), CoreError> {
        positive("threads", self.threads as f64)?;
        positive("duration_secs", self.duration_secs as f64)?;
        positive("art_ms", self.art_ms as f64)?;
        positive("tps", self.tps)?;
        percent("error_rate", self.error_rate)?;
        for (field, value) in [("cpu", self.cpu), ("memory", self.memory), ("disk", self.disk)] {
            if let Some(v) = value {
                percent(field, v)?;
            }
        }
        if let Some(net) = self.network_mbps {
            positive("network_mbps", net)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncIndicator {
    pub smoke: bool,
    pub smoke_check_setting: CheckSetting,
    pub security: bool,
    pub security_check_setting: CheckSetting,
}

impl Default for FuncIndicator {
    fn default() -> Self {
        Self {
            smoke: true,
            smoke_check_setting: CheckSetting::ApiAvailable,
            security: true,
            security_check_setting: CheckSetting::NotVerified,
        }
    }
}

/// An indicator resolved for a target, flagged when the tenant default was used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedIndicator<T> {
    #[serde(flatten)]
    pub indicator: T,
    pub is_default: bool,
}

/// Pick the target's own indicator, else the tenant default.
pub fn resolve<T>(own: Option<T>, tenant_default: T) -> ResolvedIndicator<T> {
    match own {
        Some(indicator) => ResolvedIndicator {
            indicator,
            is_default: false,
        },
        None => ResolvedIndicator {
            indicator: tenant_default,
            is_default: true,
        },
    }
}

fn positive(field: &str, value: f64) -> Result<(), CoreError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("{field} must be positive")))
    }
}

fn percent(field: &str, value: f64) -> Result<(), CoreError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be between 0 and 100"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PerfIndicator::default().validate().is_ok());
        assert!(StabilityIndicator::default().validate().is_ok());
    }

    #[test]
    fn ramp_up_bounded_by_threads() {
        let perf = PerfIndicator {
            ramp_up_threads: Some(100),
            ..PerfIndicator::default()
        };
        assert!(perf.validate().is_err());
    }

    #[test]
    fn stability_thresholds_are_percentages() {
        let s = StabilityIndicator {
            cpu: Some(120.0),
            ..StabilityIndicator::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn resolve_marks_default() {
        let own = resolve(Some(FuncIndicator::default()), FuncIndicator::default());
        assert!(!own.is_default);
        let fallback = resolve(None, FuncIndicator::default());
        assert!(fallback.is_default);
    }

    #[test]
    fn resolved_serializes_flat() {
        let json = serde_json::to_value(resolve(None, FuncIndicator::default())).unwrap();
        assert_eq!(json["is_default"], true);
        assert_eq!(json["smoke_check_setting"], "API_AVAILABLE");
    }
}
