//! Execution nodes and agent metric samples.

use chrono::{DurationRound, TimeDelta};

use crate::error::CoreError;
use crate::macros::define_code_enum;
use crate::types::Timestamp;

/// Longest history window a metrics query may span.
pub const MAX_METRICS_WINDOW_HOURS: i64 = 7 * 24;

define_code_enum! {
    NodeRole {
        Controller => "CONTROLLER",
        Execution => "EXECUTION",
        MockService => "MOCK_SERVICE",
    }
}

/// Parse and deduplicate a role list; a node needs at least one role.
pub fn parse_roles(roles: &[String]) -> Result<Vec<NodeRole>, CoreError> {
    let mut parsed = Vec::with_capacity(roles.len());
    for role in roles {
        let role = NodeRole::from_str_value(role)?;
        if !parsed.contains(&role) {
            parsed.push(role);
        }
    }
    if parsed.is_empty() {
        return Err(CoreError::Validation(
            "A node needs at least one role".to_string(),
        ));
    }
    Ok(parsed)
}

/// Percent metrics must lie in `[0, 100]`.
pub fn validate_percent(field: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be between 0 and 100, got {value}"
        )))
    }
}

pub fn validate_ip(ip: &str) -> Result<(), CoreError> {
    ip.parse::<std::net::IpAddr>()
        .map(|_| ())
        .map_err(|_| CoreError::Validation(format!("Invalid IP address '{ip}'")))
}

/// Validate a metrics history window.
pub fn check_window(from: Timestamp, to: Timestamp) -> Result<(), CoreError> {
    if from > to {
        return Err(CoreError::Validation(
            "'from' must not be after 'to'".to_string(),
        ));
    }
    if to - from > TimeDelta::hours(MAX_METRICS_WINDOW_HOURS) {
        return Err(CoreError::Validation(format!(
            "Metrics window is limited to {MAX_METRICS_WINDOW_HOURS} hours"
        )));
    }
    Ok(())
}

/// One averaged point of a metrics history.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricBucket {
    pub bucket_start: Timestamp,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub samples: usize,
}

/// A sample reduced to the fields that get averaged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint {
    pub sampled_at: Timestamp,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
}

/// Average samples into fixed-width buckets aligned to `bucket_secs`.
///
/// Input may be in any order; output is ordered by bucket start.
pub fn bucket_average(points: &[MetricPoint], bucket_secs: i64) -> Vec<MetricBucket> {
    let width = TimeDelta::seconds(bucket_secs.max(1));
    let mut buckets: std::collections::BTreeMap<Timestamp, (f64, f64, f64, usize)> =
        std::collections::BTreeMap::new();

    for p in points {
        let start = p.sampled_at.duration_trunc(width).unwrap_or(p.sampled_at);
        let entry = buckets.entry(start).or_insert((0.0, 0.0, 0.0, 0));
        entry.0 += p.cpu_percent;
        entry.1 += p.memory_percent;
        entry.2 += p.disk_percent;
        entry.3 += 1;
    }

    buckets
        .into_iter()
        .map(|(bucket_start, (cpu, mem, disk, n))| {
            let n_f = n as f64;
            MetricBucket {
                bucket_start,
                cpu_percent: crate::stats::round2(cpu / n_f),
                memory_percent: crate::stats::round2(mem / n_f),
                disk_percent: crate::stats::round2(disk / n_f),
                samples: n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(min: u32, sec: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 1, 10, min, sec).unwrap()
    }

    fn point(ts: Timestamp, cpu: f64) -> MetricPoint {
        MetricPoint {
            sampled_at: ts,
            cpu_percent: cpu,
            memory_percent: 50.0,
            disk_percent: 10.0,
        }
    }

    #[test]
    fn roles_parse_and_dedup() {
        let roles = parse_roles(&["EXECUTION".into(), "CONTROLLER".into(), "EXECUTION".into()])
            .unwrap();
        assert_eq!(roles, vec![NodeRole::Execution, NodeRole::Controller]);
        assert!(parse_roles(&[]).is_err());
        assert!(parse_roles(&["WORKER".into()]).is_err());
    }

    #[test]
    fn percent_bounds() {
        assert!(validate_percent("cpu", 0.0).is_ok());
        assert!(validate_percent("cpu", 100.0).is_ok());
        assert!(validate_percent("cpu", 100.1).is_err());
        assert!(validate_percent("cpu", f64::NAN).is_err());
    }

    #[test]
    fn ip_validation() {
        assert!(validate_ip("10.0.0.8").is_ok());
        assert!(validate_ip("::1").is_ok());
        assert!(validate_ip("10.0.0").is_err());
    }

    #[test]
    fn window_limits() {
        assert!(check_window(at(0, 0), at(30, 0)).is_ok());
        assert!(check_window(at(30, 0), at(0, 0)).is_err());
    }

    #[test]
    fn buckets_average_and_order() {
        let points = [
            point(at(1, 30), 30.0),
            point(at(0, 10), 10.0),
            point(at(0, 50), 20.0),
        ];
        let buckets = bucket_average(&points, 60);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].bucket_start, at(0, 0));
        assert_eq!(buckets[0].cpu_percent, 15.0);
        assert_eq!(buckets[0].samples, 2);
        assert_eq!(buckets[1].cpu_percent, 30.0);
    }
}
