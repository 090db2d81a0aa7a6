//! Statistics rollups over fetched rows.
//!
//! Counts and rates are computed on read and never stored. Rates are
//! percentages rounded half-up to two decimals.

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;
use serde::Serialize;

use crate::func::{self, CaseReviewStatus, CaseTestResult};
use crate::task::{self, TaskStatus};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

fn to_decimal(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

fn to_f64(value: &BigDecimal) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}

/// Round half-up to two decimals.
pub fn round2(value: f64) -> f64 {
    to_decimal(value)
        .map(|d| to_f64(&d.with_scale_round(2, RoundingMode::HalfUp)))
        .unwrap_or(0.0)
}

/// `numerator / denominator * 100`, half-up to two decimals; `0` when the
/// denominator is zero.
pub fn calc_rate(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let rate = BigDecimal::from(numerator) * BigDecimal::from(100) / BigDecimal::from(denominator);
    to_f64(&rate.with_scale_round(2, RoundingMode::HalfUp))
}

/// [`calc_rate`] over fractional quantities such as workloads.
pub fn calc_rate_f64(numerator: f64, denominator: f64) -> f64 {
    match (to_decimal(numerator), to_decimal(denominator)) {
        (Some(n), Some(d)) if d != BigDecimal::from(0) => {
            let rate = n * BigDecimal::from(100) / d;
            to_f64(&rate.with_scale_round(2, RoundingMode::HalfUp))
        }
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Task rollup
// ---------------------------------------------------------------------------

/// The columns of a task the rollups look at.
#[derive(Debug, Clone)]
pub struct TaskStat {
    pub status: TaskStatus,
    pub deadline_date: Option<Timestamp>,
    pub failure_count: i32,
    pub eval_workload: Option<f64>,
    pub actual_workload: Option<f64>,
    pub start_date: Option<Timestamp>,
    pub completed_date: Option<Timestamp>,
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskCount {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub confirming: i64,
    pub completed: i64,
    pub canceled: i64,
    pub overdue: i64,
    pub one_time_pass: i64,
    pub completed_rate: f64,
    pub overdue_rate: f64,
    pub one_time_pass_rate: f64,
    pub eval_workload: f64,
    pub actual_workload: f64,
    pub completed_workload: f64,
    pub saving_workload: f64,
    pub saving_rate: f64,
}

impl TaskCount {
    pub fn from_stats(rows: &[TaskStat], now: Timestamp) -> Self {
        let mut c = TaskCount {
            total: rows.len() as i64,
            ..Default::default()
        };
        let mut completed_eval = 0.0;
        let mut completed_actual = 0.0;

        for row in rows {
            match row.status {
                TaskStatus::Pending => c.pending += 1,
                TaskStatus::InProgress => c.in_progress += 1,
                TaskStatus::Confirming => c.confirming += 1,
                TaskStatus::Completed => c.completed += 1,
                TaskStatus::Canceled => c.canceled += 1,
            }
            if task::is_overdue(row.status, row.deadline_date, now) {
                c.overdue += 1;
            }
            let eval = row.eval_workload.unwrap_or(0.0);
            let actual = row.actual_workload.unwrap_or(eval);
            c.eval_workload += eval;
            c.actual_workload += actual;
            if row.status == TaskStatus::Completed {
                if row.failure_count == 0 {
                    c.one_time_pass += 1;
                }
                completed_eval += eval;
                completed_actual += actual;
            }
        }

        let valid = c.total - c.canceled;
        c.completed_rate = calc_rate(c.completed, valid);
        c.overdue_rate = calc_rate(c.overdue, valid);
        c.one_time_pass_rate = calc_rate(c.one_time_pass, c.completed);
        c.completed_workload = round2(completed_actual);
        c.saving_workload = round2((completed_eval - completed_actual).max(0.0));
        c.saving_rate = calc_rate_f64(c.saving_workload, completed_eval);
        c.eval_workload = round2(c.eval_workload);
        c.actual_workload = round2(c.actual_workload);
        c
    }
}

// ---------------------------------------------------------------------------
// Case rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CaseStat {
    pub test_result: CaseTestResult,
    pub review_status: CaseReviewStatus,
    pub deadline_date: Option<Timestamp>,
    pub test_fail_num: i32,
    pub eval_workload: Option<f64>,
    pub actual_workload: Option<f64>,
    pub created_at: Timestamp,
    pub test_result_handle_date: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseCount {
    pub total: i64,
    pub pending: i64,
    pub passed: i64,
    pub not_passed: i64,
    pub blocked: i64,
    pub canceled: i64,
    pub review_pending: i64,
    pub review_passed: i64,
    pub review_failed: i64,
    pub overdue: i64,
    pub one_time_pass: i64,
    pub progress_rate: f64,
    pub passed_rate: f64,
    pub one_time_pass_rate: f64,
    pub eval_workload: f64,
    pub actual_workload: f64,
    pub completed_workload: f64,
    pub saving_workload: f64,
    pub saving_rate: f64,
}

impl CaseCount {
    pub fn from_stats(rows: &[CaseStat], now: Timestamp) -> Self {
        let mut c = CaseCount {
            total: rows.len() as i64,
            ..Default::default()
        };
        let mut completed_eval = 0.0;
        let mut completed_actual = 0.0;

        for row in rows {
            match row.test_result {
                CaseTestResult::Pending => c.pending += 1,
                CaseTestResult::Passed => c.passed += 1,
                CaseTestResult::NotPassed => c.not_passed += 1,
                CaseTestResult::Blocked => c.blocked += 1,
                CaseTestResult::Canceled => c.canceled += 1,
            }
            match row.review_status {
                CaseReviewStatus::Pending => c.review_pending += 1,
                CaseReviewStatus::Passed => c.review_passed += 1,
                CaseReviewStatus::Failed => c.review_failed += 1,
            }
            if func::is_case_overdue(row.test_result, row.deadline_date, now) {
                c.overdue += 1;
            }
            let eval = row.eval_workload.unwrap_or(0.0);
            let actual = row.actual_workload.unwrap_or(eval);
            c.eval_workload += eval;
            c.actual_workload += actual;
            if row.test_result == CaseTestResult::Passed {
                if row.test_fail_num == 0 {
                    c.one_time_pass += 1;
                }
                completed_eval += eval;
                completed_actual += actual;
            }
        }

        let valid = c.total - c.canceled;
        c.progress_rate = calc_rate(c.passed, valid);
        c.passed_rate = calc_rate(c.passed, c.passed + c.not_passed);
        c.one_time_pass_rate = calc_rate(c.one_time_pass, c.passed);
        c.completed_workload = round2(completed_actual);
        c.saving_workload = round2((completed_eval - completed_actual).max(0.0));
        c.saving_rate = calc_rate_f64(c.saving_workload, completed_eval);
        c.eval_workload = round2(c.eval_workload);
        c.actual_workload = round2(c.actual_workload);
        c
    }
}

// ---------------------------------------------------------------------------
// Lead time and trends
// ---------------------------------------------------------------------------

/// Processing time of finished items, in hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadTime {
    pub count: i64,
    pub avg_hours: f64,
    pub min_hours: f64,
    pub max_hours: f64,
}

impl LeadTime {
    /// Build from `(started, finished)` pairs; inverted pairs are skipped.
    pub fn from_spans(spans: impl IntoIterator<Item = (Timestamp, Timestamp)>) -> Self {
        let hours: Vec<f64> = spans
            .into_iter()
            .filter(|(s, e)| e >= s)
            .map(|(s, e)| (e - s).num_seconds() as f64 / 3600.0)
            .collect();
        if hours.is_empty() {
            return LeadTime::default();
        }
        let sum: f64 = hours.iter().sum();
        LeadTime {
            count: hours.len() as i64,
            avg_hours: round2(sum / hours.len() as f64),
            min_hours: round2(hours.iter().copied().fold(f64::INFINITY, f64::min)),
            max_hours: round2(hours.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Count timestamps per UTC day over `[from, to]`, emitting empty days too.
pub fn trend_by_day(timestamps: &[Timestamp], from: NaiveDate, to: NaiveDate) -> Vec<DayCount> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut day = from;
    while day <= to {
        buckets.insert(day, 0);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    for ts in timestamps {
        if let Some(count) = buckets.get_mut(&ts.date_naive()) {
            *count += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

// ---------------------------------------------------------------------------
// Project overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectCounts {
    pub sprints: i64,
    pub tasks: i64,
    pub plans: i64,
    pub cases: i64,
    pub baselines: i64,
    pub reviews: i64,
    pub execs: i64,
    pub reports: i64,
    pub tags: i64,
    pub members: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectOverview {
    pub counts: ProjectCounts,
    pub tasks: TaskCount,
    pub cases: CaseCount,
    pub task_lead_time: LeadTime,
}

impl ProjectOverview {
    pub fn assemble(
        counts: ProjectCounts,
        tasks: &[TaskStat],
        cases: &[CaseStat],
        now: Timestamp,
    ) -> Self {
        let task_lead_time = LeadTime::from_spans(
            tasks
                .iter()
                .filter_map(|t| Some((t.start_date?, t.completed_date?))),
        );
        ProjectOverview {
            counts,
            tasks: TaskCount::from_stats(tasks, now),
            cases: CaseCount::from_stats(cases, now),
            task_lead_time,
        }
    }
}
