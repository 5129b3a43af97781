use std::time::Duration;

use reqwest::Url;

use crate::metrics::{AggregateReport, TRANSPORT_ERROR_STATUS};

/// Basis points per whole, for two-decimal percentages.
const PERCENT_SCALE: u128 = 10_000;
/// Nanoseconds per hundredth of a millisecond.
const NS_PER_CENTI_MS: u128 = 10_000;
/// Half of [`NS_PER_CENTI_MS`], for round-half-up.
const NS_ROUNDING: u128 = 5_000;
/// Divisor between integer and fractional part of scaled values.
const HUNDREDTHS: u128 = 100;

pub(crate) fn print_summary(report: &AggregateReport, target: &Url) {
    for line in summary_lines(report, target) {
        println!("{}", line);
    }
}

pub(crate) fn summary_lines(report: &AggregateReport, target: &Url) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push("--- Load Test Report ---".to_owned());
    lines.push(format!("Target: {}", target));
    lines.push(format!("Started: {}", report.started_at.to_rfc3339()));
    lines.push(format!(
        "Total Wall Time: {}s",
        format_seconds(report.total_wall_time)
    ));
    lines.push(format!(
        "Total Requests: {} (planned {})",
        report.total_requests, report.planned_requests
    ));
    lines.push(format!(
        "Successful ({}): {} ({}%)",
        report.success_policy.label(),
        report.success_count,
        format_scaled(success_rate_x100(report))
    ));
    lines.push(format!("Failed: {}", report.failure_count()));
    lines.push(format!(
        "Requests/sec: {}",
        format_scaled(requests_per_sec_x100(report))
    ));
    lines.push(format!("Peak In-Flight: {}", report.peak_in_flight));
    lines.push(format!(
        "Latency min/mean/max: {} / {} / {} ms",
        format_millis(report.latency.min),
        format_millis(report.latency.mean),
        format_millis(report.latency.max)
    ));
    lines.push(format!(
        "Latency p50/p90/p99: {} / {} / {} ms",
        format_millis(report.latency.p50),
        format_millis(report.latency.p90),
        format_millis(report.latency.p99)
    ));

    lines.push("Non-success status codes:".to_owned());
    let mut any_failure = false;
    for (code, count) in report.non_success_statuses() {
        any_failure = true;
        lines.push(format!("  {} - {}: {}", code, status_reason(code), count));
    }
    if !any_failure {
        lines.push("  none".to_owned());
    }

    if report.interrupted {
        lines.push("Run interrupted: report covers completed requests only.".to_owned());
    }
    lines
}

pub(crate) fn status_reason(code: u16) -> &'static str {
    if code == TRANSPORT_ERROR_STATUS {
        return "Transport Error";
    }
    reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown")
}

/// Milliseconds with exactly two decimals, rounded half up.
pub(crate) fn format_millis(duration: Duration) -> String {
    let centi_ms = duration
        .as_nanos()
        .saturating_add(NS_ROUNDING)
        .checked_div(NS_PER_CENTI_MS)
        .unwrap_or(0);
    format_scaled(centi_ms)
}

fn format_seconds(duration: Duration) -> String {
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

fn format_scaled(value_x100: u128) -> String {
    format!(
        "{}.{:02}",
        value_x100.checked_div(HUNDREDTHS).unwrap_or(0),
        value_x100.checked_rem(HUNDREDTHS).unwrap_or(0)
    )
}

fn success_rate_x100(report: &AggregateReport) -> u128 {
    u128::from(report.success_count)
        .saturating_mul(PERCENT_SCALE)
        .checked_div(u128::from(report.total_requests))
        .unwrap_or(0)
}

fn requests_per_sec_x100(report: &AggregateReport) -> u128 {
    let wall_ms = report.total_wall_time.as_millis().max(1);
    u128::from(report.total_requests)
        .saturating_mul(100_000)
        .checked_div(wall_ms)
        .unwrap_or(0)
}
