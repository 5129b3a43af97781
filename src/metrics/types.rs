use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::args::SuccessPolicy;

/// Status recorded when no HTTP response was received.
pub const TRANSPORT_ERROR_STATUS: u16 = 0;

/// Result of one completed request attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status_code: u16,
    pub latency: Duration,
}

impl RequestOutcome {
    #[must_use]
    pub const fn new(status_code: u16, latency: Duration) -> Self {
        Self {
            status_code,
            latency,
        }
    }

    #[must_use]
    pub const fn transport_error(latency: Duration) -> Self {
        Self::new(TRANSPORT_ERROR_STATUS, latency)
    }

    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        self.status_code == TRANSPORT_ERROR_STATUS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencySummary {
    pub min: Duration,
    pub mean: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
}

/// Facts about the run that the aggregator cannot observe from outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub started_at: DateTime<Utc>,
    pub total_wall_time: Duration,
    pub planned_requests: u64,
    pub peak_in_flight: usize,
    pub interrupted: bool,
}

/// Frozen run-wide summary.
///
/// `status_histogram` values always sum to `total_requests`; transport
/// failures are counted under [`TRANSPORT_ERROR_STATUS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    pub total_requests: u64,
    pub success_count: u64,
    pub status_histogram: BTreeMap<u16, u64>,
    pub total_wall_time: Duration,
    pub latency: LatencySummary,
    pub success_policy: SuccessPolicy,
    pub started_at: DateTime<Utc>,
    pub planned_requests: u64,
    pub peak_in_flight: usize,
    pub interrupted: bool,
}

impl AggregateReport {
    #[must_use]
    pub fn transport_errors(&self) -> u64 {
        self.status_histogram
            .get(&TRANSPORT_ERROR_STATUS)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub const fn failure_count(&self) -> u64 {
        self.total_requests.saturating_sub(self.success_count)
    }

    /// Status codes that did not count as success, in ascending order.
    pub fn non_success_statuses(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.status_histogram
            .iter()
            .filter(|(code, _)| !self.success_policy.is_success(**code))
            .map(|(code, count)| (*code, *count))
    }
}
