use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::args::SuccessPolicy;
use crate::error::MetricsError;

use super::{AggregateReport, LatencyHistogram, LatencySummary, RequestOutcome, RunContext};

/// Folds outcomes into an [`AggregateReport`].
///
/// Owned by a single task for the whole run; the fold is commutative, so the
/// arrival order of outcomes does not affect the frozen report.
#[derive(Debug)]
pub struct Aggregator {
    success_policy: SuccessPolicy,
    total_requests: u64,
    success_count: u64,
    status_histogram: BTreeMap<u16, u64>,
    min_latency: Option<Duration>,
    max_latency: Duration,
    latency_sum_micros: u128,
    histogram: LatencyHistogram,
    retained: Option<Vec<RequestOutcome>>,
}

impl Aggregator {
    /// Creates an empty aggregator; `keep_outcomes` also retains every raw outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the latency histogram cannot be created.
    pub fn new(success_policy: SuccessPolicy, keep_outcomes: bool) -> Result<Self, MetricsError> {
        Ok(Self {
            success_policy,
            total_requests: 0,
            success_count: 0,
            status_histogram: BTreeMap::new(),
            min_latency: None,
            max_latency: Duration::ZERO,
            latency_sum_micros: 0,
            histogram: LatencyHistogram::new()?,
            retained: keep_outcomes.then(Vec::new),
        })
    }

    pub fn record(&mut self, outcome: RequestOutcome) {
        self.total_requests = self.total_requests.saturating_add(1);
        if self.success_policy.is_success(outcome.status_code) {
            self.success_count = self.success_count.saturating_add(1);
        }
        let bucket = self.status_histogram.entry(outcome.status_code).or_insert(0);
        *bucket = bucket.saturating_add(1);

        self.min_latency = Some(
            self.min_latency
                .map_or(outcome.latency, |min| min.min(outcome.latency)),
        );
        self.max_latency = self.max_latency.max(outcome.latency);
        self.latency_sum_micros = self
            .latency_sum_micros
            .saturating_add(outcome.latency.as_micros());
        if let Err(err) = self.histogram.record(outcome.latency) {
            warn!("Failed to record latency: {}", err);
        }

        if let Some(retained) = self.retained.as_mut() {
            retained.push(outcome);
        }
    }

    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Freezes the aggregate; the retained outcomes are returned alongside.
    #[must_use]
    pub fn finish(self, run: RunContext) -> (AggregateReport, Option<Vec<RequestOutcome>>) {
        let latency = self.latency_summary();
        let report = AggregateReport {
            total_requests: self.total_requests,
            success_count: self.success_count,
            status_histogram: self.status_histogram,
            total_wall_time: run.total_wall_time,
            latency,
            success_policy: self.success_policy,
            started_at: run.started_at,
            planned_requests: run.planned_requests,
            peak_in_flight: run.peak_in_flight,
            interrupted: run.interrupted,
        };
        (report, self.retained)
    }

    fn latency_summary(&self) -> LatencySummary {
        if self.total_requests == 0 {
            return LatencySummary::default();
        }
        let mean_micros = self
            .latency_sum_micros
            .checked_div(u128::from(self.total_requests))
            .unwrap_or(0);
        let (p50, p90, p99) = self.histogram.percentiles();
        LatencySummary {
            min: self.min_latency.unwrap_or(Duration::ZERO),
            mean: Duration::from_micros(u64::try_from(mean_micros).unwrap_or(u64::MAX)),
            max: self.max_latency,
            p50,
            p90,
            p99,
        }
    }
}

/// Runs `aggregator` on its own task until every outcome sender is dropped.
pub(crate) fn spawn_aggregator(
    mut aggregator: Aggregator,
    mut outcomes_rx: mpsc::Receiver<RequestOutcome>,
) -> JoinHandle<Aggregator> {
    tokio::spawn(async move {
        while let Some(outcome) = outcomes_rx.recv().await {
            aggregator.record(outcome);
        }
        aggregator
    })
}
