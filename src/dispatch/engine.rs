use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    args::{SuccessPolicy, TesterArgs},
    error::{AppError, AppResult, ValidationError},
    http::RequestConfig,
    metrics::{AggregateReport, Aggregator, RequestOutcome, RunContext, spawn_aggregator},
    shutdown::ShutdownSender,
};

use super::in_flight::InFlightTracker;
use super::partition::WorkQuota;
use super::worker::{WorkerContext, spawn_worker};

/// Outcomes buffered per worker before senders wait on the aggregator.
const OUTCOME_BUFFER_PER_WORKER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOptions {
    pub success_policy: SuccessPolicy,
    /// Keep every raw outcome in arrival order (needed for exports).
    pub keep_outcomes: bool,
    /// On shutdown, let in-flight requests finish and record them.
    pub wait_ongoing: bool,
}

impl DispatchOptions {
    #[must_use]
    pub const fn from_args(args: &TesterArgs) -> Self {
        Self {
            success_policy: args.success_policy,
            keep_outcomes: args.wants_outcomes(),
            wait_ongoing: args.wait_ongoing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub report: AggregateReport,
    /// Raw outcomes, present only when [`DispatchOptions::keep_outcomes`] was set.
    pub outcomes: Option<Vec<RequestOutcome>>,
}

/// Runs a fixed set of workers against one immutable request.
///
/// Each worker owns one quota and executes it sequentially, so the number of
/// outstanding requests never exceeds the number of quotas. Outcomes flow over
/// a channel to a single aggregator task, which is the only writer of the
/// report.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    client: Client,
    request: Arc<RequestConfig>,
    options: DispatchOptions,
}

impl DispatchEngine {
    #[must_use]
    pub fn new(client: Client, request: RequestConfig, options: DispatchOptions) -> Self {
        Self {
            client,
            request: Arc::new(request),
            options,
        }
    }

    /// Launches one worker per quota and waits for all of them.
    ///
    /// Per-request failures never fail the run; they are recorded under the
    /// transport error status. A shutdown broadcast on `shutdown_tx` stops the
    /// workers early and yields a partial report marked as interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error when `quotas` is empty, or when a worker or the
    /// aggregator task fails.
    pub async fn run(
        &self,
        quotas: &[WorkQuota],
        shutdown_tx: &ShutdownSender,
    ) -> AppResult<DispatchResult> {
        if quotas.is_empty() {
            return Err(AppError::validation(ValidationError::NoWorkers));
        }
        let planned_requests = quotas
            .iter()
            .fold(0_u64, |sum, quota| sum.saturating_add(quota.request_count));

        let aggregator = Aggregator::new(self.options.success_policy, self.options.keep_outcomes)?;
        let (outcomes_tx, outcomes_rx) =
            mpsc::channel(quotas.len().saturating_mul(OUTCOME_BUFFER_PER_WORKER));
        let aggregator_handle = spawn_aggregator(aggregator, outcomes_rx);
        let in_flight = Arc::new(InFlightTracker::default());

        info!(
            "Dispatching {} requests to {} across {} workers",
            planned_requests,
            self.request.url(),
            quotas.len()
        );
        let started_at = Utc::now();
        let start = Instant::now();

        let handles: Vec<_> = quotas
            .iter()
            .map(|quota| {
                let context = WorkerContext {
                    client: self.client.clone(),
                    request: Arc::clone(&self.request),
                    outcomes_tx: outcomes_tx.clone(),
                    in_flight: Arc::clone(&in_flight),
                    wait_ongoing: self.options.wait_ongoing,
                };
                spawn_worker(*quota, context, shutdown_tx)
            })
            .collect();
        drop(outcomes_tx);

        let mut joined = Vec::with_capacity(handles.len());
        for handle in handles {
            joined.push(handle.await);
        }
        let total_wall_time = start.elapsed();
        let drained = aggregator_handle.await?;

        let mut interrupted = false;
        for result in joined {
            let worker = result??;
            debug!(
                worker = worker.worker_index,
                completed = worker.completed,
                "Worker joined"
            );
            interrupted = interrupted || worker.interrupted;
        }
        if interrupted {
            warn!(
                "Run interrupted after {} of {} requests",
                drained.total_requests(),
                planned_requests
            );
        }

        let (report, outcomes) = drained.finish(RunContext {
            started_at,
            total_wall_time,
            planned_requests,
            peak_in_flight: in_flight.peak(),
            interrupted,
        });
        info!(
            "Completed {} requests in {:.2}s",
            report.total_requests,
            total_wall_time.as_secs_f64()
        );
        Ok(DispatchResult { report, outcomes })
    }
}
