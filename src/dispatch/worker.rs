use std::sync::Arc;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    error::MetricsError,
    http::{RequestConfig, execute_request},
    metrics::RequestOutcome,
    shutdown::{ShutdownReceiver, ShutdownSender, shutdown_requested, wait_for_shutdown},
};

use super::in_flight::InFlightTracker;
use super::partition::WorkQuota;

pub(super) struct WorkerContext {
    pub client: Client,
    pub request: Arc<RequestConfig>,
    pub outcomes_tx: mpsc::Sender<RequestOutcome>,
    pub in_flight: Arc<InFlightTracker>,
    pub wait_ongoing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct WorkerReport {
    pub worker_index: usize,
    pub completed: u64,
    pub interrupted: bool,
}

/// Spawns one worker that executes its quota one request at a time.
///
/// The shutdown receiver is subscribed before the task starts, so a shutdown
/// broadcast right after spawning is never missed.
pub(super) fn spawn_worker(
    quota: WorkQuota,
    context: WorkerContext,
    shutdown_tx: &ShutdownSender,
) -> JoinHandle<Result<WorkerReport, MetricsError>> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move { run_quota(quota, &context, &mut shutdown_rx).await })
}

async fn run_quota(
    quota: WorkQuota,
    context: &WorkerContext,
    shutdown_rx: &mut ShutdownReceiver,
) -> Result<WorkerReport, MetricsError> {
    debug!(
        worker = quota.worker_index,
        quota = quota.request_count,
        "Worker started"
    );
    let mut completed: u64 = 0;
    let mut interrupted = false;

    while completed < quota.request_count {
        if shutdown_requested(shutdown_rx) {
            interrupted = true;
            break;
        }

        let in_flight_guard = context.in_flight.acquire();
        let run_request = execute_request(&context.client, &context.request);
        let outcome = if context.wait_ongoing {
            Some(run_request.await)
        } else {
            tokio::select! {
                () = wait_for_shutdown(shutdown_rx) => None,
                outcome = run_request => Some(outcome),
            }
        };
        drop(in_flight_guard);

        let Some(outcome) = outcome else {
            // abandoned mid-flight, not recorded
            interrupted = true;
            break;
        };
        if context.outcomes_tx.send(outcome).await.is_err() {
            return Err(MetricsError::AggregatorClosed);
        }
        completed = completed.saturating_add(1);
    }

    debug!(
        worker = quota.worker_index,
        completed,
        interrupted,
        in_flight = context.in_flight.current(),
        "Worker finished"
    );
    Ok(WorkerReport {
        worker_index: quota.worker_index,
        completed,
        interrupted,
    })
}
