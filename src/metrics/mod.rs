//! Request outcomes, the run aggregate, and latency histogram utilities.
mod aggregator;
mod histogram;
mod types;


pub use aggregator::Aggregator;
pub(crate) use aggregator::spawn_aggregator;
pub use histogram::LatencyHistogram;
pub use types::{
    AggregateReport, LatencySummary, RequestOutcome, RunContext, TRANSPORT_ERROR_STATUS,
};
