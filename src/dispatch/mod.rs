//! Splits the request budget across workers and runs them against one target.
mod engine;
mod in_flight;
mod partition;
mod worker;


pub use engine::{DispatchEngine, DispatchOptions, DispatchResult};
pub use partition::{WorkQuota, partition};
