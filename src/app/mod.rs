//! Run orchestration: dispatch, report printing and exports.
mod export;
mod runner;
mod summary;


pub(crate) use runner::run_local;
