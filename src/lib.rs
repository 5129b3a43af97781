//! Core library for the `volley` CLI.
//!
//! `volley` sends a fixed number of HTTP requests to one target through a
//! fixed pool of workers and reports status and latency statistics. The
//! library exposes the building blocks used by the binary: argument and
//! config types, the work partitioner, the dispatch engine, and the
//! outcome aggregator.
mod app;
pub mod args;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod http;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;
mod system;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;

#[cfg(test)]
mod test_support;
