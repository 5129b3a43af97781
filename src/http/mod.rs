//! HTTP client setup and single-request execution.
mod client;
mod execution;
mod request;

#[cfg(test)]
mod tests;

pub use client::build_client;
pub(crate) use execution::execute_request;
pub use request::RequestConfig;
