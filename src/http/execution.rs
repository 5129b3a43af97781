use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::RequestOutcome;

use super::RequestConfig;

/// Sends one request and waits until its body is fully drained.
///
/// Latency covers issuing the call through the last body byte. A failure
/// before the status line arrives becomes a transport-error outcome carrying
/// the time spent until the failure. Once a status is received it is kept,
/// even if reading the body fails afterwards.
pub(crate) async fn execute_request(client: &Client, config: &RequestConfig) -> RequestOutcome {
    let start = Instant::now();
    let request = match config.build_request(client) {
        Ok(request) => request,
        Err(err) => {
            debug!("Failed to build request: {}", err);
            return RequestOutcome::transport_error(start.elapsed());
        }
    };

    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => {
            debug!(timed_out = err.is_timeout(), "Request failed: {}", err);
            return RequestOutcome::transport_error(start.elapsed());
        }
    };

    let status_code = response.status().as_u16();
    if let Err(err) = drain_response_body(response).await {
        debug!(
            status_code,
            timed_out = err.is_timeout(),
            "Response body read failed: {}",
            err
        );
    }
    RequestOutcome::new(status_code, start.elapsed())
}

/// Reads the body to the end so the connection returns to the pool.
async fn drain_response_body(response: Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
