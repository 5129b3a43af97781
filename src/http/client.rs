use reqwest::Client;
use tracing::error;

use crate::{
    args::{DEFAULT_USER_AGENT, TesterArgs},
    error::{AppError, AppResult, HttpError},
};

/// Builds the client shared by every worker.
///
/// The client is cheap to clone; all clones share one connection pool.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built.
pub fn build_client(args: &TesterArgs) -> AppResult<Client> {
    let client_builder = Client::builder()
        .timeout(args.request_timeout)
        .connect_timeout(args.connect_timeout)
        .user_agent(DEFAULT_USER_AGENT);

    match client_builder.build() {
        Ok(client) => Ok(client),
        Err(err) => {
            error!("Failed to build HTTP client: {}", err);
            Err(AppError::http(HttpError::BuildClientFailed { source: err }))
        }
    }
}
