use tracing::{error, info};

use crate::{
    args::TesterArgs,
    dispatch::{DispatchEngine, DispatchOptions, DispatchResult, partition},
    error::{AppError, AppResult, ExportError},
    http::{RequestConfig, build_client},
    shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel},
};

use super::{export, summary};

/// Runs the configured load test, prints the report, then writes exports.
///
/// # Errors
///
/// Configuration errors are returned before any request is sent. Export
/// errors are returned after the report has been printed.
pub(crate) async fn run_local(args: &TesterArgs) -> AppResult<DispatchResult> {
    let request = RequestConfig::from_args(args)?;
    let client = build_client(args)?;
    let target = request.url().clone();
    let quotas = partition(args.requests, args.concurrency);
    let engine = DispatchEngine::new(client, request, DispatchOptions::from_args(args));

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    info!(
        "Load test: {} requests, concurrency {}, method {:?}",
        args.requests,
        args.concurrency.get(),
        args.method
    );
    let run_result = engine.run(&quotas, &shutdown_tx).await;

    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        error!("Signal handler task failed: {}", err);
    }

    let result = run_result?;
    summary::print_summary(&result.report, &target);
    write_exports(args, &result).await?;
    Ok(result)
}

/// Attempts every requested export; the first failure is returned.
async fn write_exports(args: &TesterArgs, result: &DispatchResult) -> AppResult<()> {
    if !args.wants_outcomes() {
        return Ok(());
    }
    let Some(outcomes) = result.outcomes.as_deref() else {
        return Err(AppError::export(ExportError::OutcomesNotRetained));
    };

    let mut first_error: Option<ExportError> = None;
    if let Some(path) = args.export_csv.as_deref() {
        match export::export_csv(path, outcomes).await {
            Ok(()) => info!("Wrote {} rows to {}", outcomes.len(), path),
            Err(err) => {
                error!("{}", err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(path) = args.export_json.as_deref() {
        match export::export_json(path, &result.report, outcomes).await {
            Ok(()) => info!("Wrote JSON export to {}", path),
            Err(err) => {
                error!("{}", err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    first_error.map_or(Ok(()), |err| Err(AppError::export(err)))
}
