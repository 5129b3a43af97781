use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveUsize, TesterArgs, parse_header};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// Values given on the command line always win over the config file.
///
/// # Errors
///
/// Returns an error when config values are invalid or conflict with each other.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if config.data.is_some() && config.data_file.is_some() {
        return Err(AppError::config(ConfigError::Conflict {
            left: "data",
            right: "data_file",
        }));
    }

    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = requests;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = PositiveUsize::try_from(concurrency).map_err(|err| {
            AppError::config(ConfigError::FieldMustBePositive {
                field: "concurrency".to_owned(),
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(
                parse_header(header)
                    .map_err(|err| AppError::config(ConfigError::InvalidHeader { source: err }))?,
            );
        }
        args.headers = parsed;
    }

    // A body from either source on the CLI replaces both config body fields.
    let body_on_cli = is_cli(matches, "data") || is_cli(matches, "data_file");
    if !body_on_cli {
        if let Some(data) = config.data.clone() {
            args.data = Some(data);
        }
        if let Some(path) = config.data_file.clone() {
            args.data_file = Some(path);
        }
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration("timeout")?;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = timeout.to_duration("connect_timeout")?;
    }

    if !is_cli(matches, "success_policy")
        && let Some(policy) = config.success
    {
        args.success_policy = policy;
    }

    if !is_cli(matches, "export_csv")
        && let Some(path) = config.export_csv.clone()
    {
        args.export_csv = Some(path);
    }

    if !is_cli(matches, "export_json")
        && let Some(path) = config.export_json.clone()
    {
        args.export_json = Some(path);
    }

    if !is_cli(matches, "wait_ongoing")
        && let Some(value) = config.wait_ongoing
    {
        args.wait_ongoing = value;
    }

    if !is_cli(matches, "verbose")
        && let Some(value) = config.verbose
    {
        args.verbose = value;
    }

    if !is_cli(matches, "no_color")
        && let Some(value) = config.no_color
    {
        args.no_color = value;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}
