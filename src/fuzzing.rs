use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::{PositiveUsize, TesterArgs, parse_duration, parse_header};
use crate::config::apply_config;
use crate::config::types::ConfigFile;
use crate::dispatch::{WorkQuota, partition};
use crate::error::{AppError, AppResult, ConfigError};
use crate::http::RequestConfig;

thread_local! {
    static BASE_MATCHES: ArgMatches = TesterArgs::command().get_matches_from(["volley"]);
}

/// Parses a header string in `Key: Value` format.
///
/// # Errors
///
/// Returns an error when the header is malformed.
pub fn parse_header_input(input: &str) -> AppResult<(String, String)> {
    parse_header(input).map_err(AppError::from)
}

/// Parses a duration (e.g. `10s`, `500ms`).
///
/// # Errors
///
/// Returns an error when the duration is invalid.
pub fn parse_duration_input(input: &str) -> AppResult<Duration> {
    parse_duration(input).map_err(AppError::from)
}

/// Parses TOML config and applies it to defaults.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_toml(input: &str) -> AppResult<()> {
    let config: ConfigFile = toml::from_str(input).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: PathBuf::from("fuzz.toml"),
            source: err,
        })
    })?;
    apply_config_to_defaults(&config)
}

/// Parses JSON config and applies it to defaults.
///
/// # Errors
///
/// Returns an error when parsing or validation fails.
pub fn apply_config_from_json(input: &[u8]) -> AppResult<()> {
    let config: ConfigFile = serde_json::from_slice(input).map_err(|err| {
        AppError::config(ConfigError::ParseJson {
            path: PathBuf::from("fuzz.json"),
            source: err,
        })
    })?;
    apply_config_to_defaults(&config)
}

/// Validates a target URL and header list the way a run would.
///
/// # Errors
///
/// Returns an error when the URL or a header is invalid.
pub fn request_config_input(url: &str, headers: &[(String, String)]) -> AppResult<()> {
    RequestConfig::new(url, reqwest::Method::GET, headers, None).map(drop)
}

/// Splits `total` across `workers` (clamped to at least one).
#[must_use]
pub fn partition_input(total: u64, workers: usize) -> Vec<WorkQuota> {
    let workers = PositiveUsize::try_from(workers.max(1)).unwrap_or(PositiveUsize::ONE);
    partition(total, workers)
}

fn apply_config_to_defaults(config: &ConfigFile) -> AppResult<()> {
    BASE_MATCHES.with(|matches| {
        let mut args = TesterArgs::from_arg_matches(matches)?;
        apply_config(&mut args, matches, config)
    })
}
