use clap::Parser;
use std::time::Duration;

use super::parsers::{parse_bool_env, parse_duration_arg, parse_header, parse_positive_usize};
use super::types::{HttpMethod, PositiveUsize, SuccessPolicy};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Fixed-volume async HTTP load tester - splits a request budget across a bounded worker pool and reports status and latency statistics."
)]
pub struct TesterArgs {
    /// Target URL for the load test
    #[arg(long, short)]
    pub url: Option<String>,

    /// Total number of requests to send
    #[arg(long = "requests", short = 'n', default_value = "100")]
    pub requests: u64,

    /// Number of concurrent workers (hard ceiling on in-flight requests)
    #[arg(
        long = "concurrency",
        short = 'c',
        default_value = "10",
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// HTTP method to use
    #[arg(long, short = 'X', default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// HTTP headers in 'Key: Value' format (repeatable, later duplicates win)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body sent with every request
    #[arg(long, short)]
    pub data: Option<String>,

    /// Request body read from file
    #[arg(long = "data-file", short = 'D', conflicts_with = "data")]
    pub data_file: Option<String>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Timeout for establishing a new connection (supports ms/s/m/h)
    #[arg(long = "connect-timeout", default_value = "5s", value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// Which responses count as successful: any 2xx, or exactly 200
    #[arg(long = "success", default_value = "2xx", value_enum)]
    pub success_policy: SuccessPolicy,

    /// Write one CSV row per request outcome to this path
    #[arg(long = "export-csv")]
    pub export_csv: Option<String>,

    /// Write the summary and every request outcome as JSON to this path
    #[arg(long = "export-json")]
    pub export_json: Option<String>,

    /// On Ctrl+C, let in-flight requests finish and record them
    #[arg(long = "wait-ongoing")]
    pub wait_ongoing: bool,

    /// Path to a TOML or JSON config file (defaults to ./volley.toml or ./volley.json)
    #[arg(long, short = 'C')]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}

impl TesterArgs {
    /// Whether any export flag asks for raw outcomes to be retained.
    #[must_use]
    pub const fn wants_outcomes(&self) -> bool {
        self.export_csv.is_some() || self.export_json.is_some()
    }
}
