use std::time::Duration;

use serde::Deserialize;

use crate::args::{HttpMethod, SuccessPolicy, parse_duration};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub requests: Option<u64>,
    #[serde(alias = "workers")]
    pub concurrency: Option<usize>,
    pub method: Option<HttpMethod>,
    pub headers: Option<Vec<String>>,
    pub data: Option<String>,
    pub data_file: Option<String>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub success: Option<SuccessPolicy>,
    pub export_csv: Option<String>,
    pub export_json: Option<String>,
    pub wait_ongoing: Option<bool>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
}

/// A duration given either as whole seconds or as a string with units.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> AppResult<Duration> {
        let parsed = match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration(text),
        };
        parsed.map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
    }
}
