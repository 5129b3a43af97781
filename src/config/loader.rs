use std::path::Path;

use tracing::debug;

use crate::args::DEFAULT_CONFIG_FILES;
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return Err(ConfigError::MissingExtension);
        };
        if ext.eq_ignore_ascii_case("toml") {
            Ok(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(ConfigError::UnsupportedExtension {
                ext: ext.to_owned(),
            })
        }
    }
}

/// Loads the explicit config file, or the first default file that exists.
///
/// Returns `Ok(None)` when no path was given and no default file is present.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    let selected = path.map(Path::new).or_else(|| {
        DEFAULT_CONFIG_FILES
            .iter()
            .copied()
            .map(Path::new)
            .find(|candidate| candidate.exists())
    });
    selected.map(load_config_file).transpose()
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let format = ConfigFormat::from_path(path).map_err(AppError::config)?;
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    debug!("Loading {:?} config from {}", format, path.display());

    let parsed = match format {
        ConfigFormat::Toml => toml::from_str(&content).map_err(|err| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: err,
        }),
        ConfigFormat::Json => {
            serde_json::from_str(&content).map_err(|err| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }
    };
    parsed.map_err(AppError::config)
}
