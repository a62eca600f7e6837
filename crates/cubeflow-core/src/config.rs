//! Runtime configuration loaded from the process environment.
//!
//! Values are optional; unset keys fall back to defaults. Set-but-invalid
//! values are rejected rather than silently defaulted.

use crate::error::{Error, Result};
use crate::observability::LogFormat;

const ENV_LOG_FORMAT: &str = "CUBEFLOW_LOG_FORMAT";
const ENV_BYTES_WRITTEN_KEY: &str = "CUBEFLOW_BYTES_WRITTEN_KEY";
const ENV_SOURCE_RECORDS_KEY: &str = "CUBEFLOW_SOURCE_RECORDS_KEY";
const ENV_SOURCE_RECORDS_SIZE_KEY: &str = "CUBEFLOW_SOURCE_RECORDS_SIZE_KEY";

/// Default output key under which the convert step reports bytes written.
pub const DEFAULT_BYTES_WRITTEN_KEY: &str = "bytes_written";
/// Default output key for the number of source records read by a build.
pub const DEFAULT_SOURCE_RECORDS_KEY: &str = "source_records_count";
/// Default output key for the byte size of source records read by a build.
pub const DEFAULT_SOURCE_RECORDS_SIZE_KEY: &str = "source_records_size";

/// Runtime settings for job steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Log output format.
    pub log_format: LogFormat,
    /// Step output key holding the byte count written by the convert step.
    pub bytes_written_key: String,
    /// Step output key holding the source record count of a build.
    pub source_records_key: String,
    /// Step output key holding the source record byte size of a build.
    pub source_records_size_key: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            bytes_written_key: DEFAULT_BYTES_WRITTEN_KEY.to_string(),
            source_records_key: DEFAULT_SOURCE_RECORDS_KEY.to_string(),
            source_records_size_key: DEFAULT_SOURCE_RECORDS_SIZE_KEY.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Loads runtime config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a set value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Loads runtime config with a custom environment source.
    ///
    /// This entry point is test-friendly and accepts a key lookup function.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a set value is invalid.
    pub fn from_env_with<F>(get_env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_format = match get_env(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse::<LogFormat>()?,
            None => defaults.log_format,
        };

        Ok(Self {
            log_format,
            bytes_written_key: parse_key_env(
                &get_env,
                ENV_BYTES_WRITTEN_KEY,
                defaults.bytes_written_key,
            )?,
            source_records_key: parse_key_env(
                &get_env,
                ENV_SOURCE_RECORDS_KEY,
                defaults.source_records_key,
            )?,
            source_records_size_key: parse_key_env(
                &get_env,
                ENV_SOURCE_RECORDS_SIZE_KEY,
                defaults.source_records_size_key,
            )?,
        })
    }
}

fn parse_key_env<F>(get_env: &F, key: &str, default: String) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get_env(key) else {
        return Ok(default);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::configuration(format!("{key} must not be empty")));
    }
    Ok(trimmed.to_string())
}
