//! Observability infrastructure for cubeflow.
//!
//! Structured logging with consistent spans. Steps run inside a
//! [`step_span`]; catalog reads and writes run inside a [`catalog_span`].

use std::str::FromStr;
use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Error;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(Error::configuration(format!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            ))),
        }
    }
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `cubeflow_job=debug`)
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for catalog operations on a single cube.
///
/// # Example
///
/// ```rust
/// use cubeflow_core::observability::catalog_span;
///
/// let span = catalog_span("update_cube", "sales_cube");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn catalog_span(operation: &str, cube: &str) -> Span {
    tracing::info_span!("catalog", op = operation, cube = cube)
}

/// Creates a span for a job step execution.
#[must_use]
pub fn step_span(operation: &str, job_id: &str, step_id: &str) -> Span {
    tracing::info_span!("step", op = operation, job_id = job_id, step_id = step_id)
}
