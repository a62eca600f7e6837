//! Observability metrics for job steps.
//!
//! Metrics go through the `metrics` crate facade; installing an exporter is
//! the embedding process's concern. Without a recorder installed every call
//! is a no-op.
//!
//! ## Metrics Exported
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `cubeflow_step_transitions_total` | Counter | `from_state`, `to_state` | Step state transitions |
//! | `cubeflow_step_duration_seconds` | Histogram | `step`, `outcome` | Step invocation duration |
//! | `cubeflow_finalizations_total` | Counter | `step`, `outcome` | Finalization outcomes |
//! | `cubeflow_segments_retired_total` | Counter | - | Segments removed by merges |
//!
//! ## Usage
//!
//! ```rust
//! use cubeflow_job::metrics::JobMetrics;
//!
//! let metrics = JobMetrics::new();
//! metrics.record_step_transition("running", "succeeded");
//! metrics.record_finalization("merge", "succeeded");
//! ```

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: Step state transitions.
    pub const STEP_TRANSITIONS_TOTAL: &str = "cubeflow_step_transitions_total";
    /// Histogram: Step invocation duration in seconds.
    pub const STEP_DURATION_SECONDS: &str = "cubeflow_step_duration_seconds";
    /// Counter: Finalization outcomes.
    pub const FINALIZATIONS_TOTAL: &str = "cubeflow_finalizations_total";
    /// Counter: Segments removed from cubes by merges.
    pub const SEGMENTS_RETIRED_TOTAL: &str = "cubeflow_segments_retired_total";
}

/// Label keys used across metrics.
pub mod labels {
    /// Previous step state.
    pub const FROM_STATE: &str = "from_state";
    /// Target step state.
    pub const TO_STATE: &str = "to_state";
    /// Step name.
    pub const STEP: &str = "step";
    /// Outcome (succeeded, failed, error, fault).
    pub const OUTCOME: &str = "outcome";
}

/// Recorder for job step metrics.
///
/// Cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct JobMetrics;

impl JobMetrics {
    /// Creates a new metrics recorder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Records a step state transition.
    pub fn record_step_transition(&self, from_state: &str, to_state: &str) {
        counter!(
            names::STEP_TRANSITIONS_TOTAL,
            labels::FROM_STATE => from_state.to_string(),
            labels::TO_STATE => to_state.to_string(),
        )
        .increment(1);
    }

    /// Records how long one invocation of a step took.
    pub fn observe_step_duration(&self, step: &str, outcome: &str, duration_secs: f64) {
        histogram!(
            names::STEP_DURATION_SECONDS,
            labels::STEP => step.to_string(),
            labels::OUTCOME => outcome.to_string(),
        )
        .record(duration_secs);
    }

    /// Records the outcome of a finalization step.
    pub fn record_finalization(&self, step: &str, outcome: &str) {
        counter!(
            names::FINALIZATIONS_TOTAL,
            labels::STEP => step.to_string(),
            labels::OUTCOME => outcome.to_string(),
        )
        .increment(1);
    }

    /// Records segments retired by a merge.
    pub fn record_segments_retired(&self, count: usize) {
        counter!(names::SEGMENTS_RETIRED_TOTAL).increment(u64::try_from(count).unwrap_or(u64::MAX));
    }
}
