//! Step execution contract and lifecycle state.
//!
//! This module provides:
//! - `StepState`: the state machine of a step as a node in the job graph
//! - `ExecuteResult`: the outcome a step reports for one invocation
//! - `ExecutableContext`: what the driver hands a step when invoking it
//! - `Executable`: the capability every step implements

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cubeflow_core::{JobId, StepId};

use crate::error::Result;
use crate::params::StepParams;

/// Step lifecycle state.
///
/// ```text
/// ┌─────────────┐  invoked  ┌─────────┐ ──────► SUCCEEDED
/// │ NOT_STARTED │──────────►│ RUNNING │ ──────► FAILED
/// └─────────────┘           └─────────┘ ──────► ERROR
///                                ▲                 │
///                                └──── retry ──────┘
/// ```
///
/// SUCCEEDED and FAILED are final. ERROR ends the current invocation but
/// leaves the step eligible for another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepState {
    /// Not yet invoked.
    #[default]
    NotStarted,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Rejected its inputs; will not be retried.
    Failed,
    /// Hit a transient failure; the scheduler may retry.
    Error,
}

impl StepState {
    /// Returns true if the step can never run again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if another invocation may be attempted.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns true if the transition from self to target is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        match self {
            Self::NotStarted | Self::Error => matches!(target, Self::Running),
            Self::Running => matches!(target, Self::Succeeded | Self::Failed | Self::Error),
            Self::Succeeded | Self::Failed => false,
        }
    }

    /// Returns a lowercase label suitable for metrics and logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NOT_STARTED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Terminal outcome of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecuteState {
    /// The step did its work.
    Succeeded,
    /// The step rejected its inputs.
    Failed,
    /// The step hit a failure that a retry may clear.
    Error,
}

impl ExecuteState {
    /// Returns the step state this outcome moves the step into.
    #[must_use]
    pub const fn step_state(&self) -> StepState {
        match self {
            Self::Succeeded => StepState::Succeeded,
            Self::Failed => StepState::Failed,
            Self::Error => StepState::Error,
        }
    }
}

/// Outcome reported by [`Executable::do_work`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResult {
    /// Outcome kind.
    pub state: ExecuteState,
    /// Human readable detail, surfaced through job status reporting.
    pub message: Option<String>,
}

impl ExecuteResult {
    /// A successful outcome.
    #[must_use]
    pub const fn succeeded() -> Self {
        Self {
            state: ExecuteState::Succeeded,
            message: None,
        }
    }

    /// A non-retryable failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: ExecuteState::Failed,
            message: Some(message.into()),
        }
    }

    /// A retryable failure.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: ExecuteState::Error,
            message: Some(message.into()),
        }
    }

    /// Returns true if the step succeeded.
    #[must_use]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self.state, ExecuteState::Succeeded)
    }

    /// Returns the message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Context for one invocation of a step.
#[derive(Debug, Clone)]
pub struct ExecutableContext {
    /// Job the step belongs to.
    pub job_id: JobId,
    /// Step being invoked.
    pub step_id: StepId,
    /// When the driver started this invocation.
    pub started_at: DateTime<Utc>,
}

impl ExecutableContext {
    /// Creates a context starting now.
    #[must_use]
    pub fn new(job_id: JobId, step_id: StepId) -> Self {
        Self {
            job_id,
            step_id,
            started_at: Utc::now(),
        }
    }
}

/// A unit of work in a job graph.
///
/// Implementations receive their collaborators (catalog, output store) at
/// construction and read their configuration from [`params`](Self::params).
#[async_trait]
pub trait Executable: Send + Sync {
    /// Returns the step id.
    fn id(&self) -> &StepId;

    /// Returns a display name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns the step's parameters.
    fn params(&self) -> &StepParams;

    /// Performs the step's work once.
    ///
    /// # Errors
    ///
    /// Returns an error only when the invocation itself is broken (for
    /// example a required upstream output is missing). Data problems and
    /// transient failures are reported through the returned
    /// [`ExecuteResult`].
    async fn do_work(&self, context: &ExecutableContext) -> Result<ExecuteResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        assert!(StepState::NotStarted.can_transition_to(StepState::Running));
        assert!(StepState::Running.can_transition_to(StepState::Error));
        assert!(StepState::Error.can_transition_to(StepState::Running));
        assert!(!StepState::NotStarted.can_transition_to(StepState::Succeeded));
    }

    #[test]
    fn terminal_states_cannot_transition() {
        for terminal in [StepState::Succeeded, StepState::Failed] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(StepState::Running));
        }
        assert!(!StepState::Error.is_terminal());
        assert!(StepState::Error.is_retryable());
    }

    #[test]
    fn result_constructors() {
        let failed = ExecuteResult::failed("there are no merging segments");
        assert_eq!(failed.state, ExecuteState::Failed);
        assert_eq!(failed.message(), Some("there are no merging segments"));
        assert!(ExecuteResult::succeeded().is_succeeded());
        assert_eq!(ExecuteState::Error.step_state(), StepState::Error);
    }

    #[test]
    fn state_serializes_screaming_case() {
        let json = serde_json::to_string(&StepState::NotStarted).unwrap();
        assert_eq!(json, "\"NOT_STARTED\"");
    }
}
