//! Step outputs: recorded state plus key-value results.
//!
//! Each step's output carries its lifecycle state, the last outcome message,
//! and an `extra` map of string results published for downstream steps. The
//! convert step, for example, publishes the number of bytes it wrote; the
//! finalization steps read it back from here.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cubeflow_core::StepId;

use crate::error::Result;
use crate::execution::StepState;

/// Output record of a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Current lifecycle state.
    pub state: StepState,
    /// Message of the last outcome, if any.
    pub message: Option<String>,
    /// Results published by the step.
    pub extra: BTreeMap<String, String>,
    /// When the record last changed.
    pub last_modified: Option<DateTime<Utc>>,
}

impl StepOutput {
    /// Returns a published result, if present.
    #[must_use]
    pub fn extra_value(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Storage for step outputs.
///
/// Records are created lazily: a step without a record is `NOT_STARTED`
/// with no results.
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Gets the output of a step.
    ///
    /// Returns `None` if nothing was ever recorded for the step.
    async fn get_output(&self, step_id: &StepId) -> Result<Option<StepOutput>>;

    /// Moves a step to a new state and records the outcome message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`](crate::error::Error::InvalidStateTransition)
    /// if the move is not allowed from the current state.
    async fn update_state(
        &self,
        step_id: &StepId,
        state: StepState,
        message: Option<String>,
    ) -> Result<()>;

    /// Publishes a result for downstream steps.
    async fn add_extra(&self, step_id: &StepId, key: &str, value: &str) -> Result<()>;

    /// Reads a single published result.
    async fn get_extra(&self, step_id: &StepId, key: &str) -> Result<Option<String>> {
        let output = self.get_output(step_id).await?;
        Ok(output.and_then(|o| o.extra.get(key).cloned()))
    }
}
