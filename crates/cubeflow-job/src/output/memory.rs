//! In-memory output store for testing.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use cubeflow_core::StepId;

use super::{OutputStore, StepOutput};
use crate::error::{Error, Result};
use crate::execution::StepState;

/// In-memory output store.
///
/// ## Example
///
/// ```rust
/// use cubeflow_job::output::memory::InMemoryOutputStore;
///
/// let outputs = InMemoryOutputStore::new();
/// assert_eq!(outputs.step_count().unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryOutputStore {
    outputs: RwLock<HashMap<StepId, StepOutput>>,
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("lock poisoned")
}

impl InMemoryOutputStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of steps with a recorded output.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn step_count(&self) -> Result<usize> {
        let count = {
            let outputs = self.outputs.read().map_err(poison_err)?;
            outputs.len()
        };
        Ok(count)
    }
}

#[async_trait]
impl OutputStore for InMemoryOutputStore {
    async fn get_output(&self, step_id: &StepId) -> Result<Option<StepOutput>> {
        let result = {
            let outputs = self.outputs.read().map_err(poison_err)?;
            outputs.get(step_id).cloned()
        };
        Ok(result)
    }

    async fn update_state(
        &self,
        step_id: &StepId,
        state: StepState,
        message: Option<String>,
    ) -> Result<()> {
        let mut outputs = self.outputs.write().map_err(poison_err)?;
        let output = outputs.entry(step_id.clone()).or_default();

        if !output.state.can_transition_to(state) {
            let from = output.state;
            drop(outputs);
            return Err(Error::InvalidStateTransition {
                from: from.to_string(),
                to: state.to_string(),
                reason: format!("step {step_id} cannot move from {from} to {state}"),
            });
        }

        output.state = state;
        output.message = message;
        output.last_modified = Some(Utc::now());
        drop(outputs);
        Ok(())
    }

    async fn add_extra(&self, step_id: &StepId, key: &str, value: &str) -> Result<()> {
        {
            let mut outputs = self.outputs.write().map_err(poison_err)?;
            let output = outputs.entry(step_id.clone()).or_default();
            output.extra.insert(key.to_string(), value.to_string());
            output.last_modified = Some(Utc::now());
        }
        Ok(())
    }
}
