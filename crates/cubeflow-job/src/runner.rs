//! Drives a single step invocation through its lifecycle.
//!
//! The runner is the piece of the job-graph driver that touches one step:
//! it records `RUNNING`, invokes [`Executable::do_work`] once, and records
//! the terminal state. Scheduling and retry policy stay with the caller; the
//! runner only refuses to start a step whose recorded state forbids it.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use cubeflow_core::JobId;
use cubeflow_core::observability::step_span;

use crate::error::Result;
use crate::execution::{Executable, ExecutableContext, ExecuteResult, StepState};
use crate::metrics::JobMetrics;
use crate::output::OutputStore;

/// Invokes steps and records their state in an [`OutputStore`].
#[derive(Clone)]
pub struct StepRunner {
    outputs: Arc<dyn OutputStore>,
    metrics: JobMetrics,
}

impl std::fmt::Debug for StepRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRunner").finish_non_exhaustive()
    }
}

impl StepRunner {
    /// Creates a runner recording into `outputs`.
    #[must_use]
    pub fn new(outputs: Arc<dyn OutputStore>) -> Self {
        Self {
            outputs,
            metrics: JobMetrics::new(),
        }
    }

    /// Runs a step once.
    ///
    /// On `Ok`, the step's recorded state is the outcome's state and the
    /// outcome is returned. On `Err`, the step is recorded as `FAILED` with the
    /// fault's description and the fault is returned unchanged; only an
    /// `ERROR` outcome leaves the step eligible for another run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`](crate::error::Error::InvalidStateTransition)
    /// if the step already finished, or the fault raised by the step.
    pub async fn run(&self, job_id: &JobId, step: &dyn Executable) -> Result<ExecuteResult> {
        let step_id = step.id().clone();
        let span = step_span(step.name(), job_id.as_str(), step_id.as_str());

        async {
            let previous = self
                .outputs
                .get_output(&step_id)
                .await?
                .map(|o| o.state)
                .unwrap_or_default();
            self.outputs
                .update_state(&step_id, StepState::Running, None)
                .await?;
            self.metrics
                .record_step_transition(previous.as_label(), StepState::Running.as_label());
            tracing::info!(step = step.name(), from = %previous, "step started");

            let context = ExecutableContext::new(job_id.clone(), step_id.clone());
            let started = Instant::now();
            let outcome = step.do_work(&context).await;
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(result) => {
                    let state = result.state.step_state();
                    self.outputs
                        .update_state(&step_id, state, result.message.clone())
                        .await?;
                    self.metrics
                        .record_step_transition(StepState::Running.as_label(), state.as_label());
                    self.metrics
                        .observe_step_duration(step.name(), state.as_label(), elapsed);
                    tracing::info!(
                        step = step.name(),
                        state = %state,
                        detail = result.message().unwrap_or_default(),
                        "step finished"
                    );
                    Ok(result)
                }
                Err(fault) => {
                    tracing::error!(step = step.name(), error = %fault, "step raised a fault");
                    // Faults are final.
                    self.outputs
                        .update_state(&step_id, StepState::Failed, Some(fault.to_string()))
                        .await?;
                    self.metrics.record_step_transition(
                        StepState::Running.as_label(),
                        StepState::Failed.as_label(),
                    );
                    self.metrics.observe_step_duration(step.name(), "fault", elapsed);
                    Err(fault)
                }
            }
        }
        .instrument(span)
        .await
    }
}
