//! Steps that commit build and merge results into the cube catalog.
//!
//! Both steps follow the same shape: read one cube snapshot, validate the
//! request against it, mutate the snapshot locally, and hand it back to the
//! catalog with a single `update_cube` call. Nothing is written before that
//! call, so a rejected or failed write leaves the stored cube as it was.

pub mod build;
pub mod merge;

use tracing::Instrument;

use cubeflow_catalog::{CatalogStore, Cube};
use cubeflow_core::StepId;
use cubeflow_core::observability::catalog_span;

use crate::error::{Error, Result};
use crate::execution::ExecuteResult;
use crate::output::OutputStore;

pub use build::{BuildRequest, UpdateCubeInfoAfterBuild};
pub use merge::{MergeRequest, UpdateCubeInfoAfterMerge};

/// Step parameter keys shared by the finalization steps.
pub mod param_keys {
    /// Name of the cube being updated.
    pub const CUBE_NAME: &str = "cubeName";
    /// Segment being promoted to READY.
    pub const SEGMENT_ID: &str = "segmentId";
    /// Segments merged away.
    pub const MERGING_SEGMENT_IDS: &str = "mergingSegmentIds";
    /// Step that wrote the segment data and reported its size.
    pub const CONVERT_TO_HFILE_STEP_ID: &str = "convertToHFileStepId";
    /// Step that read the source data and reported its record statistics.
    pub const CREATE_FLAT_TABLE_STEP_ID: &str = "createFlatTableStepId";
    /// Job that the finalization belongs to.
    pub const CUBING_JOB_ID: &str = "cubingJobId";
}

/// Reads the cube a step finalizes into.
///
/// `Err` carries the outcome to report instead: `ERROR` when the catalog
/// read failed, `FAILED` when the cube does not exist.
async fn load_cube(
    catalog: &dyn CatalogStore,
    cube_name: &str,
) -> std::result::Result<Cube, ExecuteResult> {
    let read = catalog
        .get_cube(cube_name)
        .instrument(catalog_span("get_cube", cube_name))
        .await;
    match read {
        Ok(Some(cube)) => Ok(cube),
        Ok(None) => Err(ExecuteResult::failed(format!(
            "there is no cube named:{cube_name}"
        ))),
        Err(err) => {
            tracing::error!(cube = cube_name, error = %err, "fail to read cube");
            Err(ExecuteResult::error(err.detail()))
        }
    }
}

/// Reads a non-negative integer result published by an upstream step.
///
/// # Errors
///
/// Returns [`Error::PreconditionViolation`] if the upstream step has no
/// output, the value is missing or empty, or it is not an integer. Each of
/// these means the step was invoked before its upstream finished.
async fn read_upstream_u64(
    outputs: &dyn OutputStore,
    step_id: &StepId,
    key: &str,
    what: &str,
) -> Result<u64> {
    let Some(output) = outputs.get_output(step_id).await? else {
        return Err(Error::precondition(format!(
            "can't get {what}: step {step_id} has no output"
        )));
    };

    let raw = output.extra_value(key).map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(Error::precondition(format!(
            "can't get {what}: step {step_id} did not report {key}"
        )));
    }

    raw.parse::<u64>().map_err(|e| {
        Error::precondition(format!(
            "can't get {what}: step {step_id} reported {key}={raw}: {e}"
        ))
    })
}

/// Hands the mutated cube to the catalog.
///
/// The only outcome a caller may retry is the `ERROR` returned here.
async fn persist(catalog: &dyn CatalogStore, cube: &Cube, step: &str) -> ExecuteResult {
    let write = catalog
        .update_cube(cube)
        .instrument(catalog_span("update_cube", &cube.name))
        .await;
    match write {
        Ok(stored) => {
            tracing::debug!(cube = %stored.name, version = stored.version, "cube persisted");
            ExecuteResult::succeeded()
        }
        Err(err) => {
            tracing::error!(
                cube = %cube.name,
                step,
                retryable = err.is_retryable(),
                error = %err,
                "fail to update cube"
            );
            ExecuteResult::error(err.detail())
        }
    }
}
