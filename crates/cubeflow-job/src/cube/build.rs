//! Commits a freshly built segment into the catalog.
//!
//! The build counterpart of [`merge`](super::merge): the segment was created
//! in status NEW by an earlier step, the flat-table step reported how much
//! source data it read, and the convert step reported how many bytes it
//! wrote. This step records both and promotes the segment to READY.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use cubeflow_catalog::CatalogStore;
use cubeflow_core::{JobId, RuntimeConfig, SegmentId, StepId};

use super::{load_cube, param_keys, persist, read_upstream_u64};
use crate::error::Result;
use crate::execution::{Executable, ExecutableContext, ExecuteResult};
use crate::metrics::JobMetrics;
use crate::output::OutputStore;
use crate::params::StepParams;

const STEP_NAME: &str = "UpdateCubeInfoAfterBuild";

/// What to finalize, as carried in step parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Cube owning the segment.
    pub cube_name: String,
    /// The built segment, already present in the cube.
    pub segment_id: SegmentId,
    /// Step that wrote the segment data and reported its size.
    pub convert_step_id: StepId,
    /// Step that read the source data and reported its statistics.
    pub flat_table_step_id: StepId,
    /// Job this finalization belongs to.
    pub job_id: JobId,
}

impl BuildRequest {
    /// Encodes the request as step parameters.
    #[must_use]
    pub fn to_params(&self) -> StepParams {
        [
            (param_keys::CUBE_NAME, self.cube_name.as_str()),
            (param_keys::SEGMENT_ID, self.segment_id.as_str()),
            (param_keys::CONVERT_TO_HFILE_STEP_ID, self.convert_step_id.as_str()),
            (param_keys::CREATE_FLAT_TABLE_STEP_ID, self.flat_table_step_id.as_str()),
            (param_keys::CUBING_JOB_ID, self.job_id.as_str()),
        ]
        .into_iter()
        .collect()
    }

    /// Decodes a request from step parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionViolation`](crate::error::Error::PreconditionViolation)
    /// if a parameter is unset.
    pub fn from_params(params: &StepParams) -> Result<Self> {
        Ok(Self {
            cube_name: params.require_param(param_keys::CUBE_NAME)?.to_string(),
            segment_id: SegmentId::new(params.require_param(param_keys::SEGMENT_ID)?),
            convert_step_id: StepId::new(
                params.require_param(param_keys::CONVERT_TO_HFILE_STEP_ID)?,
            ),
            flat_table_step_id: StepId::new(
                params.require_param(param_keys::CREATE_FLAT_TABLE_STEP_ID)?,
            ),
            job_id: JobId::new(params.require_param(param_keys::CUBING_JOB_ID)?),
        })
    }
}

/// Finalizes a segment build.
///
/// Reports `FAILED` for an unknown cube or segment and `ERROR` when the
/// catalog read or write fails. Missing upstream reports are returned as
/// [`Error::PreconditionViolation`](crate::error::Error::PreconditionViolation).
pub struct UpdateCubeInfoAfterBuild {
    id: StepId,
    params: StepParams,
    catalog: Arc<dyn CatalogStore>,
    outputs: Arc<dyn OutputStore>,
    config: RuntimeConfig,
    metrics: JobMetrics,
}

impl std::fmt::Debug for UpdateCubeInfoAfterBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCubeInfoAfterBuild")
            .field("id", &self.id)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl UpdateCubeInfoAfterBuild {
    /// Creates the step for a build request.
    #[must_use]
    pub fn new(
        id: StepId,
        request: &BuildRequest,
        catalog: Arc<dyn CatalogStore>,
        outputs: Arc<dyn OutputStore>,
        config: RuntimeConfig,
    ) -> Self {
        Self::from_params(id, request.to_params(), catalog, outputs, config)
    }

    /// Restores the step from previously stored parameters.
    #[must_use]
    pub fn from_params(
        id: StepId,
        params: StepParams,
        catalog: Arc<dyn CatalogStore>,
        outputs: Arc<dyn OutputStore>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            id,
            params,
            catalog,
            outputs,
            config,
            metrics: JobMetrics::new(),
        }
    }

    async fn finalize(&self, request: &BuildRequest) -> Result<ExecuteResult> {
        let mut cube = match load_cube(self.catalog.as_ref(), &request.cube_name).await {
            Ok(cube) => cube,
            Err(outcome) => return Ok(outcome),
        };
        if cube.segment_by_id(&request.segment_id).is_none() {
            return Ok(ExecuteResult::failed(format!(
                "there is no segment with id:{}",
                request.segment_id
            )));
        }

        let outputs = self.outputs.as_ref();
        let size_kb = read_upstream_u64(
            outputs,
            &request.convert_step_id,
            &self.config.bytes_written_key,
            "cube segment size",
        )
        .await?
            / 1024;
        let source_records = read_upstream_u64(
            outputs,
            &request.flat_table_step_id,
            &self.config.source_records_key,
            "source records count",
        )
        .await?;
        let source_records_size = read_upstream_u64(
            outputs,
            &request.flat_table_step_id,
            &self.config.source_records_size_key,
            "source records size",
        )
        .await?;

        let Some(segment) = cube.segment_by_id_mut(&request.segment_id) else {
            return Ok(ExecuteResult::failed(format!(
                "there is no segment with id:{}",
                request.segment_id
            )));
        };
        segment.source_records = source_records;
        segment.source_records_size = source_records_size;
        segment.mark_ready(size_kb, request.job_id.clone(), Utc::now());

        let outcome = persist(self.catalog.as_ref(), &cube, STEP_NAME).await;
        if outcome.is_succeeded() {
            tracing::info!(
                cube = %cube.name,
                segment = %request.segment_id,
                size_kb,
                source_records,
                "build finalized"
            );
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Executable for UpdateCubeInfoAfterBuild {
    fn id(&self) -> &StepId {
        &self.id
    }

    fn name(&self) -> &'static str {
        STEP_NAME
    }

    fn params(&self) -> &StepParams {
        &self.params
    }

    async fn do_work(&self, _context: &ExecutableContext) -> Result<ExecuteResult> {
        let request = BuildRequest::from_params(&self.params)?;
        let outcome = self.finalize(&request).await;
        let label = match &outcome {
            Ok(result) => result.state.step_state().as_label(),
            Err(_) => "fault",
        };
        self.metrics.record_finalization("build", label);
        outcome
    }
}
