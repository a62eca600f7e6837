//! Commits a segment merge into the catalog.
//!
//! An earlier stage created the merged segment (status NEW) and physically
//! wrote its data; the convert step reported the bytes written. This step
//! promotes the merged segment to READY, carries over the source statistics
//! of the segments it replaces, and removes those segments from the cube,
//! all in one catalog write.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use cubeflow_catalog::{CatalogStore, Segment};
use cubeflow_core::{JobId, RuntimeConfig, SegmentId, StepId};

use super::{load_cube, param_keys, persist, read_upstream_u64};
use crate::error::Result;
use crate::execution::{Executable, ExecutableContext, ExecuteResult, ExecuteState};
use crate::metrics::JobMetrics;
use crate::output::OutputStore;
use crate::params::StepParams;

const STEP_NAME: &str = "UpdateCubeInfoAfterMerge";

/// What to merge, as carried in step parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    /// Cube owning all segments involved.
    pub cube_name: String,
    /// The merged segment, already present in the cube.
    pub segment_id: SegmentId,
    /// Segments replaced by the merged one.
    pub merging_segment_ids: Vec<SegmentId>,
    /// Step that wrote the merged data and reported its size.
    pub convert_step_id: StepId,
    /// Job this finalization belongs to.
    pub job_id: JobId,
}

impl MergeRequest {
    /// Encodes the request as step parameters.
    #[must_use]
    pub fn to_params(&self) -> StepParams {
        let mut params = StepParams::new();
        params.set_param(param_keys::CUBE_NAME, self.cube_name.as_str());
        params.set_param(param_keys::SEGMENT_ID, self.segment_id.as_str());
        params.set_list(param_keys::MERGING_SEGMENT_IDS, &self.merging_segment_ids);
        params.set_param(param_keys::CONVERT_TO_HFILE_STEP_ID, self.convert_step_id.as_str());
        params.set_param(param_keys::CUBING_JOB_ID, self.job_id.as_str());
        params
    }

    /// Decodes a request from step parameters.
    ///
    /// An unset merging list decodes as empty; the step reports that as a
    /// failure rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionViolation`](crate::error::Error::PreconditionViolation)
    /// if a scalar parameter is unset.
    pub fn from_params(params: &StepParams) -> Result<Self> {
        Ok(Self {
            cube_name: params.require_param(param_keys::CUBE_NAME)?.to_string(),
            segment_id: SegmentId::new(params.require_param(param_keys::SEGMENT_ID)?),
            merging_segment_ids: params
                .get_list(param_keys::MERGING_SEGMENT_IDS)
                .into_iter()
                .map(SegmentId::new)
                .collect(),
            convert_step_id: StepId::new(
                params.require_param(param_keys::CONVERT_TO_HFILE_STEP_ID)?,
            ),
            job_id: JobId::new(params.require_param(param_keys::CUBING_JOB_ID)?),
        })
    }
}

/// Finalizes a segment merge.
///
/// Outcomes:
/// - `SUCCEEDED`: the merged segment is READY and the merged-away segments
///   are gone from the stored cube
/// - `FAILED`: the request does not match the catalog (no merging segments,
///   unknown cube or segment); not retried
/// - `ERROR`: the catalog read or write failed; the stored cube is unchanged
///   and the scheduler may retry
///
/// A missing size report from the convert step is returned as
/// [`Error::PreconditionViolation`](crate::error::Error::PreconditionViolation).
pub struct UpdateCubeInfoAfterMerge {
    id: StepId,
    params: StepParams,
    catalog: Arc<dyn CatalogStore>,
    outputs: Arc<dyn OutputStore>,
    config: RuntimeConfig,
    metrics: JobMetrics,
}

impl std::fmt::Debug for UpdateCubeInfoAfterMerge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCubeInfoAfterMerge")
            .field("id", &self.id)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl UpdateCubeInfoAfterMerge {
    /// Creates the step for a merge request.
    #[must_use]
    pub fn new(
        id: StepId,
        request: &MergeRequest,
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

    async fn finalize(&self, request: &MergeRequest) -> Result<ExecuteResult> {
        if request.merging_segment_ids.is_empty() {
            return Ok(ExecuteResult::failed("there are no merging segments"));
        }
        if request.merging_segment_ids.contains(&request.segment_id) {
            return Ok(ExecuteResult::failed(format!(
                "segment {} cannot be merged into itself",
                request.segment_id
            )));
        }

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

        let bytes_written = read_upstream_u64(
            self.outputs.as_ref(),
            &request.convert_step_id,
            &self.config.bytes_written_key,
            "cube segment size",
        )
        .await?;
        let size_kb = bytes_written / 1024;

        let merging: HashSet<SegmentId> = request.merging_segment_ids.iter().cloned().collect();
        let stale: Vec<&SegmentId> = request
            .merging_segment_ids
            .iter()
            .filter(|id| cube.segment_by_id(id).is_none())
            .collect();
        if !stale.is_empty() {
            tracing::warn!(
                cube = %cube.name,
                stale = ?stale,
                "merging segments not found in cube, skipping them"
            );
        }

        let retired = cube.remove_segments(&merging);
        if retired.is_empty() {
            return Ok(ExecuteResult::failed(format!(
                "none of the merging segments exist in cube:{}",
                cube.name
            )));
        }
        let (source_records, source_records_size) = source_totals(&retired);

        let Some(merged) = cube.segment_by_id_mut(&request.segment_id) else {
            return Ok(ExecuteResult::failed(format!(
                "there is no segment with id:{}",
                request.segment_id
            )));
        };
        merged.source_records = source_records;
        merged.source_records_size = source_records_size;
        merged.mark_ready(size_kb, request.job_id.clone(), Utc::now());

        let outcome = persist(self.catalog.as_ref(), &cube, STEP_NAME).await;
        if outcome.is_succeeded() {
            self.metrics.record_segments_retired(retired.len());
            tracing::info!(
                cube = %cube.name,
                segment = %request.segment_id,
                retired = retired.len(),
                size_kb,
                source_records,
                source_records_size,
                "merge finalized"
            );
        }
        Ok(outcome)
    }
}

/// Sums source record counts and sizes over the given segments.
fn source_totals(segments: &[Segment]) -> (u64, u64) {
    segments.iter().fold((0u64, 0u64), |(records, size), s| {
        (
            records.saturating_add(s.source_records),
            size.saturating_add(s.source_records_size),
        )
    })
}

#[async_trait]
impl Executable for UpdateCubeInfoAfterMerge {
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
        let request = MergeRequest::from_params(&self.params)?;
        let outcome = self.finalize(&request).await;

        match &outcome {
            Ok(result) => {
                let label = result.state.step_state().as_label();
                // ERROR outcomes were already logged where the catalog call failed.
                if result.state == ExecuteState::Failed {
                    tracing::warn!(
                        cube = %request.cube_name,
                        outcome = label,
                        detail = result.message().unwrap_or_default(),
                        "merge not finalized"
                    );
                }
                self.metrics.record_finalization("merge", label);
            }
            Err(_) => self.metrics.record_finalization("merge", "fault"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> MergeRequest {
        MergeRequest {
            cube_name: "sales_cube".into(),
            segment_id: SegmentId::new("m1"),
            merging_segment_ids: vec![SegmentId::new("s1"), SegmentId::new("s2")],
            convert_step_id: StepId::new("convert"),
            job_id: JobId::new("job-1"),
        }
    }

    #[test]
    fn request_params_use_stable_keys() {
        let params = request().to_params();
        assert_eq!(params.get_param("cubeName"), Some("sales_cube"));
        assert_eq!(params.get_param("segmentId"), Some("m1"));
        assert_eq!(params.get_param("mergingSegmentIds"), Some("s1,s2"));
        assert_eq!(params.get_param("convertToHFileStepId"), Some("convert"));
        assert_eq!(params.get_param("cubingJobId"), Some("job-1"));
    }

    #[test]
    fn request_roundtrips_through_params() {
        let original = request();
        let decoded = MergeRequest::from_params(&original.to_params()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn unset_merging_list_decodes_empty() {
        let mut params = request().to_params();
        params.set_param("mergingSegmentIds", "");
        let decoded = MergeRequest::from_params(&params).unwrap();
        assert!(decoded.merging_segment_ids.is_empty());
    }

    #[test]
    fn missing_scalar_param_is_a_precondition_violation() {
        let params: StepParams = [("cubeName", "sales_cube")].into_iter().collect();
        let err = MergeRequest::from_params(&params).unwrap_err();
        assert!(err.to_string().contains("segmentId"));
    }

    #[test]
    fn totals_sum_all_segments() {
        let segments = vec![
            Segment::new(SegmentId::new("s1"), "a").with_source_stats(100, 1000),
            Segment::new(SegmentId::new("s2"), "b").with_source_stats(200, 3000),
        ];
        assert_eq!(source_totals(&segments), (300, 4000));
        assert_eq!(source_totals(&[]), (0, 0));
    }
}
