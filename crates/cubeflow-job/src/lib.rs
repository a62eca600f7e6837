//! # cubeflow-job
//!
//! Job steps that keep a cube's catalog consistent with the data built for
//! it.
//!
//! This crate provides:
//!
//! - **Step contract**: [`Executable`](execution::Executable), invoked once
//!   per traversal of the job graph and reporting SUCCEEDED, FAILED or ERROR
//! - **Parameters**: string key-value step configuration that survives
//!   restarts, including escaped id lists
//! - **Step outputs**: lifecycle state and published results such as bytes
//!   written, read by downstream steps
//! - **Runner**: drives one invocation and records its state
//! - **Finalization steps**: commit a segment build or merge into the
//!   catalog with a single write
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cubeflow_catalog::InMemoryCatalogStore;
//! use cubeflow_core::{JobId, RuntimeConfig, SegmentId, StepId};
//! use cubeflow_job::cube::{MergeRequest, UpdateCubeInfoAfterMerge};
//! use cubeflow_job::output::memory::InMemoryOutputStore;
//! use cubeflow_job::runner::StepRunner;
//!
//! # async fn example() -> cubeflow_job::error::Result<()> {
//! let catalog = Arc::new(InMemoryCatalogStore::new());
//! let outputs = Arc::new(InMemoryOutputStore::new());
//!
//! let request = MergeRequest {
//!     cube_name: "sales_cube".into(),
//!     segment_id: SegmentId::new("m1"),
//!     merging_segment_ids: vec![SegmentId::new("s1"), SegmentId::new("s2")],
//!     convert_step_id: StepId::new("convert"),
//!     job_id: JobId::new("merge-job"),
//! };
//! let step = UpdateCubeInfoAfterMerge::new(
//!     StepId::generate(),
//!     &request,
//!     catalog,
//!     outputs.clone(),
//!     RuntimeConfig::default(),
//! );
//!
//! let result = StepRunner::new(outputs).run(&request.job_id, &step).await?;
//! println!("{:?}", result.state);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cube;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod output;
pub mod params;
pub mod runner;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cube::{
        BuildRequest, MergeRequest, UpdateCubeInfoAfterBuild, UpdateCubeInfoAfterMerge,
    };
    pub use crate::error::{Error, Result};
    pub use crate::execution::{
        Executable, ExecutableContext, ExecuteResult, ExecuteState, StepState,
    };
    pub use crate::metrics::JobMetrics;
    pub use crate::output::memory::InMemoryOutputStore;
    pub use crate::output::{OutputStore, StepOutput};
    pub use crate::params::StepParams;
    pub use crate::runner::StepRunner;
}
