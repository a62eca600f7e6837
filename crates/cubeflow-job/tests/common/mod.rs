//! Shared fixtures for cubeflow-job integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use cubeflow_catalog::{CatalogError, CatalogStore, Cube, InMemoryCatalogStore, Segment};
use cubeflow_core::{JobId, RuntimeConfig, SegmentId, StepId};
use cubeflow_job::cube::{MergeRequest, UpdateCubeInfoAfterMerge};
use cubeflow_job::output::OutputStore;
use cubeflow_job::output::memory::InMemoryOutputStore;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("cubeflow=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

pub const CUBE: &str = "sales_cube";
pub const CONVERT_STEP: &str = "convert-to-hfile";

/// Catalog and output store shared by a test.
pub struct TestContext {
    pub catalog: Arc<InMemoryCatalogStore>,
    pub outputs: Arc<InMemoryOutputStore>,
}

impl TestContext {
    pub fn new() -> Self {
        init_test_logging();
        Self {
            catalog: Arc::new(InMemoryCatalogStore::new()),
            outputs: Arc::new(InMemoryOutputStore::new()),
        }
    }

    /// Seeds `sales_cube` with s1(100, 1000), s2(200, 3000), m1(NEW).
    pub async fn with_sales_cube() -> Self {
        let ctx = Self::new();
        let mut cube = Cube::new(CUBE);
        cube.add_segment(
            Segment::new(SegmentId::new("s1"), "20240101_20240201").with_source_stats(100, 1000),
        );
        cube.add_segment(
            Segment::new(SegmentId::new("s2"), "20240201_20240301").with_source_stats(200, 3000),
        );
        cube.add_segment(Segment::new(SegmentId::new("m1"), "20240101_20240301"));
        ctx.catalog.create_cube(&cube).await.expect("seed cube");
        ctx
    }

    pub async fn publish_bytes_written(&self, bytes: &str) {
        self.outputs
            .add_extra(&StepId::new(CONVERT_STEP), "bytes_written", bytes)
            .await
            .expect("publish bytes written");
    }

    pub async fn cube(&self) -> Cube {
        self.catalog
            .get_cube(CUBE)
            .await
            .expect("read cube")
            .expect("cube exists")
    }

    pub fn merge_step(&self, request: &MergeRequest) -> UpdateCubeInfoAfterMerge {
        self.merge_step_with_catalog(request, self.catalog.clone())
    }

    pub fn merge_step_with_catalog(
        &self,
        request: &MergeRequest,
        catalog: Arc<dyn CatalogStore>,
    ) -> UpdateCubeInfoAfterMerge {
        UpdateCubeInfoAfterMerge::new(
            StepId::new("update-cube-info"),
            request,
            catalog,
            self.outputs.clone(),
            RuntimeConfig::default(),
        )
    }
}

pub fn merge_request(merging: &[&str], target: &str) -> MergeRequest {
    MergeRequest {
        cube_name: CUBE.to_string(),
        segment_id: SegmentId::new(target),
        merging_segment_ids: merging.iter().map(|id| SegmentId::new(*id)).collect(),
        convert_step_id: StepId::new(CONVERT_STEP),
        job_id: JobId::new("merge-job-1"),
    }
}

pub fn segment_ids(cube: &Cube) -> Vec<&str> {
    cube.segments().iter().map(|s| s.id.as_str()).collect()
}

/// Catalog store whose writes fail with a storage error.
///
/// Reads are served from the wrapped store, so the stored cube stays
/// observable.
pub struct FailingWriteCatalog {
    inner: Arc<InMemoryCatalogStore>,
    message: String,
    update_calls: AtomicUsize,
}

impl FailingWriteCatalog {
    pub fn new(inner: Arc<InMemoryCatalogStore>, message: impl Into<String>) -> Self {
        Self {
            inner,
            message: message.into(),
            update_calls: AtomicUsize::new(0),
        }
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> CatalogError {
        CatalogError::storage_with_source(
            self.message.clone(),
            std::io::Error::other(self.message.clone()),
        )
    }
}

#[async_trait]
impl CatalogStore for FailingWriteCatalog {
    async fn get_cube(&self, name: &str) -> cubeflow_catalog::Result<Option<Cube>> {
        self.inner.get_cube(name).await
    }

    async fn create_cube(&self, cube: &Cube) -> cubeflow_catalog::Result<Cube> {
        self.inner.create_cube(cube).await
    }

    async fn update_cube(&self, _cube: &Cube) -> cubeflow_catalog::Result<Cube> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error())
    }
}

/// Catalog store whose reads fail.
pub struct FailingReadCatalog;

#[async_trait]
impl CatalogStore for FailingReadCatalog {
    async fn get_cube(&self, _name: &str) -> cubeflow_catalog::Result<Option<Cube>> {
        Err(CatalogError::storage("connection reset"))
    }

    async fn create_cube(&self, _cube: &Cube) -> cubeflow_catalog::Result<Cube> {
        Err(CatalogError::storage("connection reset"))
    }

    async fn update_cube(&self, _cube: &Cube) -> cubeflow_catalog::Result<Cube> {
        Err(CatalogError::storage("connection reset"))
    }
}
