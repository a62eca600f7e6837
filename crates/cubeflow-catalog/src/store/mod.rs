//! Pluggable persistence for cube metadata.
//!
//! ## Design Principles
//!
//! - **Whole-cube writes**: `update_cube` replaces the stored cube in one step;
//!   either the new snapshot is stored completely or the prior state is kept
//! - **Optimistic concurrency**: every write names the version it was derived
//!   from, and writes derived from a stale version are rejected
//! - **Testability**: in-memory implementation for tests, injected wherever a
//!   step needs catalog access

pub mod memory;

use async_trait::async_trait;

use cubeflow_core::SegmentId;

use crate::cube::Cube;
use crate::error::Result;
use crate::segment::Segment;

/// Storage abstraction for cube metadata.
///
/// ## Concurrency
///
/// Callers read a snapshot with [`get_cube`](Self::get_cube), mutate it
/// locally, and submit it with [`update_cube`](Self::update_cube). The store
/// does no locking on behalf of callers; two writers racing on the same cube
/// are told apart by the snapshot version, and the loser receives
/// [`CatalogError::VersionConflict`](crate::error::CatalogError::VersionConflict).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Gets a cube by name.
    ///
    /// Returns `None` if the cube does not exist.
    async fn get_cube(&self, name: &str) -> Result<Option<Cube>>;

    /// Gets a single segment of a cube.
    ///
    /// Returns `None` if either the cube or the segment does not exist.
    async fn get_segment_by_id(&self, cube_name: &str, id: &SegmentId) -> Result<Option<Segment>> {
        let cube = self.get_cube(cube_name).await?;
        Ok(cube.and_then(|c| c.segment_by_id(id).cloned()))
    }

    /// Registers a new cube.
    ///
    /// Returns the stored cube, carrying its initial version.
    async fn create_cube(&self, cube: &Cube) -> Result<Cube>;

    /// Replaces a stored cube with the given snapshot.
    ///
    /// The write is accepted only if `cube.version` equals the stored
    /// version. Returns the stored cube, carrying its new version.
    async fn update_cube(&self, cube: &Cube) -> Result<Cube>;
}
