//! In-memory catalog store for testing.
//!
//! This module provides [`InMemoryCatalogStore`], a simple in-memory
//! implementation of the [`CatalogStore`] trait.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No durability, no cross-process coordination
//! - **No persistence**: All state is lost when the process exits

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::CatalogStore;
use crate::cube::Cube;
use crate::error::{CatalogError, Result};

/// In-memory catalog store.
///
/// Thread-safe via `RwLock`. Versions start at 1 on creation and increase by
/// one on every accepted update.
///
/// ## Example
///
/// ```rust
/// use cubeflow_catalog::store::memory::InMemoryCatalogStore;
///
/// let store = InMemoryCatalogStore::new();
/// assert_eq!(store.cube_count().unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    cubes: RwLock<HashMap<String, Cube>>,
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> CatalogError {
    CatalogError::storage("lock poisoned")
}

impl InMemoryCatalogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cubes currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn cube_count(&self) -> Result<usize> {
        let count = {
            let cubes = self.cubes.read().map_err(poison_err)?;
            cubes.len()
        };
        Ok(count)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_cube(&self, name: &str) -> Result<Option<Cube>> {
        let result = {
            let cubes = self.cubes.read().map_err(poison_err)?;
            cubes.get(name).cloned()
        };
        Ok(result)
    }

    async fn create_cube(&self, cube: &Cube) -> Result<Cube> {
        let mut cubes = self.cubes.write().map_err(poison_err)?;

        if cubes.contains_key(&cube.name) {
            drop(cubes);
            return Err(CatalogError::AlreadyExists {
                name: cube.name.clone(),
            });
        }

        let mut stored = cube.clone();
        stored.version = 1;
        stored.last_modified = Some(Utc::now());
        cubes.insert(stored.name.clone(), stored.clone());
        drop(cubes);

        tracing::debug!(cube = %stored.name, "cube created");
        Ok(stored)
    }

    async fn update_cube(&self, cube: &Cube) -> Result<Cube> {
        let mut cubes = self.cubes.write().map_err(poison_err)?;

        let Some(current) = cubes.get_mut(&cube.name) else {
            drop(cubes);
            return Err(CatalogError::NotFound {
                message: format!("cube {}", cube.name),
            });
        };

        if current.version != cube.version {
            let actual = current.version;
            drop(cubes);
            return Err(CatalogError::VersionConflict {
                cube: cube.name.clone(),
                expected: cube.version,
                actual,
            });
        }

        let mut stored = cube.clone();
        stored.version = cube.version + 1;
        stored.last_modified = Some(Utc::now());
        *current = stored.clone();
        drop(cubes);

        tracing::debug!(cube = %stored.name, version = stored.version, "cube updated");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Segment, SegmentStatus};
    use cubeflow_core::SegmentId;

    fn sales_cube() -> Cube {
        let mut cube = Cube::new("sales_cube");
        cube.add_segment(Segment::new(SegmentId::new("s1"), "20240101_20240201"));
        cube
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = InMemoryCatalogStore::new();
        let created = store.create_cube(&sales_cube()).await.unwrap();
        assert_eq!(created.version, 1);

        let fetched = store.get_cube("sales_cube").await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.cube_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let store = InMemoryCatalogStore::new();
        store.create_cube(&sales_cube()).await.unwrap();
        let err = store.create_cube(&sales_cube()).await.unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let store = InMemoryCatalogStore::new();
        let mut cube = store.create_cube(&sales_cube()).await.unwrap();
        cube.segment_by_id_mut(&SegmentId::new("s1")).unwrap().status = SegmentStatus::Ready;

        let updated = store.update_cube(&cube).await.unwrap();
        assert_eq!(updated.version, 2);

        let segment = store
            .get_segment_by_id("sales_cube", &SegmentId::new("s1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(segment.status, SegmentStatus::Ready);
    }

    #[tokio::test]
    async fn update_from_stale_snapshot_is_rejected() {
        let store = InMemoryCatalogStore::new();
        let created = store.create_cube(&sales_cube()).await.unwrap();

        let mut first = created.clone();
        first.segments.clear();
        store.update_cube(&first).await.unwrap();

        let err = store.update_cube(&created).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));

        let stored = store.get_cube("sales_cube").await.unwrap().unwrap();
        assert!(stored.segments.is_empty());
    }

    #[tokio::test]
    async fn update_unknown_cube_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let err = store.update_cube(&sales_cube()).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[tokio::test]
    async fn segment_lookup_on_missing_cube_is_none() {
        let store = InMemoryCatalogStore::new();
        let segment = store
            .get_segment_by_id("nope", &SegmentId::new("s1"))
            .await
            .unwrap();
        assert!(segment.is_none());
    }
}
