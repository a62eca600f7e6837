//! # cubeflow-catalog
//!
//! Catalog model for analytical cubes and their segments.
//!
//! A [`Cube`](cube::Cube) owns an ordered list of
//! [`Segment`](segment::Segment)s. Every change to a cube goes through
//! [`CatalogStore::update_cube`](store::CatalogStore::update_cube), which
//! replaces the stored cube as a whole and rejects writes based on a stale
//! snapshot.
//!
//! ## Example
//!
//! ```rust
//! use cubeflow_catalog::prelude::*;
//! use cubeflow_core::SegmentId;
//!
//! # async fn example() -> cubeflow_catalog::error::Result<()> {
//! let store = InMemoryCatalogStore::new();
//!
//! let mut cube = Cube::new("sales_cube");
//! cube.add_segment(Segment::new(SegmentId::new("s1"), "20240101_20240201"));
//! store.create_cube(&cube).await?;
//!
//! let mut snapshot = store.get_cube("sales_cube").await?.expect("cube exists");
//! snapshot.segment_by_id_mut(&SegmentId::new("s1")).expect("segment exists").status =
//!     SegmentStatus::Ready;
//! store.update_cube(&snapshot).await?;
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
pub mod segment;
pub mod store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cube::Cube;
    pub use crate::error::{CatalogError, Result};
    pub use crate::segment::{Segment, SegmentStatus};
    pub use crate::store::CatalogStore;
    pub use crate::store::memory::InMemoryCatalogStore;
}

pub use cube::Cube;
pub use error::{CatalogError, Result};
pub use segment::{Segment, SegmentStatus};
pub use store::CatalogStore;
pub use store::memory::InMemoryCatalogStore;
