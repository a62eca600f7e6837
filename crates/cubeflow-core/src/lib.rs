//! # cubeflow-core
//!
//! Core primitives shared by the cubeflow crates.
//!
//! - **Identifiers**: Strongly-typed ids for segments, jobs, and job steps
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialization and span helpers
//! - **Configuration**: Environment-driven runtime settings
//!
//! ## Example
//!
//! ```rust
//! use cubeflow_core::prelude::*;
//!
//! let job = JobId::generate();
//! let segment = SegmentId::new("seg-20240101");
//! assert_ne!(job.as_str(), segment.as_str());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod id;
pub mod observability;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::error::{Error, Result};
    pub use crate::id::{JobId, SegmentId, StepId};
    pub use crate::observability::{LogFormat, init_logging};
}

pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use id::{JobId, SegmentId, StepId};
pub use observability::{LogFormat, init_logging};
