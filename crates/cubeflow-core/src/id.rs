//! Strongly-typed identifiers for cubeflow entities.
//!
//! Segment, job and step ids are minted by other parts of the pipeline and
//! arrive here as opaque strings, so each id wraps a `String` rather than a
//! parsed ULID. Locally minted ids (`generate()`) are ULIDs, which keeps them
//! sortable by creation time.
//!
//! # Example
//!
//! ```rust
//! use cubeflow_core::id::{JobId, SegmentId};
//!
//! let segment: SegmentId = "seg-1".parse().unwrap();
//! let job = JobId::generate();
//!
//! // IDs are different types - this won't compile:
//! // let wrong: SegmentId = job;
//! # let _ = (segment, job);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a new unique identifier backed by a ULID.
            #[must_use]
            pub fn generate() -> Self {
                Self(Ulid::new().to_string())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                if s.trim().is_empty() {
                    return Err(Error::InvalidId {
                        message: format!("{} must not be empty", $label),
                    });
                }
                Ok(Self(s.to_string()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a segment within a cube.
    ///
    /// Unique within the cube that owns it.
    SegmentId,
    "segment ID"
);

string_id!(
    /// Identifier of a job (a whole build or merge graph).
    JobId,
    "job ID"
);

string_id!(
    /// Identifier of a single step inside a job graph.
    ///
    /// Step outputs (including metrics such as bytes written) are keyed by
    /// this id.
    StepId,
    "step ID"
);
