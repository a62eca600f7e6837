//! Error types for catalog operations.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The cube was modified since the snapshot being written was read.
    #[error("version conflict on cube {cube}: expected version {expected}, found {actual}")]
    VersionConflict {
        /// Name of the cube.
        cube: String,
        /// Version carried by the submitted snapshot.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// A cube with the same name already exists.
    #[error("cube already exists: {name}")]
    AlreadyExists {
        /// Name of the cube.
        name: String,
    },

    /// Resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },
}

impl CatalogError {
    /// Creates a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the failure description without the error kind prefix.
    ///
    /// For storage errors this is the message the backend reported; other
    /// errors are described in full.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Storage { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if retrying the operation on a fresh snapshot may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::VersionConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_display() {
        let err = CatalogError::VersionConflict {
            cube: "sales_cube".into(),
            expected: 3,
            actual: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("sales_cube"));
        assert!(msg.contains("expected version 3"));
        assert!(err.is_retryable());
    }

    #[test]
    fn detail_drops_storage_prefix() {
        let err = CatalogError::storage_with_source(
            "disk quota exceeded",
            std::io::Error::other("quota"),
        );
        assert_eq!(err.to_string(), "storage error: disk quota exceeded");
        assert_eq!(err.detail(), "disk quota exceeded");

        let conflict = CatalogError::VersionConflict {
            cube: "sales_cube".into(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(conflict.detail(), conflict.to_string());
    }

    #[test]
    fn not_found_is_not_retryable() {
        let err = CatalogError::NotFound {
            message: "cube missing".into(),
        };
        assert!(!err.is_retryable());
    }
}
