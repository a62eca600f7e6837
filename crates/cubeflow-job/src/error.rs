//! Error types for job steps.
//!
//! A step's reportable outcomes (succeeded, failed, error) are values of
//! [`ExecuteResult`](crate::execution::ExecuteResult), not errors. An
//! [`Error`] returned from a step means the invocation itself is broken and
//! is propagated to the driver as is.

/// The result type used throughout cubeflow-job.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in job step operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A step was invoked before its inputs existed.
    ///
    /// Signals a defect in invocation order, never a property of the data.
    #[error("precondition violated: {message}")]
    PreconditionViolation {
        /// Description of the violated precondition.
        message: String,
    },

    /// An invalid step state transition was attempted.
    #[error("invalid state transition: {from} -> {to} ({reason})")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
        /// The reason the transition is invalid.
        reason: String,
    },

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

}

impl Error {
    /// Creates a new precondition violation.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            message: message.into(),
        }
    }

    /// Creates a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }
}
