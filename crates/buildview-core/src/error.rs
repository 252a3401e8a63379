//! Error types for the build view.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all build view operations.
///
/// Variants fall into two classes. Internal invariant violations (see
/// [`ViewError::is_defect`]) can only arise from an inconsistent tree/index
/// pair, never from well-formed external input. Everything else describes
/// bad input handed to the view.
#[derive(Error, Debug)]
pub enum ViewError {
    /// No step with this identifier was indexed when the tree was built
    #[error("Step '{id}' is not part of this build plan")]
    UnknownStep { id: String },
    /// A focus step was applied to a node of the wrong kind
    #[error("Cannot focus {lens} on a {node} node")]
    FocusMismatch { lens: String, node: &'static str },
    /// A retry tab was selected that has no matching attempt
    #[error("Retry '{id}' has {attempts} attempts, tab {tab} does not exist")]
    NoSuchAttempt {
        id: String,
        tab: usize,
        attempts: usize,
    },
    /// Identifier resolved to a composite node where a leaf step was expected
    #[error("Node '{id}' is a {node}, not a step")]
    NotAStep { id: String, node: &'static str },
    /// Identifier resolved to something other than a retry node
    #[error("Node '{id}' is a {node}, not a retry")]
    NotARetry { id: String, node: &'static str },
    /// The same identifier appears more than once in a build plan
    #[error("Duplicate step identifier '{id}' in build plan")]
    DuplicateStepId { id: String },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> ViewError {
        ViewError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl ViewError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Returns true for internal invariant violations.
    ///
    /// The identifier space and the tree shape are closed once a
    /// [`crate::Model`] is built, so these errors point at a defect in the
    /// caller or the builder. Callers should report them and stop using the
    /// model rather than carry on.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            ViewError::UnknownStep { .. }
                | ViewError::FocusMismatch { .. }
                | ViewError::NoSuchAttempt { .. }
                | ViewError::NotAStep { .. }
                | ViewError::NotARetry { .. }
        )
    }
}

/// Result type alias for build view operations
pub type Result<T> = std::result::Result<T, ViewError>;
