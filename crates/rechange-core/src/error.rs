//! Error types for the change tree

use thiserror::Error;

/// Result type for change operations
pub type Result<T> = std::result::Result<T, ChangeError>;

/// Result type for model and document collaborators
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors raised while performing, undoing or configuring changes
#[derive(Debug, Error)]
pub enum ChangeError {
    /// Target missing, read-only or otherwise unsuitable; nothing was mutated
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The underlying entity store rejected the mutation
    #[error("Model access failed: {0}")]
    ModelAccess(#[from] ModelError),

    /// The caller's cancellation signal was observed
    #[error("Operation cancelled")]
    Cancelled,

    /// The change has already gone through its perform lifecycle
    #[error("Change already performed: {0}")]
    AlreadyPerformed(String),

    /// No more undos available
    #[error("No more undos available")]
    NoMoreUndos,

    /// No more redos available
    #[error("No more redos available")]
    NoMoreRedos,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ChangeError {
    /// Create a new Precondition error with context
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a new Config error with context
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the caller cancelling the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors reported by the model and document collaborators
#[derive(Debug, Error)]
pub enum ModelError {
    /// Element does not exist
    #[error("Element not found: {0}")]
    NotFound(String),

    /// Element is read-only
    #[error("Element is read-only: {0}")]
    ReadOnly(String),

    /// Element already exists at the destination
    #[error("Element already exists: {0}")]
    AlreadyExists(String),

    /// Container still has children
    #[error("Element is not empty: {0}")]
    NotEmpty(String),

    /// Document is not connected
    #[error("Document not connected: {0}")]
    NotConnected(String),

    /// Text edit does not apply to the document
    #[error("Invalid text edit: {0}")]
    InvalidEdit(String),

    /// IO error from a file-backed model
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_converts_to_model_access() {
        let err: ChangeError = ModelError::NotFound("p/A.java".to_string()).into();
        assert!(matches!(err, ChangeError::ModelAccess(ModelError::NotFound(_))));
        assert_eq!(
            err.to_string(),
            "Model access failed: Element not found: p/A.java"
        );
    }

    #[test]
    fn test_is_cancelled() {
        assert!(ChangeError::Cancelled.is_cancelled());
        assert!(!ChangeError::precondition("read-only").is_cancelled());
    }
}
