use thiserror::Error;

/// Core error types for Reflab operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid document id: {0}")]
    InvalidId(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Resource not found: {resource}/{id}")]
    NotFound { resource: String, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid document data: {message}")]
    InvalidDocument { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }

    /// Create a new NotFound error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a new Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new InvalidTransition error
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new InvalidDocument error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidId(_)
                | Self::InvalidRole(_)
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::InvalidTransition { .. }
                | Self::InvalidDocument { .. }
                | Self::JsonError(_)
        )
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
