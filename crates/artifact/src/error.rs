use thiserror::Error;

/// Errors that can occur while reading or writing artifacts and templates.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The requested artifact or template does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The name would escape the storage directory or is otherwise unusable.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A storage backend error occurred.
    #[error("artifact storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for ArtifactError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
