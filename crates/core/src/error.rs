use thiserror::Error;

/// Errors raised while parsing identifiers and enumerations from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("certificate id must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("certificate id must be lowercase hex: {0}")]
    InvalidCharacter(String),

    #[error("unknown artifact format: {0}")]
    UnknownFormat(String),
}
