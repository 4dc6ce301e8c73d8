use majalis_notifier::NotifyError;
use thiserror::Error;

/// Errors raised by email backends.
#[derive(Debug, Error)]
pub enum EmailError {
    /// The backend or sender address is misconfigured.
    #[error("email configuration error: {0}")]
    Configuration(String),

    /// A recipient or reply address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The message could not be assembled.
    #[error("failed to build email: {0}")]
    Build(String),

    /// The server could not be reached or failed transiently.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server permanently refused the message.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<EmailError> for NotifyError {
    fn from(e: EmailError) -> Self {
        match e {
            EmailError::Configuration(msg) | EmailError::Build(msg) => Self::Configuration(msg),
            EmailError::InvalidAddress(msg) => Self::InvalidAddress(msg),
            EmailError::Connection(msg) => Self::Connection(msg),
            EmailError::Rejected(msg) => Self::Rejected(msg),
        }
    }
}
