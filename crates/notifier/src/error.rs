use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while delivering a certificate.
///
/// None of these fail a batch; they are recorded on the attendee's outcome.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The recipient address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The transport is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The transport could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The transport refused the message.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    /// Delivery did not finish in time.
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}
