use majalis_core::SessionId;
use thiserror::Error;

/// Errors that fail a whole issuance request.
///
/// Failures of a single attendee are reported in that attendee's
/// [`AttendeeOutcome`](majalis_core::AttendeeOutcome) instead.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The caller may not issue certificates for this session.
    #[error("not authorized to issue certificates for session {0}")]
    Unauthorized(SessionId),

    /// The session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The certificate store failed outside of a single attendee's work.
    #[error("store error: {0}")]
    Store(#[from] majalis_store::StoreError),

    /// The issuer was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}
