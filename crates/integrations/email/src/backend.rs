use async_trait::async_trait;
use bytes::Bytes;

use crate::error::EmailError;

/// A file attached to an [`EmailMessage`].
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    /// MIME type, e.g. `"application/pdf"`.
    pub content_type: String,
    pub data: Bytes,
}

/// A unified email message representation shared across all backends.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Sender mailbox, e.g. `"Majalis Ijazah" <no-reply@majalis.com>`.
    pub from: String,
    /// Recipient email address.
    pub to: String,
    /// Email subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    pub attachments: Vec<EmailAttachment>,
}

/// Result of a successful email send operation.
#[derive(Debug, Clone)]
pub struct EmailResult {
    /// Provider-assigned message identifier (if available).
    pub message_id: Option<String>,
    /// Human-readable status (e.g. `"sent"`, `"queued"`).
    pub status: String,
}

/// Trait for pluggable email delivery backends.
///
/// Implementations handle the actual transport of email messages while
/// [`EmailNotifier`](crate::notifier::EmailNotifier) turns certificate
/// notifications into messages.
#[async_trait]
pub trait EmailBackend: Send + Sync + std::fmt::Debug {
    /// Send an email message through this backend.
    async fn send(&self, message: &EmailMessage) -> Result<EmailResult, EmailError>;

    /// Perform a health check to verify the backend is operational.
    async fn health_check(&self) -> Result<(), EmailError>;

    /// Return the backend name (e.g. `"smtp"`).
    fn backend_name(&self) -> &'static str;
}
