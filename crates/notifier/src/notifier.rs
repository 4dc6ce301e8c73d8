use async_trait::async_trait;

use crate::error::NotifyError;
use crate::notification::Notification;

/// Result of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Transport-assigned message identifier, if any.
    pub message_id: Option<String>,
    /// Human-readable status (e.g. `"sent"`, `"logged"`).
    pub status: String,
}

/// Best-effort transport for certificate notifications.
///
/// Implementations make a single attempt. Retrying is left to whoever
/// re-runs the batch.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    async fn notify(&self, notification: &Notification) -> Result<Delivery, NotifyError>;

    /// Short transport name for logs (e.g. `"smtp"`, `"log"`).
    fn name(&self) -> &'static str;
}
