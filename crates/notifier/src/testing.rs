//! Notifiers for tests: one that records every call and can be told to
//! fail for chosen recipients.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::notification::Notification;
use crate::notifier::{Delivery, Notifier};

/// A delivery as seen by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDelivery {
    pub to: String,
    pub subject: String,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
}

/// [`Notifier`] that records every attempt.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    attempts: Mutex<Vec<RecordedDelivery>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every delivery to `address` with a connection error.
    #[must_use]
    pub fn failing_for(mut self, address: impl Into<String>) -> Self {
        self.failing.insert(address.into());
        self
    }

    /// Sleep this long before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every attempt so far, failed ones included.
    pub fn attempts(&self) -> Vec<RecordedDelivery> {
        self.attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<Delivery, NotifyError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(RecordedDelivery {
                to: notification.to.clone(),
                subject: notification.subject(),
                filename: notification.attachment.filename.clone(),
                content_type: notification.attachment.content_type.clone(),
                size: notification.attachment.data.len(),
            });
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&notification.to) {
            return Err(NotifyError::Connection(format!(
                "simulated failure for {}",
                notification.to
            )));
        }
        Ok(Delivery {
            message_id: Some(format!("recorded-{}", notification.certificate_id)),
            status: "sent".to_owned(),
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
