use async_trait::async_trait;
use tracing::info;

use crate::error::NotifyError;
use crate::notification::Notification;
use crate::notifier::{Delivery, Notifier};

/// [`Notifier`] that only logs what it would have sent.
///
/// Used when email delivery is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<Delivery, NotifyError> {
        info!(
            to = %notification.to,
            subject = %notification.subject(),
            certificate_id = %notification.certificate_id,
            attachment = %notification.attachment.filename,
            bytes = notification.attachment.data.len(),
            "email delivery disabled, notification logged"
        );
        Ok(Delivery {
            message_id: None,
            status: "logged".to_owned(),
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
