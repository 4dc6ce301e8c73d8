use async_trait::async_trait;
use tracing::{debug, instrument};

use majalis_notifier::{Delivery, Notification, Notifier, NotifyError};

use crate::backend::{EmailAttachment, EmailBackend, EmailMessage};
use crate::config::EmailConfig;
use crate::error::EmailError;
use crate::smtp::SmtpBackend;

/// [`Notifier`] that mails the certificate artifact to the attendee.
///
/// Message assembly lives here; transport is delegated to an
/// [`EmailBackend`], SMTP unless one is injected with
/// [`with_backend`](Self::with_backend).
pub struct EmailNotifier {
    from_address: String,
    backend: Box<dyn EmailBackend>,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("from_address", &self.from_address)
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl EmailNotifier {
    /// Create a notifier that sends over SMTP.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let backend = SmtpBackend::new(config.smtp_config())?;
        Ok(Self::with_backend(
            config.from_address.clone(),
            Box::new(backend),
        ))
    }

    /// Create a notifier over an arbitrary backend.
    pub fn with_backend(from_address: impl Into<String>, backend: Box<dyn EmailBackend>) -> Self {
        Self {
            from_address: from_address.into(),
            backend,
        }
    }

    /// Check that the backend is reachable.
    pub async fn health_check(&self) -> Result<(), EmailError> {
        self.backend.health_check().await
    }

    fn message_for(&self, notification: &Notification) -> EmailMessage {
        EmailMessage {
            from: self.from_address.clone(),
            to: notification.to.clone(),
            subject: notification.subject(),
            body: notification.text_body(),
            attachments: vec![EmailAttachment {
                filename: notification.attachment.filename.clone(),
                content_type: notification.attachment.content_type.clone(),
                data: notification.attachment.data.clone(),
            }],
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    #[instrument(
        skip_all,
        fields(
            certificate_id = %notification.certificate_id,
            backend = self.backend.backend_name()
        )
    )]
    async fn notify(&self, notification: &Notification) -> Result<Delivery, NotifyError> {
        let message = self.message_for(notification);
        debug!(
            attachment = %notification.attachment.filename,
            size = notification.attachment.data.len(),
            "dispatching certificate email"
        );
        let result = self.backend.send(&message).await?;
        Ok(Delivery {
            message_id: result.message_id,
            status: result.status,
        })
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use majalis_core::CertificateId;
    use majalis_notifier::Attachment;

    use super::*;
    use crate::backend::EmailResult;

    #[derive(Debug, Default)]
    struct MockBackend {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailBackend for MockBackend {
        async fn send(&self, message: &EmailMessage) -> Result<EmailResult, EmailError> {
            if self.fail {
                return Err(EmailError::Rejected("550 mailbox unavailable".into()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(EmailResult {
                message_id: Some("mock-1".into()),
                status: "sent".into(),
            })
        }

        async fn health_check(&self) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::Connection("connection refused".into()));
            }
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "mock"
        }
    }

    fn notification() -> Notification {
        let certificate_id = CertificateId::generate();
        Notification {
            to: "z@x.com".into(),
            attendee_name: "Zaid".into(),
            session_title: "Usul".into(),
            attachment: Attachment {
                filename: format!("{certificate_id}.pdf"),
                content_type: "application/pdf".into(),
                data: Bytes::from_static(b"%PDF-1.5"),
            },
            certificate_id,
        }
    }

    #[test]
    fn message_carries_attachment_and_subject() {
        let notifier = EmailNotifier::with_backend("a@b.com", Box::new(MockBackend::default()));
        let n = notification();
        let message = notifier.message_for(&n);
        assert_eq!(message.from, "a@b.com");
        assert_eq!(message.to, "z@x.com");
        assert_eq!(message.subject, "إجازة مجلس: Usul");
        assert!(message.body.contains("Zaid"));
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.attachments[0].filename, n.attachment.filename);
        assert_eq!(message.attachments[0].content_type, "application/pdf");
    }

    #[tokio::test]
    async fn notify_returns_backend_delivery() {
        let notifier = EmailNotifier::with_backend("a@b.com", Box::new(MockBackend::default()));
        let delivery = notifier.notify(&notification()).await.unwrap();
        assert_eq!(delivery.status, "sent");
        assert_eq!(delivery.message_id.as_deref(), Some("mock-1"));
        assert_eq!(notifier.name(), "email");
    }

    #[tokio::test]
    async fn backend_rejection_maps_to_notify_error() {
        let backend = MockBackend {
            fail: true,
            ..MockBackend::default()
        };
        let notifier = EmailNotifier::with_backend("a@b.com", Box::new(backend));
        let err = notifier.notify(&notification()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn health_check_reports_backend_state() {
        let healthy = EmailNotifier::with_backend("a@b.com", Box::new(MockBackend::default()));
        assert!(healthy.health_check().await.is_ok());

        let down = MockBackend {
            fail: true,
            ..MockBackend::default()
        };
        let notifier = EmailNotifier::with_backend("a@b.com", Box::new(down));
        let err = notifier.health_check().await.unwrap_err();
        assert!(matches!(err, EmailError::Connection(_)));
    }

    #[tokio::test]
    async fn new_builds_smtp_backend() {
        let config = EmailConfig::new("localhost", "no-reply@majalis.com").with_tls(false);
        let notifier = EmailNotifier::new(&config).unwrap();
        assert!(format!("{notifier:?}").contains("smtp"));
    }
}
