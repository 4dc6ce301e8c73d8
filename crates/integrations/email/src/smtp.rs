use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info};

use crate::backend::{EmailBackend, EmailMessage, EmailResult};
use crate::config::SmtpConfig;
use crate::error::EmailError;

/// SMTP email delivery backend using `lettre`.
pub struct SmtpBackend {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpBackend")
            .field("config", &self.config)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpBackend {
    /// Create a new `SmtpBackend` from the given SMTP configuration.
    pub fn new(config: SmtpConfig) -> Result<Self, EmailError> {
        let transport = build_transport(&config)?;
        Ok(Self { config, transport })
    }

    /// Create a `SmtpBackend` with a pre-built transport (for testing).
    pub fn with_transport(
        config: SmtpConfig,
        transport: AsyncSmtpTransport<Tokio1Executor>,
    ) -> Self {
        Self { config, transport }
    }
}

#[async_trait]
impl EmailBackend for SmtpBackend {
    async fn send(&self, message: &EmailMessage) -> Result<EmailResult, EmailError> {
        debug!(to = %message.to, subject = %message.subject, "building SMTP message");
        let lettre_message = build_message(message)?;

        info!(to = %message.to, subject = %message.subject, "sending email via SMTP");
        let response = self.transport.send(lettre_message).await.map_err(|e| {
            error!(error = %e, "SMTP send failed");
            map_smtp_error(&e)
        })?;

        info!(to = %message.to, "email sent successfully via SMTP");
        Ok(EmailResult {
            message_id: response.message().next().map(str::to_owned),
            status: "sent".to_owned(),
        })
    }

    async fn health_check(&self) -> Result<(), EmailError> {
        debug!("performing SMTP health check");
        let connected = self.transport.test_connection().await.map_err(|e| {
            error!(error = %e, "SMTP health check failed");
            EmailError::Connection(format!("SMTP health check failed: {e}"))
        })?;
        if !connected {
            error!("SMTP server refused the health check");
            return Err(EmailError::Connection(
                "SMTP health check failed: server did not respond to NOOP".into(),
            ));
        }
        info!("SMTP health check passed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "smtp"
    }
}

/// Build a `lettre::Message` from the unified [`EmailMessage`].
///
/// Messages without attachments are sent as plain text; otherwise as
/// `multipart/mixed` with the text first.
fn build_message(msg: &EmailMessage) -> Result<Message, EmailError> {
    let from_mailbox: Mailbox = msg
        .from
        .parse()
        .map_err(|e| EmailError::Configuration(format!("invalid from address: {e}")))?;

    let to_mailbox: Mailbox = msg
        .to
        .parse()
        .map_err(|e| EmailError::InvalidAddress(format!("invalid recipient address: {e}")))?;

    let builder = Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(&msg.subject);

    if msg.attachments.is_empty() {
        return builder
            .header(ContentType::TEXT_PLAIN)
            .body(msg.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()));
    }

    let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(msg.body.clone()));
    for attachment in &msg.attachments {
        let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
            EmailError::Build(format!(
                "invalid content type {}: {e}",
                attachment.content_type
            ))
        })?;
        multipart = multipart.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.data.to_vec(), content_type),
        );
    }

    builder
        .multipart(multipart)
        .map_err(|e| EmailError::Build(e.to_string()))
}

/// Build an async SMTP transport from the given configuration.
fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    let builder = if config.tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::Configuration(format!("SMTP TLS relay error: {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
    };

    let builder = builder.port(config.smtp_port);

    let builder = if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder.credentials(Credentials::new(user.clone(), pass.clone()))
    } else {
        builder
    };

    Ok(builder.build())
}

/// Map a lettre SMTP error to the appropriate [`EmailError`] variant.
fn map_smtp_error(error: &lettre::transport::smtp::Error) -> EmailError {
    let message = error.to_string();

    if error.is_transient() {
        EmailError::Connection(format!("transient SMTP error: {message}"))
    } else if error.is_permanent() {
        EmailError::Rejected(format!("permanent SMTP error: {message}"))
    } else {
        EmailError::Connection(format!("SMTP error: {message}"))
    }
}
