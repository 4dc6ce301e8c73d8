pub mod backend;
pub mod config;
pub mod error;
pub mod notifier;
pub mod smtp;

pub use config::{EmailConfig, SmtpConfig};
pub use error::EmailError;
pub use notifier::EmailNotifier;
pub use smtp::SmtpBackend;

// Re-export backend trait for external use.
pub use backend::{EmailAttachment, EmailBackend, EmailMessage, EmailResult};
