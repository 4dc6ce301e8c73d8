use serde::{Deserialize, Serialize};

/// Sender used when none is configured.
pub const DEFAULT_FROM_ADDRESS: &str = "\"Majalis Ijazah\" <no-reply@majalis.com>";

/// SMTP-specific configuration settings.
///
/// Holds all settings needed to establish a connection to an SMTP server.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub smtp_host: String,

    /// SMTP server port. Defaults to 587 (STARTTLS submission port).
    pub smtp_port: u16,

    /// Optional SMTP username for authentication.
    pub username: Option<String>,

    /// Optional SMTP password for authentication.
    pub password: Option<String>,

    /// Whether to use TLS for the SMTP connection. Defaults to `true`.
    pub tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("tls", &self.tls)
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_owned(),
            smtp_port: 587,
            username: None,
            password: None,
            tls: true,
        }
    }
}

/// Email delivery configuration, the `[email]` section of `majalis.toml`.
///
/// With `enabled = false` (the default) no mail is sent and notifications
/// are only logged.
///
/// # Examples
///
/// ```
/// use majalis_email::EmailConfig;
///
/// let config = EmailConfig::new("smtp.example.com", "noreply@example.com");
/// assert!(config.enabled);
/// assert_eq!(config.smtp_port, 587);
/// assert!(config.tls);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether to send real email.
    #[serde(default)]
    pub enabled: bool,

    /// The `From` mailbox used in outgoing emails.
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// SMTP server hostname.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP server port. Defaults to 587.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Optional SMTP username for authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional SMTP password for authentication.
    #[serde(default)]
    pub password: Option<String>,

    /// Whether to use TLS for SMTP. Defaults to `true`.
    #[serde(default = "default_tls")]
    pub tls: bool,
}

fn default_from_address() -> String {
    DEFAULT_FROM_ADDRESS.to_owned()
}

fn default_smtp_host() -> String {
    "localhost".to_owned()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_tls() -> bool {
    true
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("from_address", &self.from_address)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("tls", &self.tls)
            .finish()
    }
}

impl EmailConfig {
    /// Create an enabled SMTP config with the given host and sender.
    pub fn new(smtp_host: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            enabled: true,
            from_address: from_address.into(),
            smtp_host: smtp_host.into(),
            ..Self::default()
        }
    }

    /// Set SMTP authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Override the default SMTP port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }

    /// Set whether TLS should be used for SMTP.
    #[must_use]
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Extract the SMTP-specific config.
    pub fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            username: self.username.clone(),
            password: self.password.clone(),
            tls: self.tls,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from_address: default_from_address(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            tls: default_tls(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_disabled() {
        let config = EmailConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 587);
        assert!(config.tls);
        assert!(config.username.is_none());
        assert_eq!(config.from_address, DEFAULT_FROM_ADDRESS);
    }

    #[test]
    fn new_config_is_enabled() {
        let config = EmailConfig::new("smtp.gmail.com", "me@gmail.com");
        assert!(config.enabled);
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.from_address, "me@gmail.com");
    }

    #[test]
    fn smtp_config_extraction() {
        let config = EmailConfig::new("smtp.example.com", "sender@example.com")
            .with_credentials("user", "pass")
            .with_port(465)
            .with_tls(false);

        let smtp = config.smtp_config();
        assert_eq!(smtp.smtp_host, "smtp.example.com");
        assert_eq!(smtp.smtp_port, 465);
        assert_eq!(smtp.username.as_deref(), Some("user"));
        assert!(!smtp.tls);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: EmailConfig = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.from_address, DEFAULT_FROM_ADDRESS);
        assert_eq!(config.smtp_port, 587);
        assert!(config.tls);
    }

    #[test]
    fn debug_redacts_password() {
        let config = EmailConfig::new("smtp.example.com", "test@example.com")
            .with_credentials("user", "test-pw-placeholder");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"), "password must be redacted");
        assert!(
            !debug.contains("test-pw-placeholder"),
            "password must not appear in debug output"
        );
        assert!(debug.contains("smtp.example.com"));

        let smtp_debug = format!("{:?}", config.smtp_config());
        assert!(!smtp_debug.contains("test-pw-placeholder"));
    }
}
