use std::time::Duration;

/// Configuration for the [`Issuer`](crate::Issuer).
///
/// # Examples
///
/// ```
/// use majalis_issuer::IssuerConfig;
///
/// let config = IssuerConfig::default();
/// assert_eq!(config.base_url, "http://localhost:3000");
/// assert_eq!(config.max_concurrent, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    /// Public origin the verification links in QR codes point at.
    pub base_url: String,
    /// Maximum number of attendees processed at once within one batch.
    pub max_concurrent: usize,
    /// Upper bound on a single notifier call.
    pub notify_timeout: Duration,
    /// Render again when an artifact already exists for the certificate.
    /// When false the stored artifact is reused as is.
    pub rerender_existing: bool,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_owned(),
            max_concurrent: 4,
            notify_timeout: Duration::from_secs(30),
            rerender_existing: true,
        }
    }
}
