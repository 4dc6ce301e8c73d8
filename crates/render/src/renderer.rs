use majalis_core::{ArtifactFormat, CertificateFacts};

use crate::error::RenderError;

/// Turns the facts of one certificate into artifact bytes.
///
/// Rendering is CPU-bound and synchronous; callers on an async runtime
/// should run it on a blocking thread.
pub trait CertificateRenderer: Send + Sync {
    /// The artifact format this renderer produces.
    fn format(&self) -> ArtifactFormat;

    /// Render one certificate.
    fn render(&self, facts: &CertificateFacts) -> Result<Vec<u8>, RenderError>;
}
