use thiserror::Error;

/// Errors that can occur while rendering one certificate.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The payload could not be encoded as a QR code.
    #[error("QR encoding failed: {0}")]
    Qr(String),

    /// The configured font could not be loaded or parsed.
    #[error("font error: {0}")]
    Font(String),

    /// The PDF document could not be assembled.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The template is malformed or uses unsupported constructs.
    #[error("template error: {0}")]
    Template(String),
}

impl From<lopdf::Error> for RenderError {
    fn from(e: lopdf::Error) -> Self {
        Self::Pdf(e.to_string())
    }
}

impl From<zip::result::ZipError> for RenderError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Template(e.to_string())
    }
}
