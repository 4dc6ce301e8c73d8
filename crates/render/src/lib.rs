//! Certificate renderers.
//!
//! Two [`CertificateRenderer`] variants exist. [`ComposedRenderer`] draws a
//! landscape PDF from scratch with a verification QR code.
//! [`TemplatedRenderer`] fills placeholders in an uploaded DOCX template and
//! carries no QR code.

pub mod docx;
pub mod error;
pub mod labels;
pub mod pdf;
pub mod qr;
pub mod renderer;

pub use docx::{
    TemplatedRenderer, document_text, fill_template, paragraph_texts, sample_template, substitutions,
};
pub use error::RenderError;
pub use labels::CertificateLabels;
pub use pdf::{ComposedRenderer, FontSource};
pub use qr::QrMatrix;
pub use renderer::CertificateRenderer;
