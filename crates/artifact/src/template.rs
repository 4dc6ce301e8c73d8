use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ArtifactError;

/// Source of uploaded certificate templates.
///
/// `reference` is the value stored on the session record.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Load a template's bytes.
    ///
    /// Returns [`ArtifactError::NotFound`] if nothing is stored under
    /// `reference`.
    async fn load(&self, reference: &str) -> Result<Bytes, ArtifactError>;
}
