use std::sync::Arc;

use majalis_artifact::{ArtifactStore, MemoryTemplateSource, TemplateSource};
use majalis_core::ArtifactFormat;
use majalis_notifier::{LogNotifier, Notifier};
use majalis_render::{CertificateRenderer, ComposedRenderer};
use majalis_store::CertificateStore;

use crate::allocator::Allocator;
use crate::config::IssuerConfig;
use crate::error::IssueError;
use crate::orchestrator::Issuer;
use crate::verification::Verifier;

/// Fluent builder for constructing an [`Issuer`].
///
/// A [`CertificateStore`] and an [`ArtifactStore`] must be supplied. The
/// rest default to: no templates, the composed renderer with built-in
/// labels and font, a [`LogNotifier`], and [`IssuerConfig::default`].
#[derive(Default)]
pub struct IssuerBuilder {
    store: Option<Arc<dyn CertificateStore>>,
    artifacts: Option<Arc<dyn ArtifactStore>>,
    templates: Option<Arc<dyn TemplateSource>>,
    composed: Option<Arc<dyn CertificateRenderer>>,
    notifier: Option<Arc<dyn Notifier>>,
    config: IssuerConfig,
}

impl IssuerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the certificate store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CertificateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set where rendered artifacts are written.
    #[must_use]
    pub fn artifacts(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Set where session templates are loaded from.
    #[must_use]
    pub fn templates(mut self, templates: Arc<dyn TemplateSource>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Set the renderer for sessions without a template. It must produce
    /// [`ArtifactFormat::ComposedPdf`].
    #[must_use]
    pub fn composed_renderer(mut self, renderer: Arc<dyn CertificateRenderer>) -> Self {
        self.composed = Some(renderer);
        self
    }

    /// Set the notification transport.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn config(mut self, config: IssuerConfig) -> Self {
        self.config = config;
        self
    }

    /// Consume the builder and produce an [`Issuer`].
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::Configuration`] if a required component is
    /// missing or the configuration is unusable.
    pub fn build(self) -> Result<Issuer, IssueError> {
        let store = self
            .store
            .ok_or_else(|| IssueError::Configuration("certificate store is required".into()))?;

        let artifacts = self
            .artifacts
            .ok_or_else(|| IssueError::Configuration("artifact store is required".into()))?;

        if self.config.max_concurrent == 0 {
            return Err(IssueError::Configuration(
                "max_concurrent must be at least 1".into(),
            ));
        }
        if self.config.base_url.trim().is_empty() {
            return Err(IssueError::Configuration("base_url must not be empty".into()));
        }

        let composed = self
            .composed
            .unwrap_or_else(|| Arc::new(ComposedRenderer::default()));
        if composed.format() != ArtifactFormat::ComposedPdf {
            return Err(IssueError::Configuration(format!(
                "composed renderer produces {}, expected {}",
                composed.format(),
                ArtifactFormat::ComposedPdf
            )));
        }

        Ok(Issuer {
            allocator: Allocator::new(Arc::clone(&store)),
            verifier: Verifier::new(Arc::clone(&store)),
            store,
            artifacts,
            templates: self
                .templates
                .unwrap_or_else(|| Arc::new(MemoryTemplateSource::new())),
            composed,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use majalis_artifact::MemoryArtifactStore;
    use majalis_render::TemplatedRenderer;
    use majalis_store_memory::MemoryCertificateStore;

    use super::*;

    fn base() -> IssuerBuilder {
        IssuerBuilder::new()
            .store(Arc::new(MemoryCertificateStore::new()))
            .artifacts(Arc::new(MemoryArtifactStore::new()))
    }

    #[test]
    fn builds_with_defaults() {
        let issuer = base().build().unwrap();
        assert_eq!(issuer.config(), &IssuerConfig::default());
        assert!(format!("{issuer:?}").contains("log"));
    }

    #[test]
    fn store_is_required() {
        let err = IssuerBuilder::new()
            .artifacts(Arc::new(MemoryArtifactStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, IssueError::Configuration(_)));
    }

    #[test]
    fn artifacts_are_required() {
        let err = IssuerBuilder::new()
            .store(Arc::new(MemoryCertificateStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, IssueError::Configuration(_)));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = IssuerConfig {
            max_concurrent: 0,
            ..IssuerConfig::default()
        };
        assert!(base().config(config).build().is_err());
    }

    #[test]
    fn composed_renderer_must_produce_pdf() {
        let err = base()
            .composed_renderer(Arc::new(TemplatedRenderer::new(Vec::new())))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("templated_document"));
    }
}
