use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use majalis_artifact::{ArtifactError, ArtifactStore, TemplateSource};
use majalis_core::{
    ArtifactFormat, Attendee, AttendeeOutcome, BatchReport, Certificate, CertificateFacts,
    OutcomeStatus, Session, SessionId, Verification, artifact_name,
};
use majalis_notifier::{Attachment, Notification, Notifier, NotifyError};
use majalis_render::{CertificateRenderer, RenderError, TemplatedRenderer};
use majalis_store::CertificateStore;

use crate::allocator::Allocator;
use crate::builder::IssuerBuilder;
use crate::config::IssuerConfig;
use crate::error::IssueError;
use crate::verification::Verifier;

/// Whether the caller may issue certificates for a session.
///
/// Ownership is decided by the caller's own access layer; the issuer only
/// honours the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

impl From<bool> for Authorization {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Granted } else { Self::Denied }
    }
}

/// Why one attendee ended up without an artifact.
#[derive(Debug, Error)]
enum ArtifactFailure {
    #[error("template unavailable: {0}")]
    Template(String),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("render task failed: {0}")]
    Task(String),

    #[error("artifact storage failed: {0}")]
    Storage(#[from] ArtifactError),
}

/// The templated renderer for one batch.
enum TemplateState {
    /// The session has no template.
    Absent,
    Loaded(Arc<dyn CertificateRenderer>),
    /// The session names a template that could not be loaded.
    Unavailable(String),
}

/// Issues certificates for whole session rosters.
///
/// Each attendee goes through allocate, render and notify in that order.
/// Attendees are independent: up to
/// [`IssuerConfig::max_concurrent`] are processed at once and a failure
/// is recorded in that attendee's outcome without stopping the batch.
pub struct Issuer {
    pub(crate) store: Arc<dyn CertificateStore>,
    pub(crate) allocator: Allocator,
    pub(crate) verifier: Verifier,
    pub(crate) artifacts: Arc<dyn ArtifactStore>,
    pub(crate) templates: Arc<dyn TemplateSource>,
    pub(crate) composed: Arc<dyn CertificateRenderer>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) config: IssuerConfig,
}

impl std::fmt::Debug for Issuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Issuer")
            .field("notifier", &self.notifier.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Issuer {
    /// Start building an issuer.
    pub fn builder() -> IssuerBuilder {
        IssuerBuilder::new()
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// Public verification lookup. See [`Verifier::verify`].
    pub async fn verify(&self, certificate_id: &str) -> Result<Verification, IssueError> {
        self.verifier.verify(certificate_id).await
    }

    /// Issue certificates to every attendee of a session.
    ///
    /// Authorization is checked before anything is read or written. Only a
    /// denied caller, an unknown session or a store failure while loading
    /// the roster fail the call; everything after that is reported per
    /// attendee in the returned [`BatchReport`].
    #[instrument(skip_all, fields(session_id = %session_id, ?authorization))]
    pub async fn issue_session(
        &self,
        session_id: &SessionId,
        authorization: Authorization,
    ) -> Result<BatchReport, IssueError> {
        if authorization == Authorization::Denied {
            warn!("certificate issuance refused: caller is not authorized");
            return Err(IssueError::Unauthorized(session_id.clone()));
        }

        let roster = self
            .store
            .find_session_with_attendees(session_id)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load session roster");
                IssueError::from(e)
            })?
            .ok_or_else(|| IssueError::SessionNotFound(session_id.clone()))?;

        Ok(self.issue_all(&roster.session, &roster.attendees).await)
    }

    /// Issue certificates to the given attendees of `session`.
    ///
    /// Returns once every attendee has been processed, with outcomes in
    /// the order of `attendees`.
    pub async fn issue_all(&self, session: &Session, attendees: &[Attendee]) -> BatchReport {
        info!(
            session_id = %session.id,
            attendees = attendees.len(),
            templated = session.has_template(),
            "issuing certificates"
        );

        let templated = self.load_template(session).await;
        let templated = &templated;
        let concurrency = self.config.max_concurrent.max(1);

        let mut outcomes: Vec<(usize, AttendeeOutcome)> = stream::iter(attendees.iter().enumerate())
            .map(move |(index, attendee)| async move {
                (index, self.issue_attendee(session, attendee, templated).await)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let report = BatchReport {
            session_id: session.id.clone(),
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        };
        info!(
            session_id = %session.id,
            issued = report.issued(),
            failed = report.failed(),
            notify_failures = report.notify_failures(),
            minted = report.minted(),
            "certificate batch finished"
        );
        report
    }

    async fn load_template(&self, session: &Session) -> TemplateState {
        let Some(reference) = session.template.as_deref().filter(|t| !t.is_empty()) else {
            return TemplateState::Absent;
        };
        match self.templates.load(reference).await {
            Ok(bytes) => {
                debug!(template = reference, bytes = bytes.len(), "template loaded");
                TemplateState::Loaded(Arc::new(TemplatedRenderer::new(bytes.to_vec())))
            }
            Err(e) => {
                warn!(template = reference, error = %e, "session template could not be loaded");
                TemplateState::Unavailable(format!("{reference}: {e}"))
            }
        }
    }

    #[instrument(skip_all, fields(attendee_id = %attendee.id))]
    async fn issue_attendee(
        &self,
        session: &Session,
        attendee: &Attendee,
        templated: &TemplateState,
    ) -> AttendeeOutcome {
        let mut outcome = AttendeeOutcome {
            attendee_id: attendee.id.clone(),
            attendee_name: attendee.name.clone(),
            certificate_id: None,
            artifact: None,
            minted: false,
            status: OutcomeStatus::Issued { notified: false },
        };

        let allocation = match self
            .allocator
            .allocate(&session.id, &attendee.id, ArtifactFormat::for_session(session))
            .await
        {
            Ok(allocation) => allocation,
            Err(e) => {
                warn!(error = %e, "certificate allocation failed");
                outcome.status = OutcomeStatus::AllocationFailed {
                    error: e.to_string(),
                };
                return outcome;
            }
        };
        let certificate = allocation.certificate;
        outcome.certificate_id = Some(certificate.id.clone());
        outcome.minted = allocation.minted;

        let name = artifact_name(&certificate.id, certificate.format);
        let address = attendee.contact_address();
        let data = match self
            .produce_artifact(
                session,
                attendee,
                &certificate,
                &name,
                templated,
                address.is_some(),
            )
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(certificate_id = %certificate.id, error = %e, "certificate rendering failed");
                outcome.status = OutcomeStatus::RenderFailed {
                    error: e.to_string(),
                };
                return outcome;
            }
        };
        info!(
            certificate_id = %certificate.id,
            format = %certificate.format,
            artifact = %name,
            "certificate issued"
        );
        outcome.artifact = Some(name.clone());

        let (Some(address), Some(data)) = (address, data) else {
            debug!("attendee has no address, notification skipped");
            return outcome;
        };
        outcome.status = match self
            .notify(address, session, attendee, &certificate, name, data)
            .await
        {
            Ok(()) => OutcomeStatus::Issued { notified: true },
            Err(e) => {
                warn!(certificate_id = %certificate.id, error = %e, "certificate notification failed");
                OutcomeStatus::IssuedNotifyFailed {
                    error: e.to_string(),
                }
            }
        };
        outcome
    }

    /// Render the certificate and store it under `name`.
    ///
    /// Returns the stored bytes, or `None` when re-rendering is off, the
    /// artifact is already stored and `want_bytes` is false. With
    /// `want_bytes` set the bytes are always returned.
    async fn produce_artifact(
        &self,
        session: &Session,
        attendee: &Attendee,
        certificate: &Certificate,
        name: &str,
        templated: &TemplateState,
        want_bytes: bool,
    ) -> Result<Option<Bytes>, ArtifactFailure> {
        if !self.config.rerender_existing && self.artifacts.exists(name).await? {
            if !want_bytes {
                debug!(artifact = name, "stored artifact kept");
                return Ok(None);
            }
            if let Some(existing) = self.artifacts.get(name).await? {
                debug!(artifact = name, "reusing stored artifact");
                return Ok(Some(existing));
            }
        }

        let renderer = self.renderer_for(certificate.format, templated)?;
        let facts = CertificateFacts::new(
            certificate.id.clone(),
            session,
            attendee,
            &self.config.base_url,
        );
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&facts))
            .await
            .map_err(|e| ArtifactFailure::Task(e.to_string()))??;

        let data = Bytes::from(rendered);
        let location = self.artifacts.put(name, data.clone()).await?;
        debug!(%location, bytes = data.len(), "artifact stored");
        Ok(Some(data))
    }

    fn renderer_for(
        &self,
        format: ArtifactFormat,
        templated: &TemplateState,
    ) -> Result<Arc<dyn CertificateRenderer>, ArtifactFailure> {
        match (format, templated) {
            (ArtifactFormat::ComposedPdf, _) => Ok(Arc::clone(&self.composed)),
            (ArtifactFormat::TemplatedDocument, TemplateState::Loaded(renderer)) => {
                Ok(Arc::clone(renderer))
            }
            (ArtifactFormat::TemplatedDocument, TemplateState::Unavailable(reason)) => {
                Err(ArtifactFailure::Template(reason.clone()))
            }
            (ArtifactFormat::TemplatedDocument, TemplateState::Absent) => {
                Err(ArtifactFailure::Template(
                    "certificate was issued from a template but the session has none".to_owned(),
                ))
            }
        }
    }

    async fn notify(
        &self,
        address: &str,
        session: &Session,
        attendee: &Attendee,
        certificate: &Certificate,
        filename: String,
        data: Bytes,
    ) -> Result<(), NotifyError> {
        let notification = Notification {
            to: address.to_owned(),
            attendee_name: attendee.name.clone(),
            session_title: session.title.clone(),
            certificate_id: certificate.id.clone(),
            attachment: Attachment {
                filename,
                content_type: certificate.format.content_type().to_owned(),
                data,
            },
        };

        let timeout = self.config.notify_timeout;
        let delivery = tokio::time::timeout(timeout, self.notifier.notify(&notification))
            .await
            .map_err(|_| NotifyError::Timeout(timeout))??;
        debug!(
            notifier = self.notifier.name(),
            status = %delivery.status,
            "certificate delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_from_bool() {
        assert_eq!(Authorization::from(true), Authorization::Granted);
        assert_eq!(Authorization::from(false), Authorization::Denied);
    }

    #[test]
    fn failure_messages_name_the_step() {
        let e = ArtifactFailure::Template("ijazah.docx: not found".into());
        assert_eq!(e.to_string(), "template unavailable: ijazah.docx: not found");
        let e = ArtifactFailure::from(ArtifactError::Storage("disk full".into()));
        assert!(e.to_string().starts_with("artifact storage failed"));
    }
}
