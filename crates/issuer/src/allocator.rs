use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use majalis_core::{ArtifactFormat, AttendeeId, Certificate, SessionId};
use majalis_store::{CertificateStore, StoreError};

/// A certificate handed out by the [`Allocator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub certificate: Certificate,
    /// True when this call created the certificate.
    pub minted: bool,
}

/// Hands out exactly one certificate per (session, attendee) pair.
///
/// Uniqueness is enforced by the store, not here: a lost insert race is
/// answered by reading back the row that won.
#[derive(Clone)]
pub struct Allocator {
    store: Arc<dyn CertificateStore>,
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator").finish_non_exhaustive()
    }
}

impl Allocator {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }

    /// Return the pair's certificate, minting it with `format` if none
    /// exists yet.
    ///
    /// Calling this any number of times, concurrently or not, yields the
    /// same certificate id. An existing certificate keeps the format it was
    /// minted with.
    #[instrument(skip_all, fields(session_id = %session_id, attendee_id = %attendee_id, %format))]
    pub async fn allocate(
        &self,
        session_id: &SessionId,
        attendee_id: &AttendeeId,
        format: ArtifactFormat,
    ) -> Result<Allocation, StoreError> {
        if let Some(certificate) = self.store.find_certificate(session_id, attendee_id).await? {
            debug!(certificate_id = %certificate.id, "reusing existing certificate");
            return Ok(Allocation {
                certificate,
                minted: false,
            });
        }

        let candidate = Certificate::mint(
            session_id.clone(),
            attendee_id.clone(),
            format,
            Utc::now(),
        );
        if self.store.insert_certificate_if_absent(&candidate).await? {
            info!(certificate_id = %candidate.id, %format, "minted certificate");
            return Ok(Allocation {
                certificate: candidate,
                minted: true,
            });
        }

        // Another allocator inserted the pair between our read and write.
        let winner = self
            .store
            .find_certificate(session_id, attendee_id)
            .await?
            .ok_or_else(|| {
                StoreError::Backend(format!(
                    "certificate for ({session_id}, {attendee_id}) vanished after insert conflict"
                ))
            })?;
        debug!(
            certificate_id = %winner.id,
            discarded = %candidate.id,
            "lost allocation race, using stored certificate"
        );
        Ok(Allocation {
            certificate: winner,
            minted: false,
        })
    }
}
