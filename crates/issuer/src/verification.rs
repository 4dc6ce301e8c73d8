use std::sync::Arc;

use tracing::{debug, instrument};

use majalis_core::{CertificateId, Verification};
use majalis_store::CertificateStore;

use crate::error::IssueError;

/// Public, unauthenticated certificate lookup.
#[derive(Clone)]
pub struct Verifier {
    store: Arc<dyn CertificateStore>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier").finish_non_exhaustive()
    }
}

impl Verifier {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }

    /// Look up a certificate by the id printed on it.
    ///
    /// Text that is not a well-formed certificate id is answered with
    /// [`Verification::NotFound`] without querying the store.
    #[instrument(skip(self))]
    pub async fn verify(&self, certificate_id: &str) -> Result<Verification, IssueError> {
        let id = match CertificateId::parse(certificate_id.trim()) {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "malformed certificate id");
                return Ok(Verification::NotFound);
            }
        };
        let record = self.store.find_verification(&id).await?;
        debug!(found = record.is_some(), "verification lookup");
        Ok(Verification::from(record))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use majalis_core::{ArtifactFormat, Certificate};
    use majalis_store::testing::fixture_roster;
    use majalis_store_memory::MemoryCertificateStore;

    use super::*;

    #[tokio::test]
    async fn issued_certificate_is_found() {
        let store = Arc::new(MemoryCertificateStore::new());
        let roster = fixture_roster("verify");
        store.insert_roster(roster.clone());
        let cert = Certificate::mint(
            roster.session.id.clone(),
            roster.attendees[1].id.clone(),
            ArtifactFormat::ComposedPdf,
            Utc::now(),
        );
        store.insert_certificate_if_absent(&cert).await.unwrap();

        let verifier = Verifier::new(store);
        let verification = verifier.verify(cert.id.as_str()).await.unwrap();
        let record = verification.record().expect("should be found");
        assert_eq!(record.attendee_name, "Huda");
        assert_eq!(record.session_title, roster.session.title);
        assert_eq!(record.issued_at, cert.created_at);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let verifier = Verifier::new(Arc::new(MemoryCertificateStore::new()));
        let unknown = CertificateId::generate();
        assert!(!verifier.verify(unknown.as_str()).await.unwrap().is_found());
        assert!(!verifier.verify("../../etc/passwd").await.unwrap().is_found());
        assert!(!verifier.verify("").await.unwrap().is_found());
    }
}
