use async_trait::async_trait;

use majalis_core::{
    AttendeeId, Certificate, CertificateId, SessionId, SessionRoster, VerificationRecord,
};

use crate::error::StoreError;

/// Persistent source of truth for certificate identity.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// At most one certificate may exist per (session, attendee) pair, and the
/// backend itself must enforce that: two concurrent
/// [`insert_certificate_if_absent`](Self::insert_certificate_if_absent)
/// calls for the same pair must never both succeed.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Look up the certificate already issued to an attendee of a session.
    async fn find_certificate(
        &self,
        session_id: &SessionId,
        attendee_id: &AttendeeId,
    ) -> Result<Option<Certificate>, StoreError>;

    /// Atomically insert a certificate unless one already exists for its
    /// (session, attendee) pair.
    ///
    /// Returns `true` if the row was inserted, `false` if another
    /// certificate already holds the pair. The existing row is left
    /// untouched.
    async fn insert_certificate_if_absent(
        &self,
        certificate: &Certificate,
    ) -> Result<bool, StoreError>;

    /// Load a session and its attendee roster. Returns `None` if the
    /// session does not exist.
    async fn find_session_with_attendees(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionRoster>, StoreError>;

    /// Join a certificate to its session and attendee for public
    /// verification. Returns `None` if no certificate has this id.
    async fn find_verification(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<VerificationRecord>, StoreError>;

    /// List every certificate issued for a session, oldest first.
    async fn list_certificates(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Certificate>, StoreError>;
}
