use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use majalis_core::{
    Attendee, AttendeeId, Certificate, CertificateId, Session, SessionId, SessionRoster,
    VerificationRecord,
};
use majalis_store::error::StoreError;
use majalis_store::store::CertificateStore;

use crate::snapshot::MemorySnapshot;

type PairKey = (SessionId, AttendeeId);

/// In-memory [`CertificateStore`] backed by [`DashMap`]s.
///
/// The (session, attendee) map is the uniqueness constraint: insertion goes
/// through its `entry` API, so two concurrent inserts for one pair cannot
/// both land. Sessions and attendees are seeded with
/// [`insert_session`](Self::insert_session) and
/// [`insert_attendee`](Self::insert_attendee).
#[derive(Debug, Default)]
pub struct MemoryCertificateStore {
    sessions: DashMap<SessionId, Session>,
    attendees: DashMap<AttendeeId, Attendee>,
    by_pair: DashMap<PairKey, Certificate>,
    by_id: DashMap<CertificateId, PairKey>,
}

impl MemoryCertificateStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a session.
    pub fn insert_session(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Add or replace an attendee.
    pub fn insert_attendee(&self, attendee: Attendee) {
        self.attendees.insert(attendee.id.clone(), attendee);
    }

    /// Seed a whole roster at once.
    pub fn insert_roster(&self, roster: SessionRoster) {
        self.insert_session(roster.session);
        for attendee in roster.attendees {
            self.insert_attendee(attendee);
        }
    }

    /// Rebuild a store from a [`MemorySnapshot`]. Certificates are restored
    /// as-is, without re-checking their references.
    pub fn from_snapshot(snapshot: MemorySnapshot) -> Self {
        let store = Self::new();
        for session in snapshot.sessions {
            store.insert_session(session);
        }
        for attendee in snapshot.attendees {
            store.insert_attendee(attendee);
        }
        for certificate in snapshot.certificates {
            let key = (
                certificate.session_id.clone(),
                certificate.attendee_id.clone(),
            );
            store.by_id.insert(certificate.id.clone(), key.clone());
            store.by_pair.insert(key, certificate);
        }
        store
    }

    /// Copy out every row, sorted so equal stores give equal snapshots.
    pub fn snapshot(&self) -> MemorySnapshot {
        let mut sessions: Vec<Session> =
            self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));

        let mut attendees: Vec<Attendee> =
            self.attendees.iter().map(|a| a.value().clone()).collect();
        attendees.sort_by(|a, b| a.id.cmp(&b.id));

        let mut certificates: Vec<Certificate> =
            self.by_pair.iter().map(|c| c.value().clone()).collect();
        certificates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        MemorySnapshot {
            sessions,
            attendees,
            certificates,
        }
    }

    /// Number of certificates held, across all sessions.
    pub fn certificate_count(&self) -> usize {
        self.by_pair.len()
    }

    /// Reject certificates whose session or attendee is unknown.
    fn check_references(&self, certificate: &Certificate) -> Result<(), StoreError> {
        if !self.sessions.contains_key(&certificate.session_id) {
            return Err(StoreError::Constraint(format!(
                "unknown session: {}",
                certificate.session_id
            )));
        }
        match self.attendees.get(&certificate.attendee_id) {
            Some(attendee) if attendee.session_id == certificate.session_id => Ok(()),
            Some(_) => Err(StoreError::Constraint(format!(
                "attendee {} does not belong to session {}",
                certificate.attendee_id, certificate.session_id
            ))),
            None => Err(StoreError::Constraint(format!(
                "unknown attendee: {}",
                certificate.attendee_id
            ))),
        }
    }
}

#[async_trait]
impl CertificateStore for MemoryCertificateStore {
    async fn find_certificate(
        &self,
        session_id: &SessionId,
        attendee_id: &AttendeeId,
    ) -> Result<Option<Certificate>, StoreError> {
        let key = (session_id.clone(), attendee_id.clone());
        Ok(self.by_pair.get(&key).map(|c| c.value().clone()))
    }

    async fn insert_certificate_if_absent(
        &self,
        certificate: &Certificate,
    ) -> Result<bool, StoreError> {
        self.check_references(certificate)?;

        if self.by_id.contains_key(&certificate.id) {
            return Err(StoreError::Constraint(format!(
                "duplicate certificate id: {}",
                certificate.id
            )));
        }

        let key = (
            certificate.session_id.clone(),
            certificate.attendee_id.clone(),
        );
        match self.by_pair.entry(key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(certificate.clone());
                self.by_id.insert(certificate.id.clone(), key);
                Ok(true)
            }
        }
    }

    async fn find_session_with_attendees(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionRoster>, StoreError> {
        let Some(session) = self.sessions.get(session_id).map(|s| s.value().clone()) else {
            return Ok(None);
        };

        let mut attendees: Vec<Attendee> = self
            .attendees
            .iter()
            .filter(|a| a.session_id == *session_id)
            .map(|a| a.value().clone())
            .collect();
        attendees.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(Some(SessionRoster { session, attendees }))
    }

    async fn find_verification(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let Some(key) = self.by_id.get(certificate_id).map(|k| k.value().clone()) else {
            return Ok(None);
        };
        let Some(certificate) = self.by_pair.get(&key).map(|c| c.value().clone()) else {
            return Ok(None);
        };
        let Some(session) = self.sessions.get(&certificate.session_id) else {
            return Ok(None);
        };
        let Some(attendee) = self.attendees.get(&certificate.attendee_id) else {
            return Ok(None);
        };

        Ok(Some(VerificationRecord {
            certificate_id: certificate.id,
            issued_at: certificate.created_at,
            session_title: session.title.clone(),
            presenter_name: session.presenter_name.clone(),
            session_date: session.date_label(),
            attendee_name: attendee.name.clone(),
        }))
    }

    async fn list_certificates(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Certificate>, StoreError> {
        let mut certs: Vec<Certificate> = self
            .by_pair
            .iter()
            .filter(|c| c.session_id == *session_id)
            .map(|c| c.value().clone())
            .collect();
        certs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(certs)
    }
}
