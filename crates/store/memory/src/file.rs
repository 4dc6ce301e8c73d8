use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use majalis_core::{
    AttendeeId, Certificate, CertificateId, SessionId, SessionRoster, VerificationRecord,
};
use majalis_store::error::StoreError;
use majalis_store::store::CertificateStore;

use crate::snapshot::MemorySnapshot;
use crate::store::MemoryCertificateStore;

/// [`MemoryCertificateStore`] persisted to a JSON file.
///
/// The file is read once on [`open`](Self::open) and rewritten after every
/// write that changes the store, so certificates minted by one process are
/// found and verified by the next. Rewrites go through a temporary file and
/// a rename.
///
/// Within a process the (session, attendee) constraint holds exactly as in
/// the memory store. The file is not locked: two processes issuing against
/// one file at the same time can each mint for the same pair, and the last
/// rewrite wins. Use the Postgres store when several writers share state.
#[derive(Debug)]
pub struct FileCertificateStore {
    inner: MemoryCertificateStore,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCertificateStore {
    /// Load the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: MemorySnapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    StoreError::Serialization(format!("{}: {e}", path.display()))
                })?;
                info!(
                    path = %path.display(),
                    sessions = snapshot.sessions.len(),
                    certificates = snapshot.certificates.len(),
                    "certificate store loaded"
                );
                MemoryCertificateStore::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => MemoryCertificateStore::new(),
            Err(e) => return Err(StoreError::Backend(format!("{}: {e}", path.display()))),
        };

        Ok(Self {
            inner,
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add or replace a roster, then persist.
    pub async fn insert_roster(&self, roster: SessionRoster) -> Result<(), StoreError> {
        self.inner.insert_roster(roster);
        self.persist().await
    }

    /// Number of certificates held, across all sessions.
    pub fn certificate_count(&self) -> usize {
        self.inner.certificate_count()
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        // Taken under the lock so the last rewrite carries every earlier one.
        let bytes = serde_json::to_vec_pretty(&self.inner.snapshot())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(&e))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_error(&e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(&e))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "certificate store saved");
        Ok(())
    }

    fn io_error(&self, error: &std::io::Error) -> StoreError {
        StoreError::Backend(format!("{}: {error}", self.path.display()))
    }
}

#[async_trait]
impl CertificateStore for FileCertificateStore {
    async fn find_certificate(
        &self,
        session_id: &SessionId,
        attendee_id: &AttendeeId,
    ) -> Result<Option<Certificate>, StoreError> {
        self.inner.find_certificate(session_id, attendee_id).await
    }

    async fn insert_certificate_if_absent(
        &self,
        certificate: &Certificate,
    ) -> Result<bool, StoreError> {
        let inserted = self.inner.insert_certificate_if_absent(certificate).await?;
        if inserted {
            self.persist().await?;
        }
        Ok(inserted)
    }

    async fn find_session_with_attendees(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionRoster>, StoreError> {
        self.inner.find_session_with_attendees(session_id).await
    }

    async fn find_verification(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        self.inner.find_verification(certificate_id).await
    }

    async fn list_certificates(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Certificate>, StoreError> {
        self.inner.list_certificates(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use majalis_core::ArtifactFormat;
    use majalis_store::testing::{fixture_roster, run_store_conformance_tests};

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCertificateStore::open(dir.path().join("state.json"))
            .await
            .unwrap();
        let roster = fixture_roster("file");
        let other = fixture_roster("file-other");
        store.insert_roster(roster.clone()).await.unwrap();
        store.insert_roster(other.clone()).await.unwrap();
        run_store_conformance_tests(&store, &roster, &other)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn reopened_store_keeps_certificates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let roster = fixture_roster("reopen");

        let first = FileCertificateStore::open(&path).await.unwrap();
        first.insert_roster(roster.clone()).await.unwrap();
        let cert = Certificate::mint(
            roster.session.id.clone(),
            roster.attendees[0].id.clone(),
            ArtifactFormat::ComposedPdf,
            Utc::now(),
        );
        assert!(first.insert_certificate_if_absent(&cert).await.unwrap());
        drop(first);

        let second = FileCertificateStore::open(&path).await.unwrap();
        assert_eq!(second.certificate_count(), 1);
        let found = second
            .find_certificate(&cert.session_id, &cert.attendee_id)
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(cert.id.clone()));
        assert!(second.find_verification(&cert.id).await.unwrap().is_some());

        let rival = Certificate::mint(
            cert.session_id.clone(),
            cert.attendee_id.clone(),
            ArtifactFormat::ComposedPdf,
            Utc::now(),
        );
        assert!(!second.insert_certificate_if_absent(&rival).await.unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let store = FileCertificateStore::open(&path).await.unwrap();
        assert_eq!(store.certificate_count(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json").unwrap();
        let err = FileCertificateStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
