use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::ArtifactError;
use crate::store::{ArtifactStore, validate_name};
use crate::template::TemplateSource;

/// [`ArtifactStore`] writing into a single directory on the local file
/// system.
///
/// Each write goes to a uniquely named temporary file in the same directory
/// and is then renamed over the target, so concurrent writers of one name
/// are last-writer-wins and readers never see a torn file.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<String, ArtifactError> {
        let target = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let tmp = self
            .root
            .join(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, &data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(artifact = name, bytes = data.len(), "artifact written");
        Ok(target.display().to_string())
    }

    async fn get(&self, name: &str) -> Result<Option<Bytes>, ArtifactError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, ArtifactError> {
        let path = self.path_for(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

/// [`TemplateSource`] reading uploaded templates from a directory.
///
/// Only the final path component of a reference is used, so a session
/// record cannot point outside the uploads directory.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn load(&self, reference: &str) -> Result<Bytes, ArtifactError> {
        let file_name = Path::new(reference)
            .file_name()
            .ok_or_else(|| ArtifactError::InvalidName(reference.to_owned()))?;
        let path = self.root.join(file_name);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ArtifactError::NotFound(reference.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("certificates"));

        let location = store
            .put("abc.pdf", Bytes::from_static(b"%PDF-1.5"))
            .await
            .unwrap();
        assert!(location.ends_with("abc.pdf"));
        assert!(store.exists("abc.pdf").await.unwrap());
        assert_eq!(
            store.get("abc.pdf").await.unwrap().unwrap(),
            Bytes::from_static(b"%PDF-1.5")
        );
    }

    #[tokio::test]
    async fn missing_artifact_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        assert!(store.get("nope.pdf").await.unwrap().is_none());
        assert!(!store.exists("nope.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn overwrite_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.put("a.pdf", Bytes::from_static(b"one")).await.unwrap();
        store.put("a.pdf", Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(store.get("a.pdf").await.unwrap().unwrap(), "two");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_writers_leave_one_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsArtifactStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put("same.pdf", Bytes::from(vec![i; 4096])).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let data = store.get("same.pdf").await.unwrap().unwrap();
        assert_eq!(data.len(), 4096);
        assert!(data.iter().all(|b| *b == data[0]));
    }

    #[tokio::test]
    async fn rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let err = store
            .put("../escape.pdf", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidName(_)));
    }

    #[tokio::test]
    async fn template_source_uses_file_name_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.docx"), b"PK").unwrap();
        let source = FsTemplateSource::new(dir.path());

        assert_eq!(source.load("t.docx").await.unwrap(), "PK");
        assert_eq!(source.load("/etc/elsewhere/t.docx").await.unwrap(), "PK");
        assert!(matches!(
            source.load("missing.docx").await,
            Err(ArtifactError::NotFound(_))
        ));
        assert!(matches!(
            source.load("..").await,
            Err(ArtifactError::InvalidName(_))
        ));
    }
}
