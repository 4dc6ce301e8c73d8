use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::ArtifactError;
use crate::store::{ArtifactStore, validate_name};
use crate::template::TemplateSource;

/// In-memory [`ArtifactStore`], for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: DashMap<String, Bytes>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Names of all stored artifacts, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artifacts.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Drop an artifact, simulating loss of the file.
    pub fn remove(&self, name: &str) -> bool {
        self.artifacts.remove(name).is_some()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<String, ArtifactError> {
        validate_name(name)?;
        self.artifacts.insert(name.to_owned(), data);
        Ok(format!("memory://{name}"))
    }

    async fn get(&self, name: &str) -> Result<Option<Bytes>, ArtifactError> {
        validate_name(name)?;
        Ok(self.artifacts.get(name).map(|e| e.value().clone()))
    }

    async fn exists(&self, name: &str) -> Result<bool, ArtifactError> {
        validate_name(name)?;
        Ok(self.artifacts.contains_key(name))
    }
}

/// In-memory [`TemplateSource`].
#[derive(Debug, Default)]
pub struct MemoryTemplateSource {
    templates: DashMap<String, Bytes>,
}

impl MemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under `reference`.
    pub fn insert(&self, reference: impl Into<String>, data: impl Into<Bytes>) {
        self.templates.insert(reference.into(), data.into());
    }
}

#[async_trait]
impl TemplateSource for MemoryTemplateSource {
    async fn load(&self, reference: &str) -> Result<Bytes, ArtifactError> {
        self.templates
            .get(reference)
            .map(|e| e.value().clone())
            .ok_or_else(|| ArtifactError::NotFound(reference.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryArtifactStore::new();
        assert!(store.is_empty());
        store.put("x.pdf", Bytes::from_static(b"1")).await.unwrap();
        assert!(store.exists("x.pdf").await.unwrap());
        assert_eq!(store.names(), vec!["x.pdf".to_owned()]);
        assert!(store.remove("x.pdf"));
        assert!(!store.exists("x.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn memory_templates() {
        let source = MemoryTemplateSource::new();
        source.insert("t.docx", Bytes::from_static(b"PK"));
        assert_eq!(source.load("t.docx").await.unwrap(), "PK");
        assert!(source.load("other.docx").await.is_err());
    }
}
