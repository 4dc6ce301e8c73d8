use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ArtifactError;

/// Storage for rendered certificate artifacts.
///
/// Artifacts are addressed by a flat file name such as `{id}.pdf`. Writes
/// replace any existing artifact of the same name atomically: a reader sees
/// either the old bytes or the new bytes, never a partial file.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store an artifact and return where it now lives.
    async fn put(&self, name: &str, data: Bytes) -> Result<String, ArtifactError>;

    /// Fetch an artifact, or `None` if it was never written (or was lost).
    async fn get(&self, name: &str) -> Result<Option<Bytes>, ArtifactError>;

    /// Whether an artifact with this name exists.
    async fn exists(&self, name: &str) -> Result<bool, ArtifactError>;
}

/// Check that `name` is a plain file name.
///
/// Only ASCII letters, digits, `.`, `-` and `_` are accepted, and the name
/// may not start with a dot.
pub fn validate_name(name: &str) -> Result<(), ArtifactError> {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'));
    if plain {
        Ok(())
    } else {
        Err(ArtifactError::InvalidName(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_certificate_names() {
        assert!(validate_name("0123456789abcdef0123456789abcdef.pdf").is_ok());
        assert!(validate_name("a_b-c.docx").is_ok());
    }

    #[test]
    fn rejects_paths_and_hidden_names() {
        for bad in ["", "../x.pdf", "a/b.pdf", "a\\b.pdf", ".hidden", "نص.pdf", "a b.pdf"] {
            assert!(
                matches!(validate_name(bad), Err(ArtifactError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
