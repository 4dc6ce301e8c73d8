use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;
use crate::id::CertificateId;
use crate::session::{Attendee, Session};
use crate::types::{AttendeeId, SessionId};

/// The kind of artifact a certificate is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    /// A PDF composed from scratch, carrying a verification QR code.
    ComposedPdf,
    /// A word-processing document filled in from an uploaded template.
    TemplatedDocument,
}

impl ArtifactFormat {
    /// Return the stable string form stored alongside the certificate.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ComposedPdf => "composed_pdf",
            Self::TemplatedDocument => "templated_document",
        }
    }

    /// File extension of the rendered artifact.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::ComposedPdf => "pdf",
            Self::TemplatedDocument => "docx",
        }
    }

    /// MIME type of the rendered artifact.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::ComposedPdf => "application/pdf",
            Self::TemplatedDocument => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Pick the format for a session: templated iff it carries a template.
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        if session.has_template() {
            Self::TemplatedDocument
        } else {
            Self::ComposedPdf
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactFormat {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "composed_pdf" => Ok(Self::ComposedPdf),
            "templated_document" => Ok(Self::TemplatedDocument),
            other => Err(IdentifierError::UnknownFormat(other.to_owned())),
        }
    }
}

/// Artifact file name for a certificate: `{certificate_id}.{extension}`.
///
/// Built only from the identifier and the format so attendee-supplied text
/// never reaches the file system.
#[must_use]
pub fn artifact_name(id: &CertificateId, format: ArtifactFormat) -> String {
    format!("{id}.{}", format.extension())
}

/// Public verification link for a certificate: `{base_url}/verify/{id}`.
#[must_use]
pub fn verification_url(base_url: &str, id: &CertificateId) -> String {
    format!("{}/verify/{id}", base_url.trim_end_matches('/'))
}

/// A minted certificate. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub session_id: SessionId,
    pub attendee_id: AttendeeId,
    pub created_at: DateTime<Utc>,
    pub format: ArtifactFormat,
    /// Artifact file name relative to the certificates directory.
    pub artifact: String,
}

impl Certificate {
    /// Mint a new certificate with a fresh identifier.
    #[must_use]
    pub fn mint(
        session_id: SessionId,
        attendee_id: AttendeeId,
        format: ArtifactFormat,
        created_at: DateTime<Utc>,
    ) -> Self {
        let id = CertificateId::generate();
        let artifact = artifact_name(&id, format);
        Self {
            id,
            session_id,
            attendee_id,
            created_at,
            format,
            artifact,
        }
    }
}

/// Everything printed on one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFacts {
    pub certificate_id: CertificateId,
    pub attendee_name: String,
    pub session_title: String,
    pub presenter_name: String,
    /// Session date, already formatted for printing.
    pub session_date: String,
    /// Link encoded into the verification QR code.
    pub verification_url: String,
}

impl CertificateFacts {
    /// Collect the facts for one attendee of a session.
    #[must_use]
    pub fn new(
        certificate_id: CertificateId,
        session: &Session,
        attendee: &Attendee,
        base_url: &str,
    ) -> Self {
        let verification_url = verification_url(base_url, &certificate_id);
        Self {
            certificate_id,
            attendee_name: attendee.name.clone(),
            session_title: session.title.clone(),
            presenter_name: session.presenter_name.clone(),
            session_date: session.date_label(),
            verification_url,
        }
    }
}
