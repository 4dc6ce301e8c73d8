use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::CertificateId;

/// Public projection of a certificate joined with its session and attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub certificate_id: CertificateId,
    pub issued_at: DateTime<Utc>,
    pub session_title: String,
    pub presenter_name: String,
    /// Session date as printed on the certificate.
    pub session_date: String,
    pub attendee_name: String,
}

/// Answer of a public verification lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Found(VerificationRecord),
    NotFound,
}

impl Verification {
    /// Return the record if the certificate exists.
    #[must_use]
    pub fn record(&self) -> Option<&VerificationRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl From<Option<VerificationRecord>> for Verification {
    fn from(record: Option<VerificationRecord>) -> Self {
        record.map_or(Self::NotFound, Self::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(Verification::NotFound).unwrap();
        assert_eq!(json, serde_json::json!({"status": "not_found"}));

        let record = VerificationRecord {
            certificate_id: CertificateId::generate(),
            issued_at: Utc::now(),
            session_title: "Tafsir".into(),
            presenter_name: "Sh. Ali".into(),
            session_date: "2024-01-01".into(),
            attendee_name: "Zaid".into(),
        };
        let json = serde_json::to_value(Verification::Found(record)).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["attendee_name"], "Zaid");
    }

    #[test]
    fn from_option() {
        assert!(!Verification::from(None).is_found());
    }
}
