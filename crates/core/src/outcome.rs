use serde::{Deserialize, Serialize};

use crate::id::CertificateId;
use crate::types::{AttendeeId, SessionId};

/// What happened to one attendee during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The artifact was written. `notified` is false when the attendee has
    /// no address.
    Issued { notified: bool },
    /// The artifact was written but delivery failed.
    IssuedNotifyFailed { error: String },
    /// A certificate id exists but no artifact could be produced.
    RenderFailed { error: String },
    /// No certificate id could be obtained from the store.
    AllocationFailed { error: String },
}

impl OutcomeStatus {
    /// Whether the attendee ends up with a certificate artifact.
    #[must_use]
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued { .. } | Self::IssuedNotifyFailed { .. })
    }
}

/// Per-attendee result of an issuance batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeOutcome {
    pub attendee_id: AttendeeId,
    pub attendee_name: String,
    /// Absent only when allocation failed.
    pub certificate_id: Option<CertificateId>,
    /// Artifact file name, present once rendering succeeded.
    pub artifact: Option<String>,
    /// True when this batch minted the id, false when it was reused.
    pub minted: bool,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Result of issuing certificates for a whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub session_id: SessionId,
    /// One entry per attendee, in roster order.
    pub outcomes: Vec<AttendeeOutcome>,
}

impl BatchReport {
    /// Number of attendees holding a certificate artifact after the batch.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_issued()).count()
    }

    /// Number of attendees left without an artifact.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.issued()
    }

    /// Number of issued attendees whose notification failed.
    #[must_use]
    pub fn notify_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::IssuedNotifyFailed { .. }))
            .count()
    }

    /// Number of certificate ids minted by this batch.
    #[must_use]
    pub fn minted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.minted).count()
    }
}
