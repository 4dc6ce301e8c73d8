use serde::{Deserialize, Serialize};

use majalis_core::{Attendee, Certificate, Session};

/// Every row of a [`MemoryCertificateStore`](crate::MemoryCertificateStore),
/// in a serializable form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}
