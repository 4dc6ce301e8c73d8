use serde::{Deserialize, Serialize};

/// Fixed wording printed on composed certificates.
///
/// Defaults are the Arabic labels used by the Majalis site. Any field left
/// out of a config file keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateLabels {
    pub heading: String,
    /// Line introducing the attendee's name.
    pub attestation: String,
    /// Line introducing the session title.
    pub attended: String,
    /// Prefix of the presenter line.
    pub presenter: String,
    /// Prefix of the date line.
    pub date: String,
    /// Prefix of the certificate id line.
    pub id: String,
    /// Hint printed under the QR code.
    pub verify_hint: String,
}

impl Default for CertificateLabels {
    fn default() -> Self {
        Self {
            heading: "إجازة حضور مجلس علم".to_owned(),
            attestation: "نشهد بأن الطالب/ة:".to_owned(),
            attended: "قد حضر/ت مجلس:".to_owned(),
            presenter: "تحت إشراف الشيخ:".to_owned(),
            date: "بتاريخ:".to_owned(),
            id: "ID:".to_owned(),
            verify_hint: "للتحقق من صحة هذه الإجازة، يرجى مسح الرمز أعلاه".to_owned(),
        }
    }
}
