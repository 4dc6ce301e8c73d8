pub mod certificate;
pub mod error;
pub mod id;
pub mod outcome;
pub mod session;
pub mod types;
pub mod verification;

pub use certificate::{
    ArtifactFormat, Certificate, CertificateFacts, artifact_name, verification_url,
};
pub use error::IdentifierError;
pub use id::{CERTIFICATE_ID_BYTES, CERTIFICATE_ID_LEN, CertificateId};
pub use outcome::{AttendeeOutcome, BatchReport, OutcomeStatus};
pub use session::{Attendee, SESSION_DATE_FORMAT, Session, SessionRoster};
pub use types::{AttendeeId, SessionId, UserId};
pub use verification::{Verification, VerificationRecord};
