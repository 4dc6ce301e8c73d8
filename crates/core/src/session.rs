use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AttendeeId, SessionId, UserId};

/// Date format used wherever a session date is printed.
pub const SESSION_DATE_FORMAT: &str = "%Y-%m-%d";

/// A scholarly study session.
///
/// Sessions are created and edited elsewhere; certificate issuance only
/// reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// The user who created the session and may issue its certificates.
    pub owner_id: UserId,
    pub title: String,
    /// Name of the presenting scholar.
    pub presenter_name: String,
    /// Local calendar date of the session.
    pub date: NaiveDate,
    /// Local wall-clock start time.
    pub start_time: NaiveTime,
    /// Local wall-clock end time.
    pub end_time: NaiveTime,
    #[serde(default)]
    pub description: Option<String>,
    /// File name of an uploaded document template, if the owner supplied one.
    #[serde(default)]
    pub template: Option<String>,
}

impl Session {
    /// The session date as printed on certificates (`YYYY-MM-DD`).
    #[must_use]
    pub fn date_label(&self) -> String {
        self.date.format(SESSION_DATE_FORMAT).to_string()
    }

    /// Local instant the session starts.
    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// Local instant the session ends.
    #[must_use]
    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    /// Whether self-registration is open at the given local time.
    ///
    /// Registration is accepted strictly between start and end. The start
    /// and end instants themselves are outside the window.
    #[must_use]
    pub fn registration_open_at(&self, now: NaiveDateTime) -> bool {
        now > self.starts_at() && now < self.ends_at()
    }

    /// Public self-registration link for this session.
    #[must_use]
    pub fn registration_url(&self, base_url: &str) -> String {
        format!("{}/register/{}", base_url.trim_end_matches('/'), self.id)
    }

    /// Whether certificates for this session are rendered from a template.
    #[must_use]
    pub fn has_template(&self) -> bool {
        self.template.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// A person who attended a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: AttendeeId,
    pub session_id: SessionId,
    /// Display name as entered at registration.
    pub name: String,
    /// Optional address the certificate is delivered to.
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Attendee {
    /// Delivery address, ignoring blank values.
    #[must_use]
    pub fn contact_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

/// A session together with its attendee roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRoster {
    pub session: Session,
    pub attendees: Vec<Attendee>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            id: SessionId::new("7"),
            owner_id: UserId::new("owner"),
            title: "Forty Hadith".into(),
            presenter_name: "Sh. Muhammad".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            description: None,
            template: None,
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn date_label_is_iso() {
        assert_eq!(session().date_label(), "2024-03-01");
    }

    #[test]
    fn registration_window_is_exclusive() {
        let s = session();
        assert!(!s.registration_open_at(at(17, 59)));
        assert!(!s.registration_open_at(at(18, 0)));
        assert!(s.registration_open_at(at(19, 0)));
        assert!(!s.registration_open_at(at(20, 0)));
    }

    #[test]
    fn registration_url_trims_trailing_slash() {
        let s = session();
        assert_eq!(
            s.registration_url("https://majalis.example/"),
            "https://majalis.example/register/7"
        );
    }

    #[test]
    fn blank_template_counts_as_none() {
        let mut s = session();
        assert!(!s.has_template());
        s.template = Some(String::new());
        assert!(!s.has_template());
        s.template = Some("ijazah.docx".into());
        assert!(s.has_template());
    }

    #[test]
    fn blank_email_is_no_address() {
        let mut attendee = Attendee {
            id: AttendeeId::new("1"),
            session_id: SessionId::new("7"),
            name: "Zaid".into(),
            email: Some("   ".into()),
            created_at: Utc::now(),
        };
        assert_eq!(attendee.contact_address(), None);
        attendee.email = Some(" z@x.com ".into());
        assert_eq!(attendee.contact_address(), Some("z@x.com"));
    }
}
