use bytes::Bytes;
use majalis_core::CertificateId;

/// A file sent along with a notification.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// One certificate delivery.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Recipient address.
    pub to: String,
    pub attendee_name: String,
    pub session_title: String,
    pub certificate_id: CertificateId,
    pub attachment: Attachment,
}

impl Notification {
    /// Subject line: `إجازة مجلس: {title}`.
    pub fn subject(&self) -> String {
        format!("إجازة مجلس: {}", self.session_title)
    }

    /// Plain-text body greeting the attendee by name.
    pub fn text_body(&self) -> String {
        format!(
            "السلام عليكم {}،\n\nمرفق لكم إجازة حضور المجلس العلمي: {}.\n\nتقبل الله منا ومنكم.",
            self.attendee_name, self.session_title
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        let certificate_id = CertificateId::generate();
        Notification {
            to: "z@x.com".into(),
            attendee_name: "Zaid".into(),
            session_title: "Usul".into(),
            attachment: Attachment {
                filename: format!("{certificate_id}.pdf"),
                content_type: "application/pdf".into(),
                data: Bytes::from_static(b"%PDF"),
            },
            certificate_id,
        }
    }

    #[test]
    fn subject_names_the_session() {
        assert_eq!(notification().subject(), "إجازة مجلس: Usul");
    }

    #[test]
    fn body_greets_the_attendee() {
        let body = notification().text_body();
        assert!(body.starts_with("السلام عليكم Zaid"));
        assert!(body.contains("Usul"));
    }
}
