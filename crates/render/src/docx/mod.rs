//! Templated certificates: an uploaded DOCX with `{key}` placeholders.
//!
//! Only the text of `<w:t>` nodes changes. Every other zip entry, and all
//! run and paragraph properties, are carried over untouched.

mod placeholder;
mod sample;

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use majalis_core::{ArtifactFormat, CertificateFacts};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub use placeholder::paragraph_texts;
pub use sample::sample_template;

use crate::error::RenderError;
use crate::renderer::CertificateRenderer;

/// Main body part of a WordprocessingML package.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Whether placeholders in this zip entry are filled in.
fn is_text_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || ((name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml"))
}

/// Placeholder values for one certificate.
///
/// The attendee name answers to `name` and to the Arabic `أسم` / `اسم`;
/// the presenter to `sheikh_name` and `presenter`.
pub fn substitutions(facts: &CertificateFacts) -> BTreeMap<&'static str, String> {
    let mut values = BTreeMap::new();
    for key in ["name", "أسم", "اسم"] {
        values.insert(key, facts.attendee_name.clone());
    }
    values.insert("title", facts.session_title.clone());
    for key in ["sheikh_name", "presenter"] {
        values.insert(key, facts.presenter_name.clone());
    }
    values.insert("date", facts.session_date.clone());
    values
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
) -> Result<String, RenderError> {
    let mut file = archive.by_index(index)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| RenderError::Template(format!("{}: {e}", file.name())))?;
    Ok(xml)
}

/// Fill `template` with `values`, returning the new DOCX bytes.
pub fn fill_template(
    template: &[u8],
    values: &BTreeMap<&str, String>,
) -> Result<Vec<u8>, RenderError> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    if !archive.file_names().any(|name| name == DOCUMENT_PART) {
        return Err(RenderError::Template(format!(
            "not a word document: {DOCUMENT_PART} is missing"
        )));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let name = archive.by_index_raw(index)?.name().to_owned();
        if is_text_part(&name) {
            let xml = read_entry(&mut archive, index)?;
            if let Some(filled) = placeholder::substitute_part(&xml, values)? {
                writer.start_file(name, options)?;
                writer
                    .write_all(filled.as_bytes())
                    .map_err(|e| RenderError::Template(e.to_string()))?;
                continue;
            }
        }
        writer.raw_copy_file(archive.by_index_raw(index)?)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Paragraph texts of a DOCX's main document part.
pub fn document_text(docx: &[u8]) -> Result<Vec<String>, RenderError> {
    let mut archive = ZipArchive::new(Cursor::new(docx))?;
    let index = archive
        .index_for_name(DOCUMENT_PART)
        .ok_or_else(|| RenderError::Template(format!("{DOCUMENT_PART} is missing")))?;
    let xml = read_entry(&mut archive, index)?;
    Ok(paragraph_texts(&xml))
}

/// Renders [`ArtifactFormat::TemplatedDocument`] certificates from one
/// template. No QR code is added.
#[derive(Clone)]
pub struct TemplatedRenderer {
    template: Vec<u8>,
}

impl std::fmt::Debug for TemplatedRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplatedRenderer")
            .field("template_bytes", &self.template.len())
            .finish()
    }
}

impl TemplatedRenderer {
    pub fn new(template: impl Into<Vec<u8>>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl CertificateRenderer for TemplatedRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::TemplatedDocument
    }

    fn render(&self, facts: &CertificateFacts) -> Result<Vec<u8>, RenderError> {
        fill_template(&self.template, &substitutions(facts))
    }
}

#[cfg(test)]
mod tests {
    use majalis_core::CertificateId;

    use super::*;

    fn facts() -> CertificateFacts {
        let id = CertificateId::generate();
        CertificateFacts {
            verification_url: format!("http://localhost:3000/verify/{id}"),
            certificate_id: id,
            attendee_name: "Huda".into(),
            session_title: "Usul".into(),
            presenter_name: "Sh. Ahmad".into(),
            session_date: "2024-05-02".into(),
        }
    }

    fn docx(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn body(text: &str) -> String {
        format!("<w:document><w:body><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:body></w:document>")
    }

    fn entry(docx: &[u8], name: &str) -> Option<String> {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let index = archive.index_for_name(name)?;
        Some(read_entry(&mut archive, index).unwrap())
    }

    #[test]
    fn sample_template_fills_every_placeholder() {
        let renderer = TemplatedRenderer::new(sample_template().unwrap());
        let out = renderer.render(&facts()).unwrap();
        let text = document_text(&out).unwrap().join("\n");
        assert!(text.contains("Huda"));
        assert!(text.contains("Usul"));
        assert!(text.contains("Sh. Ahmad"));
        assert!(text.contains("2024-05-02"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn no_qr_or_verification_link() {
        let f = facts();
        let out = TemplatedRenderer::new(sample_template().unwrap())
            .render(&f)
            .unwrap();
        let xml = entry(&out, DOCUMENT_PART).unwrap();
        assert!(!xml.contains(&f.verification_url));
        assert!(!xml.contains("<w:drawing"));
    }

    #[test]
    fn headers_and_footers_are_filled() {
        let template = docx(&[
            (DOCUMENT_PART, &body("{name}")),
            ("word/header1.xml", "<w:hdr><w:p><w:r><w:t>{title}</w:t></w:r></w:p></w:hdr>"),
            ("word/footer2.xml", "<w:ftr><w:p><w:r><w:t>{date}</w:t></w:r></w:p></w:ftr>"),
            ("word/styles.xml", "<w:styles>{name}</w:styles>"),
        ]);
        let out = fill_template(&template, &substitutions(&facts())).unwrap();

        assert!(entry(&out, "word/header1.xml").unwrap().contains(">Usul<"));
        assert!(entry(&out, "word/footer2.xml").unwrap().contains(">2024-05-02<"));
        // Other parts are copied as they were.
        assert_eq!(
            entry(&out, "word/styles.xml").unwrap(),
            "<w:styles>{name}</w:styles>"
        );
    }

    #[test]
    fn untouched_entries_are_preserved() {
        let template = docx(&[
            (DOCUMENT_PART, &body("no placeholders")),
            ("word/media/image1.png", "\u{89}PNG"),
        ]);
        let out = fill_template(&template, &substitutions(&facts())).unwrap();
        assert_eq!(entry(&out, DOCUMENT_PART).unwrap(), body("no placeholders"));
        assert_eq!(entry(&out, "word/media/image1.png").unwrap(), "\u{89}PNG");
    }

    #[test]
    fn deterministic() {
        let renderer = TemplatedRenderer::new(sample_template().unwrap());
        let f = facts();
        assert_eq!(renderer.render(&f).unwrap(), renderer.render(&f).unwrap());
    }

    #[test]
    fn not_a_zip() {
        let err = fill_template(b"plain text", &substitutions(&facts())).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn missing_document_part() {
        let template = docx(&[("word/styles.xml", "<w:styles/>")]);
        let err = fill_template(&template, &substitutions(&facts())).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn malformed_placeholder_fails() {
        let template = docx(&[(DOCUMENT_PART, &body("{name"))]);
        let err = TemplatedRenderer::new(template).render(&facts()).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn substitution_keys() {
        let values = substitutions(&facts());
        assert_eq!(values["أسم"], "Huda");
        assert_eq!(values["اسم"], "Huda");
        assert_eq!(values["sheikh_name"], "Sh. Ahmad");
        assert_eq!(values["presenter"], "Sh. Ahmad");
        assert!(!values.contains_key("id"));
    }
}
