use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::DOCUMENT_PART;
use super::placeholder::escape;
use crate::error::RenderError;

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#,
);

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

struct SampleLine {
    text: &'static str,
    align: Align,
    /// Font size in half-points.
    size: u32,
    bold: bool,
    color: Option<&'static str>,
}

const fn line(text: &'static str, align: Align, size: u32) -> SampleLine {
    SampleLine {
        text,
        align,
        size,
        bold: false,
        color: None,
    }
}

const SAMPLE: [SampleLine; 12] = [
    line("بسم الله الرحمن الرحيم", Align::Center, 36),
    line("إجازة بالسند المتصل", Align::Center, 32),
    line("", Align::Center, 28),
    line(
        "الحمد لله والصلاة والسلام على رسول الله، وآله وصحبه أجمعين، أما بعد:",
        Align::Right,
        28,
    ),
    line("فقد حضر مجلسنا العلمي هذا الطالب(ة) المجتهد(ة):", Align::Right, 28),
    SampleLine {
        text: "{أسم}",
        align: Align::Center,
        size: 48,
        bold: true,
        color: Some("059669"),
    },
    line("وقد أتم سماع/قراءة المجلس بعنوان: {title}", Align::Right, 28),
    SampleLine {
        text: "على شيخه: {sheikh_name}",
        align: Align::Right,
        size: 28,
        bold: true,
        color: None,
    },
    line("وذلك بتاريخ: {date}", Align::Left, 24),
    line("", Align::Center, 24),
    line("_________________________", Align::Center, 24),
    line("توقيع الشيخ / الختم", Align::Center, 24),
];

fn paragraph(line: &SampleLine) -> String {
    let jc = match line.align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    };
    let mut run_props = String::from("<w:rtl/>");
    if line.bold {
        run_props.push_str("<w:b/>");
    }
    if let Some(color) = line.color {
        run_props.push_str(&format!("<w:color w:val=\"{color}\"/>"));
    }
    run_props.push_str(&format!("<w:sz w:val=\"{}\"/>", line.size));

    let run = if line.text.is_empty() {
        String::new()
    } else {
        format!(
            "<w:r><w:rPr>{run_props}</w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape(line.text)
        )
    };
    format!("<w:p><w:pPr><w:bidi/><w:jc w:val=\"{jc}\"/></w:pPr>{run}</w:p>")
}

/// Build a ready-to-use Arabic ijazah template.
///
/// It uses the `{أسم}`, `{title}`, `{sheikh_name}` and `{date}`
/// placeholders, and can be uploaded as is or edited in a word processor.
pub fn sample_template() -> Result<Vec<u8>, RenderError> {
    let body: String = SAMPLE.iter().map(paragraph).collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}<w:sectPr/></w:body></w:document>"
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        (DOCUMENT_PART, document.as_str()),
    ] {
        writer.start_file(name, options)?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| RenderError::Template(e.to_string()))?;
    }
    Ok(writer.finish()?.into_inner())
}
