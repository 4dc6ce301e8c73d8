//! Composed certificates: an A4 landscape PDF drawn from scratch.
//!
//! The document carries no timestamps or random identifiers, so the same
//! facts always produce the same bytes.

mod font;
pub mod layout;
mod text;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use majalis_core::{ArtifactFormat, CertificateFacts};
use tracing::warn;

pub use font::FontSource;
use font::{EmbeddedFont, ShapedLine, to_unicode_cmap, winansi_line};
use layout::{
    AMBER_LIGHT, EMERALD, INNER_INSET, INNER_STROKE, Layout, Line, OUTER_INSET, OUTER_STROKE,
    PAGE_HEIGHT, PAGE_WIDTH, Placement, Rect, Rgb, border, fit,
};

use crate::error::RenderError;
use crate::labels::CertificateLabels;
use crate::qr::{QUIET_ZONE, QrMatrix};
use crate::renderer::CertificateRenderer;

const FONT_RESOURCE: &str = "F1";

fn real(v: f32) -> Object {
    Object::Real(v.into())
}

fn int(v: i64) -> Object {
    Object::Integer(v)
}

/// Renders [`ArtifactFormat::ComposedPdf`] certificates.
#[derive(Debug, Clone, Default)]
pub struct ComposedRenderer {
    labels: CertificateLabels,
    font: FontSource,
}

impl ComposedRenderer {
    pub fn new(labels: CertificateLabels, font: FontSource) -> Self {
        if font.is_builtin() {
            warn!("no certificate font configured, falling back to Helvetica");
        }
        Self { labels, font }
    }

    pub fn labels(&self) -> &CertificateLabels {
        &self.labels
    }
}

impl CertificateRenderer for ComposedRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::ComposedPdf
    }

    fn render(&self, facts: &CertificateFacts) -> Result<Vec<u8>, RenderError> {
        let layout = layout::layout(facts, &self.labels);
        let qr = QrMatrix::encode(&facts.verification_url)?;

        let mut doc = Document::with_version("1.5");
        let mut operations = border_operations();

        let font_id = match &self.font {
            FontSource::Builtin => {
                for line in &layout.lines {
                    operations.extend(builtin_text(line));
                }
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                })
            }
            FontSource::Embedded { name, data } => {
                let mut font = EmbeddedFont::parse(data.as_slice())?;
                for line in &layout.lines {
                    let shaped = font.shape(&line.text, line.size);
                    operations.extend(glyph_text(line, &shaped));
                }
                embed_font(&mut doc, name, data.as_slice(), &font)
            }
        };

        operations.extend(qr_operations(&qr, layout.qr));
        finish(doc, operations, font_id, &layout, &facts.verification_url)
    }
}

fn color_operands(color: Rgb) -> Vec<Object> {
    color.components().into_iter().map(real).collect()
}

fn rect_operands(rect: Rect) -> Vec<Object> {
    vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)]
}

fn border_operations() -> Vec<Operation> {
    let mut ops = Vec::new();
    for (inset, stroke, color) in [
        (OUTER_INSET, OUTER_STROKE, EMERALD),
        (INNER_INSET, INNER_STROKE, AMBER_LIGHT),
    ] {
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("RG", color_operands(color)));
        ops.push(Operation::new("w", vec![real(stroke)]));
        ops.push(Operation::new("re", rect_operands(border(inset))));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }
    ops
}

fn begin_text(line: &Line, placement: &Placement) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT_RESOURCE.into(), real(placement.size)]),
        Operation::new("rg", color_operands(line.color)),
    ]
}

fn builtin_text(line: &Line) -> Vec<Operation> {
    let encoded = winansi_line(&line.text, line.size);
    let placement = fit(line.size, encoded.width);
    let mut ops = begin_text(line, &placement);
    ops.push(Operation::new("Td", vec![real(placement.x), real(line.baseline)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encoded.bytes, StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn glyph_text(line: &Line, shaped: &ShapedLine) -> Vec<Operation> {
    let placement = fit(line.size, shaped.width);
    let scale = placement.scale(line.size);
    let mut ops = begin_text(line, &placement);
    for glyph in &shaped.glyphs {
        ops.push(Operation::new(
            "Tm",
            vec![
                int(1),
                int(0),
                int(0),
                int(1),
                real(placement.x + glyph.x * scale),
                real(line.baseline + glyph.y * scale),
            ],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                glyph.id.to_be_bytes().to_vec(),
                StringFormat::Hexadecimal,
            )],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

/// Dark modules as filled rectangles inside `area`, leaving the quiet zone
/// white.
#[allow(clippy::cast_precision_loss)]
fn qr_operations(qr: &QrMatrix, area: Rect) -> Vec<Operation> {
    let module = area.width / qr.width_with_quiet_zone() as f32;
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]),
        Operation::new("re", rect_operands(area)),
        Operation::new("f", vec![]),
        Operation::new("rg", vec![real(0.0), real(0.0), real(0.0)]),
    ];
    for (row, col, len) in qr.dark_runs() {
        let cell = Rect {
            x: area.x + (col + QUIET_ZONE) as f32 * module,
            y: area.top() - (row + QUIET_ZONE + 1) as f32 * module,
            width: len as f32 * module,
            height: module,
        };
        ops.push(Operation::new("re", rect_operands(cell)));
    }
    ops.push(Operation::new("f", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Add a Type0 font with an Identity-H CIDFontType2 descendant and return
/// the Type0 font's id.
fn embed_font(doc: &mut Document, name: &str, data: &[u8], font: &EmbeddedFont<'_>) -> ObjectId {
    let metrics = font.metrics();

    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => int(i64::try_from(data.len()).unwrap_or(i64::MAX)) },
        data.to_vec(),
    ));
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name,
        "Flags" => 4,
        "FontBBox" => metrics.bbox.iter().map(|v| int(*v)).collect::<Vec<_>>(),
        "ItalicAngle" => 0,
        "Ascent" => metrics.ascent,
        "Descent" => metrics.descent,
        "CapHeight" => metrics.cap_height,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = font
        .widths()
        .into_iter()
        .flat_map(|(id, width)| [int(i64::from(id)), Object::Array(vec![int(width)])])
        .collect();
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => name,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "CIDToGIDMap" => "Identity",
        "DW" => 1000,
        "W" => widths,
    });

    let to_unicode_id = doc.add_object(Stream::new(Dictionary::new(), to_unicode_cmap(&font.used)));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => name,
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// Assemble the single page, with a link annotation over the QR code, and
/// serialize the document.
fn finish(
    mut doc: Document,
    operations: Vec<Operation>,
    font_id: ObjectId,
    layout: &Layout,
    url: &str,
) -> Result<Vec<u8>, RenderError> {
    let pages_id = doc.new_object_id();

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    });

    let qr = layout.qr;
    let link_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![real(qr.x), real(qr.y), real(qr.x + qr.width), real(qr.top())],
        "Border" => vec![int(0), int(0), int(0)],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(url),
        },
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![int(0), int(0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        "Contents" => content_id,
        "Resources" => resources_id,
        "Annots" => vec![Object::Reference(link_id)],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(out)
}
