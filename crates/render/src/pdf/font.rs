use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use rustybuzz::ttf_parser::GlyphId;
use rustybuzz::{Direction, Face, UnicodeBuffer};

use super::text::{visual_runs, visual_string};
use crate::error::RenderError;

/// Which font composed certificates are typeset in.
#[derive(Clone, Default)]
pub enum FontSource {
    /// The standard Helvetica font. Needs no font file but only covers
    /// Latin-1; other characters print as `?`.
    #[default]
    Builtin,
    /// A TrueType font embedded into every PDF, shaped for Arabic.
    Embedded {
        /// PDF base font name.
        name: String,
        data: Arc<Vec<u8>>,
    },
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("Builtin"),
            Self::Embedded { name, data } => f
                .debug_struct("Embedded")
                .field("name", name)
                .field("bytes", &data.len())
                .finish(),
        }
    }
}

impl FontSource {
    /// Wrap TrueType font bytes, checking that they parse.
    pub fn embedded(name: &str, data: Vec<u8>) -> Result<Self, RenderError> {
        if Face::from_slice(&data, 0).is_none() {
            return Err(RenderError::Font(format!("{name}: not a TrueType font")));
        }
        let name: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        Ok(Self::Embedded {
            name: if name.is_empty() {
                "Embedded".to_owned()
            } else {
                name
            },
            data: Arc::new(data),
        })
    }

    /// Read a TrueType font file, naming it after the file stem.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let data =
            std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Embedded");
        Self::embedded(stem, data)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

/// Helvetica advance widths for ASCII 32..=126, in thousandths of an em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Width of WinAnsi byte `b` in Helvetica, in thousandths of an em.
pub(crate) fn helvetica_width(b: u8) -> u16 {
    match b {
        32..=126 => HELVETICA_WIDTHS[usize::from(b - 32)],
        _ => 556,
    }
}

/// Map a character to its WinAnsi byte, or `?` when it has none.
fn winansi(c: char) -> u8 {
    match u32::from(c) {
        cp @ (0x20..=0x7e | 0xa0..=0xff) => u8::try_from(cp).unwrap_or(b'?'),
        _ => b'?',
    }
}

/// A line encoded for the builtin font.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WinAnsiLine {
    pub bytes: Vec<u8>,
    pub width: f32,
}

/// Encode a line for Helvetica in display order.
pub(crate) fn winansi_line(text: &str, size: f32) -> WinAnsiLine {
    let bytes: Vec<u8> = visual_string(text).chars().map(winansi).collect();
    let units: u32 = bytes.iter().map(|b| u32::from(helvetica_width(*b))).sum();
    #[allow(clippy::cast_precision_loss)]
    let width = units as f32 * size / 1000.0;
    WinAnsiLine { bytes, width }
}

/// One glyph placed relative to the start of its line, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlacedGlyph {
    pub id: u16,
    pub x: f32,
    pub y: f32,
}

/// A line shaped with an embedded font.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShapedLine {
    pub glyphs: Vec<PlacedGlyph>,
    pub width: f32,
}

/// A parsed embedded font plus the glyphs used so far in one document.
pub(crate) struct EmbeddedFont<'a> {
    face: Face<'a>,
    units_per_em: f32,
    /// Glyph id to the text it stands for, for the `ToUnicode` map.
    pub used: BTreeMap<u16, String>,
}

impl<'a> EmbeddedFont<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, RenderError> {
        let face = Face::from_slice(data, 0)
            .ok_or_else(|| RenderError::Font("not a TrueType font".to_owned()))?;
        #[allow(clippy::cast_precision_loss)]
        let units_per_em = face.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return Err(RenderError::Font("font has no units per em".to_owned()));
        }
        Ok(Self {
            face,
            units_per_em,
            used: BTreeMap::new(),
        })
    }

    /// Convert font units to thousandths of an em.
    #[allow(clippy::cast_possible_truncation)]
    fn to_pdf_units(&self, v: f32) -> i64 {
        (v * 1000.0 / self.units_per_em).round() as i64
    }

    /// Shape a line in display order. Right-to-left runs are shaped with
    /// Arabic joining and come out already mirrored by the shaper.
    #[allow(clippy::cast_precision_loss)]
    pub fn shape(&mut self, text: &str, size: f32) -> ShapedLine {
        let scale = size / self.units_per_em;
        let mut glyphs = Vec::new();
        let mut pen = 0.0_f32;

        for run in visual_runs(text) {
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(run.text);
            buffer.set_direction(if run.rtl {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            });
            buffer.guess_segment_properties();
            let output = rustybuzz::shape(&self.face, &[], buffer);

            let mut cluster_starts: Vec<usize> = output
                .glyph_infos()
                .iter()
                .map(|info| info.cluster as usize)
                .collect();
            cluster_starts.sort_unstable();
            cluster_starts.dedup();

            let mut seen_clusters = Vec::new();
            for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
                let id = u16::try_from(info.glyph_id).unwrap_or(0);
                glyphs.push(PlacedGlyph {
                    id,
                    x: pen + pos.x_offset as f32 * scale,
                    y: pos.y_offset as f32 * scale,
                });
                pen += pos.x_advance as f32 * scale;

                let start = info.cluster as usize;
                if seen_clusters.contains(&start) {
                    continue;
                }
                seen_clusters.push(start);
                let end = cluster_starts
                    .iter()
                    .copied()
                    .find(|s| *s > start)
                    .unwrap_or(run.text.len());
                if let Some(source) = run.text.get(start..end) {
                    self.used.entry(id).or_insert_with(|| source.to_owned());
                }
            }
        }

        ShapedLine { glyphs, width: pen }
    }

    /// `/W` entries for every used glyph: `[gid [width]]` pairs.
    pub fn widths(&self) -> Vec<(u16, i64)> {
        self.used
            .keys()
            .map(|&id| {
                let advance = self.face.glyph_hor_advance(GlyphId(id)).unwrap_or(0);
                (id, self.to_pdf_units(f32::from(advance)))
            })
            .collect()
    }

    /// Font bounding box, ascent, descent and cap height in thousandths of
    /// an em.
    pub fn metrics(&self) -> FontMetrics {
        let bbox = self.face.global_bounding_box();
        let units = |v: i16| self.to_pdf_units(f32::from(v));
        let ascent = units(self.face.ascender());
        FontMetrics {
            bbox: [
                units(bbox.x_min),
                units(bbox.y_min),
                units(bbox.x_max),
                units(bbox.y_max),
            ],
            ascent,
            descent: units(self.face.descender()),
            cap_height: self.face.capital_height().map_or(ascent, units),
        }
    }
}

pub(crate) struct FontMetrics {
    pub bbox: [i64; 4],
    pub ascent: i64,
    pub descent: i64,
    pub cap_height: i64,
}

/// `ToUnicode` CMap for the glyphs in `used`.
pub(crate) fn to_unicode_cmap(used: &BTreeMap<u16, String>) -> Vec<u8> {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<_> = used.iter().filter(|(_, text)| !text.is_empty()).collect();
    // bfchar sections hold at most 100 entries each.
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (id, text) in chunk {
            let utf16: String = text.encode_utf16().fold(String::new(), |mut acc, unit| {
                let _ = write!(acc, "{unit:04X}");
                acc
            });
            let _ = writeln!(cmap, "<{id:04X}> <{utf16}>");
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths_match_known_glyphs() {
        assert_eq!(helvetica_width(b' '), 278);
        assert_eq!(helvetica_width(b'A'), 667);
        assert_eq!(helvetica_width(b'W'), 944);
        assert_eq!(helvetica_width(b'i'), 222);
        assert_eq!(helvetica_width(b'~'), 584);
    }

    #[test]
    fn non_latin_prints_as_question_marks() {
        let line = winansi_line("Zaid زيد", 10.0);
        assert_eq!(line.bytes, b"??? Zaid".to_vec());
    }

    #[test]
    fn latin1_is_kept() {
        let line = winansi_line("Café", 10.0);
        assert_eq!(line.bytes, vec![b'C', b'a', b'f', 0xe9]);
    }

    #[test]
    fn width_scales_with_size() {
        let small = winansi_line("Huda", 10.0);
        let large = winansi_line("Huda", 20.0);
        assert!((large.width - 2.0 * small.width).abs() < 0.001);
        // H=722 u=556 d=556 a=556
        assert!((small.width - 23.9).abs() < 0.001);
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        assert!(matches!(
            FontSource::embedded("Broken", b"not a font".to_vec()),
            Err(RenderError::Font(_))
        ));
    }

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(FontSource::load(Path::new("/nonexistent/Amiri-Regular.ttf")).is_err());
    }

    #[test]
    fn cmap_lists_used_glyphs() {
        let mut used = BTreeMap::new();
        used.insert(3, "ز".to_owned());
        used.insert(7, "لا".to_owned());
        let cmap = String::from_utf8(to_unicode_cmap(&used)).unwrap();
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0003> <0632>"));
        assert!(cmap.contains("<0007> <06440627>"));
    }
}
