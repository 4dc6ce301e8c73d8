use majalis_core::CertificateFacts;

use crate::labels::CertificateLabels;

/// A4 landscape, in points.
pub const PAGE_WIDTH: f32 = 841.89;
pub const PAGE_HEIGHT: f32 = 595.28;

pub(crate) const OUTER_INSET: f32 = 20.0;
pub(crate) const OUTER_STROKE: f32 = 5.0;
pub(crate) const INNER_INSET: f32 = 30.0;
pub(crate) const INNER_STROKE: f32 = 2.0;

/// Side of the square QR code, in points.
pub const QR_SIZE: f32 = 100.0;

/// Horizontal space kept free between text and the inner border.
const TEXT_PADDING: f32 = 10.0;

/// Widest a line of text may be.
pub const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * (INNER_INSET + TEXT_PADDING);

const TOP_MARGIN: f32 = 55.0;
const LINE_SPACING: f32 = 1.8;
const QR_GAP: f32 = 12.0;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Components scaled to `0.0..=1.0` for PDF color operators.
    pub fn components(self) -> [f32; 3] {
        [self.0, self.1, self.2].map(|c| f32::from(c) / 255.0)
    }
}

pub const EMERALD: Rgb = Rgb(0x15, 0x80, 0x3d);
pub const AMBER_LIGHT: Rgb = Rgb(0xfc, 0xd3, 0x4d);
pub const AMBER_DARK: Rgb = Rgb(0xb4, 0x53, 0x09);
pub const GRAY: Rgb = Rgb(0x55, 0x55, 0x55);
pub const BLACK: Rgb = Rgb(0, 0, 0);

/// One centered line of text. `baseline` is in PDF coordinates (origin at
/// the bottom-left corner of the page).
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub size: f32,
    pub color: Rgb,
    pub baseline: f32,
}

/// An axis-aligned rectangle in PDF coordinates; `y` is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

/// Positions of everything on a composed certificate page.
///
/// A pure function of its inputs: the same facts and labels always give
/// the same layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub lines: Vec<Line>,
    pub qr: Rect,
}

/// Where a centered line lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Font size actually used.
    pub size: f32,
    /// Left edge of the line.
    pub x: f32,
    pub width: f32,
}

impl Placement {
    /// Scale from the line's nominal size to the size used.
    pub fn scale(&self, nominal: f32) -> f32 {
        if nominal > 0.0 { self.size / nominal } else { 1.0 }
    }
}

/// Center a line measuring `width` at its `nominal` font size, shrinking
/// the font until the line fits in [`TEXT_WIDTH`]. Text widths are linear
/// in the font size.
pub fn fit(nominal: f32, width: f32) -> Placement {
    let (size, width) = if width > TEXT_WIDTH {
        (nominal * TEXT_WIDTH / width, TEXT_WIDTH)
    } else {
        (nominal, width)
    };
    Placement {
        size,
        x: (PAGE_WIDTH - width) / 2.0,
        width,
    }
}

/// Inset rectangle of a border `inset` points from the page edge.
pub(crate) fn border(inset: f32) -> Rect {
    Rect {
        x: inset,
        y: inset,
        width: PAGE_WIDTH - 2.0 * inset,
        height: PAGE_HEIGHT - 2.0 * inset,
    }
}

/// Collapse control characters and surrounding whitespace so every entry
/// is a single printable line.
fn one_line(text: &str) -> String {
    text.split(char::is_control)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

struct Cursor {
    from_top: f32,
    lines: Vec<Line>,
}

impl Cursor {
    fn push(&mut self, text: String, size: f32, color: Rgb) {
        self.lines.push(Line {
            text: one_line(&text),
            size,
            color,
            baseline: PAGE_HEIGHT - (self.from_top + size),
        });
        self.from_top += size * LINE_SPACING;
    }
}

/// Lay out a composed certificate.
pub fn layout(facts: &CertificateFacts, labels: &CertificateLabels) -> Layout {
    let mut cursor = Cursor {
        from_top: TOP_MARGIN,
        lines: Vec::with_capacity(9),
    };

    cursor.push(labels.heading.clone(), 30.0, EMERALD);
    cursor.push(labels.attestation.clone(), 20.0, BLACK);
    cursor.push(facts.attendee_name.clone(), 25.0, AMBER_DARK);
    cursor.push(labels.attended.clone(), 20.0, BLACK);
    cursor.push(facts.session_title.clone(), 22.0, EMERALD);
    cursor.push(
        format!("{} {}", labels.presenter, facts.presenter_name),
        20.0,
        BLACK,
    );
    cursor.push(format!("{} {}", labels.date, facts.session_date), 20.0, BLACK);

    cursor.from_top += QR_GAP;
    let qr = Rect {
        x: (PAGE_WIDTH - QR_SIZE) / 2.0,
        y: PAGE_HEIGHT - cursor.from_top - QR_SIZE,
        width: QR_SIZE,
        height: QR_SIZE,
    };
    cursor.from_top += QR_SIZE + QR_GAP;

    cursor.push(format!("{} {}", labels.id, facts.certificate_id), 10.0, GRAY);
    cursor.push(labels.verify_hint.clone(), 10.0, GRAY);

    Layout {
        lines: cursor.lines,
        qr,
    }
}

#[cfg(test)]
mod tests {
    use majalis_core::CertificateId;
    use proptest::prelude::*;

    use super::*;

    fn facts() -> CertificateFacts {
        let id = CertificateId::generate();
        CertificateFacts {
            verification_url: format!("http://localhost:3000/verify/{id}"),
            certificate_id: id,
            attendee_name: "زيد".into(),
            session_title: "شرح الأربعين".into(),
            presenter_name: "محمد".into(),
            session_date: "2024-03-01".into(),
        }
    }

    #[test]
    fn everything_fits_inside_the_inner_border() {
        let inner = border(INNER_INSET);
        let layout = layout(&facts(), &CertificateLabels::default());
        for line in &layout.lines {
            assert!(line.baseline > inner.y, "{line:?} below border");
            assert!(line.baseline + line.size < inner.top(), "{line:?} above border");
        }
        assert!(layout.qr.y > inner.y);
        assert!(layout.qr.top() < inner.top());
    }

    #[test]
    fn lines_run_top_down_in_order() {
        let f = facts();
        let layout = layout(&f, &CertificateLabels::default());
        assert_eq!(layout.lines.len(), 9);
        assert_eq!(layout.lines[2].text, "زيد");
        assert_eq!(layout.lines[2].color, AMBER_DARK);
        assert_eq!(layout.lines[7].text, format!("ID: {}", f.certificate_id));
        for pair in layout.lines.windows(2) {
            assert!(pair[0].baseline > pair[1].baseline);
        }
        // The QR code sits between the date line and the id line.
        assert!(layout.qr.top() < layout.lines[6].baseline);
        assert!(layout.qr.y > layout.lines[7].baseline + layout.lines[7].size);
    }

    #[test]
    fn qr_is_centered() {
        let layout = layout(&facts(), &CertificateLabels::default());
        let center = layout.qr.x + layout.qr.width / 2.0;
        assert!((center - PAGE_WIDTH / 2.0).abs() < 0.01);
        assert!((layout.qr.width - QR_SIZE).abs() < f32::EPSILON);
    }

    #[test]
    fn control_characters_are_flattened() {
        let mut f = facts();
        f.attendee_name = "Zaid\n ibn\tThabit\r".into();
        let layout = layout(&f, &CertificateLabels::default());
        assert_eq!(layout.lines[2].text, "Zaid ibn Thabit");
    }

    #[test]
    fn labels_are_configurable() {
        let labels = CertificateLabels {
            presenter: "Presented by".into(),
            ..CertificateLabels::default()
        };
        let layout = layout(&facts(), &labels);
        assert_eq!(layout.lines[5].text, "Presented by محمد");
    }

    #[test]
    fn short_lines_keep_their_size() {
        let p = fit(20.0, 300.0);
        assert!((p.size - 20.0).abs() < f32::EPSILON);
        assert!((p.x - (PAGE_WIDTH - 300.0) / 2.0).abs() < 0.001);
    }

    #[test]
    fn long_lines_shrink_to_the_text_width() {
        let p = fit(22.0, 971.3);
        assert!(p.size < 22.0);
        assert!((p.width - TEXT_WIDTH).abs() < 0.001);
        assert!((p.x - (INNER_INSET + TEXT_PADDING)).abs() < 0.001);
    }

    proptest! {
        #[test]
        fn fitted_lines_stay_inside_the_inner_border(
            nominal in 1.0_f32..40.0,
            width in 0.0_f32..5000.0,
        ) {
            let p = fit(nominal, width);
            prop_assert!(p.size <= nominal);
            prop_assert!(p.x >= INNER_INSET);
            prop_assert!(p.x + p.width <= PAGE_WIDTH - INNER_INSET);
        }
    }
}
