use std::fmt::Write;

use qrcode::{Color, EcLevel, QrCode};

use crate::error::RenderError;

/// Modules of light border required around a QR symbol.
pub const QUIET_ZONE: usize = 4;

/// A QR symbol as a square grid of dark and light modules.
///
/// The grid excludes the quiet zone; [`QUIET_ZONE`] modules of light
/// border must be left around it when drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    /// Encode `payload` at error-correction level M.
    pub fn encode(payload: &str) -> Result<Self, RenderError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| RenderError::Qr(e.to_string()))?;
        let width = code.width();
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self { width, dark })
    }

    /// Number of modules per side, without the quiet zone.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of modules per side including the quiet zone on both sides.
    pub fn width_with_quiet_zone(&self) -> usize {
        self.width + 2 * QUIET_ZONE
    }

    /// Whether the module at column `x`, row `y` is dark. Out-of-range
    /// coordinates are light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }

    /// Horizontal runs of dark modules as `(row, first_column, length)`,
    /// top row first.
    pub fn dark_runs(&self) -> Vec<(usize, usize, usize)> {
        let mut runs = Vec::new();
        for y in 0..self.width {
            let mut x = 0;
            while x < self.width {
                if self.is_dark(x, y) {
                    let start = x;
                    while x < self.width && self.is_dark(x, y) {
                        x += 1;
                    }
                    runs.push((y, start, x - start));
                } else {
                    x += 1;
                }
            }
        }
        runs
    }

    /// Render as a standalone SVG document, `module_px` pixels per module.
    ///
    /// Used for registration posters where a PDF is not wanted.
    pub fn to_svg(&self, module_px: usize) -> String {
        let size = self.width_with_quiet_zone() * module_px;
        let mut path = String::new();
        for (y, x, len) in self.dark_runs() {
            let _ = write!(
                path,
                "M{},{}h{}v{}h-{}z",
                (x + QUIET_ZONE) * module_px,
                (y + QUIET_ZONE) * module_px,
                len * module_px,
                module_px,
                len * module_px
            );
        }
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" \
             viewBox=\"0 0 {size} {size}\"><rect width=\"100%\" height=\"100%\" fill=\"#fff\"/>\
             <path fill=\"#000\" d=\"{path}\"/></svg>"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:3000/verify/0123456789abcdef0123456789abcdef";

    #[test]
    fn encodes_verification_url() {
        let qr = QrMatrix::encode(URL).unwrap();
        // Versions are 21 + 4k modules wide.
        assert!(qr.width() >= 21);
        assert_eq!((qr.width() - 21) % 4, 0);
        assert_eq!(qr.width_with_quiet_zone(), qr.width() + 8);
    }

    #[test]
    fn finder_patterns_are_dark() {
        let qr = QrMatrix::encode(URL).unwrap();
        let w = qr.width();
        for (x, y) in [(0, 0), (w - 1, 0), (0, w - 1), (3, 3), (w - 4, 3)] {
            assert!(qr.is_dark(x, y), "module ({x}, {y}) should be dark");
        }
        assert!(!qr.is_dark(w, 0));
    }

    #[test]
    fn deterministic() {
        assert_eq!(QrMatrix::encode(URL).unwrap(), QrMatrix::encode(URL).unwrap());
    }

    #[test]
    fn runs_cover_exactly_the_dark_modules() {
        let qr = QrMatrix::encode(URL).unwrap();
        let from_runs: usize = qr.dark_runs().iter().map(|(_, _, len)| len).sum();
        let mut direct = 0;
        for y in 0..qr.width() {
            for x in 0..qr.width() {
                if qr.is_dark(x, y) {
                    direct += 1;
                }
            }
        }
        assert_eq!(from_runs, direct);
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let huge = "x".repeat(8000);
        assert!(matches!(QrMatrix::encode(&huge), Err(RenderError::Qr(_))));
    }

    #[test]
    fn svg_has_square_viewbox() {
        let svg = QrMatrix::encode(URL).unwrap().to_svg(4);
        assert!(svg.starts_with("<svg"));
        let size = QrMatrix::encode(URL).unwrap().width_with_quiet_zone() * 4;
        assert!(svg.contains(&format!("viewBox=\"0 0 {size} {size}\"")));
    }
}
