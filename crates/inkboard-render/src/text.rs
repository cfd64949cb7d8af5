//! Glyph outlines for backends without a text engine.
//!
//! Text is laid out with the bundled DejaVu Sans face and returned as
//! world-space paths, so the bitmap export can fill it like any other shape.

use kurbo::{Affine, BezPath, Point, Shape, Vec2};
use rusttype::{Font, OutlineBuilder, Scale, point};
use std::sync::OnceLock;

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Baseline-to-baseline distance as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

fn font() -> Option<&'static Font<'static>> {
    static FONT: OnceLock<Option<Font<'static>>> = OnceLock::new();
    FONT.get_or_init(|| {
        let font = Font::try_from_bytes(DEJAVU_SANS);
        if font.is_none() {
            log::error!("bundled font could not be parsed; text will not rasterize");
        }
        font
    })
    .as_ref()
}

/// Scale whose em square is `font_size`, matching CSS `font-size`.
fn em_scale(font: &Font<'_>, font_size: f64) -> Scale {
    let metrics = font.v_metrics_unscaled();
    let em = f32::from(font.units_per_em().max(1));
    Scale::uniform(font_size as f32 * (metrics.ascent - metrics.descent) / em)
}

/// Collects glyph outlines into a kurbo path, offset to the glyph's pen position.
#[derive(Default)]
struct PathSink {
    path: BezPath,
    offset: Vec2,
}

impl PathSink {
    fn at(&self, x: f32, y: f32) -> Point {
        Point::new(f64::from(x), f64::from(y)) + self.offset
    }
}

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.at(x, y);
        self.path.move_to(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.at(x, y);
        self.path.line_to(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (c, p) = (self.at(x1, y1), self.at(x, y));
        self.path.quad_to(c, p);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1, c2, p) = (self.at(x1, y1), self.at(x2, y2), self.at(x, y));
        self.path.curve_to(c1, c2, p);
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

/// Outline of `text`, one line per `\n`, with the first baseline one
/// `font_size` below `top_left`.
///
/// Returns `None` for blank text, a non-positive size, or a missing font.
pub fn text_outline(text: &str, top_left: Point, font_size: f64) -> Option<BezPath> {
    if !(font_size.is_finite() && font_size > 0.0) {
        return None;
    }
    let font = font()?;
    let scale = em_scale(font, font_size);
    let mut sink = PathSink::default();
    for (i, line) in text.lines().enumerate() {
        let baseline = top_left.y + font_size + i as f64 * font_size * LINE_HEIGHT;
        for glyph in font.layout(line, scale, point(top_left.x as f32, baseline as f32)) {
            let pen = glyph.position();
            sink.offset = Vec2::new(f64::from(pen.x), f64::from(pen.y));
            glyph.unpositioned().build_outline(&mut sink);
        }
    }
    (!sink.path.elements().is_empty()).then_some(sink.path)
}

/// Single-line label centred on `center`.
pub fn centered_label(label: &str, center: Point, font_size: f64) -> Option<BezPath> {
    let mut path = text_outline(label, Point::ZERO, font_size)?;
    let ink = path.bounding_box();
    path.apply_affine(Affine::translate(center - ink.center()));
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_sits_below_top_left() {
        let path = text_outline("Hi", Point::new(10.0, 20.0), 20.0).unwrap();
        let ink = path.bounding_box();
        assert!(ink.x0 >= 10.0);
        // Cap height is under the font size; nothing of "Hi" descends.
        assert!(ink.y0 > 20.0);
        assert!(ink.y1 <= 40.5);
        assert!(ink.width() > 10.0);
    }

    #[test]
    fn test_lines_stack_downwards() {
        let one = text_outline("A", Point::ZERO, 10.0).unwrap().bounding_box();
        let two = text_outline("A\nA", Point::ZERO, 10.0).unwrap().bounding_box();
        assert!((two.y1 - one.y1 - 12.0).abs() < 0.5);
    }

    #[test]
    fn test_blank_or_degenerate_text_has_no_outline() {
        assert!(text_outline("", Point::ZERO, 12.0).is_none());
        assert!(text_outline("   ", Point::ZERO, 12.0).is_none());
        assert!(text_outline("x", Point::ZERO, 0.0).is_none());
        assert!(text_outline("x", Point::ZERO, f64::NAN).is_none());
    }

    #[test]
    fn test_label_is_centered() {
        let ink = centered_label("note", Point::new(50.0, 50.0), 12.0).unwrap().bounding_box();
        assert!((ink.center().x - 50.0).abs() < 1e-6);
        assert!((ink.center().y - 50.0).abs() < 1e-6);
    }
}
