//! One-shot SVG and PNG export of a board or a selection.
//!
//! Both paths compute the padded union of the exported elements' bounds and
//! draw the same primitives the live frame uses. The bitmap path fills glyph
//! outlines from the bundled font, so its text matches the SVG layout.

use crate::frame::{Frame, Primitive, element_primitives};
use crate::paths::rect_path;
use crate::text::{LINE_HEIGHT, centered_label, text_outline};
use inkboard_core::element::{Element, ElementId};
use inkboard_core::geometry::union_bounds;
use kurbo::{Affine, BezPath, PathEl, Rect, Size};
use peniko::Color;
use std::fmt::Write as _;
use thiserror::Error;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

/// Padding around the exported content, in world units.
pub const EXPORT_PADDING: f64 = 20.0;
/// Default bitmap scale.
pub const EXPORT_SCALE: f64 = 2.0;
/// Largest bitmap edge we are willing to allocate.
const MAX_EXPORT_DIMENSION: u32 = 16_384;
/// Component placeholder label size, in world units.
const LABEL_FONT_SIZE: f64 = 12.0;

fn label_color() -> Color {
    Color::from_rgba8(134, 142, 150, 255)
}

fn placeholder_border() -> Color {
    Color::from_rgba8(206, 212, 218, 255)
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,
    #[error("rasterization failed: {0}")]
    Raster(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("SVG formatting failed")]
    Svg(#[from] std::fmt::Error),
}

/// Elements to export in paint order: the selection if given, else all.
fn export_set<'a>(elements: &'a [Element], selection: Option<&[ElementId]>) -> Vec<&'a Element> {
    let mut set: Vec<&Element> = elements
        .iter()
        .filter(|e| e.is_finite() && selection.is_none_or(|ids| ids.contains(&e.id)))
        .collect();
    set.sort_by_key(|e| e.z_index);
    set
}

/// Build an export frame and its world-space viewport.
///
/// The frame transform maps the padded viewport onto a bitmap at `scale`.
pub fn export_frame(
    elements: &[Element],
    selection: Option<&[ElementId]>,
    padding: f64,
    scale: f64,
) -> Result<(Frame, Rect), ExportError> {
    let set = export_set(elements, selection);
    let content = union_bounds(set.iter().copied()).ok_or(ExportError::Empty)?;
    let viewport = content.inflate(padding, padding);

    let mut primitives = Vec::new();
    for element in &set {
        element_primitives(element, 1.0, &mut primitives);
    }
    let frame = Frame {
        transform: Affine::scale(scale) * Affine::translate(-viewport.origin().to_vec2()),
        background: Color::from_rgba8(255, 255, 255, 255),
        primitives,
    };
    Ok((frame, viewport))
}

// --- SVG ---

/// Export as a standalone SVG document in world units.
pub fn export_svg(elements: &[Element], selection: Option<&[ElementId]>, padding: f64) -> Result<String, ExportError> {
    let (frame, viewport) = export_frame(elements, selection, padding, 1.0)?;
    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}">"#,
        x = viewport.x0,
        y = viewport.y0,
        w = viewport.width(),
        h = viewport.height(),
    )?;
    writeln!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
        viewport.x0,
        viewport.y0,
        viewport.width(),
        viewport.height(),
        svg_color(frame.background).0,
    )?;
    for primitive in &frame.primitives {
        write_svg_primitive(&mut svg, primitive)?;
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Hex color and opacity for SVG attributes.
fn svg_color(color: Color) -> (String, f32) {
    let c = color.to_rgba8();
    (format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b), f32::from(c.a) / 255.0)
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn write_stroke(svg: &mut String, d: &str, color: Color, width: f64, dash: Option<f64>) -> std::fmt::Result {
    let (hex, opacity) = svg_color(color);
    write!(
        svg,
        r#"<path d="{d}" fill="none" stroke="{hex}" stroke-opacity="{opacity}" stroke-width="{width}" stroke-linecap="round" stroke-linejoin="round""#
    )?;
    if let Some(dash) = dash {
        write!(svg, r#" stroke-dasharray="{dash} {dash}""#)?;
    }
    svg.push_str("/>\n");
    Ok(())
}

fn write_svg_primitive(svg: &mut String, primitive: &Primitive) -> std::fmt::Result {
    match primitive {
        Primitive::Stroke { path, color, width, dash } => write_stroke(svg, &path.to_svg(), *color, *width, *dash),
        Primitive::Fill { path, color } => {
            let (hex, opacity) = svg_color(*color);
            writeln!(svg, r#"<path d="{}" fill="{hex}" fill-opacity="{opacity}"/>"#, path.to_svg())
        }
        Primitive::Text { rect, text, color, font_size } => {
            let (hex, opacity) = svg_color(*color);
            write!(
                svg,
                r#"<text x="{}" y="{}" font-family="sans-serif" font-size="{font_size}" fill="{hex}" fill-opacity="{opacity}">"#,
                rect.x0, rect.y0,
            )?;
            for (i, line) in text.lines().enumerate() {
                let dy = if i == 0 { *font_size } else { font_size * LINE_HEIGHT };
                write!(svg, r#"<tspan x="{}" dy="{dy}">{}</tspan>"#, rect.x0, xml_escape(line))?;
            }
            svg.push_str("</text>\n");
            Ok(())
        }
        Primitive::Placeholder { rect, label, fill } => {
            let (hex, _) = svg_color(*fill);
            let (border, _) = svg_color(placeholder_border());
            writeln!(
                svg,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{hex}" stroke="{border}"/>"#,
                rect.x0,
                rect.y0,
                rect.width(),
                rect.height(),
            )?;
            let center = rect.center();
            let (label_hex, _) = svg_color(label_color());
            writeln!(
                svg,
                r#"<text x="{}" y="{}" font-family="sans-serif" font-size="{LABEL_FONT_SIZE}" fill="{label_hex}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
                center.x,
                center.y,
                xml_escape(label),
            )
        }
        Primitive::SelectionOutline { rect, color, width, dash } | Primitive::TextBox { rect, color, width, dash } => {
            write_stroke(svg, &rect_path(*rect).to_svg(), *color, *width, Some(*dash))
        }
        Primitive::Marquee { rect, stroke, fill, width } => {
            let (fill_hex, fill_opacity) = svg_color(*fill);
            writeln!(
                svg,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill_hex}" fill-opacity="{fill_opacity}"/>"#,
                rect.x0,
                rect.y0,
                rect.width(),
                rect.height(),
            )?;
            write_stroke(svg, &rect_path(*rect).to_svg(), *stroke, *width, None)
        }
        Primitive::GridDots { points, radius, color } => {
            let (hex, opacity) = svg_color(*color);
            for p in points {
                writeln!(svg, r#"<circle cx="{}" cy="{}" r="{radius}" fill="{hex}" fill-opacity="{opacity}"/>"#, p.x, p.y)?;
            }
            Ok(())
        }
    }
}

// --- PNG ---

/// Export as PNG bytes rasterized at `scale` pixels per world unit.
pub fn export_png(elements: &[Element], selection: Option<&[ElementId]>, scale: f64) -> Result<Vec<u8>, ExportError> {
    let (frame, viewport) = export_frame(elements, selection, EXPORT_PADDING, scale)?;
    let size = Size::new((viewport.width() * scale).ceil(), (viewport.height() * scale).ceil());
    let pixmap = rasterize(&frame, size)?;

    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let png_data = encode_png(&rgba, pixmap.width(), pixmap.height())?;
    log::info!("PNG export complete: {} bytes", png_data.len());
    Ok(png_data)
}

/// Draw a frame onto a new pixmap of the given pixel size.
pub fn rasterize(frame: &Frame, size: Size) -> Result<Pixmap, ExportError> {
    if !(size.width >= 1.0 && size.height >= 1.0) {
        return Err(ExportError::Raster(format!("invalid bitmap size {}x{}", size.width, size.height)));
    }
    let (width, height) = (size.width as u32, size.height as u32);
    if width > MAX_EXPORT_DIMENSION || height > MAX_EXPORT_DIMENSION {
        return Err(ExportError::Raster(format!(
            "{width}x{height} exceeds the {MAX_EXPORT_DIMENSION}px limit"
        )));
    }
    let mut pixmap =
        Pixmap::new(width, height).ok_or_else(|| ExportError::Raster(format!("cannot allocate {width}x{height}")))?;
    pixmap.fill(skia_color(frame.background));

    let [a, b, c, d, e, f] = frame.transform.as_coeffs();
    let transform = Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32);
    for primitive in &frame.primitives {
        draw_primitive(&mut pixmap, primitive, transform);
    }
    Ok(pixmap)
}

fn skia_color(color: Color) -> tiny_skia::Color {
    let c = color.to_rgba8();
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => {
                pb.cubic_to(c1.x as f32, c1.y as f32, c2.x as f32, c2.y as f32, p.x as f32, p.y as f32)
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn stroke_style(width: f64, dash: Option<f64>) -> Stroke {
    Stroke {
        width: width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        dash: dash.and_then(|d| StrokeDash::new(vec![d as f32, d as f32], 0.0)),
        ..Default::default()
    }
}

fn stroke_bez(pixmap: &mut Pixmap, path: &BezPath, color: Color, width: f64, dash: Option<f64>, transform: Transform) {
    if let Some(path) = skia_path(path) {
        pixmap.stroke_path(&path, &paint(color), &stroke_style(width, dash), transform, None);
    }
}

fn fill_bez(pixmap: &mut Pixmap, path: &BezPath, color: Color, transform: Transform) {
    if let Some(path) = skia_path(path) {
        pixmap.fill_path(&path, &paint(color), FillRule::Winding, transform, None);
    }
}

fn draw_primitive(pixmap: &mut Pixmap, primitive: &Primitive, transform: Transform) {
    match primitive {
        Primitive::Stroke { path, color, width, dash } => stroke_bez(pixmap, path, *color, *width, *dash, transform),
        Primitive::Fill { path, color } => fill_bez(pixmap, path, *color, transform),
        Primitive::Text { rect, text, color, font_size } => {
            if let Some(glyphs) = text_outline(text, rect.origin(), *font_size) {
                fill_bez(pixmap, &glyphs, *color, transform);
            }
        }
        Primitive::Placeholder { rect, label, fill } => {
            let outline = rect_path(*rect);
            fill_bez(pixmap, &outline, *fill, transform);
            stroke_bez(pixmap, &outline, placeholder_border(), 1.0, None, transform);
            if let Some(glyphs) = centered_label(label, rect.center(), LABEL_FONT_SIZE) {
                fill_bez(pixmap, &glyphs, label_color(), transform);
            }
        }
        Primitive::SelectionOutline { rect, color, width, dash } | Primitive::TextBox { rect, color, width, dash } => {
            stroke_bez(pixmap, &rect_path(*rect), *color, *width, Some(*dash), transform);
        }
        Primitive::Marquee { rect, stroke, fill, width } => {
            let outline = rect_path(*rect);
            fill_bez(pixmap, &outline, *fill, transform);
            stroke_bez(pixmap, &outline, *stroke, *width, None, transform);
        }
        Primitive::GridDots { points, radius, color } => {
            let paint = paint(*color);
            for p in points {
                if let Some(dot) = PathBuilder::from_circle(p.x as f32, p.y as f32, *radius as f32) {
                    pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
                }
            }
        }
    }
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba_data)?;
        writer.finish()?;
    }
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::element::{Payload, ShapePayload, ShapeType, TextPayload};
    use kurbo::{Point, Vec2};
    use serde_json::Map;

    fn rectangle() -> Element {
        Element::drawing(
            Point::ZERO,
            0,
            Payload::Shape(ShapePayload {
                shape_type: ShapeType::Rectangle,
                color: inkboard_core::Color::black(),
                thickness: 2.0,
                end: Vec2::ZERO,
            }),
        )
        .with_size(100.0, 50.0)
    }

    #[test]
    fn test_empty_board_is_an_error() {
        assert!(matches!(export_png(&[], None, EXPORT_SCALE), Err(ExportError::Empty)));
        let elements = vec![rectangle()];
        assert!(matches!(export_svg(&elements, Some(&[][..]), EXPORT_PADDING), Err(ExportError::Empty)));
    }

    #[test]
    fn test_png_is_padded_and_scaled() {
        let elements = vec![rectangle()];
        let bytes = export_png(&elements, None, EXPORT_SCALE).unwrap();
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 280);
        assert_eq!(reader.info().height, 180);
    }

    #[test]
    fn test_rasterized_stroke_and_background() {
        let elements = vec![rectangle()];
        let (frame, viewport) = export_frame(&elements, None, EXPORT_PADDING, 2.0).unwrap();
        assert_eq!(viewport, Rect::new(-20.0, -20.0, 120.0, 70.0));
        let pixmap = rasterize(&frame, Size::new(280.0, 180.0)).unwrap();

        let corner = pixmap.pixel(2, 2).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));
        // Left edge of the rectangle at world (0, 25).
        let edge = pixmap.pixel(40, 90).unwrap();
        assert!(edge.red() < 128);
    }

    #[test]
    fn test_rasterized_text_draws_glyphs() {
        let note = Element::drawing(
            Point::ZERO,
            0,
            Payload::Text(TextPayload { text: "HHHH".into(), color: inkboard_core::Color::black(), font_size: 32.0 }),
        )
        .with_size(120.0, 40.0);
        let (frame, viewport) = export_frame(&[note], None, 0.0, 1.0).unwrap();
        assert_eq!(viewport, Rect::new(0.0, 0.0, 120.0, 40.0));
        let pixmap = rasterize(&frame, Size::new(120.0, 40.0)).unwrap();

        let dark = pixmap.pixels().iter().filter(|p| p.demultiply().red() < 64).count();
        assert!(dark > 100, "expected glyph pixels, found {dark}");
        // Nothing is drawn along the box edge.
        assert!((0..120).all(|x| pixmap.pixel(x, 0).unwrap().red() == 255));
    }

    #[test]
    fn test_rasterized_placeholder_has_label() {
        let card = Element::component("sticky-note", Point::ZERO, Size::new(120.0, 60.0), 0, Map::new());
        let blank = Element::component("", Point::ZERO, Size::new(120.0, 60.0), 0, Map::new());
        let count_ink = |element: Element| {
            let (frame, _) = export_frame(&[element], None, 0.0, 1.0).unwrap();
            let pixmap = rasterize(&frame, Size::new(120.0, 60.0)).unwrap();
            pixmap.pixels()[(10 * 120)..(50 * 120)].iter().filter(|p| p.demultiply().red() < 230).count()
        };
        assert!(count_ink(card) > count_ink(blank));
    }

    #[test]
    fn test_svg_selection_and_escaping() {
        let note = Element::drawing(
            Point::new(300.0, 300.0),
            1,
            Payload::Text(TextPayload { text: "a < b".into(), color: inkboard_core::Color::black(), font_size: 16.0 }),
        )
        .with_size(100.0, 40.0);
        let card = Element::component("sticky-note", Point::new(0.0, 0.0), Size::new(50.0, 50.0), 2, Map::new());
        let ids = [note.id];
        let elements = vec![rectangle(), note, card];

        let svg = export_svg(&elements, Some(&ids[..]), 10.0).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="290 290 120 60""#));
        assert!(svg.contains("a &lt; b"));
        assert!(!svg.contains("<path"));
        assert!(!svg.contains("sticky-note"));

        let all = export_svg(&elements, None, 10.0).unwrap();
        assert!(all.contains("<path"));
        assert!(all.contains("sticky-note"));
    }
}
