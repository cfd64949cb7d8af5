//! Painter's-order primitive lists.
//!
//! Primitives are in world coordinates; [`Frame::transform`] maps them to
//! device pixels. Overlay widths are divided by the zoom so they keep a
//! constant on-screen size.

use crate::grid;
use crate::paths;
use crate::renderer::{GridStyle, RenderContext, Renderer};
use inkboard_core::element::{Element, Payload};
use inkboard_core::geometry::{bounds, is_interactive};
use kurbo::{Affine, BezPath, Point, Rect};
use peniko::Color;

/// Selection outline padding, in screen pixels.
pub const SELECTION_PADDING: f64 = 4.0;
/// Selection outline stroke width, in screen pixels.
pub const SELECTION_STROKE: f64 = 1.5;
/// Selection outline dash length, in screen pixels.
pub const SELECTION_DASH: f64 = 3.0;
const OVERLAY_STROKE: f64 = 1.0;
const TEXT_BOX_DASH: f64 = 4.0;
const ERASING_ALPHA: f32 = 0.3;

pub(crate) fn placeholder_fill() -> Color {
    Color::from_rgba8(241, 243, 245, 255)
}

/// One drawing command.
#[derive(Debug, Clone)]
pub enum Primitive {
    /// Stroked path; `dash` is both the dash and the gap length.
    Stroke { path: BezPath, color: Color, width: f64, dash: Option<f64> },
    Fill { path: BezPath, color: Color },
    /// Styled text block laid out inside `rect`.
    Text { rect: Rect, text: String, color: Color, font_size: f64 },
    /// Opaque stand-in for a host-rendered component.
    Placeholder { rect: Rect, label: String, fill: Color },
    SelectionOutline { rect: Rect, color: Color, width: f64, dash: f64 },
    Marquee { rect: Rect, stroke: Color, fill: Color, width: f64 },
    TextBox { rect: Rect, color: Color, width: f64, dash: f64 },
    GridDots { points: Vec<Point>, radius: f64, color: Color },
}

/// A complete frame ready for a backend.
#[derive(Debug, Clone)]
pub struct Frame {
    /// World to device-pixel transform.
    pub transform: Affine,
    pub background: Color,
    pub primitives: Vec<Primitive>,
}

impl Default for Frame {
    fn default() -> Self {
        Self { transform: Affine::IDENTITY, background: Color::from_rgba8(255, 255, 255, 255), primitives: Vec::new() }
    }
}

/// Append the primitives for one element.
///
/// Elements with non-finite geometry or unreadable data are skipped.
pub fn element_primitives(element: &Element, alpha: f32, out: &mut Vec<Primitive>) {
    if !element.is_finite() {
        log::debug!("skipping element {} with non-finite geometry", element.id);
        return;
    }
    match &element.payload {
        Payload::Drawing(d) => {
            if d.points.is_empty() {
                return;
            }
            out.push(Primitive::Stroke {
                path: paths::smooth_stroke(&d.points, element.origin().to_vec2()),
                color: Color::from(d.color).multiply_alpha(alpha),
                width: d.thickness,
                dash: None,
            });
        }
        Payload::Shape(s) => {
            let color = Color::from(s.color).multiply_alpha(alpha);
            let (outline, head) = paths::shape_paths(element, s);
            out.push(Primitive::Stroke { path: outline, color, width: s.thickness, dash: None });
            if let Some(head) = head {
                out.push(Primitive::Fill { path: head, color });
            }
        }
        Payload::Text(t) => out.push(Primitive::Text {
            rect: bounds(element),
            text: t.text.clone(),
            color: Color::from(t.color).multiply_alpha(alpha),
            font_size: t.font_size,
        }),
        Payload::Component(_) => out.push(Primitive::Placeholder {
            rect: bounds(element),
            label: element.component_type.clone().unwrap_or_default(),
            fill: placeholder_fill().multiply_alpha(alpha),
        }),
        Payload::Invalid(i) => log::debug!("skipping element {} with unreadable data: {}", element.id, i.reason),
    }
}

/// Build the frame for a render context.
///
/// Order: grid, elements by zIndex, active drawing, selection outlines,
/// marquee, text box.
pub fn build_frame(ctx: &RenderContext) -> Frame {
    let zoom = ctx.view.zoom;
    let mut primitives = Vec::new();

    if ctx.grid_style == GridStyle::Dots {
        let visible = ctx.view.visible_world(ctx.viewport_size);
        primitives.extend(grid::grid_dots(visible, zoom));
    }

    for element in &ctx.elements {
        let alpha = if ctx.erasing.contains(&element.id) { ERASING_ALPHA } else { 1.0 };
        element_primitives(element, alpha, &mut primitives);
    }
    if let Some(active) = ctx.active_drawing {
        element_primitives(active, 1.0, &mut primitives);
    }

    let pad = SELECTION_PADDING / zoom;
    for element in ctx.elements.iter().filter(|e| ctx.selected.contains(&e.id)) {
        if !is_interactive(element) {
            continue;
        }
        primitives.push(Primitive::SelectionOutline {
            rect: bounds(element).inflate(pad, pad),
            color: ctx.selection_color,
            width: SELECTION_STROKE / zoom,
            dash: SELECTION_DASH / zoom,
        });
    }

    if let Some(rect) = ctx.selection_rect {
        primitives.push(Primitive::Marquee {
            rect,
            stroke: ctx.selection_color,
            fill: ctx.selection_color.multiply_alpha(0.1),
            width: OVERLAY_STROKE / zoom,
        });
    }
    if let Some(rect) = ctx.text_box {
        primitives.push(Primitive::TextBox {
            rect,
            color: ctx.selection_color,
            width: OVERLAY_STROKE / zoom,
            dash: TEXT_BOX_DASH / zoom,
        });
    }

    Frame {
        transform: Affine::scale(ctx.scale_factor) * ctx.view.transform(),
        background: ctx.background_color,
        primitives,
    }
}

/// Renderer that records each frame as a primitive list.
#[derive(Debug, Default)]
pub struct PrimitiveRenderer {
    frame: Frame,
}

impl PrimitiveRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently built frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn take_frame(&mut self) -> Frame {
        std::mem::take(&mut self.frame)
    }
}

impl Renderer for PrimitiveRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.frame = build_frame(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::element::{DrawingPayload, ShapePayload, TextPayload};
    use inkboard_core::{Engine, Modifiers, MouseButton, ShapeType, ToolKind, ViewState};
    use kurbo::{Size, Vec2};
    use serde_json::Map;

    fn stroke(z: i64) -> Element {
        Element::drawing(
            Point::new(z as f64 * 10.0, 0.0),
            z,
            Payload::Drawing(DrawingPayload {
                points: vec![Point::ZERO, Point::new(5.0, 5.0)],
                color: inkboard_core::Color::black(),
                thickness: 2.0,
            }),
        )
    }

    fn kinds(frame: &Frame) -> Vec<&'static str> {
        frame
            .primitives
            .iter()
            .map(|p| match p {
                Primitive::Stroke { .. } => "stroke",
                Primitive::Fill { .. } => "fill",
                Primitive::Text { .. } => "text",
                Primitive::Placeholder { .. } => "placeholder",
                Primitive::SelectionOutline { .. } => "selection",
                Primitive::Marquee { .. } => "marquee",
                Primitive::TextBox { .. } => "text-box",
                Primitive::GridDots { .. } => "grid",
            })
            .collect()
    }

    #[test]
    fn test_elements_paint_in_z_order() {
        let elements = vec![stroke(3), stroke(1), stroke(2)];
        let ctx = RenderContext::new(&elements, ViewState::default(), Size::new(100.0, 100.0)).with_grid(GridStyle::None);
        let frame = build_frame(&ctx);
        let starts: Vec<f64> = frame
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Stroke { path, .. } => path.elements().first().and_then(|el| el.end_point()).map(|pt| pt.x),
                _ => None,
            })
            .collect();
        assert_eq!(starts, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_overlay_order_and_zoom_scaling() {
        let text = Element::drawing(
            Point::new(0.0, 0.0),
            0,
            Payload::Text(TextPayload { text: "hi".into(), color: inkboard_core::Color::black(), font_size: 16.0 }),
        )
        .with_size(100.0, 40.0);
        let card = Element::component("sticky-note", Point::new(200.0, 0.0), Size::new(50.0, 50.0), 1, Map::new());
        let selected = [text.id];
        let elements = vec![card, text];
        let ctx = RenderContext::new(&elements, ViewState::new(0.0, 0.0, 2.0), Size::new(200.0, 200.0))
            .with_selection(&selected)
            .with_selection_rect(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let frame = build_frame(&ctx);
        assert_eq!(kinds(&frame), vec!["grid", "text", "placeholder", "selection", "marquee"]);

        match &frame.primitives[3] {
            Primitive::SelectionOutline { rect, width, dash, .. } => {
                assert_eq!(*rect, Rect::new(-2.0, -2.0, 102.0, 42.0));
                assert_eq!(*width, 0.75);
                assert_eq!(*dash, 1.5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(frame.transform, Affine::scale(2.0));
    }

    #[test]
    fn test_arrow_gets_filled_head() {
        let arrow = Element::drawing(
            Point::ZERO,
            0,
            Payload::Shape(ShapePayload {
                shape_type: ShapeType::Arrow,
                color: inkboard_core::Color::black(),
                thickness: 2.0,
                end: Vec2::new(40.0, 0.0),
            }),
        );
        let mut out = Vec::new();
        element_primitives(&arrow, 1.0, &mut out);
        assert!(matches!(out.as_slice(), [Primitive::Stroke { .. }, Primitive::Fill { .. }]));
    }

    #[test]
    fn test_non_finite_element_is_skipped() {
        let mut broken = stroke(0);
        broken.x = f64::NAN;
        let mut out = Vec::new();
        element_primitives(&broken, 1.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_engine_preview_and_text_box() {
        let mut engine = Engine::default();
        engine.set_tool(ToolKind::Rectangle);
        engine.pointer_down(Point::new(10.0, 10.0), MouseButton::Left, Modifiers::NONE);
        engine.pointer_move(Point::new(60.0, 40.0));

        let mut renderer = PrimitiveRenderer::new();
        renderer.build_scene(&RenderContext::from_engine(&engine).with_grid(GridStyle::None));
        assert_eq!(kinds(renderer.frame()), vec!["stroke"]);
        engine.pointer_up(Point::new(60.0, 40.0));

        engine.set_tool(ToolKind::Text);
        engine.pointer_down(Point::new(100.0, 100.0), MouseButton::Left, Modifiers::NONE);
        engine.pointer_up(Point::new(120.0, 110.0));
        renderer.build_scene(&RenderContext::from_engine(&engine).with_grid(GridStyle::None));
        let frame = renderer.take_frame();
        assert_eq!(kinds(&frame), vec!["stroke", "text-box"]);
        assert!(renderer.frame().primitives.is_empty());
    }
}
