//! Corner-handle resize.

use super::Engine;
use super::gesture::ActiveGesture;
use crate::element::{Element, ElementId, Payload, ShapeType};
use crate::geometry::{bounds, is_interactive};
use crate::selection::ResizeHandle;
use kurbo::{Point, Rect, Vec2};
use log::warn;

impl Engine {
    /// Start resizing `id` from `handle`, e.g. after the host hit a handle
    /// reported by [`Engine::handle_at`]. Returns false if rejected.
    pub fn begin_resize(&mut self, id: ElementId, handle: ResizeHandle) -> bool {
        if self.is_busy() {
            warn!("resize ignored: another gesture is active");
            return false;
        }
        let Some(element) = self.history.element(id) else {
            return false;
        };
        if !is_interactive(element) {
            return false;
        }
        self.gesture = ActiveGesture::Resizing {
            original_bounds: bounds(element),
            original: element.clone(),
            handle,
        };
        true
    }
}

/// New bounds with the corner opposite `handle` fixed and the moving corner at
/// `pointer`, at least `min` wide and tall. The moving edge is clamped; the
/// fixed corner never moves.
pub(super) fn resized_bounds(original: Rect, handle: ResizeHandle, pointer: Point, min: f64) -> Rect {
    let fixed = handle.opposite().position(original);
    let (x0, x1) = if handle.moves_right() {
        (fixed.x, pointer.x.max(fixed.x + min))
    } else {
        (pointer.x.min(fixed.x - min), fixed.x)
    };
    let (y0, y1) = if handle.moves_bottom() {
        (fixed.y, pointer.y.max(fixed.y + min))
    } else {
        (pointer.y.min(fixed.y - min), fixed.y)
    };
    Rect::new(x0, y0, x1, y1)
}

/// Map `original`, whose bounds are `from`, onto the box `to`.
///
/// Strokes and arrow endpoints are scaled about the element origin; boxed
/// elements take the new box directly.
pub(super) fn apply_resize(original: &Element, from: Rect, to: Rect) -> Element {
    // Stroke bounds include half the thickness, which does not scale.
    let padded = matches!(&original.payload, Payload::Drawing(_))
        || matches!(&original.payload, Payload::Shape(s) if s.shape_type == ShapeType::Arrow);
    let half = if padded { original.payload.thickness().map_or(0.0, |t| t.max(0.0) / 2.0) } else { 0.0 };
    let (from, to) = (deflate(from, half), deflate(to, half));
    let factor = |new: f64, old: f64| if old == 0.0 { 1.0 } else { new / old };
    let scale = Vec2::new(factor(to.width(), from.width()), factor(to.height(), from.height()));
    let map = |p: Point| {
        Point::new(
            to.x0 + (p.x - from.x0) * scale.x,
            to.y0 + (p.y - from.y0) * scale.y,
        )
    };

    let mut element = original.clone();
    match &mut element.payload {
        Payload::Drawing(d) => {
            for p in d.points.iter_mut() {
                *p = Point::new(p.x * scale.x, p.y * scale.y);
            }
            let origin = map(original.origin());
            element.set_origin(origin);
        }
        Payload::Shape(s) if s.shape_type == ShapeType::Arrow => {
            s.end = Vec2::new(s.end.x * scale.x, s.end.y * scale.y);
            let (w, h) = (s.end.x.abs(), s.end.y.abs());
            element.set_origin(map(original.origin()));
            element.width = Some(w);
            element.height = Some(h);
        }
        Payload::Invalid(_) => {}
        Payload::Shape(_) | Payload::Text(_) | Payload::Component(_) => {
            element.set_origin(to.origin());
            element.width = Some(to.width());
            element.height = Some(to.height());
        }
    }
    element
}

/// Shrink a box by `by` on every side, collapsing rather than inverting.
fn deflate(rect: Rect, by: f64) -> Rect {
    let x0 = rect.x0 + by;
    let y0 = rect.y0 + by;
    Rect::new(x0, y0, (rect.x1 - by).max(x0), (rect.y1 - by).max(y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Color, DrawingPayload, ShapePayload};
    use crate::input::{Modifiers, MouseButton};
    use crate::view::ViewState;
    use kurbo::Size;

    fn square(origin: Point, side: f64) -> Element {
        Element::drawing(
            origin,
            0,
            Payload::Shape(ShapePayload {
                shape_type: ShapeType::Square,
                color: Color::black(),
                thickness: 2.0,
                end: Vec2::ZERO,
            }),
        )
        .with_size(side, side)
    }

    #[test]
    fn test_minimum_size_anchored_top_left() {
        let from = Rect::new(0.0, 0.0, 40.0, 40.0);
        let to = resized_bounds(from, ResizeHandle::BottomRight, Point::new(5.0, 5.0), 20.0);
        assert_eq!(to, Rect::new(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_top_left_handle_keeps_bottom_right() {
        let from = Rect::new(0.0, 0.0, 40.0, 40.0);
        let to = resized_bounds(from, ResizeHandle::TopLeft, Point::new(-10.0, 35.0), 20.0);
        assert_eq!(to, Rect::new(-10.0, 20.0, 40.0, 40.0));
    }

    #[test]
    fn test_stroke_points_scale_about_origin() {
        let stroke = Element::drawing(
            Point::new(10.0, 10.0),
            0,
            Payload::Drawing(DrawingPayload {
                points: vec![Point::ZERO, Point::new(20.0, 10.0)],
                color: Color::black(),
                thickness: 0.0,
            }),
        );
        let from = bounds(&stroke);
        let resized = apply_resize(&stroke, from, Rect::new(10.0, 10.0, 50.0, 30.0));
        assert_eq!(resized.origin(), Point::new(10.0, 10.0));
        match &resized.payload {
            Payload::Drawing(d) => assert_eq!(d.points, vec![Point::ZERO, Point::new(40.0, 20.0)]),
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(bounds(&resized), Rect::new(10.0, 10.0, 50.0, 30.0));
    }

    #[test]
    fn test_thick_stroke_meets_minimum_exactly() {
        let stroke = Element::drawing(
            Point::ZERO,
            0,
            Payload::Drawing(DrawingPayload {
                points: vec![Point::ZERO, Point::new(40.0, 40.0)],
                color: Color::black(),
                thickness: 4.0,
            }),
        );
        let from = bounds(&stroke);
        assert_eq!(from, Rect::new(-2.0, -2.0, 42.0, 42.0));
        let to = resized_bounds(from, ResizeHandle::BottomRight, Point::ZERO, 20.0);
        let after = bounds(&apply_resize(&stroke, from, to));
        assert!((after.width() - 20.0).abs() < 1e-9);
        assert!((after.height() - 20.0).abs() < 1e-9);
        assert_eq!(after.origin(), Point::new(-2.0, -2.0));
    }

    #[test]
    fn test_zero_dimension_keeps_factor_one() {
        let stroke = Element::drawing(
            Point::ZERO,
            0,
            Payload::Drawing(DrawingPayload {
                points: vec![Point::ZERO, Point::new(30.0, 0.0)],
                color: Color::black(),
                thickness: 0.0,
            }),
        );
        let from = Rect::new(0.0, 0.0, 30.0, 0.0);
        let resized = apply_resize(&stroke, from, Rect::new(0.0, 0.0, 60.0, 20.0));
        match &resized.payload {
            Payload::Drawing(d) => assert_eq!(d.points[1], Point::new(60.0, 0.0)),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_resize_gesture_records_update() {
        let mut engine = Engine::default();
        let el = square(Point::ZERO, 40.0);
        let id = el.id;
        engine.load_document(vec![el.clone()], ViewState::default());

        assert!(engine.begin_resize(id, ResizeHandle::BottomRight));
        assert_eq!(engine.resizing_id(), Some(id));
        assert!(!engine.pointer_down(Point::ZERO, MouseButton::Left, Modifiers::NONE));
        engine.pointer_move(Point::new(5.0, 5.0));
        engine.pointer_up(Point::new(5.0, 5.0));

        let resized = engine.element(id).unwrap();
        assert_eq!(resized.origin(), Point::ZERO);
        assert_eq!(resized.size(), Size::new(20.0, 20.0));
        assert_eq!(engine.history().undo_len(), 1);
        engine.undo();
        assert_eq!(engine.element(id), Some(&el));
    }

    #[test]
    fn test_resize_without_change_records_nothing() {
        let mut engine = Engine::default();
        let el = square(Point::ZERO, 40.0);
        engine.load_document(vec![el.clone()], ViewState::default());
        engine.begin_resize(el.id, ResizeHandle::BottomRight);
        engine.pointer_up(Point::new(40.0, 40.0));
        assert!(!engine.history().can_undo());
    }

    #[test]
    fn test_arrow_endpoint_scales() {
        let arrow = Element::drawing(
            Point::new(100.0, 0.0),
            0,
            Payload::Shape(ShapePayload {
                shape_type: ShapeType::Arrow,
                color: Color::black(),
                thickness: 0.0,
                end: Vec2::new(-100.0, 50.0),
            }),
        )
        .with_size(100.0, 50.0);
        let from = bounds(&arrow);
        let resized = apply_resize(&arrow, from, Rect::new(0.0, 0.0, 200.0, 25.0));
        assert_eq!(resized.origin(), Point::new(200.0, 0.0));
        match &resized.payload {
            Payload::Shape(s) => assert_eq!(s.end, Vec2::new(-200.0, 25.0)),
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
