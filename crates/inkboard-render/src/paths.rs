//! Path construction for element outlines.

use inkboard_core::element::{Element, ShapePayload, ShapeType};
use inkboard_core::geometry::bounds;
use kurbo::{BezPath, Ellipse, Point, Rect, Shape, Vec2};
use std::f64::consts::FRAC_PI_6;

/// Flattening tolerance for curves converted to paths.
const PATH_TOLERANCE: f64 = 0.1;

pub const ARROW_HEAD_MAX: f64 = 16.0;
pub const ARROW_HEAD_RATIO: f64 = 0.3;

/// Smoothed freehand stroke.
///
/// Each interior vertex becomes the control point of a quadratic ending at
/// the midpoint to the next vertex, so joins are eased instead of sharp.
pub fn smooth_stroke(points: &[Point], offset: Vec2) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };
    path.move_to(*first + offset);
    match points.len() {
        // Single dot; round caps make it visible.
        1 => path.line_to(*first + offset),
        2 => path.line_to(points[1] + offset),
        n => {
            for pair in points[1..].windows(2) {
                path.quad_to(pair[0] + offset, pair[0].midpoint(pair[1]) + offset);
            }
            path.line_to(points[n - 1] + offset);
        }
    }
    path
}

/// Triangular arrow head at `end`, or `None` for a zero-length arrow.
pub fn arrow_head(start: Point, end: Point) -> Option<BezPath> {
    let dir = end - start;
    let len = dir.hypot();
    if len <= f64::EPSILON {
        return None;
    }
    let size = ARROW_HEAD_MAX.min(ARROW_HEAD_RATIO * len);
    let angle = dir.atan2();
    let left = end - Vec2::from_angle(angle - FRAC_PI_6) * size;
    let right = end - Vec2::from_angle(angle + FRAC_PI_6) * size;

    let mut head = BezPath::new();
    head.move_to(end);
    head.line_to(left);
    head.line_to(right);
    head.close_path();
    Some(head)
}

/// Stroked outline for a shape element, plus a filled head for arrows.
pub fn shape_paths(element: &Element, shape: &ShapePayload) -> (BezPath, Option<BezPath>) {
    match shape.shape_type {
        ShapeType::Arrow => {
            let start = element.origin();
            let end = start + shape.end;
            let mut shaft = BezPath::new();
            shaft.move_to(start);
            shaft.line_to(end);
            (shaft, arrow_head(start, end))
        }
        ShapeType::Circle => (Ellipse::from_rect(bounds(element)).to_path(PATH_TOLERANCE), None),
        ShapeType::Square | ShapeType::Rectangle => (bounds(element).to_path(PATH_TOLERANCE), None),
    }
}

/// Closed rectangle path.
pub fn rect_path(rect: Rect) -> BezPath {
    rect.to_path(PATH_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{Color, Payload};
    use kurbo::PathEl;

    #[test]
    fn test_smooth_stroke_uses_midpoints() {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let path = smooth_stroke(&points, Vec2::new(5.0, 5.0));
        let els = path.elements();
        assert_eq!(els.len(), 3);
        assert_eq!(els[0], PathEl::MoveTo(Point::new(5.0, 5.0)));
        assert_eq!(els[1], PathEl::QuadTo(Point::new(15.0, 5.0), Point::new(15.0, 10.0)));
        assert_eq!(els[2], PathEl::LineTo(Point::new(15.0, 15.0)));
    }

    #[test]
    fn test_single_point_stroke_is_a_dot() {
        let path = smooth_stroke(&[Point::new(1.0, 2.0)], Vec2::ZERO);
        assert_eq!(path.elements().len(), 2);
        assert!(smooth_stroke(&[], Vec2::ZERO).elements().is_empty());
    }

    #[test]
    fn test_arrow_head_size() {
        let head = arrow_head(Point::ZERO, Point::new(100.0, 0.0)).unwrap();
        let b = head.bounding_box();
        assert!((b.x0 - (100.0 - 16.0 * FRAC_PI_6.cos())).abs() < 1e-9);
        assert!((b.height() - 16.0).abs() < 1e-9);

        // Short arrows get a proportional head.
        let short = arrow_head(Point::ZERO, Point::new(20.0, 0.0)).unwrap();
        assert!((short.bounding_box().height() - 6.0).abs() < 1e-9);
        assert!(arrow_head(Point::ZERO, Point::ZERO).is_none());
    }

    #[test]
    fn test_circle_path_fits_box() {
        let circle = Element::drawing(
            Point::new(10.0, 10.0),
            0,
            Payload::Shape(ShapePayload {
                shape_type: ShapeType::Circle,
                color: Color::black(),
                thickness: 2.0,
                end: Vec2::ZERO,
            }),
        )
        .with_size(40.0, 20.0);
        let Payload::Shape(shape) = &circle.payload else { unreachable!() };
        let (outline, head) = shape_paths(&circle, shape);
        assert!(head.is_none());
        let b = outline.bounding_box();
        assert!((b.x0 - 10.0).abs() < 1e-6 && (b.x1 - 50.0).abs() < 1e-6);
        assert!((b.y0 - 10.0).abs() < 1e-6 && (b.y1 - 30.0).abs() < 1e-6);
    }
}
