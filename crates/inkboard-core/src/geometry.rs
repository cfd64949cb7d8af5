//! Bounds and hit-testing for board elements.
//!
//! All functions are pure and operate in world coordinates. Tolerances are
//! world units; callers divide screen tolerances by the zoom factor.

use crate::element::{Element, Payload, ShapeType};
use kurbo::{Point, Rect, Vec2};

/// Number of segments used to approximate a circle outline for sweeps.
const ELLIPSE_SEGMENTS: usize = 48;

/// Minimum estimated text width.
const MIN_TEXT_WIDTH: f64 = 20.0;

/// Build a rect from two arbitrary corners.
pub fn normalized_rect(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Axis-aligned bounding box in world coordinates.
///
/// Elements with non-finite geometry or unreadable data yield a zero-area
/// box at the origin.
pub fn bounds(element: &Element) -> Rect {
    if !element.is_finite() {
        return Rect::ZERO;
    }
    let origin = element.origin();
    match &element.payload {
        Payload::Drawing(d) => {
            let Some(first) = d.points.first() else {
                return Rect::from_points(origin, origin);
            };
            let mut rect = Rect::from_points(*first, *first);
            for p in &d.points[1..] {
                rect = rect.union_pt(*p);
            }
            let half = d.thickness.max(0.0) / 2.0;
            (rect + origin.to_vec2()).inflate(half, half)
        }
        Payload::Shape(s) if s.shape_type == ShapeType::Arrow => {
            let half = s.thickness.max(0.0) / 2.0;
            normalized_rect(origin, origin + s.end).inflate(half, half)
        }
        Payload::Shape(_) | Payload::Component(_) => box_rect(element),
        Payload::Text(t) => {
            let width = element
                .width
                .unwrap_or_else(|| MIN_TEXT_WIDTH.max(t.text.chars().count() as f64 * t.font_size * 0.6));
            let height = element.height.unwrap_or(t.font_size * 1.4);
            normalized_rect(origin, origin + Vec2::new(width, height))
        }
        Payload::Invalid(_) => Rect::ZERO,
    }
}

/// The raw `{x, y, width, height}` box of an element.
fn box_rect(element: &Element) -> Rect {
    let size = element.size();
    normalized_rect(element.origin(), element.origin() + Vec2::new(size.width, size.height))
}

/// Zero-area elements are drawn and iterated but never hit or selected.
pub fn is_interactive(element: &Element) -> bool {
    !bounds(element).is_zero_area()
}

/// Inclusive point-in-rect test.
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Strict AABB overlap.
pub fn rect_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Test if two line segments (a-b) and (c-d) intersect.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| -> f64 { (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x) };
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0)) {
        return true;
    }
    // Collinear cases: check if endpoint lies on the other segment
    let on_segment = |p: Point, q: Point, r: Point| -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}

/// Minimum distance between segments (a-b) and (c-d).
pub fn segment_to_segment_dist(a: Point, b: Point, c: Point, d: Point) -> f64 {
    if segments_intersect(a, b, c, d) {
        return 0.0;
    }
    point_to_segment_dist(a, c, d)
        .min(point_to_segment_dist(b, c, d))
        .min(point_to_segment_dist(c, a, b))
        .min(point_to_segment_dist(d, a, b))
}

/// Whether segment (a-b) touches or lies inside `rect`.
pub fn segment_intersects_rect(a: Point, b: Point, rect: Rect) -> bool {
    if rect_contains(rect, a) || rect_contains(rect, b) {
        return true;
    }
    rect_edges(rect).iter().any(|&(c, d)| segments_intersect(a, b, c, d))
}

fn rect_edges(rect: Rect) -> [(Point, Point); 4] {
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ]
}

/// Closed polygon approximating the ellipse inscribed in `rect`.
fn ellipse_outline(rect: Rect) -> Vec<Point> {
    let center = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    (0..=ELLIPSE_SEGMENTS)
        .map(|i| {
            let angle = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
            Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
        .collect()
}

/// World-space points of a freehand stroke.
fn stroke_points(element: &Element, points: &[Point]) -> Vec<Point> {
    let offset = element.origin().to_vec2();
    points.iter().map(|p| *p + offset).collect()
}

/// Check whether a world point hits `element`.
pub fn hit_test(point: Point, element: &Element, tolerance: f64) -> bool {
    if !is_interactive(element) {
        return false;
    }
    match &element.payload {
        Payload::Drawing(d) => {
            let reach = tolerance + d.thickness / 2.0;
            let points = stroke_points(element, &d.points);
            match points.as_slice() {
                [] => false,
                [only] => (point - *only).hypot() <= reach,
                _ => points.windows(2).any(|w| point_to_segment_dist(point, w[0], w[1]) <= reach),
            }
        }
        Payload::Shape(s) => {
            let reach = tolerance + s.thickness / 2.0;
            match s.shape_type {
                ShapeType::Arrow => {
                    let origin = element.origin();
                    point_to_segment_dist(point, origin, origin + s.end) <= reach
                }
                ShapeType::Rectangle | ShapeType::Square => rect_edges(box_rect(element))
                    .iter()
                    .any(|&(a, b)| point_to_segment_dist(point, a, b) <= reach),
                ShapeType::Circle => ellipse_band_contains(box_rect(element), point, reach),
            }
        }
        Payload::Text(_) | Payload::Component(_) => rect_contains(bounds(element).inflate(tolerance, tolerance), point),
        Payload::Invalid(_) => false,
    }
}

/// Elliptical band test in normalized coordinates.
fn ellipse_band_contains(rect: Rect, point: Point, reach: f64) -> bool {
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let center = rect.center();
    let nx = (point.x - center.x) / rx;
    let ny = (point.y - center.y) / ry;
    let band = reach / rx.min(ry);
    let inner = (1.0 - band).max(0.0);
    let outer = 1.0 + band;
    let d2 = nx * nx + ny * ny;
    inner * inner <= d2 && d2 <= outer * outer
}

/// Check whether the swept segment (a-b) touches `element`.
///
/// A zero-length segment degenerates to a point test.
pub fn segment_hit(a: Point, b: Point, element: &Element, tolerance: f64) -> bool {
    if !is_interactive(element) {
        return false;
    }
    let near_polyline = |points: &[Point], reach: f64| match points {
        [] => false,
        [only] => point_to_segment_dist(*only, a, b) <= reach,
        _ => points.windows(2).any(|w| segment_to_segment_dist(a, b, w[0], w[1]) <= reach),
    };
    match &element.payload {
        Payload::Drawing(d) => near_polyline(&stroke_points(element, &d.points), tolerance + d.thickness / 2.0),
        Payload::Shape(s) => {
            let reach = tolerance + s.thickness / 2.0;
            match s.shape_type {
                ShapeType::Arrow => {
                    let origin = element.origin();
                    near_polyline(&[origin, origin + s.end], reach)
                }
                ShapeType::Rectangle | ShapeType::Square => {
                    let r = box_rect(element);
                    let corners = [
                        Point::new(r.x0, r.y0),
                        Point::new(r.x1, r.y0),
                        Point::new(r.x1, r.y1),
                        Point::new(r.x0, r.y1),
                        Point::new(r.x0, r.y0),
                    ];
                    near_polyline(&corners, reach)
                }
                ShapeType::Circle => near_polyline(&ellipse_outline(box_rect(element)), reach),
            }
        }
        Payload::Text(_) | Payload::Component(_) => {
            segment_intersects_rect(a, b, bounds(element).inflate(tolerance, tolerance))
        }
        Payload::Invalid(_) => false,
    }
}

/// Union of the bounds of all interactive elements.
pub fn union_bounds<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Option<Rect> {
    elements
        .into_iter()
        .filter(|e| is_interactive(e))
        .map(bounds)
        .reduce(|acc, b| acc.union(b))
}
