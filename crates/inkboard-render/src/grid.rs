//! Background dot grid.

use crate::frame::Primitive;
use kurbo::{Point, Rect};
use peniko::Color;

/// Dot spacing in world units.
pub const GRID_PITCH: f64 = 20.0;
/// Screen spacing at which dots become invisible.
const FADE_OUT_PX: f64 = 8.0;
/// Screen spacing at which dots reach full opacity.
const FULL_OPACITY_PX: f64 = 16.0;
/// Dot radius in screen pixels.
const DOT_RADIUS_PX: f64 = 1.0;

fn grid_color() -> Color {
    Color::from_rgba8(200, 200, 205, 255)
}

/// Dot opacity for a zoom level, fading out as the screen pitch shrinks.
pub fn grid_opacity(zoom: f64) -> f64 {
    let screen_pitch = GRID_PITCH * zoom;
    ((screen_pitch - FADE_OUT_PX) / (FULL_OPACITY_PX - FADE_OUT_PX)).clamp(0.0, 1.0)
}

/// Grid intersections inside `visible`.
pub fn grid_points(visible: Rect) -> Vec<Point> {
    let first_col = (visible.x0 / GRID_PITCH).ceil() as i64;
    let last_col = (visible.x1 / GRID_PITCH).floor() as i64;
    let first_row = (visible.y0 / GRID_PITCH).ceil() as i64;
    let last_row = (visible.y1 / GRID_PITCH).floor() as i64;
    (first_row..=last_row)
        .flat_map(|row| {
            (first_col..=last_col).map(move |col| Point::new(col as f64 * GRID_PITCH, row as f64 * GRID_PITCH))
        })
        .collect()
}

/// Grid primitive for the visible world area, or `None` when fully faded.
pub fn grid_dots(visible: Rect, zoom: f64) -> Option<Primitive> {
    let opacity = grid_opacity(zoom);
    if opacity <= 0.0 || !(visible.is_finite() && zoom.is_finite()) {
        return None;
    }
    Some(Primitive::GridDots {
        points: grid_points(visible),
        radius: DOT_RADIUS_PX / zoom,
        color: grid_color().multiply_alpha(opacity as f32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_ramp() {
        assert_eq!(grid_opacity(1.0), 1.0);
        assert_eq!(grid_opacity(0.4), 0.0);
        assert_eq!(grid_opacity(0.3), 0.0);
        assert!((grid_opacity(0.6) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_points_cover_visible_area() {
        let points = grid_points(Rect::new(-5.0, 0.0, 45.0, 20.0));
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[5], Point::new(40.0, 20.0));
    }

    #[test]
    fn test_faded_grid_is_skipped() {
        assert!(grid_dots(Rect::new(0.0, 0.0, 100.0, 100.0), 0.2).is_none());
        match grid_dots(Rect::new(0.0, 0.0, 100.0, 100.0), 2.0) {
            Some(Primitive::GridDots { points, radius, .. }) => {
                assert_eq!(points.len(), 36);
                assert_eq!(radius, 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
