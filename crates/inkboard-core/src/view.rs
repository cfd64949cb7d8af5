//! View state: pan offset and zoom.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 5.0;

/// Clamp without panicking on an inverted or NaN range.
fn clamp_zoom(zoom: f64, min_zoom: f64, max_zoom: f64) -> f64 {
    zoom.max(min_zoom).min(max_zoom)
}

/// Pan/zoom transform mapping world to screen coordinates.
///
/// `screen = world * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Horizontal pan offset in screen pixels.
    pub x: f64,
    /// Vertical pan offset in screen pixels.
    pub y: f64,
    /// Uniform scale.
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

impl ViewState {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// World-to-screen affine, for renderers.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.zoom)
    }

    /// Screen-to-world affine.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset())
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x * self.zoom + self.x, world.y * self.zoom + self.y)
    }

    /// Visible world rectangle for a viewport of the given size.
    pub fn visible_world(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Set the zoom level, keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, zoom: f64, min_zoom: f64, max_zoom: f64) {
        let new_zoom = clamp_zoom(zoom, min_zoom, max_zoom);
        if !new_zoom.is_finite() || (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let scale = new_zoom / self.zoom;
        self.x = screen.x - (screen.x - self.x) * scale;
        self.y = screen.y - (screen.y - self.y) * scale;
        self.zoom = new_zoom;
    }

    /// Zoom in response to a ctrl/cmd wheel delta.
    pub fn wheel_zoom(&mut self, screen: Point, delta_y: f64, speed: f64, min_zoom: f64, max_zoom: f64) {
        let target = self.zoom * (1.0 + (-delta_y * speed));
        self.zoom_at(screen, target, min_zoom, max_zoom);
    }

    /// Copy with the zoom clamped into range; non-finite values reset to the default.
    pub fn clamped(self, min_zoom: f64, max_zoom: f64) -> Self {
        if !(self.x.is_finite() && self.y.is_finite() && self.zoom.is_finite()) || self.zoom <= 0.0 {
            return Self::default();
        }
        let zoom = clamp_zoom(self.zoom, min_zoom, max_zoom);
        if !(zoom.is_finite() && zoom > 0.0) {
            return Self::default();
        }
        Self { zoom, ..self }
    }

    /// Fit the view to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64, min_zoom: f64, max_zoom: f64) {
        if bounds.is_zero_area() {
            *self = Self::default();
            return;
        }

        let padded_viewport = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded_viewport.width / bounds.width();
        let scale_y = padded_viewport.height / bounds.height();
        let zoom = clamp_zoom(scale_x.min(scale_y), min_zoom, max_zoom);
        if !(zoom.is_finite() && zoom > 0.0) {
            return;
        }
        self.zoom = zoom;

        // Center the bounds in the viewport
        let bounds_center = bounds.center();
        self.x = viewport.width / 2.0 - bounds_center.x * self.zoom;
        self.y = viewport.height / 2.0 - bounds_center.y * self.zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view() {
        let view = ViewState::default();
        assert_eq!(view.offset(), Vec2::ZERO);
        assert!((view.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_offset_and_zoom() {
        let view = ViewState::new(50.0, 100.0, 2.0);
        let world = view.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let view = ViewState::new(30.0, -20.0, 1.5);
        let original = Point::new(123.0, 456.0);
        let back = view.world_to_screen(view.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_transform_matches_conversion() {
        let view = ViewState::new(12.0, 34.0, 2.5);
        let p = Point::new(7.0, -3.0);
        let via_affine = view.transform() * p;
        let direct = view.world_to_screen(p);
        assert!((via_affine - direct).hypot() < 1e-10);
        let back = view.inverse_transform() * direct;
        assert!((back - p).hypot() < 1e-10);
    }

    #[test]
    fn test_wheel_zoom_anchored_at_cursor() {
        let mut view = ViewState::default();
        view.wheel_zoom(Point::new(100.0, 100.0), -100.0, 0.001, MIN_ZOOM, MAX_ZOOM);
        assert!((view.zoom - 1.1).abs() < 1e-9);
        assert!((view.x + 10.0).abs() < 1e-9);
        assert!((view.y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut view = ViewState::default();
        view.zoom_at(Point::ZERO, 0.001, MIN_ZOOM, MAX_ZOOM);
        assert!((view.zoom - MIN_ZOOM).abs() < f64::EPSILON);
        view.zoom_at(Point::ZERO, 1000.0, MIN_ZOOM, MAX_ZOOM);
        assert!((view.zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamped_repairs_invalid_state() {
        assert_eq!(ViewState::new(0.0, 0.0, 9.0).clamped(MIN_ZOOM, MAX_ZOOM).zoom, MAX_ZOOM);
        assert_eq!(ViewState::new(f64::NAN, 0.0, 1.0).clamped(MIN_ZOOM, MAX_ZOOM), ViewState::default());
    }

    #[test]
    fn test_inverted_range_does_not_panic() {
        let mut view = ViewState::default();
        view.zoom_at(Point::ZERO, 2.0, 6.0, 5.0);
        assert!(view.zoom.is_finite() && view.zoom > 0.0);
        let clamped = ViewState::new(0.0, 0.0, 1.0).clamped(f64::NAN, f64::NAN);
        assert!(clamped.zoom.is_finite());
        view.fit_to_bounds(Rect::new(0.0, 0.0, 10.0, 10.0), Size::new(100.0, 100.0), 0.0, 6.0, 5.0);
        assert!(view.zoom.is_finite());
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut view = ViewState::default();
        view.fit_to_bounds(Rect::new(0.0, 0.0, 100.0, 100.0), Size::new(300.0, 300.0), 50.0, MIN_ZOOM, MAX_ZOOM);
        assert!((view.zoom - 2.0).abs() < 1e-9);
        let center = view.world_to_screen(Point::new(50.0, 50.0));
        assert!((center.x - 150.0).abs() < 1e-9);
        assert!((center.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_pan() {
        let mut view = ViewState::default();
        view.pan(Vec2::new(10.0, 20.0));
        assert!((view.x - 10.0).abs() < f64::EPSILON);
        assert!((view.y - 20.0).abs() < f64::EPSILON);
    }
}
