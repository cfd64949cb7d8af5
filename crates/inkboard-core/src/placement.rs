//! Non-overlapping placement search for new components.

use crate::geometry::rect_overlap;
use kurbo::{Point, Rect, Size, Vec2};
use std::f64::consts::FRAC_PI_4;

/// Candidates per ring, at 45° steps.
const RING_CANDIDATES: usize = 8;

/// Find a top-left position for a box of `size` that overlaps none of `occupied`.
///
/// Tries `preferred` first, then `rings` concentric rings around it. If every
/// candidate collides, falls back to the right of `preferred`.
pub fn find_free_position(size: Size, preferred: Point, occupied: &[Rect], rings: usize, gap: f64) -> Point {
    let free = |origin: Point| {
        let candidate = Rect::from_origin_size(origin, size);
        !occupied.iter().any(|r| rect_overlap(candidate, *r))
    };

    if free(preferred) {
        return preferred;
    }

    let step = gap + size.width.max(size.height) * 0.5;
    for ring in 1..=rings {
        let radius = ring as f64 * step;
        for i in 0..RING_CANDIDATES {
            let angle = i as f64 * FRAC_PI_4;
            let candidate = preferred + Vec2::new(angle.cos(), angle.sin()) * radius;
            if free(candidate) {
                return candidate;
            }
        }
    }

    log::debug!("placement search exhausted, using fallback");
    Point::new(preferred.x + size.width + gap, preferred.y)
}
