//! Selection set and resize handles.

use crate::element::ElementId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Handle hit radius in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 10.0;

/// Corner handle used to resize an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 4] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomLeft,
        ResizeHandle::BottomRight,
    ];

    /// Position of this handle on `bounds`.
    pub fn position(self, bounds: Rect) -> Point {
        match self {
            ResizeHandle::TopLeft => Point::new(bounds.x0, bounds.y0),
            ResizeHandle::TopRight => Point::new(bounds.x1, bounds.y0),
            ResizeHandle::BottomLeft => Point::new(bounds.x0, bounds.y1),
            ResizeHandle::BottomRight => Point::new(bounds.x1, bounds.y1),
        }
    }

    /// The corner that stays fixed while this handle moves.
    pub fn opposite(self) -> Self {
        match self {
            ResizeHandle::TopLeft => ResizeHandle::BottomRight,
            ResizeHandle::TopRight => ResizeHandle::BottomLeft,
            ResizeHandle::BottomLeft => ResizeHandle::TopRight,
            ResizeHandle::BottomRight => ResizeHandle::TopLeft,
        }
    }

    /// Whether the handle moves the right (`x1`) edge.
    pub fn moves_right(self) -> bool {
        matches!(self, ResizeHandle::TopRight | ResizeHandle::BottomRight)
    }

    /// Whether the handle moves the bottom (`y1`) edge.
    pub fn moves_bottom(self) -> bool {
        matches!(self, ResizeHandle::BottomLeft | ResizeHandle::BottomRight)
    }

    /// Find the handle of `bounds` under a world point.
    /// `tolerance` should be adjusted for zoom.
    pub fn hit(bounds: Rect, point: Point, tolerance: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|handle| (handle.position(bounds) - point).hypot2() <= tolerance * tolerance)
    }
}

/// Ordered set of selected element ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    /// Only selected element, if exactly one.
    pub fn single(&self) -> Option<ElementId> {
        match self.ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn set_single(&mut self, id: ElementId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Replace the selection, dropping duplicates.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer satisfy `exists`.
    pub fn retain_existing(&mut self, exists: impl Fn(ElementId) -> bool) {
        self.ids.retain(|id| exists(*id));
    }
}
