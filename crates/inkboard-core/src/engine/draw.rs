//! Pen, shape and text creation gestures.

use super::{Engine, TextEntry};
use crate::element::{DrawingPayload, Element, ElementId, Payload, ShapePayload, ShapeType, TextPayload};
use crate::tools::ToolKind;
use kurbo::{Point, Rect, Size, Vec2};
use log::debug;

/// Minimum stroke width for shapes.
const MIN_SHAPE_THICKNESS: f64 = 2.0;

/// Result of a text-entry action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOutcome {
    /// A text element was created.
    Committed(ElementId),
    /// The pending box was discarded; history is untouched.
    Cancelled,
    /// Still editing (e.g. Shift+Enter inserts a newline).
    Editing,
    /// No text box is pending.
    Inactive,
}

impl Engine {
    /// Provisional element for the current drawing tool at a world point.
    pub(super) fn new_drawing(&self, world: Point) -> Element {
        let z = self.history.next_z_index();
        let settings = &self.settings;
        match self.tool.shape_type() {
            Some(shape_type) => Element::drawing(
                world,
                z,
                Payload::Shape(ShapePayload {
                    shape_type,
                    color: settings.color,
                    thickness: settings.thickness.max(MIN_SHAPE_THICKNESS),
                    end: Vec2::ZERO,
                }),
            )
            .with_size(0.0, 0.0),
            None => Element::drawing(
                world,
                z,
                Payload::Drawing(DrawingPayload {
                    points: vec![Point::ZERO],
                    color: settings.color,
                    thickness: settings.thickness,
                }),
            ),
        }
    }

    /// Commit the provisional element if it has substance; otherwise drop it.
    pub(super) fn finish_drawing(&mut self, element: Element) {
        let substance = self.config.shape_substance;
        let keep = match &element.payload {
            Payload::Drawing(d) => d.points.len() >= 2,
            _ => element.width.unwrap_or(0.0) > substance || element.height.unwrap_or(0.0) > substance,
        };
        if keep {
            debug!("committed drawing {}", element.id);
            self.history.add_elements(vec![element]);
        } else {
            debug!("discarded drawing without substance");
        }
    }

    /// Release a dragged text box into the pending text-entry state.
    pub(super) fn finish_text_box(&mut self, anchor: Point, current: Point) {
        let rect = grow_from_anchor(anchor, current, self.config.text_min_size);
        self.text_entry = Some(TextEntry { rect });
    }

    /// Enter in the text overlay. Shift+Enter keeps editing.
    pub fn submit_text(&mut self, text: &str, shift: bool) -> TextOutcome {
        if self.text_entry.is_none() {
            return TextOutcome::Inactive;
        }
        if shift {
            return TextOutcome::Editing;
        }
        self.commit_text(text)
    }

    /// The text overlay lost focus: commit non-blank text, otherwise cancel.
    pub fn blur_text(&mut self, text: &str) -> TextOutcome {
        self.commit_text(text)
    }

    /// Escape in the text overlay.
    pub fn cancel_text(&mut self) -> TextOutcome {
        match self.text_entry.take() {
            Some(_) => TextOutcome::Cancelled,
            None => TextOutcome::Inactive,
        }
    }

    fn commit_text(&mut self, text: &str) -> TextOutcome {
        let Some(entry) = self.text_entry.take() else {
            return TextOutcome::Inactive;
        };
        if text.trim().is_empty() {
            return TextOutcome::Cancelled;
        }
        let element = Element::drawing(
            entry.rect.origin(),
            self.history.next_z_index(),
            Payload::Text(TextPayload {
                text: text.to_owned(),
                color: self.settings.color,
                font_size: self.settings.font_size,
            }),
        )
        .with_size(entry.rect.width(), entry.rect.height());
        let id = element.id;
        debug!("committed text {id}");
        self.history.add_elements(vec![element]);
        TextOutcome::Committed(id)
    }
}

/// Update a provisional element for the pointer at `world`.
pub(super) fn update_drawing(tool: ToolKind, start: Point, world: Point, element: &mut Element) {
    let delta = world - start;
    match &mut element.payload {
        Payload::Drawing(d) => {
            let point = world - start.to_vec2();
            if d.points.last() != Some(&point) {
                d.points.push(point);
            }
        }
        Payload::Shape(s) if s.shape_type == ShapeType::Arrow => {
            // Arrows keep their origin and encode direction in the endpoint.
            s.end = delta;
            element.width = Some(delta.x.abs());
            element.height = Some(delta.y.abs());
        }
        Payload::Shape(_) => {
            let (w, h) = if tool == ToolKind::Square {
                let side = delta.x.abs().max(delta.y.abs());
                (side.copysign(delta.x), side.copysign(delta.y))
            } else {
                (delta.x, delta.y)
            };
            element.x = start.x + w.min(0.0);
            element.y = start.y + h.min(0.0);
            element.width = Some(w.abs());
            element.height = Some(h.abs());
        }
        Payload::Text(_) | Payload::Component(_) | Payload::Invalid(_) => {}
    }
}

/// Box spanning `anchor` toward `current`, at least `min` in each axis.
pub(super) fn grow_from_anchor(anchor: Point, current: Point, min: Size) -> Rect {
    let axis = |a: f64, c: f64, min: f64| {
        let len = (c - a).abs().max(min);
        if c < a { (a - len, a) } else { (a, a + len) }
    };
    let (x0, x1) = axis(anchor.x, current.x, min.width);
    let (y0, y1) = axis(anchor.y, current.y, min.height);
    Rect::new(x0, y0, x1, y1)
}
