//! Pointer gesture state machine.
//!
//! At most one gesture is active. A pointer-down while a gesture (or a
//! pending text box) is active is rejected, so mutual exclusion holds by
//! construction.

use super::Engine;
use crate::element::{Element, ElementId};
use crate::geometry::{self, bounds, hit_test, is_interactive, rect_overlap, segment_hit};
use crate::history::HistoryEntry;
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::selection::ResizeHandle;
use crate::tools::ToolKind;
use kurbo::{Point, Rect, Vec2};
use log::{debug, warn};
use std::collections::BTreeSet;

/// The single in-flight pointer gesture.
#[derive(Debug, Clone, Default)]
pub(crate) enum ActiveGesture {
    #[default]
    Idle,
    /// Screen-space pan anchored at the previous pointer position.
    Panning { last: Point },
    /// Provisional element held outside the collection until pointer-up.
    Drawing { tool: ToolKind, start: Point, element: Element },
    TextBox { anchor: Point, current: Point },
    Erasing { last: Point, touched: BTreeSet<ElementId> },
    /// Live drag of the selection; `originals` are the pre-drag snapshots.
    Dragging { start: Point, originals: Vec<Element> },
    Marquee { anchor: Point, current: Point },
    Resizing { original: Element, original_bounds: Rect, handle: ResizeHandle },
}

impl Engine {
    /// Dispatch a host pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button, modifiers } => {
                self.pointer_down(position, button, modifiers);
            }
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position } => self.pointer_up(position),
            PointerEvent::Wheel { position, delta, modifiers } => self.wheel(position, delta, modifiers),
        }
    }

    /// Start a gesture for the current tool. Returns false if rejected.
    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, _modifiers: Modifiers) -> bool {
        if self.is_gesture_active() {
            warn!("pointer-down ignored: a gesture is already active");
            return false;
        }
        if button == MouseButton::Middle {
            self.gesture = ActiveGesture::Panning { last: screen };
            return true;
        }
        if button != MouseButton::Left {
            return false;
        }
        if self.text_entry.is_some() {
            warn!("pointer-down ignored: a text box is awaiting commit");
            return false;
        }

        let world = self.view.screen_to_world(screen);
        self.gesture = match self.tool {
            ToolKind::Hand => ActiveGesture::Panning { last: screen },
            ToolKind::Pen | ToolKind::Square | ToolKind::Rectangle | ToolKind::Circle | ToolKind::Arrow => {
                ActiveGesture::Drawing { tool: self.tool, start: world, element: self.new_drawing(world) }
            }
            ToolKind::Text => ActiveGesture::TextBox { anchor: world, current: world },
            ToolKind::Eraser => {
                let tolerance = self.eraser_tolerance();
                let touched = self
                    .history
                    .elements()
                    .iter()
                    .filter(|e| segment_hit(world, world, e, tolerance))
                    .map(|e| e.id)
                    .collect();
                ActiveGesture::Erasing { last: world, touched }
            }
            ToolKind::Pointer => self.begin_pointer(world),
            ToolKind::Select => ActiveGesture::Marquee { anchor: world, current: world },
        };
        true
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let world = self.view.screen_to_world(screen);
        let eraser_tolerance = self.eraser_tolerance();
        match &mut self.gesture {
            ActiveGesture::Idle => {}
            ActiveGesture::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.view.pan(delta);
            }
            ActiveGesture::Drawing { tool, start, element } => {
                super::draw::update_drawing(*tool, *start, world, element);
            }
            ActiveGesture::TextBox { current, .. } | ActiveGesture::Marquee { current, .. } => {
                *current = world;
            }
            ActiveGesture::Erasing { last, touched } => {
                for element in self.history.elements() {
                    if !touched.contains(&element.id) && segment_hit(*last, world, element, eraser_tolerance) {
                        touched.insert(element.id);
                    }
                }
                *last = world;
            }
            ActiveGesture::Dragging { start, originals } => {
                let delta = world - *start;
                for original in originals.iter() {
                    if let Some(element) = self.history.element_mut(original.id) {
                        element.set_origin(original.origin() + delta);
                    }
                }
            }
            ActiveGesture::Resizing { original, original_bounds, handle } => {
                let new_bounds = super::resize::resized_bounds(*original_bounds, *handle, world, self.config.min_resize);
                let resized = super::resize::apply_resize(original, *original_bounds, new_bounds);
                if let Some(element) = self.history.element_mut(original.id) {
                    *element = resized;
                }
            }
        }
    }

    /// Finish the active gesture at `screen`.
    pub fn pointer_up(&mut self, screen: Point) {
        self.pointer_move(screen);
        match std::mem::take(&mut self.gesture) {
            ActiveGesture::Idle | ActiveGesture::Panning { .. } => {}
            ActiveGesture::Drawing { element, .. } => self.finish_drawing(element),
            ActiveGesture::TextBox { anchor, current } => self.finish_text_box(anchor, current),
            ActiveGesture::Erasing { touched, .. } => {
                if touched.is_empty() {
                    return;
                }
                let ids: Vec<ElementId> = touched.into_iter().collect();
                let removed = self.history.remove_elements(&ids);
                debug!("erased {} element(s)", removed.len());
                self.prune_selection();
            }
            ActiveGesture::Dragging { originals, .. } => self.finish_drag(originals),
            ActiveGesture::Marquee { anchor, current } => {
                let rect = geometry::normalized_rect(anchor, current);
                self.select_in_rect(rect);
            }
            ActiveGesture::Resizing { original, original_bounds, .. } => {
                let Some(current) = self.history.element(original.id).cloned() else {
                    return;
                };
                if bounds(&current) != original_bounds {
                    debug!("resized element {}", original.id);
                    self.history.push_action(HistoryEntry::update(vec![original], vec![current]));
                }
            }
        }
    }

    /// Wheel: ctrl/cmd zooms around the cursor, otherwise pans.
    pub fn wheel(&mut self, screen: Point, delta: Vec2, modifiers: Modifiers) {
        if modifiers.command() {
            self.view.wheel_zoom(
                screen,
                delta.y,
                self.config.wheel_zoom_speed,
                self.config.min_zoom,
                self.config.max_zoom,
            );
        } else {
            self.view.pan(-delta);
        }
    }

    /// Abandon the active gesture without touching history.
    ///
    /// A drag or resize in progress is rolled back to its snapshots.
    pub fn cancel_gesture(&mut self) {
        match std::mem::take(&mut self.gesture) {
            ActiveGesture::Dragging { originals, .. } => {
                for original in originals {
                    if let Some(element) = self.history.element_mut(original.id) {
                        *element = original;
                    }
                }
            }
            ActiveGesture::Resizing { original, .. } => {
                if let Some(element) = self.history.element_mut(original.id) {
                    *element = original;
                }
            }
            ActiveGesture::Idle => return,
            _ => {}
        }
        debug!("gesture cancelled");
    }

    /// Click-select: the top-most hit starts a drag, a miss starts a marquee.
    fn begin_pointer(&mut self, world: Point) -> ActiveGesture {
        let tolerance = self.hit_tolerance();
        let hit = self
            .history
            .elements_by_z()
            .into_iter()
            .rev()
            .find(|e| hit_test(world, e, tolerance))
            .map(|e| e.id);

        let Some(id) = hit else {
            self.selection.clear();
            return ActiveGesture::Marquee { anchor: world, current: world };
        };
        if !self.selection.contains(id) {
            self.selection.set_single(id);
        }
        let originals = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.history.element(*id).cloned())
            .collect();
        ActiveGesture::Dragging { start: world, originals }
    }

    fn finish_drag(&mut self, originals: Vec<Element>) {
        let current: Vec<Element> =
            originals.iter().filter_map(|o| self.history.element(o.id).cloned()).collect();
        let moved = originals.iter().zip(&current).any(|(before, after)| before.origin() != after.origin());
        if moved {
            debug!("moved {} element(s)", current.len());
            self.history.push_action(HistoryEntry::update(originals, current));
        }
    }

    /// Replace the selection with every interactive element overlapping `rect`.
    ///
    /// A marquee that never left its anchor point selects nothing.
    fn select_in_rect(&mut self, rect: Rect) {
        if rect.width() == 0.0 && rect.height() == 0.0 {
            self.selection.clear();
            return;
        }
        let ids: Vec<ElementId> = self
            .history
            .elements()
            .iter()
            .filter(|e| is_interactive(e) && rect_overlap(bounds(e), rect))
            .map(|e| e.id)
            .collect();
        self.selection.replace(ids);
    }
}
