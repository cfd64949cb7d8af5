//! Canvas interaction engine.
//!
//! The engine owns the live element collection (through [`HistoryStore`]),
//! the view transform, the selection and the single active gesture. Hosts
//! feed it screen-space pointer, wheel and key events and poll the read
//! accessors every frame to render.

mod draw;
mod gesture;
mod keyboard;
mod resize;

pub use draw::TextOutcome;
pub use keyboard::KeyOutcome;

use crate::config::EngineConfig;
use crate::element::{Element, ElementId};
use crate::geometry::{self, bounds, is_interactive};
use crate::history::HistoryStore;
use crate::placement::find_free_position;
use crate::selection::{HANDLE_HIT_TOLERANCE, ResizeHandle, Selection};
use crate::tools::{ToolKind, ToolSettings};
use crate::view::ViewState;
use gesture::ActiveGesture;
use kurbo::{Point, Rect, Size, Vec2};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Default viewport until the host reports its real size.
const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);

/// A text box released by the text tool, waiting for the host to commit it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextEntry {
    rect: Rect,
}

/// Interactive whiteboard session.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    history: HistoryStore,
    view: ViewState,
    viewport: Size,
    tool: ToolKind,
    settings: ToolSettings,
    selection: Selection,
    gesture: ActiveGesture,
    text_entry: Option<TextEntry>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Invalid config fields fall back to their defaults.
    pub fn new(config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            history: HistoryStore::with_limit(config.history_limit),
            config,
            view: ViewState::default(),
            viewport: DEFAULT_VIEWPORT,
            tool: ToolKind::default(),
            settings: ToolSettings::default(),
            selection: Selection::new(),
            gesture: ActiveGesture::Idle,
            text_entry: None,
        }
    }

    /// Replace the board contents, e.g. after a load or a discard.
    pub fn load_document(&mut self, elements: Vec<Element>, view: ViewState) {
        let degraded = elements.iter().filter(|e| !e.is_finite() || e.invalid_reason().is_some()).count();
        if degraded > 0 {
            log::warn!("{degraded} element(s) have unreadable data or non-finite geometry and will not be interactive");
        }
        info!("loaded {} elements", elements.len());
        self.history.replace_all(elements);
        self.view = view.clamped(self.config.min_zoom, self.config.max_zoom);
        self.selection.clear();
        self.gesture = ActiveGesture::Idle;
        self.text_entry = None;
    }

    // --- accessors ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn elements(&self) -> &[Element] {
        self.history.elements()
    }

    /// Elements in paint order.
    pub fn elements_by_z(&self) -> Vec<&Element> {
        self.history.elements_by_z()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.history.element(id)
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.view = view.clamped(self.config.min_zoom, self.config.max_zoom);
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, ActiveGesture::Idle)
    }

    /// Whether a released text box is waiting for commit or cancel.
    pub fn is_editing_text(&self) -> bool {
        self.text_entry.is_some()
    }

    /// Provisional element being drawn, not yet in the collection.
    pub fn active_drawing(&self) -> Option<&Element> {
        match &self.gesture {
            ActiveGesture::Drawing { element, .. } => Some(element),
            _ => None,
        }
    }

    /// In-progress marquee in world coordinates.
    pub fn selection_rect(&self) -> Option<Rect> {
        match &self.gesture {
            ActiveGesture::Marquee { anchor, current } => Some(geometry::normalized_rect(*anchor, *current)),
            _ => None,
        }
    }

    /// Text box being dragged out, or the released box awaiting text.
    pub fn text_box(&self) -> Option<Rect> {
        match &self.gesture {
            ActiveGesture::TextBox { anchor, current } => Some(geometry::normalized_rect(*anchor, *current)),
            _ => self.text_entry.map(|entry| entry.rect),
        }
    }

    /// Ids touched by the current eraser sweep.
    pub fn erasing_ids(&self) -> Option<&BTreeSet<ElementId>> {
        match &self.gesture {
            ActiveGesture::Erasing { touched, .. } => Some(touched),
            _ => None,
        }
    }

    pub fn resizing_id(&self) -> Option<ElementId> {
        match &self.gesture {
            ActiveGesture::Resizing { original, .. } => Some(original.id),
            _ => None,
        }
    }

    // --- tools ---

    /// Switch tools. Any in-flight gesture or pending text box is abandoned.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool == self.tool {
            return;
        }
        self.cancel_gesture();
        if self.text_entry.take().is_some() {
            debug!("pending text box discarded by tool change");
        }
        debug!("tool {:?} -> {:?}", self.tool, tool);
        self.tool = tool;
    }

    // --- commands ---

    /// Delete the selected elements as one history entry.
    ///
    /// Returns the number of removed elements.
    pub fn delete_selection(&mut self) -> usize {
        if self.is_busy() || self.selection.is_empty() {
            return 0;
        }
        let ids = self.selection.ids().to_vec();
        let removed = self.history.remove_elements(&ids);
        self.selection.clear();
        removed.len()
    }

    pub fn undo(&mut self) -> bool {
        if self.is_busy() {
            debug!("undo ignored during gesture");
            return false;
        }
        let done = self.history.undo();
        self.prune_selection();
        done
    }

    pub fn redo(&mut self) -> bool {
        if self.is_busy() {
            debug!("redo ignored during gesture");
            return false;
        }
        let done = self.history.redo();
        self.prune_selection();
        done
    }

    /// Select every interactive element.
    pub fn select_all(&mut self) {
        let ids: Vec<ElementId> = self.history.elements().iter().filter(|e| is_interactive(e)).map(|e| e.id).collect();
        self.selection.replace(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Raise the selection above every other element, keeping its internal order.
    pub fn bring_to_front(&mut self) -> bool {
        if self.is_busy() {
            debug!("bring to front ignored during gesture");
            return false;
        }
        let top = self.history.next_z_index();
        let selected = self.selected_by_z();
        let updated = selected
            .into_iter()
            .enumerate()
            .map(|(i, mut e)| {
                e.z_index = top.saturating_add(i as i64);
                e
            })
            .collect();
        self.history.update_elements(updated)
    }

    /// Lower the selection beneath every other element, keeping its internal order.
    pub fn send_to_back(&mut self) -> bool {
        if self.is_busy() {
            debug!("send to back ignored during gesture");
            return false;
        }
        let bottom = self.history.elements().iter().map(|e| e.z_index).min().unwrap_or(0);
        let selected = self.selected_by_z();
        let n = selected.len() as i64;
        let updated = selected
            .into_iter()
            .enumerate()
            .map(|(i, mut e)| {
                e.z_index = bottom.saturating_sub(n).saturating_add(i as i64);
                e
            })
            .collect();
        self.history.update_elements(updated)
    }

    /// Fit the view to the bounds of all elements.
    pub fn zoom_to_fit(&mut self) {
        let Some(content) = geometry::union_bounds(self.history.elements()) else {
            return;
        };
        self.view.fit_to_bounds(
            content,
            self.viewport,
            self.config.fit_padding,
            self.config.min_zoom,
            self.config.max_zoom,
        );
    }

    /// Insert a component without overlapping existing elements.
    ///
    /// `preferred` is the desired top-left corner in world space; the default
    /// centres the component in the viewport. The new element becomes the sole
    /// selection. Returns `None` while a gesture or text box is active.
    pub fn place_component(
        &mut self,
        component_type: &str,
        size: Size,
        props: Map<String, Value>,
        preferred: Option<Point>,
    ) -> Option<ElementId> {
        if self.is_busy() {
            debug!("placement of {component_type} ignored during gesture");
            return None;
        }
        let preferred = preferred.unwrap_or_else(|| {
            let center = self.view.screen_to_world(Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0));
            center - Vec2::new(size.width / 2.0, size.height / 2.0)
        });
        let occupied: Vec<Rect> =
            self.history.elements().iter().filter(|e| is_interactive(e)).map(bounds).collect();
        let origin = find_free_position(
            size,
            preferred,
            &occupied,
            self.config.placement_rings,
            self.config.placement_gap,
        );
        let element = Element::component(component_type, origin, size, self.history.next_z_index(), props);
        let id = element.id;
        debug!("placed {component_type} at ({:.1}, {:.1})", origin.x, origin.y);
        self.history.add_elements(vec![element]);
        self.selection.set_single(id);
        Some(id)
    }

    /// Corner handle of a selected element under a screen point.
    pub fn handle_at(&self, screen: Point) -> Option<(ElementId, ResizeHandle)> {
        let world = self.view.screen_to_world(screen);
        let tolerance = HANDLE_HIT_TOLERANCE / self.view.zoom;
        self.selection.ids().iter().find_map(|id| {
            let element = self.history.element(*id)?;
            if !is_interactive(element) {
                return None;
            }
            ResizeHandle::hit(bounds(element), world, tolerance).map(|h| (*id, h))
        })
    }

    // --- internals ---

    /// A gesture or pending text box blocks history commands.
    fn is_busy(&self) -> bool {
        self.is_gesture_active() || self.text_entry.is_some()
    }

    fn prune_selection(&mut self) {
        let history = &self.history;
        self.selection.retain_existing(|id| history.contains(id));
    }

    fn selected_by_z(&self) -> Vec<Element> {
        let mut selected: Vec<Element> =
            self.selection.ids().iter().filter_map(|id| self.history.element(*id).cloned()).collect();
        selected.sort_by_key(|e| e.z_index);
        selected
    }

    fn hit_tolerance(&self) -> f64 {
        self.config.hit_tolerance_px / self.view.zoom
    }

    fn eraser_tolerance(&self) -> f64 {
        self.config.eraser_tolerance_px / self.view.zoom
    }
}
