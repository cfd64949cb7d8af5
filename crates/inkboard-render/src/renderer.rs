//! Renderer trait abstraction.

use inkboard_core::{Element, ElementId, Engine, ViewState};
use kurbo::{Rect, Size};
use peniko::Color;

/// Background grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// Plain background.
    None,
    /// Repeating dots at a fixed world pitch.
    #[default]
    Dots,
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Elements in paint order (ascending zIndex).
    pub elements: Vec<&'a Element>,
    pub view: ViewState,
    /// Viewport size in logical screen pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    pub background_color: Color,
    pub grid_style: GridStyle,
    /// Selection highlight color.
    pub selection_color: Color,
    pub selected: Vec<ElementId>,
    /// Provisional element of an in-flight draw gesture.
    pub active_drawing: Option<&'a Element>,
    /// Marquee rectangle in world coordinates.
    pub selection_rect: Option<Rect>,
    /// Pending text box in world coordinates.
    pub text_box: Option<Rect>,
    /// Elements touched by an in-flight eraser sweep, drawn faded.
    pub erasing: Vec<ElementId>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context. Elements are sorted into paint order.
    pub fn new(elements: &'a [Element], view: ViewState, viewport_size: Size) -> Self {
        let mut sorted: Vec<&Element> = elements.iter().collect();
        sorted.sort_by_key(|e| e.z_index);
        Self {
            elements: sorted,
            view,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(250, 250, 250, 255),
            grid_style: GridStyle::Dots,
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            selected: Vec::new(),
            active_drawing: None,
            selection_rect: None,
            text_box: None,
            erasing: Vec::new(),
        }
    }

    /// Snapshot everything the engine exposes for drawing.
    pub fn from_engine(engine: &'a Engine) -> Self {
        Self {
            elements: engine.elements_by_z(),
            selected: engine.selection().ids().to_vec(),
            active_drawing: engine.active_drawing(),
            selection_rect: engine.selection_rect(),
            text_box: engine.text_box(),
            erasing: engine.erasing_ids().map(|ids| ids.iter().copied().collect()).unwrap_or_default(),
            ..Self::new(&[], engine.view(), engine.viewport())
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    pub fn with_selection(mut self, ids: &[ElementId]) -> Self {
        self.selected = ids.to_vec();
        self
    }

    /// Set the marquee rectangle.
    pub fn with_selection_rect(mut self, rect: Option<Rect>) -> Self {
        self.selection_rect = rect;
        self
    }
}

/// Trait for rendering backends.
///
/// Implementations may rasterize, record or forward the frame to a GPU scene.
pub trait Renderer: Send + Sync {
    /// Build the scene/command buffer for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
