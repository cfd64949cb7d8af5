//! Tool selection and the style applied to new elements.

use crate::element::{Color, DEFAULT_FONT_SIZE, DEFAULT_THICKNESS, ShapeType};
use serde::{Deserialize, Serialize};

/// Available tools. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Pen,
    Square,
    Rectangle,
    Circle,
    Arrow,
    Text,
    Eraser,
    Hand,
    /// Click-select and drag-move, falling back to marquee.
    #[default]
    Pointer,
    /// Marquee selection only.
    Select,
}

impl ToolKind {
    /// Shape drawn by this tool, if it is a shape tool.
    pub fn shape_type(self) -> Option<ShapeType> {
        match self {
            ToolKind::Square => Some(ShapeType::Square),
            ToolKind::Rectangle => Some(ShapeType::Rectangle),
            ToolKind::Circle => Some(ShapeType::Circle),
            ToolKind::Arrow => Some(ShapeType::Arrow),
            _ => None,
        }
    }

    /// Whether this tool creates drawing elements with a pointer drag.
    pub fn is_drawing(self) -> bool {
        self == ToolKind::Pen || self.shape_type().is_some()
    }

    /// Single-letter keyboard shortcut.
    pub fn from_shortcut(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'p' => ToolKind::Pen,
            'r' => ToolKind::Rectangle,
            'c' => ToolKind::Circle,
            'a' => ToolKind::Arrow,
            't' => ToolKind::Text,
            'e' => ToolKind::Eraser,
            'h' => ToolKind::Hand,
            'v' => ToolKind::Pointer,
            's' => ToolKind::Select,
            _ => return None,
        })
    }
}

/// Style fed to newly created elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub color: Color,
    pub thickness: f64,
    pub font_size: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self { color: Color::black(), thickness: DEFAULT_THICKNESS, font_size: DEFAULT_FONT_SIZE }
    }
}
