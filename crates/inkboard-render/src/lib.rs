//! inkboard Render Library
//!
//! Scene renderer interface for inkboard: a render context snapshot of the
//! engine, painter's-order primitive frames, the background grid, glyph
//! outlines for bitmap text, and the SVG/PNG export paths.

pub mod export;
pub mod frame;
pub mod grid;
pub mod paths;
mod renderer;
pub mod text;

pub use export::{EXPORT_PADDING, EXPORT_SCALE, ExportError, export_png, export_svg};
pub use frame::{Frame, Primitive, PrimitiveRenderer, build_frame};
pub use renderer::{GridStyle, RenderContext, Renderer};
