//! inkboard Core Library
//!
//! Platform-agnostic scene engine for the inkboard whiteboard: element model,
//! geometry, undo history, gesture interpretation and document sync.

pub mod config;
pub mod element;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod input;
pub mod placement;
pub mod selection;
pub mod storage;
pub mod sync;
pub mod tools;
pub mod view;

pub use config::{ConfigError, EngineConfig};
pub use element::{Color, Element, ElementId, ElementKind, Payload, ShapeType};
pub use engine::{Engine, KeyOutcome, TextOutcome};
pub use history::{EntryKind, HistoryEntry, HistoryStore};
pub use input::{Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use selection::{ResizeHandle, Selection};
pub use storage::{DocumentStore, DocumentUpdate, FileStore, MemoryStore, StoreError, StoredDocument};
pub use sync::{DocumentSync, LoadedDocument, SyncError};
pub use tools::{ToolKind, ToolSettings};
pub use view::ViewState;
