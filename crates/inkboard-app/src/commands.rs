//! Subcommand implementations against a document store.

use crate::error::{AppError, AppResult};
use crate::script::{self, ReplayReport};
use clap::ValueEnum;
use inkboard_core::geometry::union_bounds;
use inkboard_core::storage::DocumentSummary;
use inkboard_core::{DocumentStore, DocumentSync, ElementId, Engine, EngineConfig, Payload, StoredDocument, ViewState};
use inkboard_render::{EXPORT_PADDING, export_png, export_svg};
use kurbo::Rect;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Read an engine configuration file.
pub fn load_config(path: &Path) -> AppResult<EngineConfig> {
    let json = fs::read_to_string(path).map_err(|source| AppError::Io { path: path.to_path_buf(), source })?;
    EngineConfig::from_json(&json).map_err(|source| AppError::Config { path: path.to_path_buf(), source })
}

/// Read a replay script file.
pub fn load_script(path: &Path) -> AppResult<Vec<script::ScriptStep>> {
    let json = fs::read_to_string(path).map_err(|source| AppError::Io { path: path.to_path_buf(), source })?;
    script::parse_script(&json).map_err(|source| AppError::Script { path: path.to_path_buf(), source })
}

pub async fn create_board<S: DocumentStore + ?Sized>(store: &S, name: &str) -> AppResult<StoredDocument> {
    let document = store.create(name).await?;
    log::info!("created board {} ({name})", document.id);
    Ok(document)
}

pub async fn list_boards<S: DocumentStore + ?Sized>(store: &S) -> AppResult<Vec<DocumentSummary>> {
    Ok(store.list().await?)
}

/// Summary of a loaded board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardInfo {
    pub id: String,
    pub name: String,
    pub strokes: usize,
    pub shapes: usize,
    pub texts: usize,
    pub components: usize,
    /// Elements whose data could not be read.
    pub unreadable: usize,
    pub bounds: Option<Rect>,
    pub view: ViewState,
}

impl BoardInfo {
    pub fn element_count(&self) -> usize {
        self.strokes + self.shapes + self.texts + self.components + self.unreadable
    }
}

impl fmt::Display for BoardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        writeln!(
            f,
            "  {} elements: {} strokes, {} shapes, {} texts, {} components",
            self.element_count(),
            self.strokes,
            self.shapes,
            self.texts,
            self.components
        )?;
        if self.unreadable > 0 {
            writeln!(f, "  {} unreadable element(s) kept as-is", self.unreadable)?;
        }
        match self.bounds {
            Some(b) => writeln!(f, "  bounds: ({}, {}) - ({}, {})", b.x0, b.y0, b.x1, b.y1)?,
            None => writeln!(f, "  bounds: empty")?,
        }
        write!(f, "  view: offset ({}, {}), zoom {}", self.view.x, self.view.y, self.view.zoom)
    }
}

pub async fn board_info<S: DocumentStore + ?Sized>(store: Arc<S>, id: &str) -> AppResult<BoardInfo> {
    let mut sync = DocumentSync::new(store);
    let doc = sync.load(id).await?;
    let mut info = BoardInfo {
        id: doc.id,
        name: doc.name,
        strokes: 0,
        shapes: 0,
        texts: 0,
        components: 0,
        unreadable: 0,
        bounds: union_bounds(&doc.elements),
        view: doc.view_state,
    };
    for element in &doc.elements {
        match element.payload {
            Payload::Drawing(_) => info.strokes += 1,
            Payload::Shape(_) => info.shapes += 1,
            Payload::Text(_) => info.texts += 1,
            Payload::Component(_) => info.components += 1,
            Payload::Invalid(_) => info.unreadable += 1,
        }
    }
    Ok(info)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Bitmap rasterized at the export scale
    Png,
    /// Standalone vector document
    Svg,
}

impl ExportFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }
}

/// Render a board (or some of its elements) to export bytes.
pub async fn export_board<S: DocumentStore + ?Sized>(
    store: Arc<S>,
    id: &str,
    format: ExportFormat,
    selection: Option<&[ElementId]>,
    scale: f64,
) -> AppResult<Vec<u8>> {
    let mut sync = DocumentSync::new(store);
    let doc = sync.load(id).await?;
    let bytes = match format {
        ExportFormat::Png => export_png(&doc.elements, selection, scale)?,
        ExportFormat::Svg => export_svg(&doc.elements, selection, EXPORT_PADDING)?.into_bytes(),
    };
    Ok(bytes)
}

/// Result of replaying a script against a stored board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub report: ReplayReport,
    pub element_count: usize,
    pub saved: bool,
}

/// Load a board, replay `steps` through the engine and save if it changed.
pub async fn replay_board<S: DocumentStore + ?Sized>(
    store: Arc<S>,
    id: &str,
    steps: &[script::ScriptStep],
    config: EngineConfig,
    dry_run: bool,
) -> AppResult<ReplayOutcome> {
    let mut sync = DocumentSync::new(store);
    let doc = sync.load(id).await?;
    let mut engine = Engine::new(config);
    engine.load_document(doc.elements, doc.view_state);

    let report = script::replay(&mut engine, steps);
    if engine.is_gesture_active() {
        log::warn!("script ended mid-gesture; cancelling it");
        engine.cancel_gesture();
    }

    let dirty = sync.is_dirty(engine.elements());
    let saved = dirty && !dry_run;
    if saved {
        sync.save(engine.elements().to_vec(), engine.view()).await?;
    }
    Ok(ReplayOutcome { report, element_count: engine.elements().len(), saved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::FileStore;
    use pollster::block_on;
    use tempfile::tempdir;

    const DRAW_TWO: &str = r#"[
        { "action": "tool", "tool": "rectangle" },
        { "action": "pointer", "event": "down", "position": { "x": 0, "y": 0 } },
        { "action": "pointer", "event": "up", "position": { "x": 100, "y": 50 } },
        { "action": "place", "component_type": "checklist", "width": 80, "height": 80, "at": { "x": 300, "y": 0 } }
    ]"#;

    #[test]
    fn test_replay_saves_and_info_reports() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()).unwrap());
        let doc = block_on(create_board(store.as_ref(), "Plan")).unwrap();
        let steps = script::parse_script(DRAW_TWO).unwrap();

        let dry = block_on(replay_board(store.clone(), &doc.id, &steps, EngineConfig::default(), true)).unwrap();
        assert!(!dry.saved);
        assert_eq!(dry.element_count, 2);
        assert_eq!(block_on(board_info(store.clone(), &doc.id)).unwrap().element_count(), 0);

        let outcome = block_on(replay_board(store.clone(), &doc.id, &steps, EngineConfig::default(), false)).unwrap();
        assert!(outcome.saved);

        let info = block_on(board_info(store.clone(), &doc.id)).unwrap();
        assert_eq!((info.shapes, info.components), (1, 1));
        assert_eq!(info.bounds, Some(Rect::new(0.0, 0.0, 380.0, 80.0)));
        assert!(info.to_string().starts_with("Plan ("));

        let names: Vec<String> = block_on(list_boards(store.as_ref())).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Plan"]);
    }

    #[test]
    fn test_export_formats() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()).unwrap());
        let doc = block_on(create_board(store.as_ref(), "Export")).unwrap();
        let steps = script::parse_script(DRAW_TWO).unwrap();
        block_on(replay_board(store.clone(), &doc.id, &steps, EngineConfig::default(), false)).unwrap();

        let png = block_on(export_board(store.clone(), &doc.id, ExportFormat::Png, None, 2.0)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let svg = block_on(export_board(store.clone(), &doc.id, ExportFormat::Svg, None, 1.0)).unwrap();
        assert!(String::from_utf8(svg).unwrap().contains("checklist"));

        assert!(matches!(
            block_on(export_board(store, "missing", ExportFormat::Png, None, 2.0)),
            Err(AppError::Sync(_))
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out/board.PNG")), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_path(Path::new("board.svg")), Some(ExportFormat::Svg));
        assert_eq!(ExportFormat::from_path(Path::new("board")), None);
    }

    #[test]
    fn test_bad_config_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ \"history_limit\": \"lots\" }").unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Config { .. })));
        fs::write(&path, r#"{ "min_zoom": 6.0 }"#).unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Config { .. })));
        fs::write(&path, r#"{ "min_zoom": 0.5, "max_zoom": 2.0 }"#).unwrap();
        assert_eq!(load_config(&path).unwrap().max_zoom, 2.0);
        assert!(matches!(load_config(&dir.path().join("absent.json")), Err(AppError::Io { .. })));
    }
}
