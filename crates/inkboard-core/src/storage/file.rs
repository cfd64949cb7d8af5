//! File-based store: one JSON file per document.

use super::{BoxFuture, DocumentStore, DocumentSummary, DocumentUpdate, StoreError, StoreResult, StoredDocument};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores documents as JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| io_error("", &base_path, e))?;
        }
        Ok(Self { base_path })
    }

    /// Store in the platform data directory.
    ///
    /// On Unix: `~/.local/share/inkboard/documents/`
    /// On Windows: `%LOCALAPPDATA%\inkboard\documents\`
    pub fn default_location() -> StoreResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StoreError::Network("could not determine home directory".to_string()))?;
        Self::new(base.join("inkboard").join("documents"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path for a document id.
    fn document_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }

    fn read(&self, id: &str) -> StoreResult<StoredDocument> {
        let path = self.document_path(id);
        let json = fs::read_to_string(&path).map_err(|e| io_error(id, &path, e))?;
        serde_json::from_str(&json)
            .map_err(|e| StoreError::Serialization(format!("failed to parse {}: {e}", path.display())))
    }

    fn write(&self, document: &StoredDocument) -> StoreResult<()> {
        let path = self.document_path(&document.id);
        let json = serde_json::to_string_pretty(document).map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(&path, json).map_err(|e| io_error(&document.id, &path, e))
    }
}

/// Map filesystem failures onto store error kinds.
fn io_error(id: &str, path: &Path, e: io::Error) -> StoreError {
    match e.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound(id.to_string()),
        io::ErrorKind::PermissionDenied => StoreError::Unauthorized(format!("{}: {e}", path.display())),
        _ => StoreError::Network(format!("{}: {e}", path.display())),
    }
}

impl DocumentStore for FileStore {
    fn get(&self, id: &str) -> BoxFuture<'_, StoreResult<StoredDocument>> {
        let result = self.read(id);
        Box::pin(async move { result })
    }

    fn put(&self, id: &str, update: DocumentUpdate) -> BoxFuture<'_, StoreResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut document = self.read(&id)?;
            document.apply(update);
            self.write(&document)
        })
    }

    fn create(&self, name: &str) -> BoxFuture<'_, StoreResult<StoredDocument>> {
        let document = StoredDocument::new(Uuid::new_v4().to_string(), name);
        Box::pin(async move {
            self.write(&document)?;
            Ok(document)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StoreResult<()>> {
        let path = self.document_path(id);
        let id = id.to_string();
        Box::pin(async move {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error(&id, &path, e)),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<DocumentSummary>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.base_path).map_err(|e| io_error("", &self.base_path, e))?;
            let mut summaries = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match self.read(stem) {
                    Ok(document) => summaries.push(document.summary()),
                    Err(e) => log::warn!("skipping unreadable document {}: {e}", path.display()),
                }
            }
            summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            Ok(summaries)
        })
    }
}
