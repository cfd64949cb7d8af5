//! Document store abstraction.
//!
//! A store persists whole documents (elements plus view state) and accepts
//! partial updates. Elements are kept as raw JSON so that loading can report
//! which persisted element is malformed.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::view::ViewState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elements: Vec<Value>,
    #[serde(default)]
    pub view_state: ViewState,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), elements: Vec::new(), view_state: ViewState::default() }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: DocumentUpdate) {
        if let Some(elements) = update.elements {
            self.elements = elements;
        }
        if let Some(view_state) = update.view_state {
            self.view_state = view_state;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary { id: self.id.clone(), name: self.name.clone(), element_count: self.elements.len() }
    }
}

/// Partial document update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_state: Option<ViewState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    pub element_count: usize,
}

/// Trait for document store backends.
pub trait DocumentStore: Send + Sync {
    /// Fetch a whole document.
    fn get(&self, id: &str) -> BoxFuture<'_, StoreResult<StoredDocument>>;

    /// Apply a partial update to an existing document.
    fn put(&self, id: &str, update: DocumentUpdate) -> BoxFuture<'_, StoreResult<()>>;

    /// Create an empty document with a fresh id.
    fn create(&self, name: &str) -> BoxFuture<'_, StoreResult<StoredDocument>>;

    /// Delete a document. Deleting a missing document is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StoreResult<()>>;

    /// List all documents.
    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<DocumentSummary>>>;
}
