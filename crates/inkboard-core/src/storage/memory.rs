//! In-memory store implementation.

use super::{BoxFuture, DocumentStore, DocumentSummary, DocumentUpdate, StoreError, StoreResult, StoredDocument};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// In-memory store for tests and ephemeral sessions.
///
/// [`MemoryStore::set_offline`] makes every call fail with a network error,
/// which lets callers exercise retry paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, StoredDocument>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document directly.
    pub fn insert(&self, document: StoredDocument) {
        if let Ok(mut docs) = self.documents.write() {
            docs.insert(document.id.clone(), document);
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Network("store is offline".to_string()));
        }
        Ok(())
    }
}

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Network(format!("lock error: {e}"))
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &str) -> BoxFuture<'_, StoreResult<StoredDocument>> {
        let id = id.to_string();
        Box::pin(async move {
            self.check_online()?;
            let docs = self.documents.read().map_err(lock_error)?;
            docs.get(&id).cloned().ok_or(StoreError::NotFound(id))
        })
    }

    fn put(&self, id: &str, update: DocumentUpdate) -> BoxFuture<'_, StoreResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.check_online()?;
            let mut docs = self.documents.write().map_err(lock_error)?;
            let doc = docs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            doc.apply(update);
            Ok(())
        })
    }

    fn create(&self, name: &str) -> BoxFuture<'_, StoreResult<StoredDocument>> {
        let doc = StoredDocument::new(Uuid::new_v4().to_string(), name);
        Box::pin(async move {
            self.check_online()?;
            let mut docs = self.documents.write().map_err(lock_error)?;
            docs.insert(doc.id.clone(), doc.clone());
            Ok(doc)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StoreResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.check_online()?;
            let mut docs = self.documents.write().map_err(lock_error)?;
            docs.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<DocumentSummary>>> {
        Box::pin(async move {
            self.check_online()?;
            let docs = self.documents.read().map_err(lock_error)?;
            let mut summaries: Vec<DocumentSummary> = docs.values().map(StoredDocument::summary).collect();
            summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            Ok(summaries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use serde_json::json;

    #[test]
    fn test_create_get_put() {
        let store = MemoryStore::new();
        let doc = block_on(store.create("Board")).unwrap();
        let update = DocumentUpdate { elements: Some(vec![json!({"x": 1})]), ..Default::default() };
        block_on(store.put(&doc.id, update)).unwrap();
        let loaded = block_on(store.get(&doc.id)).unwrap();
        assert_eq!(loaded.name, "Board");
        assert_eq!(loaded.elements.len(), 1);
    }

    #[test]
    fn test_missing_document() {
        let store = MemoryStore::new();
        assert!(matches!(block_on(store.get("nope")), Err(StoreError::NotFound(_))));
        assert!(matches!(
            block_on(store.put("nope", DocumentUpdate::default())),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_offline_fails_with_network() {
        let store = MemoryStore::new();
        let doc = block_on(store.create("Board")).unwrap();
        store.set_offline(true);
        assert!(matches!(block_on(store.get(&doc.id)), Err(StoreError::Network(_))));
        store.set_offline(false);
        assert!(block_on(store.get(&doc.id)).is_ok());
    }

    #[test]
    fn test_list_and_delete() {
        let store = MemoryStore::new();
        let b = block_on(store.create("b")).unwrap();
        block_on(store.create("a")).unwrap();
        let names: Vec<String> = block_on(store.list()).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        block_on(store.delete(&b.id)).unwrap();
        assert_eq!(block_on(store.list()).unwrap().len(), 1);
    }
}
