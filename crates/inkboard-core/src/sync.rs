//! Document load/save against a [`DocumentStore`] with dirty tracking.
//!
//! The dirty flag compares a canonical serialisation of the live elements
//! (sorted by id) with the snapshot taken at the last successful load or
//! save. A failed save leaves the baseline alone, so the document stays
//! dirty and the host can retry.

use crate::element::{Element, ElementId};
use crate::storage::{DocumentStore, DocumentUpdate, StoreError};
use crate::view::{MAX_ZOOM, MIN_ZOOM, ViewState};
use log::{error, info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Load/save errors surfaced to the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("network error: {0}")]
    Network(String),
    /// A persisted element envelope (id, type, position) could not be read.
    /// `index` is its position in the stored element array, when known.
    #[error("invalid element (index {index:?}): {reason}")]
    ValidationFailure { index: Option<usize>, reason: String },
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => SyncError::NotFound(id),
            StoreError::Unauthorized(msg) => SyncError::Unauthorized(msg),
            StoreError::Network(msg) => SyncError::Network(msg),
            StoreError::Serialization(reason) => SyncError::ValidationFailure { index: None, reason },
        }
    }
}

/// A document ready to hand to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub id: String,
    pub name: String,
    pub elements: Vec<Element>,
    pub view_state: ViewState,
}

/// Parse persisted elements.
///
/// Unreadable payloads load as inert elements that keep their raw data, and
/// a repeated id is replaced with a fresh one. Only an unreadable envelope
/// fails the load.
pub fn parse_elements(values: Vec<Value>) -> Result<Vec<Element>, SyncError> {
    let mut seen: HashSet<ElementId> = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let mut element: Element = serde_json::from_value(value)
                .map_err(|e| SyncError::ValidationFailure { index: Some(index), reason: e.to_string() })?;
            if let Some(reason) = element.invalid_reason() {
                warn!("element {} (index {index}) has unreadable data: {reason}", element.id);
            }
            if !seen.insert(element.id) {
                let fresh = Uuid::new_v4();
                warn!("duplicate element id {} at index {index}; reassigned to {fresh}", element.id);
                element.id = fresh;
                seen.insert(fresh);
            }
            Ok(element)
        })
        .collect()
}

/// Canonical serialisation used for dirty tracking.
pub fn snapshot(elements: &[Element]) -> String {
    let mut sorted: Vec<&Element> = elements.iter().collect();
    sorted.sort_by_key(|e| e.id);
    serde_json::to_string(&sorted).unwrap_or_default()
}

/// Load/save session for one document.
pub struct DocumentSync<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    document_id: Option<String>,
    baseline: Option<String>,
}

impl<S: DocumentStore + ?Sized> DocumentSync<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, document_id: None, baseline: None }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Id of the loaded document.
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Fetch and validate a document.
    ///
    /// On failure the session is left exactly as it was.
    pub async fn load(&mut self, id: &str) -> Result<LoadedDocument, SyncError> {
        let stored = self.store.get(id).await?;
        let elements = parse_elements(stored.elements)?;
        let view_state = stored.view_state.clamped(MIN_ZOOM, MAX_ZOOM);
        info!("loaded document {id} ({} elements)", elements.len());
        self.document_id = Some(id.to_string());
        self.baseline = Some(snapshot(&elements));
        Ok(LoadedDocument { id: id.to_string(), name: stored.name, elements, view_state })
    }

    /// Persist a snapshot of the board.
    ///
    /// The caller passes owned copies, so edits may continue while the save
    /// is in flight.
    pub async fn save(&mut self, elements: Vec<Element>, view_state: ViewState) -> Result<(), SyncError> {
        let Some(id) = self.document_id.clone() else {
            return Err(SyncError::NotFound("no document loaded".to_string()));
        };
        let baseline = snapshot(&elements);
        let values = elements
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SyncError::ValidationFailure { index: None, reason: e.to_string() })?;
        let update = DocumentUpdate { elements: Some(values), view_state: Some(view_state), name: None };

        match self.store.put(&id, update).await {
            Ok(()) => {
                info!("saved document {id} ({} elements)", elements.len());
                self.baseline = Some(baseline);
                Ok(())
            }
            Err(e) => {
                error!("saving document {id} failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Whether `elements` differ from the last loaded or saved state.
    pub fn is_dirty(&self, elements: &[Element]) -> bool {
        match &self.baseline {
            Some(baseline) => *baseline != snapshot(elements),
            None => !elements.is_empty(),
        }
    }

    /// Accept `elements` as the clean state without saving, e.g. on discard.
    pub fn mark_clean(&mut self, elements: &[Element]) {
        self.baseline = Some(snapshot(elements));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Color, Payload, TextPayload};
    use crate::storage::{MemoryStore, StoredDocument};
    use kurbo::Point;
    use pollster::block_on;
    use serde_json::json;

    fn note(text: &str) -> Element {
        Element::drawing(
            Point::ZERO,
            0,
            Payload::Text(TextPayload { text: text.into(), color: Color::black(), font_size: 16.0 }),
        )
    }

    fn seeded_store(elements: Vec<Value>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let mut doc = StoredDocument::new("doc", "Board");
        doc.elements = elements;
        doc.view_state = ViewState::new(5.0, 5.0, 40.0);
        store.insert(doc);
        store
    }

    #[test]
    fn test_load_validates_and_clamps() {
        let element = note("hi");
        let store = seeded_store(vec![serde_json::to_value(&element).unwrap()]);
        let mut sync = DocumentSync::new(store);
        let loaded = block_on(sync.load("doc")).unwrap();
        assert_eq!(loaded.elements, vec![element]);
        assert_eq!(loaded.view_state.zoom, MAX_ZOOM);
        assert!(!sync.is_dirty(&loaded.elements));
    }

    #[test]
    fn test_load_reports_malformed_envelope_index() {
        let good = serde_json::to_value(note("ok")).unwrap();
        let bad = json!({ "type": "drawing", "x": 0, "y": 0, "data": { "text": "no id" } });
        let store = seeded_store(vec![good, bad]);
        let mut sync = DocumentSync::new(store);
        match block_on(sync.load("doc")) {
            Err(SyncError::ValidationFailure { index, .. }) => assert_eq!(index, Some(1)),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(sync.document_id(), None);
    }

    #[test]
    fn test_corrupt_payload_loads_inert_and_saves_back() {
        let good = note("ok");
        let bad = json!({
            "id": "6f1c4b2e-8f0a-4d7e-9a4b-2f4e1c0d9b99",
            "type": "drawing",
            "x": 0,
            "y": 0,
            "data": { "shapeType": "hexagon" }
        });
        let store = seeded_store(vec![serde_json::to_value(&good).unwrap(), bad.clone()]);
        let mut sync = DocumentSync::new(store.clone());
        let loaded = block_on(sync.load("doc")).unwrap();

        assert_eq!(loaded.elements.len(), 2);
        assert_eq!(loaded.elements[0], good);
        let corrupt = &loaded.elements[1];
        assert!(corrupt.invalid_reason().is_some());
        assert!(!crate::geometry::is_interactive(corrupt));
        assert!(!sync.is_dirty(&loaded.elements));

        block_on(sync.save(loaded.elements, loaded.view_state)).unwrap();
        let stored = block_on(store.get("doc")).unwrap();
        assert_eq!(stored.elements[1]["data"], bad["data"]);
    }

    #[test]
    fn test_duplicate_ids_are_reassigned() {
        let original = note("twice");
        let value = serde_json::to_value(&original).unwrap();
        let store = seeded_store(vec![value.clone(), value]);
        let mut sync = DocumentSync::new(store);
        let loaded = block_on(sync.load("doc")).unwrap();
        assert_eq!(loaded.elements.len(), 2);
        assert_eq!(loaded.elements[0].id, original.id);
        assert_ne!(loaded.elements[1].id, original.id);
        assert_eq!(loaded.elements[1].payload, original.payload);
    }

    #[test]
    fn test_missing_document_maps_to_not_found() {
        let mut sync = DocumentSync::new(Arc::new(MemoryStore::new()));
        assert!(matches!(block_on(sync.load("nope")), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn test_dirty_tracking_and_failed_save() {
        let store = seeded_store(vec![]);
        let mut sync = DocumentSync::new(store.clone());
        let loaded = block_on(sync.load("doc")).unwrap();
        let mut elements = loaded.elements;
        assert!(!sync.is_dirty(&elements));

        elements.push(note("new"));
        assert!(sync.is_dirty(&elements));

        store.set_offline(true);
        let result = block_on(sync.save(elements.clone(), ViewState::default()));
        assert!(matches!(result, Err(SyncError::Network(_))));
        assert!(sync.is_dirty(&elements));

        store.set_offline(false);
        block_on(sync.save(elements.clone(), ViewState::default())).unwrap();
        assert!(!sync.is_dirty(&elements));

        let stored = block_on(store.get("doc")).unwrap();
        assert_eq!(stored.elements.len(), 1);
        assert_eq!(stored.name, "Board");
    }

    #[test]
    fn test_snapshot_ignores_order() {
        let a = note("a");
        let b = note("b");
        assert_eq!(snapshot(&[a.clone(), b.clone()]), snapshot(&[b, a]));
    }
}
