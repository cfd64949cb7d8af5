//! Live element collection with bounded undo/redo history.
//!
//! Every edit is recorded as a [`HistoryEntry`] holding full before/after
//! snapshots of the elements it touched. Undo applies the inverse of the
//! newest entry; redo re-applies it. Pushing a fresh entry clears redo.

use crate::element::{Element, ElementId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Default maximum number of undo entries.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Add,
    Remove,
    Update,
    /// Update that may also create or delete elements.
    Batch,
}

/// One reversible edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub before: Vec<Element>,
    pub after: Vec<Element>,
}

impl HistoryEntry {
    pub fn add(after: Vec<Element>) -> Self {
        Self { kind: EntryKind::Add, before: Vec::new(), after }
    }

    pub fn remove(before: Vec<Element>) -> Self {
        Self { kind: EntryKind::Remove, before, after: Vec::new() }
    }

    pub fn update(before: Vec<Element>, after: Vec<Element>) -> Self {
        Self { kind: EntryKind::Update, before, after }
    }

    pub fn batch(before: Vec<Element>, after: Vec<Element>) -> Self {
        Self { kind: EntryKind::Batch, before, after }
    }
}

/// Owns the working element collection for an editing session.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    elements: Vec<Element>,
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    limit: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            elements: Vec::new(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements in paint order (ascending zIndex, insertion order for ties).
    pub fn elements_by_z(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Direct mutable access for live gestures. Changes are not historized
    /// until the caller pushes an entry.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// zIndex for a newly created element. Saturates at `i64::MAX`.
    pub fn next_z_index(&self) -> i64 {
        self.elements.iter().map(|e| e.z_index).max().map_or(0, |z| z.saturating_add(1))
    }

    /// Append elements and record an `add` entry.
    pub fn add_elements(&mut self, new: Vec<Element>) {
        if new.is_empty() {
            return;
        }
        self.elements.extend(new.iter().cloned());
        self.push_action(HistoryEntry::add(new));
    }

    /// Remove matching elements and record a `remove` entry.
    ///
    /// Returns the removed elements; no entry is pushed when nothing matched.
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> Vec<Element> {
        let ids: HashSet<ElementId> = ids.iter().copied().collect();
        let (removed, kept): (Vec<Element>, Vec<Element>) =
            std::mem::take(&mut self.elements).into_iter().partition(|e| ids.contains(&e.id));
        self.elements = kept;
        if !removed.is_empty() {
            self.push_action(HistoryEntry::remove(removed.clone()));
        }
        removed
    }

    /// Replace elements by id and record one `update` entry.
    ///
    /// Returns false (and records nothing) when no id matched.
    pub fn update_elements(&mut self, updated: Vec<Element>) -> bool {
        let mut before = Vec::new();
        let mut after = Vec::new();
        for element in updated {
            if let Some(slot) = self.element_mut(element.id) {
                before.push(std::mem::replace(slot, element.clone()));
                after.push(element);
            }
        }
        if after.is_empty() {
            return false;
        }
        self.push_action(HistoryEntry::update(before, after));
        true
    }

    /// Record an entry for a change the caller already applied.
    pub fn push_action(&mut self, entry: HistoryEntry) {
        debug!(
            "history push {:?} ({} before, {} after)",
            entry.kind,
            entry.before.len(),
            entry.after.len()
        );
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Reset the collection and drop both stacks.
    pub fn replace_all(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undo the newest entry. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.undo_stack.pop_back() else {
            return false;
        };
        match entry.kind {
            EntryKind::Add => self.remove_ids(&entry.after),
            EntryKind::Remove => self.insert_missing(&entry.before),
            EntryKind::Update => self.restore(&entry.before, &entry.after, false),
            EntryKind::Batch => self.restore(&entry.before, &entry.after, true),
        }
        self.redo_stack.push(entry);
        true
    }

    /// Redo the most recently undone entry. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        match entry.kind {
            EntryKind::Add => self.insert_missing(&entry.after),
            EntryKind::Remove => self.remove_ids(&entry.before),
            EntryKind::Update => self.restore(&entry.after, &entry.before, false),
            EntryKind::Batch => self.restore(&entry.after, &entry.before, true),
        }
        self.undo_stack.push_back(entry);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.undo_stack.iter()
    }

    fn remove_ids(&mut self, snapshots: &[Element]) {
        let ids: HashSet<ElementId> = snapshots.iter().map(|e| e.id).collect();
        self.elements.retain(|e| !ids.contains(&e.id));
    }

    fn insert_missing(&mut self, snapshots: &[Element]) {
        for snapshot in snapshots {
            if !self.contains(snapshot.id) {
                self.elements.push(snapshot.clone());
            }
        }
    }

    /// Map elements to `target` snapshots by id. With `prune`, ids present in
    /// `other` but absent from `target` are dropped.
    fn restore(&mut self, target: &[Element], other: &[Element], prune: bool) {
        for snapshot in target {
            match self.element_mut(snapshot.id) {
                Some(slot) => *slot = snapshot.clone(),
                None => self.elements.push(snapshot.clone()),
            }
        }
        if prune {
            let keep: HashSet<ElementId> = target.iter().map(|e| e.id).collect();
            let drop: HashSet<ElementId> = other.iter().map(|e| e.id).filter(|id| !keep.contains(id)).collect();
            self.elements.retain(|e| !drop.contains(&e.id));
        }
    }
}
