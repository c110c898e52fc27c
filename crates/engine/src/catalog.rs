use crate::error::EngineError;
use analytics::{MetricsEngine, TableRow};
use chrono::{DateTime, Utc};
use core_types::{ItemId, ItemSnapshot};
use std::collections::HashMap;

/// The current set of item snapshots, keyed by item id.
///
/// The catalog is only ever replaced as a whole. Until the first successful load
/// it is empty, and lookups report `NotFound`.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<ItemId, ItemSnapshot>,
    loaded_at: Option<DateTime<Utc>>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a new set of snapshots, discarding every previous entry.
    /// Returns the number of items now held.
    pub fn replace(&mut self, items: HashMap<ItemId, ItemSnapshot>) -> usize {
        self.items = items;
        self.loaded_at = Some(Utc::now());
        self.items.len()
    }

    /// Looks up one item. `NotFound` is expected while the catalog is still loading.
    pub fn get(&self, id: ItemId) -> Result<&ItemSnapshot, EngineError> {
        self.items.get(&id).ok_or(EngineError::NotFound(id))
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemSnapshot> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once a summary has been loaded, even if it held no items.
    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Table rows for every item, annotated with margin and ROI.
    pub fn rows(&self, metrics: &MetricsEngine) -> Vec<TableRow> {
        self.iter()
            .map(|snapshot| TableRow::from_snapshot(snapshot, metrics))
            .collect()
    }
}
