//! In-memory cloth catalog.
//!
//! Bookkeeping only: nothing here is persisted, and entries reach the engine
//! only when a caller aggregates them with [`LoadSummary`](super::LoadSummary).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{WashError, WashResult};
use crate::washer::load::ClothItem;

/// Default page size for [`ClothCatalog::list`]
pub const DEFAULT_LIMIT: usize = 100;

/// A stored cloth with its assigned id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    #[serde(flatten)]
    pub item: ClothItem,
}

/// Id-assigning store of garments, in insertion order
#[derive(Debug, Clone)]
pub struct ClothCatalog {
    entries: IndexMap<u64, ClothItem>,
    next_id: u64,
}

impl Default for ClothCatalog {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            next_id: 1,
        }
    }
}

impl ClothCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store an item, returning the new entry
    pub fn create(&mut self, item: ClothItem) -> WashResult<CatalogEntry> {
        item.validate()?;
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, item.clone());
        Ok(CatalogEntry { id, item })
    }

    pub fn get(&self, id: u64) -> WashResult<CatalogEntry> {
        self.entries
            .get(&id)
            .map(|item| CatalogEntry {
                id,
                item: item.clone(),
            })
            .ok_or_else(|| WashError::cloth_not_found(id))
    }

    /// Entries `skip..skip + limit` in insertion order
    pub fn list(&self, skip: usize, limit: usize) -> Vec<CatalogEntry> {
        self.entries
            .iter()
            .skip(skip)
            .take(limit)
            .map(|(&id, item)| CatalogEntry {
                id,
                item: item.clone(),
            })
            .collect()
    }

    /// Look up several ids, failing on the first unknown one
    pub fn items(&self, ids: &[u64]) -> WashResult<Vec<ClothItem>> {
        ids.iter()
            .map(|&id| self.get(id).map(|entry| entry.item))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
