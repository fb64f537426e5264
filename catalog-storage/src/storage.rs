use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

pub mod storage_item;

use storage_item::*;

macro_rules! take_guard {
    ($g:expr) => {
        match $g {
            Ok(guard) => guard,
            Err(poisoned) => {
                // a writer panicked mid-operation, the map itself is still consistent
                let guard = poisoned.into_inner();
                log::warn!("{} recovered from poisoning", stringify!($g));
                guard
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("item {0} not found")]
    NotFound(ItemId),
}

type StorageMap = BTreeMap<ItemId, Item>;

struct StorageState {
    items: StorageMap,
    last_id: ItemId,
}

/// In-memory item store
///
/// Owns the item map together with the id counter. Ids start at 1, grow
/// strictly and are never handed out again, even after a delete or `clear`.
pub struct ItemStore {
    state: Mutex<StorageState>,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    /// Creates an empty store
    pub fn new() -> Self {
        ItemStore {
            state: Mutex::new(StorageState {
                items: StorageMap::new(),
                last_id: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<StorageState> {
        take_guard!(self.state.lock())
    }

    /// Returns all items in ascending id order
    pub fn list(&self) -> Vec<Item> {
        self.lock().items.values().cloned().collect()
    }

    /// Stores a new item under the next id
    pub fn create(&self, fields: ItemFields) -> Item {
        let mut state = self.lock();
        state.last_id += 1;
        let item = Item::from_fields(state.last_id, fields);
        state.items.insert(item.id, item.clone());

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("created item: {:?}", item);
        }
        item
    }

    /// Gets an item by id
    pub fn get(&self, id: ItemId) -> Result<Item, StorageError> {
        self.lock()
            .items
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    /// Overwrites every field of an existing item, keeping its id
    pub fn replace(&self, id: ItemId, fields: ItemFields) -> Result<Item, StorageError> {
        let mut state = self.lock();
        match state.items.get_mut(&id) {
            Some(stored) => {
                *stored = Item::from_fields(id, fields);
                if log::log_enabled!(log::Level::Trace) {
                    log::trace!("replaced item: {:?}", stored);
                }
                Ok(stored.clone())
            }
            None => Err(StorageError::NotFound(id)),
        }
    }

    /// Removes an item
    pub fn delete(&self, id: ItemId) -> Result<(), StorageError> {
        match self.lock().items.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Removes all items, the id counter keeps going
    pub fn clear(&self) {
        self.lock().items.clear();
    }
}
