//! **Item Catalog In-Memory Storage**
//!
//! A process-lifetime mapping of priced items keyed by a monotonic id.
//! Nothing is persisted.

pub mod storage;

pub use storage::storage_item::{Item, ItemFields, ItemId};
pub use storage::{ItemStore, StorageError};
