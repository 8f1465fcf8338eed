//! Client-side cache of paginated collections.
//!
//! This module holds the storage side of the list layer:
//! - `CollectionKey` names one list (optionally per entity)
//! - `Collection<T>` carries the items plus the page cursor and fetch flags
//! - `CacheStore<T>` is the get/set/invalidate contract, with an in-memory
//!   process-wide implementation

mod collection;
mod key;
mod store;

pub use collection::Collection;
pub use key::CollectionKey;
pub use store::{CacheStore, MemoryStore};
