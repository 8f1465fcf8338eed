//! Cache store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

use super::collection::Collection;
use super::key::CollectionKey;

/// Capacity of the invalidation channel. Slow subscribers skip ahead.
const INVALIDATION_CAPACITY: usize = 64;

/// Trait for cache storage backends.
///
/// Every operation reads or writes one entry at a time; `update` is the
/// read-modify-write primitive and must not be interleaved with another
/// write to the same key.
pub trait CacheStore<T>: Send + Sync {
  /// Get a snapshot of a cached collection.
  fn get(&self, key: &CollectionKey) -> Option<Collection<T>>;

  /// Store a collection, replacing any existing entry.
  fn set(&self, key: &CollectionKey, collection: Collection<T>);

  /// Store a collection only if the key is vacant. Returns true if stored.
  fn insert_if_absent(&self, key: &CollectionKey, collection: Collection<T>) -> bool;

  /// Mutate a cached collection in place. Returns `None` when absent.
  fn update<R>(&self, key: &CollectionKey, f: impl FnOnce(&mut Collection<T>) -> R) -> Option<R>;

  /// Mark a collection stale and notify subscribers. Returns false if absent.
  fn invalidate(&self, key: &CollectionKey) -> bool;

  /// Drop a collection entirely.
  fn remove(&self, key: &CollectionKey) -> bool;

  /// Keys of all cached collections.
  fn keys(&self) -> Vec<CollectionKey>;

  /// Subscribe to invalidations.
  fn subscribe(&self) -> broadcast::Receiver<CollectionKey>;
}

/// Process-wide in-memory store, one entry per collection key.
pub struct MemoryStore<T> {
  entries: Mutex<HashMap<CollectionKey, Collection<T>>>,
  invalidations: broadcast::Sender<CollectionKey>,
}

impl<T> MemoryStore<T> {
  pub fn new() -> Self {
    let (invalidations, _) = broadcast::channel(INVALIDATION_CAPACITY);
    Self {
      entries: Mutex::new(HashMap::new()),
      invalidations,
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<CollectionKey, Collection<T>>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> Default for MemoryStore<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Clone + Send> CacheStore<T> for MemoryStore<T> {
  fn get(&self, key: &CollectionKey) -> Option<Collection<T>> {
    let entries = self.lock();
    let value = entries.get(key).cloned();
    if value.is_some() {
      debug!(key = %key, "Cache HIT");
    } else {
      debug!(key = %key, "Cache MISS");
    }
    value
  }

  fn set(&self, key: &CollectionKey, collection: Collection<T>) {
    debug!(key = %key, items = collection.len(), "Cache PUT");
    self.lock().insert(key.clone(), collection);
  }

  fn insert_if_absent(&self, key: &CollectionKey, collection: Collection<T>) -> bool {
    let mut entries = self.lock();
    if entries.contains_key(key) {
      return false;
    }
    debug!(key = %key, "Cache PUT (vacant)");
    entries.insert(key.clone(), collection);
    true
  }

  fn update<R>(&self, key: &CollectionKey, f: impl FnOnce(&mut Collection<T>) -> R) -> Option<R> {
    self.lock().get_mut(key).map(f)
  }

  fn invalidate(&self, key: &CollectionKey) -> bool {
    let found = match self.lock().get_mut(key) {
      Some(collection) => {
        collection.stale = true;
        true
      }
      None => false,
    };
    debug!(key = %key, found, "Cache INVALIDATE");
    if found {
      // No subscribers is fine
      let _ = self.invalidations.send(key.clone());
    }
    found
  }

  fn remove(&self, key: &CollectionKey) -> bool {
    debug!(key = %key, "Cache REMOVE");
    self.lock().remove(key).is_some()
  }

  fn keys(&self) -> Vec<CollectionKey> {
    let mut keys: Vec<CollectionKey> = self.lock().keys().cloned().collect();
    keys.sort();
    keys
  }

  fn subscribe(&self) -> broadcast::Receiver<CollectionKey> {
    self.invalidations.subscribe()
  }
}
