//! Paginated collections kept in sync with a shared cache.
//!
//! `PagedCacheList<T, F, S>` manages every list of one item type against a
//! `RemoteFetcher` and a `CacheStore`. It owns the page-cursor protocol the
//! list screens need: first load, forward pagination until an empty page,
//! pull-to-refresh, invalidation and optimistic local edits.
//!
//! # Example
//!
//! ```ignore
//! let list = PagedCacheList::new(api_fetcher).with_sink(Arc::new(sink));
//! let key = CollectionKey::new("favorite");
//!
//! let favorites = list.initial_load(&key).await?;
//! list.load_more(&key).await?;   // on end reached
//! list.refresh(&key).await?;     // on pull-to-refresh
//!
//! // Before the delete request is confirmed
//! list.optimistic_remove(&key, |audio| audio.id == removed_id);
//! let result = client.remove_favorite(&removed_id).await;
//! list.settle(&key, &result);
//! ```
//!
//! Every fetch is tagged with the collection's `generation`. A refresh bumps
//! it, so a `load_more` response issued before the refresh is dropped when
//! it finally arrives instead of being appended to the fresh first page.

mod fetcher;
mod grouped;

pub use fetcher::RemoteFetcher;
pub use grouped::{merge_by_group_key, Grouped};

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, Collection, CollectionKey, MemoryStore};
use crate::error::{FetchError, LoadOutcome, SkipReason};
use crate::notify::{Notification, NotificationSink, TracingSink};

/// Combines the cached items with a newly fetched page.
type MergeFn<T> = fn(Vec<T>, Vec<T>) -> Vec<T>;

fn append<T>(mut existing: Vec<T>, page: Vec<T>) -> Vec<T> {
  existing.extend(page);
  existing
}

/// Where an optimistically inserted item goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
  Front,
  Back,
}

/// Generic paginated collection manager.
pub struct PagedCacheList<T, F, S = MemoryStore<T>> {
  store: Arc<S>,
  fetcher: Arc<F>,
  sink: Arc<dyn NotificationSink>,
  merge: MergeFn<T>,
  stale_time: Option<Duration>,
}

impl<T, F> PagedCacheList<T, F, MemoryStore<T>>
where
  T: Clone + Send + Sync + 'static,
  F: RemoteFetcher<T>,
{
  /// Create a list manager with its own in-memory store.
  pub fn new(fetcher: F) -> Self {
    Self::with_store(fetcher, Arc::new(MemoryStore::new()))
  }
}

impl<T, F, S> PagedCacheList<T, F, S>
where
  T: Clone + Send + Sync + 'static,
  F: RemoteFetcher<T>,
  S: CacheStore<T>,
{
  /// Create a list manager over a shared store.
  pub fn with_store(fetcher: F, store: Arc<S>) -> Self {
    Self {
      store,
      fetcher: Arc::new(fetcher),
      sink: Arc::new(TracingSink),
      merge: append,
      stale_time: None,
    }
  }

  /// Send fetch failures to `sink` instead of the log.
  pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
    self.sink = sink;
    self
  }

  /// Refresh cached collections older than `stale_time` on the next read.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = Some(stale_time);
    self
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// Current cached state, without fetching.
  pub fn get(&self, key: &CollectionKey) -> Option<Collection<T>> {
    self.store.get(key)
  }

  /// Return the cached collection, fetching page 0 first if there is none.
  ///
  /// A collection that was invalidated (or outlived the stale time) is
  /// refreshed before being returned. While another first load for the same
  /// key is in flight, the loading placeholder is returned as is.
  pub async fn initial_load(&self, key: &CollectionKey) -> Result<Collection<T>, FetchError> {
    if let Some(cached) = self.store.get(key) {
      if cached.is_refreshing || !cached.needs_refresh(self.stale_time) {
        return Ok(cached);
      }
      debug!(key = %key, "cached collection is stale");
      self.refresh(key).await?;
      return Ok(self.store.get(key).unwrap_or_default());
    }

    if !self.store.insert_if_absent(key, Collection::loading()) {
      return Ok(self.store.get(key).unwrap_or_default());
    }

    info!(key = %key, "loading first page");
    match self.fetcher.fetch_page(key, 0).await {
      Ok(items) => {
        self.apply_first_page(key, 0, items);
        Ok(self.store.get(key).unwrap_or_default())
      }
      Err(e) => {
        self.store.remove(key);
        self.report(key, &e);
        Err(e)
      }
    }
  }

  /// Fetch the next page and merge it into the collection.
  ///
  /// No-op while a forward fetch or a refresh is in flight, or once an empty
  /// page has been seen. Duplicate calls are dropped, not queued.
  pub async fn load_more(&self, key: &CollectionKey) -> Result<LoadOutcome, FetchError> {
    let claim = self.store.update(key, |c| {
      if c.is_fetching_more || c.is_refreshing {
        return Err(SkipReason::InFlight);
      }
      if !c.has_more {
        return Err(SkipReason::Exhausted);
      }
      c.is_fetching_more = true;
      Ok((c.page + 1, c.generation))
    });

    let (next, generation) = match claim {
      None => return Ok(LoadOutcome::Skipped(SkipReason::Absent)),
      Some(Err(reason)) => {
        debug!(key = %key, ?reason, "load more skipped");
        return Ok(LoadOutcome::Skipped(reason));
      }
      Some(Ok(claimed)) => claimed,
    };

    info!(key = %key, page = next, "loading more");
    match self.fetcher.fetch_page(key, next).await {
      Ok(items) => {
        let received = items.len();
        let merge = self.merge;
        let applied = self
          .store
          .update(key, |c| {
            c.is_fetching_more = false;
            if c.generation != generation {
              return false;
            }
            if items.is_empty() {
              c.has_more = false;
            }
            c.page = next;
            let existing = std::mem::take(&mut c.items);
            c.items = merge(existing, items);
            true
          })
          .unwrap_or(false);

        if applied {
          Ok(LoadOutcome::Applied { received })
        } else {
          debug!(key = %key, page = next, "discarding page from before refresh");
          Ok(LoadOutcome::StaleDiscarded)
        }
      }
      Err(e) => {
        let current = self
          .store
          .update(key, |c| {
            c.is_fetching_more = false;
            c.generation == generation
          })
          .unwrap_or(false);
        if !current {
          debug!(key = %key, page = next, error = %e, "ignoring failure from before refresh");
          return Ok(LoadOutcome::StaleDiscarded);
        }
        self.report(key, &e);
        Err(e)
      }
    }
  }

  /// Refetch page 0 and replace the items with it.
  ///
  /// Bumps the generation so that any `load_more` still in flight is
  /// discarded on arrival. On failure the previous items, page and
  /// end-of-list state are kept.
  pub async fn refresh(&self, key: &CollectionKey) -> Result<LoadOutcome, FetchError> {
    let claim = self.store.update(key, |c| {
      if c.is_refreshing {
        return None;
      }
      c.is_refreshing = true;
      c.generation += 1;
      let was_stale = std::mem::replace(&mut c.stale, false);
      Some((c.generation, was_stale))
    });

    let (generation, was_stale) = match claim {
      None => return Ok(LoadOutcome::Skipped(SkipReason::Absent)),
      Some(None) => return Ok(LoadOutcome::Skipped(SkipReason::InFlight)),
      Some(Some(claimed)) => claimed,
    };

    info!(key = %key, generation, "refreshing");
    match self.fetcher.fetch_page(key, 0).await {
      Ok(items) => {
        let received = items.len();
        if self.apply_first_page(key, generation, items) {
          Ok(LoadOutcome::Applied { received })
        } else {
          Ok(LoadOutcome::StaleDiscarded)
        }
      }
      Err(e) => {
        self.store.update(key, |c| {
          if c.generation == generation {
            c.is_refreshing = false;
            c.stale |= was_stale;
          }
        });
        self.report(key, &e);
        Err(e)
      }
    }
  }

  /// Mark the collection stale; the next `initial_load` refetches it.
  pub fn invalidate(&self, key: &CollectionKey) -> bool {
    self.store.invalidate(key)
  }

  /// Drop matching items right away, before the server confirms.
  ///
  /// Page cursor and end-of-list state are untouched. Nothing is rolled
  /// back if the confirming request fails; pass its result to `settle`.
  pub fn optimistic_remove<P>(&self, key: &CollectionKey, predicate: P) -> usize
  where
    P: Fn(&T) -> bool,
  {
    let removed = self
      .store
      .update(key, |c| {
        let before = c.items.len();
        c.items.retain(|item| !predicate(item));
        before - c.items.len()
      })
      .unwrap_or(0);
    debug!(key = %key, removed, "optimistic remove");
    removed
  }

  /// Insert an item right away, before the server confirms.
  pub fn optimistic_insert(&self, key: &CollectionKey, item: T, position: Position) -> bool {
    let inserted = self
      .store
      .update(key, |c| match position {
        Position::Front => c.items.insert(0, item),
        Position::Back => c.items.push(item),
      })
      .is_some();
    debug!(key = %key, inserted, "optimistic insert");
    inserted
  }

  /// Reconcile after the request an optimistic edit anticipated.
  ///
  /// On failure the error is reported and the collection invalidated so it
  /// reflects server state on the next read. Returns whether it was
  /// invalidated.
  pub fn settle<R>(&self, key: &CollectionKey, result: &Result<R, FetchError>) -> bool {
    match result {
      Ok(_) => false,
      Err(e) => {
        self.report(key, e);
        self.invalidate(key)
      }
    }
  }

  /// Refresh collections in the background whenever they are invalidated.
  ///
  /// The task runs until the handle is aborted.
  pub fn refetch_on_invalidate(&self) -> JoinHandle<()>
  where
    F: 'static,
    S: 'static,
  {
    let list = self.clone();
    let mut invalidations = self.store.subscribe();

    tokio::spawn(async move {
      loop {
        match invalidations.recv().await {
          Ok(key) => {
            // Failures are reported by refresh itself
            let _ = list.refresh(&key).await;
          }
          Err(RecvError::Lagged(skipped)) => {
            warn!(skipped, "missed invalidations, collections stay stale until read");
          }
          Err(RecvError::Closed) => break,
        }
      }
    })
  }

  fn apply_first_page(&self, key: &CollectionKey, generation: u64, items: Vec<T>) -> bool {
    self
      .store
      .update(key, |c| {
        if c.generation != generation {
          return false;
        }
        c.is_refreshing = false;
        c.reset_to(items);
        true
      })
      .unwrap_or(false)
  }

  fn report(&self, key: &CollectionKey, error: &FetchError) {
    warn!(key = %key, error = %error, "fetch failed");
    self.sink.notify(Notification::error(error.user_message()));
  }
}

impl<T, F, S> PagedCacheList<T, F, S>
where
  T: Grouped + Clone + Send + Sync + 'static,
  F: RemoteFetcher<T>,
  S: CacheStore<T>,
{
  /// Merge pages with `merge_by_group_key` instead of appending.
  pub fn with_grouped_merge(mut self) -> Self {
    self.merge = grouped::merge_grouped;
    self
  }

  /// Drop matching members from every group, and groups left empty.
  pub fn optimistic_remove_members<P>(&self, key: &CollectionKey, predicate: P) -> usize
  where
    P: Fn(&T::Member) -> bool,
  {
    let removed = self
      .store
      .update(key, |c| grouped::remove_members(&mut c.items, predicate))
      .unwrap_or(0);
    debug!(key = %key, removed, "optimistic remove from groups");
    removed
  }
}

impl<T, F, S> Clone for PagedCacheList<T, F, S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      fetcher: Arc::clone(&self.fetcher),
      sink: Arc::clone(&self.sink),
      merge: self.merge,
      stale_time: self.stale_time,
    }
  }
}

impl<T, F, S> std::fmt::Debug for PagedCacheList<T, F, S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PagedCacheList")
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}
