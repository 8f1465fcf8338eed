//! The cached, paginated representation of one list.

use chrono::{DateTime, Duration, Utc};

/// One named list fetched page by page from the server.
///
/// `page` counts successfully applied forward fetches (page 0 is the first
/// page). `generation` is bumped by every refresh; results issued under an
/// older generation are dropped on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
  pub items: Vec<T>,
  pub page: u32,
  pub has_more: bool,
  pub is_refreshing: bool,
  pub is_fetching_more: bool,
  pub generation: u64,
  /// Set by `invalidate`; the next read refetches from page 0.
  pub stale: bool,
  /// When page 0 was last fetched.
  pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for Collection<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      page: 0,
      has_more: true,
      is_refreshing: false,
      is_fetching_more: false,
      generation: 0,
      stale: false,
      fetched_at: None,
    }
  }
}

impl<T> Collection<T> {
  /// Placeholder stored while the very first page is in flight.
  pub fn loading() -> Self {
    Self {
      is_refreshing: true,
      ..Self::default()
    }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Whether the collection needs a refetch before being served.
  pub fn needs_refresh(&self, stale_time: Option<Duration>) -> bool {
    if self.stale {
      return true;
    }
    match (stale_time, self.fetched_at) {
      (Some(stale_time), Some(fetched_at)) => Utc::now() - fetched_at > stale_time,
      _ => false,
    }
  }

  /// Replace the contents with a fresh first page.
  ///
  /// `stale` is left alone: an invalidation that landed while the page was
  /// in flight still forces the next read to refetch.
  pub(crate) fn reset_to(&mut self, first_page: Vec<T>) {
    self.has_more = !first_page.is_empty();
    self.items = first_page;
    self.page = 0;
    self.fetched_at = Some(Utc::now());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_has_more() {
    let collection: Collection<u32> = Collection::default();
    assert!(collection.has_more);
    assert_eq!(collection.page, 0);
    assert!(collection.is_empty());
  }

  #[test]
  fn test_reset_to_empty_page_ends_list() {
    let mut collection = Collection {
      items: vec![1, 2, 3],
      page: 4,
      ..Collection::default()
    };
    collection.reset_to(Vec::new());
    assert_eq!(collection.page, 0);
    assert!(!collection.has_more);
    assert!(collection.is_empty());
    assert!(collection.fetched_at.is_some());
  }

  #[test]
  fn test_needs_refresh() {
    let mut collection: Collection<u32> = Collection::default();
    collection.reset_to(vec![1]);
    assert!(!collection.needs_refresh(None));
    assert!(!collection.needs_refresh(Some(Duration::minutes(5))));

    collection.fetched_at = Some(Utc::now() - Duration::minutes(10));
    assert!(collection.needs_refresh(Some(Duration::minutes(5))));

    collection.fetched_at = Some(Utc::now());
    collection.stale = true;
    assert!(collection.needs_refresh(None));
  }
}
