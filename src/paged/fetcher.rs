//! The remote side of a paged collection.

use futures::future::BoxFuture;
use std::future::Future;

use crate::cache::CollectionKey;
use crate::error::FetchError;

/// Fetches one page of a collection from the server.
///
/// Pages are 0-indexed. An empty page means the collection is exhausted.
pub trait RemoteFetcher<T>: Send + Sync {
  fn fetch_page<'a>(
    &'a self,
    key: &'a CollectionKey,
    page: u32,
  ) -> BoxFuture<'a, Result<Vec<T>, FetchError>>;
}

/// Any `Fn(key, page) -> future` works as a fetcher.
///
/// ```ignore
/// let fetcher = move |key: CollectionKey, page: u32| {
///   let client = client.clone();
///   async move { client.page(&key, page).await }
/// };
/// ```
impl<T, F, Fut> RemoteFetcher<T> for F
where
  F: Fn(CollectionKey, u32) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
{
  fn fetch_page<'a>(
    &'a self,
    key: &'a CollectionKey,
    page: u32,
  ) -> BoxFuture<'a, Result<Vec<T>, FetchError>> {
    Box::pin(self(key.clone(), page))
  }
}
