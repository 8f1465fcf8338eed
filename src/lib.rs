//! Paged, cache-synchronized collections for the audio streaming client.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod paged;

pub use cache::{CacheStore, Collection, CollectionKey, MemoryStore};
pub use error::{FetchError, LoadOutcome, SkipReason};
pub use notify::{ChannelSink, Notification, NotificationSink, Severity, TracingSink};
pub use paged::{merge_by_group_key, Grouped, PagedCacheList, Position, RemoteFetcher};
