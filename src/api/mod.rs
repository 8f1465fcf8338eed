//! REST bindings for the paged collections.
//!
//! `ApiFetcher<T>` is the `RemoteFetcher` used in the app: it looks up the
//! endpoint bound to a collection name, requests `pageNo`/`limit`, and pulls
//! the items out of the named response field.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{AudioData, History, HistoryAudio, Owner, Playlist, Visibility};

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::debug;

use crate::cache::CollectionKey;
use crate::config::CollectionBinding;
use crate::error::FetchError;
use crate::paged::RemoteFetcher;

/// Fetches pages of `T` from the endpoints bound in the configuration.
pub struct ApiFetcher<T> {
  client: ApiClient,
  bindings: BTreeMap<String, CollectionBinding>,
  _item: PhantomData<fn() -> T>,
}

impl<T> ApiFetcher<T> {
  pub fn new(client: ApiClient, bindings: BTreeMap<String, CollectionBinding>) -> Self {
    Self {
      client,
      bindings,
      _item: PhantomData,
    }
  }

  fn binding(&self, key: &CollectionKey) -> Result<&CollectionBinding, FetchError> {
    self
      .bindings
      .get(&key.name)
      .ok_or_else(|| FetchError::UnknownCollection(key.name.clone()))
  }
}

impl<T: DeserializeOwned + Send> RemoteFetcher<T> for ApiFetcher<T> {
  fn fetch_page<'a>(
    &'a self,
    key: &'a CollectionKey,
    page: u32,
  ) -> BoxFuture<'a, Result<Vec<T>, FetchError>> {
    Box::pin(async move {
      let binding = self.binding(key)?;
      let path = binding.resolve_path(key)?;
      let body = self.client.get_page(&path, page, binding.page_size).await?;
      let items = take_items(body, &binding.field)?;
      debug!(key = %key, page, count = items.len(), "page received");
      Ok(items)
    })
  }
}

/// Deserialize the list stored under `field` of a response body.
fn take_items<T: DeserializeOwned>(mut body: Value, field: &str) -> Result<Vec<T>, FetchError> {
  let items = body
    .get_mut(field)
    .map(Value::take)
    .ok_or_else(|| FetchError::Decode(format!("response has no '{}' field", field)))?;
  Ok(serde_json::from_value(items)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{default_bindings, ApiConfig};
  use crate::paged::PagedCacheList;
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn audio(id: &str) -> Value {
    json!({
      "id": id,
      "title": format!("Track {}", id),
      "about": "",
      "category": "Music",
      "file": format!("https://cdn.example.com/{}.mp3", id),
      "poster": null,
      "owner": { "id": "u1", "name": "Ada" }
    })
  }

  fn fetcher<T>(server: &MockServer) -> ApiFetcher<T> {
    let client = ApiClient::new(&ApiConfig {
      base_url: server.uri(),
      timeout_secs: 5,
    })
    .unwrap();
    ApiFetcher::new(client, default_bindings())
  }

  #[tokio::test]
  async fn test_fetch_favorites_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/favorite"))
      .and(query_param("pageNo", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audios": [audio("a1")] })))
      .mount(&server)
      .await;

    let fetcher = fetcher::<AudioData>(&server);
    let items = fetcher
      .fetch_page(&CollectionKey::new("favorite"), 1)
      .await
      .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "a1");
    assert_eq!(items[0].owner.name, "Ada");
  }

  #[tokio::test]
  async fn test_fetch_histories_sends_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/history"))
      .and(query_param("pageNo", "0"))
      .and(query_param("limit", "15"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "histories": [{
          "date": "2024-03-01",
          "audios": [{ "id": "h1", "audioId": "a1", "title": "Track a1", "date": "2024-03-01T10:00:00Z" }]
        }]
      })))
      .mount(&server)
      .await;

    let fetcher = fetcher::<History>(&server);
    let items = fetcher
      .fetch_page(&CollectionKey::new("histories"), 0)
      .await
      .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].date, "2024-03-01");
    assert_eq!(items[0].audios[0].audio_id, "a1");
  }

  #[tokio::test]
  async fn test_fetch_public_playlist_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/profile/playlist/u42"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "playlist": [{ "id": "p1", "title": "Road trip", "itemsCount": 3, "visibility": "public" }]
      })))
      .mount(&server)
      .await;

    let fetcher = fetcher::<Playlist>(&server);
    let items = fetcher
      .fetch_page(&CollectionKey::with_secondary("public-playlist", "u42"), 0)
      .await
      .unwrap();

    assert_eq!(items[0].items_count, 3);
    assert_eq!(items[0].visibility, Visibility::Public);

    let err = fetcher
      .fetch_page(&CollectionKey::new("public-playlist"), 0)
      .await
      .unwrap_err();
    assert_eq!(err, FetchError::MissingSecondaryKey("public-playlist".to_string()));
  }

  #[tokio::test]
  async fn test_unknown_collection() {
    let server = MockServer::start().await;
    let fetcher = fetcher::<AudioData>(&server);

    let err = fetcher
      .fetch_page(&CollectionKey::new("recently-played"), 0)
      .await
      .unwrap_err();
    assert_eq!(err, FetchError::UnknownCollection("recently-played".to_string()));
  }

  #[tokio::test]
  async fn test_error_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/favorite"))
      .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "Unauthorized request!" })))
      .mount(&server)
      .await;

    let fetcher = fetcher::<AudioData>(&server);
    let err = fetcher
      .fetch_page(&CollectionKey::new("favorite"), 0)
      .await
      .unwrap_err();

    assert_eq!(
      err,
      FetchError::Status {
        status: 403,
        message: Some("Unauthorized request!".to_string()),
      }
    );
    assert_eq!(err.user_message(), "Unauthorized request!");
  }

  #[tokio::test]
  async fn test_missing_field_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/favorite"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
      .mount(&server)
      .await;

    let fetcher = fetcher::<AudioData>(&server);
    let err = fetcher
      .fetch_page(&CollectionKey::new("favorite"), 0)
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
  }

  #[tokio::test]
  async fn test_remove_histories() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/history"))
      .and(query_param("histories", r#"["h1","h2"]"#))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
      .expect(1)
      .mount(&server)
      .await;

    let client = ApiClient::new(&ApiConfig {
      base_url: server.uri(),
      timeout_secs: 5,
    })
    .unwrap();
    client
      .remove_histories(&["h1".to_string(), "h2".to_string()])
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_paged_list_over_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/favorite"))
      .and(query_param("pageNo", "0"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "audios": [audio("f1"), audio("f2")] })),
      )
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/favorite"))
      .and(query_param("pageNo", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audios": [] })))
      .mount(&server)
      .await;

    let list = PagedCacheList::new(fetcher::<AudioData>(&server));
    let key = CollectionKey::new("favorite");

    let collection = list.initial_load(&key).await.unwrap();
    assert_eq!(collection.len(), 2);

    list.load_more(&key).await.unwrap();
    let collection = list.get(&key).unwrap();
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.page, 1);
    assert!(!collection.has_more);
  }
}
