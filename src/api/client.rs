use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::error::FetchError;

/// Thin HTTP wrapper around the audio API.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    // Without the trailing slash `join` would replace the last segment
    let base = if config.base_url.ends_with('/') {
      config.base_url.clone()
    } else {
      format!("{}/", config.base_url)
    };
    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// GET one page of a list endpoint and return the decoded body.
  pub async fn get_page(
    &self,
    path: &str,
    page: u32,
    page_size: Option<u32>,
  ) -> Result<Value, FetchError> {
    let url = self.endpoint(path)?;

    let mut query = vec![("pageNo", page.to_string())];
    if let Some(limit) = page_size {
      query.push(("limit", limit.to_string()));
    }

    debug!(url = %url, page, "GET page");
    let response = self.http.get(url).query(&query).send().await?;
    Self::read_json(response).await
  }

  /// Delete history entries by id.
  pub async fn remove_histories(&self, ids: &[String]) -> Result<(), FetchError> {
    let url = self.endpoint("/history")?;
    let histories = serde_json::to_string(ids)?;

    debug!(count = ids.len(), "DELETE histories");
    let response = self
      .http
      .delete(url)
      .query(&[("histories", histories)])
      .send()
      .await?;
    Self::read_json(response).await.map(|_| ())
  }

  fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| FetchError::InvalidEndpoint(format!("{}: {}", path, e)))
  }

  /// Decode a JSON body, turning error statuses into `FetchError::Status`
  /// with the server's `error` message when it sent one.
  async fn read_json(response: reqwest::Response) -> Result<Value, FetchError> {
    let status = response.status();
    if !status.is_success() {
      let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(String::from));
      return Err(FetchError::Status {
        status: status.as_u16(),
        message,
      });
    }

    let body = response.bytes().await?;
    if body.is_empty() {
      return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
  }
}
