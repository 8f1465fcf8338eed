use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::CollectionKey;
use crate::error::FetchError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Endpoint bindings by collection name, merged over the built-in ones
  #[serde(default)]
  pub collections: BTreeMap<String, CollectionBinding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_base_url() -> String {
  "http://localhost:8989".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached collection is refetched on read (never if unset)
  pub stale_secs: Option<u64>,
}

/// How one collection maps onto a REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionBinding {
  /// Endpoint path; `{id}` is replaced by the key's secondary id
  pub path: String,
  /// Field of the response body holding the page items
  pub field: String,
  /// Sent as `limit`; the server default applies when unset
  pub page_size: Option<u32>,
}

impl CollectionBinding {
  fn new(path: &str, field: &str, page_size: Option<u32>) -> Self {
    Self {
      path: path.to_string(),
      field: field.to_string(),
      page_size,
    }
  }

  /// Endpoint path for `key`, with the secondary id substituted.
  pub fn resolve_path(&self, key: &CollectionKey) -> Result<String, FetchError> {
    if !self.path.contains("{id}") {
      return Ok(self.path.clone());
    }
    let id = key
      .secondary
      .as_deref()
      .ok_or_else(|| FetchError::MissingSecondaryKey(key.name.clone()))?;
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes())
      .collect::<String>()
      .replace('+', "%20");
    Ok(self.path.replace("{id}", &encoded))
  }
}

/// Bindings for the lists the app pages through.
pub fn default_bindings() -> BTreeMap<String, CollectionBinding> {
  BTreeMap::from([
    (
      "favorite".to_string(),
      CollectionBinding::new("/favorite", "audios", None),
    ),
    (
      "histories".to_string(),
      CollectionBinding::new("/history", "histories", Some(15)),
    ),
    (
      "uploads-by-profile".to_string(),
      CollectionBinding::new("/profile/uploads", "audios", None),
    ),
    (
      "uploads".to_string(),
      CollectionBinding::new("/profile/uploads/{id}", "audios", None),
    ),
    (
      "playlist".to_string(),
      CollectionBinding::new("/playlist/by-profile", "playlist", Some(10)),
    ),
    (
      "public-playlist".to_string(),
      CollectionBinding::new("/profile/playlist/{id}", "playlist", None),
    ),
  ])
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./audiolist.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/audiolist/config.yaml
  ///
  /// Without a file the built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("audiolist.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("audiolist").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Built-in bindings overridden by the configured ones.
  pub fn bindings(&self) -> BTreeMap<String, CollectionBinding> {
    let mut bindings = default_bindings();
    bindings.extend(self.collections.clone());
    bindings
  }

  pub fn stale_time(&self) -> Option<chrono::Duration> {
    self
      .cache
      .stale_secs
      .and_then(|secs| i64::try_from(secs).ok())
      .and_then(chrono::Duration::try_seconds)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api.base_url, "http://localhost:8989");
    assert_eq!(config.api.timeout_secs, 30);
    assert!(config.stale_time().is_none());
    assert_eq!(config.bindings(), default_bindings());
  }

  #[test]
  fn test_parse_overrides() {
    let config = Config::parse(
      r#"
api:
  base_url: "https://audio.example.com/api"
cache:
  stale_secs: 120
collections:
  favorite:
    path: /v2/favorite
    field: items
    page_size: 20
  recently-played:
    path: /history/recently-played
    field: audios
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://audio.example.com/api");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.stale_time(), Some(chrono::Duration::seconds(120)));

    let bindings = config.bindings();
    assert_eq!(
      bindings["favorite"],
      CollectionBinding::new("/v2/favorite", "items", Some(20))
    );
    assert_eq!(bindings["recently-played"].field, "audios");
    assert_eq!(bindings["histories"].page_size, Some(15));
  }

  #[test]
  fn test_resolve_path() {
    let bindings = default_bindings();

    let path = bindings["favorite"].resolve_path(&CollectionKey::new("favorite"));
    assert_eq!(path.unwrap(), "/favorite");

    let key = CollectionKey::with_secondary("public-playlist", "64a1 f");
    let path = bindings["public-playlist"].resolve_path(&key);
    assert_eq!(path.unwrap(), "/profile/playlist/64a1%20f");

    let err = bindings["uploads"].resolve_path(&CollectionKey::new("uploads"));
    assert_eq!(err, Err(FetchError::MissingSecondaryKey("uploads".to_string())));
  }

  #[test]
  fn test_stale_time() {
    let config = Config::parse("cache:\n  stale_secs: 90\n").unwrap();
    assert_eq!(config.stale_time(), Some(chrono::Duration::seconds(90)));

    // Out of range for a duration rather than wrapping negative
    let config = Config::parse(&format!("cache:\n  stale_secs: {}\n", u64::MAX)).unwrap();
    assert_eq!(config.stale_time(), None);

    assert_eq!(Config::default().stale_time(), None);
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let result = Config::load(Some(Path::new("/definitely/not/here.yaml")));
    assert!(result.is_err());
  }
}
