//! Keys identifying cached collections.

use std::fmt;

/// Identifies one cached collection.
///
/// Most collections are identified by name alone (`favorite`, `histories`).
/// Per-entity collections carry a secondary key, e.g. the profile id for
/// `public-playlist:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionKey {
  pub name: String,
  pub secondary: Option<String>,
}

impl CollectionKey {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      secondary: None,
    }
  }

  pub fn with_secondary(name: impl Into<String>, secondary: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      secondary: Some(secondary.into()),
    }
  }
}

/// `name`, or `name:secondary` for per-entity collections.
impl fmt::Display for CollectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.secondary {
      Some(id) => write!(f, "{}:{}", self.name, id),
      None => f.write_str(&self.name),
    }
  }
}

impl From<&str> for CollectionKey {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

impl From<String> for CollectionKey {
  fn from(name: String) -> Self {
    Self::new(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_plain_key() {
    let key = CollectionKey::from("favorite");
    assert_eq!(key.to_string(), "favorite");
  }

  #[test]
  fn test_secondary_key() {
    let key = CollectionKey::with_secondary("is-following", "42");
    assert_eq!(key.to_string(), "is-following:42");
    assert_ne!(key, CollectionKey::new("is-following"));
  }
}
