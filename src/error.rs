//! Errors and outcomes of list operations.

use thiserror::Error;

/// Fallback text shown when the server gave no usable message.
const GENERIC_MESSAGE: &str = "Something went wrong";

/// Failure while fetching a page from the server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
  /// Network-level failure (connection refused, timeout, TLS).
  #[error("request failed: {0}")]
  Transport(String),

  /// The server answered with a non-success status.
  #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
  Status { status: u16, message: Option<String> },

  /// The response body did not have the expected shape.
  #[error("failed to decode response: {0}")]
  Decode(String),

  /// No endpoint binding exists for the collection name.
  #[error("no endpoint configured for collection '{0}'")]
  UnknownCollection(String),

  /// A configured endpoint path does not form a valid URL.
  #[error("invalid endpoint '{0}'")]
  InvalidEndpoint(String),

  /// The binding needs an entity id and the key carried none.
  #[error("collection '{0}' requires a secondary key")]
  MissingSecondaryKey(String),
}

impl FetchError {
  /// Text suitable for a user-facing notification.
  pub fn user_message(&self) -> String {
    match self {
      FetchError::Status {
        message: Some(message),
        ..
      } => message.clone(),
      FetchError::Transport(_) => "Could not reach the server".to_string(),
      _ => GENERIC_MESSAGE.to_string(),
    }
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      return FetchError::Decode(e.to_string());
    }
    match e.status() {
      Some(status) => FetchError::Status {
        status: status.as_u16(),
        message: None,
      },
      None => FetchError::Transport(e.to_string()),
    }
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(e: serde_json::Error) -> Self {
    FetchError::Decode(e.to_string())
  }
}

/// Why a call returned without touching the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// The same kind of fetch is already in flight.
  InFlight,
  /// The last page was empty; only a refresh resets this.
  Exhausted,
  /// Nothing cached under the key.
  Absent,
}

/// Result of a fetch that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  /// The page was merged into the collection.
  Applied { received: usize },
  /// No request was made.
  Skipped(SkipReason),
  /// The response arrived after a refresh superseded it and was dropped.
  StaleDiscarded,
}

impl LoadOutcome {
  pub fn is_applied(&self) -> bool {
    matches!(self, LoadOutcome::Applied { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_user_message_prefers_server_text() {
    let e = FetchError::Status {
      status: 422,
      message: Some("Invalid page".to_string()),
    };
    assert_eq!(e.user_message(), "Invalid page");
  }

  #[test]
  fn test_user_message_fallbacks() {
    let e = FetchError::Status {
      status: 500,
      message: None,
    };
    assert_eq!(e.user_message(), GENERIC_MESSAGE);
    assert_eq!(e.to_string(), "server returned 500: no message");

    let e = FetchError::Transport("connection refused".to_string());
    assert_eq!(e.user_message(), "Could not reach the server");
  }
}
