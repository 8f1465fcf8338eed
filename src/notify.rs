//! User-facing notifications emitted by the list layer.
//!
//! The list layer never renders anything; it hands `{message, severity}`
//! events to a sink and lets the UI decide how to show them.

use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Info,
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub message: String,
  pub severity: Severity,
}

impl Notification {
  pub fn error(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      severity: Severity::Error,
    }
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      severity: Severity::Success,
    }
  }
}

/// Destination for notifications.
pub trait NotificationSink: Send + Sync {
  fn notify(&self, notification: Notification);
}

/// Forwards notifications over an unbounded channel to the UI loop.
pub struct ChannelSink {
  tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl NotificationSink for ChannelSink {
  fn notify(&self, notification: Notification) {
    // Receiver may have been dropped
    let _ = self.tx.send(notification);
  }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
  fn notify(&self, notification: Notification) {
    match notification.severity {
      Severity::Info | Severity::Success => info!(message = %notification.message, "notification"),
      Severity::Error => error!(message = %notification.message, "notification"),
    }
  }
}
