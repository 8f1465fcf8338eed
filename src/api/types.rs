//! Serde types matching the audio API's list responses.

use serde::{Deserialize, Serialize};

use crate::paged::Grouped;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
  pub id: String,
  pub name: String,
}

/// An uploaded audio as listed in favorites and uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioData {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub about: String,
  #[serde(default)]
  pub category: String,
  pub file: String,
  pub poster: Option<String>,
  pub owner: Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  Public,
  Private,
  Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub items_count: u32,
  pub visibility: Visibility,
}

/// One played audio inside a history day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAudio {
  /// History entry id, used for deletion
  pub id: String,
  pub audio_id: String,
  pub title: String,
  pub date: String,
}

/// Listening history for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
  pub date: String,
  pub audios: Vec<HistoryAudio>,
}

impl Grouped for History {
  type Member = HistoryAudio;

  fn group_key(&self) -> &str {
    &self.date
  }

  fn members(&self) -> &[HistoryAudio] {
    &self.audios
  }

  fn members_mut(&mut self) -> &mut Vec<HistoryAudio> {
    &mut self.audios
  }
}
