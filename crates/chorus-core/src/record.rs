//! Raw records as they appear in log and song files
//!
//! `RawEvent` and `RawSongMetadata` mirror the source field sets and are
//! never persisted as-is. A `RawEvent` that survives the play-page filter
//! and carries a valid timestamp becomes a [`PlayEvent`].

use crate::serde_helpers::lenient_i64;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One record from an event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Event time in epoch milliseconds
    #[serde(default, deserialize_with = "lenient_i64")]
    pub ts: Option<i64>,

    /// User id; absent for logged-out sessions
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient_i64")]
    pub session_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient_i64")]
    pub item_in_session: Option<i64>,

    /// Page/action type (`NextSong` for plays)
    #[serde(default)]
    pub page: Option<String>,

    #[serde(default)]
    pub auth: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default, deserialize_with = "lenient_i64")]
    pub status: Option<i64>,

    /// Subscription level (`free` / `paid`)
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Artist name as free text
    #[serde(default)]
    pub artist: Option<String>,

    /// Song title as free text
    #[serde(default)]
    pub song: Option<String>,

    /// Song length in seconds
    #[serde(default)]
    pub length: Option<f64>,

    #[serde(default)]
    pub registration: Option<f64>,
}

impl RawEvent {
    /// Whether this event's page field marks a song play
    pub fn is_play(&self, play_page: &str) -> bool {
        self.page.as_deref() == Some(play_page)
    }
}

/// One record of song metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSongMetadata {
    #[serde(default)]
    pub song_id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    /// Release year; 0 in the source data means unknown
    #[serde(default, deserialize_with = "lenient_i64")]
    pub year: Option<i64>,

    #[serde(default, deserialize_with = "lenient_i64")]
    pub num_songs: Option<i64>,

    #[serde(default)]
    pub artist_id: Option<String>,

    #[serde(default)]
    pub artist_name: Option<String>,

    #[serde(default)]
    pub artist_location: Option<String>,

    #[serde(default)]
    pub artist_latitude: Option<f64>,

    #[serde(default)]
    pub artist_longitude: Option<f64>,
}

impl RawSongMetadata {
    /// Both natural keys are present and non-empty
    pub fn has_keys(&self) -> bool {
        non_empty(&self.song_id) && non_empty(&self.artist_id)
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// A play event with a resolved timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    /// Event time (UTC, millisecond precision)
    pub start_time: NaiveDateTime,
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub session_id: Option<i64>,
    pub item_in_session: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
}

impl PlayEvent {
    /// Build a play event from a raw event.
    ///
    /// Returns `None` when the timestamp is missing or outside the range
    /// chrono can represent.
    pub fn from_raw(raw: RawEvent) -> Option<Self> {
        let start_time = DateTime::from_timestamp_millis(raw.ts?)?.naive_utc();
        Some(Self {
            start_time,
            user_id: raw.user_id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            gender: raw.gender,
            level: raw.level,
            session_id: raw.session_id,
            item_in_session: raw.item_in_session,
            location: raw.location,
            user_agent: raw.user_agent,
            song: raw.song,
            artist: raw.artist,
            length: raw.length,
        })
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
