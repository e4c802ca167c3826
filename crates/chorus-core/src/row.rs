//! Star-schema rows produced by the dimensional transform

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

/// Row of the `time` dimension, keyed by `start_time`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRow {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// ISO 8601 week of year (1-53)
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Day of week, Monday = 0 through Sunday = 6
    pub weekday: u32,
}

impl TimeRow {
    /// Decompose a timestamp into its calendar attributes
    pub fn from_timestamp(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday(),
        }
    }
}

/// Row of the `dates` dimension, one per calendar day, keyed by `date_key`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DateRow {
    /// `YYYYMMDD` as an integer, e.g. 20181101
    pub date_key: i32,
    pub date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    /// ISO 8601 week of year (1-53)
    pub week_of_year: u32,
    pub day_of_year: u32,
    pub day_of_month: u32,
    /// ISO day of week, Monday = 1 through Sunday = 7
    pub day_of_week: u32,
    pub is_weekend: bool,
}

impl DateRow {
    /// Surrogate key of a calendar day
    pub fn key_for(date: NaiveDate) -> i32 {
        // month and day are at most 31, so the casts are lossless
        date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
    }

    /// Calendar attributes of a day
    pub fn from_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().number_from_monday();
        Self {
            date_key: Self::key_for(date),
            date,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            week_of_year: date.iso_week().week(),
            day_of_year: date.ordinal(),
            day_of_month: date.day(),
            day_of_week,
            is_weekend: day_of_week >= 6,
        }
    }
}

/// Row of the `users` dimension, keyed by `user_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    /// Timestamp of the event this row was taken from. A stored row is only
    /// replaced by one that is at least as recent.
    pub last_seen: NaiveDateTime,
}

/// Row of the `songs` dimension, keyed by `song_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongRow {
    pub song_id: String,
    pub title: Option<String>,
    pub artist_id: String,
    pub year: Option<i64>,
    pub duration: Option<f64>,
}

/// Row of the `artists` dimension, keyed by `artist_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistRow {
    pub artist_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Row of the `songplays` fact table
///
/// `start_time` and `user_id` reference the time and user dimensions.
/// `song_id`/`artist_id` are `None` when no song matched the event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongplayRow {
    pub start_time: NaiveDateTime,
    pub user_id: Option<i64>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub item_in_session: Option<i64>,
    pub length: Option<f64>,
    /// References the date dimension
    pub date_key: i32,
}

impl SongplayRow {
    /// Whether both song and artist references were resolved
    pub fn is_resolved(&self) -> bool {
        self.song_id.is_some() && self.artist_id.is_some()
    }
}
