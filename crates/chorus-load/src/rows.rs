//! Mapping from star-schema rows to SQL values

use chorus_core::sql_utils::SqlValue;
use chorus_core::{ArtistRow, DateRow, SongRow, SongplayRow, Stage, TimeRow, UserRow};

/// A row that can be written to the table of one stage
///
/// `values` returns one value per insert column of that table, in column
/// order.
pub trait TableRow {
    /// Stage whose table this row belongs to
    const STAGE: Stage;

    fn values(&self) -> Vec<SqlValue>;
}

impl TableRow for SongRow {
    const STAGE: Stage = Stage::Songs;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.song_id).into(),
            self.title.as_ref().into(),
            (&self.artist_id).into(),
            self.year.into(),
            self.duration.into(),
        ]
    }
}

impl TableRow for ArtistRow {
    const STAGE: Stage = Stage::Artists;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            (&self.artist_id).into(),
            self.name.as_ref().into(),
            self.location.as_ref().into(),
            self.latitude.into(),
            self.longitude.into(),
        ]
    }
}

impl TableRow for TimeRow {
    const STAGE: Stage = Stage::Time;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.start_time.into(),
            self.hour.into(),
            self.day.into(),
            self.week.into(),
            self.month.into(),
            self.year.into(),
            self.weekday.into(),
        ]
    }
}

impl TableRow for DateRow {
    const STAGE: Stage = Stage::Dates;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.date_key.into(),
            self.date.into(),
            self.year.into(),
            self.quarter.into(),
            self.month.into(),
            self.week_of_year.into(),
            self.day_of_year.into(),
            self.day_of_month.into(),
            self.day_of_week.into(),
            self.is_weekend.into(),
        ]
    }
}

impl TableRow for UserRow {
    const STAGE: Stage = Stage::Users;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.user_id.into(),
            self.first_name.as_ref().into(),
            self.last_name.as_ref().into(),
            self.gender.as_ref().into(),
            self.level.as_ref().into(),
            self.last_seen.into(),
        ]
    }
}

impl TableRow for SongplayRow {
    const STAGE: Stage = Stage::Songplays;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.start_time.into(),
            self.user_id.into(),
            self.level.as_ref().into(),
            self.song_id.as_ref().into(),
            self.artist_id.as_ref().into(),
            self.session_id.into(),
            self.location.as_ref().into(),
            self.user_agent.as_ref().into(),
            self.item_in_session.into(),
            self.length.into(),
            self.date_key.into(),
        ]
    }
}
