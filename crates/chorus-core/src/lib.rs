//! chorus-core - Core library for Chorus
//!
//! This crate provides the raw record types read from log and song files,
//! the star-schema row types, the pure dimensional transform, record sources,
//! configuration parsing, and the stage DAG used to sequence loads.

pub mod config;
pub mod dag;
pub mod error;
pub mod record;
pub mod row;
pub(crate) mod serde_helpers;
pub mod source;
pub mod sql_utils;
pub mod transform;

pub use config::{Config, DbType, SourceConfig, SourceFormat};
pub use dag::{Stage, StageDag};
pub use error::{CoreError, CoreResult};
pub use record::{PlayEvent, RawEvent, RawSongMetadata};
pub use row::{ArtistRow, DateRow, SongRow, SongplayRow, TimeRow, UserRow};
pub use source::{FileSource, RecordBatch, RecordSource, SourceBatches};
pub use transform::{
    derive_date_dimension, derive_facts, derive_song_and_artist_dimensions,
    derive_time_dimension, derive_user_dimension, filter_play_events, SongIndex, TransformStats,
};
