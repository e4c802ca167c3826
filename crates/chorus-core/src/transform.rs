//! Dimensional transform: raw records to star-schema rows
//!
//! Every function here is pure over its inputs. Conflict policies are fixed
//! per entity:
//!
//! - time: first-seen row per distinct timestamp
//! - dates: first-seen row per distinct calendar day
//! - users: row from the chronologically latest event wins; on equal
//!   timestamps the event seen last in input order wins
//! - songs / artists: first write wins; a later record with the same key and
//!   a different payload is counted as a conflict and discarded
//! - songplays: one row per play event, never deduplicated

use crate::record::{PlayEvent, RawEvent, RawSongMetadata};
use crate::row::{ArtistRow, DateRow, SongRow, SongplayRow, TimeRow, UserRow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Counters for records that were dropped, skipped or only partially resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// Events whose page is not the play page
    pub skipped_events: usize,
    /// Play events dropped for a missing or invalid timestamp
    pub malformed_events: usize,
    /// Song records dropped for a missing song or artist id
    pub malformed_songs: usize,
    /// Song records discarded under first-write-wins with a differing payload
    pub song_conflicts: usize,
    /// Artist records discarded under first-write-wins with a differing payload
    pub artist_conflicts: usize,
    /// Facts emitted without a song/artist reference
    pub unresolved_plays: usize,
}

impl std::ops::AddAssign for TransformStats {
    fn add_assign(&mut self, other: Self) {
        self.skipped_events += other.skipped_events;
        self.malformed_events += other.malformed_events;
        self.malformed_songs += other.malformed_songs;
        self.song_conflicts += other.song_conflicts;
        self.artist_conflicts += other.artist_conflicts;
        self.unresolved_plays += other.unresolved_plays;
    }
}

/// Keep only play events, resolving their timestamps.
///
/// Non-play events are counted as skipped. Play events without a usable
/// timestamp are counted as malformed and logged.
pub fn filter_play_events<I>(events: I, play_page: &str) -> (Vec<PlayEvent>, TransformStats)
where
    I: IntoIterator<Item = RawEvent>,
{
    let mut stats = TransformStats::default();
    let mut plays = Vec::new();

    for event in events {
        if !event.is_play(play_page) {
            stats.skipped_events += 1;
            continue;
        }

        let ts = event.ts;
        let session = event.session_id;
        match PlayEvent::from_raw(event) {
            Some(play) => plays.push(play),
            None => {
                stats.malformed_events += 1;
                log::warn!(
                    "Dropping play event with unusable timestamp {:?} (session {:?})",
                    ts,
                    session
                );
            }
        }
    }

    (plays, stats)
}

/// Derive the time dimension, one row per distinct timestamp
pub fn derive_time_dimension(events: &[PlayEvent]) -> Vec<TimeRow> {
    let mut seen: HashSet<NaiveDateTime> = HashSet::with_capacity(events.len());
    events
        .iter()
        .filter(|e| seen.insert(e.start_time))
        .map(|e| TimeRow::from_timestamp(e.start_time))
        .collect()
}

/// Derive the date dimension, one row per distinct calendar day
pub fn derive_date_dimension(events: &[PlayEvent]) -> Vec<DateRow> {
    let mut seen: HashSet<NaiveDate> = HashSet::new();
    events
        .iter()
        .map(|e| e.start_time.date())
        .filter(|d| seen.insert(*d))
        .map(DateRow::from_date)
        .collect()
}

/// Derive the user dimension, one row per user id.
///
/// The row comes from the user's latest event, so a level change within the
/// batch is reflected. Output order follows first appearance of each id.
pub fn derive_user_dimension(events: &[PlayEvent]) -> Vec<UserRow> {
    let mut slots: HashMap<i64, (usize, NaiveDateTime)> = HashMap::new();
    let mut rows: Vec<UserRow> = Vec::new();

    for event in events {
        let Some(user_id) = event.user_id else {
            continue;
        };
        let row = UserRow {
            user_id,
            first_name: event.first_name.clone(),
            last_name: event.last_name.clone(),
            gender: event.gender.clone(),
            level: event.level.clone(),
            last_seen: event.start_time,
        };

        match slots.get_mut(&user_id) {
            Some((slot, seen_at)) => {
                if event.start_time >= *seen_at {
                    *seen_at = event.start_time;
                    rows[*slot] = row;
                }
            }
            None => {
                slots.insert(user_id, (rows.len(), event.start_time));
                rows.push(row);
            }
        }
    }

    rows
}

/// Outcome of a first-write-wins insert
#[derive(Debug, PartialEq, Eq)]
enum KeepFirst {
    Inserted,
    Duplicate,
    Conflict,
}

fn keep_first<K, R>(index: &mut HashMap<K, usize>, rows: &mut Vec<R>, key: K, row: R) -> KeepFirst
where
    K: Eq + Hash,
    R: PartialEq,
{
    match index.get(&key) {
        Some(&slot) if rows[slot] == row => KeepFirst::Duplicate,
        Some(_) => KeepFirst::Conflict,
        None => {
            index.insert(key, rows.len());
            rows.push(row);
            KeepFirst::Inserted
        }
    }
}

/// Derive song and artist dimensions from song metadata.
///
/// Records without both ids are dropped as malformed. Duplicate keys keep the
/// first record; a duplicate whose payload differs is counted as a conflict.
pub fn derive_song_and_artist_dimensions<I>(
    metadata: I,
) -> (Vec<SongRow>, Vec<ArtistRow>, TransformStats)
where
    I: IntoIterator<Item = RawSongMetadata>,
{
    let mut stats = TransformStats::default();
    let mut songs = Vec::new();
    let mut artists = Vec::new();
    let mut song_slots: HashMap<String, usize> = HashMap::new();
    let mut artist_slots: HashMap<String, usize> = HashMap::new();

    for record in metadata {
        if !record.has_keys() {
            stats.malformed_songs += 1;
            log::warn!(
                "Dropping song record without ids (song_id={:?}, artist_id={:?})",
                record.song_id,
                record.artist_id
            );
            continue;
        }
        let (Some(song_id), Some(artist_id)) = (record.song_id, record.artist_id) else {
            continue;
        };

        let song = SongRow {
            song_id: song_id.clone(),
            title: record.title,
            artist_id: artist_id.clone(),
            year: record.year,
            duration: record.duration,
        };
        if keep_first(&mut song_slots, &mut songs, song_id.clone(), song) == KeepFirst::Conflict {
            stats.song_conflicts += 1;
            log::warn!("Conflicting payload for song {song_id}; keeping first record");
        }

        let artist = ArtistRow {
            artist_id: artist_id.clone(),
            name: record.artist_name,
            location: record.artist_location,
            latitude: record.artist_latitude,
            longitude: record.artist_longitude,
        };
        if keep_first(&mut artist_slots, &mut artists, artist_id.clone(), artist)
            == KeepFirst::Conflict
        {
            stats.artist_conflicts += 1;
            log::warn!("Conflicting payload for artist {artist_id}; keeping first record");
        }
    }

    (songs, artists, stats)
}

/// Natural match key: (title, artist name, duration), compared exactly
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    title: String,
    artist_name: String,
    duration_bits: u64,
}

impl MatchKey {
    fn new(title: &str, artist_name: &str, duration: f64) -> Self {
        // -0.0 and 0.0 compare equal as floats; give them one bit pattern
        let duration = if duration == 0.0 { 0.0 } else { duration };
        Self {
            title: title.to_string(),
            artist_name: artist_name.to_string(),
            duration_bits: duration.to_bits(),
        }
    }
}

/// Resolved song/artist keys for a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub song_id: String,
    pub artist_id: String,
}

/// Lookup from (title, artist name, duration) to song and artist ids.
///
/// Built from song and artist dimension rows. A song whose artist row has not
/// been seen yet waits until that artist arrives. A song that can never match
/// (no title, no duration, or an artist without a name) is counted and
/// dropped. When two songs share a match key the first one indexed wins.
#[derive(Debug, Default)]
pub struct SongIndex {
    entries: HashMap<MatchKey, SongRef>,
    /// Artist id to name, `None` when the artist row has no name
    artist_names: HashMap<String, Option<String>>,
    /// Songs waiting for their artist, by artist id
    pending: HashMap<String, Vec<SongRow>>,
    unindexable: usize,
}

impl SongIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from song and artist rows
    pub fn build(songs: &[SongRow], artists: &[ArtistRow]) -> Self {
        let mut index = Self::new();
        index.extend(songs, artists);
        index
    }

    /// Fold further song and artist rows into the index
    pub fn extend(&mut self, songs: &[SongRow], artists: &[ArtistRow]) {
        for artist in artists {
            if self.artist_names.contains_key(&artist.artist_id) {
                continue;
            }
            self.artist_names
                .insert(artist.artist_id.clone(), artist.name.clone());
            if let Some(waiting) = self.pending.remove(&artist.artist_id) {
                for song in &waiting {
                    self.insert(song);
                }
            }
        }

        for song in songs {
            if self.artist_names.contains_key(&song.artist_id) {
                self.insert(song);
            } else {
                self.pending
                    .entry(song.artist_id.clone())
                    .or_default()
                    .push(song.clone());
            }
        }
    }

    /// Index a song whose artist is known
    fn insert(&mut self, song: &SongRow) {
        let artist_name = self
            .artist_names
            .get(&song.artist_id)
            .and_then(Option::as_deref);
        let (Some(title), Some(duration), Some(artist_name)) =
            (&song.title, song.duration, artist_name)
        else {
            self.unindexable += 1;
            log::debug!(
                "Song {} cannot be matched (title, duration or artist name missing)",
                song.song_id
            );
            return;
        };

        let key = MatchKey::new(title, artist_name, duration);
        self.entries.entry(key).or_insert_with(|| SongRef {
            song_id: song.song_id.clone(),
            artist_id: song.artist_id.clone(),
        });
    }

    /// Exact lookup by song title, artist name and duration
    pub fn lookup(&self, title: &str, artist_name: &str, duration: f64) -> Option<&SongRef> {
        self.entries
            .get(&MatchKey::new(title, artist_name, duration))
    }

    /// Number of indexed match keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no match keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Songs dropped because they can never match a play
    pub fn unindexable(&self) -> usize {
        self.unindexable
    }

    /// Songs still waiting for their artist row
    pub fn pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    fn resolve(&self, event: &PlayEvent) -> Option<&SongRef> {
        match (&event.song, &event.artist, event.length) {
            (Some(song), Some(artist), Some(length)) => self.lookup(song, artist, length),
            _ => None,
        }
    }
}

/// Derive one fact row per play event, in input order.
///
/// A play whose (song, artist, length) has no exact match in the index is
/// still emitted, with `song_id` and `artist_id` left empty.
pub fn derive_facts(events: &[PlayEvent], index: &SongIndex) -> (Vec<SongplayRow>, TransformStats) {
    let mut stats = TransformStats::default();
    let facts = events
        .iter()
        .map(|event| {
            let matched = index.resolve(event);
            if matched.is_none() {
                stats.unresolved_plays += 1;
                log::debug!(
                    "No song match for {:?} by {:?} ({:?}s)",
                    event.song,
                    event.artist,
                    event.length
                );
            }
            SongplayRow {
                start_time: event.start_time,
                user_id: event.user_id,
                level: event.level.clone(),
                song_id: matched.map(|m| m.song_id.clone()),
                artist_id: matched.map(|m| m.artist_id.clone()),
                session_id: event.session_id,
                location: event.location.clone(),
                user_agent: event.user_agent.clone(),
                item_in_session: event.item_in_session,
                length: event.length,
                date_key: DateRow::key_for(event.start_time.date()),
            }
        })
        .collect();

    (facts, stats)
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
