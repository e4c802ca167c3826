//! Staged load pipeline
//!
//! Song metadata is loaded first so the song index is complete before any
//! fact is derived. Event batches then go through filter, derive and apply,
//! with the per-batch stages applied in topological order of the stage DAG
//! so dimensions land before the facts that reference them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chorus_core::{
    derive_date_dimension, derive_facts, derive_song_and_artist_dimensions,
    derive_time_dimension, derive_user_dimension, filter_play_events, Config, RawEvent,
    RawSongMetadata, RecordSource, SongIndex, Stage, StageDag, TransformStats,
};
use chorus_db::Database;
use uuid::Uuid;

use crate::apply::apply_to_store;
use crate::error::LoadResult;
use crate::rows::TableRow;
use crate::schema::StarTables;

/// Tunables for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Raw records per source batch
    pub batch_size: usize,
    /// Rows per INSERT statement
    pub insert_chunk_size: usize,
    /// `page` value that marks a song play
    pub play_page: String,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            insert_chunk_size: config.insert_chunk_size,
            play_page: config.sources.play_page.clone(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            insert_chunk_size: 500,
            play_page: "NextSong".to_string(),
        }
    }
}

/// Which source a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    Songs,
    Events,
}

/// Progress notification sent after each applied batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub source: BatchSource,
    /// 1-based batch number within its source
    pub batch: usize,
    /// Records parsed in this batch
    pub records: usize,
    /// Lines/rows in this batch that failed to parse
    pub malformed: usize,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Rows submitted per table
    pub rows: BTreeMap<Stage, usize>,
    /// Transform counters summed over all batches
    pub stats: TransformStats,
    /// Song metadata lines/rows that failed to parse
    pub unparsed_song_records: usize,
    /// Event lines/rows that failed to parse
    pub unparsed_event_records: usize,
    pub song_batches: usize,
    pub event_batches: usize,
    /// Match keys in the song index when events were processed
    pub indexed_songs: usize,
    /// Songs left out of the index because they can never match a play
    pub unindexable_songs: usize,
    /// True when the run stopped early on the cancellation flag
    pub cancelled: bool,
    pub duration: Duration,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            rows: Stage::ALL.iter().map(|s| (*s, 0)).collect(),
            stats: TransformStats::default(),
            unparsed_song_records: 0,
            unparsed_event_records: 0,
            song_batches: 0,
            event_batches: 0,
            indexed_songs: 0,
            unindexable_songs: 0,
            cancelled: false,
            duration: Duration::ZERO,
        }
    }

    /// Rows submitted to the table of `stage`
    pub fn rows_for(&self, stage: Stage) -> usize {
        self.rows.get(&stage).copied().unwrap_or(0)
    }

    /// Rows submitted across all tables
    pub fn total_rows(&self) -> usize {
        self.rows.values().sum()
    }
}

type BatchObserver<'a> = Box<dyn Fn(&BatchReport) + Send + Sync + 'a>;

/// The star-schema load pipeline
pub struct Pipeline<'a> {
    db: &'a dyn Database,
    tables: &'a StarTables,
    options: PipelineOptions,
    cancel: Arc<AtomicBool>,
    on_batch: Option<BatchObserver<'a>>,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline over an executor and a table set
    pub fn new(db: &'a dyn Database, tables: &'a StarTables, options: PipelineOptions) -> Self {
        Self {
            db,
            tables,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
            on_batch: None,
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Register a callback invoked after each applied batch
    pub fn on_batch(mut self, observer: impl Fn(&BatchReport) + Send + Sync + 'a) -> Self {
        self.on_batch = Some(Box::new(observer));
        self
    }

    /// Handle to the cancellation flag; setting it stops the run before the next batch
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn report(&self, report: BatchReport) {
        if let Some(observer) = &self.on_batch {
            observer(&report);
        }
    }

    /// Run the pipeline: song metadata first, then events batch by batch.
    ///
    /// Executor and source I/O failures abort the run. Rows already applied
    /// stay in the store.
    pub async fn run(
        &self,
        songs: &dyn RecordSource<RawSongMetadata>,
        events: &dyn RecordSource<RawEvent>,
    ) -> LoadResult<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::new();
        let order = StageDag::star_schema().topological_order()?;
        log::info!(
            "Run {} started (stage order: {})",
            summary.run_id,
            order
                .iter()
                .map(Stage::as_str)
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        let index = self.load_song_metadata(songs, &order, &mut summary).await?;
        summary.indexed_songs = index.len();
        summary.unindexable_songs = index.unindexable();
        if index.pending() > 0 {
            log::warn!(
                "{} song(s) reference artists missing from the song data and cannot be matched",
                index.pending()
            );
        }

        if !summary.cancelled {
            self.load_events(events, &order, &index, &mut summary).await?;
        }

        summary.duration = start.elapsed();
        if summary.cancelled {
            log::warn!(
                "Run {} cancelled after {} song batch(es) and {} event batch(es)",
                summary.run_id,
                summary.song_batches,
                summary.event_batches
            );
        } else {
            log::info!(
                "Run {} finished: {} row(s) submitted in {:.2}s",
                summary.run_id,
                summary.total_rows(),
                summary.duration.as_secs_f64()
            );
        }
        Ok(summary)
    }

    async fn load_song_metadata(
        &self,
        source: &dyn RecordSource<RawSongMetadata>,
        order: &[Stage],
        summary: &mut RunSummary,
    ) -> LoadResult<SongIndex> {
        let mut index = SongIndex::new();
        let mut batches = source.batches(self.options.batch_size)?;

        loop {
            if self.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let Some(batch) = batches.next() else {
                break;
            };
            let batch = batch?;
            summary.song_batches += 1;
            summary.unparsed_song_records += batch.malformed;
            let records = batch.records.len();

            let (song_rows, artist_rows, stats) = derive_song_and_artist_dimensions(batch.records);
            summary.stats += stats;
            index.extend(&song_rows, &artist_rows);

            for stage in order {
                match stage {
                    Stage::Songs => self.apply(&song_rows, summary).await?,
                    Stage::Artists => self.apply(&artist_rows, summary).await?,
                    Stage::Time | Stage::Dates | Stage::Users | Stage::Songplays => {}
                }
            }

            log::info!(
                "Song batch {} from '{}': {} song(s), {} artist(s)",
                summary.song_batches,
                source.name(),
                song_rows.len(),
                artist_rows.len()
            );
            self.report(BatchReport {
                source: BatchSource::Songs,
                batch: summary.song_batches,
                records,
                malformed: batch.malformed,
            });
        }

        Ok(index)
    }

    async fn load_events(
        &self,
        source: &dyn RecordSource<RawEvent>,
        order: &[Stage],
        index: &SongIndex,
        summary: &mut RunSummary,
    ) -> LoadResult<()> {
        let mut batches = source.batches(self.options.batch_size)?;

        loop {
            if self.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let Some(batch) = batches.next() else {
                break;
            };
            let batch = batch?;
            summary.event_batches += 1;
            summary.unparsed_event_records += batch.malformed;
            let records = batch.records.len();

            let (plays, filter_stats) = filter_play_events(batch.records, &self.options.play_page);
            let time_rows = derive_time_dimension(&plays);
            let date_rows = derive_date_dimension(&plays);
            let user_rows = derive_user_dimension(&plays);
            let (facts, fact_stats) = derive_facts(&plays, index);
            summary.stats += filter_stats;
            summary.stats += fact_stats;

            for stage in order {
                match stage {
                    Stage::Time => self.apply(&time_rows, summary).await?,
                    Stage::Dates => self.apply(&date_rows, summary).await?,
                    Stage::Users => self.apply(&user_rows, summary).await?,
                    Stage::Songplays => self.apply(&facts, summary).await?,
                    Stage::Songs | Stage::Artists => {}
                }
            }

            log::info!(
                "Event batch {} from '{}': {} play(s) of {} event(s), {} unresolved",
                summary.event_batches,
                source.name(),
                plays.len(),
                records,
                fact_stats.unresolved_plays
            );
            self.report(BatchReport {
                source: BatchSource::Events,
                batch: summary.event_batches,
                records,
                malformed: batch.malformed,
            });
        }

        Ok(())
    }

    async fn apply<R: TableRow>(&self, rows: &[R], summary: &mut RunSummary) -> LoadResult<()> {
        let table = self.tables.get(R::STAGE);
        let submitted = apply_to_store(
            self.db,
            table,
            rows,
            table.policy,
            self.options.insert_chunk_size,
        )
        .await?;
        *summary.rows.entry(R::STAGE).or_insert(0) += submitted;
        Ok(())
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
