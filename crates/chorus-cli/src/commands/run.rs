//! Run command implementation

use anyhow::{bail, Result};
use chorus_core::Stage;
use chorus_load::{
    create_schema, truncate_facts, BatchSource, Pipeline, PipelineOptions, RunSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::{load_failure, ExitCode};
use crate::context::RuntimeContext;

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    let mut options = PipelineOptions::from_config(&ctx.config);
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 {
            bail!("--batch-size must be greater than zero");
        }
        options.batch_size = batch_size;
    }

    create_schema(ctx.db.as_ref(), &ctx.tables)
        .await
        .map_err(|e| load_failure(e, "Create schema"))?;

    if args.full_reload {
        let deleted = truncate_facts(ctx.db.as_ref(), &ctx.tables)
            .await
            .map_err(|e| load_failure(e, "Full reload"))?;
        println!("Full reload: removed {} existing facts", deleted);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received; stopping after the current batch");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} batches ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    let observer = pb.clone();

    let songs = ctx.song_source();
    let events = ctx.event_source();
    let result = Pipeline::new(ctx.db.as_ref(), &ctx.tables, options)
        .with_cancel_flag(cancel)
        .on_batch(move |report| {
            observer.inc(1);
            let source = match report.source {
                BatchSource::Songs => "song metadata",
                BatchSource::Events => "events",
            };
            observer.set_message(format!("{} batch {}", source, report.batch));
        })
        .run(&songs, &events)
        .await;
    pb.finish_and_clear();

    let summary = result.map_err(|e| load_failure(e, "Run"))?;
    print_summary(&summary);

    if summary.cancelled {
        println!();
        println!("Run cancelled; batches applied so far were kept.");
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Run {} finished in {:.2}s ({} song batches, {} event batches)\n",
        summary.run_id,
        summary.duration.as_secs_f64(),
        summary.song_batches,
        summary.event_batches
    );

    for stage in Stage::ALL {
        println!("  ✓ {:<10} {} rows", stage, summary.rows_for(stage));
    }

    let stats = &summary.stats;
    println!();
    println!(
        "Skipped events: {}, malformed events: {}, malformed songs: {}",
        stats.skipped_events,
        stats.malformed_events + summary.unparsed_event_records,
        stats.malformed_songs + summary.unparsed_song_records
    );
    println!(
        "Song conflicts: {}, artist conflicts: {}",
        stats.song_conflicts, stats.artist_conflicts
    );
    println!(
        "Unresolved plays: {} (song index: {} keys, {} unmatchable songs)",
        stats.unresolved_plays, summary.indexed_songs, summary.unindexable_songs
    );
}
