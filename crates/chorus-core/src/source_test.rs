use super::*;
use crate::record::{RawEvent, RawSongMetadata};
use std::fs;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn event_line(ts: i64, user: i64) -> String {
    format!(r#"{{"page":"NextSong","ts":{ts},"userId":"{user}","level":"free"}}"#)
}

#[test]
fn test_discover_files_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "2018/11/b.json", "");
    write(dir.path(), "2018/11/a.json", "");
    write(dir.path(), "2018/notes.txt", "ignored");
    write(dir.path(), "2018/10/c.json", "");

    let source = FileSource::new("logs", dir.path(), SourceFormat::Json);
    let files = source.discover_files().unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
        .collect();
    assert_eq!(names, vec!["2018/10/c.json", "2018/11/a.json", "2018/11/b.json"]);
}

#[test]
fn test_missing_root_is_error() {
    let source = FileSource::new("logs", "/nonexistent/chorus/logs", SourceFormat::Json);
    let result: CoreResult<SourceBatches<RawEvent>> = source.batches(10);
    assert!(matches!(result, Err(CoreError::SourceNotFound { .. })));
}

#[test]
fn test_json_lines_in_batches() {
    let dir = tempfile::tempdir().unwrap();
    let first: Vec<String> = (0..3).map(|i| event_line(1_000 + i, 1)).collect();
    let second: Vec<String> = (0..2).map(|i| event_line(2_000 + i, 2)).collect();
    write(dir.path(), "a.json", &first.join("\n"));
    write(dir.path(), "b.json", &second.join("\n"));

    let source = FileSource::new("logs", dir.path(), SourceFormat::Json);
    let batches: Vec<RecordBatch<RawEvent>> = source
        .batches(2)
        .unwrap()
        .collect::<CoreResult<Vec<_>>>()
        .unwrap();

    let sizes: Vec<usize> = batches.iter().map(|b| b.records.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    let ts: Vec<Option<i64>> = batches
        .iter()
        .flat_map(|b| b.records.iter().map(|r| r.ts))
        .collect();
    assert_eq!(
        ts,
        vec![Some(1_000), Some(1_001), Some(1_002), Some(2_000), Some(2_001)]
    );
}

#[test]
fn test_malformed_lines_are_counted_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let content = format!(
        "{}\nnot json at all\n\n{}\n{{\"ts\": \"abc\"}}\n",
        event_line(1, 1),
        event_line(2, 1)
    );
    write(dir.path(), "log.json", &content);

    let source = FileSource::new("logs", dir.path().join("log.json"), SourceFormat::Json);
    let batches: Vec<RecordBatch<RawEvent>> = source
        .batches(100)
        .unwrap()
        .collect::<CoreResult<Vec<_>>>()
        .unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].records.len(), 2);
    assert_eq!(batches[0].malformed, 2);
}

#[test]
fn test_source_is_restartable() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "log.json", &event_line(1, 1));

    let source = FileSource::new("logs", dir.path(), SourceFormat::Json);
    for _ in 0..2 {
        let count: usize = source
            .batches(10)
            .unwrap()
            .map(|b: CoreResult<RecordBatch<RawEvent>>| b.unwrap().records.len())
            .sum();
        assert_eq!(count, 1);
    }
}

#[test]
fn test_csv_source() {
    let dir = tempfile::tempdir().unwrap();
    let content = "\
song_id,title,duration,year,artist_id,artist_name,artist_location,artist_latitude,artist_longitude,num_songs
S1,Song A,200.5,2004,A1,Artist X,,,,1
S2,Song B,oops,2004,A2,Artist Y,,,,1
S3,Song C,180,,A3,Artist Z,\"Austin, TX\",30.27,-97.74,1
";
    write(dir.path(), "songs.csv", content);

    let source = FileSource::new("songs", dir.path(), SourceFormat::Csv);
    let batches: Vec<RecordBatch<RawSongMetadata>> = source
        .batches(10)
        .unwrap()
        .collect::<CoreResult<Vec<_>>>()
        .unwrap();

    assert_eq!(batches.len(), 1);
    let records = &batches[0].records;
    assert_eq!(records.len(), 2);
    assert_eq!(batches[0].malformed, 1);
    assert_eq!(records[0].duration, Some(200.5));
    assert_eq!(records[1].year, None);
    assert_eq!(records[1].artist_location.as_deref(), Some("Austin, TX"));
}

#[test]
fn test_empty_directory_yields_no_batches() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileSource::new("logs", dir.path(), SourceFormat::Json);
    let mut batches: SourceBatches<RawEvent> = source.batches(10).unwrap();
    assert!(batches.next().is_none());
}
