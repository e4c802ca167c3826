//! Record sources: lazily read raw records from files in batches
//!
//! A source is a finite, restartable sequence of records from a named
//! location. Each call to [`RecordSource::batches`] starts from the first
//! file again. Files are never modified.
//!
//! A line or row that fails to parse is counted as malformed and skipped.
//! I/O failures end the iteration with an error.

use crate::config::{Config, SourceConfig, SourceFormat};
use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// One batch of parsed records
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch<T> {
    /// Records that parsed successfully, in file order
    pub records: Vec<T>,
    /// Lines/rows in this batch's span that failed to parse
    pub malformed: usize,
}

impl<T> Default for RecordBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: 0,
        }
    }
}

/// A restartable producer of record batches
pub trait RecordSource<T> {
    /// Human-readable source name for logging
    fn name(&self) -> &str;

    /// Start a fresh pass over the source
    fn batches(&self, batch_size: usize) -> CoreResult<SourceBatches<T>>;
}

/// Files of one format under a root directory (or a single file)
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    root: PathBuf,
    format: SourceFormat,
}

impl FileSource {
    /// Create a new file source
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            format,
        }
    }

    /// Create a file source from config, resolving its path against the project root
    pub fn from_config(name: &str, source: &SourceConfig, project_root: &Path) -> Self {
        Self::new(
            name,
            Config::source_path_absolute(source, project_root),
            source.format,
        )
    }

    /// Root path of the source
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File format of the source
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Discover the source's files, sorted by path
    pub fn discover_files(&self) -> CoreResult<Vec<PathBuf>> {
        if !self.root.exists() {
            return Err(CoreError::SourceNotFound {
                path: self.root.display().to_string(),
            });
        }

        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        discover_recursive(&self.root, self.format.extension(), &mut files)?;
        files.sort();
        Ok(files)
    }
}

/// Recursively collect files with the given extension
fn discover_recursive(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    for entry in entries {
        let path = entry?.path();

        if path.is_dir() {
            discover_recursive(&path, extension, files)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            files.push(path);
        }
    }

    Ok(())
}

impl<T: DeserializeOwned> RecordSource<T> for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn batches(&self, batch_size: usize) -> CoreResult<SourceBatches<T>> {
        let files = self.discover_files()?;
        log::info!(
            "Source '{}': {} {} file(s) under {}",
            self.name,
            files.len(),
            self.format,
            self.root.display()
        );
        Ok(SourceBatches {
            files: files.into(),
            format: self.format,
            batch_size: batch_size.max(1),
            current: None,
            done: false,
        })
    }
}

/// A file being read
enum OpenFile<T> {
    Json {
        path: PathBuf,
        lines: Lines<BufReader<File>>,
        line_no: usize,
    },
    Csv {
        path: PathBuf,
        rows: csv::DeserializeRecordsIntoIter<File, T>,
    },
}

/// Outcome of reading one record
enum Read<T> {
    Record(T),
    Malformed(String),
    Eof,
}

impl<T: DeserializeOwned> OpenFile<T> {
    fn open(path: PathBuf, format: SourceFormat) -> CoreResult<Self> {
        log::debug!("Reading {}", path.display());
        match format {
            SourceFormat::Json => {
                let file = File::open(&path).map_err(|e| CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                })?;
                Ok(OpenFile::Json {
                    lines: BufReader::new(file).lines(),
                    path,
                    line_no: 0,
                })
            }
            SourceFormat::Csv => {
                let reader = csv::Reader::from_path(&path).map_err(|e| csv_io_error(&path, e))?;
                Ok(OpenFile::Csv {
                    rows: reader.into_deserialize(),
                    path,
                })
            }
        }
    }

    fn read(&mut self) -> CoreResult<Read<T>> {
        match self {
            OpenFile::Json {
                path,
                lines,
                line_no,
            } => loop {
                let Some(line) = lines.next() else {
                    return Ok(Read::Eof);
                };
                *line_no += 1;
                let line = line.map_err(|e| CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                return Ok(match serde_json::from_str::<T>(&line) {
                    Ok(record) => Read::Record(record),
                    Err(e) => Read::Malformed(format!("{}:{}: {}", path.display(), line_no, e)),
                });
            },
            OpenFile::Csv { path, rows } => match rows.next() {
                None => Ok(Read::Eof),
                Some(Ok(record)) => Ok(Read::Record(record)),
                Some(Err(e)) if e.is_io_error() => Err(csv_io_error(path, e)),
                Some(Err(e)) => Ok(Read::Malformed(format!("{}: {}", path.display(), e))),
            },
        }
    }
}

fn csv_io_error(path: &Path, err: csv::Error) -> CoreError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => CoreError::IoWithPath {
            path: path.display().to_string(),
            source,
        },
        other => CoreError::IoWithPath {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, format!("{other:?}")),
        },
    }
}

/// Iterator over the batches of one pass through a source
pub struct SourceBatches<T> {
    files: VecDeque<PathBuf>,
    format: SourceFormat,
    batch_size: usize,
    current: Option<OpenFile<T>>,
    done: bool,
}

impl<T: DeserializeOwned> Iterator for SourceBatches<T> {
    type Item = CoreResult<RecordBatch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = RecordBatch::default();
        while batch.records.len() < self.batch_size {
            if self.current.is_none() {
                let Some(path) = self.files.pop_front() else {
                    break;
                };
                match OpenFile::open(path, self.format) {
                    Ok(file) => self.current = Some(file),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }
            let Some(current) = self.current.as_mut() else {
                break;
            };

            match current.read() {
                Ok(Read::Record(record)) => batch.records.push(record),
                Ok(Read::Malformed(reason)) => {
                    batch.malformed += 1;
                    log::warn!("Skipping malformed record at {reason}");
                }
                Ok(Read::Eof) => self.current = None,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        if batch.records.is_empty() && batch.malformed == 0 {
            self.done = true;
            None
        } else {
            Some(Ok(batch))
        }
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
