//! Configuration types and parsing for chorus.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main pipeline configuration from chorus.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pipeline name
    pub name: String,

    /// Raw record locations
    pub sources: SourcesConfig,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Schema that holds the star tables (default: none, i.e. `main`)
    #[serde(default)]
    pub schema: Option<String>,

    /// Number of raw records read per source batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of rows rendered into a single INSERT statement
    #[serde(default = "default_insert_chunk_size")]
    pub insert_chunk_size: usize,

    /// Named target configurations (e.g., dev, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Raw record source locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    /// Event log files (one record per play/page event)
    pub log_data: SourceConfig,

    /// Song metadata files (one record per song)
    pub song_data: SourceConfig,

    /// Value of the `page` field that marks a song play
    #[serde(default = "default_play_page")]
    pub play_page: String,
}

/// A single record source: a directory of files in one format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory (searched recursively) or single file
    pub path: String,

    /// File format
    #[serde(default)]
    pub format: SourceFormat,
}

/// File format of a record source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Delimited text with a header row
    Csv,
}

impl SourceFormat {
    /// File extension used when discovering files of this format
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Schema override
    #[serde(default)]
    pub schema: Option<String>,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

/// Environment variable consulted when no `--target` flag is given
pub const TARGET_ENV_VAR: &str = "CHORUS_TARGET";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_play_page() -> String {
    "NextSong".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_insert_chunk_size() -> usize {
    500
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            CoreError::YamlParse(err) => CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), err),
            },
            other => other,
        })
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for chorus.yml or chorus.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("chorus.yml");
        let yaml_path = dir.join("chorus.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Pipeline name cannot be empty".to_string(),
            });
        }

        if self.batch_size == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "batch_size must be greater than zero".to_string(),
            });
        }

        if self.insert_chunk_size == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "insert_chunk_size must be greater than zero".to_string(),
            });
        }

        for (label, source) in [
            ("log_data", &self.sources.log_data),
            ("song_data", &self.sources.song_data),
        ] {
            if source.path.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("sources.{label}.path cannot be empty"),
                });
            }
        }

        if self.sources.play_page.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "sources.play_page cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve a source path against the project root
    pub fn source_path_absolute(source: &SourceConfig, root: &Path) -> PathBuf {
        root.join(&source.path)
    }

    /// Get the list of available target names
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get database configuration, optionally applying target overrides
    ///
    /// If target is specified and exists, uses target's database config.
    /// Unknown target names are an error.
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config =
                    self.targets
                        .get(name)
                        .ok_or_else(|| CoreError::ConfigInvalid {
                            message: format!(
                                "Target '{}' not found. Available targets: {}",
                                name,
                                self.available_targets().join(", ")
                            ),
                        })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Get schema, optionally applying target overrides
    pub fn get_schema(&self, target: Option<&str>) -> Option<&str> {
        target
            .and_then(|name| self.targets.get(name))
            .and_then(|t| t.schema.as_deref())
            .or(self.schema.as_deref())
    }

    /// Resolve target from CLI flag or CHORUS_TARGET environment variable
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
