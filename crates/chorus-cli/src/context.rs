//! Runtime context for CLI commands

use anyhow::{Context, Result};
use chorus_core::{Config, FileSource};
use chorus_db::{Database, DuckDbBackend};
use chorus_load::StarTables;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Runtime context containing loaded config and database connection
pub struct RuntimeContext {
    /// The loaded configuration
    pub config: Config,

    /// Directory source paths are resolved against
    pub project_root: PathBuf,

    /// Resolved target name, if any
    pub target: Option<String>,

    /// Database connection
    pub db: Arc<dyn Database>,

    /// Star tables qualified with the resolved schema
    pub tables: StarTables,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let project_root = PathBuf::from(&args.project_dir);

        // Load config from custom path or project directory
        let config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&project_root).context("Failed to load project configuration")?
        };

        let target = Config::resolve_target(args.target.as_deref());
        let db_config = config
            .get_database_config(target.as_deref())
            .context("Failed to resolve database target")?;
        let tables = StarTables::new(config.get_schema(target.as_deref()));

        log::debug!(
            "Pipeline '{}': {} database at {} (target: {})",
            config.name,
            db_config.db_type,
            db_config.path,
            target.as_deref().unwrap_or("default")
        );
        let db: Arc<dyn Database> = Arc::new(
            DuckDbBackend::new(&db_config.path).context("Failed to connect to database")?,
        );

        Ok(Self {
            config,
            project_root,
            target,
            db,
            tables,
        })
    }

    /// Song metadata source from config
    pub fn song_source(&self) -> FileSource {
        FileSource::from_config("song_data", &self.config.sources.song_data, &self.project_root)
    }

    /// Event log source from config
    pub fn event_source(&self) -> FileSource {
        FileSource::from_config("log_data", &self.config.sources.log_data, &self.project_root)
    }
}
