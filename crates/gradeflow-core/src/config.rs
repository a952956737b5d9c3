//! Grading configuration for gradeflow
//!
//! Configuration is read from `gradeflow.toml`. Every field has a default, so
//! an empty file (or no file at all) yields the built-in rubric and chunk sizes.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use crate::bail_config;
use crate::error::{GradeError, Result};
use crate::rubric::Rubric;

pub use types::{
    ChunkingConfig, CollectionConfig, CriterionConfig, DetectorConfig, EmbeddingConfig,
    EmbeddingProviderKind, GradeConfig, PipelineConfig, ReportConfig, RetrievalConfig,
    RubricConfig, CONFIG_FILE_NAME,
};

const CONFIG_DIR: &str = "gradeflow";
const GLOBAL_CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR_ENV_VAR: &str = "GRADEFLOW_CONFIG_DIR";

impl GradeConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GradeError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: GradeConfig = toml::from_str(&content)
            .map_err(|e| GradeError::config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GradeError::Other(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the configuration for a run.
    ///
    /// Lookup order: the explicit path, `gradeflow.toml` in `cwd`, the user
    /// config directory, then built-in defaults. Returns the path that was used.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let local = cwd.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Ok((Self::load(&local)?, Some(local)));
        }

        if let Some(global) = global_config_path() {
            if global.is_file() {
                return Ok((Self::load(&global)?, Some(global)));
            }
        }

        tracing::debug!("no configuration file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Check every startup invariant. Runs before any document I/O.
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.max_size == 0 {
            bail_config!("chunking.max_size must be greater than 0");
        }
        if chunking.overlap >= chunking.max_size {
            bail_config!(
                "chunking.overlap ({}) must be smaller than chunking.max_size ({})",
                chunking.overlap,
                chunking.max_size
            );
        }
        if chunking.separators.is_empty() {
            bail_config!("chunking.separators must list at least one separator");
        }
        if self.embedding.dimension == 0 {
            bail_config!("embedding.dimension must be greater than 0");
        }
        if self.pipeline.workers == 0 {
            bail_config!("pipeline.workers must be at least 1");
        }
        if self.collection.extensions.is_empty() {
            bail_config!("collection.extensions must list at least one extension");
        }

        Rubric::from_config(&self.rubric)?;
        Ok(())
    }
}

fn global_config_path() -> Option<PathBuf> {
    let dir = match std::env::var(CONFIG_DIR_ENV_VAR) {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => dirs::config_dir()?.join(CONFIG_DIR),
    };
    Some(dir.join(GLOBAL_CONFIG_FILE))
}
