//! Configuration management for tasktree.
//!
//! Settings live next to the documents in `.claude_tasks/config.json` and are
//! optional; every key falls back to a default.

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the state, registry, and config documents.
pub const TASKS_DIR: &str = ".claude_tasks";

/// File name of the project state document.
pub const STATE_FILE: &str = "state.json";

/// File name of the task registry document.
pub const REGISTRY_FILE: &str = "task_registry.json";

/// File name of the optional settings document.
pub const CONFIG_FILE: &str = "config.json";

fn default_workers() -> u32 {
    5
}

fn default_batch_size() -> usize {
    5
}

fn default_min_wave_size() -> usize {
    5
}

fn default_max_wave_size() -> usize {
    10
}

fn default_resume_preview() -> usize {
    10
}

/// Tracker configuration loaded from `.claude_tasks/config.json`
///
/// # Example config.json
///
/// ```json
/// {
///   "workers": 3,
///   "batchSize": 4,
///   "maxWaveSize": 8
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Parallel workers recorded when development starts
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Tasks handed out per batch by the next-batch query
    #[serde(default = "default_batch_size", rename = "batchSize")]
    pub batch_size: usize,

    /// Smallest acceptable non-final wave
    #[serde(default = "default_min_wave_size", rename = "minWaveSize")]
    pub min_wave_size: usize,

    /// Largest acceptable wave; also the chunk size for derived waves
    #[serde(default = "default_max_wave_size", rename = "maxWaveSize")]
    pub max_wave_size: usize,

    /// Pending IDs listed in a resume report
    #[serde(default = "default_resume_preview", rename = "resumePreview")]
    pub resume_preview: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            batch_size: default_batch_size(),
            min_wave_size: default_min_wave_size(),
            max_wave_size: default_max_wave_size(),
            resume_preview: default_resume_preview(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a workspace directory.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = Self::config_path(workspace);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| TrackerError::storage(&path, e.to_string()))?;
        let config: TrackerConfig = serde_json::from_str(&content)
            .map_err(|source| TrackerError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(TrackerError::invalid_argument("workers", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(TrackerError::invalid_argument("batchSize", "must be at least 1"));
        }
        if self.min_wave_size == 0 || self.max_wave_size == 0 {
            return Err(TrackerError::invalid_argument(
                "waveSize",
                "wave size bounds must be at least 1",
            ));
        }
        if self.min_wave_size > self.max_wave_size {
            return Err(TrackerError::invalid_argument(
                "minWaveSize",
                format!(
                    "{} exceeds maxWaveSize {}",
                    self.min_wave_size, self.max_wave_size
                ),
            ));
        }
        Ok(())
    }

    /// Get the `.claude_tasks` directory for a workspace
    pub fn tasks_dir(workspace: &Path) -> PathBuf {
        workspace.join(TASKS_DIR)
    }

    /// Get the config.json path for a workspace
    pub fn config_path(workspace: &Path) -> PathBuf {
        Self::tasks_dir(workspace).join(CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = TrackerConfig::load(temp.path()).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.workers, 5);
        assert_eq!(config.max_wave_size, 10);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(TrackerConfig::tasks_dir(temp.path())).unwrap();
        std::fs::write(
            TrackerConfig::config_path(temp.path()),
            r#"{"batchSize": 3, "resumePreview": 2}"#,
        )
        .unwrap();

        let config = TrackerConfig::load(temp.path()).unwrap();
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.resume_preview, 2);
        assert_eq!(config.workers, 5);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(TrackerConfig::tasks_dir(temp.path())).unwrap();
        std::fs::write(TrackerConfig::config_path(temp.path()), "{ nope").unwrap();

        let err = TrackerConfig::load(temp.path()).unwrap_err();
        assert!(matches!(err, TrackerError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_inverted_wave_bounds() {
        let config = TrackerConfig {
            min_wave_size: 12,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrackerError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_paths() {
        let root = Path::new("/work/project");
        assert_eq!(
            TrackerConfig::config_path(root),
            PathBuf::from("/work/project/.claude_tasks/config.json")
        );
    }
}
