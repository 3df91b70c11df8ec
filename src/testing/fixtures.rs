//! Test fixtures for creating reproducible workspaces.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::TrackerConfig;
use crate::project::Project;
use crate::registry::{Category, TaskRegistry};
use crate::state::ProjectState;
use crate::storage::ProjectStore;

/// A temporary workspace directory.
///
/// Automatically cleans up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::with_registry(builders::login_feature());
/// let project = fixture.open();
/// // Directory is cleaned up when fixture goes out of scope
/// ```
pub struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create an empty workspace with no documents.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Create a workspace whose registry document is already saved.
    ///
    /// # Panics
    ///
    /// Panics if the document cannot be written.
    #[must_use]
    pub fn with_registry(registry: TaskRegistry) -> Self {
        let fixture = Self::new();
        fixture
            .store()
            .save_registry(&registry)
            .expect("Failed to save registry");
        fixture
    }

    /// Get the workspace root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the `.claude_tasks` directory.
    #[must_use]
    pub fn tasks_dir(&self) -> PathBuf {
        TrackerConfig::tasks_dir(self.path())
    }

    #[must_use]
    pub fn store(&self) -> ProjectStore {
        ProjectStore::new(self.path())
    }

    /// Load the project from disk.
    ///
    /// # Panics
    ///
    /// Panics if a document is malformed.
    #[must_use]
    pub fn open(&self) -> Project {
        Project::open(&self.store()).expect("Failed to open project")
    }

    /// Read the saved state document.
    ///
    /// # Panics
    ///
    /// Panics if the document is malformed.
    #[must_use]
    pub fn state(&self) -> ProjectState {
        self.store().load_state().expect("Failed to load state")
    }

    /// Write `config.json`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_config(&self, json: &str) {
        std::fs::create_dir_all(self.tasks_dir()).expect("Failed to create tasks dir");
        std::fs::write(TrackerConfig::config_path(self.path()), json)
            .expect("Failed to write config.json");
    }

    /// Write a decomposition file into the stack's temp directory and
    /// return that directory.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_decomposition(&self, category: Category, name: &str, json: &str) -> PathBuf {
        let dir = self
            .tasks_dir()
            .join(format!("{}_decomposition_temp", category));
        std::fs::create_dir_all(&dir).expect("Failed to create decomposition dir");
        std::fs::write(dir.join(name), json).expect("Failed to write decomposition file");
        dir
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
