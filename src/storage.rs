//! File-backed document store.
//!
//! Both documents are read and written whole. Writes go to a sibling temp
//! file that is renamed over the target, so an interrupted save leaves the
//! previous document intact. There is no locking; concurrent writers are
//! last-write-wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{TrackerConfig, REGISTRY_FILE, STATE_FILE};
use crate::error::{Result, TrackerError};
use crate::registry::TaskRegistry;
use crate::state::ProjectState;

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Loads and saves the state and registry documents of one workspace.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    workspace: PathBuf,
    dir: PathBuf,
}

impl ProjectStore {
    #[must_use]
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        let workspace = workspace.as_ref().to_path_buf();
        let dir = TrackerConfig::tasks_dir(&workspace);
        Self { workspace, dir }
    }

    #[must_use]
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// The `.claude_tasks` directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(REGISTRY_FILE)
    }

    /// Load the registry, or an empty one if the file does not exist.
    pub fn load_registry(&self) -> Result<TaskRegistry> {
        read_document(&self.registry_path())
    }

    /// Load the state, or a fresh one if the file does not exist.
    pub fn load_state(&self) -> Result<ProjectState> {
        read_document(&self.state_path())
    }

    pub fn save_registry(&self, registry: &TaskRegistry) -> Result<()> {
        write_document(&self.registry_path(), registry)
    }

    /// Save the state, stamping `metadata.last_updated`.
    pub fn save_state(&self, state: &mut ProjectState) -> Result<()> {
        state.touch();
        write_document(&self.state_path(), state)
    }

    /// Load both documents.
    pub fn load_project(&self) -> Result<(TaskRegistry, ProjectState)> {
        Ok((self.load_registry()?, self.load_state()?))
    }

    /// Save both documents, registry first.
    ///
    /// If the state write fails the new registry stays on disk and the
    /// error is returned; re-running the operation reconciles the two.
    pub fn save_project(&self, registry: &TaskRegistry, state: &mut ProjectState) -> Result<()> {
        self.save_registry(registry)?;
        if let Err(e) = self.save_state(state) {
            warn!(
                "Registry saved but state save failed; documents may disagree: {}",
                e
            );
            return Err(e);
        }
        Ok(())
    }
}

fn read_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No document at {}, using defaults", path.display());
            return Ok(T::default());
        }
        Err(e) => return Err(TrackerError::storage(path, e.to_string())),
    };
    serde_json::from_str(&content).map_err(|source| TrackerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let storage_err = |e: std::io::Error| TrackerError::storage(path, e.to_string());

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(storage_err)?;
    }

    let json = serde_json::to_string_pretty(document)?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(TMP_SUFFIX);
    let tmp_path = PathBuf::from(tmp_name);

    let written = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp_path, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(storage_err(e));
    }
    debug!("Saved {}", path.display());
    Ok(())
}
