//! Decomposition integration.
//!
//! A decomposition file names a parent task and the subtasks it breaks into:
//!
//! ```json
//! {
//!   "parent_task_id": "1.2",
//!   "parent_type": "page",
//!   "subtasks": [{"title": "Search Bar", "type": "component"}]
//! }
//! ```
//!
//! Files are staged in `.claude_tasks/<category>_decomposition_temp/`,
//! integrated in file-name order, then moved to
//! `.claude_tasks/<category>_decomposition_archive/` once the registry that
//! holds them has been saved.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::Project;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::registry::{Category, NewTask};

/// One parent and its new subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub parent_task_id: String,
    /// Informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    /// Forest holding the parent; frontend-first lookup when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub subtasks: Vec<NewTask>,
}

/// A decomposition file that was integrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegratedFile {
    pub file: PathBuf,
    pub parent_id: String,
    pub task_ids: Vec<String>,
}

/// A decomposition file that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file: PathBuf,
    pub error: String,
}

/// Result of integrating a directory of decomposition files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecompositionRun {
    pub files: Vec<IntegratedFile>,
    pub failures: Vec<FailedFile>,
}

impl DecompositionRun {
    /// Number of tasks created across all integrated files.
    #[must_use]
    pub fn total_tasks(&self) -> usize {
        self.files.iter().map(|f| f.task_ids.len()).sum()
    }
}

/// Staging directory for a stack's decomposition files.
#[must_use]
pub fn temp_dir(workspace: &Path, category: Category) -> PathBuf {
    TrackerConfig::tasks_dir(workspace).join(format!("{}_decomposition_temp", category))
}

/// Directory integrated decomposition files are moved to.
#[must_use]
pub fn archive_dir(workspace: &Path, category: Category) -> PathBuf {
    TrackerConfig::tasks_dir(workspace).join(format!("{}_decomposition_archive", category))
}

/// Read and parse one decomposition file.
pub fn read_decomposition(path: &Path) -> Result<Decomposition> {
    let content = fs::read_to_string(path)
        .map_err(|e| TrackerError::storage(path, format!("Failed to read: {}", e)))?;
    serde_json::from_str(&content).map_err(|source| TrackerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Move integrated files into `archive`, keeping their names.
///
/// Returns the new paths.
pub fn archive_files(run: &DecompositionRun, archive: &Path) -> Result<Vec<PathBuf>> {
    if run.files.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(archive).map_err(|e| {
        TrackerError::storage(archive, format!("Failed to create archive directory: {}", e))
    })?;

    let mut archived = Vec::with_capacity(run.files.len());
    for integrated in &run.files {
        let Some(name) = integrated.file.file_name() else {
            continue;
        };
        let dest = archive.join(name);
        fs::rename(&integrated.file, &dest).map_err(|e| {
            TrackerError::storage(&integrated.file, format!("Failed to archive: {}", e))
        })?;
        debug!(from = %integrated.file.display(), to = %dest.display(), "Archived decomposition file");
        archived.push(dest);
    }
    Ok(archived)
}

impl Project {
    /// Insert a decomposition's subtasks under its parent, in order.
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent does not exist; nothing is inserted.
    pub fn integrate_decomposition(&mut self, decomposition: &Decomposition) -> Result<Vec<String>> {
        let task_ids = self.registry.insert_children_in(
            decomposition.category,
            &decomposition.parent_task_id,
            decomposition.subtasks.iter().cloned(),
        )?;
        info!(
            parent_id = %decomposition.parent_task_id,
            created = task_ids.len(),
            "Integrated decomposition"
        );
        Ok(task_ids)
    }

    /// Integrate every top-level `*.json` file of `dir` in file-name order.
    ///
    /// Parents are looked up in `category` unless a file names its own.
    /// A file that cannot be read, parsed, or integrated is recorded in
    /// [`DecompositionRun::failures`] and the rest still run.
    ///
    /// # Errors
    ///
    /// `NotFound` if `dir` does not exist.
    pub fn integrate_decomposition_dir(
        &mut self,
        dir: &Path,
        category: Category,
    ) -> Result<DecompositionRun> {
        if !dir.is_dir() {
            return Err(TrackerError::NotFound {
                kind: "Decomposition directory",
                id: dir.display().to_string(),
            });
        }

        let mut run = DecompositionRun::default();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|e| e == "json").unwrap_or(false))
        {
            let path = entry.path();
            let outcome = read_decomposition(path).and_then(|mut decomposition| {
                decomposition.category.get_or_insert(category);
                let task_ids = self.integrate_decomposition(&decomposition)?;
                Ok((decomposition.parent_task_id, task_ids))
            });

            match outcome {
                Ok((parent_id, task_ids)) => run.files.push(IntegratedFile {
                    file: path.to_path_buf(),
                    parent_id,
                    task_ids,
                }),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    run.failures.push(FailedFile {
                        file: path.to_path_buf(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            files = run.files.len(),
            failures = run.failures.len(),
            tasks = run.total_tasks(),
            "Decomposition integration finished"
        );
        Ok(run)
    }
}
