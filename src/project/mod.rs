//! Orchestration facade over the registry and the state document.
//!
//! [`Project`] owns both in-memory documents, so a composite operation
//! either changes both or neither. Persistence is an explicit step through
//! [`ProjectStore`]; see [`ProjectStore::save_project`] for the outcome when
//! only one document reaches disk.

pub mod dashboard;
pub mod decomposition;

pub use dashboard::{Dashboard, DevelopmentSummary, PhaseSummary};
pub use decomposition::{Decomposition, DecompositionRun, FailedFile, IntegratedFile};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::registry::{
    Category, DependencyGraph, ExecutionOrderReport, TaskNode, TaskRegistry, TaskStatus,
    TaskUpdate, Wave, WaveCategory,
};
use crate::state::{AnalyzedDependencies, ProgressStatus, ProjectState};
use crate::storage::ProjectStore;

/// Optional fields recorded when a task completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionDetails {
    #[serde(default)]
    pub implementation_file: Option<String>,
    #[serde(default)]
    pub test_file: Option<String>,
    #[serde(default)]
    pub test_coverage: Option<f64>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
}

impl CompletionDetails {
    fn into_update(self) -> TaskUpdate {
        TaskUpdate {
            implementation_file: self.implementation_file,
            test_file: self.test_file,
            test_coverage: self.test_coverage,
            duration_minutes: self.duration_minutes,
            ..TaskUpdate::status(TaskStatus::Completed)
        }
    }
}

/// Result of a task-level transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    /// Set for integration completions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub wave: u32,
    pub completed: usize,
    pub failed: usize,
}

/// Summary of a validated wave completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveCompletion {
    pub wave: u32,
    pub total_tasks: usize,
    pub completed: usize,
    pub failed: usize,
    /// Wave that became current, `None` after the final wave
    pub next_wave: Option<u32>,
    pub development_completed: bool,
}

/// Whether and where an interrupted development run can continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeStatus {
    pub can_resume: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub current_wave: u32,
    #[serde(default)]
    pub total_waves: u32,
    #[serde(default)]
    pub completed_tasks: usize,
    #[serde(default)]
    pub failed_tasks: usize,
    #[serde(default)]
    pub pending_in_current_wave: usize,
    /// First pending IDs of the current wave
    #[serde(default)]
    pub pending_task_ids: Vec<String>,
}

/// Result of applying a dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisOutcome {
    pub dependencies_added: usize,
    pub total_waves: u32,
    pub report: ExecutionOrderReport,
    /// Edges that could not be added
    pub edge_failures: Vec<String>,
}

/// Both documents plus settings, mutated together.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub registry: TaskRegistry,
    pub state: ProjectState,
    pub config: TrackerConfig,
}

impl Project {
    #[must_use]
    pub fn new(
        registry: TaskRegistry,
        state: ProjectState,
        config: TrackerConfig,
    ) -> Self {
        Self {
            registry,
            state,
            config,
        }
    }

    /// Load config and both documents of a workspace.
    pub fn open(store: &ProjectStore) -> Result<Self> {
        let config = TrackerConfig::load(store.workspace())?;
        let (registry, state) = store.load_project()?;
        Ok(Self::new(registry, state, config))
    }

    /// Write both documents.
    pub fn save(&mut self, store: &ProjectStore) -> Result<()> {
        store.save_project(&self.registry, &mut self.state)
    }

    /// Terminal status of a wave task, `None` while it is still pending.
    ///
    /// The state lists hold bare IDs shared by both forests. In a
    /// single-forest wave the node in that forest must carry the listed
    /// status too, so a frontend completion never closes a backend task.
    fn wave_task_outcome(&self, category: WaveCategory, task_id: &str) -> Option<TaskStatus> {
        let listed = |ids: &[String]| ids.iter().any(|id| id == task_id);
        let outcome = if listed(self.state.completed_tasks()) {
            TaskStatus::Completed
        } else if listed(self.state.failed_tasks()) {
            TaskStatus::Failed
        } else {
            return None;
        };
        match category
            .forest()
            .and_then(|forest| self.registry.find_in_category(forest, task_id))
        {
            Some(node) if node.status != outcome => None,
            _ => Some(outcome),
        }
    }

    fn pending_in_wave(&self, wave: u32) -> Vec<&str> {
        let Some(stored) = self.registry.wave(wave) else {
            return Vec::new();
        };
        stored
            .tasks
            .iter()
            .filter(|id| self.wave_task_outcome(stored.category, id).is_none())
            .map(String::as_str)
            .collect()
    }

    // =========================================================================
    // Task transitions
    // =========================================================================

    /// Mark a work item completed in the registry and the state lists.
    pub fn complete_task(&mut self, task_id: &str, details: CompletionDetails) -> Result<TaskOutcome> {
        self.complete_task_in(None, task_id, details)
    }

    /// [`complete_task`](Self::complete_task) for a task in one forest, or
    /// frontend-first when `category` is `None`.
    pub fn complete_task_in(
        &mut self,
        category: Option<Category>,
        task_id: &str,
        details: CompletionDetails,
    ) -> Result<TaskOutcome> {
        self.registry
            .update_in(category, task_id, details.into_update())?;
        self.state.complete_task(task_id);
        info!(task_id, "Task completed");
        Ok(TaskOutcome {
            task_id: task_id.to_string(),
            status: TaskStatus::Completed,
            level: None,
            error: None,
        })
    }

    /// Mark a task failed in the registry and the state lists.
    pub fn fail_task(&mut self, task_id: &str, error: &str) -> Result<TaskOutcome> {
        self.fail_task_in(None, task_id, error)
    }

    /// [`fail_task`](Self::fail_task) for a task in one forest.
    pub fn fail_task_in(
        &mut self,
        category: Option<Category>,
        task_id: &str,
        error: &str,
    ) -> Result<TaskOutcome> {
        self.registry
            .update_in(category, task_id, TaskUpdate::failed(error))?;
        self.state.fail_task(task_id);
        warn!(task_id, error, "Task failed");
        Ok(TaskOutcome {
            task_id: task_id.to_string(),
            status: TaskStatus::Failed,
            level: None,
            error: Some(error.to_string()),
        })
    }

    /// Complete a level-1 or level-2 branch whose subtree is done.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task, `InvalidArgument` for other levels,
    /// `PreconditionFailed` listing every incomplete descendant.
    pub fn complete_integration_task(
        &mut self,
        task_id: &str,
        details: CompletionDetails,
    ) -> Result<TaskOutcome> {
        self.complete_integration_task_in(None, task_id, details)
    }

    /// [`complete_integration_task`](Self::complete_integration_task) for a
    /// branch in one forest.
    pub fn complete_integration_task_in(
        &mut self,
        category: Option<Category>,
        task_id: &str,
        details: CompletionDetails,
    ) -> Result<TaskOutcome> {
        let task = self.registry.get_in(category, task_id)?;
        let level = task.level;
        if !matches!(level, 1 | 2) {
            return Err(TrackerError::invalid_argument(
                "level",
                format!(
                    "task {} is level {}; integration applies to levels 1 and 2",
                    task_id, level
                ),
            ));
        }
        if !task.all_descendants_completed() {
            // A leaf's predicate reads its own status, so it is its own blocker.
            let incomplete = if task.is_leaf() {
                vec![task.id.clone()]
            } else {
                task.incomplete_descendants()
            };
            return Err(TrackerError::precondition(
                task_id,
                "descendants are not completed",
                incomplete,
            ));
        }

        self.registry
            .update_in(category, task_id, details.into_update())?;
        self.state.complete_task(task_id);
        info!(task_id, level, "Integration task completed");
        Ok(TaskOutcome {
            task_id: task_id.to_string(),
            status: TaskStatus::Completed,
            level: Some(level),
            error: None,
        })
    }

    // =========================================================================
    // Waves
    // =========================================================================

    /// Start development using the stored wave count and configured workers.
    pub fn start_development(&mut self, workers: Option<u32>) {
        let workers = workers.unwrap_or(self.config.workers);
        self.state
            .start_development(self.registry.total_waves(), workers);
    }

    /// Start a wave, sized from the stored execution order.
    pub fn start_wave(&mut self, wave: u32) -> Result<()> {
        let stored = self
            .registry
            .wave(wave)
            .ok_or_else(|| TrackerError::wave_not_found(wave))?;
        let total = stored.tasks.len();
        let batches = total.div_ceil(self.config.batch_size);
        let category = stored.category;
        self.state.start_wave(
            wave,
            category,
            u32::try_from(total).unwrap_or(u32::MAX),
            Some(u32::try_from(batches).unwrap_or(u32::MAX)),
        )?;
        Ok(())
    }

    /// Add a finished batch to the wave counters.
    pub fn complete_batch(
        &mut self,
        wave: u32,
        completed: &[String],
        failed: &[String],
    ) -> Result<BatchOutcome> {
        let to_u32 = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        self.state
            .complete_batch(wave, to_u32(completed.len()), to_u32(failed.len()))?;
        Ok(BatchOutcome {
            wave,
            completed: completed.len(),
            failed: failed.len(),
        })
    }

    /// Close a wave once every mapped task is completed or failed.
    ///
    /// # Errors
    ///
    /// `PreconditionFailed` listing every task still pending; `NotFound`
    /// when the wave was never started.
    pub fn complete_wave(&mut self, wave: u32) -> Result<WaveCompletion> {
        let pending: Vec<String> = self
            .pending_in_wave(wave)
            .into_iter()
            .map(str::to_string)
            .collect();
        if !pending.is_empty() {
            return Err(TrackerError::precondition(
                format!("wave {}", wave),
                "wave has incomplete tasks",
                pending,
            ));
        }

        let (completed, total_tasks) = match self.registry.wave(wave) {
            Some(stored) => (
                stored
                    .tasks
                    .iter()
                    .filter(|id| {
                        self.wave_task_outcome(stored.category, id) == Some(TaskStatus::Completed)
                    })
                    .count(),
                stored.tasks.len(),
            ),
            None => (0, 0),
        };

        self.state.complete_wave(wave)?;
        let development_completed =
            self.state.development_phase.status == ProgressStatus::Completed;
        Ok(WaveCompletion {
            wave,
            total_tasks,
            completed,
            failed: total_tasks - completed,
            next_wave: (!development_completed).then(|| self.state.current_wave()),
            development_completed,
        })
    }

    /// Next tasks to hand out: the first `batch_size` pending tasks of a wave.
    ///
    /// IDs resolve in the wave's forest; those that no longer resolve are
    /// skipped.
    #[must_use]
    pub fn next_batch(&self, wave: u32, batch_size: Option<usize>) -> Vec<&TaskNode> {
        let size = batch_size.unwrap_or(self.config.batch_size);
        let category = self
            .registry
            .wave(wave)
            .map_or(WaveCategory::Mixed, |w| w.category);
        self.pending_in_wave(wave)
            .into_iter()
            .take(size)
            .filter_map(|id| self.registry.find_wave_task(category, id))
            .collect()
    }

    /// Report whether development can resume and what is left in the
    /// current wave.
    #[must_use]
    pub fn resume_status(&self) -> ResumeStatus {
        let development = &self.state.development_phase;
        if !self.state.is_resumable() {
            return ResumeStatus {
                can_resume: false,
                reason: Some("Development not in progress or not started".to_string()),
                current_wave: development.current_wave,
                total_waves: self.registry.total_waves(),
                completed_tasks: development.completed_tasks.len(),
                failed_tasks: development.failed_tasks.len(),
                pending_in_current_wave: 0,
                pending_task_ids: Vec::new(),
            };
        }

        let pending = self.pending_in_wave(development.current_wave);
        ResumeStatus {
            can_resume: true,
            reason: None,
            current_wave: development.current_wave,
            total_waves: self.registry.total_waves(),
            completed_tasks: development.completed_tasks.len(),
            failed_tasks: development.failed_tasks.len(),
            pending_in_current_wave: pending.len(),
            pending_task_ids: pending
                .into_iter()
                .take(self.config.resume_preview)
                .map(str::to_string)
                .collect(),
        }
    }

    // =========================================================================
    // Execution order
    // =========================================================================

    /// Validate and apply a dependency analysis.
    ///
    /// Cross-stack edges that cannot be added are reported, not fatal.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` carrying the validation errors; nothing is applied.
    pub fn apply_dependency_analysis(&mut self, analysis: DependencyGraph) -> Result<AnalysisOutcome> {
        let report = self.registry.validate_execution_order(
            &analysis,
            self.config.min_wave_size,
            self.config.max_wave_size,
        );
        if !report.is_valid() {
            return Err(TrackerError::invalid_argument(
                "execution_order",
                report.errors.join("; "),
            ));
        }

        let mut dependencies_added = 0;
        let mut edge_failures = Vec::new();
        for (task_id, deps) in &analysis.cross_stack_dependencies {
            for dep in deps {
                match self.registry.add_dependency(task_id, dep) {
                    Ok(()) => dependencies_added += 1,
                    Err(e) => {
                        warn!("Failed to add dependency {} -> {}: {}", task_id, dep, e);
                        edge_failures.push(format!("{} -> {}: {}", task_id, dep, e));
                    }
                }
            }
        }

        self.registry.dependency_graph = analysis;
        let total_waves = self.registry.total_waves();
        self.state
            .complete_dependency_analysis(total_waves, AnalyzedDependencies::all());
        info!(dependencies_added, total_waves, "Applied dependency analysis");

        Ok(AnalysisOutcome {
            dependencies_added,
            total_waves,
            report,
            edge_failures,
        })
    }

    /// Replace the stored wave list with one derived from the current edges.
    pub fn rederive_execution_order(&mut self) -> Result<&[Wave]> {
        let waves = self
            .registry
            .derive_execution_order(self.config.max_wave_size)?;
        self.registry.set_execution_order(waves);
        Ok(self.registry.execution_order())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NewTask;
    use crate::testing::builders;

    fn developing() -> Project {
        let mut project = Project::new(
            builders::login_feature(),
            ProjectState::new(),
            TrackerConfig::default(),
        );
        project.registry.set_execution_order(vec![
            builders::wave(1, &["1.1.1", "1.1.2", "1.1.3"]),
            builders::wave(2, &["1.1", "2.1"]),
        ]);
        project.start_development(None);
        project.start_wave(1).unwrap();
        project
    }

    #[test]
    fn test_complete_task_updates_both_documents() {
        let mut project = developing();
        project.fail_task("1.1.1", "timeout").unwrap();
        let outcome = project
            .complete_task(
                "1.1.1",
                CompletionDetails {
                    test_coverage: Some(91.5),
                    ..CompletionDetails::default()
                },
            )
            .unwrap();

        assert_eq!(outcome.status, TaskStatus::Completed);
        let node = project.registry.find("1.1.1").unwrap();
        assert_eq!(node.status, TaskStatus::Completed);
        assert_eq!(node.error, None);
        assert_eq!(node.test_coverage, Some(91.5));
        assert_eq!(project.state.completed_tasks(), ["1.1.1"]);
        assert!(project.state.failed_tasks().is_empty());
    }

    #[test]
    fn test_unknown_task_changes_neither_document() {
        let mut project = developing();
        let err = project
            .complete_task("9.9", CompletionDetails::default())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(project.state.completed_tasks().is_empty());
    }

    #[test]
    fn test_fail_task_records_error() {
        let mut project = developing();
        let outcome = project.fail_task("1.1.2", "assertion failed").unwrap();
        assert_eq!(outcome.error.as_deref(), Some("assertion failed"));
        let node = project.registry.find("1.1.2").unwrap();
        assert_eq!(node.status, TaskStatus::Failed);
        assert_eq!(node.error.as_deref(), Some("assertion failed"));
        assert_eq!(project.state.failed_tasks(), ["1.1.2"]);
    }

    #[test]
    fn test_integration_requires_completed_subtree() {
        let mut project = developing();
        project
            .complete_task("1.1.1", CompletionDetails::default())
            .unwrap();

        let err = project
            .complete_integration_task("1.1", CompletionDetails::default())
            .unwrap_err();
        assert_eq!(err.incomplete_tasks(), ["1.1.2", "1.1.3"]);
        assert_eq!(project.registry.find("1.1").unwrap().status, TaskStatus::Decomposed);

        for id in ["1.1.2", "1.1.3"] {
            project.complete_task(id, CompletionDetails::default()).unwrap();
        }
        let outcome = project
            .complete_integration_task("1.1", CompletionDetails::default())
            .unwrap();
        assert_eq!(outcome.level, Some(2));
        assert!(project.state.completed_tasks().contains(&"1.1".to_string()));
    }

    #[test]
    fn test_integration_rejects_deep_levels() {
        let mut project = developing();
        let err = project
            .complete_integration_task("1.1.1", CompletionDetails::default())
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_complete_wave_reports_pending() {
        let mut project = developing();
        project
            .complete_task("1.1.1", CompletionDetails::default())
            .unwrap();
        project.fail_task("1.1.3", "broken").unwrap();

        let err = project.complete_wave(1).unwrap_err();
        assert_eq!(err.incomplete_tasks(), ["1.1.2"]);
        assert_eq!(project.state.current_wave(), 1);

        project
            .complete_task("1.1.2", CompletionDetails::default())
            .unwrap();
        let summary = project.complete_wave(1).unwrap();
        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.next_wave, Some(2));
        assert!(!summary.development_completed);
    }

    #[test]
    fn test_final_wave_finishes_development() {
        let mut project = developing();
        for id in ["1.1.1", "1.1.2", "1.1.3"] {
            project.complete_task(id, CompletionDetails::default()).unwrap();
        }
        project.complete_wave(1).unwrap();
        project.start_wave(2).unwrap();
        project
            .complete_integration_task("1.1", CompletionDetails::default())
            .unwrap();
        project.fail_task("2.1", "blocked").unwrap();

        let summary = project.complete_wave(2).unwrap();
        assert!(summary.development_completed);
        assert_eq!(summary.next_wave, None);
        assert!(!project.resume_status().can_resume);
    }

    #[test]
    fn test_next_batch_and_resume() {
        let mut project = developing();
        project.config.resume_preview = 1;
        project
            .complete_task("1.1.1", CompletionDetails::default())
            .unwrap();

        let batch: Vec<&str> = project
            .next_batch(1, Some(1))
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(batch, ["1.1.2"]);
        assert_eq!(project.next_batch(1, None).len(), 2);

        let resume = project.resume_status();
        assert!(resume.can_resume);
        assert_eq!(resume.current_wave, 1);
        assert_eq!(resume.total_waves, 2);
        assert_eq!(resume.pending_in_current_wave, 2);
        assert_eq!(resume.pending_task_ids, ["1.1.2"]);
    }

    /// Frontend `1 > 1.1` and backend `1 > 1.1` with derived waves.
    fn shared_ids() -> Project {
        let mut project = Project::default();
        for category in Category::ALL {
            let root = project
                .registry
                .insert_root(category, NewTask::titled(format!("{category} root")));
            project
                .registry
                .insert_child(&root, NewTask::titled(format!("{category} leaf")))
                .unwrap();
        }
        project.rederive_execution_order().unwrap();
        project.start_development(None);
        project
    }

    #[test]
    fn test_single_forest_wave_ignores_other_forest_completion() {
        let mut project = shared_ids();
        project.start_wave(1).unwrap();
        project
            .complete_task("1.1", CompletionDetails::default())
            .unwrap();
        assert_eq!(project.complete_wave(1).unwrap().completed, 1);

        // "1.1" is already on the completed list, but the backend node is not done.
        project.start_wave(2).unwrap();
        let batch = project.next_batch(2, None);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].category, Category::Backend);
        assert_eq!(project.complete_wave(2).unwrap_err().incomplete_tasks(), ["1.1"]);

        project
            .fail_task_in(Some(Category::Backend), "1.1", "timeout")
            .unwrap();
        let summary = project.complete_wave(2).unwrap();
        assert_eq!((summary.completed, summary.failed), (0, 1));
        assert_eq!(
            project.registry.get_in(Some(Category::Frontend), "1.1").unwrap().status,
            TaskStatus::Completed
        );
    }

    #[test]
    fn test_integration_in_backend_forest() {
        let mut project = shared_ids();
        project
            .complete_task_in(Some(Category::Backend), "1.1", CompletionDetails::default())
            .unwrap();
        assert!(project
            .complete_integration_task("1", CompletionDetails::default())
            .is_err());
        let outcome = project
            .complete_integration_task_in(Some(Category::Backend), "1", CompletionDetails::default())
            .unwrap();
        assert_eq!(outcome.level, Some(1));
        assert_eq!(
            project.registry.get_in(Some(Category::Frontend), "1").unwrap().status,
            TaskStatus::Decomposed
        );
    }

    #[test]
    fn test_resume_before_development() {
        let project = Project::default();
        let resume = project.resume_status();
        assert!(!resume.can_resume);
        assert!(resume.reason.is_some());
    }

    #[test]
    fn test_complete_batch_counts() {
        let mut project = developing();
        let outcome = project
            .complete_batch(1, &["1.1.1".to_string()], &[])
            .unwrap();
        assert_eq!(outcome.completed, 1);
        let record = project.state.wave_progress(1).unwrap();
        assert_eq!(record.completed, 1);
        assert_eq!(record.current_batch, Some(2));
        assert!(project.complete_batch(7, &[], &[]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_start_wave_uses_stored_order() {
        let mut project = developing();
        project.config.batch_size = 2;
        project.start_wave(1).unwrap();
        let record = project.state.wave_progress(1).unwrap();
        assert_eq!(record.tasks, 3);
        assert_eq!(record.total_batches, Some(2));
        assert!(project.start_wave(5).unwrap_err().is_not_found());
    }

    #[test]
    fn test_apply_dependency_analysis() {
        let mut project = Project::new(
            builders::login_feature(),
            ProjectState::new(),
            TrackerConfig {
                min_wave_size: 1,
                ..TrackerConfig::default()
            },
        );
        project
            .registry
            .insert_root(Category::Backend, NewTask::titled("Auth API"));
        let analysis = DependencyGraph {
            cross_stack_dependencies: [("1.1.1".to_string(), vec!["2.1".to_string()])].into(),
            execution_order: vec![
                builders::wave(1, &["2.1", "2", "1.1.2", "1.1.3"]),
                builders::wave(2, &["1.1.1", "1.1", "1"]),
            ],
            ..DependencyGraph::default()
        };

        let outcome = project.apply_dependency_analysis(analysis).unwrap();
        assert_eq!(outcome.dependencies_added, 1);
        assert_eq!(outcome.total_waves, 2);
        assert!(outcome.edge_failures.is_empty());
        assert_eq!(project.registry.find("1.1.1").unwrap().dependencies, ["2.1"]);
        assert_eq!(project.state.dependency_phase.total_waves, 2);
    }

    #[test]
    fn test_invalid_analysis_is_not_applied() {
        let mut project = developing();
        let analysis = DependencyGraph {
            execution_order: vec![builders::wave(1, &["1.1.1"])],
            ..DependencyGraph::default()
        };
        let err = project.apply_dependency_analysis(analysis).unwrap_err();
        assert!(err.to_string().contains("not in execution order"));
        assert_eq!(project.registry.total_waves(), 2);
    }

    #[test]
    fn test_rederive_execution_order() {
        let mut project = developing();
        let waves = project.rederive_execution_order().unwrap();
        assert_eq!(waves[0].tasks, ["1.1.1", "1.1.2", "1.1.3", "2.1"]);
        assert_eq!(waves[0].category, WaveCategory::Frontend);
        assert_eq!(waves[1].tasks, ["1.1", "2"]);
        assert_eq!(waves[2].tasks, ["1"]);
    }
}
