//! Progress and phase tracking.
//!
//! The state document is a flat record, separate from the registry: four
//! phase trackers, per-wave aggregate counters, and the flat
//! completed/failed task lists. Nothing here reads node statuses, so the
//! two documents can disagree until the [`crate::project::Project`] facade
//! reconciles them.
//!
//! # Phase machines
//!
//! ```text
//! design:        not_started -> user_flows_completed -> completed
//! decomposition: not_started -> in_progress -> completed  (both stacks done)
//! dependency:    not_started -> completed
//! development:   not_started -> in_progress -> completed  (final wave done)
//! ```

pub mod phases;

pub use phases::{
    AnalyzedDependencies, BackendProgress, DecompositionPhase, DecompositionProgress,
    DependencyPhase, DependencyStatus, DesignPhase, DesignStatus, DevelopmentPhase,
    FrontendProgress, Phase, ProgressStatus, WaveProgress, WaveStatus,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TrackerError};
use crate::registry::{Category, WaveCategory};

/// Version written into new state documents.
pub const STATE_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMetadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

impl Default for StateMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_updated: now,
            version: STATE_VERSION.to_string(),
        }
    }
}

/// The state document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub design_phase: DesignPhase,
    #[serde(default)]
    pub decomposition_phase: DecompositionPhase,
    #[serde(default)]
    pub dependency_phase: DependencyPhase,
    #[serde(default)]
    pub development_phase: DevelopmentPhase,
    #[serde(default)]
    pub metadata: StateMetadata,
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl ProjectState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `metadata.last_updated`.
    pub fn touch(&mut self) {
        self.metadata.last_updated = Utc::now();
    }

    // =========================================================================
    // Design
    // =========================================================================

    /// Record that user flows exist and reset the wireframe fields.
    pub fn init_design_phase(&mut self, user_flows_file: &str) {
        let design = &mut self.design_phase;
        design.status = DesignStatus::UserFlowsCompleted;
        design.user_flows_file = Some(user_flows_file.to_string());
        design.wireframes_generated = false;
        design.wireframes_count = 0;
        info!(user_flows_file, "Design phase initialized");
    }

    pub fn complete_wireframes(
        &mut self,
        wireframes_count: u32,
        validation_status: &str,
        validation_report: &str,
    ) {
        let design = &mut self.design_phase;
        design.status = DesignStatus::Completed;
        design.wireframes_generated = true;
        design.wireframes_count = wireframes_count;
        design.wireframes_directory = Some("designs/wireframes/".to_string());
        design.validation_status = validation_status.to_string();
        design.validation_report = Some(validation_report.to_string());
        info!(wireframes_count, validation_status, "Wireframes completed");
    }

    // =========================================================================
    // Decomposition
    // =========================================================================

    fn stack_status_mut(&mut self, category: Category) -> &mut ProgressStatus {
        match category {
            Category::Frontend => &mut self.decomposition_phase.frontend_status,
            Category::Backend => &mut self.decomposition_phase.backend_status,
        }
    }

    /// Start one stack's decomposition; the phase becomes in progress.
    pub fn start_decomposition(&mut self, category: Category, total_modules: u32) {
        self.decomposition_phase.status = ProgressStatus::InProgress;
        *self.stack_status_mut(category) = ProgressStatus::InProgress;
        let progress = &mut self.decomposition_phase.progress;
        match category {
            Category::Frontend => progress.frontend.total_modules = total_modules,
            Category::Backend => progress.backend.total_modules = total_modules,
        }
        info!(%category, total_modules, "Decomposition started");
    }

    pub fn start_frontend_decomposition(&mut self, total_modules: u32) {
        self.start_decomposition(Category::Frontend, total_modules);
    }

    pub fn start_backend_decomposition(&mut self, total_modules: u32) {
        self.start_decomposition(Category::Backend, total_modules);
    }

    /// Overwrite the given frontend counters.
    pub fn update_frontend_progress(
        &mut self,
        total_pages: Option<u32>,
        total_components: Option<u32>,
        last_processed_module: Option<&str>,
    ) {
        let progress = &mut self.decomposition_phase.progress.frontend;
        if let Some(n) = total_pages {
            progress.total_pages = n;
        }
        if let Some(n) = total_components {
            progress.total_components = n;
        }
        if let Some(module) = last_processed_module {
            progress.last_processed_module = Some(module.to_string());
        }
    }

    /// Overwrite the given backend counters.
    pub fn update_backend_progress(
        &mut self,
        total_services: Option<u32>,
        total_functions: Option<u32>,
        last_processed_module: Option<&str>,
    ) {
        let progress = &mut self.decomposition_phase.progress.backend;
        if let Some(n) = total_services {
            progress.total_services = n;
        }
        if let Some(n) = total_functions {
            progress.total_functions = n;
        }
        if let Some(module) = last_processed_module {
            progress.last_processed_module = Some(module.to_string());
        }
    }

    /// Complete one stack; the phase completes once both stacks have.
    pub fn complete_decomposition(&mut self, category: Category) {
        *self.stack_status_mut(category) = ProgressStatus::Completed;
        let phase = &mut self.decomposition_phase;
        if phase.frontend_status == ProgressStatus::Completed
            && phase.backend_status == ProgressStatus::Completed
        {
            phase.status = ProgressStatus::Completed;
            info!("Decomposition phase completed");
        } else {
            info!(%category, "Stack decomposition completed");
        }
    }

    pub fn complete_frontend_decomposition(&mut self) {
        self.complete_decomposition(Category::Frontend);
    }

    pub fn complete_backend_decomposition(&mut self) {
        self.complete_decomposition(Category::Backend);
    }

    // =========================================================================
    // Dependency analysis
    // =========================================================================

    pub fn complete_dependency_analysis(&mut self, total_waves: u32, analyzed: AnalyzedDependencies) {
        self.dependency_phase = DependencyPhase {
            status: DependencyStatus::Completed,
            total_waves,
            frontend_internal_dependencies: analyzed.frontend_internal,
            backend_internal_dependencies: analyzed.backend_internal,
            cross_stack_dependencies: analyzed.cross_stack,
            execution_order_generated: analyzed.execution_order,
        };
        info!(total_waves, "Dependency analysis completed");
    }

    // =========================================================================
    // Development
    // =========================================================================

    /// Enter development at wave 1 with empty task lists.
    pub fn start_development(&mut self, total_waves: u32, workers: u32) {
        let development = &mut self.development_phase;
        development.status = ProgressStatus::InProgress;
        development.current_wave = 1;
        development.completed_waves = 0;
        development.total_waves = total_waves;
        development.workers = workers;
        development.completed_tasks.clear();
        development.failed_tasks.clear();
        info!(total_waves, workers, "Development started");
    }

    /// Create or overwrite a wave's progress record and make it current.
    pub fn start_wave(
        &mut self,
        wave: u32,
        category: WaveCategory,
        total_tasks: u32,
        total_batches: Option<u32>,
    ) -> Result<&WaveProgress> {
        self.start_wave_at(wave, category, total_tasks, total_batches, Utc::now())
    }

    pub fn start_wave_at(
        &mut self,
        wave: u32,
        category: WaveCategory,
        total_tasks: u32,
        total_batches: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<&WaveProgress> {
        if wave == 0 {
            return Err(TrackerError::invalid_argument(
                "wave",
                "wave numbers start at 1",
            ));
        }
        let record = WaveProgress {
            status: WaveStatus::InProgress,
            category,
            tasks: total_tasks,
            completed: 0,
            failed: 0,
            current_batch: total_batches.map(|_| 1),
            total_batches,
            started_at: Some(now),
            completed_at: None,
            duration_minutes: None,
        };
        let development = &mut self.development_phase;
        development.current_wave = wave;
        development.wave_progress.insert(wave.to_string(), record);
        info!(wave, %category, total_tasks, "Wave started");
        self.wave_progress(wave)
    }

    /// A wave's progress record.
    pub fn wave_progress(&self, wave: u32) -> Result<&WaveProgress> {
        self.development_phase
            .wave_progress
            .get(&wave.to_string())
            .ok_or_else(|| TrackerError::wave_not_found(wave))
    }

    fn wave_progress_mut(&mut self, wave: u32) -> Result<&mut WaveProgress> {
        self.development_phase
            .wave_progress
            .get_mut(&wave.to_string())
            .ok_or_else(|| TrackerError::wave_not_found(wave))
    }

    /// Add a finished batch's counts and advance the batch cursor.
    pub fn complete_batch(&mut self, wave: u32, completed: u32, failed: u32) -> Result<&WaveProgress> {
        let record = self.wave_progress_mut(wave)?;
        record.completed += completed;
        record.failed += failed;
        if let Some(batch) = record.current_batch.as_mut() {
            *batch += 1;
        }
        info!(wave, completed, failed, "Batch completed");
        Ok(record)
    }

    /// Close a wave and move development forward.
    ///
    /// The next wave becomes current unless this was the final wave, in
    /// which case development completes.
    pub fn complete_wave(&mut self, wave: u32) -> Result<&WaveProgress> {
        self.complete_wave_at(wave, Utc::now())
    }

    pub fn complete_wave_at(&mut self, wave: u32, now: DateTime<Utc>) -> Result<&WaveProgress> {
        let record = self.wave_progress_mut(wave)?;
        record.status = WaveStatus::Completed;
        record.completed_at = Some(now);
        if let Some(started) = record.started_at {
            let minutes = (now - started).num_milliseconds() as f64 / 60_000.0;
            record.duration_minutes = Some(round_tenths(minutes));
        }

        let development = &mut self.development_phase;
        development.completed_waves = wave;
        if wave < development.total_waves {
            development.current_wave = wave + 1;
            info!(wave, next = wave + 1, "Wave completed");
        } else {
            development.status = ProgressStatus::Completed;
            info!(wave, "Final wave completed, development finished");
        }
        self.wave_progress(wave)
    }

    /// Record a task as completed, removing it from the failed list.
    pub fn complete_task(&mut self, task_id: &str) {
        let development = &mut self.development_phase;
        if !development.completed_tasks.iter().any(|id| id == task_id) {
            development.completed_tasks.push(task_id.to_string());
        }
        development.failed_tasks.retain(|id| id != task_id);
    }

    /// Record a task as failed, removing it from the completed list.
    pub fn fail_task(&mut self, task_id: &str) {
        let development = &mut self.development_phase;
        if !development.failed_tasks.iter().any(|id| id == task_id) {
            development.failed_tasks.push(task_id.to_string());
        }
        development.completed_tasks.retain(|id| id != task_id);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Status name of a phase.
    #[must_use]
    pub fn phase_status(&self, phase: Phase) -> &'static str {
        match phase {
            Phase::Design => self.design_phase.status.as_str(),
            Phase::Decomposition => self.decomposition_phase.status.as_str(),
            Phase::Dependency => self.dependency_phase.status.as_str(),
            Phase::Development => self.development_phase.status.as_str(),
        }
    }

    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.development_phase.current_wave
    }

    #[must_use]
    pub fn completed_tasks(&self) -> &[String] {
        &self.development_phase.completed_tasks
    }

    #[must_use]
    pub fn failed_tasks(&self) -> &[String] {
        &self.development_phase.failed_tasks
    }

    /// Whether an interrupted development run can pick up again.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        self.development_phase.status == ProgressStatus::InProgress
            && self.development_phase.current_wave > 0
    }
}
