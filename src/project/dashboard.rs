//! Project status dashboard.
//!
//! [`Dashboard`] is the machine-readable snapshot; [`Dashboard::render`]
//! formats it for a terminal.

use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::{Project, ResumeStatus};
use crate::registry::{RegistryStatistics, TaskStatus};
use crate::state::Phase;

const RULE_WIDTH: usize = 60;

/// Status name of each phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub design: String,
    pub decomposition: String,
    pub dependency: String,
    pub development: String,
}

impl PhaseSummary {
    fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("Design", &self.design),
            ("Decomposition", &self.decomposition),
            ("Dependency", &self.dependency),
            ("Development", &self.development),
        ]
    }
}

/// Wave counters of the development phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentSummary {
    pub current_wave: u32,
    pub completed_waves: u32,
    pub total_waves: u32,
    pub workers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub phases: PhaseSummary,
    pub development: DevelopmentSummary,
    pub tasks: RegistryStatistics,
    pub resume: ResumeStatus,
}

impl Project {
    /// Snapshot of phases, wave counters, registry statistics, and resume
    /// status.
    #[must_use]
    pub fn dashboard(&self) -> Dashboard {
        let state = &self.state;
        let development = &state.development_phase;
        Dashboard {
            phases: PhaseSummary {
                design: state.phase_status(Phase::Design).to_string(),
                decomposition: state.phase_status(Phase::Decomposition).to_string(),
                dependency: state.phase_status(Phase::Dependency).to_string(),
                development: state.phase_status(Phase::Development).to_string(),
            },
            development: DevelopmentSummary {
                current_wave: development.current_wave,
                completed_waves: development.completed_waves,
                total_waves: development.total_waves,
                workers: development.workers,
            },
            tasks: self.registry.statistics(),
            resume: self.resume_status(),
        }
    }
}

impl Dashboard {
    /// Multi-line colored summary.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{}", rule)?;
        writeln!(f, "{}", "PROJECT STATUS DASHBOARD".cyan().bold())?;
        writeln!(f, "{}", rule)?;

        writeln!(f, "\n{}", "Phases:".bold())?;
        for (name, status) in self.phases.entries() {
            writeln!(f, "  {}: {}", name, paint_phase(status))?;
        }

        let dev = &self.development;
        writeln!(f, "\n{}", "Development:".bold())?;
        writeln!(f, "  Wave: {}/{}", dev.current_wave, dev.total_waves)?;
        writeln!(f, "  Completed waves: {}", dev.completed_waves)?;
        writeln!(f, "  Workers: {}", dev.workers)?;

        let tasks = &self.tasks;
        writeln!(f, "\n{}", "Tasks:".bold())?;
        writeln!(f, "  Total: {}", tasks.total_tasks)?;
        for (status, count) in &tasks.by_status {
            writeln!(f, "    {}: {}", paint_task_status(status), count)?;
        }

        writeln!(f, "\n{}", "Structure:".bold())?;
        writeln!(
            f,
            "  Frontend: {} components, {} pages",
            tasks.frontend_metadata.total_components, tasks.frontend_metadata.total_pages
        )?;
        writeln!(
            f,
            "  Backend: {} functions, {} services",
            tasks.backend_metadata.total_functions, tasks.backend_metadata.total_services
        )?;

        let resume = &self.resume;
        if resume.can_resume {
            writeln!(f, "\n{} {}", "Resume:".bold(), "can resume".green())?;
            writeln!(f, "  Current wave: {}", resume.current_wave)?;
            writeln!(f, "  Pending tasks: {}", resume.pending_in_current_wave)?;
        } else {
            writeln!(f, "\n{} {}", "Resume:".bold(), "cannot resume".red())?;
            if let Some(reason) = &resume.reason {
                writeln!(f, "  Reason: {}", reason)?;
            }
        }

        write!(f, "\n{}", rule)
    }
}

fn paint_phase(status: &str) -> String {
    match status {
        "completed" => status.green().to_string(),
        "in_progress" => status.yellow().to_string(),
        _ => status.dimmed().to_string(),
    }
}

fn paint_task_status(status: &str) -> String {
    match status.parse::<TaskStatus>() {
        Ok(TaskStatus::Completed) => status.green().to_string(),
        Ok(TaskStatus::Failed) => status.red().to_string(),
        _ => status.to_string(),
    }
}
