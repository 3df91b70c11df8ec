//! Phase records of the state document and their status enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TrackerError};
use crate::registry::WaveCategory;

/// Generates `as_str` and `Display` for a snake_case status enum.
macro_rules! status_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Snake-case name as stored in the state document.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============================================================================
// Status enums
// ============================================================================

/// `not_started -> user_flows_completed -> completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignStatus {
    #[default]
    NotStarted,
    UserFlowsCompleted,
    Completed,
}

status_names!(DesignStatus {
    NotStarted => "not_started",
    UserFlowsCompleted => "user_flows_completed",
    Completed => "completed",
});

/// `not_started -> in_progress -> completed`, used by decomposition and
/// development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

status_names!(ProgressStatus {
    NotStarted => "not_started",
    InProgress => "in_progress",
    Completed => "completed",
});

/// Single-shot `not_started -> completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    #[default]
    NotStarted,
    Completed,
}

status_names!(DependencyStatus {
    NotStarted => "not_started",
    Completed => "completed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveStatus {
    #[default]
    InProgress,
    Completed,
}

status_names!(WaveStatus {
    InProgress => "in_progress",
    Completed => "completed",
});

/// The four tracked phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Design,
    Decomposition,
    Dependency,
    Development,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Design,
        Phase::Decomposition,
        Phase::Dependency,
        Phase::Development,
    ];
}

status_names!(Phase {
    Design => "design",
    Decomposition => "decomposition",
    Dependency => "dependency",
    Development => "development",
});

impl FromStr for Phase {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        let wanted = wanted.strip_suffix("_phase").unwrap_or(&wanted);
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == wanted)
            .ok_or_else(|| {
                TrackerError::invalid_argument(
                    "phase",
                    format!(
                        "'{}' is not one of design, decomposition, dependency, development",
                        s
                    ),
                )
            })
    }
}

// ============================================================================
// Design
// ============================================================================

fn not_started() -> String {
    "not_started".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignPhase {
    #[serde(default)]
    pub status: DesignStatus,
    #[serde(default)]
    pub user_flows_file: Option<String>,
    #[serde(default)]
    pub wireframes_generated: bool,
    #[serde(default)]
    pub wireframes_count: u32,
    /// Free-form verdict of the wireframe validation (`passed`, `failed`, ...)
    #[serde(default = "not_started")]
    pub validation_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wireframes_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_report: Option<String>,
}

impl Default for DesignPhase {
    fn default() -> Self {
        Self {
            status: DesignStatus::NotStarted,
            user_flows_file: None,
            wireframes_generated: false,
            wireframes_count: 0,
            validation_status: not_started(),
            wireframes_directory: None,
            validation_report: None,
        }
    }
}

// ============================================================================
// Decomposition
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendProgress {
    #[serde(default)]
    pub total_modules: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_components: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed_module: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendProgress {
    #[serde(default)]
    pub total_modules: u32,
    #[serde(default)]
    pub total_services: u32,
    #[serde(default)]
    pub total_functions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed_module: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionProgress {
    #[serde(default)]
    pub frontend: FrontendProgress,
    #[serde(default)]
    pub backend: BackendProgress,
}

/// Decomposition runs per stack; the overall status completes only when
/// both stacks have.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionPhase {
    #[serde(default)]
    pub status: ProgressStatus,
    #[serde(default)]
    pub frontend_status: ProgressStatus,
    #[serde(default)]
    pub backend_status: ProgressStatus,
    #[serde(default)]
    pub last_checkpoint: Option<String>,
    #[serde(default)]
    pub progress: DecompositionProgress,
}

// ============================================================================
// Dependency analysis
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyPhase {
    #[serde(default)]
    pub status: DependencyStatus,
    #[serde(default)]
    pub total_waves: u32,
    #[serde(default)]
    pub frontend_internal_dependencies: bool,
    #[serde(default)]
    pub backend_internal_dependencies: bool,
    #[serde(default)]
    pub cross_stack_dependencies: bool,
    #[serde(default)]
    pub execution_order_generated: bool,
}

/// Which dependency classes an analysis covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedDependencies {
    pub frontend_internal: bool,
    pub backend_internal: bool,
    pub cross_stack: bool,
    pub execution_order: bool,
}

impl AnalyzedDependencies {
    /// Every class analyzed.
    #[must_use]
    pub fn all() -> Self {
        Self {
            frontend_internal: true,
            backend_internal: true,
            cross_stack: true,
            execution_order: true,
        }
    }
}

impl Default for AnalyzedDependencies {
    fn default() -> Self {
        Self::all()
    }
}

// ============================================================================
// Development
// ============================================================================

fn default_workers() -> u32 {
    5
}

/// Aggregate counters of one wave.
///
/// Independent of the registry's per-node statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveProgress {
    #[serde(default)]
    pub status: WaveStatus,
    #[serde(default)]
    pub category: WaveCategory,
    /// Number of tasks in the wave
    #[serde(default)]
    pub tasks: u32,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub failed: u32,
    /// Batch cursor, present only when batches were declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_batch: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_batches: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentPhase {
    #[serde(default)]
    pub status: ProgressStatus,
    #[serde(default)]
    pub current_wave: u32,
    /// Number of the last completed wave
    #[serde(default)]
    pub completed_waves: u32,
    #[serde(default)]
    pub total_waves: u32,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    #[serde(default)]
    pub failed_tasks: Vec<String>,
    #[serde(default = "default_workers")]
    pub workers: u32,
    /// Keyed by wave number
    #[serde(default)]
    pub wave_progress: BTreeMap<String, WaveProgress>,
}

impl Default for DevelopmentPhase {
    fn default() -> Self {
        Self {
            status: ProgressStatus::NotStarted,
            current_wave: 0,
            completed_waves: 0,
            total_waves: 0,
            completed_tasks: Vec::new(),
            failed_tasks: Vec::new(),
            workers: default_workers(),
            wave_progress: BTreeMap::new(),
        }
    }
}
