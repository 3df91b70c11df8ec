//! Execution order: the wave list consumed by development tracking.
//!
//! The stored list is hand-set (usually from a dependency analysis) and can
//! drift from the tree. [`TaskRegistry::derive_execution_order`] recomputes
//! it from the dependency edges, and [`TaskRegistry::validate_execution_order`]
//! checks a candidate list against the registry.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

use super::id::compare_task_ids;
use super::node::{Category, TaskNode};
use super::TaskRegistry;
use crate::error::{Result, TrackerError};

/// Number of IDs quoted in a single report line.
const REPORT_ID_LIMIT: usize = 10;

/// Category label of a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveCategory {
    Frontend,
    Backend,
    /// Tasks from both forests, or unspecified
    #[default]
    Mixed,
}

impl From<Category> for WaveCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Frontend => WaveCategory::Frontend,
            Category::Backend => WaveCategory::Backend,
        }
    }
}

impl WaveCategory {
    /// The single forest a wave draws from, `None` for mixed waves.
    #[must_use]
    pub fn forest(self) -> Option<Category> {
        match self {
            WaveCategory::Frontend => Some(Category::Frontend),
            WaveCategory::Backend => Some(Category::Backend),
            WaveCategory::Mixed => None,
        }
    }
}

impl fmt::Display for WaveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaveCategory::Frontend => "frontend",
            WaveCategory::Backend => "backend",
            WaveCategory::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

/// One wave of the execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// 1-based wave number
    pub wave: u32,
    #[serde(default)]
    pub category: WaveCategory,
    /// Task IDs scheduled in this wave
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `dependency_graph` block of the registry document.
///
/// The same shape is produced by a dependency analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub frontend_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub backend_dependencies: BTreeMap<String, Vec<String>>,
    /// Frontend task ID to the backend task IDs it needs
    #[serde(default)]
    pub cross_stack_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub execution_order: Vec<Wave>,
}

/// Result of checking a candidate execution order.
///
/// Errors make the order unusable; warnings do not affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOrderReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ExecutionOrderReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// One-line human-readable verdict.
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.is_valid() {
            format!("Execution order is invalid with {} error(s).", self.errors.len())
        } else if self.warnings.is_empty() {
            "Execution order is valid.".to_string()
        } else {
            format!(
                "Execution order is valid with {} warning(s).",
                self.warnings.len()
            )
        }
    }
}

fn quote_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.sort_by(|a, b| compare_task_ids(a, b));
    let shown: Vec<&str> = ids.iter().take(REPORT_ID_LIMIT).copied().collect();
    if ids.len() > REPORT_ID_LIMIT {
        format!("{} (and {} more)", shown.join(", "), ids.len() - REPORT_ID_LIMIT)
    } else {
        shown.join(", ")
    }
}

// ============================================================================
// Stored order
// ============================================================================

impl TaskRegistry {
    /// Replace the stored wave list.
    pub fn set_execution_order(&mut self, waves: Vec<Wave>) {
        info!(waves = waves.len(), "Set execution order");
        self.dependency_graph.execution_order = waves;
    }

    /// The stored wave list.
    #[must_use]
    pub fn execution_order(&self) -> &[Wave] {
        &self.dependency_graph.execution_order
    }

    /// A stored wave by number.
    #[must_use]
    pub fn wave(&self, wave: u32) -> Option<&Wave> {
        self.execution_order().iter().find(|w| w.wave == wave)
    }

    /// Task IDs of a wave; empty when the wave is unknown.
    #[must_use]
    pub fn wave_tasks(&self, wave: u32) -> &[String] {
        self.wave(wave).map_or(&[], |w| w.tasks.as_slice())
    }

    /// Resolve a wave's task ID in the wave's own forest.
    ///
    /// Mixed waves fall back to the frontend-first lookup.
    #[must_use]
    pub fn find_wave_task(&self, category: WaveCategory, task_id: &str) -> Option<&TaskNode> {
        match category.forest() {
            Some(forest) => self.find_in_category(forest, task_id),
            None => self.find(task_id),
        }
    }

    /// Number of stored waves.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.execution_order().len()).unwrap_or(u32::MAX)
    }
}

// ============================================================================
// Derived order
// ============================================================================

impl TaskRegistry {
    /// Compute waves from the dependency edges.
    ///
    /// Nodes are layered with Kahn's algorithm over explicit dependencies and
    /// implicit child-before-parent edges. Each layer is split by forest,
    /// frontend first, so every wave is single-category and its bare IDs
    /// resolve unambiguously. Each part keeps pre-order and is chunked into
    /// waves of at most `max_wave_size` tasks. Dangling dependency IDs are
    /// ignored.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero wave size; `DependencyCycle` listing the
    /// tasks that could not be scheduled.
    pub fn derive_execution_order(&self, max_wave_size: usize) -> Result<Vec<Wave>> {
        if max_wave_size == 0 {
            return Err(TrackerError::invalid_argument(
                "max_wave_size",
                "must be at least 1",
            ));
        }

        let nodes = self.flatten(None, None);
        let index: HashMap<(Category, &str), usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| ((node.category, node.id.as_str()), i))
            .collect();

        // prerequisites[i]: nodes that must run before node i
        let mut prerequisites: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for dep in &node.dependencies {
                if let Some(target) = self.find(dep) {
                    prerequisites[i].insert(index[&(target.category, target.id.as_str())]);
                }
            }
            for child in &node.subtasks {
                prerequisites[i].insert(index[&(child.category, child.id.as_str())]);
            }
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, prereqs) in prerequisites.iter().enumerate() {
            for &p in prereqs {
                dependents[p].push(i);
            }
        }
        let mut remaining: Vec<usize> = prerequisites.iter().map(BTreeSet::len).collect();

        let mut layers: Vec<Vec<usize>> = Vec::new();
        let mut layer: Vec<usize> = (0..nodes.len()).filter(|&i| remaining[i] == 0).collect();
        let mut scheduled = 0;
        while !layer.is_empty() {
            scheduled += layer.len();
            let mut next = Vec::new();
            for &i in &layer {
                for &d in &dependents[i] {
                    remaining[d] -= 1;
                    if remaining[d] == 0 {
                        next.push(d);
                    }
                }
            }
            next.sort_unstable();
            layers.push(std::mem::replace(&mut layer, next));
        }

        if scheduled < nodes.len() {
            let task_ids = (0..nodes.len())
                .filter(|&i| remaining[i] > 0)
                .map(|i| nodes[i].id.clone())
                .collect();
            return Err(TrackerError::DependencyCycle { task_ids });
        }

        let mut waves = Vec::new();
        for (depth, layer) in layers.iter().enumerate() {
            for forest in Category::ALL {
                let members: Vec<&TaskNode> = layer
                    .iter()
                    .map(|&i| nodes[i])
                    .filter(|node| node.category == forest)
                    .collect();
                for chunk in members.chunks(max_wave_size) {
                    waves.push(build_wave(waves.len() + 1, depth + 1, forest, chunk));
                }
            }
        }
        debug!(
            layers = layers.len(),
            waves = waves.len(),
            "Derived execution order"
        );
        Ok(waves)
    }
}

fn build_wave(number: usize, layer: usize, forest: Category, members: &[&TaskNode]) -> Wave {
    let first = members[0];
    let level = members
        .iter()
        .all(|n| n.level == first.level)
        .then_some(first.level);
    Wave {
        wave: u32::try_from(number).unwrap_or(u32::MAX),
        category: WaveCategory::from(forest),
        tasks: members.iter().map(|n| n.id.clone()).collect(),
        level,
        description: Some(format!("Dependency layer {}", layer)),
    }
}

// ============================================================================
// Validation
// ============================================================================

impl TaskRegistry {
    /// Check a candidate graph's execution order against this registry.
    ///
    /// Errors: wave numbers not exactly `1..=n`, a non-final wave smaller
    /// than `min_wave_size`, any wave larger than `max_wave_size`, registry
    /// tasks missing from every wave, scheduled IDs unknown to the registry,
    /// cross-stack endpoints unknown to the registry.
    ///
    /// Warnings: a task scheduled more than once, a task scheduled no later
    /// than one of its dependencies.
    #[must_use]
    pub fn validate_execution_order(
        &self,
        graph: &DependencyGraph,
        min_wave_size: usize,
        max_wave_size: usize,
    ) -> ExecutionOrderReport {
        let mut report = ExecutionOrderReport::new();
        let waves = &graph.execution_order;

        if waves.is_empty() {
            report.errors.push("Execution order has no waves".to_string());
        }

        let final_wave = waves.iter().map(|w| w.wave).max().unwrap_or(0);
        let mut placement: HashMap<&str, u32> = HashMap::new();
        let mut repeated: BTreeSet<&str> = BTreeSet::new();
        for wave in waves {
            let count = wave.tasks.len();
            if count < min_wave_size && wave.wave != final_wave {
                report.errors.push(format!(
                    "Wave {} has only {} tasks (should be {}-{})",
                    wave.wave, count, min_wave_size, max_wave_size
                ));
            } else if count > max_wave_size {
                report.errors.push(format!(
                    "Wave {} has {} tasks (should be {}-{})",
                    wave.wave, count, min_wave_size, max_wave_size
                ));
            }
            for task in &wave.tasks {
                if placement.insert(task.as_str(), wave.wave).is_some() {
                    repeated.insert(task.as_str());
                }
            }
        }

        let mut numbers: Vec<u32> = waves.iter().map(|w| w.wave).collect();
        numbers.sort_unstable();
        let expected: Vec<u32> = (1..=u32::try_from(waves.len()).unwrap_or(u32::MAX)).collect();
        if numbers != expected {
            report.errors.push(format!(
                "Wave numbers not sequential: {:?} (expected 1..={})",
                numbers,
                waves.len()
            ));
        }

        let known: BTreeSet<&str> = self
            .flatten(None, None)
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        let missing: Vec<&str> = known
            .iter()
            .copied()
            .filter(|id| !placement.contains_key(id))
            .collect();
        if !missing.is_empty() {
            report.errors.push(format!(
                "Tasks in registry but not in execution order: {}",
                quote_ids(missing)
            ));
        }
        let unknown: Vec<&str> = placement
            .keys()
            .copied()
            .filter(|id| !known.contains(id))
            .collect();
        if !unknown.is_empty() {
            report.errors.push(format!(
                "Tasks in execution order but not in registry: {}",
                quote_ids(unknown)
            ));
        }

        for (task_id, deps) in &graph.cross_stack_dependencies {
            if !known.contains(task_id.as_str()) {
                report
                    .errors
                    .push(format!("Dependency source task not found: {}", task_id));
            }
            for dep in deps {
                if !known.contains(dep.as_str()) {
                    report
                        .errors
                        .push(format!("Dependency target task not found: {}", dep));
                }
            }
        }

        if !repeated.is_empty() {
            report.warnings.push(format!(
                "Tasks scheduled in more than one wave: {}",
                quote_ids(repeated)
            ));
        }

        let stored_edges = self
            .flatten(None, None)
            .into_iter()
            .flat_map(|n| n.dependencies.iter().map(move |d| (&n.id, d)));
        let analysis_edges = graph
            .cross_stack_dependencies
            .iter()
            .flat_map(|(task, deps)| deps.iter().map(move |d| (task, d)));
        let mut seen = BTreeSet::new();
        for (task, dep) in stored_edges.chain(analysis_edges) {
            if !seen.insert((task, dep)) {
                continue;
            }
            if let (Some(&at), Some(&dep_at)) =
                (placement.get(task.as_str()), placement.get(dep.as_str()))
            {
                if at <= dep_at {
                    report.warnings.push(format!(
                        "Task {} (wave {}) is not scheduled after its dependency {} (wave {})",
                        task, at, dep, dep_at
                    ));
                }
            }
        }

        debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated execution order"
        );
        report
    }
}
