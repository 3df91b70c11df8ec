//! Hierarchical task registry.
//!
//! The registry document holds two forests of [`TaskNode`]s (frontend and
//! backend) plus metadata and the dependency-graph block.
//!
//! # Architecture
//!
//! ```text
//! TaskRegistry
//!   ├── frontend_tasks: Vec<TaskNode>      (roots "1", "2", ...)
//!   ├── backend_tasks: Vec<TaskNode>       (roots "1", "2", ...)
//!   ├── frontend_metadata / backend_metadata
//!   └── dependency_graph
//!         └── execution_order: Vec<Wave>
//!
//! TaskNode
//!   ├── id: "1.2.3"   (encodes the ancestor path)
//!   ├── dependencies: ["2.1", ...]   (cross references, not tree edges)
//!   └── subtasks: Vec<TaskNode>      (owned children)
//! ```
//!
//! IDs are unique within a forest. Lookups by bare ID search the frontend
//! forest first, then the backend forest, and return the first match.
//!
//! The operations are split by concern:
//! - [`tree`] - insertion, search, path, flatten, update
//! - [`graph`] - dependency edges and blocked/ready/integration queries
//! - [`execution`] - the wave list and its derivation and validation
//! - [`metadata`] - per-forest metadata and statistics
//! - [`legacy`] - one-way import of the flat-map registry shape

pub mod execution;
pub mod graph;
pub mod id;
pub mod legacy;
pub mod metadata;
pub mod node;
pub mod tree;

pub use execution::{DependencyGraph, ExecutionOrderReport, Wave, WaveCategory};
pub use legacy::{LegacyRegistry, LegacyTask};
pub use metadata::{
    BackendCounts, BackendMetadata, FrontendCounts, FrontendMetadata, RegistryStatistics,
};
pub use node::{Category, NewTask, TaskNode, TaskStatus, TaskUpdate};

use serde::{Deserialize, Serialize};

/// The task registry document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRegistry {
    #[serde(default)]
    frontend_tasks: Vec<TaskNode>,
    #[serde(default)]
    backend_tasks: Vec<TaskNode>,
    #[serde(default)]
    pub frontend_metadata: FrontendMetadata,
    #[serde(default)]
    pub backend_metadata: BackendMetadata,
    #[serde(default)]
    pub dependency_graph: DependencyGraph,
}

impl TaskRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Root nodes of one forest.
    #[must_use]
    pub fn roots(&self, category: Category) -> &[TaskNode] {
        match category {
            Category::Frontend => &self.frontend_tasks,
            Category::Backend => &self.backend_tasks,
        }
    }

    pub(crate) fn roots_mut(&mut self, category: Category) -> &mut Vec<TaskNode> {
        match category {
            Category::Frontend => &mut self.frontend_tasks,
            Category::Backend => &mut self.backend_tasks,
        }
    }

    /// Both forests in search order.
    pub(crate) fn forests(&self) -> [(Category, &[TaskNode]); 2] {
        [
            (Category::Frontend, self.frontend_tasks.as_slice()),
            (Category::Backend, self.backend_tasks.as_slice()),
        ]
    }

    /// Whether neither forest has any task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frontend_tasks.is_empty() && self.backend_tasks.is_empty()
    }
}
