//! tasktree - hierarchical task registry and phase tracker
//!
//! Keeps a forest of frontend and backend tasks with dot-notation IDs,
//! their dependency edges and execution waves, and a separate record of
//! project phases and wave progress.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`registry`] - Task forests, ID assignment, dependencies, execution waves
//! - [`state`] - Phase tracker and wave progress counters
//! - [`project`] - Facade that changes both documents together
//! - [`storage`] - Whole-document JSON load/save under `.claude_tasks/`
//! - [`config`] - Tracker settings loaded from `config.json`
//! - [`error`] - Error type and exit codes
//! - [`testing`] - Sample registries and temporary workspaces
//!
//! # Example
//!
//! ```rust,ignore
//! use tasktree::{Category, NewTask, Project, ProjectStore};
//!
//! let store = ProjectStore::new(".");
//! let mut project = Project::open(&store)?;
//!
//! let page = project
//!     .registry
//!     .insert_root(Category::Frontend, NewTask::titled("Login Page"));
//! project
//!     .registry
//!     .insert_child(&page, NewTask::titled("Email Field"))?;
//!
//! project.save(&store)?;
//! ```

pub mod config;
pub mod error;
pub mod project;
pub mod registry;
pub mod state;
pub mod storage;
pub mod testing;

// Re-export commonly used types
pub use error::{Result, TrackerError};

pub use config::TrackerConfig;

// Re-export registry types
pub use registry::{
    Category, DependencyGraph, ExecutionOrderReport, NewTask, RegistryStatistics, TaskNode,
    TaskRegistry, TaskStatus, TaskUpdate, Wave, WaveCategory,
};

// Re-export state types
pub use state::{Phase, ProjectState};

// Re-export facade types
pub use project::{
    CompletionDetails, Dashboard, Decomposition, DecompositionRun, Project, ResumeStatus,
};

pub use storage::ProjectStore;

// TestFixture is only available in test builds
#[cfg(test)]
pub use testing::TestFixture;
