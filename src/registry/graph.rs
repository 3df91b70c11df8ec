//! Dependency edges layered over the task forest.
//!
//! Edges live on the dependent node's `dependencies` list and are resolved
//! through [`TaskRegistry::find`], so they cross forests freely. Cycles are
//! not checked here; [`TaskRegistry::derive_execution_order`] reports them.

use tracing::{debug, info};

use super::id::validate_task_id;
use super::node::{Category, TaskNode, TaskStatus};
use super::TaskRegistry;
use crate::error::{Result, TrackerError};

impl TaskRegistry {
    /// Record that `task_id` depends on `depends_on_id`.
    ///
    /// Adding an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if either ID is malformed; `NotFound` if either
    /// endpoint is missing. The task is checked first.
    pub fn add_dependency(&mut self, task_id: &str, depends_on_id: &str) -> Result<()> {
        validate_task_id(task_id)?;
        validate_task_id(depends_on_id)?;
        if self.find(task_id).is_none() {
            return Err(TrackerError::task_not_found(task_id));
        }
        if self.find(depends_on_id).is_none() {
            return Err(TrackerError::NotFound {
                kind: "Dependency task",
                id: depends_on_id.to_string(),
            });
        }

        let node = self
            .find_mut(task_id)
            .ok_or_else(|| TrackerError::task_not_found(task_id))?;
        if node.dependencies.iter().any(|dep| dep == depends_on_id) {
            debug!(task_id, depends_on_id, "Dependency already recorded");
            return Ok(());
        }
        node.dependencies.push(depends_on_id.to_string());
        info!(task_id, depends_on_id, "Added dependency");
        Ok(())
    }

    /// Remove an edge. Returns whether anything was removed.
    pub fn remove_dependency(&mut self, task_id: &str, depends_on_id: &str) -> bool {
        let Some(node) = self.find_mut(task_id) else {
            return false;
        };
        let before = node.dependencies.len();
        node.dependencies.retain(|dep| dep != depends_on_id);
        let removed = node.dependencies.len() != before;
        if removed {
            info!(task_id, depends_on_id, "Removed dependency");
        }
        removed
    }

    /// Nodes `task_id` depends on. Dangling IDs are skipped.
    pub fn dependencies_of(&self, task_id: &str) -> Result<Vec<&TaskNode>> {
        let node = self.get(task_id)?;
        Ok(self.resolve(&node.dependencies))
    }

    fn resolve<'a>(&'a self, ids: &[String]) -> Vec<&'a TaskNode> {
        ids.iter().filter_map(|id| self.find(id)).collect()
    }

    /// Nodes whose dependency list contains `task_id`.
    #[must_use]
    pub fn dependents_of(&self, task_id: &str) -> Vec<&TaskNode> {
        self.flatten(None, None)
            .into_iter()
            .filter(|task| task.dependencies.iter().any(|dep| dep == task_id))
            .collect()
    }

    /// Nodes waiting on at least one dependency that is not completed.
    ///
    /// Completed and in-progress nodes are never blocked.
    #[must_use]
    pub fn blocked_tasks(&self) -> Vec<&TaskNode> {
        self.flatten(None, None)
            .into_iter()
            .filter(|task| !task.status.is_underway())
            .filter(|task| {
                self.resolve(&task.dependencies)
                    .iter()
                    .any(|dep| dep.status != TaskStatus::Completed)
            })
            .collect()
    }

    /// `ready` nodes whose dependencies are all completed.
    #[must_use]
    pub fn ready_tasks(&self) -> Vec<&TaskNode> {
        self.flatten(None, None)
            .into_iter()
            .filter(|task| task.status == TaskStatus::Ready)
            .filter(|task| {
                self.resolve(&task.dependencies)
                    .iter()
                    .all(|dep| dep.status == TaskStatus::Completed)
            })
            .collect()
    }

    /// Level-1 or level-2 branches whose whole subtree is done.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for any level other than 1 or 2.
    pub fn integration_ready(
        &self,
        level: u32,
        category: Option<Category>,
    ) -> Result<Vec<&TaskNode>> {
        if !matches!(level, 1 | 2) {
            return Err(TrackerError::invalid_argument(
                "level",
                format!("integration applies to levels 1 and 2, got {}", level),
            ));
        }
        Ok(self
            .tasks_by_level(level, category)
            .into_iter()
            .filter(|task| !task.status.is_underway())
            .filter(|task| !task.is_leaf() && task.all_descendants_completed())
            .collect())
    }
}
