//! Tree Store operations: insertion, search, path, flatten, update.
//!
//! Every lookup is a depth-first pre-order walk, frontend forest first.
//! Expected trees hold tens to low hundreds of nodes, so there is no index.

use chrono::Utc;
use tracing::{debug, info};

use super::id::{assign_task_id, validate_task_id};
use super::node::{Category, NewTask, TaskNode, TaskStatus, TaskUpdate};
use super::TaskRegistry;
use crate::error::{Result, TrackerError};

fn find_in<'a>(nodes: &'a [TaskNode], task_id: &str) -> Option<&'a TaskNode> {
    for node in nodes {
        if node.id == task_id {
            return Some(node);
        }
        if let Some(found) = find_in(&node.subtasks, task_id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(nodes: &'a mut [TaskNode], task_id: &str) -> Option<&'a mut TaskNode> {
    for node in nodes.iter_mut() {
        if node.id == task_id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.subtasks, task_id) {
            return Some(found);
        }
    }
    None
}

fn path_in<'a>(nodes: &'a [TaskNode], task_id: &str, trail: &mut Vec<&'a TaskNode>) -> bool {
    for node in nodes {
        trail.push(node);
        if node.id == task_id || path_in(&node.subtasks, task_id, trail) {
            return true;
        }
        trail.pop();
    }
    false
}

fn collect<'a>(
    nodes: &'a [TaskNode],
    level: Option<u32>,
    category: Option<Category>,
    out: &mut Vec<&'a TaskNode>,
) {
    for node in nodes {
        let level_ok = level.is_none_or(|l| node.level == l);
        let category_ok = category.is_none_or(|c| node.category == c);
        if level_ok && category_ok {
            out.push(node);
        }
        // Filters never prune: a filtered-out parent can have matching children.
        collect(&node.subtasks, level, category, out);
    }
}

impl TaskRegistry {
    /// Append a new level-1 task to a forest and return its ID.
    pub fn insert_root(&mut self, category: Category, data: NewTask) -> String {
        let roots = self.roots_mut(category);
        let task_id = assign_task_id(None, roots.len());
        roots.push(TaskNode::build(task_id.clone(), None, 1, category, data));
        info!(task_id = %task_id, %category, "Added root task");
        task_id
    }

    /// Append a child to an existing task and return the child's ID.
    ///
    /// The child inherits the parent's category and sits one level deeper.
    /// A `pending` parent becomes `decomposed`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent does not exist in either forest.
    pub fn insert_child(&mut self, parent_id: &str, data: NewTask) -> Result<String> {
        self.insert_child_in(None, parent_id, data)
    }

    /// [`insert_child`](Self::insert_child) with the parent looked up in one
    /// forest, or frontend-first when `category` is `None`.
    pub fn insert_child_in(
        &mut self,
        category: Option<Category>,
        parent_id: &str,
        data: NewTask,
    ) -> Result<String> {
        validate_task_id(parent_id)?;
        let parent = match category {
            Some(category) => self.find_in_category_mut(category, parent_id),
            None => self.find_mut(parent_id),
        }
        .ok_or_else(|| TrackerError::parent_not_found(parent_id))?;

        let task_id = assign_task_id(Some(&parent.id), parent.subtasks.len());
        let child = TaskNode::build(
            task_id.clone(),
            Some(parent.id.clone()),
            parent.level + 1,
            parent.category,
            data,
        );
        parent.subtasks.push(child);

        if parent.status == TaskStatus::Pending {
            parent.status = TaskStatus::Decomposed;
            debug!(parent_id, "Parent status pending -> decomposed");
        }

        info!(task_id = %task_id, parent_id, "Added subtask");
        Ok(task_id)
    }

    /// Insert children one at a time in the given order.
    ///
    /// IDs follow the cumulative sibling count, so input order alone
    /// determines the assigned IDs.
    pub fn insert_children(
        &mut self,
        parent_id: &str,
        children: impl IntoIterator<Item = NewTask>,
    ) -> Result<Vec<String>> {
        self.insert_children_in(None, parent_id, children)
    }

    pub fn insert_children_in(
        &mut self,
        category: Option<Category>,
        parent_id: &str,
        children: impl IntoIterator<Item = NewTask>,
    ) -> Result<Vec<String>> {
        validate_task_id(parent_id)?;
        let exists = match category {
            Some(category) => self.find_in_category(category, parent_id).is_some(),
            None => self.find(parent_id).is_some(),
        };
        if !exists {
            return Err(TrackerError::parent_not_found(parent_id));
        }
        children
            .into_iter()
            .map(|data| self.insert_child_in(category, parent_id, data))
            .collect()
    }

    /// Find a task by ID, frontend forest first.
    #[must_use]
    pub fn find(&self, task_id: &str) -> Option<&TaskNode> {
        self.forests()
            .into_iter()
            .find_map(|(_, roots)| find_in(roots, task_id))
    }

    /// Find a task by ID within one forest.
    #[must_use]
    pub fn find_in_category(&self, category: Category, task_id: &str) -> Option<&TaskNode> {
        find_in(self.roots(category), task_id)
    }

    pub(crate) fn find_mut(&mut self, task_id: &str) -> Option<&mut TaskNode> {
        if self.find_in_category(Category::Frontend, task_id).is_some() {
            return find_in_mut(self.roots_mut(Category::Frontend), task_id);
        }
        find_in_mut(self.roots_mut(Category::Backend), task_id)
    }

    pub(crate) fn find_in_category_mut(
        &mut self,
        category: Category,
        task_id: &str,
    ) -> Option<&mut TaskNode> {
        find_in_mut(self.roots_mut(category), task_id)
    }

    /// Find a task by ID or fail with `NotFound`.
    ///
    /// Malformed IDs fail with `InvalidArgument` before any search.
    pub fn get(&self, task_id: &str) -> Result<&TaskNode> {
        self.get_in(None, task_id)
    }

    /// [`get`](Self::get) within one forest, or frontend-first when
    /// `category` is `None`.
    pub fn get_in(&self, category: Option<Category>, task_id: &str) -> Result<&TaskNode> {
        validate_task_id(task_id)?;
        match category {
            Some(category) => self.find_in_category(category, task_id),
            None => self.find(task_id),
        }
        .ok_or_else(|| TrackerError::task_not_found(task_id))
    }

    /// Ancestor chain from root to the task itself.
    #[must_use]
    pub fn path(&self, task_id: &str) -> Option<Vec<&TaskNode>> {
        for (_, roots) in self.forests() {
            let mut trail = Vec::new();
            if path_in(roots, task_id, &mut trail) {
                return Some(trail);
            }
        }
        None
    }

    /// Pre-order list of every task matching the optional filters.
    #[must_use]
    pub fn flatten(&self, level: Option<u32>, category: Option<Category>) -> Vec<&TaskNode> {
        let mut out = Vec::new();
        for (forest, roots) in self.forests() {
            if category.is_some_and(|c| c != forest) {
                continue;
            }
            collect(roots, level, category, &mut out);
        }
        debug!(count = out.len(), ?level, ?category, "Flattened task forest");
        out
    }

    /// Tasks with a given status.
    #[must_use]
    pub fn tasks_by_status(
        &self,
        status: TaskStatus,
        category: Option<Category>,
    ) -> Vec<&TaskNode> {
        self.flatten(None, category)
            .into_iter()
            .filter(|task| task.status == status)
            .collect()
    }

    /// Tasks at a given depth.
    #[must_use]
    pub fn tasks_by_level(&self, level: u32, category: Option<Category>) -> Vec<&TaskNode> {
        self.flatten(Some(level), category)
    }

    /// Merge fields into a task.
    ///
    /// # Errors
    ///
    /// `NotFound` if the task does not exist; `InvalidArgument` for a
    /// malformed ID or an update that touches a tree-owned field.
    pub fn update(&mut self, task_id: &str, update: TaskUpdate) -> Result<&TaskNode> {
        self.update_in(None, task_id, update)
    }

    /// [`update`](Self::update) within one forest, or frontend-first when
    /// `category` is `None`.
    pub fn update_in(
        &mut self,
        category: Option<Category>,
        task_id: &str,
        update: TaskUpdate,
    ) -> Result<&TaskNode> {
        validate_task_id(task_id)?;
        let node = match category {
            Some(category) => self.find_in_category_mut(category, task_id),
            None => self.find_mut(task_id),
        }
        .ok_or_else(|| TrackerError::task_not_found(task_id))?;
        let status = update.status;
        node.apply_update(update, Utc::now())?;
        if let Some(status) = status {
            info!(task_id, %status, "Updated task status");
        }
        Ok(node)
    }

    /// Set a task's status, clearing any earlier error when completing.
    pub fn update_task_status(&mut self, task_id: &str, status: TaskStatus) -> Result<&TaskNode> {
        self.update(task_id, TaskUpdate::status(status))
    }
}
