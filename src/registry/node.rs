//! Task node types.
//!
//! This module contains the tree element and the value types around it:
//! - [`TaskNode`] - A node of the frontend or backend forest
//! - [`TaskStatus`] - Lifecycle status of a node
//! - [`Category`] - Which forest a node belongs to
//! - [`NewTask`] - Caller-supplied data for a node being inserted
//! - [`TaskUpdate`] - Field merge applied to an existing node

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{Result, TrackerError};

/// Keys owned by the tree itself; callers cannot set or change them.
///
/// `dependencies` is listed because edges change only through
/// [`TaskRegistry::add_dependency`](super::TaskRegistry::add_dependency) and
/// [`TaskRegistry::remove_dependency`](super::TaskRegistry::remove_dependency),
/// which check that both endpoints exist.
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "parent_id",
    "level",
    "category",
    "subtasks",
    "dependencies",
];

// ============================================================================
// Category
// ============================================================================

/// Which root forest a task lives in.
///
/// Inherited from the root and immutable down the subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// UI modules, pages, and components
    Frontend,
    /// Services, modules, and functions
    Backend,
}

impl Category {
    /// Both categories, in search order.
    pub const ALL: [Category; 2] = [Category::Frontend, Category::Backend];

    /// Lowercase name as stored in the documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Frontend => "frontend",
            Category::Backend => "backend",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "frontend" => Ok(Category::Frontend),
            "backend" => Ok(Category::Backend),
            other => Err(TrackerError::invalid_argument(
                "category",
                format!("'{}' is not one of frontend, backend", other),
            )),
        }
    }
}

// ============================================================================
// Task Status
// ============================================================================

/// Lifecycle status of a task node.
///
/// `Decomposed` is only ever entered as a side effect of a pending node
/// receiving its first child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet broken down or scheduled
    #[default]
    Pending,
    /// Has been split into subtasks
    Decomposed,
    /// Leaf work item that can be picked up
    Ready,
    /// Currently being worked on
    InProgress,
    /// Done
    Completed,
    /// Attempted and failed
    Failed,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::Decomposed,
        TaskStatus::Ready,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    /// Snake-case name as stored in the documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Decomposed => "decomposed",
            TaskStatus::Ready => "ready",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Completed or in progress: neither blocked nor awaiting integration.
    #[must_use]
    pub fn is_underway(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::InProgress)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| {
                TrackerError::invalid_argument("status", format!("'{}' is not a task status", s))
            })
    }
}

// ============================================================================
// Task Node
// ============================================================================

/// A node of the task forest.
///
/// The node owns its `subtasks`; `dependencies` are plain ID references
/// that are not part of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    /// Dot-notation ID, immutable
    pub id: String,
    /// Parent ID, absent for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Depth, 1 for roots
    pub level: u32,
    /// Forest this node belongs to
    pub category: Category,
    /// Lifecycle status
    #[serde(default)]
    pub status: TaskStatus,
    /// Human-readable title
    #[serde(default)]
    pub title: String,
    /// Kind of work item (module, page, component, service, function, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// IDs this node depends on, without duplicates
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Ordered children
    #[serde(default)]
    pub subtasks: Vec<TaskNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,
    /// Test coverage percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure description, set when the node fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Any other caller-supplied fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskNode {
    /// Build a node from caller data. Tree-owned fields come from the arguments.
    pub(crate) fn build(
        id: String,
        parent_id: Option<String>,
        level: u32,
        category: Category,
        data: NewTask,
    ) -> Self {
        let mut extra = data.extra;
        for key in RESERVED_FIELDS {
            if extra.remove(*key).is_some() {
                warn!("Ignoring reserved field '{}' supplied for task {}", key, id);
            }
        }

        Self {
            id,
            parent_id,
            level,
            category,
            status: data.status.unwrap_or_default(),
            title: data.title,
            kind: data.kind,
            description: data.description,
            dependencies: Vec::new(),
            subtasks: Vec::new(),
            implementation_file: None,
            test_file: None,
            test_coverage: None,
            duration_minutes: None,
            completed_at: None,
            error: None,
            extra,
        }
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.subtasks.is_empty()
    }

    /// Completion predicate used for integration readiness.
    ///
    /// A leaf is complete when its own status is `completed`. A branch is
    /// complete when every child recursively is; the branch's own status is
    /// not consulted.
    #[must_use]
    pub fn all_descendants_completed(&self) -> bool {
        if self.subtasks.is_empty() {
            return self.status == TaskStatus::Completed;
        }
        self.subtasks
            .iter()
            .all(TaskNode::all_descendants_completed)
    }

    /// IDs of every descendant (branches included) whose status is not
    /// `completed`, in pre-order.
    #[must_use]
    pub fn incomplete_descendants(&self) -> Vec<String> {
        self.walk()
            .skip(1)
            .filter(|node| node.status != TaskStatus::Completed)
            .map(|node| node.id.clone())
            .collect()
    }

    /// Pre-order iterator over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &TaskNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.subtasks.iter().rev());
            Some(node)
        })
    }

    /// Merge an update into this node.
    ///
    /// Validation happens before any field is touched, so a rejected
    /// update leaves the node unchanged.
    pub fn apply_update(&mut self, update: TaskUpdate, now: DateTime<Utc>) -> Result<()> {
        if let Some(key) = update
            .extra
            .keys()
            .find(|key| RESERVED_FIELDS.contains(&key.as_str()))
        {
            return Err(TrackerError::invalid_argument(
                key.clone(),
                format!("field is immutable on task {}", self.id),
            ));
        }

        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(file) = update.implementation_file {
            self.implementation_file = Some(file);
        }
        if let Some(file) = update.test_file {
            self.test_file = Some(file);
        }
        if let Some(coverage) = update.test_coverage {
            self.test_coverage = Some(coverage);
        }
        if let Some(minutes) = update.duration_minutes {
            self.duration_minutes = Some(minutes);
        }
        if update.clear_error {
            self.error = None;
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        match update.completed_at {
            Some(at) => self.completed_at = Some(at),
            None if update.status == Some(TaskStatus::Completed) => {
                self.completed_at = Some(now);
            }
            None => {}
        }
        self.extra.extend(update.extra);
        Ok(())
    }
}

// ============================================================================
// New Task
// ============================================================================

/// Caller-supplied data for a node being inserted.
///
/// Status defaults to `pending`. Tree-owned keys in `extra` are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewTask {
    /// Create task data with just a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the kind (`type` in the document).
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the initial status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an arbitrary extra field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Task Update
// ============================================================================

/// Fields merged into an existing node.
///
/// Setting `status` to `completed` without `completed_at` stamps the
/// current time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Remove a previously recorded error
    #[serde(default)]
    pub clear_error: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskUpdate {
    /// Update that only changes the status.
    ///
    /// Completing clears any earlier error.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            clear_error: status == TaskStatus::Completed,
            ..Self::default()
        }
    }

    /// Record a failure with its error text.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_implementation_file(mut self, file: impl Into<String>) -> Self {
        self.implementation_file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_test_file(mut self, file: impl Into<String>) -> Self {
        self.test_file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_test_coverage(mut self, coverage: f64) -> Self {
        self.test_coverage = Some(coverage);
        self
    }

    #[must_use]
    pub fn with_duration_minutes(mut self, minutes: f64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn leaf(id: &str, status: TaskStatus) -> TaskNode {
        let mut node = TaskNode::build(
            id.to_string(),
            None,
            1,
            Category::Frontend,
            NewTask::titled(id),
        );
        node.status = status;
        node
    }

    fn branch(id: &str, status: TaskStatus, children: Vec<TaskNode>) -> TaskNode {
        let mut node = leaf(id, status);
        node.subtasks = children;
        node
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("frontend".parse::<Category>().unwrap(), Category::Frontend);
        assert_eq!(" Backend ".parse::<Category>().unwrap(), Category::Backend);
        assert!(matches!(
            "mobile".parse::<Category>(),
            Err(TrackerError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!(
            "in_progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(
            "in-progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(TaskStatus::Decomposed.to_string(), "decomposed");
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_leaf_completion_uses_own_status() {
        assert!(leaf("1", TaskStatus::Completed).all_descendants_completed());
        assert!(!leaf("1", TaskStatus::Ready).all_descendants_completed());
    }

    #[test]
    fn test_branch_completion_ignores_own_status() {
        let node = branch(
            "1",
            TaskStatus::Decomposed,
            vec![
                branch(
                    "1.1",
                    TaskStatus::Decomposed,
                    vec![leaf("1.1.1", TaskStatus::Completed)],
                ),
                leaf("1.2", TaskStatus::Completed),
            ],
        );
        assert!(node.all_descendants_completed());
        // The strict walk still reports the unintegrated branch.
        assert_eq!(node.incomplete_descendants(), ["1.1"]);
    }

    #[test]
    fn test_incomplete_descendants_preorder() {
        let node = branch(
            "1",
            TaskStatus::Decomposed,
            vec![
                branch(
                    "1.1",
                    TaskStatus::Decomposed,
                    vec![
                        leaf("1.1.1", TaskStatus::Completed),
                        leaf("1.1.2", TaskStatus::InProgress),
                    ],
                ),
                leaf("1.2", TaskStatus::Failed),
            ],
        );
        assert!(!node.all_descendants_completed());
        assert_eq!(node.incomplete_descendants(), ["1.1", "1.1.2", "1.2"]);
    }

    #[test]
    fn test_is_leaf_means_no_children() {
        assert!(leaf("1.1", TaskStatus::Pending).is_leaf());
        assert!(!branch("1", TaskStatus::Decomposed, vec![leaf("1.1", TaskStatus::Pending)]).is_leaf());
    }

    #[test]
    fn test_walk_is_preorder() {
        let node = branch(
            "1",
            TaskStatus::Decomposed,
            vec![
                branch("1.1", TaskStatus::Pending, vec![leaf("1.1.1", TaskStatus::Ready)]),
                leaf("1.2", TaskStatus::Ready),
            ],
        );
        let ids: Vec<&str> = node.walk().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["1", "1.1", "1.1.1", "1.2"]);
    }

    #[test]
    fn test_build_drops_reserved_fields() {
        let data = NewTask::titled("Login")
            .with_field("id", json!("99"))
            .with_field("wireframe", json!("login.md"));
        let node = TaskNode::build("1.1".into(), Some("1".into()), 2, Category::Frontend, data);
        assert_eq!(node.id, "1.1");
        assert!(!node.extra.contains_key("id"));
        assert_eq!(node.extra["wireframe"], json!("login.md"));
    }

    #[test]
    fn test_completed_update_stamps_time() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut node = leaf("1", TaskStatus::InProgress);
        node.error = Some("flaky".into());

        node.apply_update(TaskUpdate::status(TaskStatus::Completed), now)
            .unwrap();

        assert_eq!(node.status, TaskStatus::Completed);
        assert_eq!(node.completed_at, Some(now));
        assert_eq!(node.error, None);
    }

    #[test]
    fn test_explicit_completed_at_wins() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2025, 2, 1, 8, 30, 0).unwrap();
        let mut node = leaf("1", TaskStatus::InProgress);

        node.apply_update(
            TaskUpdate::status(TaskStatus::Completed).with_completed_at(earlier),
            now,
        )
        .unwrap();

        assert_eq!(node.completed_at, Some(earlier));
    }

    #[test]
    fn test_update_rejects_immutable_fields_without_side_effects() {
        let now = Utc::now();
        let mut node = leaf("1", TaskStatus::Pending);
        let mut update = TaskUpdate::status(TaskStatus::Ready);
        update.extra.insert("level".into(), json!(4));

        let err = node.apply_update(update, now).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidArgument { .. }));
        assert_eq!(node.status, TaskStatus::Pending);
    }

    #[test]
    fn test_update_cannot_rewrite_dependencies() {
        let mut node = leaf("1", TaskStatus::Pending);
        let mut update = TaskUpdate::default();
        update.extra.insert("dependencies".into(), json!(["9"]));

        let err = node.apply_update(update, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("dependencies"));
        assert!(node.dependencies.is_empty());
    }

    #[test]
    fn test_node_document_shape() {
        let mut node = leaf("1", TaskStatus::Pending);
        node.kind = Some("module".into());
        node.extra.insert("wireframes".into(), json!(["auth.md"]));

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "module");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["category"], "frontend");
        assert_eq!(value["wireframes"], json!(["auth.md"]));
        assert!(value.get("parent_id").is_none());

        let back: TaskNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }
}
