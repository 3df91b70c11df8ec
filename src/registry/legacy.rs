//! One-way import of the deprecated flat-map registry.
//!
//! The flat shape keys every task by ID under `tasks` and links them with
//! `children` lists instead of nesting. Importing rebuilds the forest through
//! the normal insertion path, so IDs are reassigned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use super::id::compare_task_ids;
use super::node::{Category, NewTask, TaskStatus};
use super::TaskRegistry;
use crate::error::{Result, TrackerError};

/// The deprecated flat registry document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyRegistry {
    #[serde(default)]
    pub tasks: BTreeMap<String, LegacyTask>,
}

/// A task in the flat registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Required on roots; children inherit their root's category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LegacyTask {
    fn to_new_task(&self) -> NewTask {
        NewTask {
            title: self.title.clone(),
            kind: self.kind.clone(),
            description: self.description.clone(),
            status: self.status,
            extra: self.extra.clone(),
        }
    }
}

struct Importer<'a> {
    legacy: &'a LegacyRegistry,
    registry: TaskRegistry,
    /// Old ID to (forest, new ID)
    placed: BTreeMap<&'a str, (Category, String)>,
}

impl<'a> Importer<'a> {
    /// Children in listed order, then tasks that name this parent but are
    /// missing from its list.
    fn children_of(&self, old_id: &str, task: &'a LegacyTask) -> Vec<&'a str> {
        let mut children: Vec<&'a str> = task.children.iter().map(String::as_str).collect();
        let mut unlisted: Vec<&'a str> = self
            .legacy
            .tasks
            .iter()
            .filter(|(id, t)| {
                t.parent_id.as_deref() == Some(old_id) && !task.children.contains(*id)
            })
            .map(|(id, _)| id.as_str())
            .collect();
        unlisted.sort_by(|a, b| compare_task_ids(a, b));
        children.extend(unlisted);
        children
    }

    fn import_subtree(&mut self, old_id: &'a str, new_parent: &str, category: Category) -> Result<()> {
        let Some(task) = self.legacy.tasks.get(old_id) else {
            warn!(task_id = old_id, "Skipping unknown child in legacy registry");
            return Ok(());
        };
        if self.placed.contains_key(old_id) {
            warn!(task_id = old_id, "Skipping task linked more than once in legacy registry");
            return Ok(());
        }
        if let Some(declared) = task.category.as_deref() {
            if declared.parse::<Category>().ok() != Some(category) {
                warn!(
                    task_id = old_id,
                    declared,
                    %category,
                    "Child category differs from its root; using the root's"
                );
            }
        }

        let new_id = self.registry.insert_child(new_parent, task.to_new_task())?;
        self.placed.insert(old_id, (category, new_id.clone()));
        for child in self.children_of(old_id, task) {
            self.import_subtree(child, &new_id, category)?;
        }
        Ok(())
    }
}

impl TaskRegistry {
    /// Build a tree registry from the flat shape.
    ///
    /// Roots are tasks that no other task lists as a child and whose
    /// `parent_id` is absent or unknown, visited in natural ID order.
    /// Returns the registry and the old-to-new ID mapping.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a root has no category or an unsupported one.
    pub fn import_legacy(legacy: &LegacyRegistry) -> Result<(Self, BTreeMap<String, String>)> {
        let listed: BTreeSet<&str> = legacy
            .tasks
            .values()
            .flat_map(|t| t.children.iter().map(String::as_str))
            .collect();
        let mut roots: Vec<&str> = legacy
            .tasks
            .iter()
            .filter(|(id, task)| {
                !listed.contains(id.as_str())
                    && task
                        .parent_id
                        .as_ref()
                        .is_none_or(|parent| !legacy.tasks.contains_key(parent))
            })
            .map(|(id, _)| id.as_str())
            .collect();
        roots.sort_by(|a, b| compare_task_ids(a, b));

        let mut importer = Importer {
            legacy,
            registry: TaskRegistry::new(),
            placed: BTreeMap::new(),
        };

        for old_id in roots {
            let task = &legacy.tasks[old_id];
            let category: Category = task
                .category
                .as_deref()
                .ok_or_else(|| {
                    TrackerError::invalid_argument(
                        "category",
                        format!("legacy root task {} has no category", old_id),
                    )
                })?
                .parse()?;
            let new_id = importer.registry.insert_root(category, task.to_new_task());
            importer.placed.insert(old_id, (category, new_id.clone()));
            for child in importer.children_of(old_id, task) {
                importer.import_subtree(child, &new_id, category)?;
            }
        }

        for old_id in legacy.tasks.keys() {
            if !importer.placed.contains_key(old_id.as_str()) {
                warn!(task_id = %old_id, "Dropping legacy task unreachable from any root");
            }
        }

        // Remap dependencies now that every task has its new ID.
        let Importer {
            registry: mut imported,
            placed,
            ..
        } = importer;
        for (old_id, (category, new_id)) in &placed {
            let task = &legacy.tasks[*old_id];
            let mut remapped = Vec::new();
            for dep in &task.dependencies {
                match placed.get(dep.as_str()) {
                    Some((_, target)) if !remapped.contains(target) => remapped.push(target.clone()),
                    Some(_) => {}
                    None => warn!(task_id = %old_id, dependency = %dep, "Dropping dangling legacy dependency"),
                }
            }
            if let Some(node) = imported.find_in_category_mut(*category, new_id) {
                node.dependencies = remapped;
            }
        }

        let mapping = placed
            .into_iter()
            .map(|(old, (_, new))| (old.to_string(), new))
            .collect();
        info!(tasks = legacy.tasks.len(), "Imported legacy registry");
        Ok((imported, mapping))
    }
}
