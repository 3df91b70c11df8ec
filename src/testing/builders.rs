//! Sample registries shared by unit tests, integration tests, and benches.

use crate::registry::{Category, NewTask, TaskRegistry, Wave, WaveCategory};

/// Frontend forest used throughout the tests:
///
/// ```text
/// 1   Auth
/// 1.1   Login Page
/// 1.1.1   Email Field
/// 1.1.2   Password Field
/// 1.1.3   Submit Button
/// 2   Dashboard
/// 2.1   Overview
/// ```
#[must_use]
pub fn login_feature() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    populate_login_feature(&mut registry);
    registry
}

fn populate_login_feature(registry: &mut TaskRegistry) {
    let auth = registry.insert_root(Category::Frontend, NewTask::titled("Auth").with_kind("module"));
    // Parents exist at this point, so inserts cannot fail.
    if let Ok(page) = registry.insert_child(&auth, NewTask::titled("Login Page").with_kind("page")) {
        let _ = registry.insert_children(
            &page,
            ["Email Field", "Password Field", "Submit Button"]
                .into_iter()
                .map(|title| NewTask::titled(title).with_kind("component")),
        );
    }
    let dashboard = registry.insert_root(
        Category::Frontend,
        NewTask::titled("Dashboard").with_kind("module"),
    );
    let _ = registry.insert_child(&dashboard, NewTask::titled("Overview").with_kind("page"));
}

/// [`login_feature`] plus a backend forest:
///
/// ```text
/// 1   Auth Service
/// 1.1   login
/// 1.2   refresh_token
/// ```
#[must_use]
pub fn full_stack() -> TaskRegistry {
    let mut registry = login_feature();
    registry.init_frontend_metadata("React", None);
    registry.init_backend_metadata("FastAPI", "PostgreSQL", None);
    let service = registry.insert_root(
        Category::Backend,
        NewTask::titled("Auth Service").with_kind("service"),
    );
    let _ = registry.insert_children_in(
        Some(Category::Backend),
        &service,
        ["login", "refresh_token"]
            .into_iter()
            .map(|title| NewTask::titled(title).with_kind("function")),
    );
    registry
}

/// A uniform forest: `roots` roots, each node with `fanout` children, down
/// to `depth` levels.
#[must_use]
pub fn generated_forest(category: Category, roots: usize, fanout: usize, depth: u32) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    let mut frontier: Vec<String> = (0..roots)
        .map(|n| registry.insert_root(category, NewTask::titled(format!("root {}", n + 1))))
        .collect();
    for _ in 1..depth {
        let mut next = Vec::with_capacity(frontier.len() * fanout);
        for parent in &frontier {
            for n in 0..fanout {
                if let Ok(id) = registry.insert_child_in(
                    Some(category),
                    parent,
                    NewTask::titled(format!("{} / {}", parent, n + 1)),
                ) {
                    next.push(id);
                }
            }
        }
        frontier = next;
    }
    registry
}

/// A mixed-category wave with the given task IDs.
#[must_use]
pub fn wave(number: u32, tasks: &[&str]) -> Wave {
    Wave {
        wave: number,
        category: WaveCategory::Mixed,
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
        level: None,
        description: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_feature_shape() {
        let registry = login_feature();
        let ids: Vec<&str> = registry
            .flatten(None, None)
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, ["1", "1.1", "1.1.1", "1.1.2", "1.1.3", "2", "2.1"]);
    }

    #[test]
    fn test_full_stack_has_backend() {
        let registry = full_stack();
        assert_eq!(registry.flatten(None, Some(Category::Backend)).len(), 3);
        assert_eq!(registry.backend_metadata.database.as_deref(), Some("PostgreSQL"));
    }

    #[test]
    fn test_generated_forest_size() {
        let registry = generated_forest(Category::Backend, 3, 4, 3);
        // 3 + 3*4 + 3*4*4
        assert_eq!(registry.flatten(None, None).len(), 63);
        assert_eq!(registry.tasks_by_level(3, None).len(), 48);
    }
}
