//! Testing infrastructure for tasktree.
//!
//! - **Builders**: sample and generated registries, available to integration
//!   tests and benches
//! - **Fixtures**: temporary workspaces on disk (test-only)
//!
//! # Example
//!
//! ```rust,ignore
//! use tasktree::testing::{builders, TestFixture};
//!
//! let fixture = TestFixture::with_registry(builders::full_stack());
//! let project = fixture.open();
//! ```

pub mod builders;
#[cfg(test)]
pub mod fixtures;

#[cfg(test)]
pub use fixtures::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Category;

    #[test]
    fn test_fixture_starts_empty() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
        assert!(!fixture.tasks_dir().exists());
        assert!(fixture.open().registry.is_empty());
    }

    #[test]
    fn test_fixture_with_registry() {
        let fixture = TestFixture::with_registry(builders::full_stack());
        let project = fixture.open();
        assert_eq!(project.registry, builders::full_stack());
    }

    #[test]
    fn test_fixture_config_is_loaded() {
        let fixture = TestFixture::new();
        fixture.write_config(r#"{"workers": 2}"#);
        assert_eq!(fixture.open().config.workers, 2);
    }

    #[test]
    fn test_fixture_decomposition_dir() {
        let fixture = TestFixture::new();
        let dir = fixture.write_decomposition(Category::Backend, "001.json", "{}");
        assert!(dir.ends_with("backend_decomposition_temp"));
        assert!(dir.join("001.json").exists());
    }
}
