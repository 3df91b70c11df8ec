//! Per-forest metadata and registry statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::node::Category;
use super::TaskRegistry;

/// Backend layers tracked in the metadata block.
pub const BACKEND_LAYERS: &[&str] = &["api", "service", "repository", "validation", "utility"];

/// Framework and size information for the frontend forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendMetadata {
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub total_modules: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_components: u32,
}

/// Framework and size information for the backend forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMetadata {
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub total_modules: u32,
    #[serde(default)]
    pub total_services: u32,
    #[serde(default)]
    pub total_functions: u32,
    /// Function counts per architectural layer
    #[serde(default = "default_layers")]
    pub layers: BTreeMap<String, u32>,
}

fn default_layers() -> BTreeMap<String, u32> {
    BACKEND_LAYERS
        .iter()
        .map(|layer| (layer.to_string(), 0))
        .collect()
}

impl Default for BackendMetadata {
    fn default() -> Self {
        Self {
            framework: None,
            language: None,
            database: None,
            total_modules: 0,
            total_services: 0,
            total_functions: 0,
            layers: default_layers(),
        }
    }
}

/// Partial update of the frontend counts; `None` leaves a count unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendCounts {
    #[serde(default)]
    pub total_modules: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_components: Option<u32>,
}

/// Partial update of the backend counts; `None` leaves a count unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCounts {
    #[serde(default)]
    pub total_modules: Option<u32>,
    #[serde(default)]
    pub total_services: Option<u32>,
    #[serde(default)]
    pub total_functions: Option<u32>,
    /// Layer counts merged into the existing map
    #[serde(default)]
    pub layers: BTreeMap<String, u32>,
}

/// Aggregate view over both forests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryStatistics {
    pub total_tasks: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_level: BTreeMap<u32, usize>,
    pub frontend_metadata: FrontendMetadata,
    pub backend_metadata: BackendMetadata,
    pub frontend_root_tasks: usize,
    pub backend_root_tasks: usize,
}

impl TaskRegistry {
    /// Record the frontend framework and language.
    pub fn init_frontend_metadata(&mut self, framework: &str, language: Option<&str>) {
        self.frontend_metadata.framework = Some(framework.to_string());
        self.frontend_metadata.language = Some(language.unwrap_or("TypeScript").to_string());
    }

    /// Record the backend framework, database, and language.
    pub fn init_backend_metadata(
        &mut self,
        framework: &str,
        database: &str,
        language: Option<&str>,
    ) {
        self.backend_metadata.framework = Some(framework.to_string());
        self.backend_metadata.database = Some(database.to_string());
        self.backend_metadata.language = Some(language.unwrap_or("Python").to_string());
    }

    /// Overwrite the given frontend counts.
    pub fn update_frontend_counts(&mut self, counts: &FrontendCounts) {
        let metadata = &mut self.frontend_metadata;
        if let Some(n) = counts.total_modules {
            metadata.total_modules = n;
        }
        if let Some(n) = counts.total_pages {
            metadata.total_pages = n;
        }
        if let Some(n) = counts.total_components {
            metadata.total_components = n;
        }
    }

    /// Overwrite the given backend counts and merge layer counts.
    pub fn update_backend_counts(&mut self, counts: &BackendCounts) {
        let metadata = &mut self.backend_metadata;
        if let Some(n) = counts.total_modules {
            metadata.total_modules = n;
        }
        if let Some(n) = counts.total_services {
            metadata.total_services = n;
        }
        if let Some(n) = counts.total_functions {
            metadata.total_functions = n;
        }
        metadata
            .layers
            .extend(counts.layers.iter().map(|(k, v)| (k.clone(), *v)));
    }

    /// Count tasks by status, category, and level.
    #[must_use]
    pub fn statistics(&self) -> RegistryStatistics {
        let mut by_status = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut by_level = BTreeMap::new();

        let all = self.flatten(None, None);
        for task in &all {
            *by_status.entry(task.status.to_string()).or_insert(0) += 1;
            *by_category.entry(task.category.to_string()).or_insert(0) += 1;
            *by_level.entry(task.level).or_insert(0) += 1;
        }

        RegistryStatistics {
            total_tasks: all.len(),
            by_status,
            by_category,
            by_level,
            frontend_metadata: self.frontend_metadata.clone(),
            backend_metadata: self.backend_metadata.clone(),
            frontend_root_tasks: self.roots(Category::Frontend).len(),
            backend_root_tasks: self.roots(Category::Backend).len(),
        }
    }
}
