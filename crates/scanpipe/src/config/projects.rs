use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::error::ConfigError;

/// Journal code → project tag, loaded from a JSON object.
#[derive(Debug, Clone, Default)]
pub struct ProjectTable {
    projects: HashMap<String, String>,
}

impl ProjectTable {
    pub fn from_map(projects: HashMap<String, String>) -> Self {
        Self { projects }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let table_error = |reason: String| ConfigError::ProjectTable {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| table_error(e.to_string()))?;
        let projects: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|e| table_error(e.to_string()))?;

        debug!("Loaded {} project tags from {}", projects.len(), path.display());
        Ok(Self { projects })
    }

    /// The project tag of a journal, or `""` for journals outside every project.
    pub fn lookup(&self, journal: &str) -> &str {
        self.projects.get(journal).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
