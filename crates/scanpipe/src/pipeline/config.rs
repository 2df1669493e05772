use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::{Config, ProjectTable};
use crate::error::ScanError;
use crate::layout::InputLayout;
use crate::publish::{CatalogPush, HttpCatalogPush, OpenSearchIndex, SearchIndex};
use crate::storage::{FilesystemObjectStore, ObjectStore};

/// Everything a worker needs to run the pipeline for a volume. Shared by all
/// workers of a pool.
pub struct PipelineConfig {
    pub layout: InputLayout,
    pub projects: ProjectTable,
    pub catalog: Arc<dyn Catalog>,
    pub object_store: Arc<dyn ObjectStore>,
    pub search_index: Arc<dyn SearchIndex>,
    pub remote: Arc<dyn CatalogPush>,
}

impl PipelineConfig {
    /// Builds the production collaborators described by `config`.
    pub fn from_config(config: &Config, catalog: Arc<dyn Catalog>) -> Result<Self, ScanError> {
        let projects = match &config.projects_file {
            Some(path) => ProjectTable::load(path)?,
            None => ProjectTable::default(),
        };

        let search_index = OpenSearchIndex::new(
            &config.search.url,
            &config.search.index,
            config.search.timeout(),
        )?;
        let remote = HttpCatalogPush::new(&config.remote.url, config.remote.timeout())?;

        Ok(Self {
            layout: InputLayout::new(PathBuf::from(&config.input_directory)),
            projects,
            catalog,
            object_store: Arc::new(FilesystemObjectStore::new(&config.storage.bucket_directory)),
            search_index: Arc::new(search_index),
            remote: Arc::new(remote),
        })
    }
}
