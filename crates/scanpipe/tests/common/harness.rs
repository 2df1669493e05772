//! Isolated pipeline environment.
//!
//! Everything lives under one temporary directory: the input tree, the
//! bucket directory and (for `with_sqlite`) the database. The search index
//! and remote catalog are recording fakes.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use scanpipe::catalog::{Catalog, JournalVolume, MemoryCatalog, Page};
use scanpipe::config::ProjectTable;
use scanpipe::error::PublishError;
use scanpipe::layout::{InputLayout, VolumeSources};
use scanpipe::publish::{CatalogPush, PushResponse, SearchDocument, SearchIndex, VolumePayload};
use scanpipe::storage::FilesystemObjectStore;
use scanpipe::worker::{run_pass, PassReport};
use scanpipe::{Database, PipelineConfig, SqliteCatalog};

use super::builders::VolumeFixture;

#[derive(Default)]
pub struct RecordingIndex {
    pub documents: Mutex<Vec<SearchDocument>>,
    pub calls: Mutex<usize>,
}

impl SearchIndex for RecordingIndex {
    fn index(&self, documents: &[SearchDocument]) -> Result<usize, PublishError> {
        *self.calls.lock().unwrap() += 1;
        self.documents.lock().unwrap().extend_from_slice(documents);
        Ok(documents.len())
    }
}

pub struct RecordingPush {
    pub status: AtomicU16,
    pub unreachable: AtomicBool,
    pub payloads: Mutex<Vec<VolumePayload>>,
}

impl RecordingPush {
    fn new() -> Self {
        Self {
            status: AtomicU16::new(200),
            unreachable: AtomicBool::new(false),
            payloads: Mutex::new(Vec::new()),
        }
    }
}

impl CatalogPush for RecordingPush {
    fn push(&self, payload: &VolumePayload) -> Result<PushResponse, PublishError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected {
                url: self.endpoint().to_string(),
                status: 0,
                body: "connection refused".to_string(),
            });
        }
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(PushResponse {
            status: self.status.load(Ordering::SeqCst),
            body: "{\"message\":\"stored\"}".to_string(),
        })
    }

    fn endpoint(&self) -> &str {
        "http://remote.test/volumes"
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub bucket_dir: PathBuf,
    pub catalog: Arc<dyn Catalog>,
    pub index: Arc<RecordingIndex>,
    pub remote: Arc<RecordingPush>,
    pub projects: ProjectTable,
}

impl TestHarness {
    /// Harness over an in-memory catalog.
    pub fn new() -> Self {
        Self::with_catalog(|_| Arc::new(MemoryCatalog::new()))
    }

    /// Harness over a SQLite catalog stored in the temporary directory.
    pub fn with_sqlite() -> Self {
        Self::with_catalog(|dir| {
            let database = Database::open(&dir.join("data").join("scanpipe.db")).unwrap();
            Arc::new(SqliteCatalog::new(database))
        })
    }

    fn with_catalog<F>(make_catalog: F) -> Self
    where
        F: FnOnce(&std::path::Path) -> Arc<dyn Catalog>,
    {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let bucket_dir = temp_dir.path().join("bucket");
        std::fs::create_dir_all(input_dir.join("lists")).unwrap();
        std::fs::create_dir_all(&bucket_dir).unwrap();

        let catalog = make_catalog(temp_dir.path());

        Self {
            temp_dir,
            input_dir,
            bucket_dir,
            catalog,
            index: Arc::new(RecordingIndex::default()),
            remote: Arc::new(RecordingPush::new()),
            projects: ProjectTable::default(),
        }
    }

    pub fn add(&self, fixture: &VolumeFixture) -> VolumeSources {
        fixture.write(&self.input_dir)
    }

    pub fn pipeline_config(&self) -> Arc<PipelineConfig> {
        Arc::new(PipelineConfig {
            layout: InputLayout::new(&self.input_dir),
            projects: self.projects.clone(),
            catalog: Arc::clone(&self.catalog),
            object_store: Arc::new(FilesystemObjectStore::new(&self.bucket_dir)),
            search_index: self.index.clone(),
            remote: self.remote.clone(),
        })
    }

    pub fn run_pass(&self, force: bool) -> PassReport {
        run_pass(self.pipeline_config(), 2, force).expect("pass failed")
    }

    pub fn volume(&self, journal: &str, volume: &str) -> JournalVolume {
        self.catalog
            .find_volume_by_key("seri", journal, volume)
            .unwrap()
            .unwrap_or_else(|| panic!("volume {}{} not cataloged", journal, volume))
    }

    pub fn pages(&self, journal: &str, volume: &str) -> Vec<Page> {
        let volume = self.volume(journal, volume);
        self.catalog.pages_for_volume(&volume.id).unwrap()
    }

    pub fn bucket_file(&self, key: &str) -> PathBuf {
        self.bucket_dir.join(key)
    }

    pub fn set_remote_status(&self, status: u16) {
        self.remote.status.store(status, Ordering::SeqCst);
    }
}
