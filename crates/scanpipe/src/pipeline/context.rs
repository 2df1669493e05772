use crate::catalog::model::{JournalVolume, Stage};
use crate::worker::job::Job;

/// Per-job state threaded through the pipeline steps.
pub struct PipelineContext {
    pub job: Job,

    /// Loaded on admission; `None` if the volume could not be loaded.
    pub volume: Option<JournalVolume>,

    pub completed: Vec<Stage>,
    /// Failed stages with their diagnostics.
    pub failed: Vec<(Stage, String)>,
    pub skipped: Vec<Stage>,

    // Catalog stage counters
    pub pages_cataloged: usize,
    pub pages_pruned: usize,
    pub articles_linked: usize,
    pub images_read: usize,

    // Publish stage counters
    pub objects_uploaded: usize,
    pub documents_indexed: usize,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            volume: None,
            completed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            pages_cataloged: 0,
            pages_pruned: 0,
            articles_linked: 0,
            images_read: 0,
            objects_uploaded: 0,
            documents_indexed: 0,
        }
    }

    pub fn failed_stages(&self) -> Vec<Stage> {
        self.failed.iter().map(|(stage, _)| *stage).collect()
    }
}
