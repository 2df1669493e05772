//! One ingestion pass: scan, retry failures, run every job to completion.

use std::collections::HashSet;
use std::sync::Arc;

use log::info;
use tracing::info_span;

use crate::error::WorkerError;
use crate::pipeline::PipelineConfig;
use crate::recovery::retry_failed;
use crate::worker::job::JobResult;
use crate::worker::pool::WorkerPool;
use crate::worker::scanner::{ScanReport, VolumeScanner};

#[derive(Debug, Default)]
pub struct PassReport {
    pub scan: ScanReport,
    /// Volumes resubmitted from `Error`.
    pub retried: usize,
    pub results: Vec<JobResult>,
}

impl PassReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Scans the input tree, resubmits failed volumes not already queued and
/// waits for every job.
///
/// Volumes the scan itself moved to `Error` are not retried in the same pass.
pub fn run_pass(
    config: Arc<PipelineConfig>,
    worker_count: usize,
    force: bool,
) -> Result<PassReport, WorkerError> {
    let _span = info_span!("pass", force, workers = worker_count).entered();

    let pool = WorkerPool::new(Arc::clone(&config), worker_count);
    let scanner = VolumeScanner::new(config.layout.clone());
    let catalog = config.catalog.as_ref();

    let submitted = scanner.scan(catalog, &pool, force).and_then(|scan| {
        let mut skip: HashSet<String> = scan.submitted.clone();
        skip.extend(scan.failed.iter().cloned());
        let retried = retry_failed(catalog, &pool, &skip)?;
        Ok((scan, retried))
    });

    let results = pool.finish();
    let (scan, retried) = submitted?;

    let report = PassReport {
        scan,
        retried,
        results,
    };
    info!(
        "Pass finished: {} jobs, {} succeeded, {} failed",
        report.results.len(),
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}
