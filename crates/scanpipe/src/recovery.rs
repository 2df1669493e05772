//! Failure diagnostics and retry selection.

use std::collections::HashSet;
use std::error::Error;

use log::info;

use crate::catalog::model::{JournalVolume, VolumeStatus};
use crate::catalog::Catalog;
use crate::error::WorkerError;
use crate::worker::job::{Job, JobQueue};

/// Renders an error with its nested causes, outermost first.
///
/// A cause whose text the previous message already contains is skipped, so
/// errors that embed their source are not repeated.
pub fn describe_error(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut last = message.clone();
    let mut source = error.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !last.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        last = text;
        source = cause.source();
    }

    message
}

pub fn failed_volumes(catalog: &dyn Catalog) -> Result<Vec<JournalVolume>, WorkerError> {
    Ok(catalog.volumes_with_status(VolumeStatus::Error)?)
}

/// Resubmits every volume in `Error` through the normal job queue, except
/// the ids in `skip`. Returns the number of jobs submitted.
pub fn retry_failed(
    catalog: &dyn Catalog,
    queue: &dyn JobQueue,
    skip: &HashSet<String>,
) -> Result<usize, WorkerError> {
    let mut submitted = 0;

    for volume in failed_volumes(catalog)? {
        if skip.contains(&volume.id) {
            continue;
        }
        info!(
            "Retrying volume {} ({})",
            volume.display_name(),
            volume.status_message.as_deref().unwrap_or("no message")
        );
        queue.submit(Job::for_volume(&volume, false))?;
        submitted += 1;
    }

    Ok(submitted)
}
