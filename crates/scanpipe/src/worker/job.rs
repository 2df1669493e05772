use std::sync::Mutex;

use crate::catalog::model::{JournalVolume, Stage, VolumeStatus};
use crate::error::WorkerError;

/// A request to run the pipeline for one volume.
///
/// Jobs carry only the volume id; the worker reloads the volume, so a job
/// submitted twice does no more than the flags allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub volume_id: String,
    /// `type/journal/volume`, for logs.
    pub label: String,
    /// Reset all stage flags before running.
    pub force: bool,
}

impl Job {
    pub fn new(volume_id: &str, label: &str, force: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            volume_id: volume_id.to_string(),
            label: label.to_string(),
            force,
        }
    }

    pub fn for_volume(volume: &JournalVolume, force: bool) -> Self {
        Self::new(&volume.id, &volume.display_name(), force)
    }
}

/// Where scanners and recovery send jobs.
pub trait JobQueue {
    fn submit(&self, job: Job) -> Result<(), WorkerError>;
}

/// Collects submitted jobs instead of running them. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct CollectingQueue {
    jobs: Mutex<Vec<Job>>,
}

impl CollectingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Job> {
        self.jobs
            .lock()
            .map(|mut jobs| std::mem::take(&mut *jobs))
            .unwrap_or_default()
    }
}

impl JobQueue for CollectingQueue {
    fn submit(&self, job: Job) -> Result<(), WorkerError> {
        self.jobs
            .lock()
            .map_err(|_| WorkerError::ChannelClosed)?
            .push(job);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: String,
    pub volume_id: String,
    pub label: String,
    pub success: bool,
    /// Status of the volume when the job ended, if it could be loaded.
    pub status: Option<VolumeStatus>,
    pub completed_stages: Vec<Stage>,
    pub failed_stages: Vec<Stage>,
    pub error: Option<String>,
}

impl JobResult {
    pub fn finished(
        job: &Job,
        status: VolumeStatus,
        completed_stages: Vec<Stage>,
        failed_stages: Vec<Stage>,
        error: Option<String>,
    ) -> Self {
        Self {
            job_id: job.id.clone(),
            volume_id: job.volume_id.clone(),
            label: job.label.clone(),
            success: failed_stages.is_empty() && error.is_none(),
            status: Some(status),
            completed_stages,
            failed_stages,
            error,
        }
    }

    /// The job could not run at all (unknown volume, catalog unavailable).
    pub fn failure(job: &Job, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            volume_id: job.volume_id.clone(),
            label: job.label.clone(),
            success: false,
            status: None,
            completed_stages: vec![],
            failed_stages: vec![],
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_for_volume() {
        let volume = JournalVolume::new("seri", "test.", "0001");
        let job = Job::for_volume(&volume, true);

        assert_eq!(job.volume_id, volume.id);
        assert_eq!(job.label, "seri/test./0001");
        assert!(job.force);
        assert!(uuid::Uuid::parse_str(&job.id).is_ok());
    }

    #[test]
    fn test_collecting_queue() {
        let queue = CollectingQueue::new();
        queue.submit(Job::new("a", "x/y/1", false)).unwrap();
        queue.submit(Job::new("b", "x/y/2", false)).unwrap();

        let jobs = queue.take();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].volume_id, "b");
        assert!(queue.take().is_empty());
    }

    #[test]
    fn test_job_result_success() {
        let job = Job::new("v", "seri/test./0001", false);
        let result = JobResult::finished(
            &job,
            VolumeStatus::Done,
            Stage::ALL.to_vec(),
            vec![],
            None,
        );

        assert!(result.success);
        assert_eq!(result.job_id, job.id);
        assert_eq!(result.status, Some(VolumeStatus::Done));
    }

    #[test]
    fn test_job_result_with_failed_stage() {
        let job = Job::new("v", "seri/test./0001", false);
        let result = JobResult::finished(
            &job,
            VolumeStatus::Error,
            vec![Stage::Catalog],
            vec![Stage::RemotePush],
            Some("remote-push stage failed".to_string()),
        );
        assert!(!result.success);
    }

    #[test]
    fn test_job_result_failure() {
        let job = Job::new("v", "seri/test./0001", false);
        let result = JobResult::failure(&job, "Volume not found".to_string());

        assert!(!result.success);
        assert!(result.status.is_none());
        assert_eq!(result.error, Some("Volume not found".to_string()));
    }
}
