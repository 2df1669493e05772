use log::{info, warn};

use crate::catalog::model::{Stage, VolumeStatus};

/// Events emitted by the pipeline while processing a volume.
pub enum ProgressEvent {
    StageStarted {
        stage: Stage,
    },
    StageSkipped {
        stage: Stage,
    },
    StageCompleted {
        stage: Stage,
        message: String,
    },
    StageFailed {
        stage: Stage,
        error: String,
    },
    Finished {
        status: VolumeStatus,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes progress to the log, prefixed with the volume label.
pub struct LogProgress {
    label: String,
}

impl LogProgress {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StageStarted { stage } => {
                log::debug!("[{}] {} stage started", self.label, stage);
            }
            ProgressEvent::StageSkipped { stage } => {
                log::debug!("[{}] {} stage already done", self.label, stage);
            }
            ProgressEvent::StageCompleted { stage, message } => {
                info!("[{}] {} stage done: {}", self.label, stage, message);
            }
            ProgressEvent::StageFailed { stage, error } => {
                warn!("[{}] {} stage failed: {}", self.label, stage, error);
            }
            ProgressEvent::Finished { status } => {
                info!("[{}] finished with status {}", self.label, status);
            }
        }
    }
}
