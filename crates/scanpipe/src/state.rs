//! Volume status and stage-flag transitions.
//!
//! All status and flag changes of a [`JournalVolume`] go through
//! [`VolumeStateMachine`]. Callers persist the volume afterwards.

use log::debug;

use crate::catalog::model::{JournalVolume, Stage, VolumeStatus};
use crate::error::StateError;

/// Whether `from → to` is a legal status change. Nothing returns to `New`.
pub fn can_transition(from: VolumeStatus, to: VolumeStatus) -> bool {
    use VolumeStatus::*;

    matches!(
        (from, to),
        (New, Processing | Update | Error)
            | (Update, Processing | Update | Error)
            | (Processing, Processing | Update | Done | Error)
            | (Done, Processing | Update | Error)
            | (Error, Processing | Update | Error)
    )
}

pub struct VolumeStateMachine<'a> {
    volume: &'a mut JournalVolume,
}

impl<'a> VolumeStateMachine<'a> {
    pub fn new(volume: &'a mut JournalVolume) -> Self {
        Self { volume }
    }

    fn transition(&mut self, to: VolumeStatus) -> Result<(), StateError> {
        let from = self.volume.status;
        if !can_transition(from, to) {
            return Err(StateError::IllegalTransition { from, to });
        }
        if from != to {
            debug!("Volume {}: {} -> {}", self.volume.display_name(), from, to);
        }
        self.volume.status = to;
        self.volume.touch();
        Ok(())
    }

    /// Records a changed fingerprint. All four stage flags are reset.
    pub fn mark_updated(&mut self, file_hash: &str) -> Result<(), StateError> {
        self.transition(VolumeStatus::Update)?;
        self.volume.file_hash = Some(file_hash.to_string());
        self.volume.flags.reset();
        self.volume.status_message = None;
        Ok(())
    }

    /// Admits the volume to processing. A forced run resets all four flags
    /// first, so every stage runs again.
    pub fn begin_processing(&mut self, force: bool) -> Result<(), StateError> {
        self.transition(VolumeStatus::Processing)?;
        if force {
            self.volume.flags.reset();
        }
        self.volume.status_message = None;
        Ok(())
    }

    /// Marks a stage complete and recomputes the status.
    ///
    /// Publish stages require the catalog stage. A volume in `Error` stays
    /// there; otherwise it is `Done` iff every flag is set.
    pub fn complete_stage(&mut self, stage: Stage) -> Result<(), StateError> {
        if stage != Stage::Catalog && !self.volume.flags.db_done {
            return Err(StateError::CatalogPending { stage });
        }

        self.volume.flags.set(stage, true);

        if self.volume.status == VolumeStatus::Error {
            self.volume.touch();
            return Ok(());
        }

        let next = if self.volume.flags.all_done() {
            VolumeStatus::Done
        } else {
            VolumeStatus::Processing
        };
        if next == self.volume.status {
            self.volume.touch();
            Ok(())
        } else {
            self.transition(next)
        }
    }

    /// Records a stage failure. Flags already set are kept.
    pub fn fail_stage(&mut self, stage: Stage, message: &str) -> Result<(), StateError> {
        self.fail(&format!("{} stage failed: {}", stage, message))
    }

    /// Moves the volume to `Error` with a diagnostic.
    pub fn fail(&mut self, message: &str) -> Result<(), StateError> {
        self.transition(VolumeStatus::Error)?;
        self.volume.status_message = Some(message.to_string());
        Ok(())
    }

    /// Ends a run in which no stage completed: a processing volume whose
    /// flags are all set becomes `Done`.
    pub fn settle(&mut self) -> Result<(), StateError> {
        if self.volume.status == VolumeStatus::Processing && self.volume.flags.all_done() {
            self.transition(VolumeStatus::Done)?;
        }
        Ok(())
    }

    /// Stages whose flag is still false, in pipeline order.
    pub fn pending_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| !self.volume.flags.get(*stage))
            .collect()
    }
}
