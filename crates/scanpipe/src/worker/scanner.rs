use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::model::{JournalVolume, VolumeStatus};
use crate::catalog::Catalog;
use crate::error::WorkerError;
use crate::layout::{volume_from_list_file, InputLayout, VolumeSources};
use crate::recovery::describe_error;
use crate::state::VolumeStateMachine;
use crate::worker::fingerprint::fingerprint_volume;
use crate::worker::job::{Job, JobQueue};

/// How a discovered volume compares with the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeChange {
    New,
    Update,
    Unchanged,
}

/// Classifies a fingerprint against the stored volume, if any.
pub fn classify(existing: Option<&JournalVolume>, file_hash: &str) -> VolumeChange {
    match existing {
        None => VolumeChange::New,
        Some(volume) if volume.file_hash.as_deref() == Some(file_hash) => VolumeChange::Unchanged,
        Some(_) => VolumeChange::Update,
    }
}

/// Outcome of one scan pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub discovered: usize,
    pub new: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: usize,
    /// Volumes moved to `Error` because their fingerprint could not be computed.
    pub failed: Vec<String>,
    /// Ids of every volume a job was submitted for.
    pub submitted: HashSet<String>,
}

/// Walks the input tree and submits jobs for new and changed volumes.
pub struct VolumeScanner {
    layout: InputLayout,
}

impl VolumeScanner {
    pub fn new(layout: InputLayout) -> Self {
        Self { layout }
    }

    pub fn input_directory(&self) -> &Path {
        self.layout.root()
    }

    /// Finds every volume that has a page list, in path order.
    ///
    /// Page lists live at `lists/{type}/{journal}/{journal}{volume}.top`.
    /// A volume with both a classic and a map page list is reported once.
    pub fn discover(&self) -> Result<Vec<VolumeSources>, WorkerError> {
        let lists_root = self.layout.lists_root();
        let mut keys: BTreeSet<(String, String, String)> = BTreeSet::new();

        for entry in WalkDir::new(&lists_root)
            .min_depth(3)
            .max_depth(3)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| WorkerError::ScanFailed {
                path: lists_root.clone(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some((kind, journal)) = type_and_journal(&lists_root, entry.path()) else {
                continue;
            };
            let file_name = entry.file_name().to_string_lossy();

            match volume_from_list_file(&file_name, &journal) {
                Some(volume) => {
                    keys.insert((kind, journal, volume));
                }
                None => debug!("Ignoring list file {}", entry.path().display()),
            }
        }

        let volumes: Vec<VolumeSources> = keys
            .into_iter()
            .map(|(kind, journal, volume)| VolumeSources::new(&self.layout, &kind, &journal, &volume))
            .collect();

        info!(
            "Discovered {} volumes in {}",
            volumes.len(),
            lists_root.display()
        );
        Ok(volumes)
    }

    /// Discovers volumes, detects changes and submits one job per new or
    /// changed volume. A volume whose fingerprint fails is moved to `Error`
    /// and the scan goes on. With `force`, every known volume counts as changed.
    pub fn scan(
        &self,
        catalog: &dyn Catalog,
        queue: &dyn JobQueue,
        force: bool,
    ) -> Result<ScanReport, WorkerError> {
        let _span = tracing::info_span!("scanner.scan", force).entered();

        let mut report = ScanReport::default();

        for sources in self.discover()? {
            report.discovered += 1;
            let existing =
                catalog.find_volume_by_key(&sources.kind, &sources.journal, &sources.volume)?;

            let file_hash = match fingerprint_volume(&sources) {
                Ok(hash) => hash,
                Err(e) => {
                    let message = describe_error(&e);
                    warn!("Cannot fingerprint {}: {}", display(&sources), message);

                    let mut volume = match existing {
                        Some(volume) => volume,
                        None => {
                            let volume =
                                JournalVolume::new(&sources.kind, &sources.journal, &sources.volume);
                            catalog.insert_volume(&volume)?;
                            volume
                        }
                    };
                    VolumeStateMachine::new(&mut volume).fail(&message)?;
                    catalog.save_volume(&volume)?;
                    report.failed.push(volume.id);
                    continue;
                }
            };

            let change = if force && existing.is_some() {
                VolumeChange::Update
            } else {
                classify(existing.as_ref(), &file_hash)
            };

            match (change, existing) {
                (VolumeChange::New, _) => {
                    let mut volume =
                        JournalVolume::new(&sources.kind, &sources.journal, &sources.volume);
                    volume.file_hash = Some(file_hash);
                    catalog.insert_volume(&volume)?;
                    info!("New volume {}", volume.display_name());

                    queue.submit(Job::for_volume(&volume, force))?;
                    report.submitted.insert(volume.id.clone());
                    report.new.push(volume.id);
                }
                (VolumeChange::Update, Some(mut volume)) => {
                    VolumeStateMachine::new(&mut volume).mark_updated(&file_hash)?;
                    catalog.save_volume(&volume)?;
                    info!("Volume {} changed", volume.display_name());

                    queue.submit(Job::for_volume(&volume, force))?;
                    report.submitted.insert(volume.id.clone());
                    report.updated.push(volume.id);
                }
                (_, Some(volume)) if is_interrupted(&volume) => {
                    info!("Resuming volume {} ({})", volume.display_name(), volume.status);
                    queue.submit(Job::for_volume(&volume, force))?;
                    report.submitted.insert(volume.id.clone());
                    report.unchanged += 1;
                }
                _ => {
                    report.unchanged += 1;
                }
            }
        }

        info!(
            "Scan finished: {} volumes, {} new, {} updated, {} unchanged, {} failed",
            report.discovered,
            report.new.len(),
            report.updated.len(),
            report.unchanged,
            report.failed.len()
        );
        Ok(report)
    }
}

/// A volume an earlier pass registered or started but never finished.
///
/// No job is live when a pass starts, so such a volume is only resumed by
/// resubmitting it.
fn is_interrupted(volume: &JournalVolume) -> bool {
    matches!(volume.status, VolumeStatus::New | VolumeStatus::Processing)
}

fn display(sources: &VolumeSources) -> String {
    format!("{}/{}/{}", sources.kind, sources.journal, sources.volume)
}

/// The `{type}/{journal}` directories above a list file.
fn type_and_journal(lists_root: &Path, file: &Path) -> Option<(String, String)> {
    let relative: PathBuf = file.strip_prefix(lists_root).ok()?.to_path_buf();
    let mut components = relative.iter();
    let kind = components.next()?.to_str()?.to_string();
    let journal = components.next()?.to_str()?.to_string();
    Some((kind, journal))
}
