use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::catalog::model::{JournalVolume, Stage, VolumeStatus};
use crate::error::PublishError;
use crate::parser::{DatFileParser, TopFileParser};
use crate::processor::{list_image_files, ImageMetadataReader, OcrTextReader};
use crate::publish::{documents_for_volume, VolumePayload};
use crate::recovery::describe_error;
use crate::state::VolumeStateMachine;
use crate::storage::{object_key, ObjectUpload};
use crate::worker::job::JobResult;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};

/// A stage body. Returns a short summary for progress reporting.
type StageStep =
    fn(&Pipeline, &JournalVolume, &mut PipelineContext) -> Result<String, PipelineError>;

pub struct Pipeline {
    config: Arc<PipelineConfig>,
}

impl Pipeline {
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    /// Runs every pending stage of the job's volume.
    ///
    /// Stage failures are recorded on the volume and in the result; only
    /// catalog or state errors outside a stage end the job early.
    pub fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> (JobResult, PipelineContext) {
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.id,
            volume = %ctx.job.label,
            force = ctx.job.force,
        )
        .entered();

        let result = match self.execute(&mut ctx, progress) {
            Ok(status) => {
                progress.report(ProgressEvent::Finished { status });
                let error = if ctx.failed.is_empty() {
                    None
                } else {
                    Some(
                        ctx.failed
                            .iter()
                            .map(|(_, message)| message.as_str())
                            .collect::<Vec<_>>()
                            .join("; "),
                    )
                };
                JobResult::finished(
                    &ctx.job,
                    status,
                    ctx.completed.clone(),
                    ctx.failed_stages(),
                    error,
                )
            }
            Err(e) => {
                let message = describe_error(&e);
                warn!("Job {} for {} aborted: {}", ctx.job.id, ctx.job.label, message);
                JobResult::failure(&ctx.job, message)
            }
        };

        (result, ctx)
    }

    fn execute(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<VolumeStatus, PipelineError> {
        let catalog = self.config.catalog.as_ref();
        let mut volume = catalog
            .find_volume(&ctx.job.volume_id)?
            .ok_or_else(|| PipelineError::VolumeNotFound(ctx.job.volume_id.clone()))?;

        VolumeStateMachine::new(&mut volume).begin_processing(ctx.job.force)?;
        catalog.save_volume(&volume)?;

        let catalog_ready =
            self.run_stage(&mut volume, Stage::Catalog, ctx, progress, Self::step_catalog)?;

        if catalog_ready {
            for stage in Stage::PUBLISH {
                let step: StageStep = match stage {
                    Stage::RemotePush => Self::step_remote_push,
                    Stage::ObjectSync => Self::step_object_sync,
                    Stage::SearchIndex => Self::step_search_index,
                    Stage::Catalog => continue,
                };
                self.run_stage(&mut volume, stage, ctx, progress, step)?;
            }
        }

        VolumeStateMachine::new(&mut volume).settle()?;
        catalog.save_volume(&volume)?;

        let status = volume.status;
        ctx.volume = Some(volume);
        Ok(status)
    }

    /// Runs one stage unless its flag is already set and records the outcome
    /// on the volume. Returns whether the stage's flag is set afterwards.
    fn run_stage(
        &self,
        volume: &mut JournalVolume,
        stage: Stage,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
        step: StageStep,
    ) -> Result<bool, PipelineError> {
        if volume.flags.get(stage) {
            ctx.skipped.push(stage);
            progress.report(ProgressEvent::StageSkipped { stage });
            return Ok(true);
        }

        let _stage_span = info_span!("stage", stage = stage.as_str()).entered();
        progress.report(ProgressEvent::StageStarted { stage });

        match step(self, volume, ctx) {
            Ok(message) => {
                VolumeStateMachine::new(volume).complete_stage(stage)?;
                self.config.catalog.save_volume(volume)?;
                ctx.completed.push(stage);
                progress.report(ProgressEvent::StageCompleted { stage, message });
                Ok(true)
            }
            Err(e) => {
                let error = describe_error(&e);
                VolumeStateMachine::new(volume).fail_stage(stage, &error)?;
                self.config.catalog.save_volume(volume)?;
                ctx.failed.push((stage, error.clone()));
                progress.report(ProgressEvent::StageFailed { stage, error });
                Ok(false)
            }
        }
    }

    /// Page list, then article list, then image headers.
    fn step_catalog(
        &self,
        volume: &JournalVolume,
        ctx: &mut PipelineContext,
    ) -> Result<String, PipelineError> {
        let catalog = self.config.catalog.as_ref();
        let sources = self.config.layout.sources(volume);

        let mut listed = HashSet::new();
        for page in TopFileParser::open(&sources.top_file(), &volume.id)? {
            let page = catalog.upsert_page(&page?)?;
            listed.insert(page.name);
        }
        ctx.pages_cataloged = listed.len();
        ctx.pages_pruned = catalog.prune_pages(&volume.id, &listed)?;
        if ctx.pages_pruned > 0 {
            info!(
                "Removed {} pages no longer listed for {}",
                ctx.pages_pruned,
                volume.display_name()
            );
        }

        let dat_file = sources.dat_file();
        if dat_file.is_file() {
            for article in DatFileParser::open(&dat_file, &volume.id, catalog)? {
                article?;
                ctx.articles_linked += 1;
            }
        } else {
            info!("No article list for {}", volume.display_name());
        }

        ctx.images_read =
            ImageMetadataReader::new(catalog, &volume.id, &sources.image_dir).apply()?;

        Ok(format!(
            "{} pages, {} articles, {} pages with image metadata",
            ctx.pages_cataloged, ctx.articles_linked, ctx.images_read
        ))
    }

    fn step_remote_push(
        &self,
        volume: &JournalVolume,
        _ctx: &mut PipelineContext,
    ) -> Result<String, PipelineError> {
        let payload = VolumePayload::from_catalog(self.config.catalog.as_ref(), volume)?;
        let response = self.config.remote.push(&payload)?;

        if !response.is_accepted() {
            return Err(PublishError::Rejected {
                url: self.config.remote.endpoint().to_string(),
                status: response.status,
                body: response.body,
            }
            .into());
        }

        Ok(format!("{} pages pushed", payload.pages.len()))
    }

    /// Uploads the image files of every cataloged page.
    fn step_object_sync(
        &self,
        volume: &JournalVolume,
        ctx: &mut PipelineContext,
    ) -> Result<String, PipelineError> {
        let sources = self.config.layout.sources(volume);
        let pages: HashSet<String> = self
            .config
            .catalog
            .pages_for_volume(&volume.id)?
            .into_iter()
            .map(|page| page.name)
            .collect();

        let uploads: Vec<ObjectUpload> = list_image_files(&sources.image_dir)?
            .into_iter()
            .filter(|file| pages.contains(&file.page_name))
            .map(|file| ObjectUpload {
                key: object_key(volume, &file.file_name),
                page_name: file.page_name,
                source: file.path,
            })
            .collect();
        debug!("Uploading {} images", uploads.len());

        ctx.objects_uploaded = self.config.object_store.put_all(&uploads)?;
        Ok(format!("{} objects uploaded", ctx.objects_uploaded))
    }

    fn step_search_index(
        &self,
        volume: &JournalVolume,
        ctx: &mut PipelineContext,
    ) -> Result<String, PipelineError> {
        let sources = self.config.layout.sources(volume);
        let documents = documents_for_volume(
            self.config.catalog.as_ref(),
            volume,
            &OcrTextReader::new(&sources.ocr_dir),
            &self.config.projects,
        )?;

        ctx.documents_indexed = self.config.search_index.index(&documents)?;
        Ok(format!("{} documents indexed", ctx.documents_indexed))
    }
}
