// thumbnailer/src/core/thumbnailer.rs
use super::{Job, JobReport, Result, ThumbnailError, ThumbnailOpt, ThumbnailResult, ThumbnailerConfig};
use crate::processors::naming::thumbnail_url;
use crate::processors::resizer::{self, Resizer};
use crate::store::{parse_location, StoreContext};
use image::RgbaImage;
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;
use url::Url;

/// Where a job currently is. `Failed` can only follow `Opening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Opening,
    Preparing,
    Dispatching,
    Collecting,
    Done,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Opening => "opening",
            Self::Preparing => "preparing",
            Self::Dispatching => "dispatching",
            Self::Collecting => "collecting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Decoded source shared read-only by every option of a job.
struct PreparedSource {
    original: RgbaImage,
    shared: Option<RgbaImage>,
}

pub struct Thumbnailer {
    config: ThumbnailerConfig,
    stores: StoreContext,
    resizer: Resizer,
    thread_pool: Option<rayon::ThreadPool>,
}

impl Thumbnailer {
    /// Builds the store context from `config.object_storage`.
    pub fn new(config: ThumbnailerConfig) -> Result<Self> {
        let stores = StoreContext::from_config(config.object_storage.as_ref())?;
        Self::with_stores(config, stores)
    }

    pub fn with_stores(config: ThumbnailerConfig, stores: StoreContext) -> Result<Self> {
        config.validate()?;

        let thread_pool = if config.max_workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_workers)
                .thread_name(|i| format!("thumbnailer-{}", i))
                .build()
                .map_err(|e| {
                    ThumbnailError::ProcessingError(format!("Failed to create thread pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            resizer: Resizer::new(config.algorithm),
            config,
            stores,
            thread_pool,
        })
    }

    /// Generates every option of `job`, one result per option in option
    /// order. Errors are job-level only: the source could not be located,
    /// read or decoded, and no option ran.
    ///
    /// Blocks until every option has reported.
    pub fn generate(&self, job: &Job) -> Result<Vec<ThumbnailResult>> {
        if job.opts.is_empty() {
            log::debug!("No thumbnails requested for {}", job.src_image);
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let source = self.prepare(job).map_err(|e| {
            log::warn!("[{}] {}: {}", JobStage::Failed, job.src_image, e);
            e
        })?;

        log::debug!(
            "[{}] {} option(s) for {}",
            JobStage::Dispatching,
            job.opts.len(),
            job.src_image
        );

        let results: Vec<ThumbnailResult> = self.dispatch(|| {
            job.opts
                .par_iter()
                .map(|opt| self.generate_thumbnail(job, &source, opt))
                .collect()
        });

        log::debug!("[{}] {}", JobStage::Collecting, job.src_image);
        let failed = results.iter().filter(|r| !r.is_ok()).count();
        if failed > 0 {
            log::warn!(
                "{} of {} thumbnail(s) failed for {}",
                failed,
                results.len(),
                job.src_image
            );
        }

        log::info!(
            "[{}] {} thumbnail(s) for {} in {:?}",
            JobStage::Done,
            results.len() - failed,
            job.src_image,
            started.elapsed()
        );

        Ok(results)
    }

    /// Generates, then deletes the source when the job asks for it and
    /// every option succeeded. Successful outputs are kept either way. A job
    /// without options never opens its source, so it never deletes it.
    pub fn process(&self, job: &Job) -> Result<JobReport> {
        let mut report = JobReport {
            results: self.generate(job)?,
            ..Default::default()
        };

        if !job.delete_src {
            return Ok(report);
        }

        if job.opts.is_empty() {
            log::warn!("Keeping {}: no thumbnails were requested", job.src_image);
            return Ok(report);
        }

        if report.failures().next().is_some() {
            log::warn!(
                "Keeping {}: at least one thumbnail failed",
                job.src_image
            );
            return Ok(report);
        }

        log::info!("Deleting {}", job.src_image);
        match self.delete_source(job) {
            Ok(()) => report.source_deleted = true,
            Err(e) => {
                log::warn!("Failed to delete {}: {}", job.src_image, e);
                report.delete_error = Some(e);
            }
        }

        Ok(report)
    }

    /// Removes the job's source image. Only local files can be deleted.
    pub fn delete_source(&self, job: &Job) -> Result<()> {
        let url = parse_location(&job.src_image)?;
        self.stores.resolve(&url)?.delete()
    }

    /// Runs `op` on the configured pool, or on rayon's global pool.
    fn dispatch<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.thread_pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn prepare(&self, job: &Job) -> Result<PreparedSource> {
        log::debug!("[{}] {}", JobStage::Opening, job.src_image);
        let url = parse_location(&job.src_image)?;
        let decoded = self.stores.resolve(&url)?.open()?;

        log::debug!("[{}] {}", JobStage::Preparing, job.src_image);
        let original = resizer::to_canonical(decoded);
        log::debug!(
            "Source {} is {}x{}",
            job.src_image,
            original.width(),
            original.height()
        );

        let shared = if job.opts.len() > 1 && self.config.shared_pre_resize {
            self.resizer.shared_pre_resize(&original, &job.opts)
        } else {
            None
        };

        Ok(PreparedSource { original, shared })
    }

    fn generate_thumbnail(
        &self,
        job: &Job,
        source: &PreparedSource,
        opt: &ThumbnailOpt,
    ) -> ThumbnailResult {
        let outcome = self.render_and_save(job, source, opt);
        if let Err(e) = &outcome {
            log::warn!("Thumbnail {:?} of {} failed: {}", opt, job.src_image, e);
        }
        ThumbnailResult::from(outcome)
    }

    fn render_and_save(&self, job: &Job, source: &PreparedSource, opt: &ThumbnailOpt) -> Result<Url> {
        let started = Instant::now();
        let rendered = self
            .resizer
            .render(&source.original, source.shared.as_ref(), opt)?;

        let url = thumbnail_url(
            job,
            opt,
            (rendered.width, rendered.height),
            self.config.passthrough_naming,
        )?;
        log::info!("Thumbnail {} generated in {:?}", url, started.elapsed());

        let saving = Instant::now();
        self.stores.resolve(&url)?.save(&rendered.image)?;
        log::info!("Thumbnail {} saved in {:?}", url, saving.elapsed());

        Ok(url)
    }
}
