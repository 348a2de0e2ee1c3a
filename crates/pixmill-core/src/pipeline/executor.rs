//! Batch execution: runs every job through the stage pipeline on a worker
//! thread, reporting progress and honoring cancellation between images.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, PixmillError, Result};
use crate::types::{Configuration, Job};

use super::channel::{
    progress_channel, CancellationToken, ProgressEvent, ProgressReceiver, ProgressSink,
    RunSummary,
};
use super::decode::ImageDecoder;
use super::encode::write_image;
use super::naming::output_path;
use super::stages::StagePlan;
use super::watermark::WatermarkCompositor;

/// Runs batches of jobs against one configuration at a time.
#[derive(Debug, Clone)]
pub struct Executor {
    decoder: ImageDecoder,
    compositor: WatermarkCompositor,
}

impl Executor {
    /// Create an executor from application settings.
    ///
    /// Loads the watermark font once; a missing or broken font falls back to
    /// the built-in face.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            compositor: WatermarkCompositor::load(config.font_path().as_deref()),
        }
    }

    /// Start a run on a dedicated worker thread and return immediately.
    ///
    /// `configuration` is moved in, so the caller's later edits never reach
    /// the run.
    pub fn run(
        &self,
        jobs: Vec<Job>,
        configuration: Configuration,
        output_dir: PathBuf,
    ) -> Result<RunHandle> {
        let (mut tx, events) = progress_channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let executor = self.clone();

        let worker = std::thread::Builder::new()
            .name("pixmill-worker".into())
            .spawn(move || {
                executor.execute(&jobs, &configuration, &output_dir, &worker_cancel, &mut tx)
            })?;

        Ok(RunHandle {
            events,
            cancel,
            worker,
        })
    }

    /// Run all jobs on the current thread.
    ///
    /// Per-image failures are reported as events and never stop the run. An
    /// invalid configuration or unusable output directory stops it before any
    /// image is touched, with a `Failed` event and an error.
    pub fn execute<S>(
        &self,
        jobs: &[Job],
        configuration: &Configuration,
        output_dir: &Path,
        cancel: &CancellationToken,
        sink: &mut S,
    ) -> Result<RunSummary>
    where
        S: ProgressSink + ?Sized,
    {
        let start = Instant::now();
        let total = jobs.len();

        if let Err(e) = configuration.validate() {
            tracing::error!("Invalid configuration: {}", e);
            sink.emit(ProgressEvent::Failed(e.to_string()));
            return Err(e.into());
        }
        if let Err(e) = prepare_output_dir(output_dir) {
            let message = format!("Output directory {:?} is not writable: {}", output_dir, e);
            tracing::error!("{}", message);
            sink.emit(ProgressEvent::Failed(message));
            return Err(PixmillError::Io(e));
        }

        let plan = StagePlan::for_configuration(configuration);
        tracing::info!("Converting {} images to {:?}", total, output_dir);
        for line in configuration.describe() {
            tracing::debug!("  {}", line);
        }

        let mut succeeded = 0;
        let mut failed = 0;
        let mut cancelled = false;

        for (index, job) in jobs.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            sink.emit(ProgressEvent::Status(format!(
                "Processing: {}",
                job.file_name()
            )));
            sink.emit(ProgressEvent::Progress { index, total });

            for skip in plan.skipped() {
                tracing::warn!("{}: {}", job.file_name(), skip);
                sink.emit(ProgressEvent::Warning {
                    source: job.source.clone(),
                    message: skip.to_string(),
                });
            }

            match isolate(job, || self.process_job(job, configuration, &plan, output_dir)) {
                Ok(output) => {
                    succeeded += 1;
                    tracing::info!("Saved: {:?}", output);
                    sink.emit(ProgressEvent::Saved {
                        source: job.source.clone(),
                        output,
                    });
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!("Failed: {} - {}", job.file_name(), e);
                    sink.emit(ProgressEvent::ImageFailed {
                        source: job.source.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if cancelled {
            tracing::info!("Processing cancelled after {} of {} images", succeeded + failed, total);
            sink.emit(ProgressEvent::Status("Processing cancelled".into()));
        }

        let summary = RunSummary {
            succeeded,
            failed,
            total,
            cancelled,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Completed: {} succeeded, {} failed in {:?}",
            summary.succeeded,
            summary.failed,
            summary.elapsed()
        );
        sink.emit(ProgressEvent::Completed(summary.clone()));
        Ok(summary)
    }

    /// Decode, transform, encode and write one job.
    fn process_job(
        &self,
        job: &Job,
        configuration: &Configuration,
        plan: &StagePlan,
        output_dir: &Path,
    ) -> PipelineResult<PathBuf> {
        let start = Instant::now();
        tracing::debug!("Processing: {:?}", job.source);

        let decoded = self.decoder.decode(&job.source)?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let image = plan.apply(decoded.image, &self.compositor);

        let output = output_path(output_dir, job, configuration);
        write_image(
            &image,
            &job.source,
            &output,
            configuration.output_format,
            configuration.quality,
        )?;

        tracing::debug!(
            "Processed {} in {:?} ({}x{})",
            job.file_name(),
            start.elapsed(),
            image.width(),
            image.height()
        );
        Ok(output)
    }
}

/// Run one job's work, turning a panic into a per-image failure.
fn isolate<T>(job: &Job, work: impl FnOnce() -> PipelineResult<T>) -> PipelineResult<T> {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        Err(PipelineError::Panicked {
            path: job.source.clone(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Create the output directory and check that files can be written to it.
fn prepare_output_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(format!(".pixmill-write-test-{}", std::process::id()));
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)?;
    std::fs::remove_file(&probe)
}

/// A run in progress on a worker thread.
#[derive(Debug)]
pub struct RunHandle {
    events: ProgressReceiver,
    cancel: CancellationToken,
    worker: JoinHandle<Result<RunSummary>>,
}

impl RunHandle {
    /// The run's event stream.
    pub fn events(&mut self) -> &mut ProgressReceiver {
        &mut self.events
    }

    /// Ask the worker to stop before its next image.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this run, for signal handlers and the like.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker to exit.
    pub fn join(self) -> Result<RunSummary> {
        self.worker.join().map_err(|_| {
            PixmillError::Io(std::io::Error::other("pixmill worker thread panicked"))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_sources(dir: &Path, count: usize) -> Vec<PathBuf> {
        (1..=count)
            .map(|i| {
                let path = dir.join(format!("src_{i}.png"));
                RgbImage::from_pixel(24, 16, Rgb([i as u8 * 40, 80, 120]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_execute_emits_progress_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), 2);
        let out = dir.path().join("out");

        let mut events = Vec::new();
        let summary = Executor::new(&Config::default())
            .execute(
                &Job::batch(sources),
                &Configuration::default(),
                &out,
                &CancellationToken::new(),
                &mut events,
            )
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(events[0], ProgressEvent::Status("Processing: src_1.png".into()));
        assert_eq!(events[1], ProgressEvent::Progress { index: 0, total: 2 });
        assert!(matches!(&events[2], ProgressEvent::Saved { output, .. } if output.ends_with("src_1.jpg")));
        assert_eq!(events[4], ProgressEvent::Progress { index: 1, total: 2 });
        assert!(matches!(events.last(), Some(ProgressEvent::Completed(s)) if s.succeeded == 2));
        assert!(out.join("src_2.jpg").exists());
    }

    #[test]
    fn test_invalid_configuration_fails_before_any_image() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), 1);
        let config = Configuration {
            quality: 0,
            ..Default::default()
        };

        let mut events = Vec::new();
        let result = Executor::new(&Config::default()).execute(
            &Job::batch(sources),
            &config,
            &dir.path().join("out"),
            &CancellationToken::new(),
            &mut events,
        );

        assert!(result.is_err());
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ProgressEvent::Failed(msg) if msg.contains("quality")));
    }

    #[test]
    fn test_unwritable_output_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), 1);
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();

        let mut events = Vec::new();
        let result = Executor::new(&Config::default()).execute(
            &Job::batch(sources),
            &Configuration::default(),
            &blocker.join("out"),
            &CancellationToken::new(),
            &mut events,
        );

        assert!(result.is_err());
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ProgressEvent::Failed(msg) if msg.contains("not writable")));
    }

    #[test]
    fn test_pre_cancelled_run_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), 3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut events = Vec::new();
        let summary = Executor::new(&Config::default())
            .execute(
                &Job::batch(sources),
                &Configuration::default(),
                &dir.path().join("out"),
                &cancel,
                &mut events,
            )
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.skipped(), 3);
        assert_eq!(events[0], ProgressEvent::Status("Processing cancelled".into()));
    }

    #[test]
    fn test_panicking_job_becomes_image_failure() {
        let job = Job {
            source: PathBuf::from("/in/hostile.png"),
            sequence: 1,
        };
        let result: PipelineResult<PathBuf> = isolate(&job, || panic!("codec overflow"));
        let err = result.unwrap_err();
        assert!(matches!(err, PipelineError::Panicked { .. }));
        let message = err.to_string();
        assert!(message.contains("hostile.png"), "{message}");
        assert!(message.contains("codec overflow"), "{message}");

        let ok = isolate(&job, || Ok(7));
        assert_eq!(ok.unwrap(), 7);
    }

    #[test]
    fn test_run_on_worker_thread() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), 3);

        let mut handle = Executor::new(&Config::default())
            .run(
                Job::batch(sources),
                Configuration::default(),
                dir.path().join("out"),
            )
            .unwrap();

        let mut saved = 0;
        while let Some(event) = handle.events().blocking_recv() {
            if matches!(event, ProgressEvent::Saved { .. }) {
                saved += 1;
            }
            if event.is_terminal() {
                break;
            }
        }
        let summary = handle.join().unwrap();
        assert_eq!(saved, 3);
        assert_eq!(summary.succeeded, 3);
    }
}
