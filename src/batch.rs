//! Bounded-concurrency batch conversion.
//!
//! [`BatchConverter`] runs every job of a batch with at most
//! [`limit`](ConversionOptions::limit) pipelines in flight. Jobs are started
//! in input order; each finished job is handed back over a channel to the
//! single owner of the result, so success counting needs no shared state.
//! After the last job finishes the shared workspace is optionally removed,
//! unless it holds a job's input or output or the working directory. The
//! [`BatchResult`] is returned last.
//!
//! # Example
//!
//! ```no_run
//! use gif_video::{ConversionJob, ConversionOptions, run_batch};
//!
//! # async fn example() {
//! let jobs = vec![
//!     ConversionJob::new("gifs/spin.gif", "dist/spin.gif"),
//!     ConversionJob::new("gifs/wave.gif", "dist/wave.gif"),
//! ];
//! let result = run_batch(jobs, ConversionOptions::new().with_limit(2)).await;
//! println!("{}", result.summary());
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::config::ConversionOptions;
use crate::error::ConversionError;
use crate::job::{ConversionJob, JobRunner, JobStatus};
use crate::progress::{NoOpProgress, ProgressCallback, ProgressEvent, ProgressTracker};
use crate::toolchain::Toolchain;
use crate::workspace::Workspace;

/// Outcome of a whole batch.
#[derive(Debug)]
pub struct BatchResult {
    /// Number of jobs submitted.
    pub total_files: usize,
    /// Number of jobs that reached [`JobStatus::Succeeded`].
    pub succeeded_count: usize,
    /// Every job in submission order, in its terminal state.
    pub jobs: Vec<ConversionJob>,
}

impl BatchResult {
    /// Number of jobs that failed.
    pub fn failed_count(&self) -> usize {
        self.total_files - self.succeeded_count
    }

    /// Jobs that failed, with their causes.
    pub fn failures(&self) -> impl Iterator<Item = &ConversionJob> {
        self.jobs
            .iter()
            .filter(|job| job.status() == JobStatus::Failed)
    }

    /// The human-readable summary line.
    ///
    /// ```
    /// use gif_video::BatchResult;
    ///
    /// let result = BatchResult { total_files: 1, succeeded_count: 0, jobs: Vec::new() };
    /// assert_eq!(result.summary(), "1 image found, 0 images converted.");
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "{} {} found, {} {} converted.",
            self.total_files,
            images(self.total_files),
            self.succeeded_count,
            images(self.succeeded_count),
        )
    }
}

impl Display for BatchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.summary())
    }
}

fn images(count: usize) -> &'static str {
    if count == 1 { "image" } else { "images" }
}

/// Runs batches of conversion jobs.
pub struct BatchConverter {
    options: ConversionOptions,
    toolchain: Option<Toolchain>,
    progress: Arc<dyn ProgressCallback>,
}

impl BatchConverter {
    /// Create a converter using the production tools described by `options`.
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            options,
            toolchain: None,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Use `toolchain` instead of the one derived from the options.
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    /// Report job events to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Options this converter runs with.
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Convert every job and return once all of them are terminal.
    ///
    /// A failing job never stops the others. A job whose task panics is
    /// recorded as failed with [`ConversionError::Aborted`].
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn run(&self, jobs: Vec<ConversionJob>) -> BatchResult {
        let total_files = jobs.len();
        log::info!(
            "Converting {total_files} files with at most {} at a time",
            self.options.limit(),
        );

        let tracker = Arc::new(ProgressTracker::new(
            self.progress.clone(),
            total_files as u64,
        ));
        let toolchain = self
            .toolchain
            .clone()
            .unwrap_or_else(|| Toolchain::from_options(&self.options));
        let workspace = Workspace::new(self.options.temp_dir());
        let runner = Arc::new(
            JobRunner::new(toolchain, workspace.clone(), self.options.targets().clone())
                .with_tracker(tracker.clone()),
        );

        let semaphore = Arc::new(Semaphore::new(self.options.limit()));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, ConversionJob)>();
        let mut tasks = JoinSet::new();
        let mut submitted: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(total_files);

        for (index, mut job) in jobs.into_iter().enumerate() {
            submitted.push((job.source().to_path_buf(), job.destination().to_path_buf()));
            let tx = tx.clone();
            let semaphore = semaphore.clone();
            let runner = runner.clone();

            tasks.spawn(async move {
                // Held until the job is terminal.
                let _permit = semaphore.acquire_owned().await;
                runner.run(&mut job).await;
                let _ = tx.send((index, job));
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(error) = joined {
                log::warn!("Conversion task ended abnormally: {error}");
            }
        }

        let mut slots: Vec<Option<ConversionJob>> = submitted.iter().map(|_| None).collect();
        let mut succeeded_count = 0;
        while let Some((index, job)) = rx.recv().await {
            if job.status() == JobStatus::Succeeded {
                succeeded_count += 1;
            }
            slots[index] = Some(job);
        }

        let jobs: Vec<ConversionJob> = slots
            .into_iter()
            .zip(submitted)
            .map(|(slot, (source, destination))| {
                slot.unwrap_or_else(|| {
                    let mut job = ConversionJob::new(&source, destination);
                    job.fail(ConversionError::Aborted {
                        path: source.clone(),
                    });
                    tracker.report(&source, ProgressEvent::JobFailed);
                    job
                })
            })
            .collect();

        if self.options.cleanup() {
            let protected: Vec<PathBuf> = jobs
                .iter()
                .flat_map(|job: &ConversionJob| {
                    [job.source().to_path_buf(), job.destination().to_path_buf()]
                })
                .collect();
            match workspace.ensure_removable(&protected).await {
                Ok(()) => {
                    log::debug!("Removing temporary directory ({})", workspace.root().display());
                    if let Err(error) = workspace.remove().await {
                        log::warn!("{error}");
                    }
                }
                Err(error) => log::warn!("{error}"),
            }
        }

        let result = BatchResult {
            total_files,
            succeeded_count,
            jobs,
        };
        log::info!("{}", result.summary());
        result
    }
}

/// Convert `jobs` with the production tools described by `options`.
pub async fn run_batch(jobs: Vec<ConversionJob>, options: ConversionOptions) -> BatchResult {
    BatchConverter::new(options).run(jobs).await
}
