//! Per-input conversion jobs.
//!
//! A [`ConversionJob`] tracks one source file through the pipeline
//! (`Pending → Running → Succeeded | Failed`). [`JobRunner`] drives the four
//! stages in order, stopping at the first stage that fails. Encoding never
//! fails a job: once the container is assembled the job succeeds, and
//! per-format failures are recorded in [`ConversionJob::outputs`].
//!
//! # Example
//!
//! ```no_run
//! use gif_video::{ConversionJob, ConversionOptions, JobRunner, JobStatus};
//!
//! # async fn example() {
//! let options = ConversionOptions::new();
//! let runner = JobRunner::from_options(&options);
//! let mut job = ConversionJob::new("spin.gif", "dist/spin.gif");
//! runner.run(&mut job).await;
//! if job.status() == JobStatus::Failed {
//!     eprintln!("{}", job.failure().unwrap());
//! }
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assemble::assemble_frames;
use crate::config::ConversionOptions;
use crate::encode::{FormatOutcome, encode_formats};
use crate::error::ConversionError;
use crate::extract::extract_frames;
use crate::metadata::inspect_file;
use crate::progress::{NoOpProgress, ProgressCallback, ProgressEvent, ProgressTracker};
use crate::target::EncodingTargets;
use crate::toolchain::Toolchain;
use crate::workspace::Workspace;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Waiting for a free slot.
    Pending,
    /// Pipeline in progress.
    Running,
    /// The intermediate container was assembled and every format attempted.
    Succeeded,
    /// Inspection, extraction, or assembly failed.
    Failed,
}

impl JobStatus {
    /// Returns `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading the input and its frame timing.
    Inspect,
    /// Splitting the input into frame files.
    Extract,
    /// Joining frames into the intermediate container.
    Assemble,
    /// Encoding every target format.
    Encode,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Stage::Inspect => "metadata parsing",
            Stage::Extract => "frame extraction",
            Stage::Assemble => "frame assembly",
            Stage::Encode => "video encoding",
        })
    }
}

/// One source file converted into every target format.
#[derive(Debug)]
pub struct ConversionJob {
    source: PathBuf,
    destination: PathBuf,
    status: JobStatus,
    failure: Option<ConversionError>,
    outputs: Vec<FormatOutcome>,
}

impl ConversionJob {
    /// Create a pending job. Each output replaces the extension of
    /// `destination` with its format name.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            status: JobStatus::Pending,
            failure: None,
            outputs: Vec::new(),
        }
    }

    /// Input file.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Base output path.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Current state.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Why the job failed, once it has.
    pub fn failure(&self) -> Option<&ConversionError> {
        self.failure.as_ref()
    }

    /// Per-format results, in encode order.
    pub fn outputs(&self) -> &[FormatOutcome] {
        &self.outputs
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::Running;
        self.failure = None;
        self.outputs.clear();
    }

    pub(crate) fn succeed(&mut self, outputs: Vec<FormatOutcome>) {
        self.status = JobStatus::Succeeded;
        self.outputs = outputs;
    }

    pub(crate) fn fail(&mut self, error: ConversionError) {
        self.status = JobStatus::Failed;
        self.failure = Some(error);
    }
}

/// Runs the conversion pipeline for single jobs.
///
/// Cheap to share: a batch wraps one runner in an [`Arc`] and hands it to
/// every task.
pub struct JobRunner {
    toolchain: Toolchain,
    workspace: Workspace,
    targets: EncodingTargets,
    progress: Arc<ProgressTracker>,
}

impl JobRunner {
    /// Create a runner from explicit parts.
    pub fn new(toolchain: Toolchain, workspace: Workspace, targets: EncodingTargets) -> Self {
        Self {
            toolchain,
            workspace,
            targets,
            progress: Arc::new(ProgressTracker::new(Arc::new(NoOpProgress), 1)),
        }
    }

    /// Create a runner with the production toolchain described by `options`.
    pub fn from_options(options: &ConversionOptions) -> Self {
        Self::new(
            Toolchain::from_options(options),
            Workspace::new(options.temp_dir()),
            options.targets().clone(),
        )
    }

    /// Report job events to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Arc::new(ProgressTracker::new(callback, 1));
        self
    }

    pub(crate) fn with_tracker(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.progress = tracker;
        self
    }

    /// Run `job` to a terminal state.
    ///
    /// Never returns an error: a failing stage marks the job
    /// [`Failed`](JobStatus::Failed) and records the cause. Only
    /// [`Pending`](JobStatus::Pending) jobs are run; any other job is left
    /// untouched.
    pub async fn run(&self, job: &mut ConversionJob) {
        if job.status() != JobStatus::Pending {
            log::debug!(
                "{} (Skipped, job is already {:?})",
                job.source.display(),
                job.status()
            );
            return;
        }
        job.start();
        self.progress.report(&job.source, ProgressEvent::JobStarted);

        match self.pipeline(&job.source, &job.destination).await {
            Ok(outputs) => {
                job.succeed(outputs);
                log::debug!("{} (Conversion complete)", job.source.display());
                self.progress.report(&job.source, ProgressEvent::JobSucceeded);
            }
            Err(error) => {
                log::warn!("{} (Conversion failed): {error}", job.source.display());
                job.fail(error);
                self.progress.report(&job.source, ProgressEvent::JobFailed);
            }
        }
    }

    async fn pipeline(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<Vec<FormatOutcome>, ConversionError> {
        let metadata = inspect_file(self.toolchain.inspector.clone(), source).await?;
        log::debug!("{} (Parsed metadata)", source.display());
        self.stage_completed(source, Stage::Inspect);

        let template = extract_frames(
            self.toolchain.splitter.as_ref(),
            &self.workspace,
            source,
            &metadata,
        )
        .await?;
        self.stage_completed(source, Stage::Extract);

        let container = assemble_frames(
            self.toolchain.composer.as_ref(),
            &template,
            &metadata.frames,
            destination,
        )
        .await?;
        self.stage_completed(source, Stage::Assemble);

        let outputs = encode_formats(
            self.toolchain.encoder.as_ref(),
            &container,
            destination,
            &self.targets,
            |outcome| {
                let event = if outcome.succeeded() {
                    ProgressEvent::FormatEncoded {
                        format: outcome.format.clone(),
                    }
                } else {
                    ProgressEvent::FormatFailed {
                        format: outcome.format.clone(),
                    }
                };
                self.progress.report(source, event);
            },
        )
        .await;
        self.stage_completed(source, Stage::Encode);

        Ok(outputs)
    }

    fn stage_completed(&self, source: &Path, stage: Stage) {
        self.progress
            .report(source, ProgressEvent::StageCompleted(stage));
    }
}
