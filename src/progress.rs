//! Progress reporting for batch conversions.
//!
//! This module provides [`ProgressCallback`] for observing a running batch
//! and [`ProgressInfo`], the snapshot delivered for every job event.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gif_video::{BatchConverter, ConversionJob, ConversionOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{}/{}] {}: {}", info.completed, info.total, info.source.display(), info.event);
//!     }
//! }
//!
//! # async fn example() {
//! let converter = BatchConverter::new(ConversionOptions::new())
//!     .with_progress(Arc::new(PrintProgress));
//! let result = converter
//!     .run(vec![ConversionJob::new("spin.gif", "dist/spin.gif")])
//!     .await;
//! println!("{}", result.summary());
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::{Duration, Instant};

use crate::job::Stage;

/// What just happened to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressEvent {
    /// The job acquired a slot and began running.
    JobStarted,
    /// A pipeline stage finished successfully.
    StageCompleted(Stage),
    /// One target format was written.
    FormatEncoded {
        /// Target format name.
        format: String,
    },
    /// One target format failed. The job continues.
    FormatFailed {
        /// Target format name.
        format: String,
    },
    /// The job reached the Succeeded state.
    JobSucceeded,
    /// The job reached the Failed state.
    JobFailed,
}

impl ProgressEvent {
    /// Returns `true` for events that end a job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::JobSucceeded | ProgressEvent::JobFailed)
    }
}

impl Display for ProgressEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProgressEvent::JobStarted => f.write_str("started"),
            ProgressEvent::StageCompleted(stage) => write!(f, "{stage} done"),
            ProgressEvent::FormatEncoded { format } => write!(f, "converted to {format}"),
            ProgressEvent::FormatFailed { format } => write!(f, "{format} failed"),
            ProgressEvent::JobSucceeded => f.write_str("conversion complete"),
            ProgressEvent::JobFailed => f.write_str("conversion failed"),
        }
    }
}

/// A snapshot of batch progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The event being reported.
    pub event: ProgressEvent,
    /// Source path of the job the event belongs to.
    pub source: PathBuf,
    /// Jobs that have reached a terminal state, including this one if the
    /// event is terminal.
    pub completed: u64,
    /// Jobs in the batch.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: Option<f32>,
    /// Wall-clock time since the batch started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on throughput so far.
    pub estimated_remaining: Option<Duration>,
}

/// Trait for receiving progress updates during a batch.
///
/// Implementations must be [`Send`] and [`Sync`] because events arrive from
/// concurrently running jobs.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// batch.
pub trait ProgressCallback: Send + Sync {
    /// Called for every job event.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Shared helper that counts finished jobs and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    completed: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: u64) -> Self {
        Self {
            callback,
            total,
            completed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Emit `event` for the job converting `source`.
    ///
    /// Terminal events advance the completed count before reporting.
    pub(crate) fn report(&self, source: &Path, event: ProgressEvent) {
        let completed = if event.is_terminal() {
            self.completed.fetch_add(1, Ordering::AcqRel) + 1
        } else {
            self.completed.load(Ordering::Acquire)
        };

        let elapsed = self.start_time.elapsed();
        let percentage =
            (self.total > 0).then(|| (completed as f32 / self.total as f32) * 100.0);
        let estimated_remaining = (completed > 0).then(|| {
            let remaining = self.total.saturating_sub(completed);
            let per_job = elapsed / completed as u32;
            per_job * remaining as u32
        });

        self.callback.on_progress(&ProgressInfo {
            event,
            source: source.to_path_buf(),
            completed,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
        });
    }
}
