//! Error types for the `gif-video` crate.
//!
//! This module defines [`ConversionError`], the unified error type returned by
//! every fallible operation in the crate. Errors carry the offending path and
//! the upstream cause so a warning can be printed without extra context at the
//! call site.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// The unified error type for all `gif-video` operations.
///
/// Most variants are fatal to the job that raised them but never to the
/// batch. [`Encode`](ConversionError::Encode) and
/// [`Cleanup`](ConversionError::Cleanup) are recorded and logged only.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// A file or directory could not be read, written, or created.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// The input could not be decoded as an image.
    #[error("Image is not valid: {path}")]
    InvalidInput {
        /// Source path of the job.
        path: PathBuf,
    },

    /// The input is a valid image but has a single frame.
    #[error("Image is not animated: {path}")]
    NotAnimated {
        /// Source path of the job.
        path: PathBuf,
    },

    /// The image backend failed to split the input into frames.
    #[error("Frame extraction failed for {path}: {reason}")]
    FrameExtraction {
        /// Source path of the job.
        path: PathBuf,
        /// Reason reported by the backend.
        reason: String,
    },

    /// The image backend failed to write the intermediate container.
    #[error("Frame assembly failed for {path}: {reason}")]
    Assembly {
        /// Container path that could not be written.
        path: PathBuf,
        /// Reason reported by the backend.
        reason: String,
    },

    /// One target format failed to encode.
    #[error("Encoding {path} to {format} failed: {reason}")]
    Encode {
        /// Target format name (e.g. `mp4`).
        format: String,
        /// Intermediate container that was being encoded.
        path: PathBuf,
        /// Reason reported by the encoder.
        reason: String,
    },

    /// The temporary workspace could not be removed.
    #[error("Failed to remove temporary directory {path}: {source}")]
    Cleanup {
        /// Workspace root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// The workspace was left in place because removing it would delete
    /// files that are not intermediates.
    #[error("Refusing to remove temporary directory {path}: {reason}")]
    CleanupRefused {
        /// Workspace root.
        path: PathBuf,
        /// What the workspace would have taken with it.
        reason: String,
    },

    /// An external program could not be started at all.
    #[error("Failed to launch {program}: {source}")]
    ToolLaunch {
        /// Program name or path.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// The task running a job panicked or was cancelled before finishing.
    #[error("Conversion task for {path} did not complete")]
    Aborted {
        /// Source path of the job.
        path: PathBuf,
    },

    /// Options could not be parsed or are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ConversionError {
    /// Build an [`Io`](ConversionError::Io) error for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: IoError) -> Self {
        ConversionError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this error ends the job that raised it.
    ///
    /// Per-format encode failures and workspace cleanup failures are
    /// reported but never change a job's outcome.
    pub fn is_job_fatal(&self) -> bool {
        !matches!(
            self,
            ConversionError::Encode { .. }
                | ConversionError::Cleanup { .. }
                | ConversionError::CleanupRefused { .. }
        )
    }
}
