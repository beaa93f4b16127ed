//! Conversion configuration.
//!
//! [`ConversionOptions`] is a builder carrying the concurrency limit, image
//! backend, workspace location, cleanup policy, and output targets through a
//! batch without threading each value through every function signature.
//!
//! Options can also be loaded from a JSON file:
//!
//! ```json
//! {
//!   "limit": 4,
//!   "imageMagick": true,
//!   "tmp": "./.tmp",
//!   "cleanup": true,
//!   "ffmpeg": {
//!     "mp4": ["-vcodec libx264", "-pix_fmt yuv420p"],
//!     "webm": ["-c:v libvpx", "-crf 10"]
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use gif_video::{ConversionOptions, ImageBackend};
//!
//! let options = ConversionOptions::new()
//!     .with_limit(2)
//!     .with_backend(ImageBackend::GraphicsMagick)
//!     .with_temp_dir("/tmp/gif-video")
//!     .with_cleanup(false);
//! assert_eq!(options.limit(), 2);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConversionError;
use crate::ffmpeg::{DEFAULT_FFMPEG_PROGRAM, FfmpegLogLevel};
use crate::magick::ImageBackend;
use crate::target::EncodingTargets;

/// Workspace root used when none is configured.
pub const DEFAULT_TEMP_DIR: &str = "./.tmp";

/// Settings for one batch conversion.
///
/// Defaults: one job per CPU, ImageMagick, `./.tmp`, cleanup enabled, and
/// MP4/OGV/WebM output.
#[derive(Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Maximum number of jobs running at once. Always at least 1.
    pub(crate) limit: usize,
    /// Which image tool splits and joins frames.
    pub(crate) backend: ImageBackend,
    /// Explicit image tool command, overriding the backend default.
    pub(crate) magick_program: Option<String>,
    /// Root of the shared temporary workspace.
    pub(crate) temp_dir: PathBuf,
    /// Remove the workspace once the batch has drained.
    pub(crate) cleanup: bool,
    /// Output formats, encoded in order.
    pub(crate) targets: EncodingTargets,
    /// FFmpeg executable.
    pub(crate) ffmpeg_program: String,
    /// FFmpeg console verbosity.
    pub(crate) ffmpeg_log_level: FfmpegLogLevel,
}

impl Debug for ConversionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConversionOptions")
            .field("limit", &self.limit)
            .field("backend", &self.backend)
            .field("temp_dir", &self.temp_dir)
            .field("cleanup", &self.cleanup)
            .field("formats", &self.targets.formats())
            .finish()
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            limit: num_cpus::get().max(1),
            backend: ImageBackend::default(),
            magick_program: None,
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            cleanup: true,
            targets: EncodingTargets::default(),
            ffmpeg_program: DEFAULT_FFMPEG_PROGRAM.to_string(),
            ffmpeg_log_level: FfmpegLogLevel::default(),
        }
    }

    /// Set the maximum number of concurrently running jobs.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Select the image backend used to split and join frames.
    #[must_use]
    pub fn with_backend(mut self, backend: ImageBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Use an explicit image tool command (e.g. `magick` or
    /// `/opt/gm/bin/gm convert`) instead of the backend default.
    #[must_use]
    pub fn with_magick_program(mut self, program: impl Into<String>) -> Self {
        self.magick_program = Some(program.into());
        self
    }

    /// Set the root of the shared temporary workspace.
    #[must_use]
    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = path.into();
        self
    }

    /// Control whether the workspace is deleted after the batch.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Replace the output targets.
    #[must_use]
    pub fn with_targets(mut self, targets: EncodingTargets) -> Self {
        self.targets = targets;
        self
    }

    /// Use a specific FFmpeg executable.
    #[must_use]
    pub fn with_ffmpeg_program(mut self, program: impl Into<String>) -> Self {
        self.ffmpeg_program = program.into();
        self
    }

    /// Set FFmpeg's own console verbosity.
    #[must_use]
    pub fn with_ffmpeg_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.ffmpeg_log_level = level;
        self
    }

    /// Maximum number of concurrently running jobs.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Selected image backend.
    pub fn backend(&self) -> ImageBackend {
        self.backend
    }

    /// Workspace root.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Whether the workspace is removed after the batch.
    pub fn cleanup(&self) -> bool {
        self.cleanup
    }

    /// Output targets in encode order.
    pub fn targets(&self) -> &EncodingTargets {
        &self.targets
    }

    /// The image tool command to run.
    pub fn magick_program(&self) -> String {
        self.magick_program
            .clone()
            .unwrap_or_else(|| self.backend.default_program().to_string())
    }

    /// Parse options from a JSON document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::InvalidConfiguration`] for malformed JSON,
    /// unknown keys, or an empty `ffmpeg` map.
    pub fn from_json_str(json: &str) -> Result<Self, ConversionError> {
        let raw: RawOptions = serde_json::from_str(json)
            .map_err(|error| ConversionError::InvalidConfiguration(error.to_string()))?;
        raw.into_options()
    }

    /// Read and parse a JSON options file.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`from_json_str`](ConversionOptions::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConversionError> {
        let path = path.as_ref();
        let json =
            std::fs::read_to_string(path).map_err(|error| ConversionError::io(path, error))?;
        Self::from_json_str(&json)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct RawOptions {
    limit: Option<usize>,
    image_magick: Option<bool>,
    magick_path: Option<String>,
    tmp: Option<PathBuf>,
    cleanup: Option<bool>,
    ffmpeg: Option<EncodingTargets>,
    ffmpeg_path: Option<String>,
    ffmpeg_log_level: Option<String>,
}

impl RawOptions {
    fn into_options(self) -> Result<ConversionOptions, ConversionError> {
        let mut options = ConversionOptions::new();
        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err(ConversionError::InvalidConfiguration(
                    "limit must be greater than zero".to_string(),
                ));
            }
            options = options.with_limit(limit);
        }
        if let Some(image_magick) = self.image_magick {
            options = options.with_backend(ImageBackend::from_image_magick_flag(image_magick));
        }
        if let Some(program) = self.magick_path {
            options = options.with_magick_program(program);
        }
        if let Some(tmp) = self.tmp {
            options = options.with_temp_dir(tmp);
        }
        if let Some(cleanup) = self.cleanup {
            options = options.with_cleanup(cleanup);
        }
        if let Some(targets) = self.ffmpeg {
            if targets.is_empty() {
                return Err(ConversionError::InvalidConfiguration(
                    "ffmpeg must name at least one output format".to_string(),
                ));
            }
            options = options.with_targets(targets);
        }
        if let Some(program) = self.ffmpeg_path {
            options = options.with_ffmpeg_program(program);
        }
        if let Some(level) = self.ffmpeg_log_level {
            options = options.with_ffmpeg_log_level(level.parse()?);
        }
        Ok(options)
    }
}
