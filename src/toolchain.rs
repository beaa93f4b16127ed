//! Adapter seams for the external decode, image, and video tools.
//!
//! The conversion pipeline never touches pixels itself. It drives four
//! collaborators through the traits in this module:
//!
//! | Trait | Production implementation |
//! |-------|---------------------------|
//! | [`ImageInspector`] | [`GifInspector`] (the `gif` crate) |
//! | [`FrameSplitter`] | [`MagickBackend`] (`convert` / `gm convert`) |
//! | [`FrameComposer`] | [`MagickBackend`] |
//! | [`VideoEncoder`] | [`FfmpegEncoder`] (`ffmpeg`) |
//!
//! A [`Toolchain`] bundles one of each and is shared by every job of a batch.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::assemble::FrameDelay;
use crate::config::ConversionOptions;
use crate::error::ConversionError;
use crate::ffmpeg::FfmpegEncoder;
use crate::magick::MagickBackend;
use crate::metadata::{GifInspector, ImageInspector};
use crate::template::FramePathTemplate;

/// One frame of a composition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeFrame {
    /// Frame index in the source animation.
    pub index: usize,
    /// Extracted single-frame image.
    pub path: PathBuf,
    /// How long the frame is displayed.
    pub delay: FrameDelay,
}

/// Everything the composer needs to write one intermediate container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRequest {
    /// Frames in ascending index order.
    pub frames: Vec<ComposeFrame>,
    /// Run a layer-optimization pass before writing.
    pub optimize_layers: bool,
    /// Container path to write.
    pub output: PathBuf,
}

/// One encode of the intermediate container into a target format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    /// Target format name.
    pub format: String,
    /// Intermediate container to read.
    pub input: PathBuf,
    /// Final output file.
    pub output: PathBuf,
    /// Encoder arguments, already expanded from the target's option strings.
    pub arguments: Vec<String>,
    /// Drop any audio track.
    pub no_audio: bool,
}

/// Splits an animated image into one file per frame.
#[async_trait]
pub trait FrameSplitter: Send + Sync {
    /// Write every frame of `source` to `template`'s frame paths.
    async fn split(&self, source: &Path, template: &FramePathTemplate)
    -> Result<(), ConversionError>;
}

/// Joins frames with per-frame durations into a single container.
#[async_trait]
pub trait FrameComposer: Send + Sync {
    /// Write `request.output` from `request.frames`.
    async fn compose(&self, request: &ComposeRequest) -> Result<(), ConversionError>;
}

/// Transcodes the intermediate container into a target format.
///
/// Each call reports completion or failure exactly once.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Run one encode to completion.
    async fn encode(&self, request: &EncodeRequest) -> Result<(), ConversionError>;
}

/// The set of collaborators a batch runs with.
#[derive(Clone)]
pub struct Toolchain {
    pub(crate) inspector: Arc<dyn ImageInspector>,
    pub(crate) splitter: Arc<dyn FrameSplitter>,
    pub(crate) composer: Arc<dyn FrameComposer>,
    pub(crate) encoder: Arc<dyn VideoEncoder>,
}

impl Debug for Toolchain {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}

impl Toolchain {
    /// Assemble a toolchain from explicit adapters.
    pub fn new(
        inspector: Arc<dyn ImageInspector>,
        splitter: Arc<dyn FrameSplitter>,
        composer: Arc<dyn FrameComposer>,
        encoder: Arc<dyn VideoEncoder>,
    ) -> Self {
        Self {
            inspector,
            splitter,
            composer,
            encoder,
        }
    }

    /// The production toolchain described by `options`: GIF inspection,
    /// ImageMagick or GraphicsMagick frame handling, and FFmpeg encoding.
    pub fn from_options(options: &ConversionOptions) -> Self {
        let magick = Arc::new(MagickBackend::new(options.magick_program()));
        Self {
            inspector: Arc::new(GifInspector),
            splitter: magick.clone(),
            composer: magick,
            encoder: Arc::new(FfmpegEncoder::new(
                options.ffmpeg_program.clone(),
                options.ffmpeg_log_level,
            )),
        }
    }

    /// Replace the inspector.
    #[must_use]
    pub fn with_inspector(mut self, inspector: Arc<dyn ImageInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Replace the frame splitter.
    #[must_use]
    pub fn with_splitter(mut self, splitter: Arc<dyn FrameSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    /// Replace the frame composer.
    #[must_use]
    pub fn with_composer(mut self, composer: Arc<dyn FrameComposer>) -> Self {
        self.composer = composer;
        self
    }

    /// Replace the video encoder.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn VideoEncoder>) -> Self {
        self.encoder = encoder;
        self
    }
}
