//! ImageMagick / GraphicsMagick frame handling.
//!
//! [`MagickBackend`] splits an animation into numbered frame files and joins
//! frames back into a single container, by running `convert` (ImageMagick)
//! or `gm convert` (GraphicsMagick). Both accept the same arguments for the
//! operations used here.

use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::process::{ProcessFailure, run_tool};
use crate::template::FramePathTemplate;
use crate::toolchain::{ComposeRequest, FrameComposer, FrameSplitter};

/// Which image tool family to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageBackend {
    /// ImageMagick's `convert`. This is the default.
    #[default]
    ImageMagick,
    /// GraphicsMagick's `gm convert`.
    GraphicsMagick,
}

impl ImageBackend {
    /// Map the `imageMagick` configuration flag to a backend.
    pub fn from_image_magick_flag(image_magick: bool) -> Self {
        if image_magick {
            ImageBackend::ImageMagick
        } else {
            ImageBackend::GraphicsMagick
        }
    }

    /// The command run when no explicit program is configured.
    pub fn default_program(self) -> &'static str {
        match self {
            ImageBackend::ImageMagick => "convert",
            ImageBackend::GraphicsMagick => "gm convert",
        }
    }
}

/// Frame splitter and composer backed by an ImageMagick-compatible CLI.
#[derive(Debug, Clone)]
pub struct MagickBackend {
    program: String,
}

impl Default for MagickBackend {
    fn default() -> Self {
        Self::for_backend(ImageBackend::default())
    }
}

impl MagickBackend {
    /// Run `program`, which may include a subcommand (`gm convert`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use the default program of `backend`.
    pub fn for_backend(backend: ImageBackend) -> Self {
        Self::new(backend.default_program())
    }

    pub(crate) fn split_arguments(
        source: &Path,
        template: &FramePathTemplate,
    ) -> Vec<OsString> {
        vec![
            source.as_os_str().to_os_string(),
            "+adjoin".into(),
            template.pattern().into_os_string(),
        ]
    }

    pub(crate) fn compose_arguments(request: &ComposeRequest) -> Vec<OsString> {
        let mut arguments = Vec::with_capacity(request.frames.len() * 3 + 3);
        for frame in &request.frames {
            arguments.push("-delay".into());
            arguments.push(frame.delay.to_string().into());
            arguments.push(frame.path.as_os_str().to_os_string());
        }
        if request.optimize_layers {
            arguments.push("-layers".into());
            arguments.push("Optimize".into());
        }
        arguments.push(request.output.as_os_str().to_os_string());
        arguments
    }
}

#[async_trait]
impl FrameSplitter for MagickBackend {
    async fn split(
        &self,
        source: &Path,
        template: &FramePathTemplate,
    ) -> Result<(), ConversionError> {
        let arguments = Self::split_arguments(source, template);
        run_tool(&self.program, &arguments)
            .await
            .map_err(|failure| match failure {
                ProcessFailure::Launch { program, source: error } => {
                    ConversionError::ToolLaunch {
                        program,
                        source: error,
                    }
                }
                exit => ConversionError::FrameExtraction {
                    path: source.to_path_buf(),
                    reason: exit.to_string(),
                },
            })
    }
}

#[async_trait]
impl FrameComposer for MagickBackend {
    async fn compose(&self, request: &ComposeRequest) -> Result<(), ConversionError> {
        let arguments = Self::compose_arguments(request);
        run_tool(&self.program, &arguments)
            .await
            .map_err(|failure| match failure {
                ProcessFailure::Launch { program, source: error } => {
                    ConversionError::ToolLaunch {
                        program,
                        source: error,
                    }
                }
                exit => ConversionError::Assembly {
                    path: request.output.clone(),
                    reason: exit.to_string(),
                },
            })
    }
}
