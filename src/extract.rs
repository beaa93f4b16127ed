//! Frame extraction stage.
//!
//! Checks that the inspected input is a valid animation, then has the
//! [`FrameSplitter`] write one file per frame into the job's directory in
//! the workspace.

use std::path::Path;

use crate::error::ConversionError;
use crate::metadata::ImageMetadata;
use crate::template::FramePathTemplate;
use crate::toolchain::FrameSplitter;
use crate::workspace::{Workspace, ensure_directory};

/// Split `source` into numbered frames under `workspace`.
///
/// Returns the template naming the written frames.
///
/// # Errors
///
/// - [`ConversionError::InvalidInput`] if `metadata.valid` is false.
/// - [`ConversionError::NotAnimated`] if the image has a single frame.
/// - [`ConversionError::Io`] if the job directory cannot be created.
/// - [`ConversionError::ToolLaunch`] if the image tool cannot be started.
/// - [`ConversionError::FrameExtraction`] if the splitter fails.
///
/// Nothing is written to disk when the input is rejected.
pub async fn extract_frames(
    splitter: &dyn FrameSplitter,
    workspace: &Workspace,
    source: &Path,
    metadata: &ImageMetadata,
) -> Result<FramePathTemplate, ConversionError> {
    if !metadata.valid {
        return Err(ConversionError::InvalidInput {
            path: source.to_path_buf(),
        });
    }
    if !metadata.animated {
        return Err(ConversionError::NotAnimated {
            path: source.to_path_buf(),
        });
    }

    let template = workspace.job_template(source);
    ensure_directory(template.directory()).await?;

    splitter
        .split(source, &template)
        .await
        .map_err(|error| match error {
            ConversionError::FrameExtraction { .. }
            | ConversionError::Io { .. }
            | ConversionError::ToolLaunch { .. } => error,
            other => ConversionError::FrameExtraction {
                path: source.to_path_buf(),
                reason: other.to_string(),
            },
        })?;

    log::debug!(
        "Extracted {} frames of {} to {}",
        metadata.frames.len(),
        source.display(),
        template.directory().display(),
    );
    Ok(template)
}
