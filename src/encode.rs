//! Multi-format encoding stage.
//!
//! Encodes the intermediate container once per configured target, one
//! format at a time. A failed format is recorded and the remaining formats
//! are still attempted; this stage never fails the job.

use std::path::{Path, PathBuf};

use crate::error::ConversionError;
use crate::target::EncodingTargets;
use crate::toolchain::{EncodeRequest, VideoEncoder};

/// Result of encoding one target format.
#[derive(Debug)]
pub struct FormatOutcome {
    /// Target format name.
    pub format: String,
    /// Output file that was (or would have been) written.
    pub output: PathBuf,
    /// Why the encode failed, if it did.
    pub error: Option<ConversionError>,
}

impl FormatOutcome {
    /// Returns `true` if the output was written.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// The output path for `format`: `destination` with its extension replaced.
pub fn output_path(destination: &Path, format: &str) -> PathBuf {
    destination.with_extension(format)
}

/// Encode `container` into every target, in order.
///
/// `on_outcome` is called as each format finishes, successful or not.
pub async fn encode_formats(
    encoder: &dyn VideoEncoder,
    container: &Path,
    destination: &Path,
    targets: &EncodingTargets,
    mut on_outcome: impl FnMut(&FormatOutcome) + Send,
) -> Vec<FormatOutcome> {
    let mut outcomes = Vec::with_capacity(targets.len());

    for target in targets {
        let request = EncodeRequest {
            format: target.format.clone(),
            input: container.to_path_buf(),
            output: output_path(destination, &target.format),
            arguments: target.arguments(),
            no_audio: true,
        };

        let error = match encoder.encode(&request).await {
            Ok(()) => {
                log::debug!(
                    "Converted {} to {}",
                    container.display(),
                    request.output.display(),
                );
                None
            }
            Err(error) => {
                log::warn!("{error} (output {})", request.output.display());
                // A failed format never ends the job.
                Some(if error.is_job_fatal() {
                    ConversionError::Encode {
                        format: target.format.clone(),
                        path: container.to_path_buf(),
                        reason: error.to_string(),
                    }
                } else {
                    error
                })
            }
        };

        let outcome = FormatOutcome {
            format: request.format,
            output: request.output,
            error,
        };
        on_outcome(&outcome);
        outcomes.push(outcome);
    }

    outcomes
}
