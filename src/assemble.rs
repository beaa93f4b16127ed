//! Frame assembly stage.
//!
//! Rebuilds the extracted frames into one intermediate container, giving
//! each frame its own display duration. The image backend measures delays
//! in ticks (hundredths of a second by default) while inspection reports
//! milliseconds; [`FrameDelay`] converts between them without rounding.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use crate::error::ConversionError;
use crate::metadata::FrameTiming;
use crate::template::FramePathTemplate;
use crate::toolchain::{ComposeFrame, ComposeRequest, FrameComposer};
use crate::workspace::ensure_directory;

/// Default tick rate of the image backend's `-delay` option.
const CENTISECONDS_PER_SECOND: u32 = 100;
const MILLISECONDS_PER_SECOND: u32 = 1000;

/// Exact display duration of one frame.
///
/// Stored as `ticks` at `ticks_per_second`. Whole centisecond values use
/// the backend's native unit; anything finer keeps millisecond ticks and is
/// written as `<ticks>x1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameDelay {
    ticks: u32,
    ticks_per_second: u32,
}

impl FrameDelay {
    /// Convert a delay in milliseconds.
    ///
    /// ```
    /// use gif_video::FrameDelay;
    ///
    /// assert_eq!(FrameDelay::from_milliseconds(100).centiseconds(), Some(10));
    /// assert_eq!(FrameDelay::from_milliseconds(100).to_string(), "10");
    /// assert_eq!(FrameDelay::from_milliseconds(105).to_string(), "105x1000");
    /// ```
    pub fn from_milliseconds(milliseconds: u32) -> Self {
        if milliseconds % 10 == 0 {
            Self {
                ticks: milliseconds / 10,
                ticks_per_second: CENTISECONDS_PER_SECOND,
            }
        } else {
            Self {
                ticks: milliseconds,
                ticks_per_second: MILLISECONDS_PER_SECOND,
            }
        }
    }

    /// The delay in centiseconds, if it is a whole number of them.
    pub fn centiseconds(&self) -> Option<u32> {
        (self.ticks_per_second == CENTISECONDS_PER_SECOND).then_some(self.ticks)
    }

    /// The delay in milliseconds.
    pub fn milliseconds(&self) -> u32 {
        match self.ticks_per_second {
            CENTISECONDS_PER_SECOND => self.ticks * 10,
            _ => self.ticks,
        }
    }
}

impl Display for FrameDelay {
    /// Formats as a `-delay` argument.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.ticks_per_second == CENTISECONDS_PER_SECOND {
            write!(f, "{}", self.ticks)
        } else {
            write!(f, "{}x{}", self.ticks, self.ticks_per_second)
        }
    }
}

/// Build the composition request for `frames`, sorted by frame index.
pub fn compose_request(template: &FramePathTemplate, frames: &[FrameTiming]) -> ComposeRequest {
    let mut ordered: Vec<&FrameTiming> = frames.iter().collect();
    ordered.sort_by_key(|frame| frame.index);

    ComposeRequest {
        frames: ordered
            .into_iter()
            .map(|frame| ComposeFrame {
                index: frame.index,
                path: template.frame_path(frame.index),
                delay: FrameDelay::from_milliseconds(frame.delay_milliseconds),
            })
            .collect(),
        optimize_layers: true,
        output: template.container_path(),
    }
}

/// Join the frames named by `template` into the intermediate container.
///
/// Also creates the parent directory of `destination`, where the encoded
/// outputs will be written.
///
/// # Errors
///
/// - [`ConversionError::Io`] if a directory cannot be created.
/// - [`ConversionError::ToolLaunch`] if the image tool cannot be started.
/// - [`ConversionError::Assembly`] if there are no frames or the composer
///   fails.
pub async fn assemble_frames(
    composer: &dyn FrameComposer,
    template: &FramePathTemplate,
    frames: &[FrameTiming],
    destination: &Path,
) -> Result<PathBuf, ConversionError> {
    let request = compose_request(template, frames);
    if request.frames.is_empty() {
        return Err(ConversionError::Assembly {
            path: request.output,
            reason: "no frames to assemble".to_string(),
        });
    }

    if let Some(parent) = destination.parent() {
        ensure_directory(parent).await?;
    }
    ensure_directory(template.directory()).await?;

    composer
        .compose(&request)
        .await
        .map_err(|error| match error {
            ConversionError::Assembly { .. } | ConversionError::ToolLaunch { .. } => error,
            other => ConversionError::Assembly {
                path: request.output.clone(),
                reason: other.to_string(),
            },
        })?;

    log::debug!(
        "Merged {} frames into {}",
        request.frames.len(),
        request.output.display(),
    );
    Ok(request.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_conversion_is_per_frame_and_exact() {
        assert_eq!(FrameDelay::from_milliseconds(100).centiseconds(), Some(10));
        assert_eq!(FrameDelay::from_milliseconds(0).centiseconds(), Some(0));
        assert_eq!(FrameDelay::from_milliseconds(70).to_string(), "7");
        assert_eq!(FrameDelay::from_milliseconds(33).centiseconds(), None);
        assert_eq!(FrameDelay::from_milliseconds(33).milliseconds(), 33);
        assert_eq!(FrameDelay::from_milliseconds(1230).milliseconds(), 1230);
    }

    #[test]
    fn request_orders_frames_by_index() {
        let template = FramePathTemplate::new("work", "clip", "gif");
        let frames = [
            FrameTiming {
                index: 2,
                delay_milliseconds: 30,
            },
            FrameTiming {
                index: 0,
                delay_milliseconds: 10,
            },
            FrameTiming {
                index: 1,
                delay_milliseconds: 20,
            },
        ];
        let request = compose_request(&template, &frames);
        let order: Vec<(usize, String)> = request
            .frames
            .iter()
            .map(|f| (f.index, f.delay.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![(0, "1".into()), (1, "2".into()), (2, "3".into())],
        );
        assert_eq!(request.frames[1].path, template.frame_path(1));
        assert!(request.optimize_layers);
        assert_eq!(request.output, template.container_path());
    }
}
