//! Animated image metadata.
//!
//! [`ImageMetadata`] describes whether an input decodes at all, whether it is
//! animated, and how long each frame is displayed. The default inspector,
//! [`GifInspector`], reads GIF headers and graphic control blocks with the
//! [`gif`](https://crates.io/crates/gif) crate.
//!
//! # Example
//!
//! ```no_run
//! use gif_video::{GifInspector, ImageInspector};
//!
//! let bytes = std::fs::read("input.gif").unwrap();
//! let metadata = GifInspector.inspect(&bytes);
//! if metadata.is_animated() {
//!     for frame in &metadata.frames {
//!         println!("frame {} shows for {} ms", frame.index, frame.delay_milliseconds);
//!     }
//! }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

use gif::{ColorOutput, DecodeOptions};
use serde::Serialize;

use crate::error::ConversionError;

/// Display timing of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameTiming {
    /// Zero-based position of the frame in the animation.
    pub index: usize,
    /// How long the frame is shown, in milliseconds.
    pub delay_milliseconds: u32,
}

/// Result of inspecting a candidate input file.
///
/// Malformed input is described here (`valid == false`) rather than
/// reported as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    /// `true` if the bytes decode as an image.
    pub valid: bool,
    /// `true` if the image has more than one frame.
    pub animated: bool,
    /// Logical screen width in pixels.
    pub width: u32,
    /// Logical screen height in pixels.
    pub height: u32,
    /// Per-frame timing, in ascending index order.
    pub frames: Vec<FrameTiming>,
}

impl ImageMetadata {
    /// Metadata for input that could not be decoded.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Returns `true` if the image is both valid and animated.
    pub fn is_animated(&self) -> bool {
        self.valid && self.animated
    }

    /// Total display time of one loop, in milliseconds.
    pub fn total_duration_milliseconds(&self) -> u64 {
        self.frames
            .iter()
            .map(|frame| u64::from(frame.delay_milliseconds))
            .sum()
    }
}

impl Display for ImageMetadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if !self.valid {
            return writeln!(f, "Not a valid image");
        }
        writeln!(f, "Dimensions: {}x{}", self.width, self.height)?;
        writeln!(f, "Animated: {}", if self.animated { "yes" } else { "no" })?;
        writeln!(
            f,
            "Frames: {} ({} ms per loop)",
            self.frames.len(),
            self.total_duration_milliseconds(),
        )?;
        for frame in &self.frames {
            writeln!(f, "  #{:<4} {} ms", frame.index, frame.delay_milliseconds)?;
        }
        Ok(())
    }
}

/// Decodes raw file bytes into [`ImageMetadata`].
///
/// Implementations must never fail: undecodable input is reported through
/// [`ImageMetadata::valid`].
pub trait ImageInspector: Send + Sync {
    /// Inspect the bytes of a candidate input file.
    fn inspect(&self, bytes: &[u8]) -> ImageMetadata;
}

/// GIF metadata reader backed by the `gif` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifInspector;

impl ImageInspector for GifInspector {
    fn inspect(&self, bytes: &[u8]) -> ImageMetadata {
        let mut options = DecodeOptions::new();
        // Palette indices are enough; skip RGBA expansion.
        options.set_color_output(ColorOutput::Indexed);

        let mut decoder = match options.read_info(bytes) {
            Ok(decoder) => decoder,
            Err(error) => {
                log::debug!("GIF header rejected: {error}");
                return ImageMetadata::invalid();
            }
        };

        let width = u32::from(decoder.width());
        let height = u32::from(decoder.height());
        let mut frames = Vec::new();

        // Frame headers carry the delays; pixel data is skipped, so frame
        // size never counts against the decoder's memory limit.
        loop {
            match decoder.next_frame_info() {
                Ok(Some(frame)) => frames.push(FrameTiming {
                    index: frames.len(),
                    // GIF delays are stored in hundredths of a second.
                    delay_milliseconds: u32::from(frame.delay) * 10,
                }),
                Ok(None) => break,
                Err(error) => {
                    log::debug!("GIF frame {} rejected: {error}", frames.len());
                    return ImageMetadata::invalid();
                }
            }
        }

        if frames.is_empty() {
            return ImageMetadata::invalid();
        }

        ImageMetadata {
            valid: true,
            animated: frames.len() > 1,
            width,
            height,
            frames,
        }
    }
}

/// Read `path` and inspect its contents on a blocking thread.
///
/// # Errors
///
/// Returns [`ConversionError::Io`] if the file cannot be read. Undecodable
/// content is not an error.
pub async fn inspect_file(
    inspector: Arc<dyn ImageInspector>,
    path: &Path,
) -> Result<ImageMetadata, ConversionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|error| ConversionError::io(path, error))?;

    tokio::task::spawn_blocking(move || inspector.inspect(&bytes))
        .await
        .map_err(|error| {
            log::debug!("Inspector panicked on {}: {error}", path.display());
            ConversionError::InvalidInput {
                path: path.to_path_buf(),
            }
        })
}
