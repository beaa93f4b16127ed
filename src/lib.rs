//! # gif-video
//!
//! Batch-convert animated GIFs into web video: every input becomes an MP4,
//! an Ogg Theora, and a WebM file (or any formats you configure), with each
//! frame keeping its own display duration.
//!
//! Every job runs the same pipeline:
//!
//! 1. **Inspect** the GIF with the [`gif`](https://crates.io/crates/gif)
//!    crate: validity, dimensions, per-frame delays.
//! 2. **Extract** numbered frame files with ImageMagick or GraphicsMagick.
//! 3. **Assemble** the frames into one intermediate container, converting
//!    each delay exactly.
//! 4. **Encode** the container with FFmpeg once per target format.
//!
//! Up to [`limit`](ConversionOptions::limit) jobs run concurrently. A failed
//! job never stops the batch, and a failed format never fails its job.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gif_video::{ConversionJob, ConversionOptions, run_batch};
//!
//! #[tokio::main]
//! async fn main() {
//!     let jobs = vec![ConversionJob::new("gifs/spin.gif", "dist/spin.gif")];
//!     let result = run_batch(jobs, ConversionOptions::new()).await;
//!     println!("{}", result.summary());
//! }
//! ```
//!
//! ### Custom Targets
//!
//! ```no_run
//! use gif_video::{ConversionOptions, EncodingTarget, EncodingTargets};
//!
//! let targets: EncodingTargets = [
//!     EncodingTarget::new("mp4", ["-vcodec libx264", "-crf 23"]),
//!     EncodingTarget::new("webm", ["-c:v libvpx-vp9"]),
//! ]
//! .into_iter()
//! .collect();
//! let options = ConversionOptions::new().with_targets(targets).with_limit(2);
//! ```
//!
//! ### Inspecting a GIF
//!
//! ```no_run
//! use gif_video::{GifInspector, ImageInspector};
//!
//! let bytes = std::fs::read("spin.gif").unwrap();
//! let metadata = GifInspector.inspect(&bytes);
//! println!("{metadata}");
//! ```
//!
//! ## Requirements
//!
//! The conversion shells out to `convert` (or `gm convert`) and `ffmpeg`,
//! which must be on `PATH` or configured explicitly. Tests and embedders can
//! substitute their own adapters through [`Toolchain`].

pub mod assemble;
pub mod batch;
pub mod config;
pub mod encode;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod job;
pub mod magick;
pub mod metadata;
mod process;
pub mod progress;
pub mod target;
pub mod template;
pub mod toolchain;
pub mod workspace;

pub use assemble::{FrameDelay, assemble_frames};
pub use batch::{BatchConverter, BatchResult, run_batch};
pub use config::{ConversionOptions, DEFAULT_TEMP_DIR};
pub use encode::{FormatOutcome, encode_formats, output_path};
pub use error::ConversionError;
pub use extract::extract_frames;
pub use ffmpeg::{FfmpegEncoder, FfmpegLogLevel};
pub use job::{ConversionJob, JobRunner, JobStatus, Stage};
pub use magick::{ImageBackend, MagickBackend};
pub use metadata::{FrameTiming, GifInspector, ImageInspector, ImageMetadata, inspect_file};
pub use progress::{ProgressCallback, ProgressEvent, ProgressInfo};
pub use target::{EncodingTarget, EncodingTargets};
pub use template::FramePathTemplate;
pub use toolchain::{
    ComposeFrame, ComposeRequest, EncodeRequest, FrameComposer, FrameSplitter, Toolchain,
    VideoEncoder,
};
pub use workspace::Workspace;
