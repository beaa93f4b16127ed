//! FFmpeg video encoder.
//!
//! [`FfmpegEncoder`] is the production [`VideoEncoder`]: it runs the
//! `ffmpeg` command-line tool once per target format, dropping audio and
//! passing the target's options verbatim. [`FfmpegLogLevel`] controls how
//! much FFmpeg itself prints; it maps to the `-loglevel` flag.
//!
//! # Note
//!
//! The log level controls **FFmpeg's own console output**, not the
//! Rust-side diagnostic messages emitted via the `log` crate. To configure
//! those, use a standard `log` implementation such as `env_logger`.

use std::ffi::OsString;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::process::{ProcessFailure, run_tool};
use crate::toolchain::{EncodeRequest, VideoEncoder};

/// Program name used when no explicit FFmpeg path is configured.
pub const DEFAULT_FFMPEG_PROGRAM: &str = "ffmpeg";

/// FFmpeg console verbosity level.
///
/// Setting a level causes FFmpeg to suppress all messages below that
/// severity.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log conditions that abort the process.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors. This is the default, so failure reasons
    /// stay readable.
    #[default]
    Error,
    /// Log warnings.
    Warning,
    /// Log informational messages.
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// The value passed to `-loglevel`.
    pub fn as_arg(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_arg())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = ConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(ConversionError::InvalidConfiguration(format!(
                "unknown FFmpeg log level: {other}"
            ))),
        }
    }
}

/// Encodes the intermediate container with the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: String,
    log_level: FfmpegLogLevel,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG_PROGRAM, FfmpegLogLevel::default())
    }
}

impl FfmpegEncoder {
    /// Create an encoder that runs `program` at the given log level.
    pub fn new(program: impl Into<String>, log_level: FfmpegLogLevel) -> Self {
        Self {
            program: program.into(),
            log_level,
        }
    }

    /// Build the argument list for one encode.
    pub(crate) fn command_arguments(&self, request: &EncodeRequest) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            self.log_level.as_arg().into(),
            "-i".into(),
            request.input.clone().into_os_string(),
        ];
        if request.no_audio {
            arguments.push("-an".into());
        }
        arguments.extend(request.arguments.iter().map(OsString::from));
        arguments.push(request.output.clone().into_os_string());
        arguments
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, request: &EncodeRequest) -> Result<(), ConversionError> {
        let arguments = self.command_arguments(request);
        run_tool(&self.program, &arguments)
            .await
            .map_err(|failure: ProcessFailure| ConversionError::Encode {
                format: request.format.clone(),
                path: request.input.clone(),
                reason: failure.to_string(),
            })
    }
}
