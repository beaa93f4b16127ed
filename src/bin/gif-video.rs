use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use gif_video::{
    BatchConverter, ConversionJob, ConversionOptions, EncodingTarget, EncodingTargets,
    FfmpegLogLevel, GifInspector, ImageBackend, ImageInspector, ProgressCallback, ProgressInfo,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  gif-video convert spin.gif wave.gif --out dist\n  gif-video convert gifs/*.gif --out dist --limit 2 --progress\n  gif-video convert loop.gif --format \"webm=-c:v libvpx-vp9;-crf 30\"\n  gif-video probe spin.gif --json\n  gif-video completions zsh > _gif-video";

#[derive(Debug, Parser)]
#[command(
    name = "gif-video",
    version,
    about = "Convert animated GIFs to MP4, OGV, and WebM video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show per-stage logging output.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert GIFs to video.
    #[command(
        about = "Convert animated GIFs",
        after_help = "Examples:\n  gif-video convert spin.gif --out dist\n  gif-video convert *.gif --graphicsmagick --keep-temp --tmp /tmp/frames"
    )]
    Convert {
        /// Input GIF files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory. Defaults to each input's own directory.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Maximum number of GIFs converted at once.
        #[arg(long)]
        limit: Option<usize>,
        /// Use GraphicsMagick (`gm convert`) instead of ImageMagick.
        #[arg(long)]
        graphicsmagick: bool,
        /// Explicit image tool command (e.g. `magick`).
        #[arg(long)]
        magick: Option<String>,
        /// Temporary directory for intermediate frames.
        #[arg(long)]
        tmp: Option<PathBuf>,
        /// Keep the temporary directory after the batch.
        #[arg(long)]
        keep_temp: bool,
        /// JSON options file; command-line flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output format as NAME=OPTS, options separated by `;`. Repeatable;
        /// replaces the default formats.
        #[arg(long = "format", value_name = "NAME=OPTS", value_parser = parse_format)]
        formats: Vec<EncodingTarget>,
        /// FFmpeg executable.
        #[arg(long)]
        ffmpeg: Option<String>,
        /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
        #[arg(long)]
        log_level: Option<String>,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Print GIF metadata.
    #[command(
        about = "Print GIF metadata",
        visible_alias = "info",
        after_help = "Examples:\n  gif-video probe spin.gif\n  gif-video probe spin.gif --json"
    )]
    Probe {
        /// Input GIF path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_format(value: &str) -> Result<EncodingTarget, String> {
    let (name, options) = value.split_once('=').unwrap_or((value, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing format name in {value:?}"));
    }
    let options = options
        .split(';')
        .map(str::trim)
        .filter(|option| !option.is_empty());
    Ok(EncodingTarget::new(name, options))
}

fn destination_for(input: &Path, out: Option<&Path>) -> PathBuf {
    match (out, input.file_name()) {
        (Some(out), Some(name)) => out.join(name),
        _ => input.to_path_buf(),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let name = info
            .source
            .file_name()
            .map_or_else(|| info.source.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.bar.set_position(info.completed);
        self.bar.set_message(format!("{name}: {}", info.event));
        if info.completed == info.total && info.event.is_terminal() {
            self.bar.finish_and_clear();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn convert_options(
    config: Option<&Path>,
    limit: Option<usize>,
    graphicsmagick: bool,
    magick: Option<String>,
    tmp: Option<PathBuf>,
    keep_temp: bool,
    formats: Vec<EncodingTarget>,
    ffmpeg: Option<String>,
    log_level: Option<&str>,
) -> Result<ConversionOptions, Box<dyn std::error::Error>> {
    let mut options = match config {
        Some(path) => ConversionOptions::from_json_file(path)?,
        None => ConversionOptions::new(),
    };

    if let Some(limit) = limit {
        if limit == 0 {
            return Err("--limit must be at least 1".into());
        }
        options = options.with_limit(limit);
    }
    if graphicsmagick {
        options = options.with_backend(ImageBackend::GraphicsMagick);
    }
    if let Some(program) = magick {
        options = options.with_magick_program(program);
    }
    if let Some(tmp) = tmp {
        options = options.with_temp_dir(tmp);
    }
    if keep_temp {
        options = options.with_cleanup(false);
    }
    if !formats.is_empty() {
        let mut targets = EncodingTargets::empty();
        for target in formats {
            targets.insert(target);
        }
        options = options.with_targets(targets);
    }
    if let Some(program) = ffmpeg {
        options = options.with_ffmpeg_program(program);
    }
    if let Some(level) = log_level {
        let level: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        options = options.with_ffmpeg_log_level(level);
    }
    Ok(options)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Convert {
            inputs,
            out,
            limit,
            graphicsmagick,
            magick,
            tmp,
            keep_temp,
            config,
            formats,
            ffmpeg,
            log_level,
            progress,
        } => {
            let options = convert_options(
                config.as_deref(),
                limit,
                graphicsmagick,
                magick,
                tmp,
                keep_temp,
                formats,
                ffmpeg,
                log_level.as_deref(),
            )?;

            let jobs: Vec<ConversionJob> = inputs
                .iter()
                .map(|input| ConversionJob::new(input, destination_for(input, out.as_deref())))
                .collect();

            let mut converter = BatchConverter::new(options);
            if progress {
                converter =
                    converter.with_progress(Arc::new(TerminalProgress::new(jobs.len() as u64)?));
            }
            let result = converter.run(jobs).await;

            // Failed jobs and formats have already been logged as warnings.
            for job in &result.jobs {
                for outcome in job.outputs().iter().filter(|outcome| outcome.error.is_none()) {
                    println!("{} {}", "saved".green().bold(), outcome.output.display());
                }
            }

            let summary = result.summary();
            if result.failed_count() == 0 {
                println!("{}", summary.green());
            } else {
                println!("{}", summary.yellow());
            }
        }
        Commands::Probe { input, json } => {
            let bytes = fs::read(&input)?;
            let metadata = GifInspector.inspect(&bytes);
            if json {
                let duration = metadata.total_duration_milliseconds();
                let payload = json!({
                    "path": input.display().to_string(),
                    "duration_ms": duration,
                    "metadata": metadata,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if !metadata.valid {
                return Err(format!("not a valid GIF: {}", input.display()).into());
            } else {
                println!("{} {}", "File:".bold(), input.display());
                println!("{} {}x{}", "Size:".bold(), metadata.width, metadata.height);
                println!("{} {}", "Frames:".bold(), metadata.frames.len());
                println!("{} {}", "Animated:".bold(), metadata.animated);
                println!(
                    "{} {:.2}s",
                    "Duration:".bold(),
                    metadata.total_duration_milliseconds() as f64 / 1000.0
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "gif-video", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
