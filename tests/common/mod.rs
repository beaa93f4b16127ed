//! Shared fixtures for the integration tests.
//!
//! Fixture GIFs are generated in-test with the `gif` encoder, and the
//! external tools are replaced by recording adapters that write placeholder
//! files where the real tools would.

#![allow(dead_code)]

use std::{
    borrow::Cow,
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use gif::{Encoder, Frame, Repeat};
use gif_video::{
    ComposeRequest, ConversionError, EncodeRequest, FrameComposer, FramePathTemplate,
    FrameSplitter, GifInspector, ImageInspector, ProgressCallback, ProgressEvent, ProgressInfo,
    Toolchain, VideoEncoder,
};

/// Encode a 2x2 GIF with one frame per entry of `delays` (centiseconds).
pub fn gif_bytes(delays: &[u16]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buffer, 2, 2, &[0, 0, 0, 255, 255, 255]).unwrap();
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for (index, &delay) in delays.iter().enumerate() {
            let frame = Frame {
                width: 2,
                height: 2,
                delay,
                buffer: Cow::Owned(vec![(index % 2) as u8; 4]),
                ..Frame::default()
            };
            encoder.write_frame(&frame).unwrap();
        }
    }
    buffer
}

/// Write a fixture GIF to `directory/name` and return its path.
pub fn write_gif(directory: &Path, name: &str, delays: &[u16]) -> PathBuf {
    let path = directory.join(name);
    std::fs::write(&path, gif_bytes(delays)).unwrap();
    path
}

/// Every file under `directory`, recursively.
pub fn files_under(directory: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(directory) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}

/// Tracks how many jobs are inside the splitter at once.
#[derive(Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Counts jobs between their start and terminal events.
impl ProgressCallback for ConcurrencyGauge {
    fn on_progress(&self, info: &ProgressInfo) {
        match info.event {
            ProgressEvent::JobStarted => self.enter(),
            ProgressEvent::JobSucceeded | ProgressEvent::JobFailed => self.leave(),
            _ => {}
        }
    }
}

/// Writes one placeholder file per frame of the source GIF.
#[derive(Default)]
pub struct FakeSplitter {
    pub calls: Mutex<Vec<PathBuf>>,
    pub delay: Option<Duration>,
    pub gauge: Arc<ConcurrencyGauge>,
    pub fail: bool,
}

#[async_trait]
impl FrameSplitter for FakeSplitter {
    async fn split(
        &self,
        source: &Path,
        template: &FramePathTemplate,
    ) -> Result<(), ConversionError> {
        self.calls.lock().unwrap().push(source.to_path_buf());
        if self.fail {
            return Err(ConversionError::FrameExtraction {
                path: source.to_path_buf(),
                reason: "convert: no decode delegate".to_string(),
            });
        }

        self.gauge.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let bytes = std::fs::read(source).unwrap();
        let metadata = GifInspector.inspect(&bytes);
        for frame in &metadata.frames {
            std::fs::write(template.frame_path(frame.index), b"frame").unwrap();
        }
        self.gauge.leave();
        Ok(())
    }
}

/// Records composition requests and writes the container.
#[derive(Default)]
pub struct FakeComposer {
    pub requests: Mutex<Vec<ComposeRequest>>,
    pub fail: bool,
}

#[async_trait]
impl FrameComposer for FakeComposer {
    async fn compose(&self, request: &ComposeRequest) -> Result<(), ConversionError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(ConversionError::Assembly {
                path: request.output.clone(),
                reason: "convert: unable to open image".to_string(),
            });
        }
        for frame in &request.frames {
            assert!(frame.path.exists(), "missing frame {}", frame.path.display());
        }
        let delays: Vec<String> = request.frames.iter().map(|f| f.delay.to_string()).collect();
        std::fs::write(&request.output, delays.join(" ")).unwrap();
        Ok(())
    }
}

/// Records encode requests; formats in `failing` return an error.
#[derive(Default)]
pub struct FakeEncoder {
    pub requests: Mutex<Vec<EncodeRequest>>,
    pub failing: HashSet<String>,
    pub delay: Option<Duration>,
}

impl FakeEncoder {
    pub fn failing(formats: &[&str]) -> Self {
        Self {
            failing: formats.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn formats(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.format.clone())
            .collect()
    }
}

#[async_trait]
impl VideoEncoder for FakeEncoder {
    async fn encode(&self, request: &EncodeRequest) -> Result<(), ConversionError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&request.format) {
            return Err(ConversionError::Encode {
                format: request.format.clone(),
                path: request.input.clone(),
                reason: format!("Unknown encoder for {}", request.format),
            });
        }
        assert!(request.input.exists(), "container missing");
        std::fs::write(&request.output, request.format.as_bytes()).unwrap();
        Ok(())
    }
}

/// The recording adapters behind one toolchain.
pub struct Fakes {
    pub splitter: Arc<FakeSplitter>,
    pub composer: Arc<FakeComposer>,
    pub encoder: Arc<FakeEncoder>,
}

impl Fakes {
    pub fn new() -> Self {
        Self::with(FakeSplitter::default(), FakeComposer::default(), FakeEncoder::default())
    }

    pub fn with(splitter: FakeSplitter, composer: FakeComposer, encoder: FakeEncoder) -> Self {
        Self {
            splitter: Arc::new(splitter),
            composer: Arc::new(composer),
            encoder: Arc::new(encoder),
        }
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(
            Arc::new(GifInspector),
            self.splitter.clone(),
            self.composer.clone(),
            self.encoder.clone(),
        )
    }
}
