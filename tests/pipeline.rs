//! Single-job pipeline integration tests.
//!
//! Each stage is driven against recording adapters; no external tools are
//! needed.

mod common;

use std::sync::Arc;

use gif_video::{
    ConversionError, ConversionJob, EncodingTargets, GifInspector, ImageMetadata, JobRunner,
    JobStatus, Workspace, assemble_frames, encode_formats, extract_frames, inspect_file,
};

use common::{FakeComposer, FakeEncoder, FakeSplitter, Fakes, files_under, write_gif};

// ── Inspection ─────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_file_reads_frame_delays() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gif(dir.path(), "spin.gif", &[10, 4, 10]);

    let metadata = inspect_file(Arc::new(GifInspector), &source).await.unwrap();
    assert!(metadata.valid);
    assert!(metadata.animated);
    let delays: Vec<u32> = metadata.frames.iter().map(|f| f.delay_milliseconds).collect();
    assert_eq!(delays, vec![100, 40, 100]);
}

#[tokio::test]
async fn inspect_file_missing_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = inspect_file(Arc::new(GifInspector), &dir.path().join("nope.gif")).await;
    assert!(matches!(result, Err(ConversionError::Io { .. })));
}

// ── Extraction ─────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_input_writes_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::new(dir.path().join(".tmp"));
    let splitter = FakeSplitter::default();

    let result = extract_frames(
        &splitter,
        &workspace,
        &dir.path().join("broken.gif"),
        &ImageMetadata::invalid(),
    )
    .await;

    assert!(matches!(result, Err(ConversionError::InvalidInput { .. })));
    assert!(splitter.calls.lock().unwrap().is_empty());
    assert!(!workspace.root().exists());
}

#[tokio::test]
async fn single_frame_is_not_animated() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gif(dir.path(), "still.gif", &[0]);
    let workspace = Workspace::new(dir.path().join(".tmp"));
    let metadata = inspect_file(Arc::new(GifInspector), &source).await.unwrap();

    let result = extract_frames(&FakeSplitter::default(), &workspace, &source, &metadata).await;
    assert!(matches!(result, Err(ConversionError::NotAnimated { .. })));
    assert!(files_under(dir.path()).iter().all(|path| path == &source));
}

#[tokio::test]
async fn extraction_writes_frames_under_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gif(dir.path(), "loop.gif", &[5, 5, 5, 5]);
    let workspace = Workspace::new(dir.path().join(".tmp"));
    let metadata = inspect_file(Arc::new(GifInspector), &source).await.unwrap();

    let template = extract_frames(&FakeSplitter::default(), &workspace, &source, &metadata)
        .await
        .unwrap();

    assert!(template.directory().starts_with(workspace.root()));
    for index in 0..4 {
        assert!(template.frame_path(index).exists());
    }
}

// ── Assembly ───────────────────────────────────────────────────────

#[tokio::test]
async fn assembly_converts_each_delay() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gif(dir.path(), "loop.gif", &[10, 3, 25]);
    let workspace = Workspace::new(dir.path().join(".tmp"));
    let metadata = inspect_file(Arc::new(GifInspector), &source).await.unwrap();
    let template = extract_frames(&FakeSplitter::default(), &workspace, &source, &metadata)
        .await
        .unwrap();

    let composer = FakeComposer::default();
    let destination = dir.path().join("dist/nested/loop.gif");
    let container = assemble_frames(&composer, &template, &metadata.frames, &destination)
        .await
        .unwrap();

    assert_eq!(container, template.container_path());
    assert!(container.exists());
    assert!(destination.parent().unwrap().is_dir());

    let requests = composer.requests.lock().unwrap();
    let delays: Vec<String> = requests[0].frames.iter().map(|f| f.delay.to_string()).collect();
    assert_eq!(delays, vec!["10", "3", "25"]);
    let indices: Vec<usize> = requests[0].frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn assembly_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gif(dir.path(), "loop.gif", &[10, 10]);
    let workspace = Workspace::new(dir.path().join(".tmp"));
    let metadata = inspect_file(Arc::new(GifInspector), &source).await.unwrap();
    let template = extract_frames(&FakeSplitter::default(), &workspace, &source, &metadata)
        .await
        .unwrap();

    let composer = FakeComposer {
        fail: true,
        ..FakeComposer::default()
    };
    let result = assemble_frames(
        &composer,
        &template,
        &metadata.frames,
        &dir.path().join("loop.gif"),
    )
    .await;
    assert!(matches!(result, Err(ConversionError::Assembly { .. })));
}

// ── Encoding ───────────────────────────────────────────────────────

#[tokio::test]
async fn failed_format_does_not_block_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let container = dir.path().join("clip.mpg");
    std::fs::write(&container, b"mpg").unwrap();
    let destination = dir.path().join("clip.gif");

    let encoder = FakeEncoder::failing(&["ogv"]);
    let mut seen = Vec::new();
    let outcomes = encode_formats(
        &encoder,
        &container,
        &destination,
        &EncodingTargets::default(),
        |outcome| seen.push((outcome.format.clone(), outcome.succeeded())),
    )
    .await;

    assert_eq!(encoder.formats(), vec!["mp4", "ogv", "webm"]);
    assert_eq!(
        seen,
        vec![
            ("mp4".to_string(), true),
            ("ogv".to_string(), false),
            ("webm".to_string(), true),
        ],
    );
    assert!(dir.path().join("clip.mp4").exists());
    assert!(!dir.path().join("clip.ogv").exists());
    assert!(dir.path().join("clip.webm").exists());
    assert!(matches!(
        outcomes[1].error,
        Some(ConversionError::Encode { ref format, .. }) if format == "ogv"
    ));
}

#[tokio::test]
async fn encode_requests_drop_audio_and_expand_options() {
    let dir = tempfile::tempdir().unwrap();
    let container = dir.path().join("clip.mpg");
    std::fs::write(&container, b"mpg").unwrap();

    let encoder = FakeEncoder::default();
    encode_formats(
        &encoder,
        &container,
        &dir.path().join("clip.gif"),
        &EncodingTargets::default(),
        |_| {},
    )
    .await;

    let requests = encoder.requests.lock().unwrap();
    assert!(requests.iter().all(|r| r.no_audio));
    assert_eq!(requests[1].arguments, vec!["-q", "5", "-pix_fmt", "yuv420p", "-vcodec", "libtheora"]);
}

// ── Whole job ──────────────────────────────────────────────────────

#[tokio::test]
async fn job_succeeds_even_when_a_format_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gif(dir.path(), "wave.gif", &[10, 10, 10]);
    let fakes = Fakes::with(
        FakeSplitter::default(),
        FakeComposer::default(),
        FakeEncoder::failing(&["ogv"]),
    );
    let runner = JobRunner::new(
        fakes.toolchain(),
        Workspace::new(dir.path().join(".tmp")),
        EncodingTargets::default(),
    );

    let mut job = ConversionJob::new(&source, dir.path().join("out/wave.gif"));
    runner.run(&mut job).await;

    assert_eq!(job.status(), JobStatus::Succeeded);
    assert!(job.failure().is_none());
    let succeeded: Vec<bool> = job.outputs().iter().map(|o| o.succeeded()).collect();
    assert_eq!(succeeded, vec![true, false, true]);
    assert!(dir.path().join("out/wave.mp4").exists());
}

#[tokio::test]
async fn job_stops_at_first_failing_stage() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_gif(dir.path(), "wave.gif", &[10, 10]);
    let fakes = Fakes::with(
        FakeSplitter {
            fail: true,
            ..FakeSplitter::default()
        },
        FakeComposer::default(),
        FakeEncoder::default(),
    );
    let runner = JobRunner::new(
        fakes.toolchain(),
        Workspace::new(dir.path().join(".tmp")),
        EncodingTargets::default(),
    );

    let mut job = ConversionJob::new(&source, dir.path().join("wave.gif"));
    runner.run(&mut job).await;

    assert_eq!(job.status(), JobStatus::Failed);
    assert!(matches!(
        job.failure(),
        Some(ConversionError::FrameExtraction { .. })
    ));
    assert!(fakes.composer.requests.lock().unwrap().is_empty());
    assert!(fakes.encoder.requests.lock().unwrap().is_empty());
    assert!(job.outputs().is_empty());
}
