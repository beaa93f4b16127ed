//! Options and target configuration integration tests.

use std::path::Path;

use gif_video::{
    ConversionError, ConversionOptions, DEFAULT_TEMP_DIR, EncodingTarget, EncodingTargets,
    FfmpegLogLevel, ImageBackend,
};

#[test]
fn default_options() {
    let options = ConversionOptions::default();
    assert!(options.limit() >= 1);
    assert_eq!(options.backend(), ImageBackend::ImageMagick);
    assert_eq!(options.temp_dir(), Path::new(DEFAULT_TEMP_DIR));
    assert!(options.cleanup());
    assert_eq!(options.targets().formats(), vec!["mp4", "ogv", "webm"]);
}

#[test]
fn builder_chaining() {
    let options = ConversionOptions::new()
        .with_limit(3)
        .with_backend(ImageBackend::GraphicsMagick)
        .with_temp_dir("/var/tmp/frames")
        .with_cleanup(false)
        .with_ffmpeg_program("/opt/ffmpeg/bin/ffmpeg")
        .with_ffmpeg_log_level(FfmpegLogLevel::Warning);

    assert_eq!(options.limit(), 3);
    assert_eq!(options.magick_program(), "gm convert");
    assert_eq!(options.temp_dir(), Path::new("/var/tmp/frames"));
    assert!(!options.cleanup());
}

#[test]
fn explicit_magick_program_wins() {
    let options = ConversionOptions::new()
        .with_backend(ImageBackend::GraphicsMagick)
        .with_magick_program("magick");
    assert_eq!(options.magick_program(), "magick");
}

#[test]
fn json_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gif-video.json");
    std::fs::write(
        &path,
        r#"{
            "limit": 2,
            "imageMagick": true,
            "tmp": "build/.tmp",
            "cleanup": false,
            "ffmpeg": {
                "webm": ["-c:v libvpx", "-crf 10"],
                "mp4": ["-vcodec libx264"]
            },
            "ffmpegPath": "/usr/local/bin/ffmpeg",
            "ffmpegLogLevel": "warning"
        }"#,
    )
    .unwrap();

    let options = ConversionOptions::from_json_file(&path).unwrap();
    assert_eq!(options.limit(), 2);
    assert_eq!(options.backend(), ImageBackend::ImageMagick);
    assert_eq!(options.temp_dir(), Path::new("build/.tmp"));
    assert!(!options.cleanup());
    assert_eq!(options.targets().formats(), vec!["webm", "mp4"]);
}

#[test]
fn missing_json_file_is_io_error() {
    let result = ConversionOptions::from_json_file("does/not/exist.json");
    assert!(matches!(result, Err(ConversionError::Io { .. })));
}

#[test]
fn malformed_json_is_rejected() {
    for json in [
        "{",
        r#"{"limit": "many"}"#,
        r#"{"ffmpeg": ["mp4"]}"#,
        r#"{"ffmpegLogLevel": "loud"}"#,
    ] {
        assert!(
            matches!(
                ConversionOptions::from_json_str(json),
                Err(ConversionError::InvalidConfiguration(_))
            ),
            "accepted {json}",
        );
    }
}

#[test]
fn option_strings_split_at_first_whitespace() {
    let target = EncodingTarget::new(
        "mp4",
        ["-vcodec libx264", "-vf scale=trunc(iw/2)*2:trunc(ih/2)*2", "-an"],
    );
    assert_eq!(
        target.arguments(),
        vec!["-vcodec", "libx264", "-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2", "-an"],
    );
}

#[test]
fn targets_collect_without_duplicates() {
    let targets: EncodingTargets = [
        EncodingTarget::new("mp4", ["-crf 18"]),
        EncodingTarget::new("webm", ["-crf 10"]),
        EncodingTarget::new("mp4", ["-crf 23"]),
    ]
    .into_iter()
    .collect();

    assert_eq!(targets.formats(), vec!["mp4", "webm"]);
    assert_eq!(targets.iter().next().unwrap().options, vec!["-crf 23"]);
}
