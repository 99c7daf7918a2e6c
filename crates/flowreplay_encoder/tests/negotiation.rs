//! Codec negotiation and verified writes against the in-memory backend.

use std::path::Path;
use std::sync::Arc;

use flowreplay_encoder::testing::{read_frame_count, MemoryBackend};
use flowreplay_encoder::{EncodeError, VideoEncoder};
use flowreplay_recorder::CapturedFrame;

fn frames(n: usize) -> Vec<CapturedFrame> {
    (0..n)
        .map(|i| CapturedFrame::blank(8, 6).with_frame_number(i as u64))
        .collect()
}

fn candidates(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn first_working_candidate_wins() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MemoryBackend::accepting(&["mpeg4", "mjpeg"]);
    let encoder = VideoEncoder::new(
        Arc::new(backend.clone()),
        candidates(&["libx264", "mpeg4", "mjpeg"]),
    );
    let output = dir.path().join("session_1_real_browser.mp4");

    let video = encoder.encode(&frames(30), 15, &output).unwrap();

    assert_eq!(video.codec, "mpeg4");
    assert_eq!(video.frame_count, 30);
    assert_eq!(video.duration_seconds(), 2.0);
    assert_eq!(read_frame_count(&output), Some(30));
    // Only the final artifact remains; trial and partial files are gone.
    assert_eq!(dir_entries(dir.path()), vec!["session_1_real_browser.mp4"]);

    let opened: Vec<String> = backend.opens().into_iter().map(|o| o.codec).collect();
    assert_eq!(opened, vec!["libx264", "mpeg4", "mpeg4"]);
}

#[test]
fn codec_failing_on_finish_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MemoryBackend::accepting(&["libx264", "mpeg4"]).failing_on_finish("libx264");
    let encoder = VideoEncoder::new(Arc::new(backend), candidates(&["libx264", "mpeg4"]));

    let video = encoder
        .encode(&frames(3), 15, &dir.path().join("out.mp4"))
        .unwrap();
    assert_eq!(video.codec, "mpeg4");
}

#[test]
fn no_candidate_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = VideoEncoder::new(
        Arc::new(MemoryBackend::accepting(&[])),
        candidates(&["libx264", "mpeg4"]),
    );
    let output = dir.path().join("out.mp4");

    match encoder.encode(&frames(5), 15, &output) {
        Err(EncodeError::CodecUnavailable { tried }) => {
            assert_eq!(tried, vec!["libx264", "mpeg4"]);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn empty_output_fails_verification_and_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = VideoEncoder::new(
        Arc::new(MemoryBackend::accepting(&["mpeg4"]).with_empty_output()),
        candidates(&["mpeg4"]),
    );
    let output = dir.path().join("out.mp4");

    let err = encoder.encode(&frames(5), 15, &output).unwrap_err();
    assert!(matches!(err, EncodeError::Verification { .. }));
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn writer_failure_midway_removes_partial() {
    let dir = tempfile::tempdir().unwrap();
    // Trial writes one frame and passes; the real write fails at frame 2.
    let encoder = VideoEncoder::new(
        Arc::new(MemoryBackend::accepting(&["mpeg4"]).failing_after_frames(2)),
        candidates(&["mpeg4"]),
    );
    let output = dir.path().join("out.mp4");

    let err = encoder.encode(&frames(5), 15, &output).unwrap_err();
    assert!(matches!(err, EncodeError::Writer { .. }));
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = VideoEncoder::new(
        Arc::new(MemoryBackend::accepting(&["mjpeg"])),
        candidates(&["mjpeg"]),
    );
    let output = dir.path().join("static").join("videos").join("out.mp4");

    encoder.encode(&frames(1), 15, &output).unwrap();
    assert!(output.exists());
}
