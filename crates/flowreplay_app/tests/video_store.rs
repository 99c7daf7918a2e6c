//! Video lookup, deletion and range serving.

use std::fs;

use flowreplay_app::{StoreError, VideoStore};

fn store_with(files: &[(&str, &[u8])]) -> (tempfile::TempDir, VideoStore) {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    let store = VideoStore::new(dir.path(), "/static/videos");
    (dir, store)
}

#[test]
fn lookup_prefers_plain_then_simple_then_real_browser() {
    let (dir, store) = store_with(&[
        ("session_1_real_browser.mp4", b"rb"),
        ("session_1_simple.mp4", b"simple"),
        ("session_2_real_browser.mp4", b"rb"),
    ]);

    assert_eq!(store.find(1), Some(dir.path().join("session_1_simple.mp4")));
    assert_eq!(store.find(2), Some(dir.path().join("session_2_real_browser.mp4")));
    assert_eq!(store.find(3), None);

    fs::write(dir.path().join("session_1.mp4"), b"plain").unwrap();
    assert_eq!(store.find(1), Some(dir.path().join("session_1.mp4")));
}

#[test]
fn delete_removes_every_variant_of_one_session() {
    let (dir, store) = store_with(&[
        ("session_1.mp4", b"a"),
        ("session_1_simple.mp4", b"b"),
        ("session_1_real_browser.mp4", b"c"),
        ("session_10_real_browser.mp4", b"d"),
    ]);

    assert_eq!(store.delete(1).unwrap(), 3);
    assert_eq!(store.delete(1).unwrap(), 0);
    assert!(dir.path().join("session_10_real_browser.mp4").exists());
}

#[test]
fn clear_removes_only_videos() {
    let (dir, store) = store_with(&[
        ("session_1.mp4", b"a"),
        ("legacy.avi", b"b"),
        ("notes.txt", b"c"),
    ]);

    assert_eq!(store.clear().unwrap(), 2);
    assert!(dir.path().join("notes.txt").exists());
    assert!(!dir.path().join("legacy.avi").exists());
}

#[test]
fn clear_keeps_in_progress_writes() {
    let (dir, store) = store_with(&[
        ("session_2_real_browser.mp4", b"done"),
        (".session_3_real_browser.partial.mp4", b"writing"),
        (".session_3_real_browser.trial-libx264.mp4", b"trial"),
    ]);

    assert_eq!(store.clear().unwrap(), 1);
    assert!(dir.path().join(".session_3_real_browser.partial.mp4").exists());
    assert!(dir.path().join(".session_3_real_browser.trial-libx264.mp4").exists());
}

#[test]
fn clear_of_missing_directory_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let store = VideoStore::new(dir.path().join("absent"), "/static/videos");
    assert_eq!(store.clear().unwrap(), 0);
}

#[test]
fn full_response_carries_video_headers() {
    let (_dir, store) = store_with(&[("session_5_real_browser.mp4", b"0123456789")]);

    let response = store.serve(5, None).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"0123456789");
    assert_eq!(response.header("content-type"), Some("video/mp4"));
    assert_eq!(response.header("Accept-Ranges"), Some("bytes"));
    assert_eq!(response.header("Cache-Control"), Some("public, max-age=3600"));
    assert_eq!(response.header("Content-Length"), Some("10"));
}

#[test]
fn range_request_returns_partial_content() {
    let (_dir, store) = store_with(&[("session_5_real_browser.mp4", b"0123456789")]);

    let response = store.serve(5, Some("bytes=2-5")).unwrap();
    assert_eq!(response.status, 206);
    assert_eq!(response.body, b"2345");
    assert_eq!(response.header("Content-Range"), Some("bytes 2-5/10"));

    let tail = store.serve(5, Some("bytes=-3")).unwrap();
    assert_eq!(tail.body, b"789");
}

#[test]
fn unsatisfiable_range_and_missing_video() {
    let (_dir, store) = store_with(&[("session_5_real_browser.mp4", b"0123456789")]);

    assert!(matches!(
        store.serve(5, Some("bytes=50-60")),
        Err(StoreError::RangeNotSatisfiable { size: 10 })
    ));
    assert!(matches!(store.serve(6, None), Err(StoreError::NotFound)));
}
