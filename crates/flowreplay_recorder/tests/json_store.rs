use std::fs;

use flowreplay_recorder::{
    EventKind, EventTimeline, JsonSessionStore, RepositoryError, SessionRepository,
};

#[test]
fn loads_tracker_shaped_session_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("session_7.json"),
        r#"{
            "id": 999,
            "url": "https://shop.test/products",
            "events": [
                {"type": "click", "timestamp": 1700000002000, "x": 400, "y": 300},
                {"type": "mousemove", "timestamp": 1700000000000, "x": 10, "y": 20},
                {"type": "scroll", "timestamp": 1700000000500, "x": 0, "y": 12.5,
                 "data": "{\"scrollY\": 640, \"pageHeight\": 3200}"}
            ]
        }"#,
    )
    .unwrap();

    let store = JsonSessionStore::new(dir.path());
    let session = store.load_session(7).unwrap();

    assert_eq!(session.id, 7);
    assert_eq!(session.target_url(), Some("https://shop.test/products"));
    let kinds: Vec<EventKind> = session.events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Move, EventKind::Scroll, EventKind::Click]);
    assert_eq!(session.events[1].scroll_payload().unwrap().percent(), 20.0);

    let timeline = EventTimeline::build(session.events).unwrap();
    assert_eq!(timeline.total_duration(), 2.0);
    assert_eq!(timeline.total_frames(15), 30);
}

#[test]
fn missing_file_is_session_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(dir.path());

    assert!(matches!(
        store.load_session(41),
        Err(RepositoryError::SessionNotFound(41))
    ));
}

#[test]
fn corrupt_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("session_2.json"), "{ not json").unwrap();
    let store = JsonSessionStore::new(dir.path());

    match store.load_session(2) {
        Err(RepositoryError::Parse { path, .. }) => {
            assert!(path.ends_with("session_2.json"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}
