//! Replay orchestration.
//!
//! Sequences one replay job:
//!
//! ```text
//! Idle -> BrowserLaunching -> PageLoaded -> Replaying -> Encoding -> Done
//!   \_________________\______________\___________\__________\-> Failed
//! ```
//!
//! Per-frame capture failures and per-event dispatch failures are logged
//! and absorbed; every other failure ends the job with a single
//! [`ReplayError`]. The browser is closed before encoding and on every
//! failure path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use flowreplay_browser::{
    BrowserController, BrowserLauncher, BrowserSession, LaunchOptions, PageDimensions, PagePoint,
};
use flowreplay_encoder::VideoEncoder;
use flowreplay_recorder::{
    CapturedFrame, EventKind, EventTimeline, FrameSequence, FramePacer, RecordedSession,
    SessionId, SessionRepository, TimelineEntry, TrailBuffer, TrailSample,
    FALLBACK_FRAME_HEIGHT, FALLBACK_FRAME_WIDTH,
};

use crate::compositor::{ActiveEvent, FrameCompositor, OverlayInfo};
use crate::config::AppConfig;
use crate::error::{EventReplayError, ReplayError, Result};
use crate::store::VideoStore;

/// Lifecycle of one replay job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayState {
    Idle,
    BrowserLaunching,
    PageLoaded,
    Replaying,
    Encoding,
    Done,
    Failed,
}

impl ReplayState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplayState::Done | ReplayState::Failed)
    }
}

impl std::fmt::Display for ReplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReplayState::Idle => "idle",
            ReplayState::BrowserLaunching => "browser_launching",
            ReplayState::PageLoaded => "page_loaded",
            ReplayState::Replaying => "replaying",
            ReplayState::Encoding => "encoding",
            ReplayState::Done => "done",
            ReplayState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Metadata of a generated video.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplayResult {
    pub session_id: SessionId,
    pub video_path: PathBuf,
    /// URL path the video is served under.
    pub public_path: String,
    pub codec: String,
    pub frame_count: usize,
    pub fps: u32,
    pub video_duration_seconds: f64,
    pub session_duration_seconds: f64,
}

/// Result of a job together with the states it went through.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub result: Result<ReplayResult>,
    pub history: Vec<ReplayState>,
}

/// Tuning of the replay loop.
#[derive(Clone, Debug)]
pub struct ReplaySettings {
    pub fps: u32,
    pub default_url: String,
    pub navigation_settle: Duration,
    pub action_settle: Duration,
    pub realtime_pacing: bool,
    pub trail_length: usize,
    pub timeout: Option<Duration>,
    pub overlay_text: bool,
    pub launch: LaunchOptions,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ReplaySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fps: config.replay.fps.max(1),
            default_url: config.replay.default_url.clone(),
            navigation_settle: config.replay.navigation_settle(),
            action_settle: config.replay.action_settle(),
            realtime_pacing: config.replay.realtime_pacing,
            trail_length: config.replay.trail_length,
            timeout: config.replay.timeout(),
            overlay_text: config.replay.overlay_text,
            launch: config.browser.launch_options(),
        }
    }

    /// Settings for offline runs: no waits, no pacing, no font loading.
    pub fn offline() -> Self {
        Self {
            navigation_settle: Duration::ZERO,
            action_settle: Duration::ZERO,
            realtime_pacing: false,
            overlay_text: false,
            ..Self::default()
        }
    }
}

/// Tracks the current state and every state entered.
#[derive(Debug)]
struct StateMachine {
    session_id: SessionId,
    state: ReplayState,
    history: Vec<ReplayState>,
}

impl StateMachine {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: ReplayState::Idle,
            history: vec![ReplayState::Idle],
        }
    }

    fn transition(&mut self, to: ReplayState) {
        debug_assert!(!self.state.is_terminal(), "transition out of terminal state");
        tracing::info!(session = self.session_id, from = %self.state, to = %to, "Replay state");
        self.state = to;
        self.history.push(to);
    }

    fn fail(&mut self, error: &ReplayError) {
        tracing::error!(
            session = self.session_id,
            state = %self.state,
            error = %error,
            "Replay failed"
        );
        self.transition(ReplayState::Failed);
    }
}

/// Generates replay videos, one sequential job per call.
pub struct ReplayOrchestrator {
    repository: Arc<dyn SessionRepository>,
    launcher: Arc<dyn BrowserLauncher>,
    encoder: VideoEncoder,
    store: VideoStore,
    settings: ReplaySettings,
}

impl ReplayOrchestrator {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        launcher: Arc<dyn BrowserLauncher>,
        encoder: VideoEncoder,
        store: VideoStore,
        settings: ReplaySettings,
    ) -> Self {
        Self {
            repository,
            launcher,
            encoder,
            store,
            settings,
        }
    }

    /// Generate the video for `session_id`.
    pub fn generate(&self, session_id: SessionId, cancel: &CancellationToken) -> Result<ReplayResult> {
        self.run(session_id, cancel).result
    }

    /// Generate the video for `session_id`, also reporting the states the
    /// job went through.
    pub fn run(&self, session_id: SessionId, cancel: &CancellationToken) -> ReplayOutcome {
        let mut machine = StateMachine::new(session_id);
        let result = self.drive(&mut machine, session_id, cancel);
        match &result {
            Ok(_) => machine.transition(ReplayState::Done),
            Err(e) => machine.fail(e),
        }
        ReplayOutcome {
            result,
            history: machine.history,
        }
    }

    fn drive(
        &self,
        machine: &mut StateMachine,
        session_id: SessionId,
        cancel: &CancellationToken,
    ) -> Result<ReplayResult> {
        let session = self.repository.load_session(session_id)?;
        let url = session
            .target_url()
            .unwrap_or(&self.settings.default_url)
            .to_string();
        let timeline = EventTimeline::build(session.events.iter().cloned())?;
        tracing::debug!(
            session = session_id,
            events = timeline.len(),
            duration = timeline.total_duration(),
            "Timeline built"
        );

        machine.transition(ReplayState::BrowserLaunching);
        let mut browser = BrowserSession::launch(self.launcher.as_ref(), &self.settings.launch)?;
        let page = load_page(
            browser.controller()?,
            &url,
            self.settings.navigation_settle,
        )?;
        machine.transition(ReplayState::PageLoaded);

        machine.transition(ReplayState::Replaying);
        let frames = self.replay(&session, &timeline, browser.controller()?, page, cancel)?;

        if let Err(e) = browser.close() {
            tracing::warn!(session = session_id, error = %e, "Failed to close browser");
        }

        machine.transition(ReplayState::Encoding);
        let fps = self.settings.fps;
        let video = self
            .encoder
            .encode(frames.frames(), fps, &self.store.output_path(session_id))?;

        Ok(ReplayResult {
            session_id,
            public_path: self.store.public_path(session_id),
            video_path: video.path,
            codec: video.codec,
            frame_count: video.frame_count,
            fps,
            video_duration_seconds: video.frame_count as f64 / fps as f64,
            session_duration_seconds: timeline.total_duration(),
        })
    }

    fn replay(
        &self,
        session: &RecordedSession,
        timeline: &EventTimeline,
        browser: &mut dyn BrowserController,
        page: PageDimensions,
        cancel: &CancellationToken,
    ) -> Result<FrameSequence> {
        let fps = self.settings.fps;
        let total_duration = timeline.total_duration();
        let total_frames = timeline.total_frames(fps);

        let mut compositor = FrameCompositor::new(self.settings.overlay_text);
        let mut trail = TrailBuffer::new(self.settings.trail_length);
        let mut frames = FrameSequence::with_capacity(total_frames as usize);
        let mut cursor = PagePoint::default();
        let mut pacer = FramePacer::new(fps, self.settings.realtime_pacing);
        let started = Instant::now();
        pacer.start();

        tracing::info!(
            session = session.id,
            fps,
            total_frames,
            duration = total_duration,
            page_width = page.width,
            page_height = page.height,
            "Replaying session"
        );

        for index in 0..total_frames {
            if cancel.is_cancelled() {
                return Err(ReplayError::Cancelled);
            }
            if let Some(limit) = self.settings.timeout {
                if started.elapsed() >= limit {
                    return Err(ReplayError::TimedOut(limit));
                }
            }
            pacer.wait_for(index);

            let t = index as f64 / fps as f64;
            let active = timeline.active_event_at(t);
            let position = active.map(|entry| {
                let (x, y) = entry.event.position();
                page.clamp(x, y)
            });

            if let (Some(entry), Some(at)) = (active, position) {
                trail.push(TrailSample {
                    x: at.x,
                    y: at.y,
                    kind: entry.event.kind,
                });
                if let Err(e) = dispatch(browser, entry, &mut cursor, at) {
                    tracing::warn!(
                        session = session.id,
                        frame = index,
                        event = entry.index,
                        kind = %entry.event.kind,
                        error = %e,
                        "Event replay failed, skipping action"
                    );
                }
                pacer.settle(self.settings.action_settle);
            }

            let raw = capture(browser, index);
            let size = frames
                .dimensions()
                .unwrap_or_else(|| standard_size(raw.as_ref()));
            let info = OverlayInfo {
                time: t,
                total_duration,
                event_count: timeline.len(),
                active: active.zip(position).map(|(entry, at)| ActiveEvent {
                    index: entry.index,
                    event: &entry.event,
                    position: (at.x, at.y),
                }),
            };
            let frame = compositor
                .compose(raw, size, &trail, &info)
                .with_frame_number(index)
                .with_simulated_time(t);
            frames.push(frame);
        }

        if frames.is_empty() {
            // Too short for a single frame at this rate: keep one capture.
            let raw = browser.capture_frame().map_err(|e| {
                tracing::error!(session = session.id, error = %e, "Fallback capture failed");
                ReplayError::NoFrames
            })?;
            if !raw.is_usable() {
                return Err(ReplayError::NoFrames);
            }
            let size = raw.dimensions();
            let entry = timeline.active_event_at(0.0);
            let info = OverlayInfo {
                time: 0.0,
                total_duration,
                event_count: timeline.len(),
                active: entry.map(|entry| {
                    let (x, y) = entry.event.position();
                    let at = page.clamp(x, y);
                    ActiveEvent {
                        index: entry.index,
                        event: &entry.event,
                        position: (at.x, at.y),
                    }
                }),
            };
            frames.push(compositor.compose(Some(raw), size, &trail, &info));
        }

        tracing::info!(session = session.id, frames = frames.len(), "Replay captured");
        Ok(frames)
    }
}

fn load_page(
    browser: &mut dyn BrowserController,
    url: &str,
    settle: Duration,
) -> Result<PageDimensions> {
    browser.navigate(url)?;
    if !settle.is_zero() {
        std::thread::sleep(settle);
    }
    let page = browser.page_dimensions()?;
    tracing::debug!(url, width = page.width, height = page.height, "Page loaded");
    Ok(page)
}

/// Replay one event against the browser.
///
/// `cursor` tracks the automation pointer: it follows moves and clicks that
/// reached the page and is left alone by scrolls and other events.
fn dispatch(
    browser: &mut dyn BrowserController,
    entry: &TimelineEntry,
    cursor: &mut PagePoint,
    at: PagePoint,
) -> std::result::Result<(), EventReplayError> {
    let delta = cursor.delta_to(at);
    let moved = match entry.event.kind {
        EventKind::Move => browser.pointer_move(delta, at),
        EventKind::Click => browser.click(delta, at),
        EventKind::Scroll => {
            let payload = entry.event.scroll_payload()?;
            browser.scroll_to(payload.scroll_y)?;
            return Ok(());
        }
        EventKind::Other => return Ok(()),
    };
    match moved {
        Ok(()) => {
            *cursor = at;
            Ok(())
        }
        Err(e) => {
            if e.pointer_moved() {
                *cursor = at;
            }
            Err(e.into())
        }
    }
}

/// Capture the viewport, logging and absorbing failures.
fn capture(browser: &mut dyn BrowserController, index: u64) -> Option<CapturedFrame> {
    match browser.capture_frame() {
        Ok(frame) if frame.is_usable() => Some(frame),
        Ok(_) => {
            tracing::warn!(frame = index, "Empty capture, using blank canvas");
            None
        }
        Err(e) => {
            tracing::warn!(frame = index, error = %e, "Capture failed, using blank canvas");
            None
        }
    }
}

/// Size fixed by the first frame of a sequence.
fn standard_size(first: Option<&CapturedFrame>) -> (u32, u32) {
    first
        .map(CapturedFrame::dimensions)
        .unwrap_or((FALLBACK_FRAME_WIDTH, FALLBACK_FRAME_HEIGHT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowreplay_browser::testing::{BrowserCall, ScriptedLauncher};
    use flowreplay_recorder::RecordedEvent;
    use serde_json::json;

    fn entry(event: RecordedEvent) -> TimelineEntry {
        TimelineEntry {
            offset: 0.0,
            index: 0,
            event,
        }
    }

    #[test]
    fn dispatch_uses_relative_delta_and_absolute_target() {
        let launcher = ScriptedLauncher::new(800, 600);
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();
        let click = entry(RecordedEvent::new(EventKind::Click, 0).at(30, 40));

        let mut cursor = PagePoint::new(10, 10);
        dispatch(browser.as_mut(), &click, &mut cursor, PagePoint::new(30, 40)).unwrap();

        assert_eq!(cursor, PagePoint::new(30, 40));

        assert_eq!(
            launcher.log().calls(),
            vec![
                BrowserCall::Launch,
                BrowserCall::Click {
                    delta: (20, 30),
                    at: PagePoint::new(30, 40)
                }
            ]
        );
    }

    #[test]
    fn scroll_goes_to_payload_offset() {
        let launcher = ScriptedLauncher::new(800, 600);
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();
        let scroll = entry(
            RecordedEvent::new(EventKind::Scroll, 0)
                .at(5, 5)
                .with_payload(json!({"scrollY": 640.0, "pageHeight": 3200.0})),
        );

        let mut cursor = PagePoint::new(1, 2);
        dispatch(browser.as_mut(), &scroll, &mut cursor, PagePoint::new(5, 5)).unwrap();
        assert!(launcher.log().calls().contains(&BrowserCall::ScrollTo(640.0)));
        assert_eq!(cursor, PagePoint::new(1, 2));
    }

    #[test]
    fn malformed_scroll_payload_is_an_event_error() {
        let launcher = ScriptedLauncher::new(800, 600);
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();
        let scroll = entry(RecordedEvent::new(EventKind::Scroll, 0).with_payload(json!("{oops")));

        let mut cursor = PagePoint::default();
        let err = dispatch(browser.as_mut(), &scroll, &mut cursor, PagePoint::default()).unwrap_err();
        assert!(matches!(err, EventReplayError::Payload(_)));
    }

    #[test]
    fn cursor_follows_moves_whose_dom_events_failed() {
        let launcher = ScriptedLauncher::new(800, 600).fail_dom_events();
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();
        let mv = entry(RecordedEvent::new(EventKind::Move, 0).at(70, 80));

        let mut cursor = PagePoint::new(10, 10);
        assert!(dispatch(browser.as_mut(), &mv, &mut cursor, PagePoint::new(70, 80)).is_err());
        assert_eq!(cursor, PagePoint::new(70, 80));
    }

    #[test]
    fn cursor_stays_when_click_never_reached_the_page() {
        let launcher = ScriptedLauncher::new(800, 600).fail_clicks();
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();
        let click = entry(RecordedEvent::new(EventKind::Click, 0).at(70, 80));

        let mut cursor = PagePoint::new(10, 10);
        assert!(dispatch(browser.as_mut(), &click, &mut cursor, PagePoint::new(70, 80)).is_err());
        assert_eq!(cursor, PagePoint::new(10, 10));
    }

    #[test]
    fn other_events_leave_cursor_alone() {
        let launcher = ScriptedLauncher::new(800, 600);
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();
        let other = entry(RecordedEvent::new(EventKind::Other, 0).at(300, 300));

        let mut cursor = PagePoint::new(10, 10);
        dispatch(browser.as_mut(), &other, &mut cursor, PagePoint::new(300, 300)).unwrap();
        assert_eq!(cursor, PagePoint::new(10, 10));
        assert_eq!(launcher.log().calls(), vec![BrowserCall::Launch]);
    }

    #[test]
    fn standard_size_falls_back_without_capture() {
        assert_eq!(standard_size(None), (1280, 720));
        let frame = CapturedFrame::blank(320, 180);
        assert_eq!(standard_size(Some(&frame)), (320, 180));
    }

    #[test]
    fn history_starts_idle() {
        let machine = StateMachine::new(1);
        assert_eq!(machine.history, vec![ReplayState::Idle]);
        assert!(ReplayState::Failed.is_terminal());
        assert_eq!(ReplayState::BrowserLaunching.to_string(), "browser_launching");
    }
}
