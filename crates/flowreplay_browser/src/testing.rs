//! Deterministic browser double.
//!
//! `ScriptedLauncher` hands out browsers that report fixed page
//! dimensions, return solid-color frames and record every call, so replay
//! generation can be exercised without a live browser. Individual captures
//! and input kinds can be scripted to fail.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use flowreplay_recorder::CapturedFrame;

use crate::{
    BrowserController, BrowserError, BrowserLauncher, LaunchOptions, PageDimensions, PagePoint,
    Result,
};

/// Color of every scripted capture.
pub const SCRIPTED_FRAME_COLOR: [u8; 4] = [200, 200, 200, 255];

/// A call received by a scripted browser.
#[derive(Clone, Debug, PartialEq)]
pub enum BrowserCall {
    Launch,
    Navigate(String),
    PageDimensions,
    PointerMove { delta: (i64, i64), at: PagePoint },
    Click { delta: (i64, i64), at: PagePoint },
    ScrollTo(f64),
    Capture,
    Close,
}

/// Shared record of calls made to scripted browsers.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<BrowserCall>>>,
}

impl CallLog {
    fn record(&self, call: BrowserCall) {
        self.calls.lock().push(call);
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<BrowserCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&BrowserCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

/// Launcher for scripted browsers.
#[derive(Clone, Debug)]
pub struct ScriptedLauncher {
    page: PageDimensions,
    frame_size: (u32, u32),
    failing_captures: HashSet<usize>,
    empty_captures: HashSet<usize>,
    fail_launch: bool,
    fail_navigation: bool,
    fail_clicks: bool,
    fail_dom_events: bool,
    log: CallLog,
}

impl ScriptedLauncher {
    /// Browsers whose document is `page_width` x `page_height`; captures
    /// default to 320x180.
    pub fn new(page_width: u32, page_height: u32) -> Self {
        Self {
            page: PageDimensions::new(page_width, page_height),
            frame_size: (320, 180),
            failing_captures: HashSet::new(),
            empty_captures: HashSet::new(),
            fail_launch: false,
            fail_navigation: false,
            fail_clicks: false,
            fail_dom_events: false,
            log: CallLog::default(),
        }
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    /// Make the `n`th capture (0-based, across the browser's lifetime) fail.
    pub fn fail_capture_at(mut self, n: usize) -> Self {
        self.failing_captures.insert(n);
        self
    }

    /// Make the `n`th capture return an empty buffer.
    pub fn empty_capture_at(mut self, n: usize) -> Self {
        self.empty_captures.insert(n);
        self
    }

    pub fn fail_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn fail_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Every click dispatch fails.
    pub fn fail_clicks(mut self) -> Self {
        self.fail_clicks = true;
        self
    }

    /// Pointer moves and clicks reach the page but their DOM events fail.
    pub fn fail_dom_events(mut self) -> Self {
        self.fail_dom_events = true;
        self
    }

    /// Handle to the calls made to browsers from this launcher.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl BrowserLauncher for ScriptedLauncher {
    fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn BrowserController>> {
        self.log.record(BrowserCall::Launch);
        if self.fail_launch {
            return Err(BrowserError::Launch("scripted launch failure".into()));
        }
        Ok(Box::new(ScriptedBrowser {
            script: self.clone(),
            captures: 0,
            closed: false,
        }))
    }
}

/// A browser returning scripted results.
pub struct ScriptedBrowser {
    script: ScriptedLauncher,
    captures: usize,
    closed: bool,
}

impl ScriptedBrowser {
    fn dom_events(&self, at: PagePoint) -> Result<()> {
        if self.script.fail_dom_events {
            return Err(BrowserError::DomEvent(format!(
                "scripted DOM failure at ({}, {})",
                at.x, at.y
            )));
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }
}

impl BrowserController for ScriptedBrowser {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.script.log.record(BrowserCall::Navigate(url.to_string()));
        if self.script.fail_navigation {
            return Err(BrowserError::Navigation(format!("scripted failure for {url}")));
        }
        Ok(())
    }

    fn page_dimensions(&mut self) -> Result<PageDimensions> {
        self.ensure_open()?;
        self.script.log.record(BrowserCall::PageDimensions);
        Ok(self.script.page)
    }

    fn pointer_move(&mut self, delta: (i64, i64), at: PagePoint) -> Result<()> {
        self.ensure_open()?;
        self.script.log.record(BrowserCall::PointerMove { delta, at });
        self.dom_events(at)
    }

    fn click(&mut self, delta: (i64, i64), at: PagePoint) -> Result<()> {
        self.ensure_open()?;
        self.script.log.record(BrowserCall::Click { delta, at });
        if self.script.fail_clicks {
            return Err(BrowserError::Input("scripted click failure".into()));
        }
        self.dom_events(at)
    }

    fn scroll_to(&mut self, scroll_y: f64) -> Result<()> {
        self.ensure_open()?;
        self.script.log.record(BrowserCall::ScrollTo(scroll_y));
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<CapturedFrame> {
        self.ensure_open()?;
        self.script.log.record(BrowserCall::Capture);
        let n = self.captures;
        self.captures += 1;

        if self.script.failing_captures.contains(&n) {
            return Err(BrowserError::Capture(format!("scripted failure at capture {n}")));
        }
        if self.script.empty_captures.contains(&n) {
            return Ok(CapturedFrame::new(Vec::new(), 0, 0));
        }

        let (width, height) = self.script.frame_size;
        let data = SCRIPTED_FRAME_COLOR.repeat(width as usize * height as usize);
        Ok(CapturedFrame::new(data, width, height))
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.script.log.record(BrowserCall::Close);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_failures_are_per_capture() {
        let launcher = ScriptedLauncher::new(100, 100)
            .with_frame_size(4, 2)
            .fail_capture_at(1)
            .empty_capture_at(2);
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();

        let first = browser.capture_frame().unwrap();
        assert_eq!(first.dimensions(), (4, 2));
        assert_eq!(first.get_pixel(0, 0), Some(SCRIPTED_FRAME_COLOR));
        assert!(matches!(browser.capture_frame(), Err(BrowserError::Capture(_))));
        assert!(!browser.capture_frame().unwrap().is_usable());
        assert!(browser.capture_frame().unwrap().is_usable());
    }

    #[test]
    fn dom_failures_report_a_moved_pointer() {
        let launcher = ScriptedLauncher::new(100, 100).fail_dom_events();
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();

        let err = browser.pointer_move((3, 4), PagePoint::new(3, 4)).unwrap_err();
        assert!(err.pointer_moved());
        assert!(!BrowserError::Input("x".into()).pointer_moved());
    }

    #[test]
    fn closed_browser_rejects_calls() {
        let launcher = ScriptedLauncher::new(100, 100);
        let mut browser = launcher.launch(&LaunchOptions::default()).unwrap();
        browser.close().unwrap();
        assert!(matches!(browser.scroll_to(10.0), Err(BrowserError::Closed)));
        assert_eq!(launcher.log().count(|c| *c == BrowserCall::Close), 1);
    }
}
