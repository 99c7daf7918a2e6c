//! Flowreplay Browser
//!
//! The capability interface replay generation uses to drive a real browser:
//! navigation, synthetic pointer/click/scroll input, viewport capture and
//! lifecycle.
//!
//! Two implementations ship with the crate:
//! - `WebDriverLauncher` - any W3C WebDriver server (chromedriver by default)
//! - `testing::ScriptedLauncher` - deterministic double returning scripted
//!   frames and dimensions, for tests without a live browser
//!
//! Controllers are owned by a `BrowserSession`, which closes the browser on
//! every exit path.

mod error;
mod session;
pub mod testing;
pub mod webdriver;

pub use error::{BrowserError, Result};
pub use session::BrowserSession;
pub use webdriver::{WebDriverConfig, WebDriverLauncher};

use flowreplay_recorder::CapturedFrame;

/// Marker appended to the replay browser's user agent so the page tracker
/// ignores traffic generated by replays.
pub const REPLAY_USER_AGENT_MARKER: &str = "MOUSE_FLOW_VIDEO_GENERATION";

/// Options applied when a browser is launched.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub window_width: u32,
    pub window_height: u32,
    pub headless: bool,
    pub user_agent: Option<String>,
    /// Additional command-line switches passed to the browser.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            headless: true,
            user_agent: Some(format!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 {REPLAY_USER_AGENT_MARKER}"
            )),
            extra_args: Vec::new(),
        }
    }
}

impl LaunchOptions {
    /// Chrome command-line switches for these options.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--disable-extensions",
            "--disable-plugins",
            "--disable-web-security",
            "--disable-features=VizDisplayCompositor",
            "--disable-popup-blocking",
            "--disable-notifications",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push(format!(
            "--window-size={},{}",
            self.window_width, self.window_height
        ));
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Size of the full scrollable document, not just the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageDimensions {
    pub width: u32,
    pub height: u32,
}

impl PageDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp a coordinate into `[0, width-1] x [0, height-1]`.
    pub fn clamp(&self, x: i64, y: i64) -> PagePoint {
        PagePoint {
            x: x.clamp(0, self.width.saturating_sub(1) as i64),
            y: y.clamp(0, self.height.saturating_sub(1) as i64),
        }
    }
}

/// An absolute point in page coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PagePoint {
    pub x: i64,
    pub y: i64,
}

impl PagePoint {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Relative move from `self` to `to`.
    pub fn delta_to(&self, to: PagePoint) -> (i64, i64) {
        (to.x - self.x, to.y - self.y)
    }
}

/// A live browser driven by replay generation.
///
/// Every call may block. Pointer and click calls take both the relative
/// delta from the previous cursor position (for the automation layer) and
/// the absolute target (for DOM-level synthetic events).
pub trait BrowserController: Send {
    /// Load `url`, returning once the page is interactive.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Size of the whole scrollable document.
    fn page_dimensions(&mut self) -> Result<PageDimensions>;

    /// Move the pointer by `delta` and dispatch a DOM `mousemove` at `at`.
    ///
    /// `BrowserError::DomEvent` means the pointer moved but the DOM events
    /// were lost; any other error means the pointer stayed put.
    fn pointer_move(&mut self, delta: (i64, i64), at: PagePoint) -> Result<()>;

    /// Move by `delta`, press and release, and dispatch DOM click events at
    /// `at`. Errors follow `pointer_move`.
    fn click(&mut self, delta: (i64, i64), at: PagePoint) -> Result<()>;

    /// Set the document's vertical scroll offset.
    fn scroll_to(&mut self, scroll_y: f64) -> Result<()>;

    /// Capture the current viewport as RGBA.
    fn capture_frame(&mut self) -> Result<CapturedFrame>;

    /// Release the browser. Must be safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

/// Starts browsers.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserController>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_args_carry_window_size_and_marker() {
        let args = LaunchOptions::default().chrome_args();
        assert!(args.contains(&"--window-size=1280,720".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args
            .iter()
            .any(|a| a.starts_with("--user-agent=") && a.ends_with(REPLAY_USER_AGENT_MARKER)));
    }

    #[test]
    fn headful_launch_omits_headless_switch() {
        let options = LaunchOptions {
            headless: false,
            user_agent: None,
            ..LaunchOptions::default()
        };
        let args = options.chrome_args();
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(!args.iter().any(|a| a.starts_with("--user-agent")));
    }

    #[test]
    fn page_clamp() {
        let page = PageDimensions::new(1280, 2000);
        assert_eq!(page.clamp(-4, 5000), PagePoint::new(0, 1999));
        assert_eq!(page.clamp(1500, 10), PagePoint::new(1279, 10));
        assert_eq!(PageDimensions::new(0, 0).clamp(5, 5), PagePoint::new(0, 0));
    }

    #[test]
    fn delta_between_points() {
        assert_eq!(PagePoint::new(10, 10).delta_to(PagePoint::new(4, 30)), (-6, 20));
    }
}
