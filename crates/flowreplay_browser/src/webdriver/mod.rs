//! W3C WebDriver backend.
//!
//! Talks to a WebDriver server over HTTP. The server is either already
//! running at `server_url` or spawned per launch from `driver_binary`.

mod process;
mod protocol;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use base64::Engine;
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};

use flowreplay_recorder::CapturedFrame;

use crate::{
    BrowserController, BrowserError, BrowserLauncher, LaunchOptions, PageDimensions, PagePoint,
    Result,
};
use process::DriverProcess;
use protocol::ErrorValue;

/// Where and how to reach the WebDriver server.
#[derive(Clone, Debug)]
pub struct WebDriverConfig {
    /// Base URL of an already running server. Ignored when
    /// `driver_binary` is set.
    pub server_url: String,
    /// Spawn this driver binary per launch instead.
    pub driver_binary: Option<PathBuf>,
    /// Port for spawned drivers.
    pub driver_port: u16,
    /// How long to wait for a spawned driver to report ready.
    pub startup_timeout: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:9515".to_string(),
            driver_binary: None,
            driver_port: 9515,
            startup_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Launches Chrome through WebDriver.
#[derive(Clone, Debug)]
pub struct WebDriverLauncher {
    config: WebDriverConfig,
}

impl WebDriverLauncher {
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }

    fn wait_until_ready(&self, client: &Client, base: &str, driver: &mut DriverProcess) -> Result<()> {
        let deadline = Instant::now() + self.config.startup_timeout;
        loop {
            if driver.has_exited() {
                return Err(BrowserError::Launch("WebDriver server exited during startup".into()));
            }
            let ready = client
                .get(format!("{base}/status"))
                .send()
                .ok()
                .and_then(|resp| resp.json::<protocol::Response>().ok())
                .and_then(|resp| serde_json::from_value::<protocol::Status>(resp.value).ok())
                .is_some_and(|status| status.ready);
            if ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Launch(format!(
                    "WebDriver server at {base} not ready after {:?}",
                    self.config.startup_timeout
                )));
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

impl BrowserLauncher for WebDriverLauncher {
    fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserController>> {
        let client = Client::builder()
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|e| BrowserError::Launch(format!("failed to build HTTP client: {e}")))?;

        let (base, driver) = match &self.config.driver_binary {
            Some(binary) => {
                let mut driver = DriverProcess::spawn(binary, self.config.driver_port)?;
                let base = driver.base_url();
                self.wait_until_ready(&client, &base, &mut driver)?;
                (base, Some(driver))
            }
            None => (self.config.server_url.trim_end_matches('/').to_string(), None),
        };

        let mut browser = WebDriverBrowser {
            client,
            base,
            session_id: String::new(),
            driver,
            closed: false,
        };
        let value = browser
            .command(Method::POST, "/session", Some(protocol::new_session_request(options)))
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        let session: protocol::NewSession = serde_json::from_value(value)
            .map_err(|e| BrowserError::Launch(format!("unexpected new session response: {e}")))?;
        browser.session_id = session.session_id;

        tracing::info!(session = %browser.session_id, base = %browser.base, "WebDriver session started");
        Ok(Box::new(browser))
    }
}

/// A live WebDriver session.
pub struct WebDriverBrowser {
    client: Client,
    base: String,
    session_id: String,
    driver: Option<DriverProcess>,
    closed: bool,
}

impl WebDriverBrowser {
    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base, self.session_id, path)
    }

    /// Send a command and unwrap the `value` envelope.
    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = if path == "/session" {
            format!("{}{}", self.base, path)
        } else {
            self.session_url(path)
        };

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send()?;
        let status = response.status();
        let envelope: protocol::Response = response.json()?;

        if status.is_success() {
            return Ok(envelope.value);
        }
        match serde_json::from_value::<ErrorValue>(envelope.value) {
            Ok(err) => Err(BrowserError::WebDriver {
                error: err.error,
                message: err.message,
            }),
            Err(_) => Err(BrowserError::WebDriver {
                error: status.to_string(),
                message: String::new(),
            }),
        }
    }

    fn execute(&self, source: &str, args: Vec<Value>) -> Result<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(protocol::script(source, args)),
        )
        .map_err(|e| BrowserError::Script(e.to_string()))
    }

    fn perform(&self, actions: Value) -> Result<()> {
        self.command(Method::POST, "/actions", Some(actions))
            .map_err(|e| BrowserError::Input(e.to_string()))?;
        Ok(())
    }

    /// Fire DOM mouse events at `at`. Runs after the automation pointer has
    /// already moved, so failures are reported as `DomEvent`.
    fn dispatch_dom(&self, at: PagePoint, types: &[&str]) -> Result<()> {
        self.execute(
            protocol::DISPATCH_MOUSE_EVENTS,
            vec![json!(at.x), json!(at.y), json!(types)],
        )
        .map_err(|e| BrowserError::DomEvent(e.to_string()))?;
        Ok(())
    }
}

impl BrowserController for WebDriverBrowser {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        tracing::debug!(url, "Page loaded");
        Ok(())
    }

    fn page_dimensions(&mut self) -> Result<PageDimensions> {
        let value = self.execute(protocol::PAGE_DIMENSIONS, Vec::new())?;
        let dims: Vec<f64> = serde_json::from_value(value)
            .map_err(|e| BrowserError::Script(format!("unexpected page dimensions: {e}")))?;
        match dims.as_slice() {
            [width, height] => Ok(PageDimensions::new(
                width.max(1.0) as u32,
                height.max(1.0) as u32,
            )),
            other => Err(BrowserError::Script(format!(
                "expected [width, height], got {other:?}"
            ))),
        }
    }

    fn pointer_move(&mut self, delta: (i64, i64), at: PagePoint) -> Result<()> {
        self.perform(protocol::move_by(delta))?;
        self.dispatch_dom(at, &["mousemove", "mouseenter"])
    }

    fn click(&mut self, delta: (i64, i64), at: PagePoint) -> Result<()> {
        self.perform(protocol::move_and_click(delta))?;
        self.dispatch_dom(at, &["mousedown", "mouseup", "click"])
    }

    fn scroll_to(&mut self, scroll_y: f64) -> Result<()> {
        self.execute(protocol::SCROLL_TO, vec![json!(scroll_y)])?;
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<CapturedFrame> {
        let value = self
            .command(Method::GET, "/screenshot", None)
            .map_err(|e| BrowserError::Capture(e.to_string()))?;
        let encoded = value
            .as_str()
            .ok_or_else(|| BrowserError::Capture("screenshot is not a string".into()))?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| BrowserError::Capture(format!("invalid base64: {e}")))?;
        let image = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .map_err(|e| BrowserError::Capture(format!("invalid PNG: {e}")))?
            .to_rgba8();

        let (width, height) = image.dimensions();
        Ok(CapturedFrame::new(image.into_raw(), width, height))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.command(Method::DELETE, "", None).map(|_| ());
        if let Some(mut driver) = self.driver.take() {
            driver.kill();
        }
        tracing::info!(session = %self.session_id, "WebDriver session closed");
        result
    }
}

impl Drop for WebDriverBrowser {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!(error = %e, "WebDriver session close on drop failed");
        }
    }
}
