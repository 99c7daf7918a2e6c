//! Flowreplay configuration file handling (flowreplay.toml)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use flowreplay_browser::{LaunchOptions, WebDriverConfig};
use flowreplay_encoder::DEFAULT_CODEC_CANDIDATES;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "flowreplay.toml";

/// Top-level configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Replay loop settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReplayConfig {
    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Page opened when the session has no usable URL
    #[serde(default = "default_url")]
    pub default_url: String,
    /// Wait after navigation before reading page dimensions
    #[serde(default = "default_navigation_settle_ms")]
    pub navigation_settle_ms: u64,
    /// Pause after each dispatched action (paced runs only)
    #[serde(default = "default_action_settle_ms")]
    pub action_settle_ms: u64,
    /// Keep the browser in step with simulated time
    #[serde(default = "default_true")]
    pub realtime_pacing: bool,
    /// Cursor trail length in samples
    #[serde(default = "default_trail_length")]
    pub trail_length: usize,
    /// Upper bound on time spent replaying one session
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Render overlay text with system fonts
    #[serde(default = "default_true")]
    pub overlay_text: bool,
}

fn default_fps() -> u32 {
    15
}

fn default_url() -> String {
    "https://example.com".to_string()
}

fn default_navigation_settle_ms() -> u64 {
    3000
}

fn default_action_settle_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

fn default_trail_length() -> usize {
    flowreplay_recorder::DEFAULT_TRAIL_CAPACITY
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            default_url: default_url(),
            navigation_settle_ms: default_navigation_settle_ms(),
            action_settle_ms: default_action_settle_ms(),
            realtime_pacing: true,
            trail_length: default_trail_length(),
            timeout_secs: None,
            overlay_text: true,
        }
    }
}

impl ReplayConfig {
    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Browser launch and WebDriver connection
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_width")]
    pub window_width: u32,
    #[serde(default = "default_height")]
    pub window_height: u32,
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Overrides the default replay user agent
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Already running WebDriver server
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// Spawn this driver per replay instead of using `webdriver_url`
    #[serde(default)]
    pub driver_binary: Option<PathBuf>,
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_webdriver_url() -> String {
    "http://127.0.0.1:9515".to_string()
}

fn default_driver_port() -> u16 {
    9515
}

fn default_startup_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            window_width: default_width(),
            window_height: default_height(),
            headless: true,
            user_agent: None,
            extra_args: Vec::new(),
            webdriver_url: default_webdriver_url(),
            driver_binary: None,
            driver_port: default_driver_port(),
            startup_timeout_secs: default_startup_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BrowserConfig {
    pub fn launch_options(&self) -> LaunchOptions {
        let defaults = LaunchOptions::default();
        LaunchOptions {
            window_width: self.window_width,
            window_height: self.window_height,
            headless: self.headless,
            user_agent: self.user_agent.clone().or(defaults.user_agent),
            extra_args: self.extra_args.clone(),
        }
    }

    pub fn webdriver(&self) -> WebDriverConfig {
        WebDriverConfig {
            server_url: self.webdriver_url.clone(),
            driver_binary: self.driver_binary.clone(),
            driver_port: self.driver_port,
            startup_timeout: Duration::from_secs(self.startup_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Video encoding
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EncoderConfig {
    /// Codecs tried in order until one works
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: PathBuf,
}

fn default_candidates() -> Vec<String> {
    DEFAULT_CODEC_CANDIDATES.iter().map(|c| c.to_string()).collect()
}

fn default_ffmpeg_binary() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            ffmpeg_binary: default_ffmpeg_binary(),
        }
    }
}

/// Where sessions are read from and videos written to
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
    /// URL prefix under which `videos_dir` is served
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

fn default_sessions_dir() -> PathBuf {
    PathBuf::from("data/sessions")
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("static/videos")
}

fn default_public_prefix() -> String {
    "/static/videos".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sessions_dir: default_sessions_dir(),
            videos_dir: default_videos_dir(),
            public_prefix: default_public_prefix(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `path` if given, else `flowreplay.toml` in `dir` if present,
    /// else defaults.
    pub fn load_or_default(path: Option<&Path>, dir: &Path) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let candidate = dir.join(CONFIG_FILE_NAME);
                if candidate.exists() {
                    Self::load(&candidate)
                } else {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.replay.fps > 0, "replay.fps must be at least 1");
        anyhow::ensure!(
            self.browser.window_width > 0 && self.browser.window_height > 0,
            "browser window size must be non-zero"
        );
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
