use thiserror::Error;

/// Browser automation errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Input synthesis failed: {0}")]
    Input(String),

    /// The automation pointer moved, but the synthetic DOM events that
    /// follow the move could not be dispatched.
    #[error("DOM event dispatch failed: {0}")]
    DomEvent(String),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Browser session is closed")]
    Closed,

    #[error("WebDriver {error}: {message}")]
    WebDriver { error: String, message: String },

    #[error("WebDriver transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl BrowserError {
    /// Whether the automation pointer reached its target despite this error.
    pub fn pointer_moved(&self) -> bool {
        matches!(self, BrowserError::DomEvent(_))
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
