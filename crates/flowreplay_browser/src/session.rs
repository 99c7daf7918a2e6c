//! Scoped ownership of a launched browser.

use crate::{BrowserController, BrowserError, BrowserLauncher, LaunchOptions, Result};

/// Owns a launched browser and closes it exactly once: on `close()` or,
/// failing that, on drop.
pub struct BrowserSession {
    browser: Option<Box<dyn BrowserController>>,
}

impl BrowserSession {
    /// Launch a browser with the given launcher.
    pub fn launch(launcher: &dyn BrowserLauncher, options: &LaunchOptions) -> Result<Self> {
        let browser = launcher.launch(options)?;
        tracing::debug!(
            width = options.window_width,
            height = options.window_height,
            headless = options.headless,
            "Browser launched"
        );
        Ok(Self {
            browser: Some(browser),
        })
    }

    pub fn is_open(&self) -> bool {
        self.browser.is_some()
    }

    /// Access the live browser.
    pub fn controller(&mut self) -> Result<&mut dyn BrowserController> {
        match self.browser.as_mut() {
            Some(browser) => Ok(&mut **browser),
            None => Err(BrowserError::Closed),
        }
    }

    /// Close the browser. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        match self.browser.take() {
            Some(mut browser) => {
                tracing::debug!("Closing browser");
                browser.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to close browser");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrowserCall, ScriptedLauncher};

    #[test]
    fn drop_closes_once() {
        let launcher = ScriptedLauncher::new(800, 600);
        let log = launcher.log();
        {
            let mut session = BrowserSession::launch(&launcher, &LaunchOptions::default()).unwrap();
            session.controller().unwrap().navigate("https://a.test").unwrap();
        }
        assert_eq!(log.count(|c| *c == BrowserCall::Close), 1);
    }

    #[test]
    fn explicit_close_is_idempotent() {
        let launcher = ScriptedLauncher::new(800, 600);
        let log = launcher.log();
        let mut session = BrowserSession::launch(&launcher, &LaunchOptions::default()).unwrap();

        session.close().unwrap();
        session.close().unwrap();
        assert!(!session.is_open());
        assert!(matches!(session.controller(), Err(BrowserError::Closed)));
        drop(session);

        assert_eq!(log.count(|c| *c == BrowserCall::Close), 1);
    }
}
