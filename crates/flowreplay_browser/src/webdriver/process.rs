//! A locally spawned WebDriver server (chromedriver).

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::{BrowserError, Result};

/// Driver child process, killed on drop.
pub struct DriverProcess {
    child: Child,
    port: u16,
}

impl DriverProcess {
    pub fn spawn(binary: &Path, port: u16) -> Result<Self> {
        let child = Command::new(binary)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| {
                if error.kind() == ErrorKind::NotFound {
                    BrowserError::Launch(format!(
                        "{} was not found. Install chromedriver or set browser.driver_binary",
                        binary.display()
                    ))
                } else {
                    BrowserError::Launch(format!(
                        "failed to spawn {}: {error}",
                        binary.display()
                    ))
                }
            })?;

        tracing::debug!(binary = %binary.display(), port, pid = child.id(), "Spawned WebDriver server");
        Ok(Self { child, port })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Whether the process already exited (e.g. port in use).
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    pub fn kill(&mut self) {
        if self.has_exited() {
            return;
        }
        if let Err(e) = self.child.kill() {
            tracing::warn!(error = %e, "Failed to kill WebDriver server");
        }
        let _ = self.child.wait();
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        self.kill();
    }
}
