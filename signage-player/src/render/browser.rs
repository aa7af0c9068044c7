//! Kiosk browser render backend (web content)
//!
//! Every web slot gets a fresh browser process started in its own process
//! group. Closing a slot terminates that group only, so other browser
//! instances on the machine are left alone.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{WebProcess, WebRenderer};
use crate::config::RendererConfig;
use crate::error::{Error, Result};

/// How long a closing browser gets to exit after being signalled
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Web renderer spawning one kiosk-mode browser per slot
pub struct KioskBrowser {
    binary: String,
    flags: Vec<String>,
}

impl KioskBrowser {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            binary: config.browser_binary.clone(),
            flags: config.browser_flags.clone(),
        }
    }

    fn command(&self, uri: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.flags)
            .arg(uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Own process group so the renderer helpers die with the browser
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd
    }
}

#[async_trait]
impl WebRenderer for KioskBrowser {
    async fn open(&self, uri: &str) -> Result<WebProcess> {
        let child = self
            .command(uri)
            .spawn()
            .map_err(|e| Error::Process(format!("Failed to start {}: {}", self.binary, e)))?;

        info!("Opened {} in {} (pid {:?})", uri, self.binary, child.id());
        Ok(WebProcess::spawned(child))
    }

    async fn close(&self, mut process: WebProcess) -> Result<()> {
        if let Some(pid) = process.pid() {
            signal_group(pid).await;
        }

        let Some(child) = process.child_mut() else {
            return Ok(());
        };

        if let Err(e) = child.start_kill() {
            // Already reaped
            debug!("start_kill on browser failed: {}", e);
        }

        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Browser (pid {:?}) exited: {}", process.pid(), status);
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Process(format!("Failed to reap browser: {}", e))),
            Err(_) => {
                warn!("Browser (pid {:?}) did not exit within {:?}", process.pid(), EXIT_GRACE);
                Err(Error::Process("browser did not exit".to_string()))
            }
        }
    }
}

/// Send SIGTERM to the process group led by `pid`
#[cfg(unix)]
async fn signal_group(pid: u32) {
    let result = Command::new("kill")
        .args(["-TERM", &format!("-{}", pid)])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Err(e) = result {
        debug!("Failed to signal process group {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
async fn signal_group(_pid: u32) {}
