//! mpv render backend (images and video)
//!
//! One long-lived `mpv` process runs in idle mode with a forced fullscreen
//! window and is driven through its JSON IPC socket. Commands are written
//! as newline-delimited JSON objects carrying a `request_id`; the reply with
//! the same id is awaited (asynchronous `event` lines in between are
//! ignored).
//!
//! The process is launched on first use and relaunched lazily if it exits.
//! [`MpvRenderer::shutdown`] quits it.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ImageRenderer, VideoRenderer};
use crate::config::RendererConfig;
use crate::error::{Error, Result};

/// How long to wait for a reply to one IPC command
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a freshly launched mpv gets to create its IPC socket
const SOCKET_WAIT: Duration = Duration::from_secs(5);
const SOCKET_POLL: Duration = Duration::from_millis(100);

/// Grace period for `quit` before the process is killed
const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Arguments every mpv launch gets (the IPC socket is appended)
const BASE_ARGS: &[&str] = &[
    "--idle=yes",
    "--force-window=yes",
    "--fs",
    "--no-osc",
    "--no-terminal",
    "--image-display-duration=inf",
    "--keep-open=yes",
];

/// Image and video renderer backed by a single mpv process
pub struct MpvRenderer {
    config: RendererConfig,
    inner: Mutex<MpvProcess>,
    next_request_id: AtomicU64,
}

#[derive(Default)]
struct MpvProcess {
    child: Option<Child>,
    ipc: Option<IpcConnection>,
}

impl MpvRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(MpvProcess::default()),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Send one command, launching or reconnecting to mpv as needed
    pub async fn command(&self, args: Vec<Value>) -> Result<Value> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let mut process = self.inner.lock().await;

        self.ensure_running(&mut process).await?;

        let ipc = process
            .ipc
            .as_mut()
            .ok_or_else(|| Error::Render("mpv IPC not connected".to_string()))?;

        match ipc.request(request_id, &args, REPLY_TIMEOUT).await {
            Ok(data) => Ok(data),
            Err(e @ Error::Render(_)) => Err(e),
            Err(e) => {
                // Broken connection: reconnect (or relaunch) on the next command
                warn!("mpv IPC failed, dropping connection: {}", e);
                process.ipc = None;
                Err(e)
            }
        }
    }

    async fn set_property(&self, name: &str, value: Value) -> Result<()> {
        self.command(vec![json!("set_property"), json!(name), value])
            .await
            .map(|_| ())
    }

    async fn load(&self, path: &str) -> Result<()> {
        self.command(vec![json!("loadfile"), json!(path), json!("replace")])
            .await
            .map(|_| ())
    }

    async fn ensure_running(&self, process: &mut MpvProcess) -> Result<()> {
        let exited = match process.child.as_mut() {
            Some(child) => child.try_wait()?.is_some(),
            None => true,
        };

        if exited {
            if process.child.is_some() {
                warn!("mpv exited, relaunching");
            }
            process.ipc = None;
            process.child = Some(self.launch().await?);
        }

        if process.ipc.is_none() {
            process.ipc = Some(IpcConnection::connect_with_retry(&self.config.ipc_socket).await?);
            debug!("Connected to mpv IPC at {}", self.config.ipc_socket.display());
        }

        Ok(())
    }

    async fn launch(&self) -> Result<Child> {
        let socket = &self.config.ipc_socket;

        // A stale socket from a previous run would make connect() succeed
        // against nothing
        if socket.exists() {
            tokio::fs::remove_file(socket).await?;
        }

        let child = Command::new(&self.config.mpv_binary)
            .args(BASE_ARGS)
            .args(&self.config.mpv_args)
            .arg(format!("--input-ipc-server={}", socket.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Process(format!("Failed to start {}: {}", self.config.mpv_binary, e))
            })?;

        info!(
            "Launched {} (pid {:?}), IPC socket {}",
            self.config.mpv_binary,
            child.id(),
            socket.display()
        );
        Ok(child)
    }

    /// Quit mpv, killing it if it does not exit promptly
    pub async fn shutdown(&self) {
        let mut process = self.inner.lock().await;

        if let Some(ipc) = process.ipc.as_mut() {
            let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = ipc.send(request_id, &[json!("quit")]).await {
                debug!("mpv quit command failed: {}", e);
            }
        }
        process.ipc = None;

        if let Some(mut child) = process.child.take() {
            match tokio::time::timeout(QUIT_GRACE, child.wait()).await {
                Ok(_) => debug!("mpv exited"),
                Err(_) => {
                    warn!("mpv did not quit within {:?}, killing", QUIT_GRACE);
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                }
            }
        }

        let _ = tokio::fs::remove_file(&self.config.ipc_socket).await;
        info!("mpv renderer shut down");
    }
}

#[async_trait]
impl VideoRenderer for MpvRenderer {
    async fn play(&self, path: &str, looping: bool, hw_accel: bool) -> Result<()> {
        let loop_file = if looping { "inf" } else { "no" };
        let hwdec = if hw_accel { self.config.hwdec.as_str() } else { "no" };

        self.set_property("loop-file", json!(loop_file)).await?;
        self.set_property("hwdec", json!(hwdec)).await?;
        self.load(path).await
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        self.set_property("volume", json!(volume)).await
    }

    async fn stop(&self) -> Result<()> {
        self.command(vec![json!("stop")]).await.map(|_| ())
    }
}

#[async_trait]
impl ImageRenderer for MpvRenderer {
    async fn show(&self, path: &str) -> Result<()> {
        self.set_property("loop-file", json!("no")).await?;
        self.load(path).await
    }

    async fn clear(&self) -> Result<()> {
        self.command(vec![json!("stop")]).await.map(|_| ())
    }
}

// ========================================
// IPC connection
// ========================================

struct IpcConnection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl IpcConnection {
    async fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path).await?;
        let (read, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(read).lines(),
            writer,
        })
    }

    async fn connect_with_retry(path: &Path) -> Result<Self> {
        let deadline = tokio::time::Instant::now() + SOCKET_WAIT;
        loop {
            match Self::connect(path).await {
                Ok(conn) => return Ok(conn),
                Err(e) if tokio::time::Instant::now() >= deadline => {
                    return Err(Error::Process(format!(
                        "mpv IPC socket {} not available: {}",
                        path.display(),
                        e
                    )));
                }
                Err(_) => tokio::time::sleep(SOCKET_POLL).await,
            }
        }
    }

    async fn send(&mut self, request_id: u64, args: &[Value]) -> Result<()> {
        let mut line = encode_command(request_id, args);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn request(&mut self, request_id: u64, args: &[Value], timeout: Duration) -> Result<Value> {
        self.send(request_id, args).await?;

        tokio::time::timeout(timeout, self.read_reply(request_id))
            .await
            .map_err(|_| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("no reply from mpv to request {}", request_id),
                ))
            })?
    }

    async fn read_reply(&mut self, request_id: u64) -> Result<Value> {
        loop {
            let line = self.lines.next_line().await?.ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "mpv closed the IPC socket",
                ))
            })?;

            if let Some(reply) = match_reply(&line, request_id) {
                return reply;
            }
        }
    }
}

fn encode_command(request_id: u64, args: &[Value]) -> String {
    json!({ "command": args, "request_id": request_id }).to_string()
}

/// Interpret one IPC line as the reply to `request_id`
///
/// Returns `None` for events, replies to other requests and unparseable
/// lines.
fn match_reply(line: &str, request_id: u64) -> Option<Result<Value>> {
    let value: Value = serde_json::from_str(line).ok()?;

    if value.get("request_id").and_then(Value::as_u64) != Some(request_id) {
        return None;
    }

    match value.get("error").and_then(Value::as_str) {
        Some("success") => Some(Ok(value.get("data").cloned().unwrap_or(Value::Null))),
        Some(err) => Some(Err(Error::Render(format!("mpv: {}", err)))),
        None => Some(Err(Error::Render("mpv reply without status".to_string()))),
    }
}
