//! Engine process management.
//!
//! Handles locating the stealth-browser's Node launcher, spawning it with a
//! serialized configuration on stdin, and extracting the WebSocket endpoint
//! it advertises on its output streams.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;

use emrpilot_protocol::{LaunchConfig, WsEndpoint};
use regex_lite::Regex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// File name of the engine's server launcher script.
const LAUNCHER_SCRIPT: &str = "launchServer.js";

/// A running engine process with the endpoint it advertised.
#[derive(Debug)]
pub struct LaunchedEngine {
    pub endpoint: WsEndpoint,
    pub process: Child,
}

impl LaunchedEngine {
    /// Kills the engine process and reaps it.
    pub async fn shutdown(mut self) -> Result<()> {
        self.process
            .kill()
            .await
            .map_err(|e| Error::LaunchFailed(format!("failed to kill engine process: {e}")))?;
        let _ = self.process.wait().await;
        Ok(())
    }
}

/// Spawns the engine launcher and waits for it to advertise an endpoint.
///
/// The launcher receives the base64-encoded camelCase JSON config on stdin
/// (stdin is closed afterwards) and prints log lines on stdout/stderr. The
/// first line containing a `ws://host:port/<hex>` URL wins; if both streams
/// end without one, the launch is a hard failure.
pub async fn launch(config: &LaunchConfig) -> Result<LaunchedEngine> {
    let (node_exe, launcher_js) = locate_launcher()?;
    debug!(target = "emrpilot.engine", node = %node_exe.display(), launcher = %launcher_js.display(), "spawning engine launcher");

    let mut cmd = Command::new(&node_exe);
    cmd.arg(&launcher_js)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(parent) = launcher_js.parent() {
        cmd.current_dir(parent);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| Error::LaunchFailed(format!("failed to spawn engine launcher: {e}")))?;

    let payload = config.to_stdin_payload()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(&payload).await?;
        stdin.shutdown().await?;
    }

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::LaunchFailed("engine stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::LaunchFailed("engine stderr not captured".into()))?;

    let endpoint = match scan_for_endpoint(stdout, stderr).await {
        Ok(endpoint) => endpoint,
        // No endpoint means the launcher is useless; don't leave it running.
        Err(e) => {
            let _ = child.kill().await;
            return Err(e);
        }
    };
    Ok(LaunchedEngine {
        endpoint,
        process: child,
    })
}

/// Reads both output streams line by line until one yields an endpoint.
///
/// The streams are raced rather than concatenated: the launcher logs on both
/// and the endpoint line has no guaranteed stream. Every line is re-emitted
/// at debug level so `-v` shows the launcher's own progress output.
async fn scan_for_endpoint(
    stdout: impl tokio::io::AsyncRead + Unpin,
    stderr: impl tokio::io::AsyncRead + Unpin,
) -> Result<WsEndpoint> {
    let mut out_lines = BufReader::new(stdout).lines();
    let mut err_lines = BufReader::new(stderr).lines();
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        let line = tokio::select! {
            line = out_lines.next_line(), if out_open => match line? {
                Some(l) => l,
                None => {
                    out_open = false;
                    continue;
                }
            },
            line = err_lines.next_line(), if err_open => match line? {
                Some(l) => l,
                None => {
                    err_open = false;
                    continue;
                }
            },
        };

        debug!(target = "emrpilot.engine", "{line}");
        if let Some(endpoint) = extract_endpoint(&line) {
            return Ok(endpoint);
        }
    }

    warn!(target = "emrpilot.engine", "launcher output ended without an endpoint");
    Err(Error::EndpointNotFound)
}

/// Extracts the first `ws://host:port/<hex>` URL from a launcher output line.
pub fn extract_endpoint(line: &str) -> Option<WsEndpoint> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN
        .get_or_init(|| Regex::new(r"(ws://[A-Za-z0-9.\-]+:\d+/[a-f0-9]+)").expect("valid pattern"));
    let m = re.captures(line)?;
    WsEndpoint::parse(m.get(1)?.as_str())
}

/// Locates the engine's Node binary and launcher script.
///
/// Search order: explicit `EMRPILOT_NODE_EXE`/`EMRPILOT_LAUNCHER_JS`
/// overrides, then `EMRPILOT_ENGINE_DIR`, then the per-user data directory,
/// then a `node` on PATH next to a data-dir launcher script. Runtime
/// overrides win so environments with their own Node can substitute it.
fn locate_launcher() -> Result<(PathBuf, PathBuf)> {
    if let (Ok(node), Ok(launcher)) = (
        std::env::var("EMRPILOT_NODE_EXE"),
        std::env::var("EMRPILOT_LAUNCHER_JS"),
    ) {
        let node = PathBuf::from(node);
        let launcher = PathBuf::from(launcher);
        if node.exists() && launcher.exists() {
            return Ok((node, launcher));
        }
        warn!(
            target = "emrpilot.engine",
            node = %node.display(),
            launcher = %launcher.display(),
            "EMRPILOT_NODE_EXE/EMRPILOT_LAUNCHER_JS set but missing; falling back"
        );
    }

    if let Ok(dir) = std::env::var("EMRPILOT_ENGINE_DIR") {
        if let Some(found) = launcher_in_dir(PathBuf::from(dir)) {
            return Ok(found);
        }
    }

    if let Some(data) = dirs::data_dir() {
        if let Some(found) = launcher_in_dir(data.join("emrpilot").join("engine")) {
            return Ok(found);
        }
    }

    Err(Error::LauncherNotFound)
}

/// Looks for a launcher script plus a usable Node inside `dir`.
///
/// A Node bundled with the engine takes precedence; otherwise whatever
/// `node` PATH resolves to is used.
fn launcher_in_dir(dir: PathBuf) -> Option<(PathBuf, PathBuf)> {
    let launcher = dir.join(LAUNCHER_SCRIPT);
    if !launcher.exists() {
        return None;
    }

    let bundled = if cfg!(windows) {
        dir.join("node.exe")
    } else {
        dir.join("node")
    };
    if bundled.exists() {
        return Some((bundled, launcher));
    }

    which::which("node").ok().map(|node| (node, launcher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_endpoint_matches_launcher_line() {
        let line = "Listening on ws://localhost:35981/8f3a9cde12 (pid 4711)";
        let endpoint = extract_endpoint(line).unwrap();
        assert_eq!(endpoint.as_str(), "ws://localhost:35981/8f3a9cde12");
    }

    #[test]
    fn extract_endpoint_takes_first_match() {
        let line = "ws://127.0.0.1:4000/aa then ws://127.0.0.1:5000/bb";
        let endpoint = extract_endpoint(line).unwrap();
        assert_eq!(endpoint.as_str(), "ws://127.0.0.1:4000/aa");
    }

    #[test]
    fn extract_endpoint_ignores_plain_log_lines() {
        assert!(extract_endpoint("[launcher] starting browser...").is_none());
        assert!(extract_endpoint("listening on http://localhost:8080/x").is_none());
        assert!(extract_endpoint("ws://localhost:notaport/abc").is_none());
    }

    #[tokio::test]
    async fn scan_finds_endpoint_on_stderr() {
        let stdout: &[u8] = b"[launcher] warming up\n";
        let stderr: &[u8] = b"[launcher] ready\nws://localhost:9222/deadbeef\n";
        let endpoint = scan_for_endpoint(stdout, stderr).await.unwrap();
        assert_eq!(endpoint.as_str(), "ws://localhost:9222/deadbeef");
    }

    #[tokio::test]
    async fn scan_reports_hard_failure_when_streams_end() {
        let stdout: &[u8] = b"[launcher] crash\n";
        let stderr: &[u8] = b"";
        let err = scan_for_endpoint(stdout, stderr).await.unwrap_err();
        assert!(matches!(err, Error::EndpointNotFound));
    }
}
