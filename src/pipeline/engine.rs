//! Office → PDF through a headless conversion engine run as a child process.
//!
//! The engine (LibreOffice's `soffice` by default) is invoked as
//!
//! ```text
//! <program> [engine_args…] [-env:UserInstallation=<profile>] --headless \
//!     --convert-to pdf --outdir <workspace> <input>
//! ```
//!
//! The profile argument (on by default) points LibreOffice at a private user
//! installation under `<workspace>/.profile`, so every run writes only inside
//! its own workspace and concurrent runs never hand work to each other.
//!
//! Three things the engine does not guarantee are enforced here:
//!
//! * **Termination.** The engine has no timeout. The wait is bounded by
//!   `engine_timeout_secs`; on expiry the child is killed and reaped.
//! * **Output.** Exit status 0 does not mean a PDF was written (unsupported
//!   embedded content makes `soffice` skip a file silently), so the expected
//!   `<stem>.pdf` is checked for explicitly.
//! * **Quiet diagnostics.** stderr is drained concurrently (a chatty engine
//!   would otherwise block on a full pipe), bounded in length, and scrubbed of
//!   the workspace path before it reaches an error message.

use super::{output_path, scrub_paths, truncate_utf8};
use crate::config::ConverterConfig;
use crate::error::{ConvertError, ENGINE_UNAVAILABLE, NO_OUTPUT, TIMED_OUT, UNEXPECTED_FAULT};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Private engine profile directory, relative to the workspace.
const PROFILE_DIR: &str = ".profile";

/// External-process conversion strategy.
#[derive(Debug, Clone)]
pub struct ExternalEngine {
    program: String,
    leading_args: Vec<String>,
    isolate_profile: bool,
    timeout: Duration,
    max_stderr_bytes: usize,
}

impl ExternalEngine {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            program: config.engine_program.clone(),
            leading_args: config.engine_args.clone(),
            isolate_profile: config.isolate_engine_profile,
            timeout: config.engine_timeout(),
            max_stderr_bytes: config.max_stderr_bytes,
        }
    }

    /// Run the engine on `input` and return the PDF it wrote into `workspace_dir`.
    pub async fn convert(&self, input: &Path, workspace_dir: &Path) -> Result<PathBuf, ConvertError> {
        let expected = output_path(input, workspace_dir, "pdf");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        if self.isolate_profile {
            cmd.arg(profile_arg(workspace_dir)?);
        }
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(workspace_dir)
            .arg(input)
            .current_dir(workspace_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!("engine argv: {:?}", cmd.as_std());

        let mut child = cmd.spawn().map_err(|e| {
            warn!(program = %self.program, "failed to start conversion engine: {e}");
            match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    ConvertError::environment(ENGINE_UNAVAILABLE)
                }
                _ => ConvertError::resource(&e),
            }
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                stdout.abort();
                stderr.abort();
                return Err(ConvertError::conversion(format!(
                    "engine could not be awaited ({})",
                    e.kind()
                )));
            }
            Err(_) => {
                warn!(
                    program = %self.program,
                    "conversion engine exceeded {:?}; killing it",
                    self.timeout
                );
                if let Err(e) = child.kill().await {
                    warn!("failed to kill conversion engine: {e}");
                }
                // A grandchild may still hold the pipes open.
                stdout.abort();
                stderr.abort();
                return Err(ConvertError::conversion(TIMED_OUT));
            }
        };

        let stdout = collect(stdout).await;
        let stderr = collect(stderr).await;
        debug!(
            "engine exited with {status} after {}ms; stdout: {}",
            started.elapsed().as_millis(),
            String::from_utf8_lossy(&stdout).trim()
        );

        if !status.success() {
            let detail = self.describe_failure(&stderr, workspace_dir);
            let detail = if detail.is_empty() {
                format!("engine exited with {status}")
            } else {
                detail
            };
            return Err(ConvertError::conversion(detail));
        }

        if !tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            warn!("engine exited cleanly but wrote no PDF");
            return Err(ConvertError::conversion(NO_OUTPUT));
        }

        info!(
            "engine produced PDF in {}ms",
            started.elapsed().as_millis()
        );
        Ok(expected)
    }

    fn describe_failure(&self, stderr: &[u8], workspace_dir: &Path) -> String {
        let text = String::from_utf8_lossy(stderr);
        let text = scrub_paths(text.trim(), workspace_dir);
        truncate_utf8(&text, self.max_stderr_bytes)
    }
}

/// `-env:UserInstallation=<file URL of <workspace>/.profile/>`.
fn profile_arg(workspace_dir: &Path) -> Result<String, ConvertError> {
    let dir = std::path::absolute(workspace_dir.join(PROFILE_DIR))
        .map_err(|e| ConvertError::resource(&e))?;
    let url = Url::from_directory_path(&dir).map_err(|()| {
        warn!("engine profile directory has no file URL form");
        ConvertError::Internal(UNEXPECTED_FAULT.into())
    })?;
    Ok(format!("-env:UserInstallation={url}"))
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!("engine pipe read failed: {e}");
            }
        }
        buf
    })
}

async fn collect(handle: JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.await.unwrap_or_default()
}
