//! Per-request workspace directories.
//!
//! Each request gets its own `docconv-<uuid>` directory under the configured
//! root. Uploads, engine output and any scratch files live there and nowhere
//! else. The directory is owned by a [`Workspace`] value: dropping it removes
//! the tree, so teardown happens on success, on `?` early returns and while a
//! panic unwinds through the orchestrator.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

/// An isolated directory exclusively owned by one request.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    root: PathBuf,
    /// `None` once destroyed.
    dir: Option<TempDir>,
}

impl Workspace {
    /// Allocate a fresh, uniquely named directory under `base`.
    ///
    /// Fails with [`ConvertError::Resource`] when the directory cannot be
    /// created (missing base, permission denied, disk full).
    pub fn create(base: &Path) -> Result<Self, ConvertError> {
        let id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("docconv-{id}"))
            .rand_bytes(0)
            .tempdir_in(base)
            .map_err(|e| {
                warn!(workspace = %id, "workspace allocation failed: {e}");
                ConvertError::resource(&e)
            })?;
        let root = dir.path().to_path_buf();
        debug!(workspace = %id, "created {}", root.display());
        Ok(Self {
            id,
            root,
            dir: Some(dir),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Absolute path of the workspace directory.
    ///
    /// Still returns the old location after [`Workspace::destroy`].
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_destroyed(&self) -> bool {
        self.dir.is_none()
    }

    /// Resolve a bare file name inside the workspace.
    pub fn join(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Remove the directory and everything in it.
    ///
    /// Idempotent: repeated calls, or a directory that already vanished, are
    /// no-ops. Removal failures are logged and swallowed so cleanup can never
    /// fail the request it belongs to.
    pub fn destroy(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        self.log_removal(dir.close());
    }

    /// [`destroy`](Self::destroy) for async callers: the recursive delete
    /// runs on the blocking pool instead of a runtime worker.
    pub async fn teardown(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(result) => self.log_removal(result),
            Err(e) => warn!(workspace = %self.id, "workspace cleanup task failed: {e}"),
        }
    }

    fn log_removal(&self, result: std::io::Result<()>) {
        match result {
            Ok(()) => debug!(workspace = %self.id, "workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(workspace = %self.id, "workspace already gone");
            }
            Err(e) => warn!(workspace = %self.id, "workspace cleanup failed: {e}"),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.destroy();
    }
}
