//! The conversion orchestrator.
//!
//! One call to [`Converter::convert`] is one request:
//!
//! ```text
//! Received ──▶ Validated ──▶ Converting ──▶ Completed
//!     │            │              │
//!     └────────────┴──────────────┴──────▶ Failed
//! ```
//!
//! The request's [`Workspace`] is created before validation and torn down on
//! every exit: immediately on `Failed`, and once the caller has read the
//! artifact on `Completed` (the [`ConversionResult`] owns the workspace).
//! Panics inside the pipeline are caught and reported as an internal error;
//! the workspace is destroyed on that path too.

use crate::config::ConverterConfig;
use crate::error::{ConvertError, NO_FILE, NO_OUTPUT, UNEXPECTED_FAULT};
use crate::output::{ConversionResult, ConvertedFile};
use crate::pipeline::{upload, Strategy};
use crate::request::{ConversionRequest, TargetKind};
use crate::workspace::Workspace;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Request lifecycle stages, as they appear in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Converting,
    Completed,
    Failed,
}

/// Entry point for conversions.
///
/// Cheap to clone; clones share one immutable configuration. Holds no
/// per-request state, so any number of requests may run concurrently.
#[derive(Debug, Clone)]
pub struct Converter {
    config: Arc<ConverterConfig>,
}

/// What a successful pipeline run hands back before packaging.
struct Artifact {
    output_path: PathBuf,
    download_name: String,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Run one request through validate → convert.
    ///
    /// On success the artifact is still on disk inside the request workspace;
    /// read it with [`ConversionResult::into_bytes`].
    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionResult, ConvertError> {
        let started = Instant::now();
        let target = request.target();
        info!(
            %target,
            bytes = request.raw_bytes().len(),
            stage = ?Stage::Received,
            "conversion request"
        );

        let mut workspace = Workspace::create(&self.config.workspace_root)?;
        let id = workspace.id();

        let outcome = guarded(self.run(&request, &workspace)).await;

        match outcome {
            Ok(artifact) => {
                info!(
                    workspace = %id,
                    %target,
                    stage = ?Stage::Completed,
                    "converted in {}ms",
                    started.elapsed().as_millis()
                );
                Ok(ConversionResult::new(
                    artifact.output_path,
                    target.mime_type(),
                    artifact.download_name,
                    workspace,
                ))
            }
            Err(e) => {
                workspace.teardown().await;
                if e.status_code() >= 500 {
                    warn!(workspace = %id, %target, stage = ?Stage::Failed, "{e}");
                } else {
                    info!(workspace = %id, %target, stage = ?Stage::Failed, "{e}");
                }
                Err(e)
            }
        }
    }

    /// Convert and read the artifact fully; nothing is left on disk afterwards.
    pub async fn convert_to_bytes(&self, request: ConversionRequest) -> Result<ConvertedFile, ConvertError> {
        self.convert(request).await?.into_bytes().await
    }

    /// Convert a local file. The file name is used as the declared filename.
    pub async fn convert_file(&self, path: &Path, target: TargetKind) -> Result<ConvertedFile, ConvertError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::validation(NO_FILE),
            _ => ConvertError::resource(&e),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.convert_to_bytes(ConversionRequest::new(bytes, name, target))
            .await
    }

    async fn run(&self, request: &ConversionRequest, workspace: &Workspace) -> Result<Artifact, ConvertError> {
        let target = request.target();

        let stored = upload::store(request, workspace, &self.config).await?;
        debug!(workspace = %workspace.id(), stage = ?Stage::Validated, "{}", stored.sanitized_name);

        let strategy = Strategy::for_target(target, &self.config);
        debug!(
            workspace = %workspace.id(),
            stage = ?Stage::Converting,
            strategy = strategy.name()
        );
        let output_path = strategy.convert(&stored.path, workspace.root()).await?;
        verify_output(&output_path, workspace.root()).await?;

        Ok(Artifact {
            output_path,
            download_name: format!("{}.{}", stored.stem(), target.output_extension()),
        })
    }
}

/// Post-condition on every strategy: a non-empty file inside the workspace.
async fn verify_output(path: &Path, root: &Path) -> Result<(), ConvertError> {
    if !path.starts_with(root) {
        error!("strategy wrote outside its workspace");
        return Err(ConvertError::Internal(UNEXPECTED_FAULT.into()));
    }
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ConvertError::conversion(NO_OUTPUT)),
    }
}

/// Await `fut`, turning a panic into [`ConvertError::Internal`].
async fn guarded<T, F>(fut: F) -> Result<T, ConvertError>
where
    F: Future<Output = Result<T, ConvertError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            error!("conversion pipeline panicked: {detail}");
            Err(ConvertError::Internal(UNEXPECTED_FAULT.into()))
        }
    }
}
