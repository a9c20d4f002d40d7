//! Pipeline stages for a single conversion request.
//!
//! ```text
//! upload ──▶ strategy ──────────────────────────▶ artifact
//! (validate,  ├─ native   pdfium + docx-rs      (checked, inside
//!  store)     ├─ engine   headless office child   the workspace)
//!             └─ tabular  calamine + csv
//! ```
//!
//! 1. [`upload`]: allow-list and size checks, then a verbatim write under a
//!    sanitised name
//! 2. [`native`]: PDF → DOCX in-process; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`engine`]: office formats → PDF through an external process with a
//!    hard time bound; the only stage that can hang
//! 4. [`tabular`]: XLSX → CSV, deterministic re-serialisation
//!
//! Which of 2–4 runs is decided by [`Strategy::for_target`] from the
//! request's [`TargetKind`] alone.

pub mod engine;
pub mod native;
pub mod tabular;
pub mod upload;

use crate::config::ConverterConfig;
use crate::error::{ConvertError, UNEXPECTED_FAULT};
use crate::request::{StrategyKind, TargetKind};
use std::path::{Path, PathBuf};
use tokio::task::JoinError;
use tracing::error;

/// The closed set of conversion strategies.
#[derive(Debug, Clone)]
pub enum Strategy {
    Native(native::NativePdfConverter),
    External(engine::ExternalEngine),
    Tabular(tabular::TabularConverter),
}

impl Strategy {
    pub fn for_target(target: TargetKind, config: &ConverterConfig) -> Self {
        match target.strategy() {
            StrategyKind::NativeLibrary => Strategy::Native(native::NativePdfConverter::from_config(config)),
            StrategyKind::ExternalProcess => Strategy::External(engine::ExternalEngine::from_config(config)),
            StrategyKind::Tabular => Strategy::Tabular(tabular::TabularConverter),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Native(_) => "native",
            Strategy::External(_) => "engine",
            Strategy::Tabular(_) => "tabular",
        }
    }

    /// Convert `input` and return the produced file, which lives in `workspace_dir`.
    pub async fn convert(&self, input: &Path, workspace_dir: &Path) -> Result<PathBuf, ConvertError> {
        match self {
            Strategy::Native(s) => s.convert(input, workspace_dir).await,
            Strategy::External(s) => s.convert(input, workspace_dir).await,
            Strategy::Tabular(s) => s.convert(input, workspace_dir).await,
        }
    }
}

/// `<workspace_dir>/<input stem>.<ext>`
pub(crate) fn output_path(input: &Path, workspace_dir: &Path, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    workspace_dir.join(format!("{stem}.{ext}"))
}

/// Replace every occurrence of `root` in a diagnostic with `<workspace>`.
pub(crate) fn scrub_paths(message: &str, root: &Path) -> String {
    let root = root.display().to_string();
    if root.is_empty() {
        return message.to_string();
    }
    message.replace(&root, "<workspace>")
}

/// A blocking conversion task that panicked or was cancelled.
///
/// The panic payload is logged only; it may quote paths or library internals.
pub(crate) fn blocking_task_failed(strategy: &str, e: JoinError) -> ConvertError {
    error!(strategy, "blocking conversion task failed: {e}");
    ConvertError::Internal(UNEXPECTED_FAULT.into())
}

/// Cut `s` to at most `max` bytes on a char boundary, marking the cut.
pub(crate) fn truncate_utf8(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &s[..end])
}
