//! Conversion artifacts handed back to callers.

use crate::error::ConvertError;
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A produced artifact that still lives in its request's workspace.
///
/// The result owns the workspace: the file stays readable until the result
/// is consumed by [`ConversionResult::into_bytes`] or dropped, and either one
/// removes the workspace.
#[derive(Debug)]
pub struct ConversionResult {
    output_path: PathBuf,
    mime_type: &'static str,
    suggested_download_name: String,
    workspace: Workspace,
}

impl ConversionResult {
    pub(crate) fn new(
        output_path: PathBuf,
        mime_type: &'static str,
        suggested_download_name: String,
        workspace: Workspace,
    ) -> Self {
        Self {
            output_path,
            mime_type,
            suggested_download_name,
            workspace,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn suggested_download_name(&self) -> &str {
        &self.suggested_download_name
    }

    pub fn workspace_id(&self) -> Uuid {
        self.workspace.id()
    }

    /// Read the artifact fully, then tear the workspace down.
    ///
    /// The workspace is removed even when the read fails.
    pub async fn into_bytes(self) -> Result<ConvertedFile, ConvertError> {
        let ConversionResult {
            output_path,
            mime_type,
            suggested_download_name,
            mut workspace,
        } = self;

        let bytes = tokio::fs::read(&output_path).await;
        workspace.teardown().await;

        Ok(ConvertedFile {
            bytes: bytes.map_err(|e| ConvertError::resource(&e))?,
            mime_type,
            file_name: suggested_download_name,
        })
    }
}

/// A fully read artifact; no filesystem state remains behind it.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
}
