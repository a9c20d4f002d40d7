//! Upload validation and materialisation into the workspace.
//!
//! Every check runs before the first byte touches disk, so a rejected upload
//! leaves its workspace empty. Accepted bytes are written verbatim under a
//! sanitised name that can only ever resolve inside the workspace.

use crate::config::ConverterConfig;
use crate::error::{ConvertError, DISALLOWED_TYPE, FILE_TOO_LARGE, NO_FILE};
use crate::request::ConversionRequest;
use crate::workspace::Workspace;
use std::path::PathBuf;
use tracing::debug;

/// The upload as stored inside its workspace.
#[derive(Debug, Clone)]
pub struct StoredInput {
    pub path: PathBuf,
    pub sanitized_name: String,
}

impl StoredInput {
    /// File name without its extension.
    pub fn stem(&self) -> &str {
        self.sanitized_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.sanitized_name)
    }
}

/// Check a request against the allow-list and size limit without writing.
///
/// Returns the sanitised file name the upload will be stored under.
pub fn validate(request: &ConversionRequest, config: &ConverterConfig) -> Result<String, ConvertError> {
    let declared = request.declared_filename().trim();
    if request.raw_bytes().is_empty() || declared.is_empty() {
        return Err(ConvertError::validation(NO_FILE));
    }

    let len = request.raw_bytes().len() as u64;
    if config.max_upload_bytes > 0 && len > config.max_upload_bytes {
        return Err(ConvertError::validation(FILE_TOO_LARGE));
    }

    let ext = extension_of(declared).ok_or_else(|| ConvertError::validation(DISALLOWED_TYPE))?;
    if !config.is_allowed_extension(&ext) {
        return Err(ConvertError::validation(DISALLOWED_TYPE));
    }
    if !request.target().input_extensions().contains(&ext.as_str()) {
        debug!(
            "extension .{ext} is allow-listed but not accepted by {}",
            request.target()
        );
        return Err(ConvertError::validation(DISALLOWED_TYPE));
    }

    Ok(sanitize_filename(declared, &ext))
}

/// Validate the request and write its bytes into the workspace.
pub async fn store(
    request: &ConversionRequest,
    workspace: &Workspace,
    config: &ConverterConfig,
) -> Result<StoredInput, ConvertError> {
    let sanitized_name = validate(request, config)?;
    let path = workspace.join(&sanitized_name);

    tokio::fs::write(&path, request.raw_bytes())
        .await
        .map_err(|e| ConvertError::resource(&e))?;

    debug!(
        workspace = %workspace.id(),
        "stored {} bytes as {sanitized_name}",
        request.raw_bytes().len()
    );
    Ok(StoredInput {
        path,
        sanitized_name,
    })
}

/// Lower-case extension of the last path component, if any.
fn extension_of(name: &str) -> Option<String> {
    let base = last_component(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if ext.is_empty() || stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn last_component(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Reduce a client-supplied name to a safe single path component.
///
/// Directory parts, separators and control characters are dropped and the
/// extension is normalised to lower case. Names that end up empty or
/// consisting only of dots fall back to `upload.<ext>`.
pub fn sanitize_filename(declared: &str, ext: &str) -> String {
    let base: String = last_component(declared)
        .chars()
        .filter(|c| !c.is_control() && *c != '/' && *c != '\\')
        .collect();
    let base = base.trim();

    let stem = base
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(base)
        .trim_start_matches('.')
        .trim();

    if stem.is_empty() {
        format!("upload.{ext}")
    } else {
        format!("{stem}.{ext}")
    }
}
