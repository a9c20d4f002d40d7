//! Configuration for the conversion orchestrator.
//!
//! Everything operational lives in one [`ConverterConfig`], built through
//! [`ConverterConfigBuilder`] and frozen when the [`crate::Converter`] is
//! created. Requests only ever read it, which is what lets one converter be
//! shared by every concurrent request without locking.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Extensions accepted when no explicit allow-list is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "pptx", "xlsx"];

/// Raised by [`ConverterConfigBuilder::build`].
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Configuration for a [`crate::Converter`].
///
/// # Example
/// ```rust
/// use docconv::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .engine_program("libreoffice")
///     .engine_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.engine_timeout().as_secs(), 60);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Directory under which per-request workspaces are created. Default: the
    /// system temp directory.
    pub workspace_root: PathBuf,

    /// Lower-case extensions accepted by the upload validator. Default:
    /// pdf, docx, pptx, xlsx.
    pub allowed_extensions: Vec<String>,

    /// Largest accepted upload in bytes; 0 disables the check. Default: 50 MiB.
    pub max_upload_bytes: u64,

    /// Executable of the headless conversion engine. Default: `soffice`.
    ///
    /// Resolved through `PATH` when not absolute.
    pub engine_program: String,

    /// Arguments placed before the conversion arguments, for engines reached
    /// through a wrapper (`flatpak run org.libreoffice.LibreOffice`, a
    /// container shim, …). Default: none.
    pub engine_args: Vec<String>,

    /// Upper bound on one engine run in seconds. Default: 120.
    ///
    /// The engine has no timeout of its own; a stalled child is killed when
    /// this expires and the request fails with "conversion timed out".
    pub engine_timeout_secs: u64,

    /// Run each engine invocation with a private LibreOffice profile inside
    /// the request workspace (`-env:UserInstallation=file://…`). Default: true.
    ///
    /// A shared profile is written outside the workspace and lets a second
    /// concurrent `soffice` hand its job to the first instance and exit
    /// without output. Turn off for engines that reject the argument.
    pub isolate_engine_profile: bool,

    /// How much of the engine's stderr is kept in a conversion error. Default: 4096.
    pub max_stderr_bytes: usize,

    /// Explicit pdfium library file. If None, `PDFIUM_LIB_PATH` is consulted,
    /// then the system library search path.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_upload_bytes: 50 * 1024 * 1024,
            engine_program: "soffice".to_string(),
            engine_args: Vec::new(),
            engine_timeout_secs: 120,
            isolate_engine_profile: true,
            max_stderr_bytes: 4096,
            pdfium_lib_path: None,
        }
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    /// Case-insensitive allow-list lookup.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn workspace_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace_root = dir.into();
        self
    }

    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn max_upload_bytes(mut self, n: u64) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn engine_program(mut self, program: impl Into<String>) -> Self {
        self.config.engine_program = program.into();
        self
    }

    pub fn engine_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.engine_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine_timeout_secs = secs;
        self
    }

    pub fn isolate_engine_profile(mut self, on: bool) -> Self {
        self.config.isolate_engine_profile = on;
        self
    }

    pub fn max_stderr_bytes(mut self, n: usize) -> Self {
        self.config.max_stderr_bytes = n;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConfigError> {
        let c = &self.config;
        if c.engine_timeout_secs == 0 {
            return Err(ConfigError("engine timeout must be ≥ 1s".into()));
        }
        if c.engine_program.trim().is_empty() {
            return Err(ConfigError("engine program must not be empty".into()));
        }
        if c.allowed_extensions.is_empty() {
            return Err(ConfigError("allow-list must not be empty".into()));
        }
        Ok(self.config)
    }
}
