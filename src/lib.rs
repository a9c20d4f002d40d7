//! # docconv
//!
//! Request-scoped document conversion: PDF → DOCX, PPTX/XLSX/DOCX → PDF and
//! XLSX → CSV.
//!
//! ## Why this crate?
//!
//! Format conversion usually means shelling out to an office suite, and the
//! usual way of doing that (one shared upload directory, no timeout, trusting
//! the exit code) leaks files, hangs workers and returns success with nothing
//! written. Here every request gets its own UUID-named workspace that is
//! removed on every exit path, the external engine runs under a hard time
//! bound, and "the engine exited 0 but produced no file" is an error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ConversionRequest (bytes, declared name, TargetKind)
//!  │
//!  ├─ 1. Workspace  fresh temp dir keyed by UUID v4
//!  ├─ 2. Upload     allow-list, size limit, sanitised write
//!  ├─ 3. Strategy   chosen from TargetKind alone
//!  │      ├─ native   pdfium text → docx-rs        (spawn_blocking)
//!  │      ├─ engine   headless soffice child       (timeout, kill)
//!  │      └─ tabular  calamine → csv               (spawn_blocking)
//!  ├─ 4. Check      output exists, non-empty, inside the workspace
//!  └─ 5. Result     bytes + MIME type + download name; workspace removed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docconv::{ConversionRequest, Converter, ConverterConfig, TargetKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::new(ConverterConfig::default());
//!     let bytes = std::fs::read("report.xlsx")?;
//!     let request = ConversionRequest::new(bytes, "report.xlsx", TargetKind::CsvFromSpreadsheet);
//!     let file = converter.convert_to_bytes(request).await?;
//!     std::fs::write(&file.file_name, &file.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum router exposing one route per target kind |
//! | `cli`    | on      | The `docconv` binary (clap + anyhow + tracing-subscriber), implies `server` |
//!
//! Library-only users can drop both:
//! ```toml
//! docconv = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! | Target | Needs |
//! |--------|-------|
//! | `pdf-to-docx` | a pdfium shared library (`pdfium_lib_path`, `PDFIUM_LIB_PATH` or system) |
//! | `*-to-pdf` | LibreOffice `soffice` (or `engine_program`) |
//! | `xlsx-to-csv` | nothing |
//!
//! A missing dependency surfaces as [`ConvertError::Environment`], never as a
//! conversion failure.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod request;
#[cfg(feature = "server")]
pub mod server;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConfigError, ConverterConfig, ConverterConfigBuilder};
pub use convert::{Converter, Stage};
pub use error::{ConvertError, ErrorBody, ErrorKind};
pub use output::{ConversionResult, ConvertedFile};
pub use request::{ConversionRequest, StrategyKind, TargetKind};
pub use workspace::Workspace;
