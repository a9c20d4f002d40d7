//! PDF → DOCX in-process, via pdfium for text and docx-rs for the document.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. The whole conversion
//! (bind, load, extract, write) runs on the blocking pool.
//!
//! ## Handle lifetime
//!
//! The loaded `PdfDocument` is confined to [`extract_pages`]; it is dropped,
//! and the underlying pdfium document closed, when that function returns,
//! whether extraction succeeded or not.
//!
//! The produced document carries the text of each page, one paragraph per
//! line, with a page break between source pages. Layout, fonts and images are
//! not reproduced.

use super::{blocking_task_failed, output_path};
use crate::config::ConverterConfig;
use crate::error::{ConvertError, PDF_LIBRARY_UNAVAILABLE};
use docx_rs::{BreakType, Docx, Paragraph, Run};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Native-library conversion strategy.
#[derive(Debug, Clone)]
pub struct NativePdfConverter {
    lib_path: Option<PathBuf>,
}

impl NativePdfConverter {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            lib_path: config.pdfium_lib_path.clone(),
        }
    }

    /// Convert the PDF at `input` into `<workspace_dir>/<stem>.docx`.
    pub async fn convert(&self, input: &Path, workspace_dir: &Path) -> Result<PathBuf, ConvertError> {
        let input = input.to_path_buf();
        let output = output_path(&input, workspace_dir, "docx");
        let lib_path = self.lib_path.clone();

        tokio::task::spawn_blocking(move || {
            let pdfium = bind_pdfium(lib_path.as_deref())?;
            let pages = extract_pages(&pdfium, &input)?;
            info!("extracted text from {} pages", pages.len());
            write_docx(&pages, &output)?;
            Ok::<_, ConvertError>(output)
        })
        .await
        .map_err(|e| blocking_task_failed("native", e))?
    }
}

/// Bind pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system library.
fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let from_env = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from);
    let bindings = match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            let path = resolve_library_file(&path);
            debug!("binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
        }
        None => Pdfium::bind_to_system_library(),
    };
    bindings.map(Pdfium::new).map_err(|e| {
        warn!("failed to bind pdfium: {e}");
        ConvertError::environment(PDF_LIBRARY_UNAVAILABLE)
    })
}

/// Accept either the library file itself or the directory holding it.
fn resolve_library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(platform_library_name())
    } else {
        path.to_path_buf()
    }
}

fn platform_library_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "libpdfium.dylib",
        "windows" => "pdfium.dll",
        _ => "libpdfium.so",
    }
}

/// Text of every page, in order.
fn extract_pages(pdfium: &Pdfium, input: &Path) -> Result<Vec<String>, ConvertError> {
    let document = pdfium.load_pdf_from_file(input, None).map_err(|e| {
        let detail = format!("{e:?}");
        debug!("pdfium load failed: {detail}");
        if detail.contains("Password") || detail.contains("password") {
            ConvertError::conversion("pdf is encrypted")
        } else {
            ConvertError::conversion("pdf could not be parsed")
        }
    })?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| {
            debug!("text extraction failed on page {}: {e:?}", idx + 1);
            ConvertError::conversion(format!("text extraction failed on page {}", idx + 1))
        })?;
        pages.push(text.all());
    }
    Ok(pages)
}

/// Write `pages` as a DOCX: one paragraph per line, page breaks between pages.
pub fn write_docx(pages: &[String], output: &Path) -> Result<(), ConvertError> {
    let mut docx = Docx::new();
    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            docx = docx.add_paragraph(
                Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            );
        }
        for line in page.lines() {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(clean_line(line))));
        }
    }

    let file = std::fs::File::create(output).map_err(|e| ConvertError::resource(&e))?;
    docx.build()
        .pack(file)
        .map_err(|e| ConvertError::conversion(format!("docx could not be written: {e}")))?;
    Ok(())
}

// Control characters are not representable in WordprocessingML text runs.
fn clean_line(line: &str) -> String {
    line.chars()
        .filter(|c| *c == '\t' || !c.is_control())
        .collect()
}
