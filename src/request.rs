//! Conversion requests and the closed set of target kinds.
//!
//! A [`TargetKind`] is the only input to strategy selection: the mapping from
//! kind to strategy, accepted input extensions and output format is a static
//! table here, never a runtime string match on the upload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which conversion strategy handles a [`TargetKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// In-process pdfium + docx writer.
    NativeLibrary,
    /// Headless office engine invoked as a child process.
    ExternalProcess,
    /// Spreadsheet reader + CSV writer.
    Tabular,
}

/// The conversions this service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// `.pdf` → `.docx`
    DocxFromPdf,
    /// `.pptx` → `.pdf`
    PdfFromSlides,
    /// `.xlsx` → `.pdf`
    PdfFromSpreadsheet,
    /// `.xlsx` → `.csv`
    CsvFromSpreadsheet,
    /// `.docx` → `.pdf`
    PdfFromDocument,
}

impl TargetKind {
    pub const ALL: [TargetKind; 5] = [
        TargetKind::DocxFromPdf,
        TargetKind::PdfFromSlides,
        TargetKind::PdfFromSpreadsheet,
        TargetKind::CsvFromSpreadsheet,
        TargetKind::PdfFromDocument,
    ];

    pub fn strategy(self) -> StrategyKind {
        match self {
            TargetKind::DocxFromPdf => StrategyKind::NativeLibrary,
            TargetKind::PdfFromSlides
            | TargetKind::PdfFromSpreadsheet
            | TargetKind::PdfFromDocument => StrategyKind::ExternalProcess,
            TargetKind::CsvFromSpreadsheet => StrategyKind::Tabular,
        }
    }

    /// Lower-case input extensions this kind consumes.
    pub fn input_extensions(self) -> &'static [&'static str] {
        match self {
            TargetKind::DocxFromPdf => &["pdf"],
            TargetKind::PdfFromSlides => &["pptx"],
            TargetKind::PdfFromSpreadsheet | TargetKind::CsvFromSpreadsheet => &["xlsx"],
            TargetKind::PdfFromDocument => &["docx"],
        }
    }

    pub fn output_extension(self) -> &'static str {
        match self {
            TargetKind::DocxFromPdf => "docx",
            TargetKind::CsvFromSpreadsheet => "csv",
            _ => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            TargetKind::DocxFromPdf => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            TargetKind::CsvFromSpreadsheet => "text/csv",
            _ => "application/pdf",
        }
    }

    /// Short slug used for routes and CLI flags, e.g. `pdf-to-docx`.
    pub fn slug(self) -> &'static str {
        match self {
            TargetKind::DocxFromPdf => "pdf-to-docx",
            TargetKind::PdfFromSlides => "pptx-to-pdf",
            TargetKind::PdfFromSpreadsheet => "xlsx-to-pdf",
            TargetKind::CsvFromSpreadsheet => "xlsx-to-csv",
            TargetKind::PdfFromDocument => "docx-to-pdf",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// One upload plus the conversion asked of it. Immutable once built.
#[derive(Clone)]
pub struct ConversionRequest {
    raw_bytes: Vec<u8>,
    declared_filename: String,
    target: TargetKind,
}

impl ConversionRequest {
    pub fn new(
        raw_bytes: impl Into<Vec<u8>>,
        declared_filename: impl Into<String>,
        target: TargetKind,
    ) -> Self {
        Self {
            raw_bytes: raw_bytes.into(),
            declared_filename: declared_filename.into(),
            target,
        }
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    pub fn declared_filename(&self) -> &str {
        &self.declared_filename
    }

    pub fn target(&self) -> TargetKind {
        self.target
    }
}

// Upload bodies can be megabytes; print the length instead.
impl fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("raw_bytes", &format_args!("<{} bytes>", self.raw_bytes.len()))
            .field("declared_filename", &self.declared_filename)
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip() {
        for kind in TargetKind::ALL {
            assert_eq!(TargetKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(TargetKind::from_slug("png-to-jpg"), None);
    }

    #[test]
    fn strategy_mapping_is_static() {
        assert_eq!(TargetKind::DocxFromPdf.strategy(), StrategyKind::NativeLibrary);
        assert_eq!(TargetKind::PdfFromSlides.strategy(), StrategyKind::ExternalProcess);
        assert_eq!(TargetKind::PdfFromSpreadsheet.strategy(), StrategyKind::ExternalProcess);
        assert_eq!(TargetKind::CsvFromSpreadsheet.strategy(), StrategyKind::Tabular);
    }

    #[test]
    fn mime_types() {
        assert_eq!(TargetKind::CsvFromSpreadsheet.mime_type(), "text/csv");
        assert_eq!(TargetKind::PdfFromSlides.mime_type(), "application/pdf");
        assert!(TargetKind::DocxFromPdf.mime_type().starts_with("application/"));
    }

    #[test]
    fn debug_hides_payload() {
        let req = ConversionRequest::new(vec![0u8; 2048], "a.pdf", TargetKind::DocxFromPdf);
        let dbg = format!("{req:?}");
        assert!(dbg.contains("<2048 bytes>"));
    }
}
