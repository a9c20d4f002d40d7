//! Fixtures shared by the integration suites.

#![allow(dead_code)]

use docconv::{ConverterConfig, ConverterConfigBuilder};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Rows of `report.xlsx`: a header plus three data rows, two columns.
pub const REPORT_ROWS: [(&str, &str); 4] = [
    ("name", "score"),
    ("Ada", "36"),
    ("Grace", "42"),
    ("Linus", "2.5"),
];

/// A minimal single-sheet workbook. Text cells are inline strings and
/// numeric-looking values are written as numbers.
pub fn xlsx(rows: &[(&str, &str)]) -> Vec<u8> {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (i, (a, b)) in rows.iter().enumerate() {
        let r = i + 1;
        sheet.push_str(&format!(r#"<row r="{r}">"#));
        sheet.push_str(&cell(&format!("A{r}"), a));
        sheet.push_str(&cell(&format!("B{r}"), b));
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");
    package(&sheet, None)
}

/// A single-column workbook whose data cells carry Excel date serials
/// styled with the built-in short-date format (`numFmtId` 14).
pub fn xlsx_with_dates(header: &str, serials: &[f64]) -> Vec<u8> {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    sheet.push_str(&format!(r#"<row r="1">{}</row>"#, cell("A1", header)));
    for (i, serial) in serials.iter().enumerate() {
        let r = i + 2;
        sheet.push_str(&format!(r#"<row r="{r}"><c r="A{r}" s="1"><v>{serial}</v></c></row>"#));
    }
    sheet.push_str("</sheetData></worksheet>");

    let styles = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs></styleSheet>"#;
    package(&sheet, Some(styles))
}

fn package(sheet: &str, styles: Option<&str>) -> Vec<u8> {
    let mut parts: Vec<(&str, &str)> = vec![
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Report" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];
    if let Some(styles) = styles {
        parts.push(("xl/styles.xml", styles));
    }

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn cell(reference: &str, value: &str) -> String {
    if value.parse::<f64>().is_ok() {
        format!(r#"<c r="{reference}"><v>{value}</v></c>"#)
    } else {
        format!(r#"<c r="{reference}" t="inlineStr"><is><t>{value}</t></is></c>"#)
    }
}

/// A one-page PDF whose only content is `text` in Helvetica.
pub fn pdf(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// Builder rooted at `workspace_root` so tests can observe cleanup.
pub fn config_in(workspace_root: &Path) -> ConverterConfigBuilder {
    ConverterConfig::builder().workspace_root(workspace_root)
}

/// An engine that is `/bin/sh -c <script> engine …`. Inside the script `$1`
/// is the `-env:UserInstallation=…` profile argument, `$6` the output
/// directory and `$7` the stored input.
pub fn sh_engine(workspace_root: &Path, script: &str, timeout_secs: u64) -> ConverterConfig {
    config_in(workspace_root)
        .engine_program("/bin/sh")
        .engine_args(["-c", script, "engine"])
        .engine_timeout_secs(timeout_secs)
        .build()
        .unwrap()
}

/// Writes a tiny PDF named after the input, like a well-behaved engine.
/// Exits 9 unless its profile argument points inside the output directory.
pub const FAKE_PDF_ENGINE: &str = r#"case "$1" in "-env:UserInstallation=file://$6/"*) ;; *) exit 9 ;; esac
stem=$(basename "$7"); printf '%%PDF-1.4 fake' > "$6/${stem%.*}.pdf""#;

/// Number of entries left under `dir`.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
