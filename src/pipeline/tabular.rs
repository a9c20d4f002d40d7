//! XLSX → CSV: the first worksheet, re-serialised row by row.
//!
//! The sheet's first row becomes the CSV header. Column order is the sheet's
//! column order and every value is written as calamine renders it (numbers
//! without a trailing `.0`, booleans as `true`/`false`, empty cells as empty
//! fields), except date-formatted cells, which are written as
//! `YYYY-MM-DD HH:MM:SS` rather than as their serial number. Calamine ranges are rectangular, so every record has the same
//! width. The same workbook always serialises to the same bytes.

use super::{blocking_task_failed, output_path, scrub_paths};
use crate::error::ConvertError;
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tabular reformat strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularConverter;

impl TabularConverter {
    /// Convert the workbook at `input` into `<workspace_dir>/<stem>.csv`.
    pub async fn convert(&self, input: &Path, workspace_dir: &Path) -> Result<PathBuf, ConvertError> {
        let input = input.to_path_buf();
        let output = output_path(&input, workspace_dir, "csv");
        let root = workspace_dir.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let rows = spreadsheet_to_csv(&input, &output, &root)?;
            debug!("wrote {rows} CSV records");
            Ok::<_, ConvertError>(output)
        })
        .await
        .map_err(|e| blocking_task_failed("tabular", e))?
    }
}

/// Write the first sheet of `input` to `output`; returns the record count.
pub fn spreadsheet_to_csv(input: &Path, output: &Path, root: &Path) -> Result<usize, ConvertError> {
    let mut workbook = open_workbook_auto(input).map_err(|e| {
        ConvertError::conversion(format!(
            "workbook could not be read: {}",
            scrub_paths(&e.to_string(), root)
        ))
    })?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ConvertError::conversion("workbook has no sheets"))?;
    let range = workbook.worksheet_range(&sheet).map_err(|e| {
        ConvertError::conversion(format!(
            "sheet '{sheet}' could not be read: {}",
            scrub_paths(&e.to_string(), root)
        ))
    })?;
    if range.is_empty() {
        return Err(ConvertError::conversion(format!("sheet '{sheet}' is empty")));
    }

    let mut writer = csv::Writer::from_path(output).map_err(|e| csv_error(&e))?;
    let mut records = 0usize;
    for row in range.rows() {
        writer
            .write_record(row.iter().map(render_cell))
            .map_err(|e| csv_error(&e))?;
        records += 1;
    }
    writer.flush().map_err(|e| ConvertError::resource(&e))?;
    Ok(records)
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => render_datetime(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

// Date-formatted cells hold an Excel serial; write what the reader displays.
fn render_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        if let Some(d) = dt.as_duration() {
            return d.to_string();
        }
    } else if let Some(t) = dt.as_datetime() {
        return t.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    dt.as_f64().to_string()
}

fn csv_error(e: &csv::Error) -> ConvertError {
    match e.kind() {
        csv::ErrorKind::Io(io) => ConvertError::resource(io),
        _ => ConvertError::conversion("csv could not be written"),
    }
}
