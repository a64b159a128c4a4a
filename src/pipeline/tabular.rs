//! Tabular formats: CSV and Excel parse/serialise.
//!
//! Parsing is the only place column types are decided. CSV values are text,
//! so each column is inferred from its values (Int, then Float, then Bool,
//! else Text). Excel cells arrive typed from `calamine`; whole-valued
//! numbers are read back as integers and date cells as ISO text
//! (`2024-01-15`, or `2024-01-15 13:30:00` when a time is set).

use crate::config::TabularFormat;
use crate::error::FileError;
use crate::output::ConversionResult;
use crate::pipeline::table::{Cell, Table};
use calamine::{open_workbook_from_rs, Data, ExcelDateTime, Reader, Xlsx};
use chrono::Timelike;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::io::Cursor;
use tracing::debug;

/// Strings read as a missing value in CSV input.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parse CSV bytes into a table. The first record is the header.
pub fn parse_csv(file: &str, bytes: &[u8]) -> Result<Table, FileError> {
    let parse_err = |detail: String| FileError::Parse {
        file: file.to_string(),
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| parse_err(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if header.is_empty() {
        return Err(parse_err("No columns to parse from file".into()));
    }
    let width = header.len();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_err(e.to_string()))?;
        if record.len() > width {
            let line = record.position().map_or(raw_rows.len() as u64 + 2, |p| p.line());
            return Err(parse_err(format!(
                "Expected {width} fields in line {line}, saw {}",
                record.len()
            )));
        }
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let mut rows: Vec<Vec<Cell>> = vec![Vec::with_capacity(width); raw_rows.len()];
    for col in 0..width {
        let values: Vec<Option<&str>> = raw_rows
            .iter()
            .map(|r| r.get(col).map(String::as_str).filter(|v| !NA_VALUES.contains(v)))
            .collect();
        for (row, cell) in rows.iter_mut().zip(infer_column(&values)) {
            row.push(cell);
        }
    }

    debug!("Parsed CSV {}: {} columns, {} rows", file, width, rows.len());
    Ok(Table::from_raw(header, rows))
}

/// Convert one column of raw CSV text into typed cells.
fn infer_column(values: &[Option<&str>]) -> Vec<Cell> {
    let present = || values.iter().flatten();

    if present().all(|v| v.parse::<i64>().is_ok()) {
        return values
            .iter()
            .map(|v| v.and_then(|s| s.parse().ok()).map_or(Cell::Missing, Cell::Int))
            .collect();
    }
    if present().all(|v| v.parse::<f64>().is_ok()) {
        return values
            .iter()
            .map(|v| v.and_then(|s| s.parse().ok()).map_or(Cell::Missing, Cell::Float))
            .collect();
    }
    if present().all(|v| parse_bool(v).is_some()) {
        return values
            .iter()
            .map(|v| v.and_then(parse_bool).map_or(Cell::Missing, Cell::Bool))
            .collect();
    }
    values
        .iter()
        .map(|v| v.map_or(Cell::Missing, |s| Cell::Text(s.to_string())))
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse an `.xlsx` workbook: first sheet, first row as header.
pub fn parse_excel(file: &str, bytes: &[u8]) -> Result<Table, FileError> {
    let parse_err = |detail: String| FileError::Parse {
        file: file.to_string(),
        detail,
    };

    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| parse_err(format!("{e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_err("Workbook contains no worksheets".into()))?
        .map_err(|e| parse_err(format!("{e}")))?;

    let mut sheet_rows = range.rows();
    let header: Vec<String> = match sheet_rows.next() {
        Some(first) => first.iter().map(|d| excel_cell(d).to_string()).collect(),
        None => return Err(parse_err("No columns to parse from file".into())),
    };
    let rows: Vec<Vec<Cell>> = sheet_rows
        .map(|r| r.iter().map(excel_cell).collect())
        .collect();

    debug!(
        "Parsed workbook {}: {} columns, {} rows",
        file,
        header.len(),
        rows.len()
    );
    Ok(Table::from_raw(header, rows))
}

fn excel_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Cell::Int(*f as i64),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.is_empty() => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => excel_date(dt),
        other => Cell::Text(other.to_string()),
    }
}

fn excel_date(dt: &ExcelDateTime) -> Cell {
    match dt.as_datetime() {
        Some(t) if t.num_seconds_from_midnight() == 0 && t.nanosecond() == 0 => {
            Cell::Text(t.format("%Y-%m-%d").to_string())
        }
        Some(t) => Cell::Text(t.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => Cell::Float(dt.as_f64()),
    }
}

/// Parse by declared format.
pub fn parse(format: TabularFormat, file: &str, bytes: &[u8]) -> Result<Table, FileError> {
    match format {
        TabularFormat::Csv => parse_csv(file, bytes),
        TabularFormat::Excel => parse_excel(file, bytes),
    }
}

/// Serialise a table to CSV: header row, then one record per row.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::new(e.error().kind(), e.error().to_string())))
}

/// Serialise a table to a single-sheet `.xlsx` workbook.
pub fn to_excel(table: &Table) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (c, column) in table.columns().iter().enumerate() {
        sheet.write_string(0, col_num(c)?, &column.name)?;
    }
    for (r, row) in table.rows().iter().enumerate() {
        let r = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, cell) in row.iter().enumerate() {
            let c = col_num(c)?;
            match cell {
                Cell::Missing => {}
                Cell::Int(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(r, c, *f)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

fn col_num(c: usize) -> Result<u16, XlsxError> {
    u16::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Serialise a table for download as `converted_<original name>`.
pub fn serialize(
    table: &Table,
    format: TabularFormat,
    original_name: &str,
) -> Result<ConversionResult, FileError> {
    let bytes = match format {
        TabularFormat::Csv => to_csv(table).map_err(|e| e.to_string()),
        TabularFormat::Excel => to_excel(table).map_err(|e| e.to_string()),
    }
    .map_err(|detail| FileError::Serialize {
        file: original_name.to_string(),
        detail,
    })?;

    debug!("Serialised {} as {:?}: {} bytes", original_name, format, bytes.len());
    Ok(ConversionResult {
        file_name: format!("converted_{original_name}"),
        mime_type: format.mime_type().to_string(),
        bytes,
    })
}
