use std::io::Cursor;

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{Column, ColumnData, ColumnKind, Table};
use crate::services::profile::utils::{clean_cell, detect_column_kind, parse_datetime, parse_number};

const DEFAULT_SEPARATOR: u8 = b',';
const FALLBACK_SEPARATOR: u8 = b';';

/// Parses an uploaded delimited file into a typed table.
pub fn load_table(data: &[u8]) -> Result<Table, AppError> {
    let start = std::time::Instant::now();
    info!("Loading delimited file ({} bytes)", data.len());

    let df = read_delimited(data)?;
    let table = build_table(&df)?;

    info!(
        "Loaded table with {} rows and {} columns in {:?}",
        table.row_count(),
        table.column_count(),
        start.elapsed()
    );
    Ok(table)
}

/// Reads with `,` and retries once with `;` when that attempt fails.
pub fn read_delimited(data: &[u8]) -> Result<DataFrame, AppError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
    }

    match read_with_separator(data, DEFAULT_SEPARATOR) {
        Ok(df) if !looks_misparsed(&df) => return Ok(df),
        Ok(_) => debug!("Comma parse produced a single ';'-joined column, retrying"),
        Err(e) => warn!("Comma parse failed: {}, retrying with ';'", e),
    }

    read_with_separator(data, FALLBACK_SEPARATOR).map_err(|e| {
        AppError::ParseError(format!("Failed to parse delimited file: {}", e))
    })
}

fn read_with_separator(data: &[u8], separator: u8) -> PolarsResult<DataFrame> {
    // Every column comes back as text; typing happens in `build_table`.
    CsvReader::new(Cursor::new(data))
        .has_header(true)
        .with_separator(separator)
        .infer_schema(Some(0))
        .finish()
}

fn looks_misparsed(df: &DataFrame) -> bool {
    df.width() == 1
        && df
            .get_column_names()
            .first()
            .map_or(false, |name| name.contains(FALLBACK_SEPARATOR as char))
}

/// Converts raw text columns into tagged columns with explicit missing cells.
pub fn build_table(df: &DataFrame) -> Result<Table, AppError> {
    let mut columns = Vec::with_capacity(df.width());

    for series in df.get_columns() {
        let name = series.name();
        let as_text = series.cast(&DataType::String)?;
        let raw: Vec<Option<&str>> = as_text.str()?.into_iter().map(clean_cell).collect();

        let data = match detect_column_kind(name, &raw) {
            ColumnKind::DateTime => {
                let dates: Vec<_> = raw.iter().map(|v| v.and_then(parse_datetime)).collect();
                let unparsed = raw.iter().flatten().count() - dates.iter().flatten().count();
                if unparsed > 0 {
                    debug!("Column {}: {} cells did not parse as dates", name, unparsed);
                }
                ColumnData::DateTime(dates)
            }
            ColumnKind::Numeric => {
                ColumnData::Numeric(raw.iter().map(|v| v.and_then(parse_number)).collect())
            }
            ColumnKind::Text => {
                ColumnData::Text(raw.iter().map(|v| v.map(str::to_string)).collect())
            }
        };

        debug!("Column {} inferred as {}", name, data.kind());
        columns.push(Column::new(name, data));
    }

    Table::new(columns, df.height())
}
