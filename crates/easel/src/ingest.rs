// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! File loading into a [`Dataset`] snapshot.
//!
//! Delimited text, Parquet and JSON are parsed by polars and each polars column
//! is folded into tagged cells. Workbooks are read cell by cell with calamine,
//! first worksheet only, first row as the header.

use crate::config::LoaderConfig;
use crate::dataset::{CellValue, Column, Dataset};
use crate::error::{DataError, DataResult};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::DateTime;
use polars::prelude::{
    CsvReadOptions, DataFrame, DataType as FrameType, JsonFormat, JsonReader, ParquetReader,
    PolarsResult, SerReader, Series, TimeUnit,
};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
    JsonLines,
    Excel,
}
impl SourceFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(SourceFormat::Csv),
            "tsv" | "tab" => Some(SourceFormat::Tsv),
            "parquet" | "pq" => Some(SourceFormat::Parquet),
            "json" => Some(SourceFormat::Json),
            "ndjson" | "jsonl" => Some(SourceFormat::JsonLines),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Excel),
            _ => None,
        }
    }
    /// Format from a file name; anything unrecognised is an unsupported-format
    /// error.
    pub fn detect(file_name: &str) -> DataResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| DataError::UnsupportedFormat {
            format: if extension.is_empty() {
                file_name.to_string()
            } else {
                extension.to_ascii_lowercase()
            },
        })
    }
}
impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Tsv => "tsv",
            SourceFormat::Parquet => "parquet",
            SourceFormat::Json => "json",
            SourceFormat::JsonLines => "ndjson",
            SourceFormat::Excel => "excel",
        };
        f.write_str(name)
    }
}
pub fn load_path<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> DataResult<Dataset> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let format = SourceFormat::detect(&label)?;
    let bytes = fs::read(path)?;
    read_dataset(format, bytes, config, &label)
}
/// Same dispatch as [`load_path`] for an upload already held in memory.
pub fn load_bytes(file_name: &str, bytes: Vec<u8>, config: &LoaderConfig) -> DataResult<Dataset> {
    let format = SourceFormat::detect(file_name)?;
    read_dataset(format, bytes, config, file_name)
}
pub fn read_dataset(
    format: SourceFormat,
    bytes: Vec<u8>,
    config: &LoaderConfig,
    label: &str,
) -> DataResult<Dataset> {
    if format == SourceFormat::Excel {
        return read_workbook(bytes, label);
    }
    let frame = read_frame(format, bytes, config, label)?;
    Ok(dataset_from_dataframe(&frame))
}
/// Parses the polars-backed formats. Workbooks have no polars reader and go
/// through [`read_dataset`].
pub fn read_frame(
    format: SourceFormat,
    bytes: Vec<u8>,
    config: &LoaderConfig,
    label: &str,
) -> DataResult<DataFrame> {
    let cursor = Cursor::new(bytes);
    let result = match format {
        SourceFormat::Csv => read_delimited(cursor, b',', config),
        SourceFormat::Tsv => read_delimited(cursor, b'\t', config),
        SourceFormat::Parquet => ParquetReader::new(cursor).finish(),
        SourceFormat::Json => JsonReader::new(cursor)
            .infer_schema_len(config.infer_schema_rows.and_then(std::num::NonZeroUsize::new))
            .finish(),
        SourceFormat::JsonLines => JsonReader::new(cursor)
            .with_json_format(JsonFormat::JsonLines)
            .infer_schema_len(config.infer_schema_rows.and_then(std::num::NonZeroUsize::new))
            .finish(),
        SourceFormat::Excel => {
            return Err(DataError::UnsupportedFormat {
                format: format.to_string(),
            })
        }
    };
    let frame = result.map_err(|source| DataError::DataFileError {
        path: label.to_string(),
        source,
    })?;
    debug!(file = label, %format, shape = ?frame.shape(), "data file parsed");
    Ok(frame)
}
fn read_delimited(
    cursor: Cursor<Vec<u8>>,
    separator: u8,
    config: &LoaderConfig,
) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(config.infer_schema_rows)
        .map_parse_options(|options| {
            options
                .with_separator(separator)
                .with_try_parse_dates(config.try_parse_dates)
        })
        .into_reader_with_file_handle(cursor)
        .finish()
}
fn read_workbook(bytes: Vec<u8>, label: &str) -> DataResult<Dataset> {
    let spreadsheet_error = |source| DataError::SpreadsheetError {
        path: label.to_string(),
        source,
    };
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(spreadsheet_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .unwrap_or(Err(calamine::Error::Msg("workbook has no worksheets")))
        .map_err(spreadsheet_error)?;
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Dataset::new(Vec::new()));
    };
    let names = header_names(header);
    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (column, value) in cells.iter_mut().zip(row) {
            column.push(sheet_cell(value));
        }
    }
    let row_count = range.height().saturating_sub(1);
    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| Column { name, cells })
        .collect();
    let dataset = Dataset::with_row_count(columns, row_count);
    debug!(file = label, shape = ?dataset.shape(), "workbook parsed");
    Ok(dataset)
}
/// Blank headers become `Unnamed: <index>`; repeats get a `.1`, `.2` suffix.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let base = match cell.to_string().trim() {
                "" => format!("Unnamed: {index}"),
                name => name.to_string(),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}
fn sheet_cell(value: &Data) -> CellValue {
    match value {
        Data::Int(v) => CellValue::from(*v),
        Data::Float(v) => CellValue::number(*v),
        Data::Bool(v) => CellValue::from(*v),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            CellValue::Text(s.clone())
        }
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Null, |naive| CellValue::Timestamp(naive.and_utc())),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}
/// Converts every frame column; a column that cannot be converted is kept
/// as all-null so it classifies as unknown instead of failing the load.
pub fn dataset_from_dataframe(frame: &DataFrame) -> Dataset {
    let rows = frame.height();
    let columns = frame
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let name = series.name().to_string();
            match convert_series(series) {
                Ok(column) => column,
                Err(err) => {
                    warn!(
                        column = %name,
                        error = %err,
                        "column conversion failed, treating as unknown"
                    );
                    Column::nulls(name, rows)
                }
            }
        })
        .collect();
    Dataset::with_row_count(columns, rows)
}
pub fn convert_series(series: &Series) -> DataResult<Column> {
    let name = series.name().to_string();
    let cells = series_cells(series).map_err(|err| DataError::ColumnConversion {
        column: name.clone(),
        reason: err.to_string(),
    })?;
    Ok(Column { name, cells })
}
fn series_cells(series: &Series) -> PolarsResult<Vec<CellValue>> {
    let cells = match series.dtype() {
        FrameType::Boolean => series.bool()?.into_iter().map(CellValue::from).collect(),
        FrameType::Int8
        | FrameType::Int16
        | FrameType::Int32
        | FrameType::Int64
        | FrameType::UInt8
        | FrameType::UInt16
        | FrameType::UInt32
        | FrameType::UInt64
        | FrameType::Float32
        | FrameType::Float64 => series
            .cast(&FrameType::Float64)?
            .f64()?
            .into_iter()
            .map(CellValue::from)
            .collect(),
        FrameType::Date => epoch_millis_cells(
            &series.cast(&FrameType::Datetime(TimeUnit::Milliseconds, None))?,
        )?,
        FrameType::Datetime(_, tz) => epoch_millis_cells(
            &series.cast(&FrameType::Datetime(TimeUnit::Milliseconds, tz.clone()))?,
        )?,
        FrameType::String => series.str()?.into_iter().map(CellValue::from).collect(),
        _ => series
            .cast(&FrameType::String)?
            .str()?
            .into_iter()
            .map(CellValue::from)
            .collect(),
    };
    Ok(cells)
}
fn epoch_millis_cells(series: &Series) -> PolarsResult<Vec<CellValue>> {
    Ok(series
        .cast(&FrameType::Int64)?
        .i64()?
        .into_iter()
        .map(|millis| {
            millis
                .and_then(DateTime::from_timestamp_millis)
                .map_or(CellValue::Null, CellValue::Timestamp)
        })
        .collect())
}
