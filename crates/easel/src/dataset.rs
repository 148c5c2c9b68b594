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

//! In-memory table snapshot handed to the recommender.
//!
//! Cells carry a closed value-kind tag that is fixed at ingestion, so the
//! classifier and everything downstream never inspect raw loader types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
pub const DEFAULT_PREVIEW_ROWS: usize = 5000;
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Null,
}
impl CellValue {
    /// NaN is folded into `Null` so it never counts as a distinct value.
    pub fn number(value: f64) -> Self {
        if value.is_nan() {
            CellValue::Null
        } else {
            CellValue::Number(value)
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Number(v) => {
                serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number)
            }
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            CellValue::Null => Value::Null,
        }
    }
}
impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::number(value)
    }
}
impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}
impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}
impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Number(if value { 1.0 } else { 0.0 })
    }
}
impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}
impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}
impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::Timestamp(value)
    }
}
impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}
impl Column {
    pub fn new<N, I, V>(name: N, cells: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self {
            name: name.into(),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
    pub fn nulls<N: Into<String>>(name: N, rows: usize) -> Self {
        Self {
            name: name.into(),
            cells: vec![CellValue::Null; rows],
        }
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    pub fn non_null(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().filter(|c| !c.is_null())
    }
}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}
impl Dataset {
    /// Row count is taken from the longest column.
    pub fn new(columns: Vec<Column>) -> Self {
        let row_count = columns.iter().map(Column::len).max().unwrap_or(0);
        Self { columns, row_count }
    }
    pub fn with_row_count(columns: Vec<Column>, row_count: usize) -> Self {
        Self { columns, row_count }
    }
    pub fn empty(row_count: usize) -> Self {
        Self {
            columns: Vec::new(),
            row_count,
        }
    }
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
    pub fn row_count(&self) -> usize {
        self.row_count
    }
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    /// Row records for a presentation layer. Missing and null cells are
    /// filled with `0` so every record has a renderable value per column.
    pub fn preview_records(&self, limit: usize) -> Vec<Map<String, Value>> {
        (0..self.row_count.min(limit))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| {
                        let value = match column.cells.get(row) {
                            Some(cell) if !cell.is_null() => cell.to_json(),
                            _ => Value::from(0),
                        };
                        (column.name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}
