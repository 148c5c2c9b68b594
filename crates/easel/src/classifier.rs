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

use crate::config::ClassifierConfig;
use crate::dataset::{CellValue, Column, Dataset};
use crate::error::{DataError, DataResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
/// Role a column plays in chart generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Datetime,
    Unknown,
}
impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Datetime => "datetime",
            ColumnType::Unknown => "unknown",
        }
    }
}
impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
/// Per-column entry of the analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub unique_values: usize,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleColumn {
    pub name: String,
    pub unique_values: usize,
}
/// Order-preserving role lists. The only view of the data the generator sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnGroups {
    pub numeric: Vec<RoleColumn>,
    pub categorical: Vec<RoleColumn>,
    pub datetime: Vec<RoleColumn>,
    pub row_count: usize,
}
impl ColumnGroups {
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            ..Default::default()
        }
    }
    pub fn push(&mut self, name: &str, profile: ColumnProfile) {
        let column = RoleColumn {
            name: name.to_string(),
            unique_values: profile.unique_values,
        };
        match profile.column_type {
            ColumnType::Numeric => self.numeric.push(column),
            ColumnType::Categorical => self.categorical.push(column),
            ColumnType::Datetime => self.datetime.push(column),
            ColumnType::Unknown => {}
        }
    }
    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty() && self.categorical.is_empty() && self.datetime.is_empty()
    }
    /// Distinct/row ratio; zero for an empty table.
    pub fn unique_ratio(&self, column: &RoleColumn) -> f64 {
        if self.row_count == 0 {
            0.0
        } else {
            column.unique_values as f64 / self.row_count as f64
        }
    }
}
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub columns: IndexMap<String, ColumnProfile>,
    pub groups: ColumnGroups,
}
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DistinctKey<'a> {
    Number(u64),
    Text(&'a str),
    Timestamp(i64, u32),
}
impl<'a> DistinctKey<'a> {
    fn of(cell: &'a CellValue) -> Option<Self> {
        match cell {
            CellValue::Number(v) => {
                let v = if *v == 0.0 { 0.0 } else { *v };
                Some(DistinctKey::Number(v.to_bits()))
            }
            CellValue::Text(s) => Some(DistinctKey::Text(s.as_str())),
            CellValue::Timestamp(ts) => Some(DistinctKey::Timestamp(
                ts.timestamp(),
                ts.timestamp_subsec_nanos(),
            )),
            CellValue::Null => None,
        }
    }
}
/// Distinct non-null values; `0.0` and `-0.0` count once.
pub fn distinct_count(column: &Column) -> usize {
    column
        .cells
        .iter()
        .filter_map(DistinctKey::of)
        .collect::<HashSet<_>>()
        .len()
}
/// Assigns each column a [`ColumnType`] from its cell kinds, inferring
/// datetimes from text when enough values parse.
#[derive(Debug, Clone, Default)]
pub struct ColumnClassifier {
    config: ClassifierConfig,
}
impl ColumnClassifier {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
    /// Classifies every column. A column that cannot be classified is
    /// reported as unknown; it never aborts the whole table.
    pub fn classify(&self, dataset: &Dataset) -> Classification {
        let rows = dataset.row_count();
        let mut classification = Classification {
            columns: IndexMap::with_capacity(dataset.column_count()),
            groups: ColumnGroups::new(rows),
        };
        for column in dataset.columns() {
            let profile = match self.classify_column(column, rows) {
                Ok(profile) => profile,
                Err(err) => {
                    warn!(
                        column = %column.name,
                        error = %err,
                        "classification failed, defaulting to unknown"
                    );
                    ColumnProfile {
                        column_type: ColumnType::Unknown,
                        unique_values: distinct_count(column),
                    }
                }
            };
            debug!(
                column = %column.name,
                column_type = %profile.column_type,
                unique = profile.unique_values,
                "classified column"
            );
            classification.groups.push(&column.name, profile);
            classification.columns.insert(column.name.clone(), profile);
        }
        classification
    }
    pub fn classify_column(&self, column: &Column, total_rows: usize) -> DataResult<ColumnProfile> {
        if column.len() != total_rows {
            return Err(DataError::RaggedColumn {
                column: column.name.clone(),
                expected: total_rows,
                found: column.len(),
            });
        }
        Ok(ColumnProfile {
            column_type: self.detect_column_type(column),
            unique_values: distinct_count(column),
        })
    }
    fn detect_column_type(&self, column: &Column) -> ColumnType {
        let mut numbers = 0usize;
        let mut texts = 0usize;
        let mut timestamps = 0usize;
        for cell in column.non_null() {
            match cell {
                CellValue::Number(_) => numbers += 1,
                CellValue::Text(_) => texts += 1,
                CellValue::Timestamp(_) => timestamps += 1,
                CellValue::Null => {}
            }
        }
        let non_null = numbers + texts + timestamps;
        if non_null == 0 {
            return ColumnType::Unknown;
        }
        if numbers == non_null {
            return ColumnType::Numeric;
        }
        if timestamps == non_null {
            return ColumnType::Datetime;
        }
        if texts == non_null
            && self.config.infer_temporal_text
            && self.temporal_confidence(column) >= self.config.temporal_confidence_threshold
        {
            return ColumnType::Datetime;
        }
        ColumnType::Categorical
    }
    fn temporal_confidence(&self, column: &Column) -> f64 {
        let values: Vec<&str> = column
            .cells
            .iter()
            .filter_map(|c| match c {
                CellValue::Text(s) => Some(s.trim()),
                _ => None,
            })
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        let parsed = values
            .iter()
            .filter(|v| self.parse_timestamp(v).is_some())
            .count();
        parsed as f64 / values.len() as f64
    }
    pub fn parse_timestamp(&self, value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        self.config
            .temporal_formats
            .iter()
            .find_map(|format| parse_with_format(value, format))
    }
}
fn parse_with_format(value: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, format) {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
pub fn classify(dataset: &Dataset) -> Classification {
    ColumnClassifier::new().classify(dataset)
}
