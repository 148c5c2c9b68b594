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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum EaselError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
}
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported data format: {format}")]
    UnsupportedFormat { format: String },
    #[error("Failed to read data file '{path}': {source}")]
    DataFileError {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Failed to convert column '{column}': {reason}")]
    ColumnConversion { column: String, reason: String },
    #[error("Failed to read spreadsheet '{path}': {source}")]
    SpreadsheetError {
        path: String,
        #[source]
        source: calamine::Error,
    },
    #[error("Column '{column}' has {found} values but the dataset has {expected} rows")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Failed to build sample data: {0}")]
    Sample(String),
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParse {
        #[from]
        source: serde_yaml::Error,
    },
}
#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}
pub type Result<T> = std::result::Result<T, EaselError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
impl From<serde_json::Error> for EaselError {
    fn from(err: serde_json::Error) -> Self {
        EaselError::Serialisation(SerialisationError::Json { source: err })
    }
}
impl EaselError {
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, EaselError::Data(DataError::UnsupportedFormat { .. }))
    }
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EaselError::Data(DataError::UnsupportedFormat { .. })
                | EaselError::Config(ConfigError::InvalidValue { .. })
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            EaselError::Data(_) => "Data",
            EaselError::Config(_) => "Configuration",
            EaselError::Io(_) => "I/O",
            EaselError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            EaselError::Data(DataError::UnsupportedFormat { .. }) => {
                "Unsupported file format".to_string()
            }
            EaselError::Config(ConfigError::ConfigFileError { .. }) => {
                "Unable to load configuration. Please check the configuration file.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
