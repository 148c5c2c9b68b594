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

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 12;
/// A categorical column whose distinct/row ratio exceeds this is treated as an identifier.
pub const DEFAULT_NEAR_UNIQUE_RATIO: f64 = 0.9;
pub const DEFAULT_TIME_SERIES_NUMERIC_LIMIT: usize = 2;
pub const DEFAULT_MAX_PAIRS_PER_FAMILY: usize = 512;
pub const DEFAULT_TEMPORAL_CONFIDENCE: f64 = 0.8;
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub infer_temporal_text: bool,
    pub temporal_confidence_threshold: f64,
    pub temporal_formats: Vec<String>,
}
impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            infer_temporal_text: true,
            temporal_confidence_threshold: DEFAULT_TEMPORAL_CONFIDENCE,
            temporal_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%SZ".to_string(),
                "%m/%d/%Y".to_string(),
                "%d/%m/%Y".to_string(),
                "%Y%m%d".to_string(),
            ],
        }
    }
}
/// When the fallback family contributes to the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillerPolicy {
    /// Only when no earlier family produced a candidate.
    #[default]
    WhenEmpty,
    Always,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub near_unique_ratio: f64,
    /// Which numeric column supplies the value axis of single-categorical charts.
    pub value_column_index: usize,
    pub time_series_numeric_limit: usize,
    /// Upper bound on pairs walked by each pairwise family on wide tables.
    pub max_pairs_per_family: usize,
    pub fillers: FillerPolicy,
}
impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            near_unique_ratio: DEFAULT_NEAR_UNIQUE_RATIO,
            value_column_index: 0,
            time_series_numeric_limit: DEFAULT_TIME_SERIES_NUMERIC_LIMIT,
            max_pairs_per_family: DEFAULT_MAX_PAIRS_PER_FAMILY,
            fillers: FillerPolicy::default(),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub try_parse_dates: bool,
    pub infer_schema_rows: Option<usize>,
}
impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            try_parse_dates: true,
            infer_schema_rows: Some(1000),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub max_recommendations: usize,
    pub classifier: ClassifierConfig,
    pub generator: GeneratorConfig,
    pub loader: LoaderConfig,
}
impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            classifier: ClassifierConfig::default(),
            generator: GeneratorConfig::default(),
            loader: LoaderConfig::default(),
        }
    }
}
impl RecommenderConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_recommendations == 0 {
            return Err(invalid("max_recommendations", self.max_recommendations));
        }
        let ratio = self.generator.near_unique_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(invalid("generator.near_unique_ratio", ratio));
        }
        if self.generator.time_series_numeric_limit == 0 {
            return Err(invalid(
                "generator.time_series_numeric_limit",
                self.generator.time_series_numeric_limit,
            ));
        }
        if self.generator.max_pairs_per_family == 0 {
            return Err(invalid(
                "generator.max_pairs_per_family",
                self.generator.max_pairs_per_family,
            ));
        }
        let threshold = self.classifier.temporal_confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) || threshold == 0.0 {
            return Err(invalid("classifier.temporal_confidence_threshold", threshold));
        }
        if self.classifier.infer_temporal_text && self.classifier.temporal_formats.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "temporal_formats must not be empty when infer_temporal_text is enabled"
                    .to_string(),
            });
        }
        if self.loader.infer_schema_rows == Some(0) {
            return Err(invalid("loader.infer_schema_rows", 0));
        }
        Ok(())
    }
    pub fn for_wide_tables() -> Self {
        Self {
            generator: GeneratorConfig {
                max_pairs_per_family: 64,
                ..Default::default()
            },
            ..Default::default()
        }
    }
    pub fn for_strict_typing() -> Self {
        Self {
            classifier: ClassifierConfig {
                temporal_confidence_threshold: 1.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(RecommenderConfig::default().validate().is_ok());
        assert!(RecommenderConfig::for_wide_tables().validate().is_ok());
        assert!(RecommenderConfig::for_strict_typing().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = RecommenderConfig::default();
        config.generator.near_unique_ratio = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "generator.near_unique_ratio"
        ));

        let mut config = RecommenderConfig::default();
        config.max_recommendations = 0;
        assert!(config.validate().is_err());

        let mut config = RecommenderConfig::default();
        config.classifier.temporal_formats.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = RecommenderConfig::from_yaml_str(
            "max_recommendations: 5\ngenerator:\n  near_unique_ratio: 0.75\n",
        )
        .unwrap();
        assert_eq!(config.max_recommendations, 5);
        assert_eq!(config.generator.near_unique_ratio, 0.75);
        assert_eq!(
            config.generator.time_series_numeric_limit,
            DEFAULT_TIME_SERIES_NUMERIC_LIMIT
        );
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn filler_policy_reads_snake_case() {
        let config = RecommenderConfig::from_yaml_str("generator:\n  fillers: always\n").unwrap();
        assert_eq!(config.generator.fillers, FillerPolicy::Always);
        assert_eq!(GeneratorConfig::default().fillers, FillerPolicy::WhenEmpty);
    }

    #[test]
    fn yaml_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let yaml = RecommenderConfig::for_wide_tables().to_yaml().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let loaded = RecommenderConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(loaded, RecommenderConfig::for_wide_tables());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RecommenderConfig::from_yaml_file("/nonexistent/easel.yml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/easel.yml"));
    }
}
