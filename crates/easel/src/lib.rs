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

pub mod chart;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod image_hint;
pub mod ingest;
pub mod samples;
pub mod selection;

pub use chart::{
    Aggregate, Channel, ChannelDef, ChartCandidate, Encoding, Family, MarkDescriptor, MarkType,
    Signature, SortOrder, StackMode, Transform, ValueKind,
};
pub use classifier::{Classification, ColumnClassifier, ColumnGroups, ColumnProfile, ColumnType};
pub use config::{
    ClassifierConfig, FillerPolicy, GeneratorConfig, LoaderConfig, RecommenderConfig,
};
pub use dataset::{CellValue, Column, Dataset, DEFAULT_PREVIEW_ROWS};
pub use error::{ConfigError, DataError, EaselError, Result};
pub use generator::CandidateGenerator;
pub use image_hint::detect_mark;
pub use ingest::SourceFormat;

use indexmap::IndexMap;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Column classification, table shape and the bounded recommendation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub columns: IndexMap<String, ColumnProfile>,
    pub shape: (usize, usize),
    pub recommendations: Vec<ChartCandidate>,
}
#[derive(Debug, Clone, Default)]
pub struct ChartRecommender {
    config: RecommenderConfig,
    classifier: ColumnClassifier,
    generator: CandidateGenerator,
}
impl ChartRecommender {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: ColumnClassifier::with_config(config.classifier.clone()),
            generator: CandidateGenerator::with_config(config.generator.clone()),
            config,
        })
    }
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }
    pub fn profile(&self, dataset: &Dataset) -> Classification {
        self.classifier.classify(dataset)
    }
    /// The full ordered pool, before deduplication and truncation.
    pub fn candidate_pool(&self, dataset: &Dataset) -> Vec<ChartCandidate> {
        self.generator.generate(&self.profile(dataset).groups)
    }
    pub fn analyze(&self, dataset: &Dataset) -> AnalysisResult {
        let classification = self.profile(dataset);
        let pool = self.generator.generate(&classification.groups);
        let pool_size = pool.len();
        let recommendations =
            selection::deduplicate_and_select(pool, self.config.max_recommendations);
        info!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            pool = pool_size,
            recommended = recommendations.len(),
            "analysis complete"
        );
        AnalysisResult {
            columns: classification.columns,
            shape: dataset.shape(),
            recommendations,
        }
    }
    pub fn analyze_dataframe(&self, frame: &DataFrame) -> AnalysisResult {
        self.analyze(&ingest::dataset_from_dataframe(frame))
    }
    pub fn analyze_path<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisResult> {
        let dataset = ingest::load_path(path, &self.config.loader)?;
        Ok(self.analyze(&dataset))
    }
    pub fn analyze_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<AnalysisResult> {
        let dataset = ingest::load_bytes(file_name, bytes, &self.config.loader)?;
        Ok(self.analyze(&dataset))
    }
}
pub fn analyze_dataset(dataset: &Dataset) -> AnalysisResult {
    ChartRecommender::new().analyze(dataset)
}
