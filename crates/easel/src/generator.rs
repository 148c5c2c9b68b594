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

//! Rule-driven candidate generation.
//!
//! Each template family is a plain function registered in [`FAMILY_REGISTRY`]
//! together with the column roles it needs. Families that describe a single
//! combination of roles bind to the first column of each role; the pairwise
//! families walk every pair, bounded by `max_pairs_per_family`.

use crate::chart::{
    Aggregate, ChannelDef, ChartCandidate, Channel, Encoding, Family, MarkDescriptor, MarkType,
    SortOrder, StackMode, Transform,
};
use crate::classifier::{ColumnGroups, RoleColumn};
use crate::config::{FillerPolicy, GeneratorConfig};
use itertools::Itertools;
use tracing::debug;
type FamilyFn = fn(&ColumnGroups, &GeneratorConfig) -> Vec<ChartCandidate>;
/// Minimum number of columns per role a family needs before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRequirement {
    pub numeric: usize,
    pub categorical: usize,
    pub datetime: usize,
}
impl RoleRequirement {
    pub const fn new(numeric: usize, categorical: usize, datetime: usize) -> Self {
        Self {
            numeric,
            categorical,
            datetime,
        }
    }
    pub fn satisfied_by(&self, groups: &ColumnGroups) -> bool {
        groups.numeric.len() >= self.numeric
            && groups.categorical.len() >= self.categorical
            && groups.datetime.len() >= self.datetime
    }
}
/// A chart family: its role requirement and the builder that emits its
/// candidates.
pub struct FamilyRule {
    pub family: Family,
    pub requires: RoleRequirement,
    generate: FamilyFn,
}
impl FamilyRule {
    pub fn is_active(&self, groups: &ColumnGroups) -> bool {
        self.requires.satisfied_by(groups)
    }
    pub fn generate(&self, groups: &ColumnGroups, config: &GeneratorConfig) -> Vec<ChartCandidate> {
        if !self.is_active(groups) {
            return Vec::new();
        }
        (self.generate)(groups, config)
    }
}
impl std::fmt::Debug for FamilyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyRule")
            .field("family", &self.family)
            .field("requires", &self.requires)
            .finish()
    }
}
/// Generation order. The pool is the concatenation of these in sequence.
pub static FAMILY_REGISTRY: &[FamilyRule] = &[
    FamilyRule {
        family: Family::SingleNumeric,
        requires: RoleRequirement::new(1, 0, 0),
        generate: single_numeric,
    },
    FamilyRule {
        family: Family::SingleCategorical,
        requires: RoleRequirement::new(0, 1, 0),
        generate: single_categorical,
    },
    FamilyRule {
        family: Family::PairwiseNumeric,
        requires: RoleRequirement::new(2, 0, 0),
        generate: pairwise_numeric,
    },
    FamilyRule {
        family: Family::NumericByCategorical,
        requires: RoleRequirement::new(1, 1, 0),
        generate: numeric_by_categorical,
    },
    FamilyRule {
        family: Family::TimeSeries,
        requires: RoleRequirement::new(1, 0, 1),
        generate: time_series,
    },
    FamilyRule {
        family: Family::MultivariateNumeric,
        requires: RoleRequirement::new(3, 0, 0),
        generate: multivariate_numeric,
    },
    FamilyRule {
        family: Family::MultivariateMixed,
        requires: RoleRequirement::new(2, 1, 0),
        generate: multivariate_mixed,
    },
    FamilyRule {
        family: Family::MultivariateTemporal,
        requires: RoleRequirement::new(1, 1, 1),
        generate: multivariate_temporal,
    },
    FamilyRule {
        family: Family::Fallback,
        requires: RoleRequirement::new(0, 0, 0),
        generate: fallback,
    },
];
/// Registry entry for `family`.
pub fn family_rule(family: Family) -> Option<&'static FamilyRule> {
    FAMILY_REGISTRY.iter().find(|rule| rule.family == family)
}
/// Walks [`FAMILY_REGISTRY`] over a set of role groups.
#[derive(Debug, Clone, Default)]
pub struct CandidateGenerator {
    config: GeneratorConfig,
}
impl CandidateGenerator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
    /// Full ordered candidate pool, before deduplication.
    pub fn generate(&self, groups: &ColumnGroups) -> Vec<ChartCandidate> {
        let mut pool = Vec::new();
        for rule in FAMILY_REGISTRY {
            let emitted: Vec<ChartCandidate> = if rule.family == Family::Fallback
                && self.config.fillers == FillerPolicy::WhenEmpty
                && !pool.is_empty()
            {
                // Numeric fillers stand in only when nothing else matched.
                text_filler(groups).into_iter().collect()
            } else {
                rule.generate(groups, &self.config)
            };
            debug!(family = ?rule.family, count = emitted.len(), "family generated");
            pool.extend(emitted);
        }
        debug!(pool = pool.len(), "candidate pool built");
        pool
    }
    /// A single family in isolation, ignoring the filler policy.
    pub fn generate_family(&self, family: Family, groups: &ColumnGroups) -> Vec<ChartCandidate> {
        family_rule(family).map_or_else(Vec::new, |rule| rule.generate(groups, &self.config))
    }
}
pub fn generate(groups: &ColumnGroups) -> Vec<ChartCandidate> {
    CandidateGenerator::new().generate(groups)
}
fn quant(field: &str) -> ChannelDef {
    ChannelDef::field(field).quantitative()
}
fn nominal(field: &str) -> ChannelDef {
    ChannelDef::field(field).nominal()
}
fn temporal(field: &str) -> ChannelDef {
    ChannelDef::field(field).temporal()
}
fn xy(x: ChannelDef, y: ChannelDef) -> Encoding {
    Encoding::new().with(Channel::X, x).with(Channel::Y, y)
}
fn single_numeric(groups: &ColumnGroups, _config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::SingleNumeric;
    groups
        .numeric
        .iter()
        .flat_map(|column| {
            let col = column.name.as_str();
            [
                ChartCandidate::new(
                    family,
                    format!("hist_{col}"),
                    format!("Histogram: {col}"),
                    "Frequency distribution.",
                    MarkType::Bar,
                    xy(ChannelDef::field(col).binned(), ChannelDef::count()),
                ),
                ChartCandidate::new(
                    family,
                    format!("dens_area_{col}"),
                    format!("Density Area: {col}"),
                    "Smoothed distribution.",
                    MarkType::Area,
                    xy(quant("value"), quant("density")),
                )
                .with_transform(Transform::density(col)),
                ChartCandidate::new(
                    family,
                    format!("dens_line_{col}"),
                    format!("Density Curve: {col}"),
                    "Outline of distribution.",
                    MarkType::Line,
                    xy(quant("value"), quant("density")),
                )
                .with_transform(Transform::density(col)),
                ChartCandidate::new(
                    family,
                    format!("box_{col}"),
                    format!("Boxplot: {col}"),
                    "Median and quartiles.",
                    MarkType::Boxplot,
                    Encoding::new().with(Channel::Y, quant(col)),
                ),
                ChartCandidate::new(
                    family,
                    format!("strip_{col}"),
                    format!("Strip Plot: {col}"),
                    "Individual data points.",
                    MarkType::Tick,
                    Encoding::new().with(Channel::X, quant(col)),
                ),
                ChartCandidate::new(
                    family,
                    format!("cdf_{col}"),
                    format!("CDF: {col}"),
                    "Cumulative density.",
                    MarkType::Line,
                    xy(
                        quant(col),
                        ChannelDef::count()
                            .quantitative()
                            .stacked(StackMode::Normalize),
                    ),
                )
                .with_transform(Transform::running_count(col)),
                ChartCandidate::new(
                    family,
                    format!("dot_{col}"),
                    format!("Dot Plot: {col}"),
                    "Binned dot frequency.",
                    MarkType::Circle,
                    xy(ChannelDef::field(col).binned(), ChannelDef::count()),
                ),
            ]
        })
        .collect()
}
fn is_near_unique(groups: &ColumnGroups, column: &RoleColumn, config: &GeneratorConfig) -> bool {
    groups.unique_ratio(column) > config.near_unique_ratio
}
fn single_categorical(groups: &ColumnGroups, config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::SingleCategorical;
    let value = groups
        .numeric
        .get(config.value_column_index)
        .map(|c| c.name.as_str());
    let mut out = Vec::new();
    for column in &groups.categorical {
        let col = column.name.as_str();
        if let Some(val) = value {
            let sum = || quant(val).with_aggregate(Aggregate::Sum);
            let share = || {
                Encoding::new()
                    .with(
                        Channel::Theta,
                        ChannelDef::field(val).with_aggregate(Aggregate::Sum),
                    )
                    .with(Channel::Color, nominal(col))
            };
            out.push(ChartCandidate::new(
                family,
                format!("bar_sum_{col}_{val}"),
                format!("Bar Chart: {col}"),
                format!("Sum of {val}"),
                MarkType::Bar,
                xy(nominal(col), sum()),
            ));
            out.push(ChartCandidate::new(
                family,
                format!("bar_sort_sum_{col}_{val}"),
                format!("Sorted Bar: {col}"),
                format!("Ordered by {val}"),
                MarkType::Bar,
                xy(nominal(col).sorted(SortOrder::ByYDescending), sum()),
            ));
            out.push(ChartCandidate::new(
                family,
                format!("pie_{col}"),
                format!("Pie: {col}"),
                format!("Share of {val}"),
                MarkType::Arc,
                share(),
            ));
            out.push(ChartCandidate::new(
                family,
                format!("donut_{col}"),
                format!("Donut: {col}"),
                "Ring chart.",
                MarkDescriptor::new(MarkType::Arc).with("innerRadius", 50),
                share(),
            ));
        }
        if is_near_unique(groups, column, config) {
            debug!(column = col, "near-unique column, count bars suppressed");
        } else {
            out.push(ChartCandidate::new(
                family,
                format!("bar_cat_{col}"),
                format!("Bar Count: {col}"),
                "Category frequency.",
                MarkType::Bar,
                xy(nominal(col), ChannelDef::count()),
            ));
            out.push(ChartCandidate::new(
                family,
                format!("hbar_cat_{col}"),
                format!("Horiz Bar: {col}"),
                "Category frequency.",
                MarkType::Bar,
                xy(ChannelDef::count(), nominal(col)),
            ));
        }
        if let Some(val) = value {
            out.push(ChartCandidate::new(
                family,
                format!("lollipop_{col}"),
                format!("Lollipop: {col}"),
                format!("Value of {val}"),
                MarkDescriptor::new(MarkType::Bar).with("size", 2),
                xy(
                    nominal(col),
                    ChannelDef::field(val).with_aggregate(Aggregate::Sum),
                ),
            ));
        }
    }
    out
}
fn pairwise_numeric(groups: &ColumnGroups, config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::PairwiseNumeric;
    let total = groups.numeric.len() * groups.numeric.len().saturating_sub(1) / 2;
    if total > config.max_pairs_per_family {
        debug!(
            pairs = total,
            cap = config.max_pairs_per_family,
            "numeric pairs capped"
        );
    }
    groups
        .numeric
        .iter()
        .tuple_combinations()
        .take(config.max_pairs_per_family)
        .flat_map(|(a, b): (&RoleColumn, &RoleColumn)| {
            let (x, y) = (a.name.as_str(), b.name.as_str());
            [
                ChartCandidate::new(
                    family,
                    format!("scatter_{x}_{y}"),
                    format!("Scatter: {x} vs {y}"),
                    "Correlation.",
                    MarkType::Point,
                    xy(quant(x), quant(y)),
                ),
                ChartCandidate::new(
                    family,
                    format!("bubble_{x}_{y}"),
                    format!("Bubble: {x} vs {y}"),
                    "Weighted points.",
                    MarkType::Circle,
                    xy(quant(x), quant(y)).with(Channel::Size, quant(y)),
                ),
                ChartCandidate::new(
                    family,
                    format!("heat_{x}_{y}"),
                    format!("Heatmap: {x} vs {y}"),
                    "2D Histogram.",
                    MarkType::Rect,
                    xy(ChannelDef::field(x).binned(), ChannelDef::field(y).binned())
                        .with(Channel::Color, ChannelDef::count()),
                ),
                ChartCandidate::new(
                    family,
                    format!("conn_scat_{x}_{y}"),
                    format!("Connected: {x} vs {y}"),
                    "Path of values.",
                    MarkType::Line,
                    xy(quant(x), quant(y)).with(Channel::Order, ChannelDef::field(x)),
                ),
                ChartCandidate::new(
                    family,
                    format!("line_reg_{x}_{y}"),
                    format!("Line: {x} vs {y}"),
                    "Trend line.",
                    MarkType::Line,
                    xy(quant(x), quant(y)),
                ),
                ChartCandidate::new(
                    family,
                    format!("area_step_{x}_{y}"),
                    format!("Step Area: {x} vs {y}"),
                    "Stepped magnitude.",
                    MarkDescriptor::new(MarkType::Area).interpolated("step"),
                    xy(quant(x), quant(y)),
                ),
            ]
        })
        .collect()
}
fn numeric_by_categorical(groups: &ColumnGroups, config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::NumericByCategorical;
    let total = groups.numeric.len() * groups.categorical.len();
    if total > config.max_pairs_per_family {
        debug!(
            pairs = total,
            cap = config.max_pairs_per_family,
            "numeric/categorical pairs capped"
        );
    }
    groups
        .numeric
        .iter()
        .cartesian_product(groups.categorical.iter())
        .take(config.max_pairs_per_family)
        .flat_map(|(n, c)| {
            let (num, cat) = (n.name.as_str(), c.name.as_str());
            [
                ChartCandidate::new(
                    family,
                    format!("bar_avg_{num}_{cat}"),
                    format!("Avg {num} by {cat}"),
                    "Mean comparison.",
                    MarkType::Bar,
                    xy(nominal(cat), quant(num).with_aggregate(Aggregate::Mean)),
                ),
                ChartCandidate::new(
                    family,
                    format!("bar_max_{num}_{cat}"),
                    format!("Max {num} by {cat}"),
                    "Peak values.",
                    MarkType::Bar,
                    xy(nominal(cat), quant(num).with_aggregate(Aggregate::Max)),
                ),
                ChartCandidate::new(
                    family,
                    format!("box_grp_{num}_{cat}"),
                    format!("Box: {num} by {cat}"),
                    "Grouped distributions.",
                    MarkType::Boxplot,
                    xy(nominal(cat), quant(num)),
                ),
                ChartCandidate::new(
                    family,
                    format!("violin_sim_{num}_{cat}"),
                    format!("Density: {num} by {cat}"),
                    "Faceted density.",
                    MarkType::Area,
                    xy(ChannelDef::field("value"), ChannelDef::field("density"))
                        .with(Channel::Row, ChannelDef::field(cat)),
                )
                .with_transform(Transform::grouped_density(num, cat)),
                ChartCandidate::new(
                    family,
                    format!("tick_grp_{num}_{cat}"),
                    format!("Ticks: {num} by {cat}"),
                    "Raw value strip.",
                    MarkType::Tick,
                    xy(quant(num), nominal(cat)),
                ),
                ChartCandidate::new(
                    family,
                    format!("point_stat_{num}_{cat}"),
                    format!("Mean Point: {num} by {cat}"),
                    "Focus on mean.",
                    MarkType::Circle,
                    xy(nominal(cat), quant(num).with_aggregate(Aggregate::Mean))
                        .with(Channel::Size, ChannelDef::constant(100)),
                ),
                ChartCandidate::new(
                    family,
                    format!("rule_range_{num}_{cat}"),
                    format!("Range: {num} by {cat}"),
                    "Min-max range.",
                    MarkType::Rule,
                    xy(
                        nominal(cat),
                        ChannelDef::field(num).with_aggregate(Aggregate::Min),
                    )
                    .with(
                        Channel::Y2,
                        ChannelDef::field(num).with_aggregate(Aggregate::Max),
                    ),
                ),
            ]
        })
        .collect()
}
fn time_series(groups: &ColumnGroups, config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::TimeSeries;
    let Some(time) = groups.datetime.first() else {
        return Vec::new();
    };
    let time = time.name.as_str();
    groups
        .numeric
        .iter()
        .take(config.time_series_numeric_limit)
        .flat_map(|column| {
            let num = column.name.as_str();
            let over_time = || xy(temporal(time), quant(num));
            [
                ChartCandidate::new(
                    family,
                    format!("line_t_{num}"),
                    format!("Timeline: {num}"),
                    "Trend over time.",
                    MarkType::Line,
                    over_time(),
                ),
                ChartCandidate::new(
                    family,
                    format!("area_t_{num}"),
                    format!("Area: {num}"),
                    "Volume over time.",
                    MarkType::Area,
                    over_time(),
                ),
                ChartCandidate::new(
                    family,
                    format!("step_t_{num}"),
                    format!("Step: {num}"),
                    "Discrete changes.",
                    MarkDescriptor::new(MarkType::Line).interpolated("step-after"),
                    over_time(),
                ),
                ChartCandidate::new(
                    family,
                    format!("point_t_{num}"),
                    format!("Events: {num}"),
                    "Discrete measurements.",
                    MarkType::Point,
                    over_time(),
                ),
                ChartCandidate::new(
                    family,
                    format!("bar_t_{num}"),
                    format!("Daily/Unit: {num}"),
                    "Values per time unit.",
                    MarkType::Bar,
                    over_time(),
                ),
            ]
        })
        .collect()
}
fn multivariate_numeric(groups: &ColumnGroups, _config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::MultivariateNumeric;
    let [x, y, z] = match groups.numeric.as_slice() {
        [x, y, z, ..] => [x.name.as_str(), y.name.as_str(), z.name.as_str()],
        _ => return Vec::new(),
    };
    vec![
        ChartCandidate::new(
            family,
            format!("bub_col_{x}_{y}_{z}"),
            "Bubble 3Var".to_string(),
            format!("{x}/{y} sized by {z}"),
            MarkType::Circle,
            xy(quant(x), quant(y)).with(Channel::Size, quant(z)),
        ),
        ChartCandidate::new(
            family,
            format!("scat_col_{x}_{y}_{z}"),
            "Scatter Color".to_string(),
            format!("{x}/{y} colored by {z}"),
            MarkType::Point,
            xy(quant(x), quant(y)).with(Channel::Color, quant(z)),
        ),
    ]
}
fn multivariate_mixed(groups: &ColumnGroups, _config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::MultivariateMixed;
    let (x, y, c) = match (groups.numeric.as_slice(), groups.categorical.first()) {
        ([x, y, ..], Some(c)) => (x.name.as_str(), y.name.as_str(), c.name.as_str()),
        _ => return Vec::new(),
    };
    vec![
        ChartCandidate::new(
            family,
            format!("scat_cat_{x}_{y}_{c}"),
            "Grouped Scatter".to_string(),
            format!("{x}/{y} by {c}"),
            MarkType::Point,
            xy(quant(x), quant(y)).with(Channel::Color, nominal(c)),
        ),
        ChartCandidate::new(
            family,
            format!("bar_stack_{x}_{c}"),
            "Stacked Bar".to_string(),
            format!("Sum of {x} by {c}"),
            MarkType::Bar,
            xy(
                nominal(c),
                ChannelDef::field(x).with_aggregate(Aggregate::Sum),
            )
            .with(Channel::Color, nominal(c)),
        ),
        ChartCandidate::new(
            family,
            format!("bar_norm_{x}_{c}"),
            "Norm Bar".to_string(),
            format!("Share of {x} by {c}"),
            MarkType::Bar,
            xy(
                nominal(c),
                ChannelDef::field(x)
                    .with_aggregate(Aggregate::Sum)
                    .stacked(StackMode::Normalize),
            )
            .with(Channel::Color, ChannelDef::field(c)),
        ),
        ChartCandidate::new(
            family,
            format!("facet_scat_{x}_{y}_{c}"),
            format!("Faceted: {c}"),
            format!("Scatter split by {c}"),
            MarkType::Point,
            xy(ChannelDef::field(x), ChannelDef::field(y))
                .with(Channel::Row, ChannelDef::field(c)),
        ),
    ]
}
fn multivariate_temporal(groups: &ColumnGroups, _config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let family = Family::MultivariateTemporal;
    let (Some(t), Some(n), Some(c)) = (
        groups.datetime.first(),
        groups.numeric.first(),
        groups.categorical.first(),
    ) else {
        return Vec::new();
    };
    let (t, n, c) = (t.name.as_str(), n.name.as_str(), c.name.as_str());
    let stacked = |mode: StackMode| {
        xy(
            temporal(t),
            ChannelDef::field(n)
                .with_aggregate(Aggregate::Sum)
                .stacked(mode),
        )
        .with(Channel::Color, ChannelDef::field(c))
    };
    vec![
        ChartCandidate::new(
            family,
            format!("mline_{t}_{c}"),
            "Multi-Line".to_string(),
            format!("Trends by {c}"),
            MarkType::Line,
            xy(temporal(t), ChannelDef::field(n)).with(Channel::Color, ChannelDef::field(c)),
        ),
        ChartCandidate::new(
            family,
            format!("stream_{t}_{c}"),
            "Streamgraph".to_string(),
            format!("Flow of {c}"),
            MarkType::Area,
            stacked(StackMode::Center),
        ),
        ChartCandidate::new(
            family,
            format!("st_area_{t}_{c}"),
            "Stacked Area".to_string(),
            format!("Cumulative {c}"),
            MarkType::Area,
            stacked(StackMode::Zero),
        ),
    ]
}
fn fallback(groups: &ColumnGroups, _config: &GeneratorConfig) -> Vec<ChartCandidate> {
    let mut out = numeric_fillers(groups);
    out.extend(text_filler(groups));
    out
}
fn numeric_fillers(groups: &ColumnGroups) -> Vec<ChartCandidate> {
    let family = Family::Fallback;
    let Some(first) = groups.numeric.first() else {
        return Vec::new();
    };
    let n = first.name.as_str();
    vec![
        ChartCandidate::new(
            family,
            format!("sq_{n}"),
            "Square Plot".to_string(),
            "Simple square mark.",
            MarkType::Square,
            xy(ChannelDef::field(n).binned(), ChannelDef::count()),
        ),
        ChartCandidate::new(
            family,
            format!("rule_{n}"),
            "Rug Plot".to_string(),
            "1D distribution.",
            MarkType::Rule,
            Encoding::new().with(Channel::X, ChannelDef::field(n)),
        ),
    ]
}
fn text_filler(groups: &ColumnGroups) -> Option<ChartCandidate> {
    let c = groups.categorical.first()?.name.as_str();
    Some(ChartCandidate::new(
        Family::Fallback,
        format!("text_{c}"),
        "Text Cloud".to_string(),
        "Labels.",
        MarkType::Text,
        Encoding::new()
            .with(Channel::Text, ChannelDef::field(c))
            .with(Channel::Color, ChannelDef::field(c)),
    ))
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ColumnProfile, ColumnType};

    fn profile(column_type: ColumnType, unique_values: usize) -> ColumnProfile {
        ColumnProfile {
            column_type,
            unique_values,
        }
    }

    fn groups(
        numeric: &[&str],
        categorical: &[(&str, usize)],
        datetime: &[&str],
        rows: usize,
    ) -> ColumnGroups {
        let mut g = ColumnGroups::new(rows);
        for name in numeric {
            g.push(name, profile(ColumnType::Numeric, rows));
        }
        for (name, unique) in categorical {
            g.push(name, profile(ColumnType::Categorical, *unique));
        }
        for name in datetime {
            g.push(name, profile(ColumnType::Datetime, rows));
        }
        g
    }

    fn ids(candidates: &[ChartCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn registry_follows_generation_order() {
        let order: Vec<Family> = FAMILY_REGISTRY.iter().map(|r| r.family).collect();
        assert_eq!(
            order,
            vec![
                Family::SingleNumeric,
                Family::SingleCategorical,
                Family::PairwiseNumeric,
                Family::NumericByCategorical,
                Family::TimeSeries,
                Family::MultivariateNumeric,
                Family::MultivariateMixed,
                Family::MultivariateTemporal,
                Family::Fallback,
            ]
        );
    }

    #[test]
    fn single_numeric_emits_seven_per_column() {
        let g = groups(&["a", "b"], &[], &[], 10);
        let out = CandidateGenerator::new().generate_family(Family::SingleNumeric, &g);
        assert_eq!(out.len(), 14);
        assert_eq!(
            ids(&out[..7]),
            vec!["hist_a", "dens_area_a", "dens_line_a", "box_a", "strip_a", "cdf_a", "dot_a"]
        );
    }

    #[test]
    fn single_categorical_uses_first_numeric_as_value() {
        let g = groups(&["Budget", "Other"], &[("Dept", 3)], &[], 10);
        let out = CandidateGenerator::new().generate_family(Family::SingleCategorical, &g);
        assert_eq!(
            ids(&out),
            vec![
                "bar_sum_Dept_Budget",
                "bar_sort_sum_Dept_Budget",
                "pie_Dept",
                "donut_Dept",
                "bar_cat_Dept",
                "hbar_cat_Dept",
                "lollipop_Dept",
            ]
        );
        assert_eq!(out[2].encoding.field(Channel::Theta), Some("Budget"));
    }

    #[test]
    fn near_unique_category_drops_count_bars_only() {
        let g = groups(&["Budget"], &[("Id", 10)], &[], 10);
        let out = CandidateGenerator::new().generate_family(Family::SingleCategorical, &g);
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|c| !c.id.starts_with("bar_cat") && !c.id.starts_with("hbar_cat")));

        let g = groups(&[], &[("Id", 10)], &[], 10);
        let out = CandidateGenerator::new().generate_family(Family::SingleCategorical, &g);
        assert!(out.is_empty());
    }

    #[test]
    fn pairwise_families_walk_every_pair_up_to_cap() {
        let g = groups(&["a", "b", "c", "d"], &[("k", 2), ("m", 2)], &[], 10);
        let gen = CandidateGenerator::new();
        assert_eq!(gen.generate_family(Family::PairwiseNumeric, &g).len(), 6 * 6);
        assert_eq!(gen.generate_family(Family::NumericByCategorical, &g).len(), 8 * 7);

        let capped = CandidateGenerator::with_config(GeneratorConfig {
            max_pairs_per_family: 2,
            ..Default::default()
        });
        let out = capped.generate_family(Family::PairwiseNumeric, &g);
        assert_eq!(out.len(), 12);
        assert_eq!(out[0].id, "scatter_a_b");
        assert_eq!(out[6].id, "scatter_a_c");
    }

    #[test]
    fn time_series_binds_first_datetime_and_two_numerics() {
        let g = groups(&["a", "b", "c"], &[], &["t1", "t2"], 10);
        let out = CandidateGenerator::new().generate_family(Family::TimeSeries, &g);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|c| c.encoding.field(Channel::X) == Some("t1")));
        assert_eq!(out[2].mark.interpolation(), Some("step-after"));
        assert!(out.iter().all(|c| c.encoding.field(Channel::Y) != Some("c")));
    }

    #[test]
    fn multivariate_families_need_their_roles() {
        let gen = CandidateGenerator::new();
        let g = groups(&["a", "b"], &[("k", 2)], &["t"], 10);
        assert!(gen.generate_family(Family::MultivariateNumeric, &g).is_empty());
        assert_eq!(gen.generate_family(Family::MultivariateMixed, &g).len(), 4);
        let temporal = gen.generate_family(Family::MultivariateTemporal, &g);
        assert_eq!(ids(&temporal), vec!["mline_t_k", "stream_t_k", "st_area_t_k"]);
        assert_eq!(
            temporal[1].encoding.get(Channel::Y).and_then(|d| d.stack),
            Some(StackMode::Center)
        );
    }

    #[test]
    fn numeric_fillers_only_run_on_an_otherwise_empty_pool() {
        let g = groups(&["n"], &[], &[], 10);
        let pool = CandidateGenerator::new().generate(&g);
        assert_eq!(pool.len(), 7);
        assert!(pool.iter().all(|c| c.family != Family::Fallback));

        let g = groups(&[], &[("Id", 10)], &[], 10);
        let pool = CandidateGenerator::new().generate(&g);
        assert_eq!(ids(&pool), vec!["text_Id"]);

        let always = CandidateGenerator::with_config(GeneratorConfig {
            fillers: FillerPolicy::Always,
            ..Default::default()
        });
        let pool = always.generate(&groups(&["n"], &[], &[], 10));
        assert_eq!(ids(&pool[7..]), vec!["sq_n", "rule_n"]);
    }

    #[test]
    fn text_filler_follows_a_categorical_only_pool() {
        let g = groups(&[], &[("color", 3)], &[], 10);
        let pool = CandidateGenerator::new().generate(&g);
        assert_eq!(ids(&pool), vec!["bar_cat_color", "hbar_cat_color", "text_color"]);

        let g = groups(&["n"], &[("color", 3)], &[], 10);
        let fillers: Vec<_> = CandidateGenerator::new()
            .generate(&g)
            .into_iter()
            .filter(|c| c.family == Family::Fallback)
            .collect();
        assert_eq!(ids(&fillers), vec!["text_color"]);
    }

    #[test]
    fn category_at_exactly_the_near_unique_ratio_keeps_count_bars() {
        let g = groups(&["Budget"], &[("Code", 9)], &[], 10);
        let out = CandidateGenerator::new().generate_family(Family::SingleCategorical, &g);
        let out_ids = ids(&out);
        assert_eq!(out.len(), 7);
        assert!(out_ids.contains(&"bar_cat_Code"));
        assert!(out_ids.contains(&"hbar_cat_Code"));
    }

    #[test]
    fn empty_groups_produce_nothing() {
        assert!(generate(&ColumnGroups::new(0)).is_empty());
    }
}
