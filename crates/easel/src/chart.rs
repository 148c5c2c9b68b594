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

//! Declarative chart candidates.
//!
//! The serialised shape follows Vega-Lite keys (`mark`/`encoding`/`transform`)
//! so a presentation layer can hand a candidate straight to a renderer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
/// Vega-Lite mark primitives a candidate can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Arc,
    Area,
    Bar,
    Boxplot,
    Circle,
    Line,
    Point,
    Rect,
    Rule,
    Square,
    Text,
    Tick,
}
impl MarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkType::Arc => "arc",
            MarkType::Area => "area",
            MarkType::Bar => "bar",
            MarkType::Boxplot => "boxplot",
            MarkType::Circle => "circle",
            MarkType::Line => "line",
            MarkType::Point => "point",
            MarkType::Rect => "rect",
            MarkType::Rule => "rule",
            MarkType::Square => "square",
            MarkType::Text => "text",
            MarkType::Tick => "tick",
        }
    }
}
impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
/// Modifier key that, unlike the cosmetic ones, counts toward a mark's identity.
pub const INTERPOLATE: &str = "interpolate";
/// A mark primitive plus optional modifiers (interpolation, radius, size).
///
/// Serialises as a bare string when there are no modifiers and as
/// `{"type": <mark>, ...modifiers}` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MarkRepr", into = "MarkRepr")]
pub struct MarkDescriptor {
    pub mark: MarkType,
    pub modifiers: BTreeMap<String, Value>,
}
impl MarkDescriptor {
    pub fn new(mark: MarkType) -> Self {
        Self {
            mark,
            modifiers: BTreeMap::new(),
        }
    }
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.modifiers.insert(key.to_string(), value.into());
        self
    }
    pub fn interpolated(self, style: &str) -> Self {
        self.with(INTERPOLATE, style)
    }
    pub fn interpolation(&self) -> Option<&str> {
        self.modifiers.get(INTERPOLATE).and_then(Value::as_str)
    }
    /// Identity of the mark for deduplication: the primitive and its
    /// interpolation. Cosmetic modifiers do not make a mark distinct.
    pub fn identity(&self) -> String {
        match self.interpolation() {
            Some(style) => format!("{}[{style}]", self.mark),
            None => self.mark.to_string(),
        }
    }
}
impl From<MarkType> for MarkDescriptor {
    fn from(mark: MarkType) -> Self {
        Self::new(mark)
    }
}
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MarkRepr {
    Bare(MarkType),
    Full {
        #[serde(rename = "type")]
        mark: MarkType,
        #[serde(flatten)]
        modifiers: BTreeMap<String, Value>,
    },
}
impl From<MarkRepr> for MarkDescriptor {
    fn from(repr: MarkRepr) -> Self {
        match repr {
            MarkRepr::Bare(mark) => Self::new(mark),
            MarkRepr::Full { mark, modifiers } => Self { mark, modifiers },
        }
    }
}
impl From<MarkDescriptor> for MarkRepr {
    fn from(desc: MarkDescriptor) -> Self {
        if desc.modifiers.is_empty() {
            MarkRepr::Bare(desc.mark)
        } else {
            MarkRepr::Full {
                mark: desc.mark,
                modifiers: desc.modifiers,
            }
        }
    }
}
/// Encoding channels, serialised as Vega-Lite channel names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    Y2,
    Theta,
    Color,
    Size,
    Row,
    Order,
    Text,
}
/// Measurement type of a channel's field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Quantitative,
    Nominal,
    Temporal,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Count,
    Sum,
    Mean,
    Max,
    Min,
}
impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Mean => "mean",
            Aggregate::Max => "max",
            Aggregate::Min => "min",
        }
    }
}
/// Axis ordering. Only descending by the y value is ever emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "-y")]
    ByYDescending,
}
/// Stack offset for area and bar layers (`center` draws a streamgraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    Zero,
    Normalize,
    Center,
}
fn is_false(value: &bool) -> bool {
    !*value
}
/// One channel binding. Built with [`ChannelDef::field`], [`ChannelDef::count`]
/// or [`ChannelDef::constant`] and refined with the chained setters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}
impl ChannelDef {
    pub fn field(name: &str) -> Self {
        Self {
            field: Some(name.to_string()),
            ..Default::default()
        }
    }
    /// Record count with no field, as Vega-Lite's `{"aggregate": "count"}`.
    pub fn count() -> Self {
        Self {
            aggregate: Some(Aggregate::Count),
            ..Default::default()
        }
    }
    /// Fixed visual value, e.g. a point size.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }
    pub fn quantitative(mut self) -> Self {
        self.kind = Some(ValueKind::Quantitative);
        self
    }
    pub fn nominal(mut self) -> Self {
        self.kind = Some(ValueKind::Nominal);
        self
    }
    pub fn temporal(mut self) -> Self {
        self.kind = Some(ValueKind::Temporal);
        self
    }
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }
    pub fn binned(mut self) -> Self {
        self.bin = true;
        self
    }
    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }
    pub fn stacked(mut self, mode: StackMode) -> Self {
        self.stack = Some(mode);
        self
    }
}
/// Channel bindings, serialised as a map in channel order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding(BTreeMap<Channel, ChannelDef>);
impl Encoding {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, channel: Channel, def: ChannelDef) -> Self {
        self.0.insert(channel, def);
        self
    }
    pub fn get(&self, channel: Channel) -> Option<&ChannelDef> {
        self.0.get(&channel)
    }
    pub fn field(&self, channel: Channel) -> Option<&str> {
        self.get(channel).and_then(|d| d.field.as_deref())
    }
    pub fn aggregate(&self, channel: Channel) -> Option<Aggregate> {
        self.get(channel).and_then(|d| d.aggregate)
    }
    /// Every column name bound by any channel.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.values().filter_map(|d| d.field.as_deref())
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowOp {
    pub op: Aggregate,
    #[serde(rename = "as")]
    pub alias: String,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
}
/// Data transforms a candidate needs before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transform {
    Density {
        density: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        groupby: Vec<String>,
    },
    Window {
        window: Vec<WindowOp>,
        sort: Vec<SortField>,
    },
}
impl Transform {
    pub fn density(field: &str) -> Self {
        Transform::Density {
            density: field.to_string(),
            groupby: Vec::new(),
        }
    }
    pub fn grouped_density(field: &str, group: &str) -> Self {
        Transform::Density {
            density: field.to_string(),
            groupby: vec![group.to_string()],
        }
    }
    /// Cumulative count ordered by `sort_field`, exposed as `count`.
    pub fn running_count(sort_field: &str) -> Self {
        Transform::Window {
            window: vec![WindowOp {
                op: Aggregate::Count,
                alias: "count".to_string(),
            }],
            sort: vec![SortField {
                field: sort_field.to_string(),
            }],
        }
    }
}
/// Generation rule that produced a candidate, in pool order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    SingleNumeric,
    SingleCategorical,
    PairwiseNumeric,
    NumericByCategorical,
    TimeSeries,
    MultivariateNumeric,
    MultivariateMixed,
    MultivariateTemporal,
    Fallback,
}
/// A complete chart specification proposed for the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub mark: MarkDescriptor,
    pub encoding: Encoding,
    #[serde(default)]
    pub transform: Option<Vec<Transform>>,
    pub family: Family,
}
impl ChartCandidate {
    pub fn new(
        family: Family,
        id: String,
        title: String,
        description: impl Into<String>,
        mark: impl Into<MarkDescriptor>,
        encoding: Encoding,
    ) -> Self {
        Self {
            id,
            title,
            description: description.into(),
            mark: mark.into(),
            encoding,
            transform: None,
            family,
        }
    }
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform.get_or_insert_with(Vec::new).push(transform);
        self
    }
    pub fn signature(&self) -> Signature {
        Signature::of(self)
    }
}
/// Coarse visual identity used only for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub mark: String,
    pub x_field: Option<String>,
    pub y_field: Option<String>,
    pub theta_field: Option<String>,
    pub x_aggregate: Option<Aggregate>,
    pub y_aggregate: Option<Aggregate>,
}
impl Signature {
    pub fn of(candidate: &ChartCandidate) -> Self {
        let enc = &candidate.encoding;
        Self {
            mark: candidate.mark.identity(),
            x_field: enc.field(Channel::X).map(str::to_string),
            y_field: enc.field(Channel::Y).map(str::to_string),
            theta_field: enc.field(Channel::Theta).map(str::to_string),
            x_aggregate: enc.aggregate(Channel::X),
            y_aggregate: enc.aggregate(Channel::Y),
        }
    }
}
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: &Option<String>| v.clone().unwrap_or_default();
        let agg = |a: &Option<Aggregate>| a.map(|a| a.as_str()).unwrap_or_default();
        write!(
            f,
            "{}_{}_{}_{}_{}_{}",
            self.mark,
            part(&self.x_field),
            part(&self.y_field),
            part(&self.theta_field),
            agg(&self.x_aggregate),
            agg(&self.y_aggregate)
        )
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn histogram() -> ChartCandidate {
        ChartCandidate::new(
            Family::SingleNumeric,
            "hist_price".into(),
            "Histogram: price".into(),
            "Frequency distribution.",
            MarkType::Bar,
            Encoding::new()
                .with(Channel::X, ChannelDef::field("price").binned())
                .with(Channel::Y, ChannelDef::count()),
        )
    }

    #[test]
    fn candidate_serialises_to_vega_lite_keys() {
        let value = serde_json::to_value(histogram()).unwrap();
        assert_eq!(value["type"], json!("bar"));
        assert_eq!(
            value["encoding"],
            json!({"x": {"field": "price", "bin": true}, "y": {"aggregate": "count"}})
        );
        assert_eq!(value["transform"], Value::Null);
        assert_eq!(value["family"], json!("single_numeric"));
    }

    #[test]
    fn mark_with_modifiers_serialises_as_object() {
        let mark = MarkDescriptor::new(MarkType::Line).interpolated("step-after");
        assert_eq!(
            serde_json::to_value(&mark).unwrap(),
            json!({"type": "line", "interpolate": "step-after"})
        );
        let back: MarkDescriptor =
            serde_json::from_value(json!({"type": "arc", "innerRadius": 50})).unwrap();
        assert_eq!(back.mark, MarkType::Arc);
        assert_eq!(back.modifiers["innerRadius"], json!(50));
        let bare: MarkDescriptor = serde_json::from_value(json!("tick")).unwrap();
        assert_eq!(bare, MarkDescriptor::new(MarkType::Tick));
    }

    #[test]
    fn signature_ignores_cosmetic_channels_but_not_interpolation() {
        let base = histogram();
        let mut colored = base.clone();
        colored.encoding = colored
            .encoding
            .with(Channel::Color, ChannelDef::field("region"));
        assert_eq!(base.signature(), colored.signature());

        let mut radius = base.clone();
        radius.mark = radius.mark.with("innerRadius", 50);
        assert_eq!(base.signature(), radius.signature());

        let mut stepped = base.clone();
        stepped.mark = stepped.mark.interpolated("step");
        assert_ne!(base.signature(), stepped.signature());
        assert_eq!(base.signature().to_string(), "bar_price___count");
    }

    #[test]
    fn transforms_serialise_in_declared_shape() {
        let cdf = histogram().with_transform(Transform::running_count("price"));
        let value = serde_json::to_value(&cdf).unwrap();
        assert_eq!(
            value["transform"],
            json!([{"window": [{"op": "count", "as": "count"}], "sort": [{"field": "price"}]}])
        );
        let density = serde_json::to_value(Transform::grouped_density("price", "region")).unwrap();
        assert_eq!(density, json!({"density": "price", "groupby": ["region"]}));
    }

    #[test]
    fn sorted_channel_orders_by_descending_y() {
        let def = ChannelDef::field("region").nominal().sorted(SortOrder::ByYDescending);
        assert_eq!(
            serde_json::to_value(def).unwrap(),
            json!({"field": "region", "type": "nominal", "sort": "-y"})
        );
        assert!(serde_json::from_value::<SortOrder>(json!("ascending")).is_err());
    }
}
