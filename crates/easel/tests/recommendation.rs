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

use easel::chart::Channel;
use easel::samples::{pie_frame, sales_frame};
use easel::{
    analyze_dataset, ChartCandidate, ChartRecommender, Column, ColumnType, Dataset, Family,
};
use std::collections::HashSet;
use std::io::Write;

fn ids(candidates: &[ChartCandidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.id.as_str()).collect()
}

fn ids_of<'a>(candidates: &[&'a ChartCandidate]) -> Vec<&'a str> {
    candidates.iter().map(|c| c.id.as_str()).collect()
}

fn count_family(pool: &[ChartCandidate], family: Family) -> usize {
    pool.iter().filter(|c| c.family == family).count()
}

#[test]
fn zero_columns_yield_no_recommendations() {
    let result = analyze_dataset(&Dataset::new(Vec::new()));
    assert!(result.recommendations.is_empty());
    assert!(result.columns.is_empty());
    assert_eq!(result.shape, (0, 0));

    let result = analyze_dataset(&Dataset::empty(5));
    assert!(result.recommendations.is_empty());
    assert_eq!(result.shape, (5, 0));
}

#[test]
fn single_numeric_column_yields_its_seven_distributions() {
    let ds = Dataset::new(vec![Column::new("price", [3.0, 1.5, 9.0, 4.0])]);
    let result = analyze_dataset(&ds);
    assert_eq!(
        ids(&result.recommendations),
        vec![
            "hist_price",
            "dens_area_price",
            "dens_line_price",
            "box_price",
            "strip_price",
            "cdf_price",
            "dot_price",
        ]
    );
    let signatures: HashSet<_> = result
        .recommendations
        .iter()
        .map(ChartCandidate::signature)
        .collect();
    assert_eq!(signatures.len(), 7);
}

#[test]
fn identifier_like_category_suppresses_count_bars() {
    let ids_col: Vec<String> = (0..100).map(|i| format!("user-{i}")).collect();
    let values: Vec<f64> = (0..100).map(|i| f64::from(i % 7)).collect();
    let ds = Dataset::new(vec![
        Column::new("user", ids_col),
        Column::new("spend", values),
    ]);
    let pool = ChartRecommender::new().candidate_pool(&ds);
    let pool_ids = ids(&pool);
    assert!(!pool_ids.contains(&"bar_cat_user"));
    assert!(!pool_ids.contains(&"hbar_cat_user"));
    for expected in [
        "bar_sum_user_spend",
        "bar_sort_sum_user_spend",
        "pie_user",
        "donut_user",
        "lollipop_user",
    ] {
        assert!(pool_ids.contains(&expected), "missing {expected}");
    }
}

#[test]
fn department_budget_scenario() {
    let frame = pie_frame().unwrap();
    let recommender = ChartRecommender::new();
    let ds = easel::ingest::dataset_from_dataframe(&frame);
    let profile = recommender.profile(&ds);
    assert_eq!(profile.columns["Department"].column_type, ColumnType::Categorical);
    assert_eq!(profile.columns["Department"].unique_values, 6);
    assert_eq!(profile.columns["Budget_Allocation"].column_type, ColumnType::Numeric);

    let pool = recommender.candidate_pool(&ds);
    let single_categorical: Vec<_> = pool
        .iter()
        .filter(|c| c.family == Family::SingleCategorical)
        .cloned()
        .collect();
    assert_eq!(
        ids(&single_categorical),
        vec![
            "bar_sum_Department_Budget_Allocation",
            "bar_sort_sum_Department_Budget_Allocation",
            "pie_Department",
            "donut_Department",
            "lollipop_Department",
        ]
    );

    let result = recommender.analyze_dataframe(&frame);
    let result_ids = ids(&result.recommendations);
    assert!(result_ids.contains(&"bar_sum_Department_Budget_Allocation"));
    assert!(result_ids.contains(&"pie_Department"));
    assert!(result_ids.iter().all(|id| !id.starts_with("bar_cat") && !id.starts_with("hbar_cat")));
}

#[test]
fn five_numeric_one_categorical_scenario() {
    let rows = 20;
    let mut columns: Vec<Column> = (0..5)
        .map(|n| {
            Column::new(
                format!("m{n}"),
                (0..rows).map(|r| f64::from(r * (n + 1)) + 0.5),
            )
        })
        .collect();
    columns.push(Column::new(
        "segment",
        (0..rows).map(|r| ["a", "b", "c"][r as usize % 3]),
    ));
    let ds = Dataset::new(columns);
    let pool = ChartRecommender::new().candidate_pool(&ds);
    assert_eq!(count_family(&pool, Family::SingleNumeric), 35);
    assert_eq!(count_family(&pool, Family::PairwiseNumeric), 60);
    assert_eq!(count_family(&pool, Family::NumericByCategorical), 35);
    assert_eq!(count_family(&pool, Family::MultivariateNumeric), 2);
    assert_eq!(count_family(&pool, Family::MultivariateMixed), 4);
    let fillers: Vec<_> = pool.iter().filter(|c| c.family == Family::Fallback).collect();
    assert_eq!(ids_of(&fillers), vec!["text_segment"]);

    let result = analyze_dataset(&ds);
    assert_eq!(result.recommendations.len(), 12);
    let signatures: HashSet<_> = result
        .recommendations
        .iter()
        .map(ChartCandidate::signature)
        .collect();
    assert_eq!(signatures.len(), 12);
}

#[test]
fn sales_sample_gets_time_series_candidates() {
    let frame = sales_frame(120, 42).unwrap();
    let recommender = ChartRecommender::new();
    let ds = easel::ingest::dataset_from_dataframe(&frame);
    let profile = recommender.profile(&ds);
    assert_eq!(profile.columns["Date"].column_type, ColumnType::Datetime);
    assert_eq!(profile.columns["Region"].column_type, ColumnType::Categorical);

    let pool = recommender.candidate_pool(&ds);
    let series: Vec<_> = pool
        .iter()
        .filter(|c| c.family == Family::TimeSeries)
        .collect();
    assert_eq!(series.len(), 10);
    assert!(series
        .iter()
        .all(|c| c.encoding.field(Channel::X) == Some("Date")));
    assert_eq!(count_family(&pool, Family::MultivariateTemporal), 3);
}

#[test]
fn unknown_columns_take_part_in_no_family() {
    let ds = Dataset::new(vec![
        Column::new("empty", [None::<f64>, None, None]),
        Column::new("score", [1.0, 2.0, 3.0]),
    ]);
    let result = analyze_dataset(&ds);
    assert_eq!(result.columns["empty"].column_type, ColumnType::Unknown);
    assert!(result
        .recommendations
        .iter()
        .all(|c| c.encoding.fields().all(|f| f != "empty")));
}

#[test]
fn repeated_analysis_is_byte_identical() {
    let frame = sales_frame(80, 3).unwrap();
    let recommender = ChartRecommender::new();
    let first = serde_json::to_string(&recommender.analyze_dataframe(&frame)).unwrap();
    let second = serde_json::to_string(&recommender.analyze_dataframe(&frame)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn csv_file_on_disk_is_analysed() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Department,Budget_Allocation").unwrap();
    for (dept, budget) in [("Sales", 10), ("Ops", 20), ("Legal", 5)] {
        writeln!(file, "{dept},{budget}").unwrap();
    }
    file.flush().unwrap();
    let result = ChartRecommender::new().analyze_path(file.path()).unwrap();
    assert_eq!(result.shape, (3, 2));
    assert!(!result.recommendations.is_empty());
}

#[test]
fn workbook_on_disk_is_analysed() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Department").unwrap();
    sheet.write_string(0, 1, "Budget_Allocation").unwrap();
    for (i, (dept, budget)) in [("Sales", 10.0), ("Ops", 20.0), ("Legal", 5.0), ("Ops", 7.5)]
        .into_iter()
        .enumerate()
    {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, dept).unwrap();
        sheet.write_number(row, 1, budget).unwrap();
    }
    let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    file.write_all(&workbook.save_to_buffer().unwrap()).unwrap();
    file.flush().unwrap();

    let result = ChartRecommender::new().analyze_path(file.path()).unwrap();
    assert_eq!(result.shape, (4, 2));
    assert_eq!(result.columns["Department"].column_type, ColumnType::Categorical);
    assert_eq!(result.columns["Department"].unique_values, 3);
    assert_eq!(result.columns["Budget_Allocation"].column_type, ColumnType::Numeric);
    assert!(ids(&result.recommendations).contains(&"bar_sum_Department_Budget_Allocation"));
}

#[test]
fn unknown_extension_is_an_unsupported_format() {
    let err = ChartRecommender::new()
        .analyze_path("/tmp/does-not-matter.foo")
        .unwrap_err();
    assert!(err.is_unsupported_format());
    assert_eq!(err.user_message(), "Unsupported file format");
}
