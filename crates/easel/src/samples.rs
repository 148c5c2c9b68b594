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

//! Demo datasets for trying the recommender end to end.

use crate::error::{DataError, DataResult};
use chrono::{Duration, NaiveDate};
use polars::prelude::{df, CsvWriter, DataFrame, SerWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::path::Path;
use tracing::info;
pub const DEFAULT_SALES_ROWS: usize = 300;
const CATEGORIES: [(&str, [&str; 4], (f64, f64)); 5] = [
    ("Electronics", ["Smartphone", "Laptop", "Headphones", "Monitor"], (200.0, 2000.0)),
    ("Clothing", ["T-Shirt", "Jeans", "Jacket", "Sneakers"], (20.0, 200.0)),
    ("Home & Garden", ["Plant", "Chair", "Lamp", "Table"], (50.0, 500.0)),
    ("Books", ["Novel", "Textbook", "Comic", "Biography"], (10.0, 50.0)),
    ("Toys", ["Lego", "Doll", "Action Figure", "Puzzle"], (15.0, 100.0)),
];
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
/// Retail transactions over 2024. Sales scale with category price bands and
/// the first row's `Sales_Amount` is an outlier at three times the maximum.
pub fn sales_frame(rows: usize, seed: u64) -> DataResult<DataFrame> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .ok_or_else(|| DataError::Sample("invalid start date".to_string()))?;
    let mut dates = Vec::with_capacity(rows);
    let mut categories = Vec::with_capacity(rows);
    let mut products = Vec::with_capacity(rows);
    let mut regions = Vec::with_capacity(rows);
    let mut units_sold = Vec::with_capacity(rows);
    let mut sales = Vec::with_capacity(rows);
    let mut profits = Vec::with_capacity(rows);
    let mut ratings = Vec::with_capacity(rows);
    for _ in 0..rows {
        let (category, items, (low, high)) = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
        let date = start + Duration::days(rng.gen_range(0..=365));
        let units: i64 = rng.gen_range(1..=10);
        let total = cents(rng.gen_range(low..high) * units as f64);
        let margin = rng.gen_range(0.1..0.4);
        dates.push(date.format("%Y-%m-%d").to_string());
        categories.push(category);
        products.push(items[rng.gen_range(0..items.len())]);
        regions.push(REGIONS[rng.gen_range(0..REGIONS.len())]);
        units_sold.push(units);
        sales.push(total);
        profits.push(cents(total * margin));
        ratings.push(rng.gen_range(1..=5i64));
    }
    if let Some(max) = sales.iter().copied().reduce(f64::max) {
        sales[0] = max * 3.0;
    }
    df!(
        "Date" => dates,
        "Category" => categories,
        "Product" => products,
        "Region" => regions,
        "Units_Sold" => units_sold,
        "Sales_Amount" => sales,
        "Profit" => profits,
        "Rating" => ratings
    )
    .map_err(|err| DataError::Sample(err.to_string()))
}
/// Six departments with a clear part-to-whole budget split.
pub fn pie_frame() -> DataResult<DataFrame> {
    df!(
        "Department" => ["Electronics", "Clothing", "Home & Garden", "Beauty", "Sports", "Toys"],
        "Budget_Allocation" => [45000i64, 32000, 28000, 15000, 12000, 8000]
    )
    .map_err(|err| DataError::Sample(err.to_string()))
}
pub fn write_csv<P: AsRef<Path>>(frame: &mut DataFrame, path: P) -> DataResult<()> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .map_err(|source| DataError::DataFileError {
            path: path.display().to_string(),
            source,
        })?;
    info!(path = %path.display(), shape = ?frame.shape(), "sample written");
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::ingest::load_path;

    #[test]
    fn sales_frame_is_reproducible_with_outlier_first() {
        let a = sales_frame(50, 7).unwrap();
        let b = sales_frame(50, 7).unwrap();
        assert!(a.equals(&b));
        assert_eq!(a.shape(), (50, 8));
        let sales: Vec<f64> = a
            .column("Sales_Amount")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert!(sales[1..].iter().all(|v| v * 3.0 <= sales[0]));
    }

    #[test]
    fn pie_frame_has_six_departments() {
        let frame = pie_frame().unwrap();
        assert_eq!(frame.shape(), (6, 2));
    }

    #[test]
    fn written_csv_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let mut frame = sales_frame(20, 1).unwrap();
        write_csv(&mut frame, &path).unwrap();
        let ds = load_path(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(ds.shape(), (20, 8));
    }
}
