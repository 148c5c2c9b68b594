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

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use easel::samples::{self, DEFAULT_SALES_ROWS};
use easel::{detect_mark, ChartRecommender, RecommenderConfig};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SampleKind {
    Sales,
    Pie,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Classify a data file and print the recommended chart specs as JSON.
    Analyze {
        path: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
        /// Include up to N preview rows in the output.
        #[arg(long)]
        preview: Option<usize>,
        #[arg(long, default_value_t = false)]
        compact: bool,
    },

    Profile {
        path: PathBuf,
    },

    DetectImage {
        path: PathBuf,
    },

    /// Write a generated sample table to CSV.
    Sample {
        #[arg(value_enum)]
        kind: SampleKind,
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SALES_ROWS)]
        rows: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(name = "easel")]
#[command(about = "Suggest chart specifications for tabular data files.")]
struct Cli {
    /// YAML recommender configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

fn load_config(path: Option<&PathBuf>) -> Result<RecommenderConfig> {
    match path {
        Some(path) => RecommenderConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(RecommenderConfig::default()),
    }
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = if args.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("warn,easel=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(args.config.as_ref())?;

    match args.command {
        Commands::Analyze {
            path,
            limit,
            preview,
            compact,
        } => {
            if let Some(limit) = limit {
                config.max_recommendations = limit;
            }
            let recommender = ChartRecommender::with_config(config)?;
            let dataset = easel::ingest::load_path(&path, &recommender.config().loader)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut output = serde_json::to_value(recommender.analyze(&dataset))?;
            if let (Some(rows), Value::Object(map)) = (preview, &mut output) {
                map.insert("preview".into(), json!(dataset.preview_records(rows)));
            }
            print_json(&output, compact)?;
        }
        Commands::Profile { path } => {
            let recommender = ChartRecommender::with_config(config)?;
            let dataset = easel::ingest::load_path(&path, &recommender.config().loader)
                .with_context(|| format!("reading {}", path.display()))?;
            let classification = recommender.profile(&dataset);
            let (rows, cols) = dataset.shape();
            println!("{} ({rows} rows x {cols} columns)", path.display());
            let width = classification
                .columns
                .keys()
                .map(String::len)
                .max()
                .unwrap_or(0)
                .max("column".len());
            println!("{:<width$}  {:<12}  unique", "column", "type");
            for (name, profile) in &classification.columns {
                println!(
                    "{name:<width$}  {:<12}  {}",
                    profile.column_type.as_str(),
                    profile.unique_values
                );
            }
        }
        Commands::DetectImage { path } => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let mark = detect_mark(&bytes);
            info!(file = %path.display(), %mark, "image analysed");
            println!("{mark}");
        }
        Commands::Sample {
            kind,
            out,
            rows,
            seed,
        } => {
            let mut frame = match kind {
                SampleKind::Sales => samples::sales_frame(rows, seed)?,
                SampleKind::Pie => samples::pie_frame()?,
            };
            samples::write_csv(&mut frame, &out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {} rows to {}", frame.height(), out.display());
        }
    }
    Ok(())
}
