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

mod routes;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use easel::{ChartRecommender, RecommenderConfig, DEFAULT_PREVIEW_ROWS};
use routes::{build_router, AppState, DEFAULT_BODY_LIMIT, DEFAULT_ORIGINS};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
const DEFAULT_ADDR: &str = "0.0.0.0:8000";
fn cors_origins() -> Vec<HeaderValue> {
    match std::env::var("EASEL_CORS_ORIGINS") {
        Ok(list) => list
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect(),
        Err(_) => DEFAULT_ORIGINS
            .into_iter()
            .map(HeaderValue::from_static)
            .collect(),
    }
}
fn load_config() -> Result<RecommenderConfig> {
    match std::env::var("EASEL_CONFIG") {
        Ok(path) => RecommenderConfig::from_yaml_file(&path)
            .with_context(|| format!("loading recommender config from {path}")),
        Err(_) => Ok(RecommenderConfig::default()),
    }
}
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .with_target(false)
        .init();

    let recommender = ChartRecommender::with_config(load_config()?)?;
    let preview_rows = std::env::var("EASEL_PREVIEW_ROWS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PREVIEW_ROWS);
    let body_limit: usize = std::env::var("EASEL_BODY_LIMIT_BYTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_BODY_LIMIT);
    let app = build_router(
        AppState::new(recommender, preview_rows),
        cors_origins(),
        body_limit,
    );

    let addr: SocketAddr = std::env::var("EASEL_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.into())
        .parse()
        .context("invalid EASEL_ADDR")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(local = %listener.local_addr()?, "easel server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("easel server shutting down");
    Ok(())
}
