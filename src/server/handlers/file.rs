//! File operations: Load

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::board::load_board;
use crate::config::load_config;
use crate::server::protocol::{error_codes, Response};
use crate::server::state::ServerState;

#[derive(Deserialize)]
struct LoadParams {
    file_path: PathBuf,
    #[serde(default)]
    config_path: Option<PathBuf>,
}

/// Handle Load request - reads a board snapshot and, optionally, a DRC config
pub fn handle_load(state: &mut ServerState, id: Option<serde_json::Value>, params: Option<serde_json::Value>) -> Response {
    let params: LoadParams = match params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                "Invalid params: expected {file_path: string, config_path?: string}".to_string(),
            );
        }
    };
    Response::from_result(id, load(state, params), error_codes::LOAD_FAILED)
}

fn load(state: &mut ServerState, params: LoadParams) -> anyhow::Result<serde_json::Value> {
    let start = Instant::now();
    let board = load_board(&params.file_path).context("Load failed")?;
    let config = match &params.config_path {
        Some(path) => Some(load_config(path).context("Load failed")?),
        None => None,
    };

    let summary = serde_json::json!({
        "status": "ok",
        "parts": board.parts.len(),
        "nets": board.nets.len(),
        "footprints": board.footprints.len(),
        "copper_layers": board.copper_layers,
    });

    info!(
        path = %params.file_path.display(),
        parts = board.parts.len(),
        nets = board.nets.len(),
        elapsed = ?start.elapsed(),
        "Board loaded"
    );

    if let Some(config) = config {
        state.rules = config.rules;
        state.settings = config.settings;
    }
    state.set_board(params.file_path, board);
    Ok(summary)
}
