//! DRC handlers: RunDRC, RunDRCAsync, CancelDRC, GetDRCErrors, GetDRCLog

use std::sync::mpsc::Sender;
use std::thread;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DrcSettings;
use crate::drc::{run_drc_with_cancel, CancelToken, DrcErrorKind, DrcReport};
use crate::server::protocol::{error_codes, Notification, Response};
use crate::server::state::{DrcAsyncResult, ServerEvent, ServerState};

#[derive(Deserialize, Default)]
struct RunDrcParams {
    /// Settings for this run only
    #[serde(default)]
    settings: Option<DrcSettings>,
}

fn parse_run_params(params: Option<serde_json::Value>) -> Result<RunDrcParams, String> {
    match params {
        None | Some(serde_json::Value::Null) => Ok(RunDrcParams::default()),
        Some(p) => serde_json::from_value(p).map_err(|e| format!("Invalid params: {}", e)),
    }
}

/// Settings for a run: the per-run override if given, else the session's
fn run_settings(state: &ServerState, params: Option<serde_json::Value>) -> Result<DrcSettings, String> {
    let settings = parse_run_params(params)?
        .settings
        .unwrap_or_else(|| state.settings.clone());
    settings.validate().map_err(|e| e.to_string())?;
    Ok(settings)
}

/// Summary returned when a run finishes
pub fn report_summary(report: &DrcReport) -> serde_json::Value {
    serde_json::json!({
        "status": if report.cancelled { "cancelled" } else { "ok" },
        "error_count": report.errors.len(),
        "malformed_count": report.malformed.len(),
        "dropped_duplicates": report.dropped_duplicates,
        "dropped_overflow": report.dropped_overflow,
        "truncated": report.truncated,
        "skipped_curved_sides": report.skipped_curved_sides,
        "elapsed_ms": report.elapsed_ms,
    })
}

/// Handle RunDRC request - runs a full check and waits for it
pub fn handle_run_drc(state: &mut ServerState, id: Option<serde_json::Value>, params: Option<serde_json::Value>) -> Response {
    let settings = match run_settings(state, params) {
        Ok(s) => s,
        Err(message) => return Response::error(id, error_codes::INVALID_PARAMS, message),
    };
    let Some(board) = state.board.clone() else {
        return Response::error(id, error_codes::NO_BOARD_LOADED, "No board loaded. Call Load first.".to_string());
    };
    if state.is_drc_running() {
        return Response::error(id, error_codes::DRC_BUSY, "A background DRC run is in progress".to_string());
    }

    let report = run_drc_with_cancel(&board, &state.rules, &settings, &CancelToken::new());
    let summary = report_summary(&report);
    state.report = Some(report);
    Response::success(id, summary)
}

/// Handle RunDRCAsync request - starts a run on a background thread.
/// Completion arrives on `tx` and is turned into a `drcComplete` notification.
pub fn handle_run_drc_async(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    tx: Option<Sender<ServerEvent>>,
) -> Response {
    let settings = match run_settings(state, params) {
        Ok(s) => s,
        Err(message) => return Response::error(id, error_codes::INVALID_PARAMS, message),
    };
    let Some(board) = state.board.clone() else {
        return Response::error(id, error_codes::NO_BOARD_LOADED, "No board loaded. Call Load first.".to_string());
    };
    if state.is_drc_running() {
        return Response::error(id, error_codes::DRC_BUSY, "A background DRC run is in progress".to_string());
    }
    let Some(tx) = tx else {
        return Response::error(id, error_codes::INTERNAL_ERROR, "DRC channel not available".to_string());
    };

    let rules = state.rules.clone();
    let token = CancelToken::new();
    let generation = state.generation;
    state.running = Some(token.clone());

    info!(generation, parallel = settings.parallel, "Starting background DRC");

    thread::spawn(move || {
        let report = run_drc_with_cancel(&board, &rules, &settings, &token);
        let _ = tx.send(ServerEvent::DrcFinished(DrcAsyncResult { generation, report }));
    });

    Response::success(id, serde_json::json!({
        "status": "started",
        "message": "DRC running in background"
    }))
}

/// Store a finished background run. Returns the notification to send, or
/// `None` when the result belongs to a board that has since been replaced.
pub fn apply_async_result(state: &mut ServerState, result: DrcAsyncResult) -> Option<Notification> {
    if result.generation != state.generation {
        debug!(stale = result.generation, current = state.generation, "Dropping stale DRC result");
        return None;
    }
    state.running = None;
    let summary = report_summary(&result.report);
    state.report = Some(result.report);
    Some(Notification::new("drcComplete", summary))
}

/// Handle CancelDRC request - asks the background run to stop after its current phase
pub fn handle_cancel_drc(state: &mut ServerState, id: Option<serde_json::Value>) -> Response {
    let cancelled = match &state.running {
        Some(token) => {
            token.cancel();
            true
        }
        None => false,
    };
    Response::success(id, serde_json::json!({ "cancelled": cancelled }))
}

/// Handle GetDRCErrors request - returns errors of the last run, optionally
/// filtered by kind and paged
pub fn handle_get_drc_errors(state: &ServerState, id: Option<serde_json::Value>, params: Option<serde_json::Value>) -> Response {
    #[derive(Deserialize, Default)]
    struct GetErrorsParams {
        #[serde(default)]
        kind: Option<DrcErrorKind>,
        #[serde(default)]
        offset: usize,
        #[serde(default)]
        limit: Option<usize>,
    }

    let params: GetErrorsParams = match params {
        None | Some(serde_json::Value::Null) => GetErrorsParams::default(),
        Some(p) => match serde_json::from_value(p) {
            Ok(p) => p,
            Err(e) => return Response::error(id, error_codes::INVALID_PARAMS, format!("Invalid params: {}", e)),
        },
    };
    let Some(report) = &state.report else {
        return Response::error(id, error_codes::NO_DRC_RESULTS, "No DRC results. Call RunDRC first.".to_string());
    };

    let matching: Vec<_> = report
        .errors
        .iter()
        .filter(|e| params.kind.map_or(true, |k| e.kind == k))
        .collect();
    let total = matching.len();
    let page: Vec<_> = matching
        .into_iter()
        .skip(params.offset)
        .take(params.limit.unwrap_or(usize::MAX))
        .collect();

    Response::success(id, serde_json::json!({
        "total": total,
        "errors": page,
        "malformed": &report.malformed,
    }))
}

/// Handle GetDRCLog request - returns the text log of the last run
pub fn handle_get_drc_log(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    match &state.report {
        Some(report) => Response::success(id, serde_json::json!({ "log": &report.log })),
        None => Response::error(id, error_codes::NO_DRC_RESULTS, "No DRC results. Call RunDRC first.".to_string()),
    }
}
