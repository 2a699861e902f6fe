//! Handler module declarations and re-exports

pub mod drc;
pub mod file;
pub mod rules;

pub use drc::*;
pub use file::*;
pub use rules::*;

use std::sync::mpsc::Sender;

use super::protocol::{error_codes, Request, Response};
use super::state::{ServerEvent, ServerState};

/// Route one request to its handler
pub fn dispatch(state: &mut ServerState, request: Request, tx: Option<Sender<ServerEvent>>) -> Response {
    let Request { id, method, params } = request;
    match method.as_str() {
        "Load" => handle_load(state, id, params),
        "GetDesignRules" => handle_get_design_rules(state, id),
        "SetDesignRules" => handle_set_design_rules(state, id, params),
        "RunDRC" => handle_run_drc(state, id, params),
        "RunDRCAsync" => handle_run_drc_async(state, id, params, tx),
        "CancelDRC" => handle_cancel_drc(state, id),
        "GetDRCErrors" => handle_get_drc_errors(state, id, params),
        "GetDRCLog" => handle_get_drc_log(state, id),
        _ => Response::error(id, error_codes::METHOD_NOT_FOUND, format!("Method not found: {}", method)),
    }
}
