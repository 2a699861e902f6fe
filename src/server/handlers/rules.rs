//! Rule handlers: GetDesignRules, SetDesignRules

use serde::Deserialize;
use tracing::info;

use crate::config::{DrcConfig, DrcSettings};
use crate::drc::DesignRules;
use crate::server::protocol::{error_codes, Response};
use crate::server::state::ServerState;

/// Handle GetDesignRules request - returns the active rules and settings
pub fn handle_get_design_rules(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    let config = DrcConfig { rules: state.rules.clone(), settings: state.settings.clone() };
    match serde_json::to_value(&config) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Handle SetDesignRules request - replaces rules and/or settings.
/// Fields left out keep their current values.
pub fn handle_set_design_rules(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct SetRulesParams {
        #[serde(default)]
        rules: Option<DesignRules>,
        #[serde(default)]
        settings: Option<DrcSettings>,
    }

    let params: SetRulesParams = match params.map(serde_json::from_value) {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            return Response::error(id, error_codes::INVALID_PARAMS, format!("Invalid params: {}", e));
        }
        None => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                "Invalid params: expected {rules?: object, settings?: object}".to_string(),
            );
        }
    };

    let config = DrcConfig {
        rules: params.rules.unwrap_or_else(|| state.rules.clone()),
        settings: params.settings.unwrap_or_else(|| state.settings.clone()),
    };
    if let Err(e) = config.validate() {
        return Response::error(id, error_codes::INVALID_PARAMS, e.to_string());
    }

    info!(rules = ?config.rules, "Design rules updated");
    state.rules = config.rules;
    state.settings = config.settings;
    Response::success(id, serde_json::json!({ "status": "ok" }))
}
