//! DRC configuration: design rules plus run settings
//!
//! A config file is JSON with two optional objects, `rules` and `settings`.
//! Missing fields take their defaults.
//!
//! ```json
//! { "rules": { "pad_pad": 254000 }, "settings": { "units": "mm", "parallel": false } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::board::{NM_PER_MIL, NM_PER_MM};
use crate::drc::DesignRules;
use crate::error::ConfigError;

/// Units used when formatting dimensions in DRC messages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Mil,
    Mm,
}

impl Units {
    fn scaled(&self, nm: i32) -> String {
        let (v, dp) = match self {
            Units::Mil => (nm as f64 / NM_PER_MIL as f64, 1),
            Units::Mm => (nm as f64 / NM_PER_MM as f64, 3),
        };
        let s = format!("{:.*}", dp, v);
        let s = if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            s
        };
        if s == "-0" {
            "0".to_string()
        } else {
            s
        }
    }

    /// A dimension with its unit, e.g. "7.5 mil"
    pub fn dimension(&self, nm: i32) -> String {
        let suffix = match self {
            Units::Mil => "mil",
            Units::Mm => "mm",
        };
        format!("{} {}", self.scaled(nm), suffix)
    }

    /// A bare coordinate, e.g. "1000"
    pub fn coordinate(&self, nm: i32) -> String {
        self.scaled(nm)
    }
}

fn default_true() -> bool {
    true
}

fn default_error_capacity() -> Option<usize> {
    Some(10_000)
}

/// Run-time switches for a DRC pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrcSettings {
    #[serde(default)]
    pub units: Units,
    #[serde(default = "default_true")]
    pub check_unrouted: bool,
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Maximum number of recorded errors; `None` for no limit
    #[serde(default = "default_error_capacity")]
    pub error_capacity: Option<usize>,
    /// Test board-edge clearance against flattened arc sides as well
    #[serde(default)]
    pub test_curved_board_edges: bool,
}

impl Default for DrcSettings {
    fn default() -> Self {
        Self {
            units: Units::default(),
            check_unrouted: default_true(),
            parallel: default_true(),
            error_capacity: default_error_capacity(),
            test_curved_board_edges: false,
        }
    }
}

impl DrcSettings {
    /// # Errors
    ///
    /// Returns an error if the error capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.error_capacity == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "error_capacity must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrcConfig {
    #[serde(default)]
    pub rules: DesignRules,
    #[serde(default)]
    pub settings: DrcSettings,
}

impl DrcConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule is negative or the error capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.settings.validate()
    }
}

/// Loads, parses and validates a DRC configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the JSON is malformed, or
/// validation fails.
pub fn load_config(path: &Path) -> Result<DrcConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: DrcConfig = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}
