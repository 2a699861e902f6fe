//! Design rule checking for printed circuit boards
//!
//! Takes a frozen board snapshot (footprints, placed parts, nets with routed
//! connections and copper areas, and the board outline) and reports every
//! place where copper, holes or the board edge come closer than the
//! configured rules allow.
//!
//! ```no_run
//! use pcb_drc::{load_board, run_drc, DesignRules, DrcSettings};
//!
//! let board = load_board(std::path::Path::new("board.json"))?;
//! let report = run_drc(&board, &DesignRules::default(), &DrcSettings::default());
//! for line in &report.log {
//!     println!("{}", line);
//! }
//! # Ok::<(), pcb_drc::LoadError>(())
//! ```

pub mod board;
pub mod config;
pub mod drc;
pub mod error;
pub mod geometry;
pub mod server;

pub use board::{load_board, Board, NetId, PartId};
pub use config::{load_config, DrcConfig, DrcSettings, Units};
pub use drc::{run_drc, run_drc_with_cancel, CancelToken, DesignRules, DrcError, DrcErrorKind, DrcReport, Location};
pub use error::{ConfigError, LoadError, ModelError};
