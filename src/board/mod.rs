//! Board model and the placement contracts the DRC engine relies on
//!
//! Submodules:
//! - `types`: Parts, footprints, nets, connections, areas and the board snapshot
//! - `footprint`: Pad placement (`pad_draw_info`) and quadrant rotation
//! - `connectivity`: Trace and area connection status of vias and pins
//! - `snapshot`: Loading a board from JSON

pub mod connectivity;
pub mod footprint;
pub mod snapshot;
pub mod types;

pub use connectivity::{via_connection_status, ConnectStatus};
pub use footprint::{pad_draw_info, pin_point, rotate_quadrant, PadInfo};
pub use snapshot::load_board;
pub use types::*;
