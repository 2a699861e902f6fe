//! Design Rule Check (DRC) engine
//!
//! Builds a per-entity geometry cache, then runs each checker over the
//! frozen board. Checkers run in parallel with Rayon and their results are
//! collected in input order, so numbering matches a serial run. R-tree
//! indexing prunes candidate pairs.
//!
//! # Submodules
//! - `types` - Rules, violation kinds, locations and the violation record
//! - `cache` - Per-part, per-pin and per-connection geometry cache
//! - `via` - Per-layer via pad size
//! - `board_edge` - Feature to board-outline clearances
//! - `parts` - Per-pin checks and part-to-part clearances
//! - `net_parts` - Trace width, via ring and connection-to-pin clearances
//! - `nets` - Net-to-net trace, via and copper-area clearances
//! - `unrouted` - Connections with rat lines
//! - `sink` - Numbered, deduplicated, bounded error list
//! - `report` - Run result and text log
//! - `runners` - Entry points

mod board_edge;
mod cache;
mod context;
mod net_parts;
mod nets;
mod parts;
mod report;
mod runners;
mod sink;
#[cfg(test)]
mod test_support;
mod types;
mod unrouted;
mod via;

use rayon::prelude::*;

pub use board_edge::BoardEdges;
pub use cache::{ConnectionCache, DrcCache, PartCache, PinCache, ViaCache};
pub use report::DrcReport;
pub use runners::{run_drc, run_drc_with_cancel, CancelToken};
pub use sink::{DrErrorList, SinkResult};
pub use types::{DesignRules, DrcError, DrcErrorKind, Location};
pub use via::via_pad_width;

/// Map `0..count` through `f`, in parallel when asked, keeping input order
pub(crate) fn ordered_map<T, F>(parallel: bool, count: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..count).into_par_iter().map(f).collect()
    } else {
        (0..count).map(f).collect()
    }
}
