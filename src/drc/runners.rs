//! DRC runner functions
//!
//! Runs the phases in a fixed order over a frozen board:
//! parts, part pairs, nets and parts, net pairs, copper areas, unrouted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::board::Board;
use crate::config::DrcSettings;

use super::board_edge::BoardEdges;
use super::cache::DrcCache;
use super::context::DrcContext;
use super::report::{DrcReport, Recorder};
use super::types::{DesignRules, DrcError};
use super::{net_parts, nets, parts, unrouted};

/// Shared flag for stopping a run between phases
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run a full DRC pass
pub fn run_drc(board: &Board, rules: &DesignRules, settings: &DrcSettings) -> DrcReport {
    run_drc_with_cancel(board, rules, settings, &CancelToken::new())
}

type Phase = fn(&DrcContext) -> Vec<DrcError>;

/// Run a full DRC pass, stopping early when `cancel` is set
pub fn run_drc_with_cancel(board: &Board, rules: &DesignRules, settings: &DrcSettings, cancel: &CancelToken) -> DrcReport {
    let start = Instant::now();

    let (cache, malformed) = DrcCache::build(board, rules, settings.parallel);
    let edges = BoardEdges::new(board, settings.test_curved_board_edges);
    let ctx = DrcContext { board, rules, settings, cache: &cache, edges: &edges };

    let mut sections: Vec<(&str, Vec<Phase>)> = vec![
        ("Checking parts:", vec![parts::check_parts as Phase, parts::check_part_pairs]),
        ("Checking nets and parts:", vec![net_parts::check_nets_and_parts as Phase]),
        ("Checking nets:", vec![nets::check_net_pairs as Phase, nets::check_area_pairs]),
    ];
    if settings.check_unrouted {
        sections.push(("Checking unrouted connections:", vec![unrouted::check_unrouted as Phase]));
    }

    let mut rec = Recorder::new(settings.error_capacity);
    let mut cancelled = false;
    for (header, phases) in sections {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        rec.header(header);
        let phase_start = Instant::now();
        for phase in phases {
            rec.record_all(phase(&ctx));
        }
        debug!(phase = header, errors = rec.len(), elapsed = ?phase_start.elapsed(), "DRC phase finished");
    }

    let mut report = rec.finish(cancelled);
    report.malformed = malformed;
    report.skipped_curved_sides = edges.skipped_curved_sides;
    report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    info!(
        parts = board.parts.len(),
        nets = board.nets.len(),
        errors = report.errors.len(),
        malformed = report.malformed.len(),
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed_ms,
        "DRC completed"
    );
    report
}
