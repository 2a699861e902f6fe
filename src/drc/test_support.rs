//! Board builders shared by the checker tests

use crate::board::{Board, Footprint, FootprintPin, NetId, PadDef, Padstack, PartId, Side};
use crate::config::DrcSettings;

use super::board_edge::BoardEdges;
use super::cache::DrcCache;
use super::context::DrcContext;
use super::types::{DesignRules, DrcError};

/// Single-pin footprint named `name`
pub fn single_pin(name: &str, padstack: Padstack) -> Footprint {
    Footprint {
        name: name.to_string(),
        pins: vec![FootprintPin { name: "1".to_string(), x: 0, y: 0, angle: 0, padstack }],
    }
}

pub fn smt_round(name: &str, diameter: i32) -> Footprint {
    single_pin(name, Padstack::smt(PadDef::round(diameter)))
}

pub fn th_round(name: &str, diameter: i32, hole: i32) -> Footprint {
    single_pin(name, Padstack::through_hole(PadDef::round(diameter), hole))
}

/// Place a one-pin part and put its pin on `net`
pub fn place_on_net(board: &mut Board, ref_des: &str, footprint: &str, x: i32, y: i32, net: NetId) -> PartId {
    let id = board.place(ref_des, footprint, x, y, 0, Side::Top);
    board.connect_pin(net, id, 0);
    id
}

/// Run one checker serially over a freshly built cache
pub fn run_phase(board: &Board, rules: &DesignRules, phase: fn(&DrcContext) -> Vec<DrcError>) -> Vec<DrcError> {
    let settings = DrcSettings { parallel: false, ..Default::default() };
    let (cache, malformed) = DrcCache::build(board, rules, false);
    assert!(malformed.is_empty(), "test board is malformed: {:?}", malformed);
    let edges = BoardEdges::new(board, false);
    let ctx = DrcContext { board, rules, settings: &settings, cache: &cache, edges: &edges };
    phase(&ctx)
}
