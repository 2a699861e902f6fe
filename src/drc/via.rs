//! Per-layer via pad size
//!
//! Outer layers always carry the nominal pad. On inner layers a via with no
//! connection has no pad at all, and a via joined only by a copper area gets
//! a thermal-sized pad of `hole + 2 * annular_ring_vias`.

use crate::board::{via_connection_status, Board, NetId, BOTTOM_LAYER};

use super::types::DesignRules;

/// Via pad diameter on `layer`, 0 when the via has no pad there
pub fn via_pad_width(board: &Board, rules: &DesignRules, net: NetId, connection: usize, vertex: usize, layer: usize) -> i32 {
    let Some(via) = board
        .net(net)
        .and_then(|n| n.connections.get(connection))
        .and_then(|c| c.vertices.get(vertex))
        .and_then(|v| v.via)
    else {
        return 0;
    };
    if layer >= board.copper_layers {
        return 0;
    }
    if layer <= BOTTOM_LAYER {
        return via.pad_w;
    }

    let status = via_connection_status(board, net, connection, vertex, layer);
    if !status.is_connected() {
        0
    } else if status.area_only() {
        via.hole_w + 2 * rules.annular_ring_vias
    } else {
        via.pad_w
    }
}
