//! Connections that still contain rat-line segments

use crate::board::{pin_point, Board, Net, NetId};

use super::context::DrcContext;
use super::types::{DrcError, DrcErrorKind, Location};

fn net_pin_name(board: &Board, net: &Net, index: usize) -> String {
    match net.pins.get(index) {
        Some(np) => board.pin_name(np.part, np.pin),
        None => "?".to_string(),
    }
}

pub fn check_unrouted(ctx: &DrcContext) -> Vec<DrcError> {
    let board = ctx.board;
    let mut errors = Vec::new();
    for (net_id, net) in board.nets() {
        for (ic, conn) in net.connections.iter().enumerate() {
            if ctx.cache.connection(net_id, ic).is_none() || !conn.has_rat_line() {
                continue;
            }
            let start = net_pin_name(board, net, conn.start_pin);
            let message = match conn.end_pin {
                None => format!("\"{}\": partially routed stub trace from {}", net.name, start),
                Some(end) => {
                    let end = net_pin_name(board, net, end);
                    if conn.segments.len() > 1 {
                        format!("\"{}\": partially routed connection from {} to {}", net.name, start, end)
                    } else {
                        format!("\"{}\": unrouted connection from {} to {}", net.name, start, end)
                    }
                }
            };
            let pt = start_point(board, net_id, conn.start_pin)
                .or_else(|| conn.vertices.first().map(|v| v.point()))
                .unwrap_or_default();
            errors.push(DrcError::new(
                DrcErrorKind::Unrouted,
                message,
                &net.name,
                Location::Connection { net: net_id, connection: ic },
                pt,
            ));
        }
    }
    errors
}

fn start_point(board: &Board, net: NetId, start_pin: usize) -> Option<[i32; 2]> {
    let np = board.net(net)?.pins.get(start_pin)?;
    pin_point(board, np.part, np.pin)
}
