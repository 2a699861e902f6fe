//! Per-layer connection status of vias
//!
//! A feature is trace-connected on a layer when a copper segment of its net
//! on that layer ends at the feature's position, and area-connected when a
//! copper area of its net on that layer contains the position.

use serde::Serialize;

use super::types::{Board, Net, NetId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConnectStatus {
    pub trace: bool,
    pub area: bool,
}

impl ConnectStatus {
    pub const NONE: ConnectStatus = ConnectStatus { trace: false, area: false };

    pub fn is_connected(&self) -> bool {
        self.trace || self.area
    }

    /// Connected only through a copper area (a thermal relief)
    pub fn area_only(&self) -> bool {
        self.area && !self.trace
    }
}

/// Any segment of the net on `layer` ends at `pt`
pub fn trace_reaches(net: &Net, layer: usize, pt: [i32; 2]) -> bool {
    net.connections.iter().any(|c| {
        c.segments.iter().enumerate().any(|(is, seg)| {
            seg.copper_layer() == Some(layer)
                && c.segment_points(is).is_some_and(|(a, b)| a == pt || b == pt)
        })
    })
}

/// Any copper area of the net on `layer` contains `pt`
pub fn area_covers(net: &Net, layer: usize, pt: [i32; 2]) -> bool {
    net.areas
        .iter()
        .any(|a| a.layer == layer && a.polygon.contains_point(pt[0], pt[1]))
}

fn status_at(net: &Net, layer: usize, pt: [i32; 2]) -> ConnectStatus {
    ConnectStatus {
        trace: trace_reaches(net, layer, pt),
        area: area_covers(net, layer, pt),
    }
}

/// Connection status of the via at `vertex` of a connection
pub fn via_connection_status(board: &Board, net: NetId, connection: usize, vertex: usize, layer: usize) -> ConnectStatus {
    let Some(n) = board.net(net) else {
        return ConnectStatus::NONE;
    };
    let Some(v) = n.connections.get(connection).and_then(|c| c.vertices.get(vertex)) else {
        return ConnectStatus::NONE;
    };
    if v.via.is_none() {
        return ConnectStatus::NONE;
    }
    status_at(n, layer, v.point())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::{Area, Connection, Segment, Vertex};
    use crate::geometry::Polygon;

    fn board_with_via() -> (Board, NetId) {
        let mut board = Board::new(4);
        let net = board.add_net("SIG");
        board.nets[0].connections.push(Connection {
            start_pin: 0,
            end_pin: None,
            vertices: vec![Vertex::new(0, 0), Vertex::with_via(1000, 0, 600, 300), Vertex::new(2000, 0)],
            segments: vec![Segment::copper(0, 100), Segment::copper(2, 100)],
        });
        (board, net)
    }

    #[test]
    fn test_via_trace_connection_per_layer() {
        let (board, net) = board_with_via();
        assert!(via_connection_status(&board, net, 0, 1, 0).trace);
        assert!(via_connection_status(&board, net, 0, 1, 2).trace);
        assert!(!via_connection_status(&board, net, 0, 1, 3).is_connected());
    }

    #[test]
    fn test_via_area_connection() {
        let (mut board, net) = board_with_via();
        board.nets[0].areas.push(Area { layer: 3, polygon: Polygon::rect(500, -500, 1500, 500) });
        let status = via_connection_status(&board, net, 0, 1, 3);
        assert!(status.area_only(), "expected area-only connection, got {:?}", status);
    }

    #[test]
    fn test_vertex_without_via_is_unconnected() {
        let (board, net) = board_with_via();
        assert_eq!(via_connection_status(&board, net, 0, 0, 0), ConnectStatus::NONE);
        assert_eq!(via_connection_status(&board, net, 5, 0, 0), ConnectStatus::NONE);
    }
}
