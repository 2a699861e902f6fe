//! Board-edge clearance checks
//!
//! Every conductive feature is measured against every side of every outline
//! polygon. Arc sides are skipped unless `test_curved_board_edges` is set,
//! in which case they are flattened.

use tracing::warn;

use crate::board::{mil, Board, NetId, PartId};
use crate::geometry::distance::{to_vec2, Vec2};
use crate::geometry::pad::{polyline_clearance, polyline_pad_clearance};
use crate::geometry::{PadGeom, Polygon};

use super::cache::{PinCache, ViaCache};
use super::context::DrcContext;
use super::types::{DrcError, DrcErrorKind, Location};

/// Outline sides prepared for clearance tests
#[derive(Clone, Debug, Default)]
pub struct BoardEdges {
    sides: Vec<Vec<Vec2>>,
    pub skipped_curved_sides: usize,
}

impl BoardEdges {
    pub fn new(board: &Board, test_curved: bool) -> Self {
        Self::from_outline(&board.outline, test_curved)
    }

    pub fn from_outline(outline: &[Polygon], test_curved: bool) -> Self {
        let mut edges = BoardEdges::default();
        for poly in outline {
            for side in poly.sides() {
                if side.style.is_arc() && !test_curved {
                    edges.skipped_curved_sides += 1;
                    continue;
                }
                edges.sides.push(side.flatten());
            }
        }
        if edges.skipped_curved_sides > 0 {
            warn!(
                skipped = edges.skipped_curved_sides,
                "Board outline has curved sides; they are not tested for edge clearance"
            );
        }
        edges
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    /// Clearance from a pad to each side closer than `limit`
    pub fn pad_violations(&self, pad: &PadGeom, limit: i32) -> Vec<i32> {
        self.sides
            .iter()
            .map(|side| polyline_pad_clearance(side, 0, pad))
            .filter(|d| *d < limit)
            .collect()
    }

    /// Clearance and closest point from a polyline of width `width` to each
    /// side closer than `limit`
    pub fn polyline_violations(&self, pts: &[Vec2], width: i32, limit: i32) -> Vec<(i32, [i32; 2])> {
        self.sides
            .iter()
            .map(|side| polyline_clearance(pts, width, side, 0))
            .filter(|(d, _)| *d < limit)
            .collect()
    }
}

/// Size of the region shown around a pad violation
pub(crate) fn pad_extent(geom: &PadGeom) -> i32 {
    geom.w.max(geom.l).saturating_add(mil(20))
}

/// Plated or unplated hole of a pin against the board edge
pub fn pin_hole_errors(ctx: &DrcContext, part: PartId, ip: usize, pin: &PinCache) -> Vec<DrcError> {
    if !pin.has_hole() {
        return Vec::new();
    }
    let name = ctx.board.pin_name(part, ip);
    let ref_des = ctx.board.part(part).map_or("", |p| p.ref_des.as_str());
    let hole = PadGeom::round(pin.center[0], pin.center[1], pin.hole_size);
    ctx.edges
        .pad_violations(&hole, ctx.rules.board_edge_copper)
        .into_iter()
        .map(|d| {
            DrcError::new(
                DrcErrorKind::BoardEdgePadhole,
                format!("{} pad hole to board edge = {}, {}", name, ctx.dim(d), ctx.at(pin.center)),
                ref_des,
                Location::Pad { part, pin: ip },
                pin.center,
            )
            .with_distance(d)
            .with_extent(pin.hole_size.saturating_add(mil(20)))
        })
        .collect()
}

/// Copper pads of a pin against the board edge. Layers with an identical
/// pad are tested once.
pub fn pin_pad_errors(ctx: &DrcContext, part: PartId, ip: usize, pin: &PinCache) -> Vec<DrcError> {
    let name = ctx.board.pin_name(part, ip);
    let ref_des = ctx.board.part(part).map_or("", |p| p.ref_des.as_str());
    let mut tested: Vec<PadGeom> = Vec::new();
    let mut errors = Vec::new();
    for il in 0..pin.pads.len() {
        let Some(pad) = pin.copper(il) else { continue };
        if tested.contains(&pad.geom) {
            continue;
        }
        tested.push(pad.geom);
        for d in ctx.edges.pad_violations(&pad.geom, ctx.rules.board_edge_copper) {
            errors.push(
                DrcError::new(
                    DrcErrorKind::BoardEdgePad,
                    format!("{} pad to board edge = {}, {}", name, ctx.dim(d), ctx.at(pad.center())),
                    ref_des,
                    Location::Pad { part, pin: ip },
                    pad.center(),
                )
                .on_layer(il)
                .with_distance(d)
                .with_extent(pad_extent(&pad.geom)),
            );
        }
    }
    errors
}

/// Copper trace segment against the board edge
pub fn trace_errors(ctx: &DrcContext, net: NetId, ic: usize, is: usize) -> Vec<DrcError> {
    let Some(conn) = ctx.board.net(net).and_then(|n| n.connections.get(ic)) else {
        return Vec::new();
    };
    let (Some(seg), Some((a, b))) = (conn.segments.get(is), conn.segment_points(is)) else {
        return Vec::new();
    };
    let Some(layer) = seg.copper_layer() else {
        return Vec::new();
    };
    if seg.width <= 0 {
        return Vec::new();
    }
    let name = ctx.board.net_name(net);
    ctx.edges
        .polyline_violations(&[to_vec2(a), to_vec2(b)], seg.width, ctx.rules.board_edge_copper)
        .into_iter()
        .map(|(d, p)| {
            DrcError::new(
                DrcErrorKind::BoardEdgeTrace,
                format!("\"{}\" trace to board edge = {}, {}", name, ctx.dim(d), ctx.at(p)),
                name,
                Location::Segment { net, connection: ic, segment: is },
                p,
            )
            .on_layer(layer)
            .with_distance(d)
        })
        .collect()
}

/// Via pad and via hole against the board edge
pub fn via_errors(ctx: &DrcContext, net: NetId, ic: usize, iv: usize, pt: [i32; 2], via: &ViaCache) -> Vec<DrcError> {
    let name = ctx.board.net_name(net);
    let loc = Location::Via { net, connection: ic, vertex: iv };
    let extent = via.max_w.saturating_add(mil(20));
    let mut errors = Vec::new();

    let pad = PadGeom::round(pt[0], pt[1], via.max_w);
    for d in ctx.edges.pad_violations(&pad, ctx.rules.board_edge_copper) {
        errors.push(
            DrcError::new(
                DrcErrorKind::BoardEdgeVia,
                format!("\"{}\" via to board edge = {}, {}", name, ctx.dim(d), ctx.at(pt)),
                name,
                loc,
                pt,
            )
            .with_distance(d)
            .with_extent(extent),
        );
    }

    let hole = PadGeom::round(pt[0], pt[1], via.hole_w);
    for d in ctx.edges.pad_violations(&hole, ctx.rules.board_edge_hole) {
        errors.push(
            DrcError::new(
                DrcErrorKind::BoardEdgeViahole,
                format!("\"{}\" via hole to board edge = {}, {}", name, ctx.dim(d), ctx.at(pt)),
                name,
                loc,
                pt,
            )
            .with_distance(d)
            .with_extent(extent),
        );
    }
    errors
}

/// Sides of a copper area against the board edge
pub fn area_errors(ctx: &DrcContext, net: NetId, ia: usize) -> Vec<DrcError> {
    let Some(area) = ctx.board.net(net).and_then(|n| n.areas.get(ia)) else {
        return Vec::new();
    };
    let name = ctx.board.net_name(net);
    let mut errors = Vec::new();
    for side in area.polygon.sides() {
        let pts = side.flatten();
        for (d, p) in ctx.edges.polyline_violations(&pts, 0, ctx.rules.board_edge_copper) {
            errors.push(
                DrcError::new(
                    DrcErrorKind::BoardEdgeCopperArea,
                    format!("\"{}\" copper area to board edge = {}, {}", name, ctx.dim(d), ctx.at(p)),
                    name,
                    Location::AreaSide { net, area: ia, side: side.index },
                    p,
                )
                .on_layer(area.layer)
                .with_distance(d),
            );
        }
    }
    errors
}
