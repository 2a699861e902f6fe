//! Per-net checks: copper areas and traces against the board edge, trace
//! width, via rings, and connection copper against the pins of nearby parts

use rstar::RTree;

use crate::board::{mil, Connection, NetId, PartId};
use crate::geometry::bbox::{build_index, candidates, IndexedBox};
use crate::geometry::distance::{point_distance, round_nm};
use crate::geometry::pad::{pad_clearance, segment_pad_clearance};
use crate::geometry::{BBox, PadGeom};

use super::board_edge;
use super::cache::{ConnectionCache, PinCache, ViaCache};
use super::context::DrcContext;
use super::ordered_map;
use super::types::{DrcError, DrcErrorKind, Location};

pub fn check_nets_and_parts(ctx: &DrcContext) -> Vec<DrcError> {
    let tree = build_index(
        ctx.cache
            .parts
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (i, p.bbox))),
    );
    ordered_map(ctx.parallel(), ctx.board.nets.len(), |i| net_errors(ctx, NetId(i), &tree))
        .into_iter()
        .flatten()
        .collect()
}

fn net_errors(ctx: &DrcContext, net_id: NetId, tree: &RTree<IndexedBox>) -> Vec<DrcError> {
    let Some(net) = ctx.board.net(net_id) else {
        return Vec::new();
    };
    let rules = ctx.rules;
    let clr = rules.pad_trace.max(rules.hole_copper).max(rules.hole_hole);
    let mut errors = Vec::new();

    for ia in 0..net.areas.len() {
        if ctx.cache.area_ok(net_id, ia) {
            errors.extend(board_edge::area_errors(ctx, net_id, ia));
        }
    }

    for (ic, conn) in net.connections.iter().enumerate() {
        let Some(cc) = ctx.cache.connection(net_id, ic) else {
            continue;
        };

        for (is, seg) in conn.segments.iter().enumerate() {
            if let (Some(layer), Some((a, b))) = (seg.copper_layer(), conn.segment_points(is)) {
                if seg.width > 0 && seg.width < rules.trace_width {
                    let mid = [round_nm((a[0] as f64 + b[0] as f64) / 2.0), round_nm((a[1] as f64 + b[1] as f64) / 2.0)];
                    errors.push(
                        DrcError::new(
                            DrcErrorKind::TraceWidth,
                            format!("\"{}\" trace width = {}, {}", net.name, ctx.dim(seg.width), ctx.at(mid)),
                            &net.name,
                            Location::Segment { net: net_id, connection: ic, segment: is },
                            mid,
                        )
                        .on_layer(layer)
                        .with_distance(seg.width),
                    );
                }
            }
            errors.extend(board_edge::trace_errors(ctx, net_id, ic, is));
        }

        for (iv, vtx) in conn.vertices.iter().enumerate() {
            let Some(via) = cc.vias.get(iv).and_then(Option::as_ref) else {
                continue;
            };
            let ring = (via.min_w - via.hole_w) / 2;
            if ring < rules.annular_ring_vias {
                errors.push(
                    DrcError::new(
                        DrcErrorKind::RingVia,
                        format!("\"{}\" via annular ring = {}, {}", net.name, ctx.dim(ring), ctx.at(vtx.point())),
                        &net.name,
                        Location::Via { net: net_id, connection: ic, vertex: iv },
                        vtx.point(),
                    )
                    .with_distance(ring)
                    .with_extent(via.max_w.saturating_add(mil(20))),
                );
            }
            errors.extend(board_edge::via_errors(ctx, net_id, ic, iv, vtx.point(), via));
        }

        let conn_ref = ConnRef { net: net_id, ic, conn, cache: cc };
        for j in candidates(tree, &cc.bbox, clr) {
            connection_part_errors(ctx, conn_ref, PartId(j), clr, &mut errors);
        }
    }
    errors
}

#[derive(Clone, Copy)]
struct ConnRef<'a> {
    net: NetId,
    ic: usize,
    conn: &'a Connection,
    cache: &'a ConnectionCache,
}

fn connection_part_errors(ctx: &DrcContext, c: ConnRef, part_id: PartId, clr: i32, errors: &mut Vec<DrcError>) {
    let Some(part) = ctx.cache.part(part_id) else {
        return;
    };
    if !part.hole_flag && !c.cache.vias_present && part.layers & c.cache.layers == 0 {
        return;
    }
    if part.bbox.separated_by(&c.cache.bbox, clr) {
        return;
    }
    for (ip, pin) in part.pins.iter().enumerate() {
        if pin.bbox.separated_by(&c.cache.bbox, clr) {
            continue;
        }
        let target = PinTarget { part: part_id, ip, pin };
        if pin.net != Some(c.net) {
            segment_pin_errors(ctx, c, target, errors);
        }
        for (iv, vtx) in c.conn.vertices.iter().enumerate() {
            if let Some(via) = c.cache.vias.get(iv).and_then(Option::as_ref) {
                via_pin_errors(ctx, c, iv, vtx.point(), via, target, errors);
            }
        }
    }
}

#[derive(Clone, Copy)]
struct PinTarget<'a> {
    part: PartId,
    ip: usize,
    pin: &'a PinCache,
}

impl PinTarget<'_> {
    fn hole(&self) -> PadGeom {
        PadGeom::round(self.pin.center[0], self.pin.center[1], self.pin.hole_size)
    }

    fn loc(&self) -> Location {
        Location::Pad { part: self.part, pin: self.ip }
    }
}

fn segment_pin_errors(ctx: &DrcContext, c: ConnRef, t: PinTarget, errors: &mut Vec<DrcError>) {
    let net_name = ctx.board.net_name(c.net);
    let pin_name = ctx.board.pin_name(t.part, t.ip);
    let ref_des = ctx.board.part(t.part).map_or("", |p| p.ref_des.as_str());

    for (is, seg) in c.conn.segments.iter().enumerate() {
        let (Some(layer), Some((a, b))) = (seg.copper_layer(), c.conn.segment_points(is)) else {
            continue;
        };
        let seg_box = BBox::of_segment(a, b, seg.width / 2);
        if seg_box.separated_by(&t.pin.bbox, ctx.rules.pad_trace.max(ctx.rules.hole_copper)) {
            continue;
        }
        let loc = Location::Segment { net: c.net, connection: c.ic, segment: is };

        if t.pin.has_hole() {
            let d = segment_pad_clearance(a, b, seg.width, &t.hole());
            if d < ctx.rules.hole_copper {
                errors.push(
                    DrcError::new(
                        DrcErrorKind::SegPadhole,
                        format!("\"{}\" trace to {} pad hole = {}, {}", net_name, pin_name, ctx.dim(d), ctx.at(t.pin.center)),
                        net_name,
                        loc,
                        t.pin.center,
                    )
                    .with_other(ref_des, t.loc(), t.pin.center)
                    .on_layer(layer)
                    .with_distance(d)
                    .with_extent(t.pin.hole_size.saturating_add(mil(20))),
                );
            }
        }
        if let Some(pad) = t.pin.copper(layer) {
            let d = segment_pad_clearance(a, b, seg.width, &pad.geom);
            if d < ctx.rules.pad_trace {
                errors.push(
                    DrcError::new(
                        DrcErrorKind::SegPad,
                        format!("\"{}\" trace to {} pad = {}, {}", net_name, pin_name, ctx.dim(d), ctx.at(pad.center())),
                        net_name,
                        loc,
                        pad.center(),
                    )
                    .with_other(ref_des, t.loc(), pad.center())
                    .on_layer(layer)
                    .with_distance(d)
                    .with_extent(board_edge::pad_extent(&pad.geom)),
                );
            }
        }
    }
}

fn via_pin_errors(ctx: &DrcContext, c: ConnRef, iv: usize, pt: [i32; 2], via: &ViaCache, t: PinTarget, errors: &mut Vec<DrcError>) {
    let rules = ctx.rules;
    let net_name = ctx.board.net_name(c.net);
    let pin_name = ctx.board.pin_name(t.part, t.ip);
    let ref_des = ctx.board.part(t.part).map_or("", |p| p.ref_des.as_str());
    let loc = Location::Via { net: c.net, connection: c.ic, vertex: iv };
    let extent = via.max_w.saturating_add(mil(20));
    let other_net = t.pin.net != Some(c.net);
    let report = |kind: DrcErrorKind, what: String, d: i32, layer: Option<usize>| {
        let err = DrcError::new(
            kind,
            format!("\"{}\" {} = {}, {}", net_name, what, ctx.dim(d), ctx.at(pt)),
            net_name,
            loc,
            pt,
        )
        .with_other(ref_des, t.loc(), t.pin.center)
        .with_distance(d)
        .with_extent(extent);
        match layer {
            Some(il) => err.on_layer(il),
            None => err,
        }
    };

    if other_net {
        let hole = PadGeom::round(pt[0], pt[1], via.hole_w);
        for il in 0..via.widths.len() {
            let via_w = via.width(il);
            let before = errors.len();
            let pad = t.pin.copper(il);

            if via_w > 0 {
                let via_pad = PadGeom::round(pt[0], pt[1], via_w);
                if let Some(pad) = pad {
                    let d = pad_clearance(&via_pad, &pad.geom);
                    if d < rules.pad_trace {
                        errors.push(report(DrcErrorKind::ViaPad, format!("via pad to {} pad", pin_name), d, Some(il)));
                    }
                }
                if errors.len() == before && t.pin.has_hole() {
                    let d = pad_clearance(&via_pad, &t.hole());
                    if d < rules.hole_copper {
                        errors.push(report(DrcErrorKind::ViaPadhole, format!("via pad to {} pad hole", pin_name), d, Some(il)));
                    }
                }
            }
            if errors.len() == before && via.hole_w > 0 {
                if let Some(pad) = pad {
                    let d = pad_clearance(&hole, &pad.geom);
                    if d < rules.hole_copper {
                        errors.push(report(DrcErrorKind::ViaholePad, format!("via hole to {} pad", pin_name), d, Some(il)));
                    }
                }
            }
            if errors.len() > before {
                break;
            }
        }
    }

    if t.pin.has_hole() && via.hole_w > 0 {
        let dist = point_distance(pt, t.pin.center);
        let gap = round_nm(dist - (via.hole_w as f64 + t.pin.hole_size as f64) / 2.0).max(0);
        if gap < rules.hole_hole {
            errors.push(report(DrcErrorKind::ViaholePadhole, format!("via hole to {} pad hole", pin_name), gap, None));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Segment, Vertex};
    use crate::drc::test_support::{place_on_net, run_phase, smt_round, th_round};
    use crate::drc::types::DesignRules;

    fn count(errors: &[DrcError], kind: DrcErrorKind) -> usize {
        errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Net "N" with one pad at the origin and a stub connection along `vertices`
    fn stub_board(vertices: Vec<Vertex>, segments: Vec<Segment>) -> Board {
        let mut board = Board::new(2);
        board.add_footprint(smt_round("PAD40", mil(40)));
        let n = board.add_net("N");
        place_on_net(&mut board, "U1", "PAD40", 0, 0, n);
        board.nets[0].connections.push(Connection { start_pin: 0, end_pin: None, vertices, segments });
        board
    }

    #[test]
    fn test_trace_width_at_midpoint() {
        let board = stub_board(
            vec![Vertex::new(0, 0), Vertex::new(mil(100), 0)],
            vec![Segment::copper(0, mil(6))],
        );
        let errors = run_phase(&board, &DesignRules::default(), check_nets_and_parts);
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(errors[0].kind, DrcErrorKind::TraceWidth);
        assert_eq!(errors[0].point_a, [mil(50), 0]);
        assert_eq!(errors[0].distance, Some(mil(6)));
    }

    #[test]
    fn test_via_annular_ring() {
        let rules = DesignRules { annular_ring_vias: mil(12), ..Default::default() };
        let narrow = stub_board(
            vec![Vertex::new(0, 0), Vertex::with_via(mil(200), 0, mil(40), mil(20))],
            vec![Segment::copper(0, mil(10))],
        );
        let errors = run_phase(&narrow, &rules, check_nets_and_parts);
        assert_eq!(count(&errors, DrcErrorKind::RingVia), 1, "errors: {:?}", errors);
        let ring = errors.iter().find(|e| e.kind == DrcErrorKind::RingVia).unwrap();
        assert_eq!(ring.distance, Some(mil(10)));
        assert_eq!(ring.location_a, Location::Via { net: NetId(0), connection: 0, vertex: 1 });

        let wide = stub_board(
            vec![Vertex::new(0, 0), Vertex::with_via(mil(200), 0, mil(40), mil(10))],
            vec![Segment::copper(0, mil(10))],
        );
        let errors = run_phase(&wide, &rules, check_nets_and_parts);
        assert_eq!(count(&errors, DrcErrorKind::RingVia), 0, "errors: {:?}", errors);
    }

    #[test]
    fn test_trace_passing_other_net_pad() {
        let mut board = stub_board(
            vec![Vertex::new(0, 0), Vertex::new(mil(200), 0)],
            vec![Segment::copper(0, mil(10))],
        );
        let m = board.add_net("M");
        place_on_net(&mut board, "U2", "PAD40", mil(100), mil(30), m);

        let errors = run_phase(&board, &DesignRules::default(), check_nets_and_parts);
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        let err = &errors[0];
        assert_eq!(err.kind, DrcErrorKind::SegPad);
        assert_eq!(err.distance, Some(mil(5)));
        assert_eq!(err.location_b, Location::Pad { part: PartId(1), pin: 0 });
        assert!(err.message.starts_with("\"N\" trace to U2.1 pad = 5 mil"), "message: {}", err.message);
    }

    #[test]
    fn test_trace_on_other_layer_ignores_smt_pad() {
        let mut board = stub_board(
            vec![Vertex::new(0, 0), Vertex::new(mil(200), 0)],
            vec![Segment::copper(1, mil(10))],
        );
        let m = board.add_net("M");
        place_on_net(&mut board, "U2", "PAD40", mil(100), mil(30), m);

        let errors = run_phase(&board, &DesignRules::default(), check_nets_and_parts);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_via_hole_near_pin_hole_of_same_net() {
        let mut board = Board::new(2);
        board.add_footprint(th_round("TH60", mil(60), mil(30)));
        let n = board.add_net("N");
        place_on_net(&mut board, "J1", "TH60", 0, 0, n);
        board.nets[0].connections.push(Connection {
            start_pin: 0,
            end_pin: None,
            vertices: vec![Vertex::new(0, 0), Vertex::with_via(mil(40), 0, mil(40), mil(20))],
            segments: vec![Segment::copper(0, mil(10))],
        });

        let errors = run_phase(&board, &DesignRules::default(), check_nets_and_parts);
        assert_eq!(count(&errors, DrcErrorKind::ViaholePadhole), 1, "errors: {:?}", errors);
        assert_eq!(count(&errors, DrcErrorKind::ViaPad), 0, "same net pads are not checked: {:?}", errors);
    }
}
