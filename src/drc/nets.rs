//! Net-to-net checks: traces, vias and via holes of connections on
//! different nets, then copper areas of different nets

use crate::board::{mil, Area, Connection, NetId};
use crate::geometry::bbox::{build_index, candidates};
use crate::geometry::distance::{point_distance, round_nm, Vec2};
use crate::geometry::pad::{pad_clearance, polyline_clearance, segment_clearance, segment_pad_clearance};
use crate::geometry::{BBox, PadGeom};

use super::cache::{ConnectionCache, ViaCache};
use super::context::DrcContext;
use super::ordered_map;
use super::types::{DrcError, DrcErrorKind, Location};

#[derive(Clone, Copy)]
struct ConnRef<'a> {
    net: NetId,
    ic: usize,
    conn: &'a Connection,
    cache: &'a ConnectionCache,
}

impl<'a> ConnRef<'a> {
    fn name<'b>(&self, ctx: &DrcContext<'b>) -> &'b str {
        ctx.board.net_name(self.net)
    }

    fn seg_loc(&self, is: usize) -> Location {
        Location::Segment { net: self.net, connection: self.ic, segment: is }
    }

    fn via_loc(&self, iv: usize) -> Location {
        Location::Via { net: self.net, connection: self.ic, vertex: iv }
    }

    /// Copper segments with their layer and endpoints
    fn copper_segments(&self) -> impl Iterator<Item = (usize, usize, i32, [i32; 2], [i32; 2])> + 'a {
        let conn = self.conn;
        conn.segments.iter().enumerate().filter_map(move |(is, seg)| {
            let layer = seg.copper_layer()?;
            let (a, b) = conn.segment_points(is)?;
            Some((is, layer, seg.width, a, b))
        })
    }

    fn vias(&self) -> impl Iterator<Item = (usize, [i32; 2], &'a ViaCache)> + 'a {
        let conn = self.conn;
        let cache = self.cache;
        cache
            .vias
            .iter()
            .enumerate()
            .filter_map(move |(iv, v)| Some((iv, conn.vertices.get(iv)?.point(), v.as_ref()?)))
    }
}

/// Trace, via and via-hole clearances between connections of different nets
pub fn check_net_pairs(ctx: &DrcContext) -> Vec<DrcError> {
    let mut units: Vec<ConnRef> = Vec::new();
    for (net_id, net) in ctx.board.nets() {
        for (ic, conn) in net.connections.iter().enumerate() {
            if let Some(cache) = ctx.cache.connection(net_id, ic) {
                units.push(ConnRef { net: net_id, ic, conn, cache });
            }
        }
    }
    let cl = ctx.rules.net_clearance();
    let tree = build_index(units.iter().enumerate().map(|(i, u)| (i, u.cache.bbox)));

    ordered_map(ctx.parallel(), units.len(), |i| {
        let a = units[i];
        let mut errors = Vec::new();
        for j in candidates(&tree, &a.cache.bbox, cl) {
            let b = units[j];
            if j > i && b.net != a.net {
                conn_pair_errors(ctx, a, b, &mut errors);
            }
        }
        errors
    })
    .into_iter()
    .flatten()
    .collect()
}

fn conn_pair_errors(ctx: &DrcContext, a: ConnRef, b: ConnRef, errors: &mut Vec<DrcError>) {
    let rules = ctx.rules;

    for (is1, l1, w1, a1, a2) in a.copper_segments() {
        let box1 = a.cache.segment_box(a.conn, is1);
        for (is2, l2, w2, b1, b2) in b.copper_segments() {
            if l1 != l2 || box1.separated_by(&b.cache.segment_box(b.conn, is2), rules.trace_trace) {
                continue;
            }
            let (d, p) = segment_clearance(a1, a2, w1, b1, b2, w2);
            if d < rules.trace_trace {
                errors.push(
                    DrcError::new(
                        DrcErrorKind::SegSeg,
                        format!("\"{}\" trace to \"{}\" trace = {}, {}", a.name(ctx), b.name(ctx), ctx.dim(d), ctx.at(p)),
                        a.name(ctx),
                        a.seg_loc(is1),
                        p,
                    )
                    .with_other(b.name(ctx), b.seg_loc(is2), p)
                    .on_layer(l1)
                    .with_distance(d),
                );
            }
        }
    }

    segment_via_errors(ctx, a, b, false, errors);
    segment_via_errors(ctx, b, a, true, errors);

    for (iv1, p1, v1) in a.vias() {
        for (iv2, p2, v2) in b.vias() {
            via_pair_errors(ctx, (a, iv1, p1, v1), (b, iv2, p2, v2), errors);
        }
    }
}

/// Traces of `s` against vias of `v`. `via_first` words via pad reports
/// from the via's side.
fn segment_via_errors(ctx: &DrcContext, s: ConnRef, v: ConnRef, via_first: bool, errors: &mut Vec<DrcError>) {
    let rules = ctx.rules;
    let reach = rules.trace_trace.max(rules.hole_copper);
    for (is, layer, w, a1, a2) in s.copper_segments() {
        let seg_box = BBox::of_segment(a1, a2, w / 2);
        for (iv, pt, via) in v.vias() {
            let via_box = BBox::around(pt[0], pt[1], via.max_w / 2, via.max_w / 2);
            if seg_box.separated_by(&via_box, reach) {
                continue;
            }
            let via_w = via.width(layer);
            let err = |kind: DrcErrorKind, what: &str, d: i32| {
                let message = if via_first && kind == DrcErrorKind::SegVia {
                    format!("\"{}\" {} to \"{}\" trace = {}, {}", v.name(ctx), what, s.name(ctx), ctx.dim(d), ctx.at(pt))
                } else {
                    format!("\"{}\" trace to \"{}\" {} = {}, {}", s.name(ctx), v.name(ctx), what, ctx.dim(d), ctx.at(pt))
                };
                DrcError::new(
                    kind,
                    message,
                    s.name(ctx),
                    s.seg_loc(is),
                    pt,
                )
                .with_other(v.name(ctx), v.via_loc(iv), pt)
                .on_layer(layer)
                .with_distance(d)
                .with_extent(via.max_w.saturating_add(mil(20)))
            };
            if via_w > 0 {
                let d = segment_pad_clearance(a1, a2, w, &PadGeom::round(pt[0], pt[1], via_w));
                if d < rules.trace_trace {
                    errors.push(err(DrcErrorKind::SegVia, "via pad", d));
                }
            }
            if via.hole_w > 0 {
                let d = segment_pad_clearance(a1, a2, w, &PadGeom::round(pt[0], pt[1], via.hole_w));
                if d < rules.hole_copper {
                    errors.push(err(DrcErrorKind::SegViahole, "via hole", d));
                }
            }
        }
    }
}

type ViaRef<'a> = (ConnRef<'a>, usize, [i32; 2], &'a ViaCache);

fn via_pair_errors(ctx: &DrcContext, a: ViaRef, b: ViaRef, errors: &mut Vec<DrcError>) {
    let rules = ctx.rules;
    let (ca, iv1, p1, v1) = a;
    let (cb, iv2, p2, v2) = b;
    let reach = rules.net_clearance();
    let box1 = BBox::around(p1[0], p1[1], v1.max_w / 2, v1.max_w / 2);
    let box2 = BBox::around(p2[0], p2[1], v2.max_w / 2, v2.max_w / 2);
    if box1.separated_by(&box2, reach) {
        return;
    }

    // `swap` names the second via first
    let err = |kind: DrcErrorKind, what_a: &str, what_b: &str, d: i32, layer: Option<usize>, swap: bool| {
        let ((c1, l1, q1), (c2, l2, q2)) = if swap {
            ((cb, cb.via_loc(iv2), p2), (ca, ca.via_loc(iv1), p1))
        } else {
            ((ca, ca.via_loc(iv1), p1), (cb, cb.via_loc(iv2), p2))
        };
        let e = DrcError::new(
            kind,
            format!(
                "\"{}\" {} to \"{}\" {} = {}, {}",
                c1.name(ctx),
                what_a,
                c2.name(ctx),
                what_b,
                ctx.dim(d),
                ctx.at(q1)
            ),
            c1.name(ctx),
            l1,
            q1,
        )
        .with_other(c2.name(ctx), l2, q2)
        .with_distance(d)
        .with_extent(v1.max_w.max(v2.max_w).saturating_add(mil(20)));
        match layer {
            Some(il) => e.on_layer(il),
            None => e,
        }
    };

    let hole1 = PadGeom::round(p1[0], p1[1], v1.hole_w);
    let hole2 = PadGeom::round(p2[0], p2[1], v2.hole_w);
    let mut found = [false; 3];
    for il in 0..v1.widths.len().min(v2.widths.len()) {
        let (w1, w2) = (v1.width(il), v2.width(il));
        let pad1 = PadGeom::round(p1[0], p1[1], w1);
        let pad2 = PadGeom::round(p2[0], p2[1], w2);
        if !found[0] && w1 > 0 && w2 > 0 {
            let d = pad_clearance(&pad1, &pad2);
            if d < rules.trace_trace {
                errors.push(err(DrcErrorKind::ViaVia, "via pad", "via pad", d, Some(il), false));
                found[0] = true;
            }
        }
        if !found[1] && w1 > 0 && v2.hole_w > 0 {
            let d = pad_clearance(&pad1, &hole2);
            if d < rules.hole_copper {
                errors.push(err(DrcErrorKind::ViaViahole, "via pad", "via hole", d, Some(il), false));
                found[1] = true;
            }
        }
        if !found[2] && w2 > 0 && v1.hole_w > 0 {
            let d = pad_clearance(&hole1, &pad2);
            if d < rules.hole_copper {
                errors.push(err(DrcErrorKind::ViaViahole, "via pad", "via hole", d, Some(il), true));
                found[2] = true;
            }
        }
    }

    if v1.hole_w > 0 && v2.hole_w > 0 {
        let dist = point_distance(p1, p2);
        let gap = round_nm(dist - (v1.hole_w as f64 + v2.hole_w as f64) / 2.0).max(0);
        if gap < rules.hole_hole {
            errors.push(err(DrcErrorKind::ViaholeViahole, "via hole", "via hole", gap, None, false));
        }
    }
}

struct AreaRef<'a> {
    net: NetId,
    ia: usize,
    area: &'a Area,
    bbox: BBox,
    /// Flattened sides with their global index and box
    sides: Vec<(usize, Vec<Vec2>, BBox)>,
}

/// Containment and clearance between copper areas of different nets
pub fn check_area_pairs(ctx: &DrcContext) -> Vec<DrcError> {
    let mut units: Vec<AreaRef> = Vec::new();
    for (net_id, net) in ctx.board.nets() {
        for (ia, area) in net.areas.iter().enumerate() {
            if !ctx.cache.area_ok(net_id, ia) {
                continue;
            }
            let sides = area
                .polygon
                .sides()
                .map(|s| {
                    let pts = s.flatten();
                    let mut b = BBox::EMPTY;
                    for p in &pts {
                        b.include_point(round_nm(p[0]), round_nm(p[1]));
                    }
                    (s.index, pts, b)
                })
                .collect();
            units.push(AreaRef { net: net_id, ia, area, bbox: area.polygon.bbox(), sides });
        }
    }
    let cc = ctx.rules.copper_copper;

    ordered_map(ctx.parallel(), units.len(), |i| {
        let a = &units[i];
        let mut errors = Vec::new();
        for b in &units[i + 1..] {
            if a.net != b.net && a.area.layer == b.area.layer && !a.bbox.separated_by(&b.bbox, cc) {
                area_pair_errors(ctx, a, b, &mut errors);
            }
        }
        errors
    })
    .into_iter()
    .flatten()
    .collect()
}

fn area_pair_errors(ctx: &DrcContext, a: &AreaRef, b: &AreaRef, errors: &mut Vec<DrcError>) {
    let layer = a.area.layer;
    let name_a = ctx.board.net_name(a.net);
    let name_b = ctx.board.net_name(b.net);

    for (inner, outer, inner_name, outer_name) in [(a, b, name_a, name_b), (b, a, name_b, name_a)] {
        for (ic, corner) in inner.area.polygon.corners() {
            if outer.area.polygon.contains_point(corner.x, corner.y) {
                let p = corner.point();
                errors.push(
                    DrcError::new(
                        DrcErrorKind::CopperAreaInsideCopperArea,
                        format!("\"{}\" copper area inside \"{}\" copper area", inner_name, outer_name),
                        inner_name,
                        Location::AreaCorner { net: inner.net, area: inner.ia, corner: ic },
                        p,
                    )
                    .with_other(outer_name, Location::Area { net: outer.net, area: outer.ia }, p)
                    .on_layer(layer),
                );
            }
        }
    }

    let cc = ctx.rules.copper_copper;
    for (is1, pts1, box1) in &a.sides {
        for (is2, pts2, box2) in &b.sides {
            if box1.separated_by(box2, cc) {
                continue;
            }
            let (d, p) = polyline_clearance(pts1, 0, pts2, 0);
            if d < cc {
                errors.push(
                    DrcError::new(
                        DrcErrorKind::CopperAreaCopperArea,
                        format!("\"{}\" copper area to \"{}\" copper area = {}, {}", name_a, name_b, ctx.dim(d), ctx.at(p)),
                        name_a,
                        Location::AreaSide { net: a.net, area: a.ia, side: *is1 },
                        p,
                    )
                    .with_other(name_b, Location::AreaSide { net: b.net, area: b.ia, side: *is2 }, p)
                    .on_layer(layer)
                    .with_distance(d),
                );
            }
        }
    }
}
