//! Part checks: per-pin board edge and annular ring, then part-to-part
//! clearances

use crate::board::{mil, PartId};
use crate::geometry::bbox::{build_index, candidates};
use crate::geometry::distance::{point_distance, round_nm};
use crate::geometry::pad::pad_clearance;
use crate::geometry::PadGeom;

use super::board_edge::{self, pad_extent};
use super::cache::{PartCache, PinCache};
use super::context::DrcContext;
use super::ordered_map;
use super::types::{DrcError, DrcErrorKind, Location};

/// A pin together with its owning part
#[derive(Clone, Copy)]
struct PinRef<'a> {
    part: PartId,
    ip: usize,
    pin: &'a PinCache,
}

impl PinRef<'_> {
    fn name(&self, ctx: &DrcContext) -> String {
        ctx.board.pin_name(self.part, self.ip)
    }

    fn ref_des<'b>(&self, ctx: &DrcContext<'b>) -> &'b str {
        ctx.board.part(self.part).map_or("", |p| p.ref_des.as_str())
    }

    fn loc(&self) -> Location {
        Location::Pad { part: self.part, pin: self.ip }
    }
}

/// Board-edge and annular-ring checks for every pin of every part
pub fn check_parts(ctx: &DrcContext) -> Vec<DrcError> {
    ordered_map(ctx.parallel(), ctx.board.parts.len(), |i| part_errors(ctx, PartId(i)))
        .into_iter()
        .flatten()
        .collect()
}

fn part_errors(ctx: &DrcContext, id: PartId) -> Vec<DrcError> {
    let Some(cache) = ctx.cache.part(id) else {
        return Vec::new();
    };
    let mut errors = Vec::new();
    for (ip, pin) in cache.pins.iter().enumerate() {
        errors.extend(board_edge::pin_hole_errors(ctx, id, ip, pin));
        errors.extend(ring_error(ctx, PinRef { part: id, ip, pin }));
        errors.extend(board_edge::pin_pad_errors(ctx, id, ip, pin));
    }
    errors
}

/// Narrowest annular ring over the pin's copper layers
fn ring_error(ctx: &DrcContext, p: PinRef) -> Option<DrcError> {
    if !p.pin.has_hole() || p.pin.net.is_none() {
        return None;
    }
    let (il, pad, ring) = (0..p.pin.pads.len())
        .filter_map(|il| p.pin.copper(il).map(|pad| (il, pad, (pad.ring_width() - p.pin.hole_size) / 2)))
        .min_by_key(|(_, _, ring)| *ring)?;
    if ring >= ctx.rules.annular_ring_pins {
        return None;
    }
    Some(
        DrcError::new(
            DrcErrorKind::RingPad,
            format!("{} annular ring = {}, {}", p.name(ctx), ctx.dim(ring), ctx.at(pad.center())),
            p.ref_des(ctx),
            p.loc(),
            pad.center(),
        )
        .on_layer(il)
        .with_distance(ring)
        .with_extent(pad_extent(&pad.geom)),
    )
}

/// Clearances between pins of different parts
pub fn check_part_pairs(ctx: &DrcContext) -> Vec<DrcError> {
    let clr = ctx.rules.part_clearance();
    let tree = build_index(
        ctx.cache
            .parts
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (i, p.bbox))),
    );

    ordered_map(ctx.parallel(), ctx.board.parts.len(), |i| {
        let Some(a) = ctx.cache.part(PartId(i)) else {
            return Vec::new();
        };
        candidates(&tree, &a.bbox, clr)
            .into_iter()
            .filter(|j| *j > i)
            .flat_map(|j| part_pair_errors(ctx, PartId(i), a, PartId(j), clr))
            .collect::<Vec<_>>()
    })
    .into_iter()
    .flatten()
    .collect()
}

fn part_pair_errors(ctx: &DrcContext, ia: PartId, a: &PartCache, ib: PartId, clr: i32) -> Vec<DrcError> {
    let Some(b) = ctx.cache.part(ib) else {
        return Vec::new();
    };
    if !a.hole_flag && !b.hole_flag && a.layers & b.layers == 0 {
        return Vec::new();
    }
    if a.bbox.separated_by(&b.bbox, clr) {
        return Vec::new();
    }

    let mut errors = Vec::new();
    for (ipa, pa) in a.pins.iter().enumerate() {
        for (ipb, pb) in b.pins.iter().enumerate() {
            let pa = PinRef { part: ia, ip: ipa, pin: pa };
            let pb = PinRef { part: ib, ip: ipb, pin: pb };
            pin_pair_errors(ctx, pa, pb, clr, &mut errors);
        }
    }
    errors
}

fn pin_pair_errors(ctx: &DrcContext, a: PinRef, b: PinRef, clr: i32, errors: &mut Vec<DrcError>) {
    let rules = ctx.rules;

    if a.pin.has_hole() && b.pin.has_hole() {
        let dist = point_distance(a.pin.center, b.pin.center);
        let gap = round_nm(dist - (a.pin.hole_size as f64 + b.pin.hole_size as f64) / 2.0).max(0);
        if gap < rules.hole_hole {
            errors.push(
                DrcError::new(
                    DrcErrorKind::PadholePadhole,
                    format!(
                        "{} pad hole to {} pad hole = {}, {}",
                        a.name(ctx),
                        b.name(ctx),
                        ctx.dim(gap),
                        ctx.at(b.pin.center)
                    ),
                    a.ref_des(ctx),
                    a.loc(),
                    a.pin.center,
                )
                .with_other(b.ref_des(ctx), b.loc(), b.pin.center)
                .with_distance(gap)
                .with_extent(a.pin.hole_size.max(b.pin.hole_size).saturating_add(mil(20))),
            );
        }
    }

    if a.pin.layers & b.pin.layers == 0 && !a.pin.has_hole() && !b.pin.has_hole() {
        return;
    }
    if a.pin.bbox.separated_by(&b.pin.bbox, clr) {
        return;
    }

    let same_net = a.pin.net.is_some() && a.pin.net == b.pin.net;
    for il in 0..a.pin.pads.len() {
        let before = errors.len();

        // Copper of one pin against the hole of the other
        for (pad_pin, hole_pin) in [(a, b), (b, a)] {
            let (Some(pad), true) = (pad_pin.pin.copper(il), hole_pin.pin.has_hole()) else {
                continue;
            };
            let hole = PadGeom::round(hole_pin.pin.center[0], hole_pin.pin.center[1], hole_pin.pin.hole_size);
            let d = pad_clearance(&pad.geom, &hole);
            if d < rules.hole_copper {
                errors.push(
                    DrcError::new(
                        DrcErrorKind::PadPadhole,
                        format!(
                            "{} pad hole to {} pad = {}, {}",
                            hole_pin.name(ctx),
                            pad_pin.name(ctx),
                            ctx.dim(d),
                            ctx.at(hole_pin.pin.center)
                        ),
                        pad_pin.ref_des(ctx),
                        pad_pin.loc(),
                        pad.center(),
                    )
                    .with_other(hole_pin.ref_des(ctx), hole_pin.loc(), hole_pin.pin.center)
                    .on_layer(il)
                    .with_distance(d)
                    .with_extent(pad_extent(&pad.geom)),
                );
                break;
            }
        }

        if errors.len() == before && !same_net {
            if let (Some(pad_a), Some(pad_b)) = (a.pin.copper(il), b.pin.copper(il)) {
                let d = pad_clearance(&pad_a.geom, &pad_b.geom);
                if d < rules.pad_pad {
                    errors.push(
                        DrcError::new(
                            DrcErrorKind::PadPad,
                            format!(
                                "{} pad to {} pad = {}, {}",
                                a.name(ctx),
                                b.name(ctx),
                                ctx.dim(d),
                                ctx.at(pad_b.center())
                            ),
                            a.ref_des(ctx),
                            a.loc(),
                            pad_a.center(),
                        )
                        .with_other(b.ref_des(ctx), b.loc(), pad_b.center())
                        .on_layer(il)
                        .with_distance(d)
                        .with_extent(pad_extent(&pad_a.geom).max(pad_extent(&pad_b.geom))),
                    );
                }
            }
        }

        if errors.len() > before {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::drc::test_support::{place_on_net, run_phase, smt_round, th_round};
    use crate::drc::types::DesignRules;
    use crate::geometry::Polygon;

    fn count(errors: &[DrcError], kind: DrcErrorKind) -> usize {
        errors.iter().filter(|e| e.kind == kind).count()
    }

    #[test]
    fn test_round_pads_too_close() {
        let mut board = Board::new(2);
        board.add_footprint(smt_round("PAD60", mil(60)));
        let a = board.add_net("A");
        let b = board.add_net("B");
        place_on_net(&mut board, "U1", "PAD60", 0, 0, a);
        place_on_net(&mut board, "U2", "PAD60", mil(65), 0, b);

        let errors = run_phase(&board, &DesignRules::default(), check_part_pairs);
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        let err = &errors[0];
        assert_eq!(err.kind, DrcErrorKind::PadPad);
        assert_eq!(err.distance, Some(mil(5)));
        assert_eq!(err.layer, Some(0));
        assert!(err.message.starts_with("U1.1 pad to U2.1 pad = 5 mil"), "message: {}", err.message);
    }

    #[test]
    fn test_same_net_pads_not_reported() {
        let mut board = Board::new(2);
        board.add_footprint(smt_round("PAD60", mil(60)));
        let a = board.add_net("A");
        place_on_net(&mut board, "U1", "PAD60", 0, 0, a);
        place_on_net(&mut board, "U2", "PAD60", mil(65), 0, a);

        let errors = run_phase(&board, &DesignRules::default(), check_part_pairs);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_close_holes() {
        let mut board = Board::new(2);
        board.add_footprint(th_round("TH60", mil(60), mil(30)));
        let a = board.add_net("A");
        let b = board.add_net("B");
        place_on_net(&mut board, "J1", "TH60", 0, 0, a);
        place_on_net(&mut board, "J2", "TH60", mil(50), 0, b);

        let errors = run_phase(&board, &DesignRules::default(), check_part_pairs);
        assert_eq!(count(&errors, DrcErrorKind::PadholePadhole), 1, "errors: {:?}", errors);
        // The pad-to-hole hit on the top layer ends the layer scan
        assert_eq!(count(&errors, DrcErrorKind::PadPadhole), 1, "errors: {:?}", errors);
        assert_eq!(count(&errors, DrcErrorKind::PadPad), 0, "errors: {:?}", errors);

        let holes = errors.iter().find(|e| e.kind == DrcErrorKind::PadholePadhole).unwrap();
        assert_eq!(holes.distance, Some(mil(20)));
    }

    #[test]
    fn test_well_spaced_holes_pass() {
        let mut board = Board::new(2);
        board.add_footprint(th_round("TH60", mil(60), mil(30)));
        let a = board.add_net("A");
        let b = board.add_net("B");
        place_on_net(&mut board, "J1", "TH60", 0, 0, a);
        place_on_net(&mut board, "J2", "TH60", mil(100), 0, b);

        let errors = run_phase(&board, &DesignRules::default(), check_part_pairs);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_narrow_annular_ring() {
        let mut board = Board::new(2);
        board.add_footprint(th_round("TH40", mil(40), mil(30)));
        let a = board.add_net("A");
        place_on_net(&mut board, "J1", "TH40", 0, 0, a);

        let errors = run_phase(&board, &DesignRules::default(), check_parts);
        assert_eq!(count(&errors, DrcErrorKind::RingPad), 1, "errors: {:?}", errors);
        assert_eq!(errors[0].distance, Some(mil(5)));
        assert!(errors[0].message.starts_with("J1.1 annular ring = 5 mil"), "message: {}", errors[0].message);
    }

    #[test]
    fn test_pad_near_board_edge() {
        let mut board = Board::new(2);
        board.outline.push(Polygon::rect(0, 0, mil(1000), mil(1000)));
        board.add_footprint(smt_round("PAD60", mil(60)));
        let a = board.add_net("A");
        place_on_net(&mut board, "U1", "PAD60", mil(40), mil(500), a);
        place_on_net(&mut board, "U2", "PAD60", mil(500), mil(500), a);

        let errors = run_phase(&board, &DesignRules::default(), check_parts);
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(errors[0].kind, DrcErrorKind::BoardEdgePad);
        assert_eq!(errors[0].distance, Some(mil(10)));
        assert_eq!(errors[0].location_a, Location::Pad { part: PartId(0), pin: 0 });
    }
}
