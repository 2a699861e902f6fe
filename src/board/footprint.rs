//! Placement of footprint pads onto the board
//!
//! Parts rotate in whole quadrants. Parts on the bottom side are mirrored
//! about the footprint's y axis before rotation, and their top and bottom
//! pads trade places.

use super::types::{Board, NetId, PadDef, Part, PartId, Side, BOTTOM_LAYER, TOP_LAYER};
use crate::geometry::{PadGeom, PadShape};

/// Placed pad of one pin on one copper layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadInfo {
    pub geom: PadGeom,
    /// Hole diameter, 0 for surface pads
    pub hole: i32,
    pub net: Option<NetId>,
}

impl PadInfo {
    pub fn has_pad(&self) -> bool {
        !self.geom.shape.is_none()
    }

    pub fn has_hole(&self) -> bool {
        self.hole > 0
    }

    pub fn center(&self) -> [i32; 2] {
        self.geom.center()
    }

    /// Narrowest copper width across the pad, used for ring checks
    pub fn ring_width(&self) -> i32 {
        if self.geom.shape.is_elongated() {
            self.geom.w.min(self.geom.l)
        } else {
            self.geom.w
        }
    }
}

/// Rotate an offset clockwise by a multiple of 90 degrees
pub fn rotate_quadrant(x: i32, y: i32, angle: i32) -> (i32, i32) {
    match angle.rem_euclid(360) {
        90 => (y, -x),
        180 => (-x, -y),
        270 => (-y, x),
        _ => (x, y),
    }
}

pub fn is_quadrant(angle: i32) -> bool {
    angle.rem_euclid(90) == 0
}

fn place_offset(part: &Part, x: i32, y: i32) -> [i32; 2] {
    let x = if part.side == Side::Bottom { -x } else { x };
    let (dx, dy) = rotate_quadrant(x, y, part.angle);
    [part.x.saturating_add(dx), part.y.saturating_add(dy)]
}

/// World position of a part pin
pub fn pin_point(board: &Board, part: PartId, pin: usize) -> Option<[i32; 2]> {
    let p = board.part(part)?;
    let fp_pin = board.footprint_of(p)?.pins.get(pin)?;
    Some(place_offset(p, fp_pin.x, fp_pin.y))
}

fn pad_for_layer<'a>(part: &Part, top: &'a PadDef, inner: &'a PadDef, bottom: &'a PadDef, layer: usize) -> &'a PadDef {
    match (layer, part.side) {
        (TOP_LAYER, Side::Top) | (BOTTOM_LAYER, Side::Bottom) => top,
        (TOP_LAYER, Side::Bottom) | (BOTTOM_LAYER, Side::Top) => bottom,
        _ => inner,
    }
}

/// Pad of a part pin on a copper layer, or `None` when the pin has neither
/// copper nor a hole there
pub fn pad_draw_info(board: &Board, part: PartId, pin: usize, layer: usize) -> Option<PadInfo> {
    if layer >= board.copper_layers {
        return None;
    }
    let p = board.part(part)?;
    let fp_pin = board.footprint_of(p)?.pins.get(pin)?;
    let ps = &fp_pin.padstack;
    let def = pad_for_layer(p, &ps.top, &ps.inner, &ps.bottom, layer);
    let hole = ps.hole_size.max(0);

    if def.shape.is_none() && hole == 0 {
        return None;
    }

    let [x, y] = place_offset(p, fp_pin.x, fp_pin.y);
    let l = match def.shape {
        PadShape::Rect | PadShape::RRect | PadShape::Oval => def.length,
        _ => def.width,
    };
    let net = p.pins.get(pin).and_then(|pp| pp.net);
    let geom = PadGeom {
        shape: def.shape,
        x,
        y,
        w: def.width,
        l,
        r: def.radius,
        angle: (fp_pin.angle + p.angle).rem_euclid(180),
    };
    Some(PadInfo { geom, hole, net })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::{mil, Connection, Footprint, FootprintPin, Padstack, Segment, Vertex};

    fn board_with_smt() -> Board {
        let mut board = Board::new(2);
        board.add_footprint(Footprint {
            name: "SMT".to_string(),
            pins: vec![FootprintPin {
                name: "1".to_string(),
                x: mil(50),
                y: mil(10),
                angle: 0,
                padstack: Padstack::smt(PadDef::rect(mil(20), mil(60))),
            }],
        });
        board
    }

    #[test]
    fn test_rotate_quadrant() {
        assert_eq!(rotate_quadrant(10, 0, 90), (0, -10));
        assert_eq!(rotate_quadrant(10, 0, 180), (-10, 0));
        assert_eq!(rotate_quadrant(10, 0, 270), (0, 10));
        assert_eq!(rotate_quadrant(10, 0, -90), (0, 10));
        assert_eq!(rotate_quadrant(3, 4, 360), (3, 4));
    }

    #[test]
    fn test_pin_point_rotated_part() {
        let mut board = board_with_smt();
        let u1 = board.place("U1", "SMT", mil(1000), mil(1000), 90, Side::Top);
        assert_eq!(pin_point(&board, u1, 0), Some([mil(1010), mil(950)]));
    }

    #[test]
    fn test_pad_angle_follows_part_rotation() {
        let mut board = board_with_smt();
        let u1 = board.place("U1", "SMT", 0, 0, 270, Side::Top);
        let info = pad_draw_info(&board, u1, 0, TOP_LAYER).unwrap();
        assert_eq!(info.geom.angle, 90);
        assert_eq!(info.geom.shape, PadShape::Rect);
        assert_eq!(info.ring_width(), mil(20));
    }

    #[test]
    fn test_bottom_side_part_uses_bottom_layer() {
        let mut board = board_with_smt();
        let u1 = board.place("U1", "SMT", 0, 0, 0, Side::Bottom);
        assert!(pad_draw_info(&board, u1, 0, TOP_LAYER).is_none());
        let info = pad_draw_info(&board, u1, 0, BOTTOM_LAYER).unwrap();
        assert_eq!(info.center(), [-mil(50), mil(10)], "bottom part is mirrored");
        assert!(!info.has_hole());
    }

    #[test]
    fn test_pad_ignores_routing_of_its_net() {
        let mut board = board_with_smt();
        let u1 = board.place("U1", "SMT", 0, 0, 0, Side::Top);
        let net = board.add_net("N");
        board.connect_pin(net, u1, 0);
        let bare = pad_draw_info(&board, u1, 0, TOP_LAYER).unwrap();

        board.nets[0].connections.push(Connection {
            start_pin: 0,
            end_pin: None,
            vertices: vec![
                Vertex::new(mil(50), mil(10)),
                Vertex::new(mil(500), mil(10)),
            ],
            segments: vec![Segment::copper(TOP_LAYER, mil(10))],
        });
        let routed = pad_draw_info(&board, u1, 0, TOP_LAYER).unwrap();
        assert_eq!(bare, routed, "a trace at the pin must not change its pad");
        assert_eq!(routed.net, Some(net));
    }

    #[test]
    fn test_missing_footprint_gives_no_pad() {
        let mut board = board_with_smt();
        let u1 = board.place("U1", "NOPE", 0, 0, 0, Side::Top);
        assert!(pad_draw_info(&board, u1, 0, TOP_LAYER).is_none());
        assert!(pin_point(&board, u1, 0).is_none());
    }
}
