//! Pad shapes and clearance calculations
//!
//! A pad is decomposed into circles and convex polygons; clearances between
//! pads, traces and board-edge polylines are minimum distances between those
//! elements. Traces are treated as capsules (a segment with a half width).

use serde::{Deserialize, Serialize};

use super::distance::{point_segment_distance, round_nm, segment_distance, segments_intersect, to_grid, to_vec2, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    #[default]
    None,
    Round,
    Square,
    Rect,
    RRect,
    Oval,
    Octagon,
}

impl PadShape {
    pub fn is_none(&self) -> bool {
        matches!(self, PadShape::None)
    }

    /// Shapes whose ring width is measured across the narrow dimension
    pub fn is_elongated(&self) -> bool {
        matches!(self, PadShape::Rect | PadShape::RRect | PadShape::Oval)
    }
}

/// A pad placed on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PadGeom {
    pub shape: PadShape,
    pub x: i32,
    pub y: i32,
    /// Width, across the pad
    pub w: i32,
    /// Length, along the pad; equals `w` for symmetric shapes
    pub l: i32,
    /// Corner radius for rounded rectangles
    pub r: i32,
    /// 0 or 90 degrees
    pub angle: i32,
}

impl PadGeom {
    /// A round pad, also used for holes and via pads
    pub fn round(x: i32, y: i32, diameter: i32) -> Self {
        Self {
            shape: if diameter > 0 { PadShape::Round } else { PadShape::None },
            x,
            y,
            w: diameter,
            l: diameter,
            r: 0,
            angle: 0,
        }
    }

    pub fn center(&self) -> [i32; 2] {
        [self.x, self.y]
    }

    /// Half extents along x and y
    pub fn half_extents(&self) -> (i32, i32) {
        let (len, wid) = match self.shape {
            PadShape::None => (0, 0),
            PadShape::Round | PadShape::Square | PadShape::Octagon => (self.w, self.w),
            PadShape::Rect | PadShape::RRect | PadShape::Oval => (self.l, self.w),
        };
        if self.angle == 90 {
            (wid / 2, len / 2)
        } else {
            (len / 2, wid / 2)
        }
    }

    /// Distance from the center to the farthest point of the pad
    pub fn radius(&self) -> i32 {
        let (hx, hy) = self.half_extents();
        let (hx, hy) = (hx as f64, hy as f64);
        let r = match self.shape {
            PadShape::None => 0.0,
            PadShape::Round | PadShape::Oval => hx.max(hy),
            PadShape::RRect => {
                let r = (self.r as f64).min(hx).min(hy).max(0.0);
                (hx - r).hypot(hy - r) + r
            }
            PadShape::Square | PadShape::Rect | PadShape::Octagon => hx.hypot(hy),
        };
        round_nm(r)
    }

    fn elements(&self) -> Vec<Element> {
        let c = to_vec2(self.center());
        let (hx, hy) = self.half_extents();
        let (hx, hy) = (hx as f64, hy as f64);
        match self.shape {
            PadShape::None => Vec::new(),
            PadShape::Round => vec![Element::Circle { c, r: self.w as f64 / 2.0 }],
            PadShape::Square | PadShape::Rect => vec![rect(c, hx, hy)],
            PadShape::RRect => {
                let r = (self.r as f64).min(hx).min(hy).max(0.0);
                let (ix, iy) = (hx - r, hy - r);
                let mut els = vec![rect(c, hx, iy), rect(c, ix, hy)];
                for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                    els.push(Element::Circle { c: [c[0] + sx * ix, c[1] + sy * iy], r });
                }
                els
            }
            PadShape::Oval => {
                if hx >= hy {
                    let d = hx - hy;
                    vec![
                        rect(c, d, hy),
                        Element::Circle { c: [c[0] - d, c[1]], r: hy },
                        Element::Circle { c: [c[0] + d, c[1]], r: hy },
                    ]
                } else {
                    let d = hy - hx;
                    vec![
                        rect(c, hx, d),
                        Element::Circle { c: [c[0], c[1] - d], r: hx },
                        Element::Circle { c: [c[0], c[1] + d], r: hx },
                    ]
                }
            }
            PadShape::Octagon => {
                // Width is across flats
                let rv = hx / (PI_8).cos();
                let pts = (0..8)
                    .map(|k| {
                        let t = PI_8 + k as f64 * std::f64::consts::FRAC_PI_4;
                        [c[0] + rv * t.cos(), c[1] + rv * t.sin()]
                    })
                    .collect();
                vec![Element::Poly(pts)]
            }
        }
    }
}

const PI_8: f64 = std::f64::consts::PI / 8.0;

#[derive(Clone, Debug)]
enum Element {
    Circle { c: Vec2, r: f64 },
    Poly(Vec<Vec2>),
}

fn rect(c: Vec2, hx: f64, hy: f64) -> Element {
    Element::Poly(vec![
        [c[0] - hx, c[1] - hy],
        [c[0] + hx, c[1] - hy],
        [c[0] + hx, c[1] + hy],
        [c[0] - hx, c[1] + hy],
    ])
}

fn edges(pts: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    (0..pts.len()).map(move |i| (pts[i], pts[(i + 1) % pts.len()]))
}

/// Point inside (or on) a convex polygon of either winding
fn inside_convex(p: Vec2, pts: &[Vec2]) -> bool {
    if pts.len() < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for (a, b) in edges(pts) {
        let cr = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
        if cr != 0.0 {
            if sign != 0.0 && cr.signum() != sign {
                return false;
            }
            sign = cr.signum();
        }
    }
    true
}

fn point_poly_distance(p: Vec2, pts: &[Vec2]) -> f64 {
    if inside_convex(p, pts) {
        return 0.0;
    }
    edges(pts)
        .map(|(a, b)| point_segment_distance(p, a, b).0)
        .fold(f64::MAX, f64::min)
}

/// Distance from a segment to an element, ignoring any width
fn segment_element_distance(a: Vec2, b: Vec2, el: &Element) -> f64 {
    match el {
        Element::Circle { c, r } => (point_segment_distance(*c, a, b).0 - r).max(0.0),
        Element::Poly(pts) => {
            if inside_convex(a, pts) || edges(pts).any(|(p, q)| segments_intersect(a, b, p, q).is_some()) {
                return 0.0;
            }
            edges(pts)
                .map(|(p, q)| segment_distance(a, b, p, q).0)
                .fold(f64::MAX, f64::min)
        }
    }
}

fn element_distance(e1: &Element, e2: &Element) -> f64 {
    match (e1, e2) {
        (Element::Circle { c: c1, r: r1 }, Element::Circle { c: c2, r: r2 }) => {
            (super::distance::distance(*c1, *c2) - r1 - r2).max(0.0)
        }
        (Element::Circle { c, r }, Element::Poly(pts)) | (Element::Poly(pts), Element::Circle { c, r }) => {
            (point_poly_distance(*c, pts) - r).max(0.0)
        }
        (Element::Poly(p1), Element::Poly(p2)) => {
            if p1.iter().any(|p| inside_convex(*p, p2)) || p2.iter().any(|p| inside_convex(*p, p1)) {
                return 0.0;
            }
            edges(p1)
                .map(|(a, b)| segment_element_distance(a, b, e2))
                .fold(f64::MAX, f64::min)
        }
    }
}

/// Copper-to-copper clearance between two pads; `i32::MAX` when either has no copper
pub fn pad_clearance(a: &PadGeom, b: &PadGeom) -> i32 {
    let (ea, eb) = (a.elements(), b.elements());
    let mut best = f64::MAX;
    for e1 in &ea {
        for e2 in &eb {
            best = best.min(element_distance(e1, e2));
        }
    }
    if best == f64::MAX {
        i32::MAX
    } else {
        round_nm(best)
    }
}

/// Clearance from a trace segment of width `width` to a pad
pub fn segment_pad_clearance(a: [i32; 2], b: [i32; 2], width: i32, pad: &PadGeom) -> i32 {
    polyline_pad_clearance(&[to_vec2(a), to_vec2(b)], width, pad)
}

/// Clearance from a polyline (a flattened board edge or area side) of
/// width `width` to a pad
pub fn polyline_pad_clearance(pts: &[Vec2], width: i32, pad: &PadGeom) -> i32 {
    let els = pad.elements();
    if els.is_empty() {
        return i32::MAX;
    }
    let half = width as f64 / 2.0;
    let mut best = f64::MAX;
    for w in pts.windows(2) {
        for el in &els {
            best = best.min((segment_element_distance(w[0], w[1], el) - half).max(0.0));
        }
    }
    if best == f64::MAX {
        i32::MAX
    } else {
        round_nm(best)
    }
}

/// Clearance between two polylines with widths, and the point of closest approach
pub fn polyline_clearance(a: &[Vec2], wa: i32, b: &[Vec2], wb: i32) -> (i32, [i32; 2]) {
    let (d, p) = super::distance::polyline_distance(a, b);
    if d == f64::MAX {
        return (i32::MAX, [0, 0]);
    }
    let gap = (d - wa as f64 / 2.0 - wb as f64 / 2.0).max(0.0);
    (round_nm(gap), to_grid(p))
}

/// Clearance between two trace segments with widths, and the point of closest approach
pub fn segment_clearance(a1: [i32; 2], a2: [i32; 2], wa: i32, b1: [i32; 2], b2: [i32; 2], wb: i32) -> (i32, [i32; 2]) {
    polyline_clearance(&[to_vec2(a1), to_vec2(a2)], wa, &[to_vec2(b1), to_vec2(b2)], wb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(shape: PadShape, x: i32, y: i32, w: i32, l: i32, angle: i32) -> PadGeom {
        PadGeom { shape, x, y, w, l, r: 0, angle }
    }

    #[test]
    fn test_pad_radius() {
        assert_eq!(pad(PadShape::Round, 0, 0, 600, 0, 0).radius(), 300);
        assert_eq!(pad(PadShape::Rect, 0, 0, 600, 800, 90).radius(), 500, "3-4-5 corner");
        assert_eq!(pad(PadShape::Oval, 0, 0, 200, 800, 0).radius(), 400);
        assert_eq!(pad(PadShape::None, 0, 0, 0, 0, 0).radius(), 0);
    }

    #[test]
    fn test_round_round_clearance() {
        let a = PadGeom::round(0, 0, 60);
        let b = PadGeom::round(100, 0, 60);
        assert_eq!(pad_clearance(&a, &b), 40);
    }

    #[test]
    fn test_overlapping_pads_are_zero() {
        let a = pad(PadShape::Rect, 0, 0, 40, 100, 0);
        let b = PadGeom::round(60, 0, 40);
        assert_eq!(pad_clearance(&a, &b), 0);
    }

    #[test]
    fn test_rect_rotation_swaps_extents() {
        let a = pad(PadShape::Rect, 0, 0, 20, 100, 90);
        assert_eq!(a.half_extents(), (10, 50));
        let b = pad(PadShape::Square, 50, 0, 20, 20, 0);
        // Rotated rect spans x in [-10, 10], square spans [40, 60]
        assert_eq!(pad_clearance(&a, &b), 30);
    }

    #[test]
    fn test_oval_end_is_round() {
        let oval = pad(PadShape::Oval, 0, 0, 20, 60, 0);
        let probe = PadGeom::round(0, 40, 20);
        // Oval top edge at y=10, probe bottom at y=30
        assert_eq!(pad_clearance(&oval, &probe), 20);
        let end_probe = PadGeom::round(50, 0, 20);
        // Oval right cap reaches x=30, probe left at x=40
        assert_eq!(pad_clearance(&oval, &end_probe), 10);
    }

    #[test]
    fn test_octagon_across_flats() {
        let oct = pad(PadShape::Octagon, 0, 0, 100, 100, 0);
        let probe = PadGeom::round(80, 0, 20);
        assert_eq!(pad_clearance(&oct, &probe), 20);
    }

    #[test]
    fn test_rrect_corner_is_rounded() {
        let rr = PadGeom { shape: PadShape::RRect, x: 0, y: 0, w: 100, l: 100, r: 20, angle: 0 };
        let sq = pad(PadShape::Square, 0, 0, 100, 100, 0);
        let probe = PadGeom::round(70, 70, 2);
        assert!(pad_clearance(&rr, &probe) > pad_clearance(&sq, &probe));
    }

    #[test]
    fn test_segment_pad_clearance_subtracts_half_width() {
        let p = PadGeom::round(0, 100, 40);
        assert_eq!(segment_pad_clearance([-100, 0], [100, 0], 20, &p), 70);
        assert_eq!(segment_pad_clearance([-100, 0], [100, 0], 20, &PadGeom::round(0, 0, 0)), i32::MAX);
    }

    #[test]
    fn test_segment_clearance_crossing() {
        let (d, p) = segment_clearance([0, 0], [100, 100], 10, [0, 100], [100, 0], 10);
        assert_eq!(d, 0);
        assert_eq!(p, [50, 50]);
    }
}
