//! Polygons with straight and quarter-ellipse sides
//!
//! Used for board outlines and copper areas. A polygon has one or more
//! closed contours; side `i` of a contour runs from corner `i` to corner
//! `i + 1` (wrapping) and takes its style from corner `i`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::bbox::BBox;
use super::distance::{to_vec2, Vec2};

/// Number of chords used to flatten one quarter-ellipse side
pub const ARC_STEPS: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideStyle {
    #[default]
    Straight,
    ArcCw,
    ArcCcw,
}

impl SideStyle {
    pub fn is_arc(&self) -> bool {
        !matches!(self, SideStyle::Straight)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corner {
    pub x: i32,
    pub y: i32,
    /// Style of the side leaving this corner
    #[serde(default)]
    pub side: SideStyle,
}

impl Corner {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, side: SideStyle::Straight }
    }

    pub fn arc(x: i32, y: i32, side: SideStyle) -> Self {
        Self { x, y, side }
    }

    pub fn point(&self) -> [i32; 2] {
        [self.x, self.y]
    }
}

/// One side of a polygon, with its global index across contours
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Side {
    pub index: usize,
    pub contour: usize,
    pub start: [i32; 2],
    pub end: [i32; 2],
    pub style: SideStyle,
}

impl Side {
    /// Side as a polyline; arcs are flattened into `ARC_STEPS` chords
    pub fn flatten(&self) -> Vec<Vec2> {
        let p1 = to_vec2(self.start);
        let p2 = to_vec2(self.end);
        if !self.style.is_arc() || self.start[0] == self.end[0] || self.start[1] == self.end[1] {
            return vec![p1, p2];
        }

        let center = arc_center(p1, p2, self.style);
        let rx = (p1[0] - p2[0]).abs();
        let ry = (p1[1] - p2[1]).abs();
        let t1 = ((p1[1] - center[1]) / ry).atan2((p1[0] - center[0]) / rx);
        let t2 = ((p2[1] - center[1]) / ry).atan2((p2[0] - center[0]) / rx);
        let mut sweep = t2 - t1;
        if self.style == SideStyle::ArcCw && sweep > 0.0 {
            sweep -= 2.0 * PI;
        } else if self.style == SideStyle::ArcCcw && sweep < 0.0 {
            sweep += 2.0 * PI;
        }

        let mut pts = Vec::with_capacity(ARC_STEPS + 1);
        pts.push(p1);
        for k in 1..ARC_STEPS {
            let t = t1 + sweep * k as f64 / ARC_STEPS as f64;
            pts.push([center[0] + rx * t.cos(), center[1] + ry * t.sin()]);
        }
        pts.push(p2);
        pts
    }
}

/// Centre of the quarter ellipse joining `p1` to `p2` in the given direction.
/// The centre is one of the two remaining corners of the bounding rectangle.
fn arc_center(p1: Vec2, p2: Vec2, style: SideStyle) -> Vec2 {
    let turn = |c: Vec2| (p1[0] - c[0]) * (p2[1] - c[1]) - (p1[1] - c[1]) * (p2[0] - c[0]);
    let c1 = [p1[0], p2[1]];
    let c2 = [p2[0], p1[1]];
    let want_cw = style == SideStyle::ArcCw;
    if (turn(c1) < 0.0) == want_cw {
        c1
    } else {
        c2
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub contours: Vec<Vec<Corner>>,
}

impl Polygon {
    pub fn new(contours: Vec<Vec<Corner>>) -> Self {
        Self { contours }
    }

    /// Axis-aligned rectangle with straight sides
    pub fn rect(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(vec![vec![
            Corner::new(x1, y1),
            Corner::new(x2, y1),
            Corner::new(x2, y2),
            Corner::new(x1, y2),
        ]])
    }

    pub fn num_corners(&self) -> usize {
        self.contours.iter().map(|c| c.len()).sum()
    }

    /// Corners with their global index
    pub fn corners(&self) -> impl Iterator<Item = (usize, &Corner)> + '_ {
        self.contours.iter().flatten().enumerate()
    }

    pub fn sides(&self) -> impl Iterator<Item = Side> + '_ {
        let mut offset = 0;
        self.contours.iter().enumerate().flat_map(move |(ci, contour)| {
            let base = offset;
            offset += contour.len();
            let n = contour.len();
            (0..n).map(move |i| {
                let a = &contour[i];
                let b = &contour[(i + 1) % n];
                Side {
                    index: base + i,
                    contour: ci,
                    start: a.point(),
                    end: b.point(),
                    style: a.side,
                }
            })
        })
    }

    pub fn bbox(&self) -> BBox {
        let mut b = BBox::EMPTY;
        for (_, c) in self.corners() {
            b.include_point(c.x, c.y);
        }
        b
    }

    /// Even-odd point containment across all contours, arcs flattened
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let (px, py) = (x as f64, y as f64);
        let mut inside = false;
        for side in self.sides() {
            for w in side.flatten().windows(2) {
                let (a, b) = (w[0], w[1]);
                if (a[1] > py) != (b[1] > py) {
                    let xi = a[0] + (py - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
                    if px < xi {
                        inside = !inside;
                    }
                }
            }
        }
        inside
    }
}
