//! Distance calculation algorithms for DRC
//!
//! Contains point, segment and polyline distance calculations. All math is
//! done in `f64` on board coordinates (nanometres).

pub type Vec2 = [f64; 2];

/// Convert an integer board point to floating point
pub fn to_vec2(p: [i32; 2]) -> Vec2 {
    [p[0] as f64, p[1] as f64]
}

/// Round a floating point location back onto the board grid
pub fn to_grid(p: Vec2) -> [i32; 2] {
    [round_nm(p[0]), round_nm(p[1])]
}

/// Round a floating point distance to whole nanometres, saturating at the i32 range
pub fn round_nm(v: f64) -> i32 {
    v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Euclidean distance between two points
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Integer point distance, as used for hole-to-hole tests
pub fn point_distance(a: [i32; 2], b: [i32; 2]) -> f64 {
    distance(to_vec2(a), to_vec2(b))
}

/// Midpoint of two points
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}

/// Point-to-segment minimum distance
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> (f64, Vec2) {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let ab_len2 = ab[0] * ab[0] + ab[1] * ab[1];

    if ab_len2 < 1e-10 {
        // Degenerate segment
        return (distance(p, a), a);
    }

    let t = ((ap[0] * ab[0] + ap[1] * ab[1]) / ab_len2).clamp(0.0, 1.0);
    let closest = [a[0] + t * ab[0], a[1] + t * ab[1]];

    (distance(p, closest), closest)
}

fn cross(o: Vec2, a: Vec2, b: Vec2) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn within_box(p: Vec2, q: Vec2, r: Vec2) -> bool {
    r[0] >= p[0].min(q[0]) && r[0] <= p[0].max(q[0]) && r[1] >= p[1].min(q[1]) && r[1] <= p[1].max(q[1])
}

/// Intersection point of two segments, if they touch or cross
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    let straddles_b = (d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0);
    let straddles_a = (d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0);
    if straddles_a && straddles_b {
        let t = d1 / (d1 - d2);
        return Some([a1[0] + t * (a2[0] - a1[0]), a1[1] + t * (a2[1] - a1[1])]);
    }

    // Touching or collinear overlap
    if d1 == 0.0 && within_box(b1, b2, a1) {
        return Some(a1);
    }
    if d2 == 0.0 && within_box(b1, b2, a2) {
        return Some(a2);
    }
    if d3 == 0.0 && within_box(a1, a2, b1) {
        return Some(b1);
    }
    if d4 == 0.0 && within_box(a1, a2, b2) {
        return Some(b2);
    }
    None
}

/// Segment-to-segment minimum distance
///
/// Returns the distance and a representative closest point (the crossing
/// point when the segments intersect, otherwise the midpoint of the closest
/// approach).
pub fn segment_distance(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> (f64, Vec2) {
    if let Some(p) = segments_intersect(a1, a2, b1, b2) {
        return (0.0, p);
    }

    let mut min_d = f64::MAX;
    let mut closest = [0.0f64; 2];

    for (p, s1, s2) in [(a1, b1, b2), (a2, b1, b2), (b1, a1, a2), (b2, a1, a2)] {
        let (d, q) = point_segment_distance(p, s1, s2);
        if d < min_d {
            min_d = d;
            closest = midpoint(p, q);
        }
    }

    (min_d, closest)
}

/// Minimum distance between two polylines (flattened sides)
pub fn polyline_distance(a: &[Vec2], b: &[Vec2]) -> (f64, Vec2) {
    let mut best = (f64::MAX, [0.0, 0.0]);
    for pa in a.windows(2) {
        for pb in b.windows(2) {
            let (d, p) = segment_distance(pa[0], pa[1], pb[0], pb[1]);
            if d < best.0 {
                best = (d, p);
            }
        }
    }
    best
}
