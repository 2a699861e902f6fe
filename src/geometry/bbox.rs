//! Bounding boxes and R-tree indexing for clearance pruning
//!
//! Boxes are kept in integer board units. The R-tree envelope is widened to
//! `i64` so that expanding a box by a clearance can never overflow.

use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

/// Axis-aligned bounding box in nanometres
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BBox {
    /// A box containing nothing; folding anything into it yields that thing
    pub const EMPTY: BBox = BBox {
        min_x: i32::MAX,
        min_y: i32::MAX,
        max_x: i32::MIN,
        max_y: i32::MIN,
    };

    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Box of the given half extents around a centre point
    pub fn around(x: i32, y: i32, half_w: i32, half_h: i32) -> Self {
        Self {
            min_x: x.saturating_sub(half_w),
            min_y: y.saturating_sub(half_h),
            max_x: x.saturating_add(half_w),
            max_y: y.saturating_add(half_h),
        }
    }

    /// Box spanning a segment, grown by a half width on every side
    pub fn of_segment(a: [i32; 2], b: [i32; 2], half_w: i32) -> Self {
        Self::new(
            a[0].min(b[0]).saturating_sub(half_w),
            a[1].min(b[1]).saturating_sub(half_w),
            a[0].max(b[0]).saturating_add(half_w),
            a[1].max(b[1]).saturating_add(half_w),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Fold another box into this one
    pub fn include(&mut self, other: BBox) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn include_point(&mut self, x: i32, y: i32) {
        self.include(BBox::new(x, y, x, y));
    }

    pub fn contains(&self, other: &BBox) -> bool {
        other.is_empty()
            || (other.min_x >= self.min_x
                && other.min_y >= self.min_y
                && other.max_x <= self.max_x
                && other.max_y <= self.max_y)
    }

    /// True when the boxes are further apart than `clearance` on some axis.
    /// Empty boxes hold no geometry and are separated from everything.
    pub fn separated_by(&self, other: &BBox, clearance: i32) -> bool {
        if self.is_empty() || other.is_empty() {
            return true;
        }
        let c = clearance as i64;
        other.min_x as i64 - self.max_x as i64 > c
            || self.min_x as i64 - other.max_x as i64 > c
            || other.min_y as i64 - self.max_y as i64 > c
            || self.min_y as i64 - other.max_y as i64 > c
    }

    /// R-tree envelope, optionally expanded by a clearance
    pub fn envelope(&self, clearance: i32) -> AABB<[i64; 2]> {
        let c = clearance as i64;
        AABB::from_corners(
            [self.min_x as i64 - c, self.min_y as i64 - c],
            [self.max_x as i64 + c, self.max_y as i64 + c],
        )
    }
}

/// Object wrapper for R-tree spatial indexing of cached boxes
#[derive(Clone, Debug)]
pub struct IndexedBox {
    pub index: usize,
    pub bounds: AABB<[i64; 2]>,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[i64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

/// Bulk-load an R-tree from `(index, box)` pairs; empty boxes are left out
pub fn build_index<I>(boxes: I) -> RTree<IndexedBox>
where
    I: IntoIterator<Item = (usize, BBox)>,
{
    let objects: Vec<IndexedBox> = boxes
        .into_iter()
        .filter(|(_, b)| !b.is_empty())
        .map(|(index, b)| IndexedBox { index, bounds: b.envelope(0) })
        .collect();
    RTree::bulk_load(objects)
}

/// Indices whose boxes come within `clearance` of `query`, in ascending order
pub fn candidates(tree: &RTree<IndexedBox>, query: &BBox, clearance: i32) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<usize> = tree
        .locate_in_envelope_intersecting(&query.envelope(clearance))
        .map(|obj| obj.index)
        .collect();
    hits.sort_unstable();
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_and_contains() {
        let mut b = BBox::EMPTY;
        assert!(b.is_empty());
        b.include(BBox::around(0, 0, 10, 5));
        b.include(BBox::around(100, 0, 10, 10));
        assert_eq!(b, BBox::new(-10, -10, 110, 10));
        assert!(b.contains(&BBox::around(50, 0, 5, 5)));
        assert!(!b.contains(&BBox::around(50, 0, 5, 50)));
    }

    #[test]
    fn test_separated_by_clearance() {
        let a = BBox::new(0, 0, 10, 10);
        let b = BBox::new(20, 0, 30, 10);
        assert!(a.separated_by(&b, 9));
        assert!(!a.separated_by(&b, 10), "gap equal to clearance is not separated");
        assert!(a.separated_by(&BBox::EMPTY, 1000));
    }

    #[test]
    fn test_candidates_sorted_and_pruned() {
        let tree = build_index(vec![
            (2, BBox::new(0, 0, 10, 10)),
            (0, BBox::new(15, 0, 25, 10)),
            (1, BBox::new(1000, 1000, 1010, 1010)),
            (3, BBox::EMPTY),
        ]);
        let hits = candidates(&tree, &BBox::new(0, 0, 10, 10), 5);
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    fn test_envelope_does_not_overflow() {
        let b = BBox::new(i32::MAX - 1, 0, i32::MAX, 1);
        let env = b.envelope(i32::MAX);
        assert!(env.upper()[0] > i32::MAX as i64);
    }
}
