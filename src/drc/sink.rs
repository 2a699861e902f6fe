//! Error sink: numbers, deduplicates and bounds the recorded violations

use std::collections::HashSet;

use super::types::{DrcError, DrcErrorKind, Location};

/// Outcome of adding a violation to the sink
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum SinkResult {
    /// Recorded with this sequence number
    Accepted(usize),
    /// Identical to an entry already recorded
    Duplicate,
    /// Capacity reached
    Full,
}

type DedupKey = (DrcErrorKind, Location, Location, [i32; 2], [i32; 2], Option<usize>);

fn dedup_key(err: &DrcError) -> DedupKey {
    (err.kind, err.location_a, err.location_b, err.point_a, err.point_b, err.layer)
}

#[derive(Debug, Default)]
pub struct DrErrorList {
    errors: Vec<DrcError>,
    seen: HashSet<DedupKey>,
    capacity: Option<usize>,
    pub dropped_duplicates: usize,
    pub dropped_overflow: usize,
}

impl DrErrorList {
    pub fn new(capacity: Option<usize>) -> Self {
        Self { capacity, ..Default::default() }
    }

    /// Record a violation, assigning the next sequence number
    pub fn add(&mut self, mut err: DrcError) -> (SinkResult, DrcError) {
        let key = dedup_key(&err);
        if self.seen.contains(&key) {
            self.dropped_duplicates += 1;
            return (SinkResult::Duplicate, err);
        }
        if self.capacity.is_some_and(|cap| self.errors.len() >= cap) {
            self.dropped_overflow += 1;
            return (SinkResult::Full, err);
        }
        err.seq = self.errors.len();
        self.seen.insert(key);
        self.errors.push(err.clone());
        (SinkResult::Accepted(err.seq), err)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[DrcError] {
        &self.errors
    }

    pub fn truncated(&self) -> bool {
        self.dropped_overflow > 0
    }

    pub fn into_errors(self) -> Vec<DrcError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PartId;

    fn pad_err(x: i32) -> DrcError {
        DrcError::new(
            DrcErrorKind::BoardEdgePad,
            format!("R1.1 pad to board edge, x={}", x),
            "R1",
            Location::Pad { part: PartId(0), pin: 0 },
            [x, 0],
        )
    }

    #[test]
    fn test_sequence_numbers() {
        let mut list = DrErrorList::new(None);
        for i in 0..3 {
            let (res, err) = list.add(pad_err(i));
            assert_eq!(res, SinkResult::Accepted(i as usize));
            assert_eq!(err.seq, i as usize);
        }
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut list = DrErrorList::new(None);
        assert_eq!(list.add(pad_err(5)).0, SinkResult::Accepted(0));
        assert_eq!(list.add(pad_err(5)).0, SinkResult::Duplicate);
        assert_eq!(list.len(), 1);
        assert_eq!(list.dropped_duplicates, 1);
        assert_eq!(list.add(pad_err(6)).0, SinkResult::Accepted(1), "numbering continues after a duplicate");
    }

    #[test]
    fn test_capacity() {
        let mut list = DrErrorList::new(Some(2));
        let _ = list.add(pad_err(0));
        let _ = list.add(pad_err(1));
        assert_eq!(list.add(pad_err(2)).0, SinkResult::Full);
        assert_eq!(list.len(), 2);
        assert!(list.truncated());
    }
}
