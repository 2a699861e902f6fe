//! Result of a DRC run and the recorder that builds it

use serde::Serialize;

use crate::error::ModelError;

use super::sink::{DrErrorList, SinkResult};
use super::types::{DrcError, DrcErrorKind};

#[derive(Clone, Debug, Default, Serialize)]
pub struct DrcReport {
    pub errors: Vec<DrcError>,
    /// User-facing text log, one line per reported error plus phase headers
    pub log: Vec<String>,
    pub malformed: Vec<ModelError>,
    pub dropped_duplicates: usize,
    pub dropped_overflow: usize,
    pub truncated: bool,
    pub cancelled: bool,
    pub skipped_curved_sides: usize,
    pub elapsed_ms: f64,
}

impl DrcReport {
    pub fn of_kind(&self, kind: DrcErrorKind) -> impl Iterator<Item = &DrcError> + '_ {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn count(&self, kind: DrcErrorKind) -> usize {
        self.of_kind(kind).count()
    }
}

/// Feeds checker output through the error sink and keeps the text log
pub(crate) struct Recorder {
    list: DrErrorList,
    log: Vec<String>,
}

impl Recorder {
    pub fn new(capacity: Option<usize>) -> Self {
        Self { list: DrErrorList::new(capacity), log: Vec::new() }
    }

    pub fn header(&mut self, line: &str) {
        if !self.log.is_empty() {
            self.log.push(String::new());
        }
        self.log.push(line.to_string());
    }

    pub fn record_all(&mut self, errors: Vec<DrcError>) {
        for err in errors {
            match self.list.add(err) {
                (SinkResult::Accepted(_), err) => self.log.push(err.log_line()),
                (SinkResult::Full, err) => self.log.push(format!("(not recorded): {}", err.message)),
                (SinkResult::Duplicate, _) => {}
            }
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn finish(mut self, cancelled: bool) -> DrcReport {
        self.log.push(String::new());
        if cancelled {
            self.log.push(format!("***** CANCELLED: {} ERROR(S) *****", self.list.len()));
        } else {
            self.log.push(format!("***** DONE: {} ERROR(S) *****", self.list.len()));
        }
        DrcReport {
            dropped_duplicates: self.list.dropped_duplicates,
            dropped_overflow: self.list.dropped_overflow,
            truncated: self.list.truncated(),
            errors: self.list.into_errors(),
            log: self.log,
            cancelled,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NetId;
    use crate::drc::types::Location;

    fn unrouted(ic: usize) -> DrcError {
        DrcError::new(
            DrcErrorKind::Unrouted,
            format!("\"N\": unrouted connection {}", ic),
            "N",
            Location::Connection { net: NetId(0), connection: ic },
            [0, 0],
        )
    }

    #[test]
    fn test_log_lines_follow_sequence() {
        let mut rec = Recorder::new(Some(2));
        rec.header("Checking nets:");
        rec.record_all(vec![unrouted(0), unrouted(0), unrouted(1), unrouted(2)]);
        let report = rec.finish(false);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.dropped_duplicates, 1);
        assert_eq!(report.dropped_overflow, 1);
        assert!(report.truncated);
        assert_eq!(report.log[1], "1: \"N\": unrouted connection 0");
        assert_eq!(report.log[2], "2: \"N\": unrouted connection 1");
        assert!(report.log[3].starts_with("(not recorded)"), "log: {:?}", report.log);
        assert_eq!(report.log.last().map(String::as_str), Some("***** DONE: 2 ERROR(S) *****"));
    }
}
