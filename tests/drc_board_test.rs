// Full DRC runs over the JSON board fixture
use pcb_drc::{load_board, run_drc, DesignRules, DrcErrorKind, DrcSettings, Units};
use std::path::Path;
use std::time::Instant;

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "tests/fixtures/two_layer_demo.json";

    /// Load the fixture and run every phase with default rules
    #[test]
    fn test_two_layer_demo_report() {
        let board = load_board(Path::new(FIXTURE));
        assert!(board.is_ok(), "Failed to load board: {:?}", board.err());
        let board = board.unwrap();
        assert_eq!(board.parts.len(), 3);
        assert_eq!(board.nets.len(), 2);

        let start = Instant::now();
        let report = run_drc(&board, &DesignRules::default(), &DrcSettings::default());
        println!("DRC time: {:.3}ms", start.elapsed().as_secs_f64() * 1000.0);
        for line in &report.log {
            println!("{}", line);
        }

        assert!(report.malformed.is_empty(), "malformed: {:?}", report.malformed);
        assert!(!report.cancelled && !report.truncated);
        assert_eq!(report.count(DrcErrorKind::PadholePadhole), 1, "J1/J2 holes are 20 mil apart");
        assert_eq!(report.count(DrcErrorKind::PadPadhole), 1, "J1 pad reaches into J2 hole clearance");
        assert_eq!(report.count(DrcErrorKind::TraceWidth), 2, "both VCC segments are 6 mil");
        assert_eq!(report.count(DrcErrorKind::Unrouted), 1, "GND is a rat line");
        assert_eq!(report.errors.len(), 5, "errors: {:#?}", report.errors);
    }

    #[test]
    fn test_log_layout() {
        let board = load_board(Path::new(FIXTURE)).unwrap();
        let report = run_drc(&board, &DesignRules::default(), &DrcSettings::default());

        assert_eq!(report.log[0], "Checking parts:");
        assert!(
            report.log[1].starts_with("1: J1.1 pad hole to J2.1 pad hole = 20 mil"),
            "log[1]: {}",
            report.log[1]
        );
        assert!(
            report.log[2].starts_with("2: J2.1 pad hole to J1.1 pad = 5 mil"),
            "log[2]: {}",
            report.log[2]
        );
        for header in ["Checking nets and parts:", "Checking nets:", "Checking unrouted connections:"] {
            let at = report.log.iter().position(|l| l == header);
            assert!(at.is_some(), "missing header {}", header);
            assert_eq!(report.log[at.unwrap() - 1], "", "blank line before {}", header);
        }
        assert!(
            report.log.iter().any(|l| l == "5: \"GND\": unrouted connection from J1.1 to R1.1"),
            "log: {:#?}",
            report.log
        );
        assert_eq!(report.log.last().map(String::as_str), Some("***** DONE: 5 ERROR(S) *****"));
    }

    /// Numbering is 1..=n and identical between serial and parallel runs
    #[test]
    fn test_sequence_stable_across_modes() {
        let board = load_board(Path::new(FIXTURE)).unwrap();
        let rules = DesignRules::default();
        let serial = run_drc(&board, &rules, &DrcSettings { parallel: false, ..Default::default() });
        let parallel = run_drc(&board, &rules, &DrcSettings { parallel: true, ..Default::default() });

        for (i, err) in serial.errors.iter().enumerate() {
            assert_eq!(err.seq, i + 1, "sequence gap at {}", i);
        }
        assert_eq!(serial.errors, parallel.errors);
        assert_eq!(serial.log, parallel.log);

        let again = run_drc(&board, &rules, &DrcSettings::default());
        assert_eq!(again.errors, parallel.errors, "reruns must not change the result");
    }

    #[test]
    fn test_mm_units_in_messages() {
        let board = load_board(Path::new(FIXTURE)).unwrap();
        let settings = DrcSettings { units: Units::Mm, ..Default::default() };
        let report = run_drc(&board, &DesignRules::default(), &settings);
        let width = report.of_kind(DrcErrorKind::TraceWidth).next().unwrap();
        assert!(width.message.contains("trace width = 0.152 mm"), "message: {}", width.message);
    }

    #[test]
    fn test_error_capacity_truncates() {
        let board = load_board(Path::new(FIXTURE)).unwrap();
        let settings = DrcSettings { error_capacity: Some(3), ..Default::default() };
        let report = run_drc(&board, &DesignRules::default(), &settings);
        assert_eq!(report.errors.len(), 3);
        assert!(report.truncated);
        assert_eq!(report.dropped_overflow, 2);
        assert_eq!(report.log.iter().filter(|l| l.starts_with("(not recorded)")).count(), 2);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let board = load_board(Path::new(FIXTURE)).unwrap();
        let report = run_drc(&board, &DesignRules::default(), &DrcSettings::default());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["errors"][0]["kind"], "PADHOLE_PADHOLE");
        assert_eq!(value["errors"][0]["location_a"]["type"], "pad");
        assert_eq!(value["errors"][4]["kind"], "UNROUTED");
    }
}
