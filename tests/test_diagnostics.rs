use log::Level;
use logtest::Logger;
use sps_supercycles::{evaluate_scenario, load_facility};

const FACILITY_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/test_facility_01.json");

// Single test: the log capture is process wide.
#[test]
fn test_warnings_are_logged() {
    let mut logger = Logger::start();

    let facility = load_facility(FACILITY_FILE).unwrap();
    let physics = facility.supercycle("Physics").unwrap();

    let free_capacity = physics.calculate_free_bps(None);
    assert_eq!(free_capacity.free_bps_per_supercycle, 16);
    assert_eq!(free_capacity.free_bps_total, None);
    assert!(free_capacity.total().is_err());

    let summary = evaluate_scenario(FACILITY_FILE, "Idle").unwrap();
    assert_eq!(summary.free_bps_percentage, None);

    let mut warnings = Vec::new();
    while let Some(record) = logger.pop() {
        if record.level() == Level::Warn {
            warnings.push(record.args().to_string());
        }
    }

    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().any(|w| w.contains("Physics") && w.contains("call allocate_hours first")));
    assert!(warnings.iter().any(|w| w.contains("Idle") && w.contains("free BP percentage is undefined")));
}
