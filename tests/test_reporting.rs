use std::fs;

use sps_supercycles::{
    load_facility,
    reporting::{
        csv_export::write_csv_file,
        latex_export::{LatexOptions, write_latex_file},
        tables::{cycles_table, schedule_table, supercycles_table},
    },
};

const FACILITY_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/test_facility_01.json");

#[test]
fn test_cycles_table_export() {
    let facility = load_facility(FACILITY_FILE).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycles_SPS.csv");

    let table = cycles_table(&facility, "SPS").unwrap();
    write_csv_file(&table, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], ";Length [s];BPs;Power [MW];Color");
    assert_eq!(lines[1], "SFTPRO;10.8;9;52.83;#1f77b4");
    assert_eq!(lines[4], "Zero;1.2;1;1.20;-");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_scenario_tables_export() {
    let facility = load_facility(FACILITY_FILE).unwrap();
    let scenario = facility.scenario("Test").unwrap();
    let summary = scenario.calculate_number_of_cycles().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let membership = supercycles_table(scenario).unwrap();
    assert_eq!(membership.cell("MD", "SFTPRO"), Some("-"));
    assert_eq!(membership.cell("Physics", "Length [s]"), Some("21.6"));

    let path = dir.path().join("supercycles.tex");
    let options = LatexOptions { column_format: "l|ccc|cc".to_string(), rotate_columns: true, drop_columns_if_empty: false };
    write_latex_file(&membership, &path, &options).unwrap();

    let latex = fs::read_to_string(&path).unwrap();
    assert!(latex.starts_with("\\begin{tabular}{l|ccc|cc}\n"));
    assert!(latex.contains("\\rot{MD parallel}"));
    assert!(latex.contains("Physics & 1 & 1 & 1 & 21.6 &"));

    let schedule = schedule_table(&summary).unwrap();
    assert_eq!(schedule.cell("Total", "Scheduled [hours]"), Some("162.0"));
    assert_eq!(schedule.cell("Physics", "Super-cycle percentage [%]"), Some("66.67"));
}
