use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use sps_supercycles::domain::facility::Facility;
use sps_supercycles::domain::scenario::{Scenario, ScenarioSummary};
use sps_supercycles::error::Result;
use sps_supercycles::reporting::csv_export::write_csv_file;
use sps_supercycles::reporting::latex_export::{LatexOptions, write_latex_file};
use sps_supercycles::reporting::table::Table;
use sps_supercycles::reporting::tables::{cycle_tally_table, cycles_table, schedule_table, supercycles_table};
use sps_supercycles::{load_facility, logger};

/// Evaluates a supercycle scenario of the injector complex.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Facility description (JSON).
    #[arg(short, long, default_value = "data/facility.json")]
    facility: String,

    /// Scenario to evaluate.
    #[arg(short, long, default_value = "Protons only")]
    scenario: String,

    /// Also derive the supercycles of this upstream accelerator.
    #[arg(long)]
    upstream: Option<String>,

    /// Directory to write the report tables to, as CSV and LaTeX.
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let facility = load_facility(&args.facility)?;
    let scenario = facility.scenario(&args.scenario)?;
    let summary = scenario.calculate_number_of_cycles()?;

    println!("Scenario: {} (availability {:.2})", summary.scenario, summary.machine_availability);
    for outcome in &summary.outcomes {
        let allocation = &outcome.allocation;
        println!(
            "  {:<28} {:>8.1} h -> {:>10.0} supercycles, {:>10.0} free BPs",
            allocation.supercycle.as_str(),
            allocation.allocated_hours,
            allocation.number_of_supercycles_played,
            outcome.free_capacity.free_bps_total.unwrap_or(f64::NAN)
        );
    }
    println!("Allocated BPs: {:.0}", summary.total_allocated_bps);
    println!("Free BPs:      {:.0}", summary.total_free_bps);
    match summary.free_bps_percentage {
        Some(percentage) => println!("Free BPs [%]:  {:.2}", percentage),
        None => println!("Free BPs [%]:  n/a"),
    }
    println!("Energy [GWh]:  {:.1}", summary.total_energy_gwh());

    if let Some(upstream) = &args.upstream {
        for supercycle in facility.coupled_supercycles(&args.scenario, upstream)? {
            let names: Vec<&str> = supercycle.cycle_names().iter().map(|n| n.as_str()).collect();
            println!("{} {}: {}", upstream, supercycle.name(), names.join(", "));
        }
    }

    if let Some(dir) = &args.report_dir {
        write_reports(&facility, scenario, &summary, dir)?;
    }

    Ok(())
}

fn write_reports(facility: &Facility, scenario: &Scenario, summary: &ScenarioSummary, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut tables: Vec<(String, Table, LatexOptions)> = Vec::new();
    for accelerator in facility.accelerators() {
        let mut table = cycles_table(facility, accelerator.name.as_str())?;
        table.drop_empty_columns();
        let options = LatexOptions::new(format!("l{}", "c".repeat(table.columns().len())));
        tables.push((format!("cycles_{}", accelerator.name), table, options));
    }

    let membership = supercycles_table(scenario)?;
    let membership_format = format!("l|{}|cc", "c".repeat(membership.columns().len().saturating_sub(2)));
    tables.push(("supercycles".to_string(), membership, LatexOptions { column_format: membership_format, rotate_columns: true, drop_columns_if_empty: false }));
    tables.push(("schedule".to_string(), schedule_table(summary)?, LatexOptions::new("lccc")));
    tables.push(("cycle_tally".to_string(), cycle_tally_table(summary)?, LatexOptions::new("lccc")));

    for (name, table, options) in &tables {
        let stem = name.replace(' ', "_");
        write_csv_file(table, &dir.join(format!("{}.csv", stem)))?;
        write_latex_file(table, &dir.join(format!("{}.tex", stem)), options)?;
    }
    Ok(())
}
