use crate::domain::facility::Facility;
use crate::domain::scenario::{Scenario, ScenarioSummary};
use crate::error::Result;
use crate::reporting::table::{EMPTY_CELL, Table};

/// Catalog of one accelerator: length, BPs, power and plot color per cycle.
pub fn cycles_table(facility: &Facility, accelerator: &str) -> Result<Table> {
    let mut table = Table::new(["Length [s]", "BPs", "Power [MW]", "Color"]);

    for (id, cycle) in facility.catalog().cycles_of(accelerator) {
        table.push_row(
            id,
            vec![
                format!("{:.1}", cycle.length()),
                cycle.bps().to_string(),
                format!("{:.2}", cycle.power()),
                facility.color_of(cycle.name().as_str()).unwrap_or(EMPTY_CELL).to_string(),
            ],
        )?;
    }
    Ok(table)
}

/// Which cycles each supercycle of `scenario` plays, with its length and power.
pub fn supercycles_table(scenario: &Scenario) -> Result<Table> {
    let cycle_names: Vec<String> = scenario.cycle_universe().into_iter().map(String::from).collect();

    let mut columns = cycle_names.clone();
    columns.extend(["Length [s]".to_string(), "Power [MW]".to_string()]);
    let mut table = Table::new(columns);

    for scheduled in scenario.supercycles() {
        let supercycle = &scheduled.supercycle;
        let mut values: Vec<String> =
            cycle_names.iter().map(|name| if supercycle.contains(name) { supercycle.multiplicity(name).to_string() } else { EMPTY_CELL.to_string() }).collect();
        values.push(format!("{:.1}", supercycle.length()));
        values.push(format!("{:.2}", supercycle.average_power()));

        table.push_row(supercycle.name().as_str(), values)?;
    }
    Ok(table)
}

/// Scheduled and effective hours per supercycle, with a `Total` row.
pub fn schedule_table(summary: &ScenarioSummary) -> Result<Table> {
    let mut table = Table::new(["Scheduled [hours]", "Effective [hours]", "Super-cycle percentage [%]"]);

    let share = |hours: f64| {
        if summary.total_scheduled_hours > 0.0 { format!("{:.2}", hours / summary.total_scheduled_hours * 100.0) } else { EMPTY_CELL.to_string() }
    };

    for outcome in &summary.outcomes {
        let allocation = &outcome.allocation;
        table.push_row(
            allocation.supercycle.as_str(),
            vec![format!("{:.1}", allocation.scheduled_hours), format!("{:.2}", allocation.allocated_hours), share(allocation.scheduled_hours)],
        )?;
    }

    table.push_row(
        "Total",
        vec![format!("{:.1}", summary.total_scheduled_hours), format!("{:.2}", summary.total_effective_hours), share(summary.total_scheduled_hours)],
    )?;
    Ok(table)
}

/// Plays, time and energy per cycle name over the whole scenario.
pub fn cycle_tally_table(summary: &ScenarioSummary) -> Result<Table> {
    let mut table = Table::new(["Played", "Time [h]", "Energy [MWh]"]);

    for (cycle, played) in &summary.number_of_cycles_played {
        let time = summary.time_sharing_of_cycles.get(cycle).copied().unwrap_or(0.0);
        let energy = summary.energy_of_cycles.get(cycle).copied().unwrap_or(0.0);
        table.push_row(cycle.as_str(), vec![format!("{:.0}", played), format!("{:.1}", time / 3600.0), format!("{:.1}", energy)])?;
    }
    Ok(table)
}
