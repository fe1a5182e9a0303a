use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::domain::cycle::Cycle;
use crate::domain::supercycle::{AllocationResult, FreeCapacityResult, SuperCycle};
use crate::domain::utils::ANALYTICS_TARGET;
use crate::domain::utils::id::{AcceleratorName, CycleName, ScenarioName, SuperCycleName};
use crate::error::{Error, Result};

/// A supercycle together with the hours it is scheduled for.
#[derive(Debug, Clone)]
pub struct ScheduledSuperCycle {
    pub supercycle: Arc<SuperCycle>,
    pub allocated_hours: f64,
}

/// Allocation and free capacity of one supercycle within a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct SuperCycleOutcome {
    pub allocation: AllocationResult,
    pub free_capacity: FreeCapacityResult,
}

/// Facility-wide tally of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub scenario: ScenarioName,
    pub machine_availability: f64,
    pub outcomes: Vec<SuperCycleOutcome>,
    pub total_scheduled_hours: f64,
    pub total_effective_hours: f64,
    pub total_allocated_bps: f64,
    pub total_free_bps: f64,
    /// `None` for a scenario without allocated time.
    pub free_bps_percentage: Option<f64>,
    pub number_of_cycles_played: BTreeMap<CycleName, f64>,
    pub time_sharing_of_cycles: BTreeMap<CycleName, f64>,
    /// Energy per cycle name in MWh.
    pub energy_of_cycles: BTreeMap<CycleName, f64>,
}

impl ScenarioSummary {
    pub fn outcome(&self, supercycle: &str) -> Option<&SuperCycleOutcome> {
        self.outcomes.iter().find(|o| o.allocation.supercycle.as_str() == supercycle)
    }

    /// Energy of the whole scenario in GWh.
    pub fn total_energy_gwh(&self) -> f64 {
        self.energy_of_cycles.values().sum::<f64>() * 1e-3
    }
}

/// A set of supercycles sharing one machine over an operating period.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: ScenarioName,
    supercycles: Vec<ScheduledSuperCycle>,
    machine_availability: f64,
}

impl Scenario {
    /// Creates a scenario. Supercycle names must be unique, hours non-negative and
    /// the availability within (0, 1].
    pub fn new(name: impl Into<String>, supercycles: Vec<ScheduledSuperCycle>, machine_availability: f64) -> Result<Self> {
        let name = ScenarioName::new(name);

        if !(machine_availability > 0.0 && machine_availability <= 1.0) {
            return Err(Error::ModelConstructionError(format!("scenario {}: machine availability must lie in (0, 1], got {}", name, machine_availability)));
        }

        let mut seen: HashSet<&SuperCycleName> = HashSet::new();
        for scheduled in &supercycles {
            if !seen.insert(scheduled.supercycle.name()) {
                return Err(Error::ModelConstructionError(format!("scenario {}: supercycle {} is scheduled twice", name, scheduled.supercycle.name())));
            }
            if !(scheduled.allocated_hours.is_finite() && scheduled.allocated_hours >= 0.0) {
                return Err(Error::ModelConstructionError(format!("scenario {}: supercycle {} has invalid hours {}", name, scheduled.supercycle.name(), scheduled.allocated_hours)));
            }
        }

        Ok(Scenario { name, supercycles, machine_availability })
    }

    pub fn name(&self) -> &ScenarioName {
        &self.name
    }

    pub fn machine_availability(&self) -> f64 {
        self.machine_availability
    }

    pub fn supercycles(&self) -> &[ScheduledSuperCycle] {
        &self.supercycles
    }

    pub fn allocated_hours(&self, supercycle: &str) -> Option<f64> {
        self.supercycles.iter().find(|s| s.supercycle.name().as_str() == supercycle).map(|s| s.allocated_hours)
    }

    /// Distinct cycle names played anywhere in the scenario.
    pub fn cycle_universe(&self) -> BTreeSet<CycleName> {
        self.supercycles.iter().flat_map(|s| s.supercycle.cycle_names().iter().cloned()).collect()
    }

    /// Allocates every supercycle, computes its free capacity and sums the
    /// results per cycle name over the whole scenario.
    pub fn calculate_number_of_cycles(&self) -> Result<ScenarioSummary> {
        let mut outcomes = Vec::with_capacity(self.supercycles.len());
        let mut total_scheduled_hours = 0.0;
        let mut total_effective_hours = 0.0;
        let mut total_allocated_bps = 0.0;
        let mut total_free_bps = 0.0;

        for scheduled in &self.supercycles {
            let supercycle = &scheduled.supercycle;
            let in_scenario = |source: Error| Error::Scenario { scenario: self.name.to_string(), supercycle: supercycle.name().to_string(), source: Box::new(source) };

            let allocation = supercycle.allocate_hours(scheduled.allocated_hours, self.machine_availability).map_err(in_scenario)?;
            let free_capacity = supercycle.calculate_free_bps(Some(&allocation));
            let free_bps = free_capacity.total().map_err(in_scenario)?;

            tracing::info!(
                target: ANALYTICS_TARGET,
                Scenario = %self.name,
                SuperCycle = %supercycle.name(),
                EffectiveHours = allocation.allocated_hours,
                SuperCyclesPlayed = allocation.number_of_supercycles_played,
                AllocatedBps = allocation.allocated_bps,
                FreeBps = free_bps,
                "Supercycle allocated"
            );

            total_scheduled_hours += allocation.scheduled_hours;
            total_effective_hours += allocation.allocated_hours;
            total_allocated_bps += allocation.allocated_bps;
            total_free_bps += free_bps;

            outcomes.push(SuperCycleOutcome { allocation, free_capacity });
        }

        let mut number_of_cycles_played = BTreeMap::new();
        let mut time_sharing_of_cycles = BTreeMap::new();
        let mut energy_of_cycles = BTreeMap::new();

        // Supercycles not playing a cycle contribute zero to its sums.
        for cycle in self.cycle_universe() {
            let (mut played, mut time, mut energy) = (0.0, 0.0, 0.0);
            for outcome in &outcomes {
                let allocation = &outcome.allocation;
                played += allocation.number_of_cycles_played.get(&cycle).copied().unwrap_or(0.0);
                time += allocation.time_sharing_of_cycles.get(&cycle).copied().unwrap_or(0.0);
                energy += allocation.energy_of_cycles.get(&cycle).copied().unwrap_or(0.0);
            }

            number_of_cycles_played.insert(cycle.clone(), played);
            time_sharing_of_cycles.insert(cycle.clone(), time);
            energy_of_cycles.insert(cycle, energy);
        }

        let free_bps_percentage = if total_allocated_bps > 0.0 {
            Some(total_free_bps / total_allocated_bps * 100.0)
        } else {
            log::warn!("Scenario {} allocates no time, free BP percentage is undefined.", self.name);
            None
        };

        log::info!(
            "Scenario {}: {} supercycles, {:.0} BPs allocated, {:.0} BPs free ({}).",
            self.name,
            outcomes.len(),
            total_allocated_bps,
            total_free_bps,
            free_bps_percentage.map_or("n/a".to_string(), |p| format!("{:.2}%", p))
        );

        Ok(ScenarioSummary {
            scenario: self.name.clone(),
            machine_availability: self.machine_availability,
            outcomes,
            total_scheduled_hours,
            total_effective_hours,
            total_allocated_bps,
            total_free_bps,
            free_bps_percentage,
            number_of_cycles_played,
            time_sharing_of_cycles,
            energy_of_cycles,
        })
    }

    /// Derives the upstream supercycle of every scheduled supercycle.
    pub fn coupled_supercycles(&self, upstream: &AcceleratorName, idle: &Arc<Cycle>) -> Result<Vec<SuperCycle>> {
        self.supercycles
            .iter()
            .map(|scheduled| {
                scheduled.supercycle.make_coupled_supercycle(upstream, idle).map_err(|source| Error::Scenario {
                    scenario: self.name.to_string(),
                    supercycle: scheduled.supercycle.name().to_string(),
                    source: Box::new(source),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::limits::FacilityLimits;

    fn sps(name: &str, bps: u32, power: f64) -> Arc<Cycle> {
        Arc::new(Cycle::new("SPS", name, bps, 1.2).unwrap().with_power(power).unwrap())
    }

    fn scenario() -> Scenario {
        let mte = Arc::new(Cycle::new("PS", "MTE", 2, 1.2).unwrap());
        let sftpro = Arc::new(Cycle::new("SPS", "SFTPRO", 9, 1.2).unwrap().with_power(52.83).unwrap().with_coupling(mte, 2).unwrap());
        let degauss = sps("deGauss", 3, 4.77);
        let hiradmat = sps("HiRadMat", 20, 17.52);
        let limits = FacilityLimits::default();

        let physics = SuperCycle::new("SPS", "Physics", vec![sftpro.clone(), hiradmat.clone(), degauss.clone()], limits).unwrap();
        let hrm = SuperCycle::new("SPS", "HiRadMat", vec![hiradmat, degauss], limits).unwrap();

        Scenario::new(
            "Protons only",
            vec![
                ScheduledSuperCycle { supercycle: Arc::new(physics), allocated_hours: 1000.0 },
                ScheduledSuperCycle { supercycle: Arc::new(hrm), allocated_hours: 200.0 },
            ],
            0.8,
        )
        .unwrap()
    }

    #[test]
    fn test_cycle_universe() {
        let names: Vec<String> = scenario().cycle_universe().into_iter().map(String::from).collect();
        assert_eq!(names, vec!["HiRadMat", "SFTPRO", "deGauss"]);
    }

    #[test]
    fn test_totals_over_supercycles() {
        let scenario = scenario();
        let summary = scenario.calculate_number_of_cycles().unwrap();

        let physics = summary.outcome("Physics").unwrap();
        let hrm = summary.outcome("HiRadMat").unwrap();

        assert!((summary.total_allocated_bps - (1200.0 * 0.8 * 3600.0 / 1.2)).abs() < 1e-6);
        assert!((summary.total_free_bps - (physics.free_capacity.total().unwrap() + hrm.free_capacity.total().unwrap())).abs() < 1e-6);

        let played_hrm = physics.allocation.number_of_cycles_played["HiRadMat"] + hrm.allocation.number_of_cycles_played["HiRadMat"];
        assert!((summary.number_of_cycles_played["HiRadMat"] - played_hrm).abs() < 1e-9);
        // SFTPRO only appears in Physics.
        assert_eq!(summary.number_of_cycles_played["SFTPRO"], physics.allocation.number_of_cycles_played["SFTPRO"]);

        let total_time: f64 = summary.time_sharing_of_cycles.values().sum();
        assert!((total_time - 1200.0 * 0.8 * 3600.0).abs() < 1e-3);
    }

    #[test]
    fn test_free_bps_percentage() {
        let summary = scenario().calculate_number_of_cycles().unwrap();
        let percentage = summary.free_bps_percentage.unwrap();

        assert_eq!(percentage, summary.total_free_bps / summary.total_allocated_bps * 100.0);
        assert!(percentage <= 100.0);
    }

    #[test]
    fn test_zero_hours_leaves_percentage_unset() {
        let sc = SuperCycle::new("SPS", "Idle", vec![sps("Zero", 1, 1.2)], FacilityLimits::default()).unwrap();
        let scenario = Scenario::new("Shutdown", vec![ScheduledSuperCycle { supercycle: Arc::new(sc), allocated_hours: 0.0 }], 1.0).unwrap();

        let summary = scenario.calculate_number_of_cycles().unwrap();
        assert_eq!(summary.total_allocated_bps, 0.0);
        assert_eq!(summary.free_bps_percentage, None);
    }

    #[test]
    fn test_empty_scenario_is_degenerate_not_an_error() {
        let scenario = Scenario::new("Empty", vec![], 0.8).unwrap();
        let summary = scenario.calculate_number_of_cycles().unwrap();
        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.free_bps_percentage, None);
    }

    #[test]
    fn test_duplicate_supercycle_is_rejected() {
        let sc = Arc::new(SuperCycle::new("SPS", "Idle", vec![sps("Zero", 1, 1.2)], FacilityLimits::default()).unwrap());
        let result = Scenario::new(
            "Twice",
            vec![ScheduledSuperCycle { supercycle: sc.clone(), allocated_hours: 1.0 }, ScheduledSuperCycle { supercycle: sc, allocated_hours: 2.0 }],
            1.0,
        );
        assert!(matches!(result, Err(Error::ModelConstructionError(_))));
    }

    #[test]
    fn test_invalid_availability_is_rejected() {
        assert!(Scenario::new("Broken", vec![], 0.0).is_err());
        assert!(Scenario::new("Broken", vec![], 1.01).is_err());
    }

    #[test]
    fn test_coupled_supercycles_names_failing_supercycle() {
        let lhc = Arc::new(Cycle::new("PS", "LHC", 12, 1.2).unwrap());
        let greedy = Arc::new(Cycle::new("SPS", "LHC filling", 20, 1.2).unwrap().with_coupling(lhc, 2).unwrap());
        let sc = SuperCycle::new("SPS", "LHC filling", vec![greedy], FacilityLimits::default()).unwrap();
        let scenario = Scenario::new("LHC", vec![ScheduledSuperCycle { supercycle: Arc::new(sc), allocated_hours: 10.0 }], 0.8).unwrap();

        let idle = Arc::new(Cycle::new("PS", "Zero", 1, 1.2).unwrap());
        match scenario.coupled_supercycles(&AcceleratorName::new("PS"), &idle) {
            Err(Error::Scenario { scenario, supercycle, source }) => {
                assert_eq!(scenario, "LHC");
                assert_eq!(supercycle, "LHC filling");
                assert!(matches!(*source, Error::OversubscribedCoupling { .. }));
            }
            other => panic!("Expected a scenario error, got {:?}", other),
        }
    }
}
