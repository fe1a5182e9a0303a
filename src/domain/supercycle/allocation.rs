use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::supercycle::SuperCycle;
use crate::domain::utils::id::{AcceleratorName, CycleName, SuperCycleName};
use crate::error::{Error, Result};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Outcome of dedicating a block of operating hours to one supercycle.
///
/// Counts are real-valued: they describe average throughput over the period,
/// not an integer number of repetitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationResult {
    pub accelerator: AcceleratorName,
    pub supercycle: SuperCycleName,
    /// Hours as scheduled, before availability.
    pub scheduled_hours: f64,
    pub machine_availability: f64,
    /// Effective hours, i.e. scheduled hours times availability.
    pub allocated_hours: f64,
    pub allocated_seconds: f64,
    pub allocated_bps: f64,
    pub number_of_supercycles_played: f64,
    /// Plays per distinct cycle name.
    pub number_of_cycles_played: BTreeMap<CycleName, f64>,
    /// Seconds occupied per distinct cycle name.
    pub time_sharing_of_cycles: BTreeMap<CycleName, f64>,
    /// Energy drawn per distinct cycle name in MWh.
    pub energy_of_cycles: BTreeMap<CycleName, f64>,
}

impl AllocationResult {
    /// Total energy of the allocation in MWh.
    pub fn energy(&self) -> f64 {
        self.energy_of_cycles.values().sum()
    }
}

impl SuperCycle {
    /// Distributes `allocated_hours` over this supercycle's cycles.
    ///
    /// The hours are derated by `machine_availability`, which must lie in (0, 1].
    /// Calling again with other inputs simply yields another result.
    pub fn allocate_hours(&self, allocated_hours: f64, machine_availability: f64) -> Result<AllocationResult> {
        if !(allocated_hours.is_finite() && allocated_hours >= 0.0) {
            return Err(Error::InvalidAllocation { supercycle: self.name().to_string(), message: format!("allocated hours must be non-negative, got {}", allocated_hours) });
        }
        if !(machine_availability > 0.0 && machine_availability <= 1.0) {
            return Err(Error::InvalidAllocation { supercycle: self.name().to_string(), message: format!("machine availability must lie in (0, 1], got {}", machine_availability) });
        }

        let effective_hours = allocated_hours * machine_availability;
        let allocated_seconds = effective_hours * SECONDS_PER_HOUR;
        let allocated_bps = allocated_seconds / self.limits().basic_period;
        let number_of_supercycles_played = allocated_seconds / self.length();

        let mut number_of_cycles_played = BTreeMap::new();
        let mut time_sharing_of_cycles = BTreeMap::new();
        let mut energy_of_cycles = BTreeMap::new();

        for cycle in self.cycles() {
            if number_of_cycles_played.contains_key(cycle.name()) {
                continue;
            }

            let multiplicity = self.multiplicity(cycle.name().as_str()) as f64;
            let played = number_of_supercycles_played * multiplicity;
            let time = cycle.length() * played;

            number_of_cycles_played.insert(cycle.name().clone(), played);
            time_sharing_of_cycles.insert(cycle.name().clone(), time);
            energy_of_cycles.insert(cycle.name().clone(), time * cycle.power() / SECONDS_PER_HOUR);
        }

        log::debug!("Allocated {:.1} effective hours to {}: {:.1} supercycles played.", effective_hours, self.name(), number_of_supercycles_played);

        Ok(AllocationResult {
            accelerator: self.accelerator().clone(),
            supercycle: self.name().clone(),
            scheduled_hours: allocated_hours,
            machine_availability,
            allocated_hours: effective_hours,
            allocated_seconds,
            allocated_bps,
            number_of_supercycles_played,
            number_of_cycles_played,
            time_sharing_of_cycles,
            energy_of_cycles,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::cycle::Cycle;
    use crate::domain::limits::FacilityLimits;

    fn sps(name: &str, bps: u32, power: f64) -> Arc<Cycle> {
        Arc::new(Cycle::new("SPS", name, bps, 1.2).unwrap().with_power(power).unwrap())
    }

    fn ten_second_supercycle() -> SuperCycle {
        let limits = FacilityLimits::new(1.0, 90.0, 41.1).unwrap();
        let a = Arc::new(Cycle::new("SPS", "A", 4, 1.0).unwrap());
        let b = Arc::new(Cycle::new("SPS", "B", 3, 1.0).unwrap());
        SuperCycle::new("SPS", "Ten", vec![a, b.clone(), b], limits).unwrap()
    }

    #[test]
    fn test_hundred_hours_at_ninety_percent() {
        let sc = ten_second_supercycle();
        let allocation = sc.allocate_hours(100.0, 0.9).unwrap();

        assert!((allocation.allocated_hours - 90.0).abs() < 1e-9);
        assert!((allocation.allocated_seconds - 324000.0).abs() < 1e-6);
        assert!((allocation.allocated_bps - 324000.0).abs() < 1e-6);
        assert!((allocation.number_of_supercycles_played - 32400.0).abs() < 1e-6);
        assert_eq!(allocation.scheduled_hours, 100.0);
    }

    #[test]
    fn test_play_counts_follow_multiplicity() {
        let sc = ten_second_supercycle();
        let allocation = sc.allocate_hours(100.0, 0.9).unwrap();

        assert_eq!(allocation.number_of_cycles_played.len(), 2);
        assert!((allocation.number_of_cycles_played["A"] - 32400.0).abs() < 1e-6);
        assert!((allocation.number_of_cycles_played["B"] - 64800.0).abs() < 1e-6);
        assert!((allocation.time_sharing_of_cycles["A"] - 4.0 * 32400.0).abs() < 1e-6);
        assert!((allocation.time_sharing_of_cycles["B"] - 3.0 * 64800.0).abs() < 1e-6);
    }

    #[test]
    fn test_allocated_time_is_fully_distributed() {
        let cycles = vec![sps("SFTPRO", 9, 52.83), sps("SFTPRO", 9, 52.83), sps("LHC filling", 20, 18.03), sps("deGauss", 3, 4.77)];
        let sc = SuperCycle::new("SPS", "Physics", cycles, FacilityLimits::default()).unwrap();

        for (hours, availability) in [(1749.0, 0.8), (0.5, 1.0), (873.0, 0.35)] {
            let allocation = sc.allocate_hours(hours, availability).unwrap();
            let distributed: f64 = allocation.time_sharing_of_cycles.values().sum();
            let expected = hours * availability * 3600.0;
            assert!((distributed - expected).abs() < 1e-6 * expected, "{} != {}", distributed, expected);
            assert!((allocation.number_of_supercycles_played - expected / sc.length()).abs() < 1e-9 * expected);
        }
    }

    #[test]
    fn test_energy_per_cycle() {
        let sc = SuperCycle::new("SPS", "AWAKE", vec![sps("AWAKE", 6, 31.19), sps("deGauss", 3, 4.77)], FacilityLimits::default()).unwrap();
        let allocation = sc.allocate_hours(10.0, 1.0).unwrap();

        let awake_time = allocation.time_sharing_of_cycles["AWAKE"];
        assert!((allocation.energy_of_cycles["AWAKE"] - awake_time * 31.19 / 3600.0).abs() < 1e-9);
        // Ten hours at the average power.
        assert!((allocation.energy() - 10.0 * sc.average_power()).abs() < 1e-6);
    }

    #[test]
    fn test_zero_hours_plays_nothing() {
        let sc = ten_second_supercycle();
        let allocation = sc.allocate_hours(0.0, 1.0).unwrap();
        assert_eq!(allocation.number_of_supercycles_played, 0.0);
        assert!(allocation.number_of_cycles_played.values().all(|&n| n == 0.0));
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let sc = ten_second_supercycle();
        assert!(matches!(sc.allocate_hours(-1.0, 0.9), Err(Error::InvalidAllocation { .. })));
        assert!(matches!(sc.allocate_hours(10.0, 0.0), Err(Error::InvalidAllocation { .. })));
        assert!(matches!(sc.allocate_hours(10.0, 1.5), Err(Error::InvalidAllocation { .. })));
        assert!(matches!(sc.allocate_hours(f64::INFINITY, 1.0), Err(Error::InvalidAllocation { .. })));
    }

    #[test]
    fn test_reallocation_overwrites_nothing() {
        let sc = ten_second_supercycle();
        let first = sc.allocate_hours(100.0, 0.9).unwrap();
        let second = sc.allocate_hours(50.0, 1.0).unwrap();
        assert_eq!(first, sc.allocate_hours(100.0, 0.9).unwrap());
        assert!((second.number_of_supercycles_played - 18000.0).abs() < 1e-6);
    }
}
