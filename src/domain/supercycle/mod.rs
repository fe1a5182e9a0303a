use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::cycle::Cycle;
use crate::domain::limits::FacilityLimits;
use crate::domain::utils::id::{AcceleratorName, CycleName, SuperCycleName};
use crate::error::{Error, Result};

pub mod allocation;
pub mod coupling;

pub use allocation::AllocationResult;
pub use coupling::FreeCapacityResult;

/// An ordered sequence of cycles played back-to-back and repeated.
///
/// Length and power are derived once at construction and checked against the
/// facility limits; a `SuperCycle` value therefore always satisfies them.
#[derive(Debug, Clone)]
pub struct SuperCycle {
    accelerator: AcceleratorName,
    name: SuperCycleName,
    cycles: Vec<Arc<Cycle>>,
    cycle_names: Vec<CycleName>,
    bps: u32,
    length: f64,
    integrated_power: f64,
    average_power: f64,
    limits: FacilityLimits,
}

impl SuperCycle {
    /// Builds and validates a supercycle.
    ///
    /// Fails with `CapacityLimitExceeded` if the length is above the length limit
    /// and with `PowerLimitExceeded` if the average power is above the RMS power
    /// limit. Both limits are inclusive.
    pub fn new(accelerator: impl Into<String>, name: impl Into<String>, cycles: Vec<Arc<Cycle>>, limits: FacilityLimits) -> Result<Self> {
        let accelerator = AcceleratorName::new(accelerator);
        let name = SuperCycleName::new(name);

        if cycles.is_empty() {
            return Err(Error::EmptySuperCycle(name.into()));
        }

        Self::check_members(&accelerator, &name, &cycles, &limits)?;

        let cycle_names: Vec<CycleName> = cycles.iter().map(|c| c.name().clone()).collect();

        let (bps, length) = Self::calculate_supercycle_length(&name, &cycles, &limits)?;
        let (integrated_power, average_power) = Self::calculate_supercycle_power(&name, &cycles, bps, &limits)?;

        log::debug!("Built supercycle {} on {}: {} BPs, {:.1} s, {:.2} MW.", name, accelerator, bps, length, average_power);

        Ok(SuperCycle { accelerator, name, cycles, cycle_names, bps, length, integrated_power, average_power, limits })
    }

    fn check_members(accelerator: &AcceleratorName, name: &SuperCycleName, cycles: &[Arc<Cycle>], limits: &FacilityLimits) -> Result<()> {
        let mut bps_by_name: HashMap<&CycleName, u32> = HashMap::new();

        for cycle in cycles {
            if cycle.accelerator() != accelerator {
                return Err(Error::ForeignCycle {
                    supercycle: name.to_string(),
                    accelerator: accelerator.to_string(),
                    cycle: cycle.name().to_string(),
                    cycle_accelerator: cycle.accelerator().to_string(),
                });
            }

            if cycle.length() != limits.length_of(cycle.bps()) {
                return Err(Error::InvalidCycle {
                    accelerator: cycle.accelerator().to_string(),
                    cycle: cycle.name().to_string(),
                    message: format!("length {} s does not match the facility basic period of {} s", cycle.length(), limits.basic_period),
                });
            }

            // Time sharing is computed per name, so equal names need equal lengths.
            match bps_by_name.get(cycle.name()) {
                Some(&first) if first != cycle.bps() => {
                    return Err(Error::InconsistentCycleLength { supercycle: name.to_string(), cycle: cycle.name().to_string(), first, second: cycle.bps() });
                }
                Some(_) => {}
                None => {
                    bps_by_name.insert(cycle.name(), cycle.bps());
                }
            }
        }
        Ok(())
    }

    /// Returns the number of basic periods and the length in seconds.
    fn calculate_supercycle_length(name: &SuperCycleName, cycles: &[Arc<Cycle>], limits: &FacilityLimits) -> Result<(u32, f64)> {
        let total_bps: u64 = cycles.iter().map(|c| u64::from(c.bps())).sum();
        // Same product as every member's length, so no summation drift.
        let length = total_bps as f64 * limits.basic_period;

        let exceeded = || Error::CapacityLimitExceeded { supercycle: name.to_string(), length, limit: limits.supercycle_length_limit };
        if length > limits.supercycle_length_limit {
            return Err(exceeded());
        }
        let bps = u32::try_from(total_bps).map_err(|_| exceeded())?;
        Ok((bps, length))
    }

    /// Returns the integrated power in MJ and the average power in MW.
    fn calculate_supercycle_power(name: &SuperCycleName, cycles: &[Arc<Cycle>], bps: u32, limits: &FacilityLimits) -> Result<(f64, f64)> {
        let power_bps: f64 = cycles.iter().map(|c| c.bps() as f64 * c.power()).sum();

        let integrated_power = power_bps * limits.basic_period;
        let average_power = power_bps / bps as f64;

        if average_power > limits.rms_power_limit {
            return Err(Error::PowerLimitExceeded { supercycle: name.to_string(), power: average_power, limit: limits.rms_power_limit });
        }
        Ok((integrated_power, average_power))
    }

    pub fn accelerator(&self) -> &AcceleratorName {
        &self.accelerator
    }

    pub fn name(&self) -> &SuperCycleName {
        &self.name
    }

    pub fn cycles(&self) -> &[Arc<Cycle>] {
        &self.cycles
    }

    /// Member names in playing order, repeated names included.
    pub fn cycle_names(&self) -> &[CycleName] {
        &self.cycle_names
    }

    pub fn contains(&self, cycle_name: &str) -> bool {
        self.cycle_names.iter().any(|n| n.as_str() == cycle_name)
    }

    /// How often `cycle_name` occurs in one repetition.
    pub fn multiplicity(&self, cycle_name: &str) -> usize {
        self.cycle_names.iter().filter(|n| n.as_str() == cycle_name).count()
    }

    pub fn bps(&self) -> u32 {
        self.bps
    }

    /// Length in seconds.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Energy per repetition in MJ.
    pub fn integrated_power(&self) -> f64 {
        self.integrated_power
    }

    /// Average power in MW.
    pub fn average_power(&self) -> f64 {
        self.average_power
    }

    pub fn limits(&self) -> &FacilityLimits {
        &self.limits
    }
}
