use std::sync::Arc;

use serde::Serialize;

use crate::domain::cycle::Cycle;
use crate::domain::supercycle::{AllocationResult, SuperCycle};
use crate::domain::utils::id::{AcceleratorName, SuperCycleName};
use crate::error::{Error, Result};

/// Upstream capacity left unused by one supercycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeCapacityResult {
    pub supercycle: SuperCycleName,
    /// Free BPs in one repetition. Negative when the coupled cycles demand more
    /// than the slots they fill.
    pub free_bps_per_supercycle: i64,
    /// Free BPs over the allocated period; absent until hours are allocated.
    pub free_bps_total: Option<f64>,
}

impl FreeCapacityResult {
    /// Total free BPs, or `PrecomputationMissing` if no allocation backed the calculation.
    pub fn total(&self) -> Result<f64> {
        self.free_bps_total.ok_or_else(|| Error::PrecomputationMissing(self.supercycle.to_string()))
    }
}

impl SuperCycle {
    /// Free upstream BPs of every slot, one entry per member (not deduplicated).
    pub fn free_bps_per_slot(&self) -> Vec<i64> {
        self.cycles().iter().map(|c| c.bps() as i64 - c.coupled_cycle_bps() as i64).collect()
    }

    /// Computes the BPs of this supercycle not consumed by coupled upstream cycles.
    ///
    /// `allocation` must come from `allocate_hours` on this supercycle. Without it
    /// the per-repetition figure is still returned, a warning is logged and the
    /// total stays `None`.
    pub fn calculate_free_bps(&self, allocation: Option<&AllocationResult>) -> FreeCapacityResult {
        let free_bps_per_supercycle: i64 = self.free_bps_per_slot().iter().sum();

        let free_bps_total = match allocation {
            Some(allocation) if &allocation.supercycle == self.name() && &allocation.accelerator == self.accelerator() => {
                Some(free_bps_per_supercycle as f64 * allocation.number_of_supercycles_played)
            }
            Some(allocation) => {
                log::warn!(
                    "{}: allocation belongs to supercycle {} on {}, total free BPs left unset.",
                    Error::PrecomputationMissing(self.name().to_string()),
                    allocation.supercycle,
                    allocation.accelerator
                );
                None
            }
            None => {
                log::warn!("{}: call allocate_hours first, total free BPs left unset.", Error::PrecomputationMissing(self.name().to_string()));
                None
            }
        };

        FreeCapacityResult { supercycle: self.name().clone(), free_bps_per_supercycle, free_bps_total }
    }

    /// Projects this supercycle onto the timeline of the upstream accelerator.
    ///
    /// Each slot is replaced by its coupled cycle, repeated once per injection,
    /// followed by `idle` cycles for every basic period left over. Uncoupled slots
    /// are filled with `idle` entirely. The result is validated like any other
    /// supercycle.
    pub fn make_coupled_supercycle(&self, upstream: &AcceleratorName, idle: &Arc<Cycle>) -> Result<SuperCycle> {
        if idle.accelerator() != upstream || idle.bps() != 1 {
            return Err(Error::InvalidCycle {
                accelerator: idle.accelerator().to_string(),
                cycle: idle.name().to_string(),
                message: format!("idle placeholder must be a 1-BP cycle of {}", upstream),
            });
        }

        let mut coupled_cycles: Vec<Arc<Cycle>> = Vec::new();

        for cycle in self.cycles() {
            let mut free_bps = cycle.bps() as i64;

            if let Some(coupling) = cycle.coupling() {
                if coupling.cycle.accelerator() != upstream {
                    return Err(Error::MixedUpstreamAccelerators {
                        supercycle: self.name().to_string(),
                        cycle: cycle.name().to_string(),
                        expected: upstream.to_string(),
                        found: coupling.cycle.accelerator().to_string(),
                    });
                }

                for _ in 0..coupling.number_of_injections {
                    coupled_cycles.push(coupling.cycle.clone());
                    free_bps -= coupling.cycle.bps() as i64;
                }
            }

            if free_bps < 0 {
                return Err(Error::OversubscribedCoupling {
                    supercycle: self.name().to_string(),
                    cycle: cycle.name().to_string(),
                    demand: cycle.coupled_cycle_bps(),
                    capacity: cycle.bps(),
                });
            }

            coupled_cycles.extend(std::iter::repeat_n(idle.clone(), free_bps as usize));
        }

        log::debug!("Derived {} supercycle from {} with {} entries.", upstream, self.name(), coupled_cycles.len());

        SuperCycle::new(upstream.as_str(), self.name().as_str(), coupled_cycles, *self.limits())
    }
}
