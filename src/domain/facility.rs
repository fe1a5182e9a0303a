use std::collections::HashMap;
use std::sync::Arc;

use crate::api::facility_dto::{AcceleratorDto, CycleDto, FacilityDto, ScenarioDto, SuperCycleDto};
use crate::domain::catalog::CycleCatalog;
use crate::domain::cycle::Cycle;
use crate::domain::limits::FacilityLimits;
use crate::domain::scenario::{Scenario, ScheduledSuperCycle};
use crate::domain::supercycle::SuperCycle;
use crate::domain::utils::id::{AcceleratorName, CycleName};
use crate::error::{Error, Result};
use crate::loader::waveform::{WaveformRef, WaveformSource};

/// One machine of the complex.
#[derive(Debug, Clone)]
pub struct Accelerator {
    pub name: AcceleratorName,
    /// Fraction of scheduled time the machine is operable.
    pub availability: f64,
    /// 1-BP placeholder used to pad derived supercycles.
    pub idle_cycle: Option<Arc<Cycle>>,
}

/// The facility description: limits, cycle catalogs, supercycles and scenarios.
///
/// Built once from a `FacilityDto` and read-only afterwards.
#[derive(Debug)]
pub struct Facility {
    limits: FacilityLimits,
    accelerators: Vec<Accelerator>,
    catalog: CycleCatalog,
    supercycles: Vec<Arc<SuperCycle>>,
    scenarios: Vec<Scenario>,
    cycle_colors: HashMap<CycleName, String>,
}

impl Facility {
    /// Converts a parsed facility file into the domain model.
    ///
    /// Accelerators are processed in file order, so a coupled cycle must belong to
    /// an accelerator listed before the one referencing it.
    pub fn from_dto(dto: FacilityDto, waveforms: &dyn WaveformSource) -> Result<Self> {
        let limits = FacilityLimits::from_dto(dto.basic_period, &dto.limits)?;

        let mut catalog = CycleCatalog::new();
        let mut accelerators = Vec::with_capacity(dto.accelerators.len());

        for accelerator_dto in &dto.accelerators {
            let accelerator = Self::build_accelerator(accelerator_dto, &limits, &mut catalog, waveforms)?;
            log::info!("Loaded accelerator {} with {} cycles.", accelerator.name, accelerator_dto.cycles.len());
            accelerators.push(accelerator);
        }

        let mut supercycles: Vec<Arc<SuperCycle>> = Vec::with_capacity(dto.supercycles.len());
        for supercycle_dto in &dto.supercycles {
            if supercycles.iter().any(|s| s.name().as_str() == supercycle_dto.name) {
                return Err(Error::ModelConstructionError(format!("supercycle '{}' is defined twice", supercycle_dto.name)));
            }
            supercycles.push(Arc::new(Self::build_supercycle(supercycle_dto, &limits, &catalog)?));
        }
        log::info!("Built {} supercycles.", supercycles.len());

        let mut scenarios: Vec<Scenario> = Vec::with_capacity(dto.scenarios.len());
        for scenario_dto in &dto.scenarios {
            if scenarios.iter().any(|s| s.name().as_str() == scenario_dto.name) {
                return Err(Error::ModelConstructionError(format!("scenario '{}' is defined twice", scenario_dto.name)));
            }
            scenarios.push(Self::build_scenario(scenario_dto, &accelerators, &supercycles)?);
        }

        let cycle_colors = dto.cycle_colors.into_iter().map(|(name, color)| (CycleName::new(name), color)).collect();

        Ok(Facility { limits, accelerators, catalog, supercycles, scenarios, cycle_colors })
    }

    fn build_accelerator(dto: &AcceleratorDto, limits: &FacilityLimits, catalog: &mut CycleCatalog, waveforms: &dyn WaveformSource) -> Result<Accelerator> {
        if !(dto.availability > 0.0 && dto.availability <= 1.0) {
            return Err(Error::ModelConstructionError(format!("availability of {} must lie in (0, 1], got {}", dto.name, dto.availability)));
        }

        for cycle_dto in &dto.cycles {
            let cycle = Self::build_cycle(&dto.name, cycle_dto, limits, catalog, waveforms)?;
            catalog.add(cycle_dto.id.clone(), Arc::new(cycle))?;
        }

        let idle_cycle = match &dto.idle_cycle {
            Some(id) => Some(catalog.lookup(&dto.name, id)?.clone()),
            None => None,
        };

        Ok(Accelerator { name: AcceleratorName::new(dto.name.clone()), availability: dto.availability, idle_cycle })
    }

    fn build_cycle(accelerator: &str, dto: &CycleDto, limits: &FacilityLimits, catalog: &CycleCatalog, waveforms: &dyn WaveformSource) -> Result<Cycle> {
        let name = dto.name.clone().unwrap_or_else(|| dto.id.clone());

        let mut cycle = Cycle::new(accelerator, name, dto.bps, limits.basic_period)?.with_power(dto.power)?;

        if let Some(user) = &dto.user {
            cycle = cycle.with_user(user.clone());
        }

        if let Some(coupled) = &dto.coupled_cycle {
            let upstream = catalog.lookup(&coupled.accelerator, &coupled.cycle)?;
            cycle = cycle.with_coupling(upstream.clone(), coupled.number_of_injections)?;
        }

        if let Some(waveform) = &dto.waveform {
            let waveform = WaveformRef { file: waveform.file.clone(), x_key: waveform.x_key.clone(), y_key: waveform.y_key.clone() };
            cycle = cycle.load_waveform(waveforms, &waveform)?;
        }

        Ok(cycle)
    }

    fn build_supercycle(dto: &SuperCycleDto, limits: &FacilityLimits, catalog: &CycleCatalog) -> Result<SuperCycle> {
        let cycles = dto.cycles.iter().map(|id| catalog.lookup(&dto.accelerator, id).cloned()).collect::<Result<Vec<_>>>()?;

        SuperCycle::new(dto.accelerator.clone(), dto.name.clone(), cycles, *limits)
    }

    fn build_scenario(dto: &ScenarioDto, accelerators: &[Accelerator], supercycles: &[Arc<SuperCycle>]) -> Result<Scenario> {
        for name in dto.allocated_hours.keys() {
            match supercycles.iter().find(|s| s.name().as_str() == name) {
                None => return Err(Error::UnknownSuperCycle(name.clone())),
                Some(supercycle) if supercycle.accelerator().as_str() != dto.accelerator => {
                    return Err(Error::ModelConstructionError(format!(
                        "scenario {} on {} schedules supercycle {} of {}",
                        dto.name,
                        dto.accelerator,
                        name,
                        supercycle.accelerator()
                    )));
                }
                Some(_) => {}
            }
        }

        let availability = match dto.availability {
            Some(availability) => availability,
            None => {
                accelerators
                    .iter()
                    .find(|a| a.name.as_str() == dto.accelerator)
                    .map(|a| a.availability)
                    .ok_or_else(|| Error::ModelConstructionError(format!("scenario {} refers to unknown accelerator {}", dto.name, dto.accelerator)))?
            }
        };

        // Keep the supercycle declaration order for reporting.
        let scheduled = supercycles
            .iter()
            .filter_map(|supercycle| {
                dto.allocated_hours.get(supercycle.name().as_str()).map(|&hours| ScheduledSuperCycle { supercycle: supercycle.clone(), allocated_hours: hours })
            })
            .collect();

        Scenario::new(dto.name.clone(), scheduled, availability)
    }

    pub fn limits(&self) -> &FacilityLimits {
        &self.limits
    }

    pub fn accelerators(&self) -> &[Accelerator] {
        &self.accelerators
    }

    pub fn accelerator(&self, name: &str) -> Option<&Accelerator> {
        self.accelerators.iter().find(|a| a.name.as_str() == name)
    }

    pub fn catalog(&self) -> &CycleCatalog {
        &self.catalog
    }

    pub fn supercycles(&self) -> &[Arc<SuperCycle>] {
        &self.supercycles
    }

    pub fn supercycle(&self, name: &str) -> Result<&Arc<SuperCycle>> {
        self.supercycles.iter().find(|s| s.name().as_str() == name).ok_or_else(|| Error::UnknownSuperCycle(name.to_string()))
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, name: &str) -> Result<&Scenario> {
        self.scenarios.iter().find(|s| s.name().as_str() == name).ok_or_else(|| Error::UnknownScenario(name.to_string()))
    }

    /// Plot color assigned to a cycle name, if any.
    pub fn color_of(&self, cycle: &str) -> Option<&str> {
        self.cycle_colors.get(cycle).map(String::as_str)
    }

    /// Derives the upstream supercycles of `scenario` on `upstream`, padded with
    /// that accelerator's idle cycle.
    pub fn coupled_supercycles(&self, scenario: &str, upstream: &str) -> Result<Vec<SuperCycle>> {
        let scenario = self.scenario(scenario)?;
        let accelerator = self.accelerator(upstream).ok_or_else(|| Error::ModelConstructionError(format!("unknown accelerator {}", upstream)))?;
        let idle = accelerator.idle_cycle.as_ref().ok_or_else(|| Error::ModelConstructionError(format!("accelerator {} has no idle cycle configured", upstream)))?;

        scenario.coupled_supercycles(&accelerator.name, idle)
    }
}
