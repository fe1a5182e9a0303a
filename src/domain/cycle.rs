use std::sync::Arc;

use crate::domain::utils::id::{AcceleratorName, CycleName};
use crate::error::{Error, Result};
use crate::loader::waveform::{WaveformRef, WaveformSource};

/// Measured main-magnet current of a cycle, sampled against time.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Waveform {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::ModelConstructionError(format!("waveform columns differ in length ({} and {})", x.len(), y.len())));
        }
        Ok(Waveform { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Link from a downstream cycle to the upstream cycle that fills it.
#[derive(Debug, Clone)]
pub struct Coupling {
    pub cycle: Arc<Cycle>,
    /// How often the upstream cycle is played per occurrence of the downstream one.
    pub number_of_injections: u32,
}

/// One repeatable operating program of fixed duration and power on one accelerator.
///
/// A cycle is built once from the facility catalog and shared as `Arc<Cycle>`
/// between every supercycle that plays it.
#[derive(Debug, Clone)]
pub struct Cycle {
    accelerator: AcceleratorName,
    name: CycleName,
    bps: u32,
    user: Option<String>,
    power: f64,
    length: f64,
    waveform: Option<Waveform>,
    coupling: Option<Coupling>,
}

impl Cycle {
    /// Creates an uncoupled cycle without power draw or waveform.
    ///
    /// `length` is `bps × basic_period`. Fails with `InvalidCycle` for empty
    /// names or `bps == 0`.
    pub fn new(accelerator: impl Into<String>, name: impl Into<String>, bps: u32, basic_period: f64) -> Result<Self> {
        let accelerator = AcceleratorName::new(accelerator);
        let name = CycleName::new(name);

        if accelerator.as_str().is_empty() || name.as_str().is_empty() {
            return Err(Error::InvalidCycle { accelerator: accelerator.into(), cycle: name.into(), message: "accelerator and cycle name must not be empty".to_string() });
        }
        if bps == 0 {
            return Err(Error::InvalidCycle { accelerator: accelerator.into(), cycle: name.into(), message: "a cycle needs at least one basic period".to_string() });
        }
        if !(basic_period.is_finite() && basic_period > 0.0) {
            return Err(Error::InvalidCycle { accelerator: accelerator.into(), cycle: name.into(), message: format!("basic period must be positive, got {}", basic_period) });
        }

        Ok(Cycle { accelerator, name, bps, user: None, power: 0.0, length: bps as f64 * basic_period, waveform: None, coupling: None })
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = if user.is_empty() { None } else { Some(user) };
        self
    }

    /// Sets the average power draw in MW.
    pub fn with_power(mut self, power: f64) -> Result<Self> {
        if !(power.is_finite() && power >= 0.0) {
            return Err(self.invalid(format!("power must be a non-negative number of MW, got {}", power)));
        }
        self.power = power;
        Ok(self)
    }

    /// Couples this cycle to an upstream cycle injected `number_of_injections` times.
    pub fn with_coupling(mut self, cycle: Arc<Cycle>, number_of_injections: u32) -> Result<Self> {
        if number_of_injections == 0 {
            return Err(self.invalid("number of injections must be at least 1".to_string()));
        }
        if cycle.accelerator == self.accelerator {
            return Err(self.invalid(format!("coupled cycle {} runs on the same accelerator", cycle.name)));
        }
        if cycle.bps.checked_mul(number_of_injections).is_none() {
            return Err(self.invalid(format!("{} injections of {} ({} BPs) overflow the BP count", number_of_injections, cycle.name, cycle.bps)));
        }
        self.coupling = Some(Coupling { cycle, number_of_injections });
        Ok(self)
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = Some(waveform);
        self
    }

    /// Loads the waveform through `source`. Loader failures are returned unchanged.
    pub fn load_waveform(self, source: &dyn WaveformSource, waveform: &WaveformRef) -> Result<Self> {
        let loaded = source.load(&waveform.file, &waveform.x_key, &waveform.y_key)?;
        log::debug!("Loaded waveform of {}/{} with {} samples from '{}'.", self.accelerator, self.name, loaded.len(), waveform.file);
        Ok(self.with_waveform(loaded))
    }

    fn invalid(&self, message: String) -> Error {
        Error::InvalidCycle { accelerator: self.accelerator.to_string(), cycle: self.name.to_string(), message }
    }

    pub fn accelerator(&self) -> &AcceleratorName {
        &self.accelerator
    }

    pub fn name(&self) -> &CycleName {
        &self.name
    }

    pub fn bps(&self) -> u32 {
        self.bps
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Average power in MW.
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Length in seconds.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn waveform(&self) -> Option<&Waveform> {
        self.waveform.as_ref()
    }

    pub fn coupling(&self) -> Option<&Coupling> {
        self.coupling.as_ref()
    }

    pub fn coupled_cycle(&self) -> Option<&Arc<Cycle>> {
        self.coupling.as_ref().map(|c| &c.cycle)
    }

    pub fn number_of_injections(&self) -> u32 {
        self.coupling.as_ref().map_or(1, |c| c.number_of_injections)
    }

    /// Basic periods of the upstream machine consumed per occurrence of this cycle.
    pub fn coupled_cycle_bps(&self) -> u32 {
        match &self.coupling {
            Some(coupling) => coupling.cycle.bps * coupling.number_of_injections,
            None => 0,
        }
    }
}
