use serde::Serialize;

use crate::api::facility_dto::LimitsDto;
use crate::error::{Error, Result};

/// Duration of one basic period of the SPS complex in seconds.
pub const BASIC_PERIOD: f64 = 1.2;
/// Longest SPS supercycle the timing system accepts, in seconds.
pub const SPS_SC_LENGTH_LIMIT: f64 = 90.0;
/// RMS power the SPS main power converters can sustain, in MW.
pub const SPS_RMS_POWER_LIMIT: f64 = 41.1;

/// Facility-wide constants every cycle and supercycle is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FacilityLimits {
    /// Basic period in seconds.
    pub basic_period: f64,
    /// Upper bound (inclusive) on the supercycle length in seconds.
    pub supercycle_length_limit: f64,
    /// Upper bound (inclusive) on the average supercycle power in MW.
    pub rms_power_limit: f64,
}

impl Default for FacilityLimits {
    fn default() -> Self {
        FacilityLimits { basic_period: BASIC_PERIOD, supercycle_length_limit: SPS_SC_LENGTH_LIMIT, rms_power_limit: SPS_RMS_POWER_LIMIT }
    }
}

impl FacilityLimits {
    pub fn new(basic_period: f64, supercycle_length_limit: f64, rms_power_limit: f64) -> Result<Self> {
        if !(basic_period.is_finite() && basic_period > 0.0) {
            return Err(Error::ModelConstructionError(format!("basic period must be a positive number of seconds, got {}", basic_period)));
        }
        if !(supercycle_length_limit.is_finite() && supercycle_length_limit > 0.0) {
            return Err(Error::ModelConstructionError(format!("supercycle length limit must be positive, got {}", supercycle_length_limit)));
        }
        if !(rms_power_limit.is_finite() && rms_power_limit >= 0.0) {
            return Err(Error::ModelConstructionError(format!("RMS power limit must be non-negative, got {}", rms_power_limit)));
        }

        Ok(FacilityLimits { basic_period, supercycle_length_limit, rms_power_limit })
    }

    pub fn from_dto(basic_period: f64, dto: &LimitsDto) -> Result<Self> {
        Self::new(basic_period, dto.supercycle_length_limit, dto.rms_power_limit)
    }

    /// Length in seconds of `bps` basic periods.
    pub fn length_of(&self, bps: u32) -> f64 {
        bps as f64 * self.basic_period
    }
}
