use std::path::Path;

use crate::api::facility_dto::FacilityDto;
use crate::domain::facility::Facility;
use crate::domain::scenario::ScenarioSummary;
use crate::error::Result;
use crate::loader::parser::parse_json_file;
use crate::loader::waveform::CsvWaveformSource;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod reporting;

/// Loads a facility description. Waveform files are resolved relative to the
/// directory of `file_path`.
pub fn load_facility(file_path: &str) -> Result<Facility> {
    let root_dto: FacilityDto = parse_json_file::<FacilityDto>(file_path)?;
    log::info!("Facility file '{}' parsed successfully.", file_path);

    let base_dir = Path::new(file_path).parent().map(Path::to_path_buf).unwrap_or_default();
    let facility = Facility::from_dto(root_dto, &CsvWaveformSource::new(base_dir))?;
    log::info!("Facility model constructed successfully.");

    Ok(facility)
}

/// Loads a facility description and evaluates one of its scenarios.
pub fn evaluate_scenario(file_path: &str, scenario: &str) -> Result<ScenarioSummary> {
    let facility = load_facility(file_path)?;
    facility.scenario(scenario)?.calculate_number_of_cycles()
}
