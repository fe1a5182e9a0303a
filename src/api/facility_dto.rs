use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::loader::waveform::{DEFAULT_X_KEY, DEFAULT_Y_KEY};

/// Root of a facility description file.
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDto {
    pub basic_period: f64,
    pub limits: LimitsDto,
    pub accelerators: Vec<AcceleratorDto>,
    #[serde(default)]
    pub supercycles: Vec<SuperCycleDto>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDto>,
    #[serde(default)]
    pub cycle_colors: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsDto {
    pub supercycle_length_limit: f64,
    pub rms_power_limit: f64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorDto {
    pub name: String,
    pub availability: f64,
    /// Catalog id of the 1-BP cycle used to pad derived supercycles.
    #[serde(default)]
    pub idle_cycle: Option<String>,
    pub cycles: Vec<CycleDto>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleDto {
    /// Catalog key, unique per accelerator.
    pub id: String,
    /// Cycle name; defaults to `id`.
    #[serde(default)]
    pub name: Option<String>,
    pub bps: u32,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub power: f64,
    #[serde(default)]
    pub waveform: Option<WaveformDto>,
    #[serde(default)]
    pub coupled_cycle: Option<CoupledCycleDto>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformDto {
    pub file: String,
    #[serde(default = "default_x_key")]
    pub x_key: String,
    #[serde(default = "default_y_key")]
    pub y_key: String,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupledCycleDto {
    pub accelerator: String,
    pub cycle: String,
    #[serde(default = "default_injections")]
    pub number_of_injections: u32,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperCycleDto {
    pub accelerator: String,
    pub name: String,
    /// Catalog ids of the member cycles, in playing order.
    pub cycles: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub name: String,
    pub accelerator: String,
    /// Overrides the accelerator's availability.
    #[serde(default)]
    pub availability: Option<f64>,
    /// Hours per supercycle name; a name may appear only once.
    #[serde(deserialize_with = "deserialize_unique_hours")]
    pub allocated_hours: HashMap<String, f64>,
}

fn default_x_key() -> String {
    DEFAULT_X_KEY.to_string()
}

fn default_y_key() -> String {
    DEFAULT_Y_KEY.to_string()
}

fn default_injections() -> u32 {
    1
}

fn deserialize_unique_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HashMap<String, f64>, D::Error> {
    struct HoursVisitor;

    impl<'de> Visitor<'de> for HoursVisitor {
        type Value = HashMap<String, f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map from supercycle names to hours")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut hours = HashMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, value)) = map.next_entry::<String, f64>()? {
                if hours.contains_key(&name) {
                    return Err(de::Error::custom(format!("supercycle '{}' is listed twice in allocatedHours", name)));
                }
                hours.insert(name, value);
            }
            Ok(hours)
        }
    }

    deserializer.deserialize_map(HoursVisitor)
}
