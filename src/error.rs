use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse facility JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to read or write CSV data: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to load waveform from '{file}': {message}")]
    DataSourceError { file: String, message: String },

    #[error("Failed to build internal domain model: {0}")]
    ModelConstructionError(String),

    #[error("Invalid cycle {accelerator}/{cycle}: {message}")]
    InvalidCycle { accelerator: String, cycle: String, message: String },

    #[error("{supercycle} SC length: {length:.2} seconds exceeds limit of {limit:.2} seconds")]
    CapacityLimitExceeded { supercycle: String, length: f64, limit: f64 },

    #[error("{supercycle} RMS power: {power:.2} MW exceeds limit of {limit:.2} MW")]
    PowerLimitExceeded { supercycle: String, power: f64, limit: f64 },

    #[error("Supercycle {0} contains no cycles")]
    EmptySuperCycle(String),

    #[error("Supercycle {supercycle} runs on {accelerator} but cycle {cycle} belongs to {cycle_accelerator}")]
    ForeignCycle { supercycle: String, accelerator: String, cycle: String, cycle_accelerator: String },

    #[error("Supercycle {supercycle} contains cycle {cycle} with differing lengths ({first} and {second} BPs)")]
    InconsistentCycleLength { supercycle: String, cycle: String, first: u32, second: u32 },

    #[error("Cycle {cycle} in supercycle {supercycle} demands {demand} BPs from its coupled cycle but only has {capacity} BPs")]
    OversubscribedCoupling { supercycle: String, cycle: String, demand: u32, capacity: u32 },

    #[error("Supercycle {supercycle} couples cycle {cycle} to {found}, expected upstream accelerator {expected}")]
    MixedUpstreamAccelerators { supercycle: String, cycle: String, expected: String, found: String },

    #[error("Free capacity of supercycle {0} requested before any hours were allocated")]
    PrecomputationMissing(String),

    #[error("Invalid allocation for supercycle {supercycle}: {message}")]
    InvalidAllocation { supercycle: String, message: String },

    #[error("Unknown cycle '{cycle}' on accelerator {accelerator}")]
    UnknownCycle { accelerator: String, cycle: String },

    #[error("Unknown supercycle '{0}'")]
    UnknownSuperCycle(String),

    #[error("Unknown scenario '{0}'")]
    UnknownScenario(String),

    #[error("Scenario '{scenario}' failed at supercycle {supercycle}: {source}")]
    Scenario {
        scenario: String,
        supercycle: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
