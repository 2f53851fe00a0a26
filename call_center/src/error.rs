use thiserror::Error;

use crate::ResourceKind;

/// Rejected configuration. Raised before any event fires.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} capacity must be at least 1")]
    ZeroCapacity(ResourceKind),

    #[error("inter-arrival schedule is empty")]
    EmptySchedule,

    #[error("inter-arrival delay for hour {hour} must be positive and finite, got {value}")]
    InvalidDelay { hour: usize, value: f64 },

    #[error("simulation time must be finite and non-negative, got {0}")]
    InvalidHorizon(f64),

    #[error("ivr_max_time must be at least 1 minute")]
    ZeroIvrMax,

    #[error("telemarketer_max_time must be at least 1 minute")]
    ZeroServiceMax,

    #[error("invalid category weights: {0}")]
    CategoryWeights(#[from] rand::distr::weighted::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("scheduling fault: {0}")]
    Engine(#[from] des::DesError),

    #[error("scenario {scenario} failed: {message}")]
    Scenario { scenario: usize, message: String },

    #[error(transparent)]
    Output(#[from] OutputError),
}
