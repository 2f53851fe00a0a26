use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ResourceKind, SimTime};

/// Minutes between calls for each hour of the day: quiet and busy blocks of
/// six hours, alternating.
pub const NUM_INTERCALL_MINUTES_HOUR: [f64; 24] = [
    10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 10.0, 10.0, 10.0, 10.0,
    10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0,
];

/// How a schedule entry turns into an inter-arrival delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterArrival {
    /// The entry is the delay.
    #[default]
    Fixed,
    /// Exponentially distributed delay with the entry as its mean.
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_queue_slots: usize,
    pub num_telemarketers: usize,
    /// Customers calling at t=0, before the steady stream starts.
    pub num_customers_start: usize,
    /// Inter-arrival minutes indexed by `floor(now / 60) % len`.
    pub intercall_minutes: Vec<f64>,
    pub inter_arrival: InterArrival,
    pub ivr_max_time: u32,
    pub telemarketer_max_time: u32,
    /// Horizon in minutes. Events due at exactly this time do not fire.
    pub simulation_time: SimTime,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            num_queue_slots: 1,
            num_telemarketers: 1,
            num_customers_start: 0,
            intercall_minutes: vec![1.0],
            inter_arrival: InterArrival::Fixed,
            ivr_max_time: 3,
            telemarketer_max_time: 10,
            simulation_time: 60.0,
            seed: 23,
        }
    }
}

impl SimulationConfig {
    /// Two simulated days, one telemarketer, the alternating 10/20 minute
    /// hourly schedule.
    pub fn two_day_baseline() -> Self {
        SimulationConfig {
            intercall_minutes: NUM_INTERCALL_MINUTES_HOUR.to_vec(),
            simulation_time: 2880.0,
            ..SimulationConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_queue_slots == 0 {
            return Err(ConfigError::ZeroCapacity(ResourceKind::QueueSlot));
        }
        if self.num_telemarketers == 0 {
            return Err(ConfigError::ZeroCapacity(ResourceKind::Telemarketer));
        }
        if self.intercall_minutes.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        if let Some((hour, &value)) = self
            .intercall_minutes
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(ConfigError::InvalidDelay { hour, value });
        }
        if !(self.simulation_time.is_finite() && self.simulation_time >= 0.0) {
            return Err(ConfigError::InvalidHorizon(self.simulation_time));
        }
        if self.ivr_max_time == 0 {
            return Err(ConfigError::ZeroIvrMax);
        }
        if self.telemarketer_max_time == 0 {
            return Err(ConfigError::ZeroServiceMax);
        }
        Ok(())
    }

    pub fn capacity(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::QueueSlot => self.num_queue_slots,
            ResourceKind::Telemarketer => self.num_telemarketers,
        }
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
