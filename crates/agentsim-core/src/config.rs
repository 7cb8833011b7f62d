//! Simulation configuration
//!
//! All pacing constants (tick period, probabilities, thresholds, capacities,
//! chat delay windows) live here so they can be tuned from a TOML file
//! instead of being baked into the scheduler.
//!
//! ```toml
//! [simulation]
//! tick_interval_ms = 2000
//! max_running = 3
//! stop_probability = 0.02
//!
//! [simulation.completion_threshold_secs]
//! min = 3
//! max = 15
//!
//! [chat]
//! pricing_timeout_ms = 10000
//!
//! [pricing]
//! base_url = "http://localhost:8000"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::data_operation::DataOperationKind;
use crate::{Error, Result};

/// Inclusive integer range sampled uniformly by the random policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformRange {
    pub min: u64,
    pub max: u64,
}

impl UniformRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(Error::Config(format!(
                "{}: min ({}) is greater than max ({})",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Relative weights for synthetic data operation verbs.
///
/// Models a read-heavy analytical workload. `delete` is kept selectable but
/// defaults to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataOperationWeights {
    pub select: u32,
    pub insert: u32,
    pub update: u32,
    pub delete: u32,
}

impl Default for DataOperationWeights {
    fn default() -> Self {
        Self {
            select: 90,
            insert: 5,
            update: 5,
            delete: 0,
        }
    }
}

impl DataOperationWeights {
    pub fn weight_of(&self, kind: DataOperationKind) -> u32 {
        match kind {
            DataOperationKind::Select => self.select,
            DataOperationKind::Insert => self.insert,
            DataOperationKind::Update => self.update,
            DataOperationKind::Delete => self.delete,
        }
    }

    pub fn total(&self) -> u32 {
        self.select + self.insert + self.update + self.delete
    }
}

/// Tick scheduler and ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock period between ticks
    pub tick_interval_ms: u64,
    /// Simulated seconds added to each running execution per tick
    pub tick_delta_secs: u64,
    /// Upper bound on simultaneously running executions
    pub max_running: usize,
    /// Chance of spawning when below `max_running` (always spawns at zero)
    pub spawn_probability: f64,
    /// Per-execution chance of emitting a data operation each tick
    pub data_op_probability: f64,
    /// Per-execution chance of a forced stop each tick
    pub stop_probability: f64,
    /// Duration a running execution must exceed to complete naturally
    pub completion_threshold_secs: UniformRange,
    /// Display-only record count assigned at spawn
    pub data_processed: UniformRange,
    /// Records affected by a synthetic data operation
    pub records_affected: UniformRange,
    /// Timestamp offset between staggered completion write-backs
    pub completion_stagger_ms: u64,
    pub execution_capacity: usize,
    pub data_operation_capacity: usize,
    pub alert_capacity: usize,
    pub data_operation_weights: DataOperationWeights,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            tick_delta_secs: 2,
            max_running: 3,
            spawn_probability: 0.3,
            data_op_probability: 0.3,
            stop_probability: 0.02,
            completion_threshold_secs: UniformRange::new(3, 15),
            data_processed: UniformRange::new(100, 5000),
            records_affected: UniformRange::new(1, 250),
            completion_stagger_ms: 500,
            execution_capacity: 50,
            data_operation_capacity: 100,
            alert_capacity: 20,
            data_operation_weights: DataOperationWeights::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".into()));
        }
        if self.max_running == 0 {
            return Err(Error::Config("max_running must be at least 1".into()));
        }
        for (name, p) in [
            ("spawn_probability", self.spawn_probability),
            ("data_op_probability", self.data_op_probability),
            ("stop_probability", self.stop_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, p)));
            }
        }
        for (name, cap) in [
            ("execution_capacity", self.execution_capacity),
            ("data_operation_capacity", self.data_operation_capacity),
            ("alert_capacity", self.alert_capacity),
        ] {
            if cap == 0 {
                return Err(Error::Config(format!("{} must be at least 1", name)));
            }
        }
        if self.execution_capacity < self.max_running {
            return Err(Error::Config(
                "execution_capacity must be at least max_running".into(),
            ));
        }
        self.completion_threshold_secs
            .validate("completion_threshold_secs")?;
        self.data_processed.validate("data_processed")?;
        self.records_affected.validate("records_affected")?;
        if self.data_operation_weights.total() == 0 {
            return Err(Error::Config(
                "data_operation_weights must not all be zero".into(),
            ));
        }
        Ok(())
    }
}

/// Staged-delay windows for the conversational protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Single "thinking" stage used by most requests
    pub default_delay_ms: UniformRange,
    /// Short stage before the pricing optimization call
    pub optimization_delay_ms: UniformRange,
    /// First (research) stage of the market-conditions request
    pub research_delay_ms: UniformRange,
    /// Second (reasoning) stage of the market-conditions request
    pub reasoning_delay_ms: UniformRange,
    /// Upper bound on the pricing service call before degrading
    pub pricing_timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: UniformRange::new(1000, 2000),
            optimization_delay_ms: UniformRange::new(800, 1500),
            research_delay_ms: UniformRange::new(8000, 10000),
            reasoning_delay_ms: UniformRange::new(3000, 4000),
            pricing_timeout_ms: 10_000,
        }
    }
}

impl ChatConfig {
    pub fn pricing_timeout(&self) -> Duration {
        Duration::from_millis(self.pricing_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        self.default_delay_ms.validate("default_delay_ms")?;
        self.optimization_delay_ms.validate("optimization_delay_ms")?;
        self.research_delay_ms.validate("research_delay_ms")?;
        self.reasoning_delay_ms.validate("reasoning_delay_ms")?;
        if self.pricing_timeout_ms == 0 {
            return Err(Error::Config("pricing_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Connection settings for the HTTP pricing service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for PricingServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSimConfig {
    pub simulation: SimulationConfig,
    pub chat: ChatConfig,
    pub pricing: PricingServiceConfig,
}

impl AgentSimConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.chat.validate()?;
        Ok(())
    }
}
