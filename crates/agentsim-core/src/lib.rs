//! AgentSim Core - simulation, monitoring and chat primitives
//!
//! This crate provides the building blocks of the agent activity simulator:
//! - Agent catalog and per-agent operation vocabularies
//! - Bounded ledgers for executions, data operations and alerts
//! - Tick scheduler driven by a pluggable random policy
//! - Per-agent success rate and duration analytics
//! - Conversational agent protocol with a real pricing side effect

pub mod alert;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod data_operation;
pub mod error;
pub mod execution;
pub mod ledger;
pub mod performance;
pub mod policy;
pub mod pricing;
pub mod scheduler;
pub mod simulation;

pub use alert::{
    AlertArchetype, AlertDetails, AlertGenerator, AlertLedger, AlertMetric, AlertSeverity,
    MonitoringAlert,
};
pub use catalog::{AgentCatalog, AgentEntry, AgentKind, AgentStatus, TABLES};
pub use chat::{
    ChatManager, ChatMessage, ChatRole, ChatSession, MessageMetadata, MessageStatus, RequestPhase,
};
pub use config::{
    AgentSimConfig, ChatConfig, DataOperationWeights, PricingServiceConfig, SimulationConfig,
    UniformRange,
};
pub use data_operation::{DataOperation, DataOperationKind, DataOperationLog};
pub use error::{Error, Result};
pub use execution::{AgentExecution, ExecutionLedger, ExecutionStatus};
pub use ledger::BoundedLedger;
pub use performance::{AgentPerformance, PerformanceReport};
pub use policy::{RandomPolicy, SeededPolicy};
pub use pricing::{
    HttpPricingService, InMemoryCatalogCache, PricingOutcome, PricingService, ProductCatalogCache,
    PRICING_CACHE_KEYS,
};
pub use scheduler::{AgentActivity, SimulationState, TickReport, TickScheduler};
pub use simulation::{DashboardSummary, SimulationCore, SimulationEvent};
