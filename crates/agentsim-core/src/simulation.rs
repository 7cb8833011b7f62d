//! Simulation core
//!
//! Owns the ledgers and the random policy and drives the tick scheduler on a
//! fixed period. Readers (dashboard, chat) receive an `Arc<SimulationCore>`
//! and only ever take the read lock, so they observe either the pre-tick or
//! the post-tick state.
//!
//! ## Concurrency
//!
//! A single driver task runs the ticks. It uses a `tokio::time::interval`
//! with `MissedTickBehavior::Skip`, so a slow tick delays the next one rather
//! than overlapping it. `tick_now` serializes with the driver through the
//! policy lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alert::MonitoringAlert;
use crate::catalog::{AgentKind, AgentStatus};
use crate::config::SimulationConfig;
use crate::data_operation::DataOperation;
use crate::execution::{AgentExecution, ExecutionStatus};
use crate::performance::PerformanceReport;
use crate::policy::{RandomPolicy, SeededPolicy};
use crate::scheduler::{SimulationState, TickReport, TickScheduler};
use crate::Result;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events published to live observers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// A tick was fully applied
    Tick { report: TickReport },
    /// An execution was force-stopped and an alert raised
    Alert { alert: MonitoringAlert },
    /// The driver started or stopped
    Lifecycle { running: bool },
}

/// Aggregate numbers for the dashboard header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub tick_count: u64,
    pub driver_running: bool,
    pub running: usize,
    pub completed: usize,
    pub stopped: usize,
    pub max_running: usize,
    pub executions_started: u64,
    pub data_operations_recorded: u64,
    pub alerts_raised: u64,
    pub active_agents: usize,
    pub generated_at: DateTime<Utc>,
}

struct Driver {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct SimulationCore {
    state: RwLock<SimulationState>,
    policy: Mutex<Box<dyn RandomPolicy>>,
    events: broadcast::Sender<SimulationEvent>,
    driver: StdMutex<Option<Driver>>,
    tick_interval: Duration,
}

impl SimulationCore {
    /// Create a core with a policy seeded from `config.seed` (entropy when unset)
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let policy = SeededPolicy::from_optional_seed(config.seed);
        Self::with_policy(config, Box::new(policy))
    }

    /// Create a core with an injected policy
    pub fn with_policy(config: SimulationConfig, policy: Box<dyn RandomPolicy>) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            tick_interval: config.tick_interval(),
            state: RwLock::new(SimulationState::new(config)),
            policy: Mutex::new(policy),
            events,
            driver: StdMutex::new(None),
        })
    }

    /// Subscribe to tick and alert events
    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.events.subscribe()
    }

    /// Apply one tick immediately
    pub async fn tick_now(&self) -> TickReport {
        self.apply_tick(None).await
    }

    /// Apply one tick stamped with `now`. A timestamp older than the previous
    /// tick is clamped to it.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        self.apply_tick(Some(now)).await
    }

    async fn apply_tick(&self, at: Option<DateTime<Utc>>) -> TickReport {
        let mut policy = self.policy.lock().await;
        let (report, alerts) = {
            let mut state = self.state.write().await;
            // Read the clock only once the writer is exclusive
            let now = at.unwrap_or_else(Utc::now);
            let report = TickScheduler::tick(&mut state, now, &mut **policy);
            let alerts: Vec<MonitoringAlert> = report
                .alerts
                .iter()
                .filter_map(|id| state.alerts.get(*id).cloned())
                .collect();
            (report, alerts)
        };
        drop(policy);

        // No subscribers is fine
        for alert in alerts {
            let _ = self.events.send(SimulationEvent::Alert { alert });
        }
        let _ = self.events.send(SimulationEvent::Tick {
            report: report.clone(),
        });
        report
    }

    /// Start the periodic driver. Returns false if it was already running.
    pub fn start(self: &std::sync::Arc<Self>) -> bool {
        let mut driver = self.driver.lock().unwrap_or_else(|e| e.into_inner());
        if driver.as_ref().map_or(false, |d| !d.handle.is_finished()) {
            debug!("Simulation driver already running");
            return false;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let core = std::sync::Arc::clone(self);
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            info!(tick_interval_ms = period.as_millis() as u64, "Starting simulation driver");
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        core.tick_now().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Simulation driver stopped");
        });

        *driver = Some(Driver { shutdown, handle });
        let _ = self.events.send(SimulationEvent::Lifecycle { running: true });
        true
    }

    /// Stop the driver, waiting for any in-flight tick to finish. Returns
    /// false if it was not running.
    pub async fn stop(&self) -> bool {
        let driver = {
            let mut guard = self.driver.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        let Some(driver) = driver else {
            return false;
        };

        let _ = driver.shutdown.send(true);
        if let Err(e) = driver.handle.await {
            warn!(error = %e, "Simulation driver task ended abnormally");
        }
        let _ = self.events.send(SimulationEvent::Lifecycle { running: false });
        true
    }

    pub fn is_running(&self) -> bool {
        self.driver
            .lock()
            .map(|d| d.as_ref().map_or(false, |d| !d.handle.is_finished()))
            .unwrap_or(false)
    }

    // ==================== Read views ====================

    /// Most-recent-first executions, optionally filtered by status and agent
    pub async fn executions(
        &self,
        limit: Option<usize>,
        status: Option<ExecutionStatus>,
        agent: Option<AgentKind>,
    ) -> Vec<AgentExecution> {
        self.state
            .read()
            .await
            .executions
            .snapshot(limit, status, agent.map(|k| k.as_str()))
    }

    pub async fn execution(&self, id: Uuid) -> Option<AgentExecution> {
        self.state.read().await.executions.get(id).cloned()
    }

    pub async fn data_operations(&self, limit: Option<usize>) -> Vec<DataOperation> {
        self.state.read().await.data_operations.snapshot(limit)
    }

    pub async fn alerts(&self, limit: Option<usize>) -> Vec<MonitoringAlert> {
        self.state.read().await.alerts.snapshot(limit)
    }

    pub async fn alert(&self, id: Uuid) -> Option<MonitoringAlert> {
        self.state.read().await.alerts.get(id).cloned()
    }

    pub async fn running_count(&self) -> usize {
        self.state.read().await.executions.running_count()
    }

    pub async fn agent_statuses(&self) -> Vec<AgentStatus> {
        self.state.read().await.agent_statuses()
    }

    pub async fn agent_status(&self, kind: AgentKind) -> Option<AgentStatus> {
        self.agent_statuses()
            .await
            .into_iter()
            .find(|s| s.name == kind.as_str())
    }

    /// Success rate and duration figures over the executions still retained
    pub async fn performance(&self) -> PerformanceReport {
        PerformanceReport::from_executions(self.state.read().await.executions.iter())
    }

    pub async fn summary(&self) -> DashboardSummary {
        let driver_running = self.is_running();
        let state = self.state.read().await;
        DashboardSummary {
            tick_count: state.tick_count,
            driver_running,
            running: state.executions.count_by_status(ExecutionStatus::Running),
            completed: state.executions.count_by_status(ExecutionStatus::Completed),
            stopped: state.executions.count_by_status(ExecutionStatus::Stopped),
            max_running: state.config.max_running,
            executions_started: state.total_executions(),
            data_operations_recorded: state.data_operations.total_recorded(),
            alerts_raised: state.alerts_raised,
            active_agents: state.catalog.active().len(),
            generated_at: Utc::now(),
        }
    }

    /// Toggle whether an agent may be picked for new executions
    pub async fn set_agent_active(&self, kind: AgentKind, active: bool) {
        self.state.write().await.catalog.set_active(kind, active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seeded_core() -> Arc<SimulationCore> {
        let config = SimulationConfig {
            seed: Some(7),
            ..Default::default()
        };
        Arc::new(SimulationCore::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_tick_now_spawns_first_execution() {
        let core = seeded_core();
        assert_eq!(core.running_count().await, 0);

        let report = core.tick_now().await;
        assert_eq!(report.tick, 1);
        assert!(core.running_count().await >= 1);
        assert_eq!(core.executions(None, None, None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            max_running: 0,
            ..Default::default()
        };
        assert!(SimulationCore::new(config).is_err());
    }

    #[tokio::test]
    async fn test_snapshots_are_idempotent() {
        let core = seeded_core();
        for _ in 0..25 {
            core.tick_now().await;
        }
        assert_eq!(core.executions(Some(10), None, None).await, core.executions(Some(10), None, None).await);
        assert_eq!(core.data_operations(Some(10)).await, core.data_operations(Some(10)).await);
        assert_eq!(core.alerts(Some(10)).await, core.alerts(Some(10)).await);
    }

    #[tokio::test]
    async fn test_events_published_per_tick() {
        let core = seeded_core();
        let mut rx = core.subscribe();
        core.tick_now().await;

        match rx.recv().await.unwrap() {
            SimulationEvent::Tick { report } => assert_eq!(report.tick, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_ticks_on_period_and_stops() {
        let core = seeded_core();
        assert!(core.start());
        assert!(!core.start());
        assert!(core.is_running());

        // First interval tick fires immediately, then every 2s
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        let ticks = core.summary().await.tick_count;
        assert_eq!(ticks, 3);

        assert!(core.stop().await);
        assert!(!core.is_running());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(core.summary().await.tick_count, ticks);
        assert!(!core.stop().await);
    }

    #[tokio::test]
    async fn test_tick_at_in_the_past_keeps_ledger_ordered() {
        let config = SimulationConfig {
            seed: Some(7),
            spawn_probability: 1.0,
            stop_probability: 0.0,
            ..Default::default()
        };
        let core = SimulationCore::new(config).unwrap();
        let later = Utc::now() + chrono::Duration::seconds(30);

        core.tick_at(later).await;
        let report = core.tick_at(later - chrono::Duration::milliseconds(5)).await;
        assert_eq!(report.timestamp, later);

        let executions = core.executions(None, None, None).await;
        assert_eq!(executions.len(), 2);
        assert!(executions
            .windows(2)
            .all(|pair| pair[0].start_time >= pair[1].start_time));
    }

    #[tokio::test]
    async fn test_agent_filter_and_performance() {
        let core = seeded_core();
        for _ in 0..40 {
            core.tick_now().await;
        }

        let all = core.executions(None, None, None).await;
        let pricing = core.executions(None, None, Some(AgentKind::Pricing)).await;
        assert!(pricing.iter().all(|e| e.agent_name == "PricingAgent"));
        assert_eq!(
            pricing.len(),
            all.iter().filter(|e| e.agent_name == "PricingAgent").count()
        );

        let report = core.performance().await;
        assert_eq!(report.total_executions, all.len());
        let status = core.agent_status(AgentKind::Pricing).await.unwrap();
        assert_eq!(status.name, "PricingAgent");
        assert_eq!(status.running, pricing.iter().filter(|e| e.is_running()).count());
    }

    #[tokio::test]
    async fn test_deactivated_agent_reported() {
        let core = seeded_core();
        core.set_agent_active(AgentKind::Seo, false).await;
        let statuses = core.agent_statuses().await;
        let seo = statuses.iter().find(|s| s.name == "SEOAgent").unwrap();
        assert!(!seo.is_active);
        assert_eq!(core.summary().await.active_agents, AgentKind::ALL.len() - 1);
    }
}
