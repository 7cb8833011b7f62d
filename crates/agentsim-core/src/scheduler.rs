//! Tick scheduler
//!
//! One tick applies five steps, in order, to every execution before it
//! returns:
//!
//! 1. spawn check (always spawn when nothing is running)
//! 2. advance durations of running executions
//! 3. emit data operations for running executions
//! 4. forced stop, raising one alert per stopped execution
//! 5. natural completion, emitting one or two staggered write-backs
//!
//! A forced stop wins over a completion in the same tick. The function is a
//! synchronous state transition; the async driver lives in
//! [`crate::simulation`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::alert::{AlertGenerator, AlertLedger};
use crate::catalog::{AgentCatalog, AgentKind, AgentStatus};
use crate::config::SimulationConfig;
use crate::data_operation::{DataOperation, DataOperationLog};
use crate::execution::{AgentExecution, ExecutionLedger, ExecutionStatus};
use crate::policy::RandomPolicy;

/// Lifetime counters for one agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentActivity {
    pub execution_count: u64,
    pub last_execution: Option<DateTime<Utc>>,
}

/// Everything the scheduler mutates
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub config: SimulationConfig,
    pub catalog: AgentCatalog,
    pub executions: ExecutionLedger,
    pub data_operations: DataOperationLog,
    pub alerts: AlertLedger,
    pub tick_count: u64,
    pub alerts_raised: u64,
    /// Timestamp of the most recent tick; later ticks never go below it
    pub last_tick_at: Option<DateTime<Utc>>,
    activity: HashMap<AgentKind, AgentActivity>,
}

impl SimulationState {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            executions: ExecutionLedger::new(config.execution_capacity),
            data_operations: DataOperationLog::new(config.data_operation_capacity),
            alerts: AlertLedger::new(config.alert_capacity),
            catalog: AgentCatalog::default(),
            tick_count: 0,
            alerts_raised: 0,
            last_tick_at: None,
            activity: HashMap::new(),
            config,
        }
    }

    /// Per-agent status report in catalog order
    pub fn agent_statuses(&self) -> Vec<AgentStatus> {
        self.catalog
            .entries()
            .iter()
            .map(|entry| {
                let activity = self.activity.get(&entry.kind).cloned().unwrap_or_default();
                let running = self
                    .executions
                    .iter()
                    .filter(|e| e.is_running() && e.agent_name == entry.kind.as_str())
                    .count();
                AgentStatus {
                    name: entry.kind.as_str().to_string(),
                    description: entry.kind.description().to_string(),
                    is_active: entry.is_active,
                    last_execution: activity.last_execution,
                    execution_count: activity.execution_count,
                    running,
                }
            })
            .collect()
    }

    pub fn total_executions(&self) -> u64 {
        self.activity.values().map(|a| a.execution_count).sum()
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub spawned: Vec<Uuid>,
    pub data_operations: usize,
    pub stopped: Vec<Uuid>,
    pub completed: Vec<Uuid>,
    pub alerts: Vec<Uuid>,
    pub running: usize,
}

pub struct TickScheduler;

impl TickScheduler {
    /// Apply one tick at `now`
    pub fn tick(
        state: &mut SimulationState,
        now: DateTime<Utc>,
        policy: &mut dyn RandomPolicy,
    ) -> TickReport {
        let now = match state.last_tick_at {
            Some(last) if now < last => {
                warn!(requested = %now, last = %last, "Tick clock went backwards, clamping");
                last
            }
            _ => now,
        };
        state.last_tick_at = Some(now);
        state.tick_count += 1;
        let mut report = TickReport {
            tick: state.tick_count,
            timestamp: now,
            ..Default::default()
        };

        if let Some(id) = Self::spawn_check(state, now, policy) {
            report.spawned.push(id);
        }

        state.executions.advance_durations(state.config.tick_delta_secs);

        let running = state.executions.running_ids();
        report.data_operations += Self::emit_work(state, &running, now, policy);

        for id in running {
            let Some(execution) = state.executions.get(id) else {
                continue;
            };
            let agent_name = execution.agent_name.clone();

            if policy.should_stop(state.config.stop_probability) {
                if Self::finish(state, id, ExecutionStatus::Stopped, now) {
                    let alert = AlertGenerator::generate(&agent_name, now, policy);
                    warn!(
                        execution_id = %id,
                        agent = %agent_name,
                        reason = %alert.reason,
                        severity = %alert.severity,
                        "Execution stopped"
                    );
                    report.alerts.push(alert.id);
                    state.alerts.append(alert);
                    state.alerts_raised += 1;
                    report.stopped.push(id);
                }
                continue;
            }

            let due = state
                .executions
                .get(id)
                .map_or(false, |e| policy.should_complete(e));
            if due && Self::finish(state, id, ExecutionStatus::Completed, now) {
                report.data_operations += Self::emit_write_backs(state, &agent_name, now, policy);
                report.completed.push(id);
            }
        }

        report.running = state.executions.running_count();
        debug_assert!(report.running <= state.config.max_running);
        debug!(
            tick = report.tick,
            running = report.running,
            spawned = report.spawned.len(),
            stopped = report.stopped.len(),
            completed = report.completed.len(),
            "Tick applied"
        );
        report
    }

    fn spawn_check(
        state: &mut SimulationState,
        now: DateTime<Utc>,
        policy: &mut dyn RandomPolicy,
    ) -> Option<Uuid> {
        let running = state.executions.running_count();
        let should_spawn = running == 0
            || (running < state.config.max_running
                && policy.should_spawn(state.config.spawn_probability));
        if !should_spawn {
            return None;
        }

        let active = state.catalog.active();
        let Some(agent) = policy.pick_agent(&active) else {
            debug!("No active agents, skipping spawn");
            return None;
        };
        let operation = policy.pick_operation(agent);
        let execution = AgentExecution::new(agent.as_str(), operation, now)
            .with_data_processed(policy.in_range(state.config.data_processed))
            .with_completion_threshold(
                policy.pick_completion_threshold(state.config.completion_threshold_secs),
            );
        let id = execution.id;

        info!(
            execution_id = %id,
            agent = %agent,
            operation = %operation,
            "Execution started"
        );

        let activity = state.activity.entry(agent).or_default();
        activity.execution_count += 1;
        activity.last_execution = Some(now);

        if let Some(evicted) = state.executions.append(execution) {
            if evicted.is_running() {
                error!(
                    execution_id = %evicted.id,
                    "Evicted a running execution; capacity is below max_running"
                );
            }
        }
        Some(id)
    }

    fn emit_work(
        state: &mut SimulationState,
        running: &[Uuid],
        now: DateTime<Utc>,
        policy: &mut dyn RandomPolicy,
    ) -> usize {
        let mut emitted = 0;
        for id in running {
            if !policy.should_emit_data_op(state.config.data_op_probability) {
                continue;
            }
            let Some(agent_name) = state.executions.get(*id).map(|e| e.agent_name.clone()) else {
                continue;
            };
            let op = Self::synthetic_operation(state, &agent_name, now, policy);
            state.data_operations.record(op);
            emitted += 1;
        }
        emitted
    }

    fn emit_write_backs(
        state: &mut SimulationState,
        agent_name: &str,
        now: DateTime<Utc>,
        policy: &mut dyn RandomPolicy,
    ) -> usize {
        let count = policy.completion_write_backs();
        let stagger = Duration::milliseconds(state.config.completion_stagger_ms as i64);
        for n in 0..count {
            let at = now + stagger * n as i32;
            let op = Self::synthetic_operation(state, agent_name, at, policy);
            state.data_operations.record(op);
        }
        count
    }

    fn synthetic_operation(
        state: &SimulationState,
        agent_name: &str,
        at: DateTime<Utc>,
        policy: &mut dyn RandomPolicy,
    ) -> DataOperation {
        let kind = policy.pick_data_operation(&state.config.data_operation_weights);
        DataOperation::new(
            agent_name,
            policy.pick_table(),
            kind,
            policy.in_range(state.config.records_affected),
            at,
        )
    }

    /// Move an execution to a terminal status. A failure here is a scheduler
    /// bug: it trips in debug builds and is logged and skipped otherwise so
    /// later executions and ticks still run.
    fn finish(
        state: &mut SimulationState,
        id: Uuid,
        status: ExecutionStatus,
        now: DateTime<Utc>,
    ) -> bool {
        match state.executions.update_status(id, status, now) {
            Ok(()) => {
                if status == ExecutionStatus::Completed {
                    info!(execution_id = %id, "Execution completed");
                }
                true
            }
            Err(e) => {
                debug_assert!(false, "scheduler invariant violated: {}", e);
                error!(execution_id = %id, error = %e, "Failed to finish execution");
                false
            }
        }
    }
}
