//! Agent execution lifecycle and the execution ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::BoundedLedger;
use crate::{Error, Result};

/// Execution states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Work in progress
    Running,
    /// Finished naturally
    Completed,
    /// Interrupted by a forced stop
    Stopped,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Stopped => "stopped",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "stopped" => Ok(ExecutionStatus::Stopped),
            _ => Err(Error::Parse(format!("Unknown execution status: {}", s))),
        }
    }

    pub fn can_transition_to(&self, target: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!((self, target), (Running, Completed) | (Running, Stopped))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Stopped)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One simulated unit of agent work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecution {
    pub id: Uuid,
    pub agent_name: String,
    pub operation: String,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,
    /// Elapsed seconds; frozen once terminal
    pub duration: u64,
    pub data_processed: u64,
    /// Duration the execution must exceed to complete naturally
    #[serde(skip)]
    pub completion_threshold: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl AgentExecution {
    pub fn new(
        agent_name: impl Into<String>,
        operation: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_name: agent_name.into(),
            operation: operation.into(),
            status: ExecutionStatus::Running,
            start_time,
            duration: 0,
            data_processed: 0,
            completion_threshold: u64::MAX,
            ended_at: None,
        }
    }

    pub fn with_data_processed(mut self, records: u64) -> Self {
        self.data_processed = records;
        self
    }

    pub fn with_completion_threshold(mut self, secs: u64) -> Self {
        self.completion_threshold = secs;
        self
    }

    pub fn is_running(&self) -> bool {
        self.status == ExecutionStatus::Running
    }

    /// Whether the duration has passed the completion threshold
    pub fn is_due(&self) -> bool {
        self.duration > self.completion_threshold
    }

    /// Transition to a new status, stamping the end time on terminal states
    pub fn transition_to(&mut self, target: ExecutionStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(Error::InvalidStateTransition(
                self.status.as_str().to_string(),
                target.as_str().to_string(),
            ));
        }
        self.status = target;
        if target.is_terminal() {
            self.ended_at = Some(now);
        }
        Ok(())
    }
}

/// Bounded ledger of executions, displayed most-recent-first
#[derive(Debug, Clone)]
pub struct ExecutionLedger {
    inner: BoundedLedger<AgentExecution>,
}

impl ExecutionLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedLedger::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Append a new execution. When at capacity the oldest entry is dropped.
    ///
    /// Executions are appended in start-time order by the scheduler, so
    /// insertion order equals start-time order.
    pub fn append(&mut self, execution: AgentExecution) -> Option<AgentExecution> {
        debug_assert!(
            self.inner
                .iter()
                .last()
                .map_or(true, |last| last.start_time <= execution.start_time),
            "executions must be appended in start-time order"
        );
        self.inner.push(execution)
    }

    /// Move an execution to a new status. Terminal executions can never be
    /// resurrected.
    pub fn update_status(
        &mut self,
        id: Uuid,
        status: ExecutionStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let execution = self
            .inner
            .find_mut(|e| e.id == id)
            .ok_or_else(|| Error::ExecutionNotFound(id.to_string()))?;
        execution.transition_to(status, now)
    }

    /// Add `delta_secs` to every running execution
    pub fn advance_durations(&mut self, delta_secs: u64) {
        for execution in self.inner.iter_mut().filter(|e| e.is_running()) {
            execution.duration = execution.duration.saturating_add(delta_secs);
        }
    }

    /// Up to `limit` executions, most-recent-first, optionally filtered by
    /// status and agent name
    pub fn snapshot(
        &self,
        limit: Option<usize>,
        status: Option<ExecutionStatus>,
        agent: Option<&str>,
    ) -> Vec<AgentExecution> {
        let limit = limit.unwrap_or(self.inner.capacity());
        self.inner
            .iter_recent()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .filter(|e| agent.map_or(true, |a| e.agent_name == a))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<&AgentExecution> {
        self.inner.find(|e| e.id == id)
    }

    pub fn running_count(&self) -> usize {
        self.inner.iter().filter(|e| e.is_running()).count()
    }

    /// Ids of running executions in start order
    pub fn running_ids(&self) -> Vec<Uuid> {
        self.inner
            .iter()
            .filter(|e| e.is_running())
            .map(|e| e.id)
            .collect()
    }

    pub fn count_by_status(&self, status: ExecutionStatus) -> usize {
        self.inner.iter().filter(|e| e.status == status).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentExecution> {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn execution_at(offset_secs: i64) -> AgentExecution {
        let start = Utc::now() + Duration::seconds(offset_secs);
        AgentExecution::new("InventoryAgent", "Analyzing stock levels", start)
            .with_completion_threshold(5)
    }

    #[test]
    fn test_status_transitions() {
        use ExecutionStatus::*;
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Stopped));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Stopped.can_transition_to(Completed));
        assert!(!Running.can_transition_to(Running));
        assert!(Completed.is_terminal() && Stopped.is_terminal());
        assert!(!Running.is_terminal());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            ExecutionStatus::Running,
            ExecutionStatus::Completed,
            ExecutionStatus::Stopped,
        ] {
            assert_eq!(ExecutionStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(ExecutionStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_terminal_execution_cannot_be_resurrected() {
        let mut ledger = ExecutionLedger::new(10);
        let execution = execution_at(0);
        let id = execution.id;
        ledger.append(execution);

        ledger
            .update_status(id, ExecutionStatus::Completed, Utc::now())
            .unwrap();
        let err = ledger
            .update_status(id, ExecutionStatus::Running, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition(_, _)));

        let err = ledger
            .update_status(id, ExecutionStatus::Stopped, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition(_, _)));
        assert_eq!(ledger.get(id).unwrap().status, ExecutionStatus::Completed);
    }

    #[test]
    fn test_update_unknown_execution() {
        let mut ledger = ExecutionLedger::new(10);
        let err = ledger
            .update_status(Uuid::new_v4(), ExecutionStatus::Stopped, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::ExecutionNotFound(_)));
    }

    #[test]
    fn test_durations_freeze_once_terminal() {
        let mut ledger = ExecutionLedger::new(10);
        let a = execution_at(0);
        let b = execution_at(1);
        let (a_id, b_id) = (a.id, b.id);
        ledger.append(a);
        ledger.append(b);

        ledger.advance_durations(2);
        ledger
            .update_status(a_id, ExecutionStatus::Stopped, Utc::now())
            .unwrap();
        ledger.advance_durations(2);
        ledger.advance_durations(2);

        assert_eq!(ledger.get(a_id).unwrap().duration, 2);
        assert_eq!(ledger.get(b_id).unwrap().duration, 6);
        assert!(ledger.get(a_id).unwrap().ended_at.is_some());
    }

    #[test]
    fn test_snapshot_order_filter_and_eviction() {
        let mut ledger = ExecutionLedger::new(3);
        let executions: Vec<_> = (0..5).map(execution_at).collect();
        let ids: Vec<_> = executions.iter().map(|e| e.id).collect();
        for execution in executions {
            ledger.append(execution);
        }

        assert_eq!(ledger.len(), 3);
        let snapshot: Vec<_> = ledger.snapshot(None, None, None).iter().map(|e| e.id).collect();
        assert_eq!(snapshot, vec![ids[4], ids[3], ids[2]]);

        ledger
            .update_status(ids[3], ExecutionStatus::Completed, Utc::now())
            .unwrap();
        let running = ledger.snapshot(None, Some(ExecutionStatus::Running), None);
        assert_eq!(running.len(), 2);
        assert_eq!(ledger.running_count(), 2);
        assert_eq!(ledger.running_ids(), vec![ids[2], ids[4]]);

        assert_eq!(ledger.snapshot(Some(1), None, None), ledger.snapshot(Some(1), None, None));
    }

    #[test]
    fn test_snapshot_filters_by_agent() {
        let mut ledger = ExecutionLedger::new(10);
        let start = Utc::now();
        for (i, agent) in ["PricingAgent", "SEOAgent", "PricingAgent"].iter().enumerate() {
            ledger.append(AgentExecution::new(
                *agent,
                "Working",
                start + Duration::seconds(i as i64),
            ));
        }
        let first_pricing = ledger.iter().next().unwrap().id;
        ledger
            .update_status(first_pricing, ExecutionStatus::Completed, Utc::now())
            .unwrap();

        let pricing = ledger.snapshot(None, None, Some("PricingAgent"));
        assert_eq!(pricing.len(), 2);
        assert!(pricing.iter().all(|e| e.agent_name == "PricingAgent"));
        assert_eq!(pricing[1].id, first_pricing);

        let completed = ledger.snapshot(None, Some(ExecutionStatus::Completed), Some("PricingAgent"));
        assert_eq!(completed.len(), 1);
        assert!(ledger.snapshot(None, None, Some("MarketingAgent")).is_empty());
    }

    #[test]
    fn test_completion_threshold_is_not_serialized() {
        let execution = execution_at(0);
        let json = serde_json::to_value(&execution).unwrap();
        assert!(json.get("completion_threshold").is_none());
        assert_eq!(json["status"], "running");
        assert_eq!(json["agent_name"], "InventoryAgent");
    }
}
