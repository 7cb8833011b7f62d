//! Agent performance analytics derived from the execution ledger
//!
//! Success rate is `completed / (completed + stopped)` as a percentage and
//! average duration covers terminal executions only. Both are `None` until
//! an agent has finished something. Figures cover the executions still held
//! by the ledger.

use serde::{Deserialize, Serialize};

use crate::catalog::AgentKind;
use crate::execution::{AgentExecution, ExecutionStatus};

/// Counters for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub name: String,
    pub executions: usize,
    pub running: usize,
    pub completed: usize,
    pub stopped: usize,
    pub success_rate: Option<f64>,
    pub average_duration_secs: Option<f64>,
}

/// Totals plus a per-agent breakdown in catalog order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_executions: usize,
    pub completed: usize,
    pub stopped: usize,
    pub success_rate: Option<f64>,
    pub average_duration_secs: Option<f64>,
    pub agents: Vec<AgentPerformance>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    executions: usize,
    running: usize,
    completed: usize,
    stopped: usize,
    terminal_duration: u64,
}

impl Tally {
    fn add(&mut self, execution: &AgentExecution) {
        self.executions += 1;
        match execution.status {
            ExecutionStatus::Running => self.running += 1,
            ExecutionStatus::Completed => self.completed += 1,
            ExecutionStatus::Stopped => self.stopped += 1,
        }
        if execution.status.is_terminal() {
            self.terminal_duration += execution.duration;
        }
    }

    fn terminal(&self) -> usize {
        self.completed + self.stopped
    }

    fn success_rate(&self) -> Option<f64> {
        let terminal = self.terminal();
        (terminal > 0).then(|| round1(self.completed as f64 * 100.0 / terminal as f64))
    }

    fn average_duration(&self) -> Option<f64> {
        let terminal = self.terminal();
        (terminal > 0).then(|| round1(self.terminal_duration as f64 / terminal as f64))
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl PerformanceReport {
    pub fn from_executions<'a>(executions: impl IntoIterator<Item = &'a AgentExecution>) -> Self {
        let mut total = Tally::default();
        let mut per_agent = [Tally::default(); AgentKind::ALL.len()];

        for execution in executions {
            total.add(execution);
            if let Some(i) = AgentKind::ALL
                .iter()
                .position(|k| k.as_str() == execution.agent_name)
            {
                per_agent[i].add(execution);
            }
        }

        let agents = AgentKind::ALL
            .iter()
            .zip(per_agent.iter())
            .map(|(kind, tally)| AgentPerformance {
                name: kind.as_str().to_string(),
                executions: tally.executions,
                running: tally.running,
                completed: tally.completed,
                stopped: tally.stopped,
                success_rate: tally.success_rate(),
                average_duration_secs: tally.average_duration(),
            })
            .collect();

        Self {
            total_executions: total.executions,
            completed: total.completed,
            stopped: total.stopped,
            success_rate: total.success_rate(),
            average_duration_secs: total.average_duration(),
            agents,
        }
    }

    pub fn agent(&self, kind: AgentKind) -> Option<&AgentPerformance> {
        self.agents.iter().find(|a| a.name == kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn finished(agent: &str, duration: u64, status: ExecutionStatus) -> AgentExecution {
        let mut execution = AgentExecution::new(agent, "Working", Utc::now());
        execution.duration = duration;
        if status.is_terminal() {
            execution.transition_to(status, Utc::now()).unwrap();
        }
        execution
    }

    #[test]
    fn test_empty_ledger_has_no_rates() {
        let report = PerformanceReport::from_executions(&[]);
        assert_eq!(report.total_executions, 0);
        assert_eq!(report.success_rate, None);
        assert_eq!(report.average_duration_secs, None);
        assert_eq!(report.agents.len(), AgentKind::ALL.len());
    }

    #[test]
    fn test_success_rate_and_average_duration() {
        let executions = vec![
            finished("PricingAgent", 4, ExecutionStatus::Completed),
            finished("PricingAgent", 6, ExecutionStatus::Completed),
            finished("PricingAgent", 8, ExecutionStatus::Stopped),
            finished("PricingAgent", 20, ExecutionStatus::Running),
            finished("SEOAgent", 10, ExecutionStatus::Stopped),
        ];
        let report = PerformanceReport::from_executions(&executions);

        assert_eq!(report.total_executions, 5);
        assert_eq!(report.completed, 2);
        assert_eq!(report.stopped, 2);
        assert_eq!(report.success_rate, Some(50.0));
        // (4 + 6 + 8 + 10) / 4; running executions are excluded
        assert_eq!(report.average_duration_secs, Some(7.0));

        let pricing = report.agent(AgentKind::Pricing).unwrap();
        assert_eq!(pricing.executions, 4);
        assert_eq!(pricing.running, 1);
        assert_eq!(pricing.success_rate, Some(66.7));
        assert_eq!(pricing.average_duration_secs, Some(6.0));

        let seo = report.agent(AgentKind::Seo).unwrap();
        assert_eq!(seo.success_rate, Some(0.0));

        let inventory = report.agent(AgentKind::Inventory).unwrap();
        assert_eq!(inventory.executions, 0);
        assert_eq!(inventory.success_rate, None);
    }
}
