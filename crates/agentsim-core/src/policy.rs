//! Random policy
//!
//! Every probabilistic decision in the simulation goes through
//! [`RandomPolicy`]. Implementors only provide the two primitives
//! (`unit` and `uniform`); the named decisions have default
//! implementations built on them so a test policy can override just the
//! decision it wants to force.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::alert::AlertArchetype;
use crate::catalog::{AgentKind, TABLES};
use crate::config::{DataOperationWeights, UniformRange};
use crate::data_operation::DataOperationKind;
use crate::execution::AgentExecution;

/// Share of alerts that use the confidence-score archetype
pub const CONFIDENCE_ARCHETYPE_SHARE: f64 = 0.7;

pub trait RandomPolicy: Send {
    /// Uniform sample in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform integer in `[min, max]`
    fn uniform(&mut self, min: u64, max: u64) -> u64;

    fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    fn in_range(&mut self, range: UniformRange) -> u64 {
        self.uniform(range.min, range.max)
    }

    fn pick_agent(&mut self, active: &[AgentKind]) -> Option<AgentKind> {
        if active.is_empty() {
            return None;
        }
        let index = self.uniform(0, active.len() as u64 - 1) as usize;
        active.get(index).copied()
    }

    fn pick_operation(&mut self, agent: AgentKind) -> &'static str {
        let operations = agent.operations();
        let index = self.uniform(0, operations.len() as u64 - 1) as usize;
        operations[index.min(operations.len() - 1)]
    }

    fn should_spawn(&mut self, probability: f64) -> bool {
        self.chance(probability)
    }

    fn should_emit_data_op(&mut self, probability: f64) -> bool {
        self.chance(probability)
    }

    fn should_stop(&mut self, probability: f64) -> bool {
        self.chance(probability)
    }

    fn should_complete(&mut self, execution: &AgentExecution) -> bool {
        execution.is_due()
    }

    fn pick_completion_threshold(&mut self, range: UniformRange) -> u64 {
        self.in_range(range)
    }

    /// Weighted pick; zero-weight verbs are never returned
    fn pick_data_operation(&mut self, weights: &DataOperationWeights) -> DataOperationKind {
        let total = weights.total();
        if total == 0 {
            return DataOperationKind::Select;
        }
        let mut roll = self.uniform(0, total as u64 - 1) as u32;
        for kind in DataOperationKind::ALL {
            let weight = weights.weight_of(kind);
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        DataOperationKind::Select
    }

    fn pick_table(&mut self) -> &'static str {
        let index = self.uniform(0, TABLES.len() as u64 - 1) as usize;
        TABLES[index.min(TABLES.len() - 1)]
    }

    /// Confidence-score archetype ~70%, the other five share the rest uniformly
    fn pick_alert_archetype(&mut self) -> AlertArchetype {
        let roll = self.unit();
        if roll < CONFIDENCE_ARCHETYPE_SHARE {
            return AlertArchetype::ConfidenceScore;
        }
        let others = &AlertArchetype::ALL[1..];
        let scaled = (roll - CONFIDENCE_ARCHETYPE_SHARE) / (1.0 - CONFIDENCE_ARCHETYPE_SHARE);
        let index = ((scaled * others.len() as f64) as usize).min(others.len() - 1);
        others[index]
    }

    /// Metric value in `[low, high]`, rounded to one decimal
    fn pick_metric(&mut self, low: f64, high: f64) -> f64 {
        let value = low + self.unit() * (high - low);
        (value * 10.0).round() / 10.0
    }

    fn pick_delay(&mut self, range_ms: UniformRange) -> Duration {
        Duration::from_millis(self.in_range(range_ms))
    }

    /// Number of write-backs emitted on natural completion (one or two)
    fn completion_write_backs(&mut self) -> usize {
        self.uniform(1, 2) as usize
    }
}

/// [`RandomPolicy`] backed by a seedable `StdRng`
#[derive(Debug, Clone)]
pub struct SeededPolicy {
    rng: StdRng,
}

impl SeededPolicy {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomPolicy for SeededPolicy {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn uniform(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_same_seed_same_decisions() {
        let mut a = SeededPolicy::from_seed(7);
        let mut b = SeededPolicy::from_seed(7);
        for _ in 0..100 {
            assert_eq!(a.uniform(0, 1000), b.uniform(0, 1000));
            assert_eq!(a.pick_alert_archetype(), b.pick_alert_archetype());
        }
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let mut policy = SeededPolicy::from_seed(1);
        for _ in 0..1000 {
            let v = policy.uniform(3, 15);
            assert!((3..=15).contains(&v));
        }
        assert_eq!(policy.uniform(4, 4), 4);
    }

    #[test]
    fn test_data_operation_distribution_is_read_heavy() {
        let mut policy = SeededPolicy::from_seed(2024);
        let weights = DataOperationWeights::default();
        let mut counts: HashMap<DataOperationKind, usize> = HashMap::new();
        for _ in 0..10_000 {
            *counts.entry(policy.pick_data_operation(&weights)).or_default() += 1;
        }

        let select = counts.get(&DataOperationKind::Select).copied().unwrap_or(0);
        assert!(select >= 8_000, "SELECT share too low: {}", select);
        assert_eq!(counts.get(&DataOperationKind::Delete), None);
        assert!(counts.get(&DataOperationKind::Insert).copied().unwrap_or(0) > 0);
        assert!(counts.get(&DataOperationKind::Update).copied().unwrap_or(0) > 0);
    }

    #[test]
    fn test_delete_selectable_when_weighted() {
        let mut policy = SeededPolicy::from_seed(3);
        let weights = DataOperationWeights {
            select: 0,
            insert: 0,
            update: 0,
            delete: 1,
        };
        assert_eq!(policy.pick_data_operation(&weights), DataOperationKind::Delete);
    }

    #[test]
    fn test_alert_archetype_weighting() {
        let mut policy = SeededPolicy::from_seed(99);
        let mut counts: HashMap<AlertArchetype, usize> = HashMap::new();
        for _ in 0..10_000 {
            *counts.entry(policy.pick_alert_archetype()).or_default() += 1;
        }

        let confidence = counts[&AlertArchetype::ConfidenceScore];
        assert!((6_500..=7_500).contains(&confidence), "confidence: {}", confidence);
        for archetype in &AlertArchetype::ALL[1..] {
            let n = counts.get(archetype).copied().unwrap_or(0);
            assert!((400..=800).contains(&n), "{:?}: {}", archetype, n);
        }
    }

    #[test]
    fn test_pick_agent_from_empty_catalog() {
        let mut policy = SeededPolicy::from_seed(5);
        assert!(policy.pick_agent(&[]).is_none());
        assert_eq!(
            policy.pick_agent(&[AgentKind::Pricing]),
            Some(AgentKind::Pricing)
        );
    }

    #[test]
    fn test_metric_in_range() {
        let mut policy = SeededPolicy::from_seed(11);
        for _ in 0..500 {
            let v = policy.pick_metric(45.0, 75.0);
            assert!((45.0..=75.0).contains(&v));
        }
    }
}
