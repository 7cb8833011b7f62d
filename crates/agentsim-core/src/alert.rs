//! Monitoring alerts
//!
//! Alerts are raised when the scheduler force-stops a running execution.
//! Each alert is produced from an [`AlertArchetype`], a fixed template that
//! decides severity, narrative, affected operations and which single metric
//! (if any) is populated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::BoundedLedger;
use crate::policy::RandomPolicy;

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which numeric metric an archetype reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertMetric {
    ConfidenceScore { low: f64, high: f64 },
    DataQuality { low: f64, high: f64 },
    Accuracy { low: f64, high: f64 },
}

/// Alert templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertArchetype {
    ConfidenceScore,
    DataQuality,
    AccuracyDrift,
    AnomalousPattern,
    FeatureImportanceShift,
    LatencySpike,
}

impl AlertArchetype {
    /// Catalog order; the confidence-score archetype comes first
    pub const ALL: [AlertArchetype; 6] = [
        AlertArchetype::ConfidenceScore,
        AlertArchetype::DataQuality,
        AlertArchetype::AccuracyDrift,
        AlertArchetype::AnomalousPattern,
        AlertArchetype::FeatureImportanceShift,
        AlertArchetype::LatencySpike,
    ];

    pub fn reason(&self) -> &'static str {
        match self {
            AlertArchetype::ConfidenceScore => "Low confidence score",
            AlertArchetype::DataQuality => "Data quality degradation",
            AlertArchetype::AccuracyDrift => "Model accuracy drift",
            AlertArchetype::AnomalousPattern => "Anomalous pattern detected",
            AlertArchetype::FeatureImportanceShift => "Feature importance shift",
            AlertArchetype::LatencySpike => "Response latency spike",
        }
    }

    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertArchetype::ConfidenceScore => AlertSeverity::Medium,
            AlertArchetype::DataQuality => AlertSeverity::High,
            AlertArchetype::AccuracyDrift => AlertSeverity::Medium,
            AlertArchetype::AnomalousPattern => AlertSeverity::High,
            AlertArchetype::FeatureImportanceShift => AlertSeverity::Low,
            AlertArchetype::LatencySpike => AlertSeverity::Low,
        }
    }

    pub fn metric(&self) -> Option<AlertMetric> {
        match self {
            AlertArchetype::ConfidenceScore => Some(AlertMetric::ConfidenceScore {
                low: 45.0,
                high: 75.0,
            }),
            AlertArchetype::DataQuality => Some(AlertMetric::DataQuality {
                low: 60.0,
                high: 85.0,
            }),
            AlertArchetype::AccuracyDrift => Some(AlertMetric::Accuracy {
                low: 75.0,
                high: 90.0,
            }),
            _ => None,
        }
    }

    pub fn affected_operations(&self) -> &'static [&'static str] {
        match self {
            AlertArchetype::ConfidenceScore => &["predictions", "decision_making"],
            AlertArchetype::DataQuality => &["data_ingestion", "analytics", "reporting"],
            AlertArchetype::AccuracyDrift => &["predictions", "model_inference"],
            AlertArchetype::AnomalousPattern => &["pattern_recognition", "decision_making"],
            AlertArchetype::FeatureImportanceShift => &["feature_engineering", "model_inference"],
            AlertArchetype::LatencySpike => &["api_responses", "real_time_processing"],
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            AlertArchetype::ConfidenceScore => {
                "Review recent input data and retrain with additional labeled samples"
            }
            AlertArchetype::DataQuality => {
                "Audit upstream data sources and re-run validation on affected tables"
            }
            AlertArchetype::AccuracyDrift => {
                "Schedule model recalibration against the latest sales window"
            }
            AlertArchetype::AnomalousPattern => {
                "Inspect flagged records manually before resuming automated actions"
            }
            AlertArchetype::FeatureImportanceShift => {
                "Compare feature attributions with the previous model version"
            }
            AlertArchetype::LatencySpike => {
                "Check database load and scale read replicas if the spike persists"
            }
        }
    }

    pub fn impact(&self) -> &'static str {
        match self {
            AlertArchetype::ConfidenceScore => "Automated decisions paused until confidence recovers",
            AlertArchetype::DataQuality => "Downstream reports may contain incomplete data",
            AlertArchetype::AccuracyDrift => "Forecasts may deviate from observed demand",
            AlertArchetype::AnomalousPattern => "Potentially incorrect actions were prevented",
            AlertArchetype::FeatureImportanceShift => "Model behavior may change for some segments",
            AlertArchetype::LatencySpike => "Dashboard and agent responses are delayed",
        }
    }

    fn description(&self, agent_name: &str) -> String {
        match self {
            AlertArchetype::ConfidenceScore => format!(
                "{} stopped execution because prediction confidence fell below the safety threshold",
                agent_name
            ),
            AlertArchetype::DataQuality => format!(
                "{} detected missing or inconsistent values in its input data",
                agent_name
            ),
            AlertArchetype::AccuracyDrift => format!(
                "{} observed accuracy dropping against recent ground truth",
                agent_name
            ),
            AlertArchetype::AnomalousPattern => format!(
                "{} encountered a pattern far outside its training distribution",
                agent_name
            ),
            AlertArchetype::FeatureImportanceShift => format!(
                "{} registered a significant shift in feature importance",
                agent_name
            ),
            AlertArchetype::LatencySpike => format!(
                "{} exceeded its response latency budget",
                agent_name
            ),
        }
    }
}

/// Structured payload carried by an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDetails {
    pub description: String,
    pub affected_operations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<f64>,
    pub recommendation: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringAlert {
    pub id: Uuid,
    pub agent_name: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub archetype: AlertArchetype,
    pub details: AlertDetails,
}

/// Builds alerts from archetypes
pub struct AlertGenerator;

impl AlertGenerator {
    /// Produce one alert for `agent_name`, choosing the archetype through the policy
    pub fn generate(
        agent_name: &str,
        now: DateTime<Utc>,
        policy: &mut dyn RandomPolicy,
    ) -> MonitoringAlert {
        let archetype = policy.pick_alert_archetype();
        Self::from_archetype(archetype, agent_name, now, policy)
    }

    pub fn from_archetype(
        archetype: AlertArchetype,
        agent_name: &str,
        now: DateTime<Utc>,
        policy: &mut dyn RandomPolicy,
    ) -> MonitoringAlert {
        let mut details = AlertDetails {
            description: archetype.description(agent_name),
            affected_operations: archetype
                .affected_operations()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            confidence_score: None,
            accuracy: None,
            data_quality: None,
            recommendation: archetype.recommendation().to_string(),
            impact: archetype.impact().to_string(),
        };

        match archetype.metric() {
            Some(AlertMetric::ConfidenceScore { low, high }) => {
                details.confidence_score = Some(policy.pick_metric(low, high));
            }
            Some(AlertMetric::DataQuality { low, high }) => {
                details.data_quality = Some(policy.pick_metric(low, high));
            }
            Some(AlertMetric::Accuracy { low, high }) => {
                details.accuracy = Some(policy.pick_metric(low, high));
            }
            None => {}
        }

        MonitoringAlert {
            id: Uuid::new_v4(),
            agent_name: agent_name.to_string(),
            reason: archetype.reason().to_string(),
            timestamp: now,
            severity: archetype.severity(),
            archetype,
            details,
        }
    }
}

/// Bounded alert ledger
#[derive(Debug, Clone)]
pub struct AlertLedger {
    inner: BoundedLedger<MonitoringAlert>,
}

impl AlertLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedLedger::new(capacity),
        }
    }

    pub fn append(&mut self, alert: MonitoringAlert) {
        self.inner.push(alert);
    }

    pub fn snapshot(&self, limit: Option<usize>) -> Vec<MonitoringAlert> {
        self.inner.snapshot(limit)
    }

    /// Look up one alert for the detail view
    pub fn get(&self, id: Uuid) -> Option<&MonitoringAlert> {
        self.inner.find(|a| a.id == id)
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

    pub fn iter(&self) -> impl Iterator<Item = &MonitoringAlert> {
        self.inner.iter()
    }
}
