//! Agent catalog and fixed vocabularies
//!
//! Acts as the agent status provider: lists agent kinds with their
//! description and active flag. Only active agents are picked when the
//! scheduler spawns executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Agent kinds known to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "InventoryAgent")]
    Inventory,
    #[serde(rename = "PricingAgent")]
    Pricing,
    #[serde(rename = "CustomerServiceAgent")]
    CustomerService,
    #[serde(rename = "RecommendationAgent")]
    Recommendation,
    #[serde(rename = "DataAnalysisAgent")]
    DataAnalysis,
    #[serde(rename = "MarketingAgent")]
    Marketing,
    #[serde(rename = "SEOAgent")]
    Seo,
    #[serde(rename = "SupplyChainAgent")]
    SupplyChain,
    #[serde(rename = "FinancialAnalystAgent")]
    FinancialAnalyst,
}

impl AgentKind {
    pub const ALL: [AgentKind; 9] = [
        AgentKind::Inventory,
        AgentKind::Pricing,
        AgentKind::CustomerService,
        AgentKind::Recommendation,
        AgentKind::DataAnalysis,
        AgentKind::Marketing,
        AgentKind::Seo,
        AgentKind::SupplyChain,
        AgentKind::FinancialAnalyst,
    ];

    /// Agent name as shown on the dashboard
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Inventory => "InventoryAgent",
            AgentKind::Pricing => "PricingAgent",
            AgentKind::CustomerService => "CustomerServiceAgent",
            AgentKind::Recommendation => "RecommendationAgent",
            AgentKind::DataAnalysis => "DataAnalysisAgent",
            AgentKind::Marketing => "MarketingAgent",
            AgentKind::Seo => "SEOAgent",
            AgentKind::SupplyChain => "SupplyChainAgent",
            AgentKind::FinancialAnalyst => "FinancialAnalystAgent",
        }
    }

    /// Parse from the agent name, case-insensitively
    pub fn from_name(s: &str) -> crate::Result<Self> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::AgentNotFound(s.to_string()))
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentKind::Inventory => "Manages inventory levels, predicts demand, and automates restocking",
            AgentKind::Pricing => "Optimizes product pricing based on demand, competition, and market conditions",
            AgentKind::CustomerService => "Handles customer inquiries, support tickets, and automated responses",
            AgentKind::Recommendation => "Provides personalized product recommendations and cross-selling suggestions",
            AgentKind::DataAnalysis => "Predictive modeling, trend analysis, and business intelligence insights",
            AgentKind::Marketing => "Marketing campaigns, A/B testing, and customer engagement optimization",
            AgentKind::Seo => "SEO optimization, keyword research, and search ranking improvements",
            AgentKind::SupplyChain => "Supplier management, logistics coordination, and delivery optimization",
            AgentKind::FinancialAnalyst => "Financial analysis, budget optimization, and profitability insights",
        }
    }

    /// Units of work this kind of agent performs
    pub fn operations(&self) -> &'static [&'static str] {
        match self {
            AgentKind::Inventory => &[
                "Analyzing stock levels",
                "Forecasting product demand",
                "Generating restock orders",
            ],
            AgentKind::Pricing => &[
                "Optimizing product prices",
                "Analyzing competitor pricing",
                "Calculating demand elasticity",
            ],
            AgentKind::CustomerService => &[
                "Processing support tickets",
                "Analyzing customer sentiment",
                "Drafting automated responses",
            ],
            AgentKind::Recommendation => &[
                "Generating recommendations",
                "Updating similarity matrix",
                "Scoring cross-sell candidates",
            ],
            AgentKind::DataAnalysis => &[
                "Running trend analysis",
                "Detecting sales anomalies",
                "Training forecast model",
            ],
            AgentKind::Marketing => &[
                "Evaluating A/B test results",
                "Segmenting customers",
                "Scheduling campaign emails",
            ],
            AgentKind::Seo => &[
                "Auditing product metadata",
                "Researching keywords",
            ],
            AgentKind::SupplyChain => &[
                "Evaluating supplier performance",
                "Optimizing delivery routes",
            ],
            AgentKind::FinancialAnalyst => &[
                "Computing profit margins",
                "Projecting cash flow",
            ],
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tables a synthetic data operation may touch
pub const TABLES: &[&str] = &[
    "products",
    "orders",
    "order_items",
    "users",
    "categories",
    "reviews",
    "cart_items",
    "inventory_logs",
    "price_history",
    "agent_logs",
    "customer_interactions",
];

/// Catalog entry with activation flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    pub kind: AgentKind,
    pub is_active: bool,
}

/// Status report for one agent, derived from the execution ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub last_execution: Option<DateTime<Utc>>,
    pub execution_count: u64,
    pub running: usize,
}

/// Agent kinds with their active flags
#[derive(Debug, Clone)]
pub struct AgentCatalog {
    entries: Vec<AgentEntry>,
}

impl Default for AgentCatalog {
    fn default() -> Self {
        Self {
            entries: AgentKind::ALL
                .into_iter()
                .map(|kind| AgentEntry {
                    kind,
                    is_active: true,
                })
                .collect(),
        }
    }
}

impl AgentCatalog {
    pub fn entries(&self) -> &[AgentEntry] {
        &self.entries
    }

    /// Active kinds in catalog order
    pub fn active(&self) -> Vec<AgentKind> {
        self.entries
            .iter()
            .filter(|e| e.is_active)
            .map(|e| e.kind)
            .collect()
    }

    pub fn is_active(&self, kind: AgentKind) -> bool {
        self.entries
            .iter()
            .any(|e| e.kind == kind && e.is_active)
    }

    pub fn set_active(&mut self, kind: AgentKind, active: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.kind == kind) {
            if entry.is_active != active {
                entry.is_active = active;
                info!(agent = %kind, active, "Agent activation changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_names_round_trip() {
        for kind in AgentKind::ALL {
            assert_eq!(AgentKind::from_name(kind.as_str()).unwrap(), kind);
            assert!(!kind.operations().is_empty());
        }
        assert_eq!(
            AgentKind::from_name("pricingagent").unwrap(),
            AgentKind::Pricing
        );
        assert!(AgentKind::from_name("UnknownAgent").is_err());
    }

    #[test]
    fn test_agent_kind_serializes_as_agent_name() {
        let json = serde_json::to_string(&AgentKind::Seo).unwrap();
        assert_eq!(json, "\"SEOAgent\"");
    }

    #[test]
    fn test_deactivate_removes_from_active_set() {
        let mut catalog = AgentCatalog::default();
        assert_eq!(catalog.active().len(), AgentKind::ALL.len());

        catalog.set_active(AgentKind::Marketing, false);
        assert!(!catalog.is_active(AgentKind::Marketing));
        assert!(!catalog.active().contains(&AgentKind::Marketing));

        catalog.set_active(AgentKind::Marketing, true);
        assert!(catalog.is_active(AgentKind::Marketing));
    }
}
