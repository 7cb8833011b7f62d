//! Canned knowledge base for each agent kind
//!
//! Classification is a case-insensitive substring match against an ordered
//! rule list; the first rule with any matching keyword wins, otherwise the
//! agent's default response is used.

use crate::catalog::AgentKind;

/// How long a response takes and whether it performs a real action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePlan {
    /// One "thinking" stage
    Standard,
    /// Short stage plus the real pricing optimization call
    PricingOptimization,
    /// Long research stage followed by a reasoning stage
    MarketResearch,
}

/// Response text and the metadata attached to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseTemplate {
    pub content: &'static str,
    pub confidence: f64,
    pub category: &'static str,
    pub actions: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub plan: ResponsePlan,
    pub response: ResponseTemplate,
}

impl KeywordRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Per-agent welcome message, rules and fallback
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeBase {
    pub welcome: &'static str,
    pub rules: &'static [KeywordRule],
    pub fallback: ResponseTemplate,
}

/// Outcome of classifying one inbound message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub plan: ResponsePlan,
    pub response: ResponseTemplate,
    pub matched: bool,
}

impl KnowledgeBase {
    pub fn classify(&self, text: &str) -> Classification {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| Classification {
                plan: rule.plan,
                response: rule.response,
                matched: true,
            })
            .unwrap_or(Classification {
                plan: ResponsePlan::Standard,
                response: self.fallback,
                matched: false,
            })
    }
}

/// Content used when the pricing service fails or times out
pub const PRICING_DEGRADED: ResponseTemplate = ResponseTemplate {
    content: "I completed a pricing analysis, but the pricing service could not be reached, so NO price changes were applied. \
              Based on current demand, moderate increases on high-demand electronics look justified. \
              Please retry the optimization once the service is available.",
    confidence: 0.62,
    category: "pricing_analysis",
    actions: &["price_analysis", "market_analysis"],
};

/// Template for a successful optimization; `{products}` and `{increase}` are filled in
pub const PRICING_APPLIED: ResponseTemplate = ResponseTemplate {
    content: "Pricing strategy optimized. I updated prices on {products} products with an average increase of {increase}%. \
              Product listings have been refreshed to show the new prices.",
    confidence: 0.94,
    category: "pricing_optimization",
    actions: &["price_updates", "market_analysis", "revenue_optimization"],
};

const PRICING_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["optimize", "optimise", "optimization", "optimisation"],
        plan: ResponsePlan::PricingOptimization,
        response: PRICING_APPLIED,
    },
    KeywordRule {
        keywords: &["market condition", "market trend", "competitor", "competition"],
        plan: ResponsePlan::MarketResearch,
        response: ResponseTemplate {
            content: "After reviewing competitor listings and recent demand signals: competitors raised electronics prices by roughly 3% this month, \
                      while demand for accessories is softening. I recommend holding accessory prices and testing a small increase on premium audio.",
            confidence: 0.87,
            category: "market_analysis",
            actions: &["market_research", "competitor_monitoring", "trend_analysis"],
        },
    },
    KeywordRule {
        keywords: &["elastic", "sensitiv"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Most of the catalog is price-elastic (elasticity between -2.5 and -0.5). Gaming laptops are the least sensitive, \
                      so they tolerate increases best.",
            confidence: 0.81,
            category: "elasticity_analysis",
            actions: &["elasticity_modeling"],
        },
    },
    KeywordRule {
        keywords: &["discount", "promotion", "sale"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "A 10% discount on slow-moving smart home items would clear excess stock without hurting margin targets. \
                      I cap any single adjustment at 20%.",
            confidence: 0.78,
            category: "promotion_planning",
            actions: &["discount_planning", "margin_protection"],
        },
    },
];

const INVENTORY_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["low stock", "out of stock", "stock level", "inventory level"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Three products are below their reorder point: Fitness Tracking Watch, Bluetooth Speaker and Smart Home Hub. \
                      Restock orders are drafted and waiting for approval.",
            confidence: 0.92,
            category: "stock_monitoring",
            actions: &["stock_alerts", "restock_orders"],
        },
    },
    KeywordRule {
        keywords: &["forecast", "demand", "predict"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Demand for wireless headphones is projected to rise 18% over the next 30 days. \
                      I suggest increasing the next purchase order accordingly.",
            confidence: 0.85,
            category: "demand_forecasting",
            actions: &["demand_forecasting", "purchase_planning"],
        },
    },
    KeywordRule {
        keywords: &["restock", "reorder", "supplier"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Reorder quantities are calculated from 30-day sales velocity plus a two-week safety buffer.",
            confidence: 0.88,
            category: "restocking",
            actions: &["restock_orders"],
        },
    },
];

const CUSTOMER_SERVICE_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["refund", "return"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Refund requests are processed within 3-5 business days. Items can be returned within 30 days of delivery.",
            confidence: 0.93,
            category: "returns",
            actions: &["refund_processing", "return_labels"],
        },
    },
    KeywordRule {
        keywords: &["order", "shipping", "delivery", "track"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Most orders ship within 24 hours. Tracking numbers are emailed as soon as the carrier picks up the package.",
            confidence: 0.9,
            category: "order_status",
            actions: &["order_tracking", "shipping_updates"],
        },
    },
    KeywordRule {
        keywords: &["complaint", "angry", "unhappy", "sentiment"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Customer sentiment is 82% positive this week. Negative tickets mostly mention delivery delays; \
                      I escalate those to a human agent automatically.",
            confidence: 0.84,
            category: "sentiment_analysis",
            actions: &["sentiment_analysis", "escalation"],
        },
    },
];

const RECOMMENDATION_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["recommend", "suggest"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Recommendations combine purchase history, product similarity and trending items. \
                      Click-through on recommended products is currently 12%.",
            confidence: 0.89,
            category: "recommendations",
            actions: &["personalization", "similarity_scoring"],
        },
    },
    KeywordRule {
        keywords: &["cross-sell", "cross sell", "upsell", "bundle"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "The strongest bundle is Gaming Laptop with Bluetooth Speaker, bought together in 14% of laptop orders.",
            confidence: 0.83,
            category: "cross_selling",
            actions: &["bundle_detection", "cross_selling"],
        },
    },
];

const DATA_ANALYSIS_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["trend", "growth"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "Revenue grew 8.4% week over week, driven mostly by electronics. Weekend traffic converts 1.3x better than weekdays.",
            confidence: 0.88,
            category: "trend_analysis",
            actions: &["trend_analysis", "reporting"],
        },
    },
    KeywordRule {
        keywords: &["anomal", "outlier", "unusual"],
        plan: ResponsePlan::Standard,
        response: ResponseTemplate {
            content: "I flagged two anomalies: an order spike from a single region on Tuesday and an unusual drop in cart conversions yesterday.",
            confidence: 0.8,
            category: "anomaly_detection",
            actions: &["anomaly_detection", "alerting"],
        },
    },
];

const MARKETING_RULES: &[KeywordRule] = &[KeywordRule {
    keywords: &["campaign", "a/b", "email", "segment"],
    plan: ResponsePlan::Standard,
    response: ResponseTemplate {
        content: "The current email campaign variant B outperforms A by 2.1 points in open rate. I will roll it out to the remaining segments.",
        confidence: 0.86,
        category: "campaign_management",
        actions: &["ab_testing", "segmentation", "email_campaigns"],
    },
}];

const SEO_RULES: &[KeywordRule] = &[KeywordRule {
    keywords: &["keyword", "ranking", "search", "seo"],
    plan: ResponsePlan::Standard,
    response: ResponseTemplate {
        content: "23 product pages were optimized this week. \"wireless headphones\" moved from position 14 to 9.",
        confidence: 0.84,
        category: "seo_optimization",
        actions: &["keyword_research", "content_optimization"],
    },
}];

const SUPPLY_CHAIN_RULES: &[KeywordRule] = &[KeywordRule {
    keywords: &["supplier", "logistic", "route", "delivery"],
    plan: ResponsePlan::Standard,
    response: ResponseTemplate {
        content: "Supplier on-time delivery is 94%. Route optimization cut average delivery time by half a day this month.",
        confidence: 0.87,
        category: "logistics",
        actions: &["supplier_scoring", "route_optimization"],
    },
}];

const FINANCIAL_RULES: &[KeywordRule] = &[KeywordRule {
    keywords: &["margin", "profit", "revenue", "budget", "cash"],
    plan: ResponsePlan::Standard,
    response: ResponseTemplate {
        content: "Gross margin is 34.2% this quarter, up 1.1 points. Marketing spend is 6% under budget.",
        confidence: 0.9,
        category: "financial_analysis",
        actions: &["margin_analysis", "budget_tracking"],
    },
}];

const fn fallback(content: &'static str) -> ResponseTemplate {
    ResponseTemplate {
        content,
        confidence: 0.7,
        category: "general",
        actions: &["general_assistance"],
    }
}

/// Knowledge base for an agent kind
pub fn knowledge_base(kind: AgentKind) -> KnowledgeBase {
    match kind {
        AgentKind::Pricing => KnowledgeBase {
            welcome: "Hello! I'm the Pricing Agent. I can optimize our pricing strategy, analyze market conditions and model price elasticity.",
            rules: PRICING_RULES,
            fallback: fallback(
                "I monitor competitor prices and demand to keep our pricing competitive. Ask me to optimize pricing or about market conditions.",
            ),
        },
        AgentKind::Inventory => KnowledgeBase {
            welcome: "Hello! I'm the Inventory Agent. Ask me about stock levels, demand forecasts or restocking.",
            rules: INVENTORY_RULES,
            fallback: fallback(
                "I track stock across all products and draft restock orders before items run out.",
            ),
        },
        AgentKind::CustomerService => KnowledgeBase {
            welcome: "Hi! I'm the Customer Service Agent. I can help with orders, shipping, returns and refunds.",
            rules: CUSTOMER_SERVICE_RULES,
            fallback: fallback(
                "I handle customer inquiries and support tickets. Could you tell me a bit more about what you need?",
            ),
        },
        AgentKind::Recommendation => KnowledgeBase {
            welcome: "Hello! I'm the Recommendation Agent. I personalize product suggestions and find cross-selling opportunities.",
            rules: RECOMMENDATION_RULES,
            fallback: fallback(
                "I generate personalized recommendations from browsing and purchase history.",
            ),
        },
        AgentKind::DataAnalysis => KnowledgeBase {
            welcome: "Hello! I'm the Data Analysis Agent. Ask me about trends, anomalies or forecasts.",
            rules: DATA_ANALYSIS_RULES,
            fallback: fallback("I analyze sales, traffic and customer data to surface insights."),
        },
        AgentKind::Marketing => KnowledgeBase {
            welcome: "Hello! I'm the Marketing Agent. I run campaigns, A/B tests and customer segmentation.",
            rules: MARKETING_RULES,
            fallback: fallback("I plan and optimize marketing campaigns across channels."),
        },
        AgentKind::Seo => KnowledgeBase {
            welcome: "Hello! I'm the SEO Agent. I work on keywords, metadata and search rankings.",
            rules: SEO_RULES,
            fallback: fallback("I improve how our products rank in search results."),
        },
        AgentKind::SupplyChain => KnowledgeBase {
            welcome: "Hello! I'm the Supply Chain Agent. I manage suppliers, logistics and delivery routes.",
            rules: SUPPLY_CHAIN_RULES,
            fallback: fallback("I coordinate suppliers and logistics to keep deliveries on time."),
        },
        AgentKind::FinancialAnalyst => KnowledgeBase {
            welcome: "Hello! I'm the Financial Analyst Agent. I track margins, budgets and cash flow.",
            rules: FINANCIAL_RULES,
            fallback: fallback("I analyze profitability and budgets across the business."),
        },
    }
}
