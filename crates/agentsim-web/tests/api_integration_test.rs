//! Integration tests for the REST API

use agentsim_core::{
    ChatConfig, ChatManager, InMemoryCatalogCache, PricingOutcome, PricingService, Result,
    SimulationConfig, SimulationCore,
};
use agentsim_web::{api::AppState, create_api_router};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedPricing;

#[async_trait]
impl PricingService for FixedPricing {
    async fn optimize_pricing(&self) -> Result<PricingOutcome> {
        Ok(PricingOutcome {
            total_products_updated: 3,
            average_increase_percent: 4.0,
        })
    }
}

fn setup_app() -> (axum::Router, Arc<AppState>) {
    let config = SimulationConfig {
        seed: Some(11),
        ..Default::default()
    };
    let core = Arc::new(SimulationCore::new(config).unwrap());
    let chats = Arc::new(
        ChatManager::new(
            ChatConfig::default(),
            Arc::new(FixedPricing),
            Arc::new(InMemoryCatalogCache::new()),
        )
        .with_seed(Some(11)),
    );
    let state = Arc::new(AppState::new(core, chats));
    (create_api_router(state.clone()), state)
}

async fn request(
    router: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ==================== Simulation Tests ====================

#[tokio::test]
async fn test_health_check() {
    let (router, _) = setup_app();
    let (status, body) = request(&router, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["simulation_running"], false);
}

#[tokio::test]
async fn test_tick_populates_executions() {
    let (router, _) = setup_app();

    let (status, report) = request(&router, Method::POST, "/api/simulation/tick", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["tick"], 1);

    let (status, executions) = request(&router, Method::GET, "/api/executions", None).await;
    assert_eq!(status, StatusCode::OK);
    let executions = executions.as_array().unwrap();
    assert!(!executions.is_empty());
    let first_status = executions[0]["status"].as_str().unwrap().to_string();
    assert!(["running", "stopped"].contains(&first_status.as_str()));

    let id = executions[0]["id"].as_str().unwrap();
    let (status, execution) =
        request(&router, Method::GET, &format!("/api/executions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(execution["id"], id);

    let uri = format!("/api/executions?status={}&limit=1", first_status);
    let (_, filtered) = request(&router, Method::GET, &uri, None).await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_execution_query_validation() {
    let (router, _) = setup_app();

    let (status, body) =
        request(&router, Method::GET, "/api/executions?status=paused", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (status, _) = request(&router, Method::GET, "/api/data-operations?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_alert_lookup_errors() {
    let (router, _) = setup_app();

    let (status, _) = request(&router, Method::GET, "/api/alerts/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, body) =
        request(&router, Method::GET, &format!("/api/alerts/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, alerts) = request(&router, Method::GET, "/api/alerts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(alerts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_summary() {
    let (router, _) = setup_app();
    request(&router, Method::POST, "/api/simulation/tick", None).await;

    let (status, body) = request(&router, Method::GET, "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tick_count"], 1);
    assert_eq!(body["max_running"], 3);
    assert_eq!(body["active_agents"], 9);
}

#[tokio::test]
async fn test_start_and_stop_simulation() {
    let (router, state) = setup_app();

    let (_, body) = request(&router, Method::POST, "/api/simulation/start", None).await;
    assert_eq!(body["running"], true);
    assert_eq!(body["changed"], true);
    assert!(state.core.is_running());

    let (_, body) = request(&router, Method::POST, "/api/simulation/start", None).await;
    assert_eq!(body["changed"], false);

    let (_, body) = request(&router, Method::POST, "/api/simulation/stop", None).await;
    assert_eq!(body["running"], false);
    assert!(!state.core.is_running());
}

// ==================== Agent Tests ====================

#[tokio::test]
async fn test_agent_activation() {
    let (router, _) = setup_app();

    let (status, agents) = request(&router, Method::GET, "/api/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agents.as_array().unwrap().len(), 9);

    let (status, agent) =
        request(&router, Method::POST, "/api/agents/PricingAgent/deactivate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agent["name"], "PricingAgent");
    assert_eq!(agent["is_active"], false);

    let (_, agent) =
        request(&router, Method::POST, "/api/agents/PricingAgent/activate", None).await;
    assert_eq!(agent["is_active"], true);

    let (status, _) =
        request(&router, Method::POST, "/api/agents/WeatherAgent/activate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ==================== Chat Tests ====================

#[tokio::test]
async fn test_chat_session_lifecycle() {
    let (router, _) = setup_app();

    let (status, session) = request(
        &router,
        Method::POST,
        "/api/chat/sessions",
        Some(json!({"agent_name": "InventoryAgent"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["messages"].as_array().unwrap().len(), 1);
    let id = session["id"].as_str().unwrap().to_string();
    let messages_uri = format!("/api/chat/sessions/{}/messages", id);

    let (status, body) = request(
        &router,
        Method::POST,
        &messages_uri,
        Some(json!({"content": "What are the stock levels?"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["pending"], true);
    assert_eq!(body["message"]["role"], "user");

    // Only one request may be in flight per session
    let (status, body) = request(
        &router,
        Method::POST,
        &messages_uri,
        Some(json!({"content": "And the forecast?"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (_, sessions) = request(&router, Method::GET, "/api/chat/sessions", None).await;
    assert_eq!(sessions.as_array().unwrap().len(), 1);

    let session_uri = format!("/api/chat/sessions/{}", id);
    let (status, _) = request(&router, Method::DELETE, &session_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(&router, Method::GET, &session_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_rejects_unknown_agent_and_empty_message() {
    let (router, _) = setup_app();

    let (status, _) = request(
        &router,
        Method::POST,
        "/api/chat/sessions",
        Some(json!({"agent_name": "WeatherAgent"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, session) = request(
        &router,
        Method::POST,
        "/api/chat/sessions",
        Some(json!({"agent_name": "SEOAgent"})),
    )
    .await;
    let uri = format!(
        "/api/chat/sessions/{}/messages",
        session["id"].as_str().unwrap()
    );
    let (status, body) = request(&router, Method::POST, &uri, Some(json!({"content": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_message_to_unknown_session_is_not_found() {
    let (router, _) = setup_app();
    let uri = format!("/api/chat/sessions/{}/messages", uuid::Uuid::new_v4());

    let (status, body) = request(&router, Method::POST, &uri, Some(json!({"content": ""}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

// ==================== Agent Log & Analytics Tests ====================

async fn run_ticks(router: &axum::Router, ticks: usize) {
    for _ in 0..ticks {
        let (status, _) = request(router, Method::POST, "/api/simulation/tick", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_agent_detail_and_execution_log() {
    let (router, _) = setup_app();
    run_ticks(&router, 30).await;

    let (status, agent) = request(&router, Method::GET, "/api/agents/pricingagent", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agent["name"], "PricingAgent");

    let (_, all) = request(&router, Method::GET, "/api/executions", None).await;
    let expected = all
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["agent_name"] == "PricingAgent")
        .count();

    let (status, log) =
        request(&router, Method::GET, "/api/agents/PricingAgent/executions", None).await;
    assert_eq!(status, StatusCode::OK);
    let log = log.as_array().unwrap();
    assert_eq!(log.len(), expected);
    assert!(log.iter().all(|e| e["agent_name"] == "PricingAgent"));

    let (_, filtered) =
        request(&router, Method::GET, "/api/executions?agent=PricingAgent", None).await;
    assert_eq!(filtered.as_array().unwrap().len(), expected);

    let (status, limited) = request(
        &router,
        Method::GET,
        "/api/agents/PricingAgent/executions?limit=1&status=running",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(limited.as_array().unwrap().len() <= 1);

    let (status, _) = request(&router, Method::GET, "/api/agents/WeatherAgent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        request(&router, Method::GET, "/api/agents/WeatherAgent/executions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        request(&router, Method::GET, "/api/executions?agent=WeatherAgent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_agent_performance_analytics() {
    let (router, _) = setup_app();

    let (status, empty) =
        request(&router, Method::GET, "/api/analytics/agent-performance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["total_executions"], 0);
    assert!(empty["success_rate"].is_null());

    run_ticks(&router, 30).await;
    let (_, all) = request(&router, Method::GET, "/api/executions", None).await;
    let (_, report) =
        request(&router, Method::GET, "/api/analytics/agent-performance", None).await;

    assert_eq!(
        report["total_executions"].as_u64().unwrap() as usize,
        all.as_array().unwrap().len()
    );
    let agents = report["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 9);
    let per_agent: u64 = agents
        .iter()
        .map(|a| a["executions"].as_u64().unwrap())
        .sum();
    assert_eq!(per_agent, report["total_executions"].as_u64().unwrap());
}
