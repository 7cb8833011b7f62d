//! REST API endpoints for the simulation and chat sessions

use agentsim_core::{
    AgentExecution, AgentKind, AgentStatus, ChatManager, ChatMessage, ChatSession,
    DashboardSummary, DataOperation, ExecutionStatus, MonitoringAlert, PerformanceReport,
    SimulationCore, TickReport,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

/// Upper bound for `limit` query parameters
const MAX_LIMIT: usize = 500;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl ApiError {
    fn not_found(entity: &str) -> Self {
        Self {
            error: format!("{} not found", entity),
            code: "not_found".to_string(),
        }
    }

    fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "bad_request".to_string(),
        }
    }

    fn validation(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "validation_error".to_string(),
        }
    }

    fn internal(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "internal_error".to_string(),
        }
    }

    fn conflict(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "conflict".to_string(),
        }
    }
}

impl From<agentsim_core::Error> for ApiError {
    fn from(err: agentsim_core::Error) -> Self {
        use agentsim_core::Error;
        match err {
            Error::AgentNotFound(_) | Error::SessionNotFound(_) | Error::ExecutionNotFound(_) => {
                Self {
                    error: err.to_string(),
                    code: "not_found".to_string(),
                }
            }
            Error::ResponsePending(_) | Error::InvalidStateTransition(_, _) => {
                Self::conflict(err.to_string())
            }
            Error::Validation(msg) => Self::validation(msg),
            Error::Parse(msg) => Self::bad_request(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<SimulationCore>,
    pub chats: Arc<ChatManager>,
}

impl AppState {
    pub fn new(core: Arc<SimulationCore>, chats: Arc<ChatManager>) -> Self {
        Self { core, chats }
    }
}

/// Create the API router (API endpoints only)
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/dashboard", get(dashboard))
        .route("/api/executions", get(list_executions))
        .route("/api/executions/:id", get(get_execution))
        .route("/api/data-operations", get(list_data_operations))
        .route("/api/alerts", get(list_alerts))
        .route("/api/alerts/:id", get(get_alert))
        .route("/api/agents", get(list_agents))
        .route("/api/agents/:name", get(get_agent))
        .route("/api/agents/:name/executions", get(list_agent_executions))
        .route("/api/agents/:name/activate", post(activate_agent))
        .route("/api/agents/:name/deactivate", post(deactivate_agent))
        .route("/api/analytics/agent-performance", get(agent_performance))
        .route("/api/simulation/start", post(start_simulation))
        .route("/api/simulation/stop", post(stop_simulation))
        .route("/api/simulation/tick", post(tick_simulation))
        .route(
            "/api/chat/sessions",
            get(list_sessions).post(create_session),
        )
        .route(
            "/api/chat/sessions/:id",
            get(get_session).delete(close_session),
        )
        .route("/api/chat/sessions/:id/messages", post(send_message))
        .with_state(state)
}

/// Create the full router: API, WebSocket stream and HTTP middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let ws_router = Router::new()
        .route("/ws", get(crate::websocket::ws_handler))
        .with_state(state.clone());

    Router::new()
        .merge(create_api_router(state))
        .merge(ws_router)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn parse_uuid(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Invalid UUID format"))
}

// ==================== Handlers ====================

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        simulation_running: state.core.is_running(),
    })
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSummary> {
    Json(state.core.summary().await)
}

async fn list_executions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExecutionQuery>,
) -> Result<Json<Vec<AgentExecution>>, ApiError> {
    query.validate()?;
    let status = query.status()?;
    let agent = query
        .agent
        .as_deref()
        .map(AgentKind::from_name)
        .transpose()?;

    Ok(Json(state.core.executions(query.limit, status, agent).await))
}

async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentExecution>, ApiError> {
    let uuid = parse_uuid(&id)?;
    state
        .core
        .execution(uuid)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Execution"))
}

async fn list_data_operations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<DataOperation>>, ApiError> {
    query.validate()?;
    Ok(Json(state.core.data_operations(query.limit).await))
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<MonitoringAlert>>, ApiError> {
    query.validate()?;
    Ok(Json(state.core.alerts(query.limit).await))
}

async fn get_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MonitoringAlert>, ApiError> {
    let uuid = parse_uuid(&id)?;
    state
        .core
        .alert(uuid)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Alert"))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Vec<AgentStatus>> {
    Json(state.core.agent_statuses().await)
}

async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AgentStatus>, ApiError> {
    let kind = AgentKind::from_name(&name)?;
    agent_status(&state, kind).await
}

/// Execution log for one agent, most recent first
async fn list_agent_executions(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<ExecutionQuery>,
) -> Result<Json<Vec<AgentExecution>>, ApiError> {
    let kind = AgentKind::from_name(&name)?;
    query.validate()?;
    if query.agent.is_some() {
        return Err(ApiError::bad_request(
            "agent is taken from the path on this endpoint",
        ));
    }
    let status = query.status()?;
    Ok(Json(state.core.executions(query.limit, status, Some(kind)).await))
}

async fn agent_performance(State(state): State<Arc<AppState>>) -> Json<PerformanceReport> {
    Json(state.core.performance().await)
}

async fn activate_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AgentStatus>, ApiError> {
    set_agent_active(&state, &name, true).await
}

async fn deactivate_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AgentStatus>, ApiError> {
    set_agent_active(&state, &name, false).await
}

async fn set_agent_active(
    state: &AppState,
    name: &str,
    active: bool,
) -> Result<Json<AgentStatus>, ApiError> {
    let kind = AgentKind::from_name(name)?;
    state.core.set_agent_active(kind, active).await;
    agent_status(state, kind).await
}

async fn agent_status(state: &AppState, kind: AgentKind) -> Result<Json<AgentStatus>, ApiError> {
    state
        .core
        .agent_status(kind)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::internal(format!("Status missing for {}", kind)))
}

async fn start_simulation(State(state): State<Arc<AppState>>) -> Json<SimulationControlResponse> {
    let changed = state.core.start();
    info!(changed, "Simulation start requested");
    Json(SimulationControlResponse {
        running: state.core.is_running(),
        changed,
    })
}

async fn stop_simulation(State(state): State<Arc<AppState>>) -> Json<SimulationControlResponse> {
    let changed = state.core.stop().await;
    info!(changed, "Simulation stop requested");
    Json(SimulationControlResponse {
        running: state.core.is_running(),
        changed,
    })
}

async fn tick_simulation(State(state): State<Arc<AppState>>) -> Json<TickReport> {
    Json(state.core.tick_now().await)
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<ChatSession>> {
    Json(state.chats.list().await)
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ChatSession>), ApiError> {
    let session = state.chats.open(&req.agent_name).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChatSession>, ApiError> {
    let uuid = parse_uuid(&id)?;
    Ok(Json(state.chats.session(uuid).await?))
}

async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uuid = parse_uuid(&id)?;
    state.chats.close(uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accept a message; the agent's reply lands in the session once its delay elapses
async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let uuid = parse_uuid(&id)?;
    state.chats.send_message(uuid, &req.content).await?;
    debug!(session_id = %uuid, "Chat message accepted");

    let session = state.chats.session(uuid).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SendMessageResponse {
            session_id: session.id,
            pending: session.is_pending(),
            message: session.messages.last().cloned(),
        }),
    ))
}

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    fn validate(&self) -> Result<(), ApiError> {
        validate_limit(self.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecutionQuery {
    pub limit: Option<usize>,
    pub status: Option<String>,
    pub agent: Option<String>,
}

impl ExecutionQuery {
    fn validate(&self) -> Result<(), ApiError> {
        validate_limit(self.limit)
    }

    fn status(&self) -> Result<Option<ExecutionStatus>, ApiError> {
        Ok(self
            .status
            .as_deref()
            .map(ExecutionStatus::from_str)
            .transpose()?)
    }
}

fn validate_limit(limit: Option<usize>) -> Result<(), ApiError> {
    match limit {
        Some(0) => Err(ApiError::validation("limit must be positive")),
        Some(n) if n > MAX_LIMIT => Err(ApiError::validation(format!(
            "limit cannot exceed {}",
            MAX_LIMIT
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub agent_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub session_id: Uuid,
    pub pending: bool,
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct SimulationControlResponse {
    pub running: bool,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub simulation_running: bool,
}
