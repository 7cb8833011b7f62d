//! AgentSim Web - HTTP surface
//!
//! This crate exposes the simulation over HTTP:
//! - REST API for ledgers, dashboard and agent activation
//! - Chat session endpoints
//! - WebSocket stream of simulation events

pub mod api;
pub mod websocket;

pub use api::{create_api_router, create_router, ApiError, AppState};
pub use websocket::{ClientMessage, EventChannel};
