//! # coursechat-api
//!
//! HTTP layer for CourseChat built on Axum.
//!
//! Provides the WebSocket upgrade endpoint that feeds the realtime
//! coordinator, health and stats endpoints, and the CORS and request
//! logging middleware.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server, serve};
pub use state::AppState;
