//! Axum HTTP API for the render-job engine.
//!
//! This crate provides:
//! - `POST /render` submission and `GET /render/{jobId}/status` polling
//! - Queue status, health and readiness checks
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
